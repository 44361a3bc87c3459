//! The `questionbank bank` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use questionbank_core::model::BlockId;
use questionbank_core::report::{BankReport, BlockBank};

use super::Workspace;
use crate::PathArgs;

pub fn execute(paths: &PathArgs, block: Option<u64>, format: Option<String>) -> Result<()> {
    let ws = Workspace::load(paths)?;
    let format = format.unwrap_or_else(|| ws.config.format.clone());
    if !matches!(format.as_str(), "text" | "json" | "markdown" | "md") {
        anyhow::bail!("unsupported output format: {format}");
    }

    let mut report = BankReport::build(&ws.program, &ws.catalog)?;
    if let Some(id) = block {
        let id = BlockId(id);
        if report.block(id).is_none() {
            anyhow::bail!("unknown block: {id}");
        }
        report.blocks.retain(|b| b.block_id == id);
    }

    match format.as_str() {
        "json" => {
            if block.is_some() {
                println!("{}", serde_json::to_string_pretty(&report.blocks[0])?);
            } else {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        _ => {
            for (i, b) in report.blocks.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_block_bank(b);
            }
        }
    }

    Ok(())
}

/// Print a block's contents and its bank as text.
///
/// The bank is always introduced by a `Question bank` header; an empty bank
/// prints the header alone.
pub fn print_block_bank(block: &BlockBank) {
    println!(
        "Block {}: {} [{}]",
        block.block_id, block.name, block.state
    );
    if block.questions.is_empty() {
        println!("  (no questions)");
    } else {
        for q in &block.questions {
            println!("  - {} ({}, #{})", q.name, q.type_tag, q.id);
        }
    }

    println!("Question bank");
    if block.bank.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Type"]);
    for entry in &block.bank {
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(&entry.name),
            Cell::new(&entry.type_tag),
        ]);
    }
    println!("{table}");
}
