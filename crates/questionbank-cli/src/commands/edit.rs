//! Block editing commands: `add`, `remove`, `add-block`, `remove-block`, `repeat`.
//!
//! Each command reloads the files, applies one mutation through the core
//! store functions, and only writes the program back if the mutation was
//! accepted.

use anyhow::Result;

use questionbank_core::model::{BlockId, QuestionId};
use questionbank_core::report::{BankReport, BlockBank};
use questionbank_core::store;

use super::bank::print_block_bank;
use super::Workspace;
use crate::PathArgs;

pub fn add(paths: &PathArgs, block: u64, question: u64) -> Result<()> {
    let mut ws = Workspace::load(paths)?;
    let (block, question) = (BlockId(block), QuestionId(question));

    store::add_question_to_block(&mut ws.program, &ws.catalog, block, question)?;
    ws.save()?;

    println!("Added {} to block {block}", question_label(&ws, question));
    show_block(&ws, block)
}

pub fn remove(paths: &PathArgs, block: u64, question: u64) -> Result<()> {
    let mut ws = Workspace::load(paths)?;
    let (block, question) = (BlockId(block), QuestionId(question));
    let before = BankReport::build(&ws.program, &ws.catalog)?;

    store::remove_question_from_block(&mut ws.program, &ws.catalog, block, question)?;
    ws.save()?;

    println!("Removed {} from block {block}", question_label(&ws, question));
    let after = BankReport::build(&ws.program, &ws.catalog)?;
    for change in after.diff(&before) {
        if change.block_id != block && !change.admitted.is_empty() {
            let names: Vec<String> = change
                .admitted
                .iter()
                .map(|&id| question_label(&ws, id))
                .collect();
            println!(
                "  block {} bank now also offers: {}",
                change.block_id,
                names.join(", ")
            );
        }
    }
    show_block(&ws, block)
}

pub fn add_block(paths: &PathArgs, name: &str) -> Result<()> {
    let mut ws = Workspace::load(paths)?;

    let id = store::add_block(&mut ws.program, &ws.catalog, name)?;
    ws.save()?;

    println!("Created block {id}");
    show_block(&ws, id)
}

pub fn remove_block(paths: &PathArgs, block: u64) -> Result<()> {
    let mut ws = Workspace::load(paths)?;
    let block = BlockId(block);

    store::remove_block(&mut ws.program, &ws.catalog, block)?;
    ws.save()?;

    println!("Removed block {block}");
    Ok(())
}

pub fn repeat(paths: &PathArgs, enumerator: u64) -> Result<()> {
    let mut ws = Workspace::load(paths)?;
    let enumerator = QuestionId(enumerator);

    let id = store::create_repeated_block(&mut ws.program, &ws.catalog, enumerator)?;
    ws.save()?;

    println!(
        "Created block {id} repeated under {}",
        question_label(&ws, enumerator)
    );
    show_block(&ws, id)
}

fn question_label(ws: &Workspace, id: QuestionId) -> String {
    ws.catalog
        .get(id)
        .map(|q| q.name.clone())
        .unwrap_or_else(|| format!("#{id}"))
}

fn show_block(ws: &Workspace, block: BlockId) -> Result<()> {
    println!();
    print_block_bank(&BlockBank::build(&ws.program, &ws.catalog, block)?);
    Ok(())
}
