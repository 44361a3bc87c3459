//! The `questionbank report` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use questionbank_core::report::BankReport;

use super::Workspace;
use crate::PathArgs;

pub fn execute(paths: &PathArgs, output: Option<PathBuf>, format: String) -> Result<()> {
    let ws = Workspace::load(paths)?;
    let report = BankReport::build(&ws.program, &ws.catalog)?;

    let extension = match format.as_str() {
        "json" => "json",
        "markdown" | "md" => "md",
        other => anyhow::bail!("unsupported report format: {other}"),
    };
    let output = output.unwrap_or_else(|| {
        ws.config
            .reports_dir
            .join(format!("bank-{}.{extension}", report.program.id))
    });

    if extension == "json" {
        report.save_json(&output)?;
    } else {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&output, report.to_markdown())
            .with_context(|| format!("failed to write report to {}", output.display()))?;
    }

    tracing::info!(
        report = %report.id,
        blocks = report.blocks.len(),
        "report written"
    );
    println!("Report saved to: {}", output.display());
    Ok(())
}
