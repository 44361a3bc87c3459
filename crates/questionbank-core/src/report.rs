//! Bank reports: every block's state and question bank, with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::QuestionCatalog;
use crate::engine::{block_state, compute_bank};
use crate::model::{BlockId, BlockState, Program, ProgramId, Question, QuestionId};

/// Snapshot of every block's bank in a program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub program: ProgramSummary,
    /// One entry per block, in program order.
    pub blocks: Vec<BlockBank>,
}

/// Summary of a program (without its blocks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub id: ProgramId,
    pub name: String,
    pub block_count: usize,
}

/// A block's contents and its current bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockBank {
    pub block_id: BlockId,
    pub name: String,
    pub state: BlockState,
    /// Questions placed in the block, in block order.
    pub questions: Vec<BankEntry>,
    /// Eligible questions, in catalog order.
    pub bank: Vec<BankEntry>,
}

/// A question resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEntry {
    pub id: QuestionId,
    pub name: String,
    pub type_tag: String,
}

impl From<&Question> for BankEntry {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            name: q.name.clone(),
            type_tag: q.type_tag(),
        }
    }
}

impl BlockBank {
    /// Build the entry for one block.
    pub fn build(
        program: &Program,
        catalog: &QuestionCatalog,
        block_id: BlockId,
    ) -> crate::error::Result<Self> {
        let bank = compute_bank(program, catalog, block_id)?;
        let block = program
            .block(block_id)
            .ok_or(crate::error::BankError::UnknownBlock(block_id))?;

        let questions = block
            .question_ids
            .iter()
            .map(|&id| match catalog.get(id) {
                Some(q) => BankEntry::from(q),
                None => BankEntry {
                    id,
                    name: format!("#{id}"),
                    type_tag: "Unknown".into(),
                },
            })
            .collect();

        Ok(Self {
            block_id,
            name: block.name.clone(),
            state: block_state(block, catalog),
            questions,
            bank: catalog
                .resolve_ordered(&bank)
                .into_iter()
                .map(BankEntry::from)
                .collect(),
        })
    }
}

impl BankReport {
    /// Compute the bank for every block of `program`.
    pub fn build(program: &Program, catalog: &QuestionCatalog) -> crate::error::Result<Self> {
        let blocks = program
            .blocks
            .iter()
            .map(|b| BlockBank::build(program, catalog, b.id))
            .collect::<crate::error::Result<Vec<_>>>()?;

        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            program: ProgramSummary {
                id: program.id,
                name: program.name.clone(),
                block_count: program.blocks.len(),
            },
            blocks,
        })
    }

    pub fn block(&self, id: BlockId) -> Option<&BlockBank> {
        self.blocks.iter().find(|b| b.block_id == id)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BankReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// What changed in each block's bank since `baseline`.
    ///
    /// Blocks present in only one of the reports are skipped.
    pub fn diff(&self, baseline: &BankReport) -> Vec<BankChange> {
        self.blocks
            .iter()
            .filter_map(|current| {
                let before = baseline.block(current.block_id)?;
                let admitted: Vec<QuestionId> = current
                    .bank
                    .iter()
                    .filter(|e| !before.bank.contains(e))
                    .map(|e| e.id)
                    .collect();
                let withdrawn: Vec<QuestionId> = before
                    .bank
                    .iter()
                    .filter(|e| !current.bank.contains(e))
                    .map(|e| e.id)
                    .collect();
                (!admitted.is_empty() || !withdrawn.is_empty()).then_some(BankChange {
                    block_id: current.block_id,
                    admitted,
                    withdrawn,
                })
            })
            .collect()
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "## {} (program {})\n\n",
            self.program.name, self.program.id
        ));

        for block in &self.blocks {
            md.push_str(&format!(
                "### Block {}: {} ({})\n\n",
                block.block_id, block.name, block.state
            ));

            if block.questions.is_empty() {
                md.push_str("_No questions in this block._\n\n");
            } else {
                for q in &block.questions {
                    md.push_str(&format!("- {} ({})\n", q.name, q.type_tag));
                }
                md.push('\n');
            }

            md.push_str("**Question bank**\n\n");
            if !block.bank.is_empty() {
                md.push_str("| Id | Name | Type |\n");
                md.push_str("|----|------|------|\n");
                for e in &block.bank {
                    md.push_str(&format!("| {} | {} | {} |\n", e.id, e.name, e.type_tag));
                }
                md.push('\n');
            }
        }

        md
    }
}

/// Bank difference for one block between two reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankChange {
    pub block_id: BlockId,
    /// Newly eligible questions.
    pub admitted: Vec<QuestionId>,
    /// Questions no longer eligible.
    pub withdrawn: Vec<QuestionId>,
}
