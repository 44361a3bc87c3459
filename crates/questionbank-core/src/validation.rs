//! Structural invariant checks over a program and its catalog.
//!
//! These run at the start of every bank computation and mutation, so a
//! block never carries its own "sealed" or "scoped" flag that could drift
//! from the real contents of the program.

use std::collections::{HashMap, HashSet};

use crate::catalog::QuestionCatalog;
use crate::error::{BankError, Result};
use crate::model::{BlockId, Program, QuestionId};

/// A broken invariant found while checking a program or catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The block involved (if applicable).
    pub block: Option<BlockId>,
    /// The question involved (if applicable).
    pub question: Option<QuestionId>,
    pub message: String,
}

impl Violation {
    fn new(block: Option<BlockId>, question: Option<QuestionId>, message: String) -> Self {
        Self {
            block,
            question,
            message,
        }
    }
}

/// List every repeated question whose scope is not an enumerator.
pub fn check_catalog(catalog: &QuestionCatalog) -> Vec<Violation> {
    catalog
        .list_questions()
        .iter()
        .filter_map(|q| {
            let enumerator = q.scope_enumerator_id()?;
            (!catalog.is_enumerator(enumerator)).then(|| {
                Violation::new(
                    None,
                    Some(q.id),
                    format!("repeated question scoped to {enumerator}, which is not an enumerator"),
                )
            })
        })
        .collect()
}

/// List every structural invariant the program breaks.
pub fn check_program(program: &Program, catalog: &QuestionCatalog) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut block_ids = HashSet::new();
    for block in &program.blocks {
        if !block_ids.insert(block.id) {
            violations.push(Violation::new(
                Some(block.id),
                None,
                format!("duplicate block id: {}", block.id),
            ));
        }
    }

    // Question -> blocks it appears in, for cross-block uniqueness.
    let mut placements: HashMap<QuestionId, Vec<BlockId>> = HashMap::new();

    for block in &program.blocks {
        let mut seen = HashSet::new();
        let mut has_enumerator = false;

        if let Some(scope) = block.repeated_under {
            if !catalog.is_enumerator(scope) {
                violations.push(Violation::new(
                    Some(block.id),
                    Some(scope),
                    format!("block repeats under {scope}, which is not an enumerator"),
                ));
            }
        }

        for &id in &block.question_ids {
            if !seen.insert(id) {
                violations.push(Violation::new(
                    Some(block.id),
                    Some(id),
                    format!("question {id} appears twice in block {}", block.id),
                ));
                continue;
            }
            placements.entry(id).or_default().push(block.id);

            let Some(question) = catalog.get(id) else {
                violations.push(Violation::new(
                    Some(block.id),
                    Some(id),
                    format!("question {id} is not in the catalog"),
                ));
                continue;
            };

            has_enumerator |= question.is_enumerator();

            match (block.repeated_under, question.scope_enumerator_id()) {
                (Some(scope), Some(q_scope)) if scope != q_scope => {
                    violations.push(Violation::new(
                        Some(block.id),
                        Some(id),
                        format!(
                            "question {id} is scoped to {q_scope} but block repeats under {scope}"
                        ),
                    ));
                }
                (Some(scope), None) => {
                    violations.push(Violation::new(
                        Some(block.id),
                        Some(id),
                        format!("non-repeated question {id} in block repeated under {scope}"),
                    ));
                }
                (None, Some(_)) => {
                    violations.push(Violation::new(
                        Some(block.id),
                        Some(id),
                        format!("repeated question {id} in a top-level block"),
                    ));
                }
                _ => {}
            }
        }

        if has_enumerator && seen.len() > 1 {
            violations.push(Violation::new(
                Some(block.id),
                None,
                format!(
                    "block {} holds an enumerator alongside {} other question(s)",
                    block.id,
                    seen.len() - 1
                ),
            ));
        }
    }

    let mut shared: Vec<_> = placements
        .into_iter()
        .filter(|(_, blocks)| blocks.len() > 1)
        .collect();
    shared.sort_by_key(|(id, _)| *id);
    for (id, blocks) in shared {
        let list = blocks
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        violations.push(Violation::new(
            None,
            Some(id),
            format!("question {id} is placed in several blocks: {list}"),
        ));
    }

    violations
}

/// Fail on the first catalog or program violation.
pub fn validate_program(program: &Program, catalog: &QuestionCatalog) -> Result<()> {
    catalog.validate()?;
    match check_program(program, catalog).into_iter().next() {
        Some(v) => Err(BankError::ProgramInconsistency {
            program: program.id,
            reason: v.message,
        }),
        None => Ok(()),
    }
}
