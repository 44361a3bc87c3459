//! Question-bank eligibility engine.
//!
//! Computes, from scratch on every call, the set of catalog questions an
//! operator may add to a block. Nothing is cached: programs and catalogs are
//! small, and a fresh computation can never disagree with the structure it
//! was computed from.

use std::collections::BTreeSet;

use crate::catalog::QuestionCatalog;
use crate::error::{BankError, Result};
use crate::model::{Block, BlockId, BlockState, Program, QuestionId, QuestionKind};
use crate::validation::validate_program;

/// Compute the question bank for `block_id`.
///
/// Rules:
/// - a question placed anywhere in the program is never eligible;
/// - a repeated block offers only repeated questions scoped to its enumerator;
/// - a top-level block offers non-repeated questions, except that a block
///   holding an enumerator is sealed, and a non-empty block no longer
///   offers enumerators.
pub fn compute_bank(
    program: &Program,
    catalog: &QuestionCatalog,
    block_id: BlockId,
) -> Result<BTreeSet<QuestionId>> {
    let target = program
        .block(block_id)
        .ok_or(BankError::UnknownBlock(block_id))?;
    validate_program(program, catalog)?;

    let used = program.used_question_ids();
    let unused = catalog
        .list_questions()
        .iter()
        .filter(|q| !used.contains(&q.id));

    let bank: BTreeSet<QuestionId> = match block_state(target, catalog) {
        BlockState::RepeatedScoped(scope) => unused
            .filter(|q| q.scope_enumerator_id() == Some(scope))
            .map(|q| q.id)
            .collect(),
        BlockState::EnumeratorSealed => BTreeSet::new(),
        BlockState::NonEnumeratorPopulated => unused
            .filter(|q| matches!(q.kind, QuestionKind::Simple { .. }))
            .map(|q| q.id)
            .collect(),
        BlockState::Empty => unused
            .filter(|q| !q.is_repeated())
            .map(|q| q.id)
            .collect(),
    };

    tracing::debug!(
        program = %program.id,
        block = %block_id,
        eligible = bank.len(),
        "computed question bank"
    );
    Ok(bank)
}

/// Classify a block into its editing state.
pub fn block_state(block: &Block, catalog: &QuestionCatalog) -> BlockState {
    if let Some(scope) = block.repeated_under {
        return BlockState::RepeatedScoped(scope);
    }
    if block.is_empty() {
        return BlockState::Empty;
    }
    if block
        .question_ids
        .iter()
        .any(|&id| catalog.is_enumerator(id))
    {
        BlockState::EnumeratorSealed
    } else {
        BlockState::NonEnumeratorPopulated
    }
}

/// Whether `question` may be added to `block_id` right now.
pub fn is_eligible(
    program: &Program,
    catalog: &QuestionCatalog,
    block_id: BlockId,
    question: QuestionId,
) -> Result<bool> {
    Ok(compute_bank(program, catalog, block_id)?.contains(&question))
}
