//! Core trait definitions for program storage.
//!
//! The eligibility engine itself is a set of pure functions; this is the
//! seam where an editing service plugs in whatever holds its programs.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::QuestionCatalog;
use crate::engine;
use crate::error::Result;
use crate::model::{BlockId, Program, ProgramId, QuestionId};

// ---------------------------------------------------------------------------
// Program store trait
// ---------------------------------------------------------------------------

/// Holds programs and applies block mutations to them.
///
/// Each mutation is atomic: it is either fully committed or rejected with the
/// program left as it was. Reads hand out immutable snapshots.
pub trait ProgramStore: Send + Sync {
    /// The catalog the stored programs draw questions from.
    fn catalog(&self) -> &QuestionCatalog;

    /// Snapshot of a program as of this call.
    fn get_program(&self, id: ProgramId) -> Result<Arc<Program>>;

    /// Append `question` to `block` if it is currently in the block's bank.
    fn add_question_to_block(
        &self,
        program: ProgramId,
        block: BlockId,
        question: QuestionId,
    ) -> Result<()>;

    /// Remove `question` from `block`.
    fn remove_question_from_block(
        &self,
        program: ProgramId,
        block: BlockId,
        question: QuestionId,
    ) -> Result<()>;

    /// Append a block repeated under a placed enumerator.
    fn create_repeated_block(&self, program: ProgramId, enumerator: QuestionId)
        -> Result<BlockId>;

    /// Append an empty top-level block.
    fn add_block(&self, program: ProgramId, name: &str) -> Result<BlockId>;

    /// Delete a block and everything placed in it.
    fn remove_block(&self, program: ProgramId, block: BlockId) -> Result<()>;

    /// Compute the bank for a block against the current snapshot.
    fn compute_bank(&self, program: ProgramId, block: BlockId) -> Result<BTreeSet<QuestionId>> {
        let snapshot = self.get_program(program)?;
        engine::compute_bank(&snapshot, self.catalog(), block)
    }
}
