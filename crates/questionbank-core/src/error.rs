//! Error types for the eligibility engine and program store.
//!
//! Every variant is a precondition failure the caller can correct; none of
//! them is fatal to the process. Mutations that fail leave the program
//! untouched.

use thiserror::Error;

use crate::model::{BlockId, ProgramId, QuestionId};

/// Errors returned by bank computation, mutations and catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    /// The block id does not exist in the program.
    #[error("unknown block: {0}")]
    UnknownBlock(BlockId),

    /// The question is not in the block's current bank.
    #[error("question {question} is not eligible for block {block}")]
    NotEligible { block: BlockId, question: QuestionId },

    /// The question is not placed in the block.
    #[error("question {question} is not present in block {block}")]
    NotPresent { block: BlockId, question: QuestionId },

    /// The question is absent, not an enumerator, or not placed in the program.
    #[error("question {0} is not an enumerator placed in this program")]
    NotAnEnumerator(QuestionId),

    /// A repeated question's scope does not resolve to an enumerator.
    #[error("catalog inconsistency: question {question} is scoped to {enumerator}, which is not an enumerator in the catalog")]
    CatalogInconsistency {
        question: QuestionId,
        enumerator: QuestionId,
    },

    /// The question id is not in the catalog.
    #[error("unknown question: {0}")]
    UnknownQuestion(QuestionId),

    /// The program id is not held by the store.
    #[error("unknown program: {0}")]
    UnknownProgram(ProgramId),

    /// The store already holds a program with this id.
    #[error("program {0} is already registered")]
    DuplicateProgram(ProgramId),

    /// Every block id a program file can hold is taken.
    #[error("program {0} has no block ids left")]
    BlockIdsExhausted(ProgramId),

    /// The stored program already breaks a structural invariant.
    #[error("program {program} is inconsistent: {reason}")]
    ProgramInconsistency { program: ProgramId, reason: String },

    /// Two catalog questions share an id.
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),

    /// A new question clashes with an existing one in the same enumerator scope.
    #[error("question '{name}' conflicts with question {existing}")]
    QuestionConflict { name: String, existing: QuestionId },

    /// An update tried to change a question's name, scope or type.
    #[error("question {question} immutable members changed: {}", .mismatches.join("; "))]
    ImmutableMember {
        question: QuestionId,
        mismatches: Vec<String>,
    },
}

impl BankError {
    /// Returns `true` if the failure comes from a stale view of the program.
    ///
    /// The adapter recovers by recomputing the bank and re-prompting.
    pub fn is_stale_view(&self) -> bool {
        matches!(
            self,
            BankError::NotEligible { .. } | BankError::NotPresent { .. }
        )
    }

    /// Returns `true` for data integrity faults in the catalog or program.
    pub fn is_integrity_fault(&self) -> bool {
        matches!(
            self,
            BankError::CatalogInconsistency { .. }
                | BankError::ProgramInconsistency { .. }
                | BankError::DuplicateQuestion(_)
        )
    }
}

pub type Result<T, E = BankError> = std::result::Result<T, E>;
