//! Question catalog, program structure and eligibility engine.
//!
//! This crate defines the data model, invariant checks and the question-bank
//! computation that decides which questions an operator may add to a block,
//! plus the block mutations that re-check those rules before committing.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod store;
pub mod traits;
pub mod validation;

pub use catalog::QuestionCatalog;
pub use engine::compute_bank;
pub use error::BankError;
pub use model::{
    AnswerType, Block, BlockId, BlockState, Program, ProgramId, Question, QuestionId,
    QuestionKind,
};
pub use store::InMemoryProgramStore;
pub use traits::ProgramStore;
