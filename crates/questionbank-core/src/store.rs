//! Program structure mutations and an in-memory program store.
//!
//! The free functions operate on a single `Program` and validate before
//! touching it, so a rejected call never leaves a partial edit behind.
//! [`InMemoryProgramStore`] wraps them with one writer lock per program and
//! copy-on-write snapshots for readers.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::catalog::QuestionCatalog;
use crate::engine::compute_bank;
use crate::error::{BankError, Result};
use crate::model::{Block, BlockId, Program, ProgramId, QuestionId};
use crate::traits::ProgramStore;
use crate::validation::validate_program;

/// Append `question` to `block_id`, re-checking eligibility at call time.
pub fn add_question_to_block(
    program: &mut Program,
    catalog: &QuestionCatalog,
    block_id: BlockId,
    question: QuestionId,
) -> Result<()> {
    let bank = compute_bank(program, catalog, block_id)?;
    if !bank.contains(&question) {
        tracing::warn!(
            program = %program.id,
            block = %block_id,
            question = %question,
            "rejected add: question not in bank"
        );
        return Err(BankError::NotEligible {
            block: block_id,
            question,
        });
    }

    let block = program
        .block_mut(block_id)
        .ok_or(BankError::UnknownBlock(block_id))?;
    block.question_ids.push(question);
    tracing::info!(
        program = %program.id,
        block = %block_id,
        question = %question,
        "question added"
    );
    Ok(())
}

/// Remove `question` from `block_id`.
///
/// Eligibility elsewhere is recomputed on the next bank request; there is no
/// cleanup to do here.
pub fn remove_question_from_block(
    program: &mut Program,
    catalog: &QuestionCatalog,
    block_id: BlockId,
    question: QuestionId,
) -> Result<()> {
    if program.block(block_id).is_none() {
        return Err(BankError::UnknownBlock(block_id));
    }
    validate_program(program, catalog)?;

    let program_id = program.id;
    let block = program
        .block_mut(block_id)
        .ok_or(BankError::UnknownBlock(block_id))?;
    let Some(pos) = block.question_ids.iter().position(|&q| q == question) else {
        tracing::warn!(
            program = %program_id,
            block = %block_id,
            question = %question,
            "rejected remove: question not in block"
        );
        return Err(BankError::NotPresent {
            block: block_id,
            question,
        });
    };
    block.question_ids.remove(pos);
    tracing::info!(
        program = %program_id,
        block = %block_id,
        question = %question,
        "question removed"
    );
    Ok(())
}

/// Append a new block repeated under `enumerator`.
///
/// The enumerator must be an `Enumerator` question that is currently placed
/// in some block of the program.
pub fn create_repeated_block(
    program: &mut Program,
    catalog: &QuestionCatalog,
    enumerator: QuestionId,
) -> Result<BlockId> {
    validate_program(program, catalog)?;

    if !catalog.is_enumerator(enumerator) || program.block_containing(enumerator).is_none() {
        tracing::warn!(
            program = %program.id,
            question = %enumerator,
            "rejected repeated block: not a placed enumerator"
        );
        return Err(BankError::NotAnEnumerator(enumerator));
    }

    let id = next_block_id(program)?;
    let name = catalog
        .get(enumerator)
        .map(|q| format!("{} (repeated)", q.name))
        .unwrap_or_default();
    program.blocks.push(Block::repeated(id, name, enumerator));
    tracing::info!(
        program = %program.id,
        block = %id,
        enumerator = %enumerator,
        "repeated block created"
    );
    Ok(id)
}

/// Append an empty top-level block.
pub fn add_block(program: &mut Program, catalog: &QuestionCatalog, name: &str) -> Result<BlockId> {
    validate_program(program, catalog)?;

    let id = next_block_id(program)?;
    let name = if name.trim().is_empty() {
        format!("Block {id}")
    } else {
        name.to_string()
    };
    program.blocks.push(Block::new(id, name));
    tracing::info!(program = %program.id, block = %id, "block added");
    Ok(id)
}

/// Delete a block. Its questions become eligible elsewhere again.
pub fn remove_block(
    program: &mut Program,
    catalog: &QuestionCatalog,
    block_id: BlockId,
) -> Result<()> {
    let Some(pos) = program.blocks.iter().position(|b| b.id == block_id) else {
        return Err(BankError::UnknownBlock(block_id));
    };
    validate_program(program, catalog)?;

    let removed = program.blocks.remove(pos);
    tracing::info!(
        program = %program.id,
        block = %block_id,
        released = removed.question_ids.len(),
        "block removed"
    );
    Ok(())
}

fn next_block_id(program: &Program) -> Result<BlockId> {
    program.next_block_id().ok_or_else(|| {
        tracing::warn!(program = %program.id, "rejected new block: block ids exhausted");
        BankError::BlockIdsExhausted(program.id)
    })
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Per-program state: a writer lock and the current committed snapshot.
struct ProgramSlot {
    writer: Mutex<()>,
    current: RwLock<Arc<Program>>,
}

impl ProgramSlot {
    fn snapshot(&self) -> Arc<Program> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Program store that keeps every program in memory.
///
/// Mutations for one program are serialized by its writer lock and applied
/// to a copy that replaces the snapshot only on success. Readers never wait
/// on a writer beyond the pointer swap.
pub struct InMemoryProgramStore {
    catalog: Arc<QuestionCatalog>,
    programs: RwLock<HashMap<ProgramId, Arc<ProgramSlot>>>,
}

impl InMemoryProgramStore {
    pub fn new(catalog: Arc<QuestionCatalog>) -> Self {
        Self {
            catalog,
            programs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a program. Ids already held by the store are rejected.
    pub fn insert_program(&self, program: Program) -> Result<()> {
        validate_program(&program, &self.catalog)?;
        let id = program.id;
        let mut programs = self.programs.write().unwrap_or_else(PoisonError::into_inner);
        match programs.entry(id) {
            Entry::Occupied(_) => {
                tracing::warn!(program = %id, "rejected registration: id already in use");
                Err(BankError::DuplicateProgram(id))
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(ProgramSlot {
                    writer: Mutex::new(()),
                    current: RwLock::new(Arc::new(program)),
                }));
                tracing::debug!(program = %id, "program registered");
                Ok(())
            }
        }
    }

    /// Ids of every stored program, sorted.
    pub fn program_ids(&self) -> Vec<ProgramId> {
        let mut ids: Vec<_> = self
            .programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    fn slot(&self, id: ProgramId) -> Result<Arc<ProgramSlot>> {
        self.programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(BankError::UnknownProgram(id))
    }

    /// Apply `op` to a copy of the program and commit it if `op` succeeds.
    fn mutate<T>(
        &self,
        id: ProgramId,
        op: impl FnOnce(&mut Program, &QuestionCatalog) -> Result<T>,
    ) -> Result<T> {
        let slot = self.slot(id)?;
        let _writer = slot.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut working = Program::clone(&slot.snapshot());
        let out = op(&mut working, &self.catalog)?;
        *slot.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(working);
        Ok(out)
    }
}

impl ProgramStore for InMemoryProgramStore {
    fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    fn get_program(&self, id: ProgramId) -> Result<Arc<Program>> {
        Ok(self.slot(id)?.snapshot())
    }

    fn add_question_to_block(
        &self,
        program: ProgramId,
        block: BlockId,
        question: QuestionId,
    ) -> Result<()> {
        self.mutate(program, |p, c| add_question_to_block(p, c, block, question))
    }

    fn remove_question_from_block(
        &self,
        program: ProgramId,
        block: BlockId,
        question: QuestionId,
    ) -> Result<()> {
        self.mutate(program, |p, c| remove_question_from_block(p, c, block, question))
    }

    fn create_repeated_block(
        &self,
        program: ProgramId,
        enumerator: QuestionId,
    ) -> Result<BlockId> {
        self.mutate(program, |p, c| create_repeated_block(p, c, enumerator))
    }

    fn add_block(&self, program: ProgramId, name: &str) -> Result<BlockId> {
        self.mutate(program, |p, c| add_block(p, c, name))
    }

    fn remove_block(&self, program: ProgramId, block: BlockId) -> Result<()> {
        self.mutate(program, |p, c| remove_block(p, c, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerType, Question, MAX_ID};

    fn catalog() -> QuestionCatalog {
        QuestionCatalog::new(vec![
            Question::simple(1, "apc-address", AnswerType::Address),
            Question::simple(2, "apc-name", AnswerType::Name),
            Question::simple(3, "apc-text", AnswerType::Text),
            Question::enumerator(4, "apc-enumerator"),
            Question::repeated(5, "apc-repeated", AnswerType::Text, 4),
        ])
        .unwrap()
    }

    fn program() -> Program {
        Program::new(1, "apc program").with_block(Block::new(BlockId(1), "Block 1"))
    }

    #[test]
    fn add_appends_in_order() {
        let catalog = catalog();
        let mut program = program();
        add_question_to_block(&mut program, &catalog, BlockId(1), QuestionId(3)).unwrap();
        add_question_to_block(&mut program, &catalog, BlockId(1), QuestionId(1)).unwrap();
        assert_eq!(
            program.block(BlockId(1)).unwrap().question_ids,
            vec![QuestionId(3), QuestionId(1)]
        );
    }

    #[test]
    fn add_rejects_ineligible_without_mutating() {
        let catalog = catalog();
        let mut program = program();
        add_question_to_block(&mut program, &catalog, BlockId(1), QuestionId(2)).unwrap();
        let before = program.clone();

        let err =
            add_question_to_block(&mut program, &catalog, BlockId(1), QuestionId(4)).unwrap_err();
        assert_eq!(
            err,
            BankError::NotEligible {
                block: BlockId(1),
                question: QuestionId(4)
            }
        );
        // Re-adding a placed question is also ineligible.
        assert!(
            add_question_to_block(&mut program, &catalog, BlockId(1), QuestionId(2)).is_err()
        );
        assert_eq!(program, before);
    }

    #[test]
    fn remove_requires_presence() {
        let catalog = catalog();
        let mut program = program();
        let err = remove_question_from_block(&mut program, &catalog, BlockId(1), QuestionId(2))
            .unwrap_err();
        assert!(err.is_stale_view());
        assert_eq!(
            remove_question_from_block(&mut program, &catalog, BlockId(8), QuestionId(2)),
            Err(BankError::UnknownBlock(BlockId(8)))
        );
    }

    #[test]
    fn repeated_block_needs_placed_enumerator() {
        let catalog = catalog();
        let mut program = program();
        assert_eq!(
            create_repeated_block(&mut program, &catalog, QuestionId(4)),
            Err(BankError::NotAnEnumerator(QuestionId(4)))
        );
        assert_eq!(
            create_repeated_block(&mut program, &catalog, QuestionId(2)),
            Err(BankError::NotAnEnumerator(QuestionId(2)))
        );
        assert_eq!(
            create_repeated_block(&mut program, &catalog, QuestionId(40)),
            Err(BankError::NotAnEnumerator(QuestionId(40)))
        );

        add_question_to_block(&mut program, &catalog, BlockId(1), QuestionId(4)).unwrap();
        let id = create_repeated_block(&mut program, &catalog, QuestionId(4)).unwrap();
        let block = program.block(id).unwrap();
        assert_eq!(block.repeated_under, Some(QuestionId(4)));
        assert!(block.question_ids.is_empty());
        assert_eq!(block.name, "apc-enumerator (repeated)");
        assert_eq!(program.blocks.last().map(|b| b.id), Some(id));
    }

    #[test]
    fn add_and_remove_blocks() {
        let catalog = catalog();
        let mut program = program();
        let id = add_block(&mut program, &catalog, "").unwrap();
        assert_eq!(id, BlockId(2));
        assert_eq!(program.block(id).unwrap().name, "Block 2");

        add_question_to_block(&mut program, &catalog, id, QuestionId(1)).unwrap();
        assert!(!compute_bank(&program, &catalog, BlockId(1))
            .unwrap()
            .contains(&QuestionId(1)));

        remove_block(&mut program, &catalog, id).unwrap();
        assert!(compute_bank(&program, &catalog, BlockId(1))
            .unwrap()
            .contains(&QuestionId(1)));
        assert_eq!(
            remove_block(&mut program, &catalog, id),
            Err(BankError::UnknownBlock(id))
        );
    }

    #[test]
    fn store_commits_and_snapshots() {
        let store = InMemoryProgramStore::new(Arc::new(catalog()));
        store.insert_program(program()).unwrap();
        let pid = ProgramId(1);

        let before = store.get_program(pid).unwrap();
        store
            .add_question_to_block(pid, BlockId(1), QuestionId(4))
            .unwrap();
        let after = store.get_program(pid).unwrap();

        // The earlier snapshot is untouched by the commit.
        assert!(before.block(BlockId(1)).unwrap().is_empty());
        assert_eq!(
            after.block(BlockId(1)).unwrap().question_ids,
            vec![QuestionId(4)]
        );
        assert!(store.compute_bank(pid, BlockId(1)).unwrap().is_empty());

        let repeated = store.create_repeated_block(pid, QuestionId(4)).unwrap();
        assert_eq!(
            store
                .compute_bank(pid, repeated)
                .unwrap()
                .into_iter()
                .collect::<Vec<_>>(),
            vec![QuestionId(5)]
        );
    }

    #[test]
    fn store_rejections_leave_snapshot_in_place() {
        let store = InMemoryProgramStore::new(Arc::new(catalog()));
        store.insert_program(program()).unwrap();
        let pid = ProgramId(1);
        let before = store.get_program(pid).unwrap();

        assert!(store
            .add_question_to_block(pid, BlockId(1), QuestionId(5))
            .is_err());
        assert!(Arc::ptr_eq(&before, &store.get_program(pid).unwrap()));
        assert_eq!(
            store.get_program(ProgramId(9)).unwrap_err(),
            BankError::UnknownProgram(ProgramId(9))
        );
    }

    #[test]
    fn store_refuses_inconsistent_programs() {
        let store = InMemoryProgramStore::new(Arc::new(catalog()));
        let bad = Program::new(2, "bad")
            .with_block(Block::new(BlockId(1), "a").with_questions([4, 1]));
        assert!(store.insert_program(bad).is_err());
        assert!(store.program_ids().is_empty());
    }

    #[test]
    fn new_blocks_stop_when_ids_run_out() {
        let catalog = catalog();
        let mut program =
            Program::new(1, "apc program").with_block(Block::new(BlockId(MAX_ID), "Block 1"));
        let before = program.clone();

        assert_eq!(
            add_block(&mut program, &catalog, ""),
            Err(BankError::BlockIdsExhausted(ProgramId(1)))
        );
        add_question_to_block(&mut program, &catalog, BlockId(MAX_ID), QuestionId(4)).unwrap();
        assert_eq!(
            create_repeated_block(&mut program, &catalog, QuestionId(4)),
            Err(BankError::BlockIdsExhausted(ProgramId(1)))
        );
        assert_eq!(program.blocks.len(), before.blocks.len());
    }

    #[test]
    fn store_rejects_duplicate_registration() {
        let store = InMemoryProgramStore::new(Arc::new(catalog()));
        store.insert_program(program()).unwrap();
        store
            .add_question_to_block(ProgramId(1), BlockId(1), QuestionId(2))
            .unwrap();

        assert_eq!(
            store.insert_program(program()),
            Err(BankError::DuplicateProgram(ProgramId(1)))
        );
        // The committed edit survives the rejected registration.
        assert_eq!(
            store
                .get_program(ProgramId(1))
                .unwrap()
                .block(BlockId(1))
                .unwrap()
                .question_ids,
            vec![QuestionId(2)]
        );
    }

    #[test]
    fn concurrent_writers_never_share_a_question() {
        use std::thread;

        let store = Arc::new(InMemoryProgramStore::new(Arc::new(catalog())));
        let mut program = program();
        program.blocks.push(Block::new(BlockId(2), "Block 2"));
        store.insert_program(program).unwrap();

        let handles: Vec<_> = [BlockId(1), BlockId(2)]
            .into_iter()
            .map(|block| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .add_question_to_block(ProgramId(1), block, QuestionId(3))
                        .is_ok()
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        let snapshot = store.get_program(ProgramId(1)).unwrap();
        assert!(validate_program(&snapshot, store.catalog()).is_ok());
    }
}
