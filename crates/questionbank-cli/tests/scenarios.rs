//! Walkthrough of block editing against an in-memory store.
//!
//! Follows one operator session: an empty block, a populated block, a sealed
//! enumerator block, then a block repeated under that enumerator.

use std::collections::BTreeSet;
use std::sync::Arc;

use questionbank_core::model::{
    AnswerType, Block, BlockId, Program, ProgramId, Question, QuestionId,
};
use questionbank_core::{BankError, InMemoryProgramStore, ProgramStore, QuestionCatalog};

const ADDRESS: QuestionId = QuestionId(1);
const NAME: QuestionId = QuestionId(2);
const TEXT: QuestionId = QuestionId(3);
const ENUMERATOR: QuestionId = QuestionId(4);
const REPEATED: QuestionId = QuestionId(5);

const PROGRAM: ProgramId = ProgramId(1);
const BLOCK: BlockId = BlockId(1);

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

fn store() -> InMemoryProgramStore {
    let store = InMemoryProgramStore::new(Arc::new(catalog()));
    store
        .insert_program(Program::new(1, "apc program").with_block(Block::new(BLOCK, "Block 1")))
        .unwrap();
    store
}

fn ids(ids: &[QuestionId]) -> BTreeSet<QuestionId> {
    ids.iter().copied().collect()
}

#[test]
fn empty_block_offers_every_non_repeated_question() {
    let store = store();
    assert_eq!(
        store.compute_bank(PROGRAM, BLOCK).unwrap(),
        ids(&[ADDRESS, NAME, TEXT, ENUMERATOR])
    );
}

#[test]
fn populated_block_drops_enumerators() {
    let store = store();
    store.add_question_to_block(PROGRAM, BLOCK, NAME).unwrap();
    assert_eq!(
        store.compute_bank(PROGRAM, BLOCK).unwrap(),
        ids(&[ADDRESS, TEXT])
    );
}

#[test]
fn enumerator_seals_its_block() {
    let store = store();
    store.add_question_to_block(PROGRAM, BLOCK, NAME).unwrap();
    store.remove_question_from_block(PROGRAM, BLOCK, NAME).unwrap();
    store.add_question_to_block(PROGRAM, BLOCK, ENUMERATOR).unwrap();

    assert!(store.compute_bank(PROGRAM, BLOCK).unwrap().is_empty());
    let err = store
        .add_question_to_block(PROGRAM, BLOCK, ADDRESS)
        .unwrap_err();
    assert_eq!(
        err,
        BankError::NotEligible {
            block: BLOCK,
            question: ADDRESS
        }
    );
}

#[test]
fn repeated_block_needs_a_placed_enumerator() {
    let store = store();
    store.add_question_to_block(PROGRAM, BLOCK, ENUMERATOR).unwrap();
    store
        .remove_question_from_block(PROGRAM, BLOCK, ENUMERATOR)
        .unwrap();

    // The block resets to empty once the enumerator is gone.
    assert_eq!(
        store.compute_bank(PROGRAM, BLOCK).unwrap(),
        ids(&[ADDRESS, NAME, TEXT, ENUMERATOR])
    );
    assert_eq!(
        store.create_repeated_block(PROGRAM, ENUMERATOR).unwrap_err(),
        BankError::NotAnEnumerator(ENUMERATOR)
    );

    store.add_question_to_block(PROGRAM, BLOCK, ENUMERATOR).unwrap();
    let repeated = store.create_repeated_block(PROGRAM, ENUMERATOR).unwrap();

    let program = store.get_program(PROGRAM).unwrap();
    assert_eq!(
        program.block(repeated).unwrap().repeated_under,
        Some(ENUMERATOR)
    );
    assert_eq!(
        store.compute_bank(PROGRAM, repeated).unwrap(),
        ids(&[REPEATED])
    );
}

#[test]
fn repeated_block_rejects_unscoped_questions() {
    let store = store();
    store.add_question_to_block(PROGRAM, BLOCK, ENUMERATOR).unwrap();
    let repeated = store.create_repeated_block(PROGRAM, ENUMERATOR).unwrap();

    let before = store.get_program(PROGRAM).unwrap();
    assert_eq!(
        store
            .add_question_to_block(PROGRAM, repeated, ADDRESS)
            .unwrap_err(),
        BankError::NotEligible {
            block: repeated,
            question: ADDRESS
        }
    );
    let after = store.get_program(PROGRAM).unwrap();
    assert!(Arc::ptr_eq(&before, &after));

    store
        .add_question_to_block(PROGRAM, repeated, REPEATED)
        .unwrap();
    assert!(store.compute_bank(PROGRAM, repeated).unwrap().is_empty());
}

#[test]
fn non_enumerator_cannot_open_a_repeated_block() {
    let store = store();
    store.add_question_to_block(PROGRAM, BLOCK, NAME).unwrap();
    assert_eq!(
        store.create_repeated_block(PROGRAM, NAME).unwrap_err(),
        BankError::NotAnEnumerator(NAME)
    );
}

#[test]
fn removed_block_releases_its_questions() {
    let store = store();
    store.add_question_to_block(PROGRAM, BLOCK, NAME).unwrap();
    let second = store.add_block(PROGRAM, "").unwrap();
    assert!(!store.compute_bank(PROGRAM, second).unwrap().contains(&NAME));

    store.remove_block(PROGRAM, BLOCK).unwrap();
    assert!(store.compute_bank(PROGRAM, second).unwrap().contains(&NAME));
    assert_eq!(
        store.get_program(PROGRAM).unwrap().block(second).unwrap().name,
        "Block 2"
    );
}

#[test]
fn unknown_ids_are_reported() {
    let store = store();
    assert_eq!(
        store.compute_bank(PROGRAM, BlockId(99)).unwrap_err(),
        BankError::UnknownBlock(BlockId(99))
    );
    assert_eq!(
        store.compute_bank(ProgramId(42), BLOCK).unwrap_err(),
        BankError::UnknownProgram(ProgramId(42))
    );
    assert_eq!(
        store
            .remove_question_from_block(PROGRAM, BLOCK, NAME)
            .unwrap_err(),
        BankError::NotPresent {
            block: BLOCK,
            question: NAME
        }
    );
}
