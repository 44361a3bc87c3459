use criterion::{black_box, criterion_group, criterion_main, Criterion};

use questionbank_core::model::{AnswerType, Block, BlockId, Program, Question, QuestionId};
use questionbank_core::parser::parse_program_str;
use questionbank_core::{compute_bank, QuestionCatalog};

const TYPES: [AnswerType; 4] = [
    AnswerType::Address,
    AnswerType::Name,
    AnswerType::Text,
    AnswerType::Number,
];

/// `plain` simple questions, then `enumerators` enumerators with `per_enum`
/// repeated questions each.
fn make_catalog(plain: u64, enumerators: u64, per_enum: u64) -> QuestionCatalog {
    let mut questions = Vec::new();
    for i in 0..plain {
        questions.push(Question::simple(
            i + 1,
            format!("plain-{i}"),
            TYPES[(i % 4) as usize],
        ));
    }
    let mut next = plain + 1;
    for e in 0..enumerators {
        let enum_id = next;
        questions.push(Question::enumerator(enum_id, format!("enum-{e}")));
        next += 1;
        for r in 0..per_enum {
            questions.push(Question::repeated(
                next,
                format!("repeated-{e}-{r}"),
                TYPES[(r % 4) as usize],
                enum_id,
            ));
            next += 1;
        }
    }
    QuestionCatalog::new(questions).unwrap()
}

/// Blocks of five plain questions each, plus one enumerator block and its repeated block.
fn make_program(plain: u64, enumerator: QuestionId) -> Program {
    let mut program = Program::new(1, "bench");
    let mut id = 1;
    for chunk in (1..=plain).collect::<Vec<_>>().chunks(5) {
        program
            .blocks
            .push(Block::new(BlockId(id), format!("block-{id}")).with_questions(chunk.to_vec()));
        id += 1;
    }
    program
        .blocks
        .push(Block::new(BlockId(id), "enumerator").with_questions([enumerator.0]));
    program
        .blocks
        .push(Block::repeated(BlockId(id + 1), "repeated", enumerator));
    program.blocks.push(Block::new(BlockId(id + 2), "empty"));
    program
}

fn bench_compute_bank(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_bank");

    for (plain, enums, per_enum) in [(20, 2, 5), (200, 10, 10), (2000, 20, 50)] {
        let catalog = make_catalog(plain, enums, per_enum);
        let used = plain / 2;
        let program = make_program(used, QuestionId(plain + 1));
        let empty = program.blocks.last().unwrap().id;
        let repeated = program.blocks[program.blocks.len() - 2].id;

        group.bench_function(format!("empty_block/questions={}", catalog.len()), |b| {
            b.iter(|| compute_bank(black_box(&program), black_box(&catalog), black_box(empty)))
        });
        group.bench_function(format!("repeated_block/questions={}", catalog.len()), |b| {
            b.iter(|| compute_bank(black_box(&program), black_box(&catalog), black_box(repeated)))
        });
    }

    group.finish();
}

fn bench_parse_program(c: &mut Criterion) {
    let mut toml = String::from("[program]\nid = 1\nname = \"bench\"\n");
    for i in 1..=200u64 {
        toml.push_str(&format!(
            "\n[[blocks]]\nid = {i}\nname = \"block-{i}\"\nquestions = [{}, {}]\n",
            i * 2 - 1,
            i * 2
        ));
    }
    let path = std::path::PathBuf::from("bench.toml");

    c.bench_function("parse_program/200_blocks", |b| {
        b.iter(|| parse_program_str(black_box(&toml), &path).unwrap())
    });
}

criterion_group!(benches, bench_compute_bank, bench_parse_program);
criterion_main!(benches);
