//! TOML catalog and program files.
//!
//! Loads question catalogs and programs from TOML, and writes program edits
//! back in place so the rest of an operator's file (comments, extra keys)
//! survives.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use toml_edit::{value, Array, ArrayOfTables, DocumentMut, Item, Table};

use crate::catalog::QuestionCatalog;
use crate::model::{
    AnswerType, Block, BlockId, Program, ProgramId, Question, QuestionId, QuestionKind,
};

/// Intermediate TOML structure for catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u64,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    question_type: String,
    /// Enumerator the question repeats under; makes it a repeated question.
    #[serde(default)]
    enumerator: Option<u64>,
}

/// Intermediate TOML structure for program files.
#[derive(Debug, Deserialize)]
struct TomlProgramFile {
    program: TomlProgramHeader,
    #[serde(default)]
    blocks: Vec<TomlBlock>,
}

#[derive(Debug, Deserialize)]
struct TomlProgramHeader {
    id: u64,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlBlock {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    repeated_under: Option<u64>,
    #[serde(default)]
    questions: Vec<u64>,
}

impl TryFrom<TomlQuestion> for Question {
    type Error = anyhow::Error;

    fn try_from(q: TomlQuestion) -> Result<Self> {
        let kind = if q.question_type.eq_ignore_ascii_case("enumerator") {
            if q.enumerator.is_some() {
                anyhow::bail!(
                    "question {} ({}): enumerator questions cannot repeat under another enumerator",
                    q.id,
                    q.name
                );
            }
            QuestionKind::Enumerator
        } else {
            let answer_type: AnswerType = q
                .question_type
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
            match q.enumerator {
                Some(e) => QuestionKind::Repeated {
                    answer_type,
                    enumerator_id: QuestionId(e),
                },
                None => QuestionKind::Simple { answer_type },
            }
        };

        Ok(Question {
            id: QuestionId(q.id),
            name: q.name,
            description: q.description,
            kind,
        })
    }
}

/// Parse a catalog TOML file.
pub fn parse_catalog(path: &Path) -> Result<QuestionCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a catalog from a TOML string (useful for testing).
///
/// Dangling enumerator references are kept; they surface through validation.
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<QuestionCatalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(Question::try_from)
        .collect::<Result<Vec<_>>>()?;

    QuestionCatalog::new(questions)
        .with_context(|| format!("invalid catalog: {}", source_path.display()))
}

/// Parse a program TOML file.
pub fn parse_program(path: &Path) -> Result<Program> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read program file: {}", path.display()))?;

    parse_program_str(&content, path)
}

/// Parse a program from a TOML string (useful for testing).
pub fn parse_program_str(content: &str, source_path: &Path) -> Result<Program> {
    let parsed: TomlProgramFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let blocks = parsed
        .blocks
        .into_iter()
        .map(|b| Block {
            id: BlockId(b.id),
            name: b.name,
            repeated_under: b.repeated_under.map(QuestionId),
            question_ids: b.questions.into_iter().map(QuestionId).collect(),
        })
        .collect();

    Ok(Program {
        id: ProgramId(parsed.program.id),
        name: parsed.program.name,
        description: parsed.program.description,
        blocks,
    })
}

/// Recursively load every program file (a `.toml` with a `[program]` table) in a directory.
pub fn load_program_directory(dir: &Path) -> Result<Vec<Program>> {
    let mut programs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            programs.extend(load_program_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if !looks_like_program(&content) {
                tracing::debug!("skipping {}: no [program] table", path.display());
                continue;
            }
            match parse_program_str(&content, &path) {
                Ok(program) => programs.push(program),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(programs)
}

fn looks_like_program(content: &str) -> bool {
    content
        .parse::<toml::Table>()
        .is_ok_and(|t| t.contains_key("program"))
}

/// Render a program as TOML, editing `existing` in place when given.
///
/// Only the `[program]` header keys and the `[[blocks]]` array are rewritten.
pub fn render_program(program: &Program, existing: Option<&str>) -> Result<String> {
    let mut doc = match existing {
        Some(content) => content
            .parse::<DocumentMut>()
            .context("failed to parse existing program file")?,
        None => DocumentMut::new(),
    };

    if !doc.contains_key("program") {
        doc.insert("program", Item::Table(Table::new()));
    }
    let header = doc["program"]
        .as_table_mut()
        .context("`program` is not a table")?;
    header.insert("id", value(toml_int(program.id.0, "program id")?));
    header.insert("name", value(program.name.as_str()));
    if !program.description.is_empty() || header.contains_key("description") {
        header.insert("description", value(program.description.as_str()));
    }

    let mut blocks = ArrayOfTables::new();
    for block in &program.blocks {
        let mut table = Table::new();
        table.insert("id", value(toml_int(block.id.0, "block id")?));
        table.insert("name", value(block.name.as_str()));
        if let Some(enumerator) = block.repeated_under {
            table.insert(
                "repeated_under",
                value(toml_int(enumerator.0, "enumerator id")?),
            );
        }
        let mut questions = Array::new();
        for q in &block.question_ids {
            questions.push(toml_int(q.0, "question id")?);
        }
        table.insert("questions", value(questions));
        blocks.push(table);
    }
    doc.insert("blocks", Item::ArrayOfTables(blocks));

    Ok(doc.to_string())
}

/// TOML integers are signed 64-bit; ids beyond that cannot be written back.
fn toml_int(id: u64, what: &str) -> Result<i64> {
    i64::try_from(id).with_context(|| format!("{what} {id} does not fit in a TOML integer"))
}

/// Write a program back to `path`, preserving unrelated content already there.
pub fn save_program(path: &Path, program: &Program) -> Result<()> {
    let existing = if path.exists() {
        Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read program file: {}", path.display()))?,
        )
    } else {
        None
    };

    let rendered = render_program(program, existing.as_deref())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, rendered)
        .with_context(|| format!("failed to write program file: {}", path.display()))?;
    tracing::debug!(program = %program.id, path = %path.display(), "program saved");
    Ok(())
}
