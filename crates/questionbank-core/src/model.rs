//! Core data model types for questionbank.
//!
//! Questions, blocks and programs as the eligibility engine sees them.
//! Questions are owned by the catalog and never mutated here; blocks and
//! programs are edited through the operations in [`crate::store`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identity of a question, stable for the lifetime of a program.
    QuestionId
);
id_type!(
    /// Identity of a block, unique within its program.
    BlockId
);
id_type!(
    /// Identity of a program.
    ProgramId
);

/// Answer types that exist in both a plain and a repeated variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    Address,
    Checkbox,
    Date,
    Dropdown,
    Email,
    FileUpload,
    Id,
    Name,
    Number,
    Radio,
    Text,
}

impl AnswerType {
    /// Title-cased label used in type tags (e.g. `"FileUpload"`).
    pub fn label(&self) -> &'static str {
        match self {
            AnswerType::Address => "Address",
            AnswerType::Checkbox => "Checkbox",
            AnswerType::Date => "Date",
            AnswerType::Dropdown => "Dropdown",
            AnswerType::Email => "Email",
            AnswerType::FileUpload => "FileUpload",
            AnswerType::Id => "Id",
            AnswerType::Name => "Name",
            AnswerType::Number => "Number",
            AnswerType::Radio => "Radio",
            AnswerType::Text => "Text",
        }
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label().to_lowercase())
    }
}

impl FromStr for AnswerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "address" => Ok(AnswerType::Address),
            "checkbox" => Ok(AnswerType::Checkbox),
            "date" => Ok(AnswerType::Date),
            "dropdown" => Ok(AnswerType::Dropdown),
            "email" => Ok(AnswerType::Email),
            "fileupload" | "file_upload" | "file-upload" => Ok(AnswerType::FileUpload),
            "id" => Ok(AnswerType::Id),
            "name" => Ok(AnswerType::Name),
            "number" => Ok(AnswerType::Number),
            "radio" | "radio_button" => Ok(AnswerType::Radio),
            "text" => Ok(AnswerType::Text),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// What kind of question this is, and which enumerator scopes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    /// A plain question usable in any top-level block.
    Simple { answer_type: AnswerType },
    /// Introduces a repeatable entity. Has no repeated variant.
    Enumerator,
    /// One answer per entity of `enumerator_id`.
    Repeated {
        answer_type: AnswerType,
        enumerator_id: QuestionId,
    },
}

/// A question definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// Admin name, unique within an enumerator scope.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    pub fn simple(id: u64, name: impl Into<String>, answer_type: AnswerType) -> Self {
        Self {
            id: QuestionId(id),
            name: name.into(),
            description: String::new(),
            kind: QuestionKind::Simple { answer_type },
        }
    }

    pub fn enumerator(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: QuestionId(id),
            name: name.into(),
            description: String::new(),
            kind: QuestionKind::Enumerator,
        }
    }

    pub fn repeated(
        id: u64,
        name: impl Into<String>,
        answer_type: AnswerType,
        enumerator_id: u64,
    ) -> Self {
        Self {
            id: QuestionId(id),
            name: name.into(),
            description: String::new(),
            kind: QuestionKind::Repeated {
                answer_type,
                enumerator_id: QuestionId(enumerator_id),
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_enumerator(&self) -> bool {
        matches!(self.kind, QuestionKind::Enumerator)
    }

    pub fn is_repeated(&self) -> bool {
        matches!(self.kind, QuestionKind::Repeated { .. })
    }

    /// The enumerator this question is scoped to. Present iff repeated.
    pub fn scope_enumerator_id(&self) -> Option<QuestionId> {
        match self.kind {
            QuestionKind::Repeated { enumerator_id, .. } => Some(enumerator_id),
            _ => None,
        }
    }

    /// Type tag such as `"Address"`, `"RepeatedText"` or `"Enumerator"`.
    pub fn type_tag(&self) -> String {
        match self.kind {
            QuestionKind::Simple { answer_type } => answer_type.label().to_string(),
            QuestionKind::Enumerator => "Enumerator".to_string(),
            QuestionKind::Repeated { answer_type, .. } => {
                format!("Repeated{}", answer_type.label())
            }
        }
    }
}

/// An ordered grouping of questions within a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub name: String,
    /// The enumerator this block repeats under; `None` for top-level blocks.
    #[serde(default)]
    pub repeated_under: Option<QuestionId>,
    #[serde(default)]
    pub question_ids: Vec<QuestionId>,
}

impl Block {
    pub fn new(id: BlockId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            repeated_under: None,
            question_ids: Vec::new(),
        }
    }

    pub fn repeated(id: BlockId, name: impl Into<String>, enumerator: QuestionId) -> Self {
        Self {
            id,
            name: name.into(),
            repeated_under: Some(enumerator),
            question_ids: Vec::new(),
        }
    }

    pub fn with_questions(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.question_ids = ids.into_iter().map(QuestionId).collect();
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated_under.is_some()
    }

    pub fn contains(&self, question: QuestionId) -> bool {
        self.question_ids.contains(&question)
    }

    pub fn is_empty(&self) -> bool {
        self.question_ids.is_empty()
    }
}

/// Largest id that still fits a TOML integer.
pub const MAX_ID: u64 = i64::MAX as u64;

/// A program: an ordered sequence of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Program {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: ProgramId(id),
            name: name.into(),
            description: String::new(),
            blocks: Vec::new(),
        }
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// The block a question is placed in, if any.
    pub fn block_containing(&self, question: QuestionId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.contains(question))
    }

    /// Every question id placed in any block of the program.
    pub fn used_question_ids(&self) -> BTreeSet<QuestionId> {
        self.blocks
            .iter()
            .flat_map(|b| b.question_ids.iter().copied())
            .collect()
    }

    /// Next free block id (one past the largest in use).
    ///
    /// `None` once that would exceed [`MAX_ID`].
    pub fn next_block_id(&self) -> Option<BlockId> {
        let largest = self.blocks.iter().map(|b| b.id.0).max().unwrap_or(0);
        largest
            .checked_add(1)
            .filter(|&id| id <= MAX_ID)
            .map(BlockId)
    }
}

/// Editing state of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "enumerator", rename_all = "snake_case")]
pub enum BlockState {
    Empty,
    NonEnumeratorPopulated,
    EnumeratorSealed,
    /// Repeated under the given enumerator; never transitions to the others.
    RepeatedScoped(QuestionId),
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockState::Empty => write!(f, "empty"),
            BlockState::NonEnumeratorPopulated => write!(f, "populated"),
            BlockState::EnumeratorSealed => write!(f, "enumerator (sealed)"),
            BlockState::RepeatedScoped(e) => write!(f, "repeated under {e}"),
        }
    }
}
