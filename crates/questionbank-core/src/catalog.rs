//! The question catalog: an ordered, read-only registry of question definitions.

use std::collections::{BTreeSet, HashMap};

use crate::error::{BankError, Result};
use crate::model::{Question, QuestionId, QuestionKind};

/// Ordered registry of question definitions, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionCatalog {
    /// Build a catalog, keeping the given order. Duplicate ids are rejected.
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        let mut index = HashMap::with_capacity(questions.len());
        for (pos, q) in questions.iter().enumerate() {
            if index.insert(q.id, pos).is_some() {
                return Err(BankError::DuplicateQuestion(q.id));
            }
        }
        Ok(Self { questions, index })
    }

    /// All questions in insertion order.
    pub fn list_questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.index.get(&id).map(|&pos| &self.questions[pos])
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn is_enumerator(&self, id: QuestionId) -> bool {
        self.get(id).is_some_and(Question::is_enumerator)
    }

    pub fn enumerators(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.is_enumerator())
    }

    /// Repeated questions scoped to `enumerator`.
    pub fn repeated_under(&self, enumerator: QuestionId) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(move |q| q.scope_enumerator_id() == Some(enumerator))
    }

    /// Resolve a set of ids to questions, in catalog order. Unknown ids are dropped.
    pub fn resolve_ordered(&self, ids: &BTreeSet<QuestionId>) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| ids.contains(&q.id))
            .collect()
    }

    /// Check every repeated question's scope resolves to an enumerator.
    pub fn validate(&self) -> Result<()> {
        for q in &self.questions {
            if let Some(enumerator) = q.scope_enumerator_id() {
                if !self.is_enumerator(enumerator) {
                    return Err(BankError::CatalogInconsistency {
                        question: q.id,
                        enumerator,
                    });
                }
            }
        }
        Ok(())
    }

    /// Add a new question.
    ///
    /// Questions conflict when they share an enumerator scope and a name.
    /// A repeated question must reference an enumerator already in the catalog.
    pub fn insert(&mut self, question: Question) -> Result<()> {
        if self.index.contains_key(&question.id) {
            return Err(BankError::DuplicateQuestion(question.id));
        }
        if let Some(enumerator) = question.scope_enumerator_id() {
            if !self.is_enumerator(enumerator) {
                return Err(BankError::CatalogInconsistency {
                    question: question.id,
                    enumerator,
                });
            }
        }
        let scope = question.scope_enumerator_id();
        if let Some(existing) = self
            .questions
            .iter()
            .find(|q| q.scope_enumerator_id() == scope && q.name == question.name)
        {
            return Err(BankError::QuestionConflict {
                name: question.name,
                existing: existing.id,
            });
        }

        tracing::debug!(
            question = %question.id,
            name = %question.name,
            "question added to catalog"
        );
        self.index.insert(question.id, self.questions.len());
        self.questions.push(question);
        Ok(())
    }

    /// Replace an existing definition. Name, enumerator scope and type are immutable.
    pub fn update(&mut self, question: Question) -> Result<()> {
        let Some(&pos) = self.index.get(&question.id) else {
            return Err(BankError::UnknownQuestion(question.id));
        };
        let current = &self.questions[pos];
        let mismatches = immutable_mismatches(current, &question);
        if !mismatches.is_empty() {
            return Err(BankError::ImmutableMember {
                question: question.id,
                mismatches,
            });
        }
        self.questions[pos] = question;
        Ok(())
    }
}

fn scope_label(scope: Option<QuestionId>) -> String {
    scope
        .map(|e| e.to_string())
        .unwrap_or_else(|| "[no enumerator]".to_string())
}

fn immutable_mismatches(current: &Question, update: &Question) -> Vec<String> {
    let mut mismatches = Vec::new();
    if current.name != update.name {
        mismatches.push(format!(
            "question names mismatch: {} does not match {}",
            current.name, update.name
        ));
    }
    if current.scope_enumerator_id() != update.scope_enumerator_id() {
        mismatches.push(format!(
            "question enumerator ids mismatch: {} does not match {}",
            scope_label(current.scope_enumerator_id()),
            scope_label(update.scope_enumerator_id())
        ));
    }
    let same_type = match (current.kind, update.kind) {
        (QuestionKind::Enumerator, QuestionKind::Enumerator) => true,
        (
            QuestionKind::Simple { answer_type: a },
            QuestionKind::Simple { answer_type: b },
        ) => a == b,
        (
            QuestionKind::Repeated { answer_type: a, .. },
            QuestionKind::Repeated { answer_type: b, .. },
        ) => a == b,
        _ => false,
    };
    if !same_type {
        mismatches.push(format!(
            "question types mismatch: {} does not match {}",
            current.type_tag(),
            update.type_tag()
        ));
    }
    mismatches
}
