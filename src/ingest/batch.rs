//! In-memory batch of question templates shared by both entry paths.

use std::{fmt, path::PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::{
    question::{
        validate, AnswerFields, CorrectChoice, Difficulty, OptionLetter, QuestionFields,
        QuestionKind, TextRules, TruthValue, Validation,
    },
    rows::{classify_row, CandidateQuestion},
};
use crate::api::CategoryKey;

pub type SequenceId = u32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("no item with id {0} in the batch")]
    UnknownItem(SequenceId),

    #[error("item {0} was imported from a spreadsheet and cannot be edited")]
    ImportedItemLocked(SequenceId),

    #[error("item {sequence_id} is not a {kind} question")]
    WrongKind {
        sequence_id: SequenceId,
        kind: QuestionKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// local file, uploaded when the owning item is submitted
    Pending(PathBuf),
    /// already on the server
    Uploaded(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOrigin {
    Manual,
    Imported { row: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    sequence_id: SequenceId,
    origin: ItemOrigin,
    fields: QuestionFields,
    difficulty: Difficulty,
    image: Option<ImageRef>,
    validation: Validation,
    server_id: Option<String>,
}

impl BatchItem {
    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    pub fn origin(&self) -> ItemOrigin {
        self.origin
    }

    pub fn fields(&self) -> &QuestionFields {
        &self.fields
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    pub fn is_valid(&self) -> bool {
        self.validation.is_valid()
    }

    /// Id assigned by the server once the item has been saved.
    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref()
    }

    fn revalidate(&mut self, kind: QuestionKind) {
        self.validation = match self.origin {
            ItemOrigin::Manual => validate(kind, &self.fields, TextRules::Manual),
            ItemOrigin::Imported { row } => classify_row(kind, row, &self.fields),
        };
    }
}

/// Aggregate counters for one import session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub saved: usize,
    pub failed: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total {}, valid {}, invalid {}, saved {}, failed {}",
            self.total, self.valid, self.invalid, self.saved, self.failed
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBatch {
    kind: QuestionKind,
    category: Option<CategoryKey>,
    items: Vec<BatchItem>,
    next_sequence: SequenceId,
}

impl QuestionBatch {
    pub fn new(kind: QuestionKind) -> Self {
        Self {
            kind,
            category: None,
            items: Vec::new(),
            next_sequence: 1,
        }
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn category(&self) -> Option<&CategoryKey> {
        self.category.as_ref()
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, sequence_id: SequenceId) -> Option<&BatchItem> {
        self.items.iter().find(|i| i.sequence_id == sequence_id)
    }

    pub fn valid_items(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter().filter(|i| i.is_valid())
    }

    pub fn stats(&self) -> ImportStats {
        let valid = self.valid_items().count();
        ImportStats {
            total: self.items.len(),
            valid,
            invalid: self.items.len() - valid,
            ..Default::default()
        }
    }

    fn next_id(&mut self) -> SequenceId {
        let id = self.next_sequence;
        self.next_sequence += 1;
        id
    }

    /// Appends a blank manual item for the batch's type.
    pub fn add_item(&mut self) -> SequenceId {
        let sequence_id = self.next_id();
        let mut item = BatchItem {
            sequence_id,
            origin: ItemOrigin::Manual,
            fields: QuestionFields::blank(self.kind),
            difficulty: Difficulty::default(),
            image: None,
            validation: Validation::Valid,
            server_id: None,
        };
        item.revalidate(self.kind);
        self.items.push(item);
        sequence_id
    }

    /// Appends spreadsheet rows, in row order, as read-only items.
    pub fn load_candidates(&mut self, candidates: Vec<CandidateQuestion>) {
        let count = candidates.len();
        for candidate in candidates {
            let sequence_id = self.next_id();
            let (row, fields, difficulty) = candidate.into_parts();
            let mut item = BatchItem {
                sequence_id,
                origin: ItemOrigin::Imported { row },
                fields,
                difficulty,
                image: None,
                validation: Validation::Valid,
                server_id: None,
            };
            item.revalidate(self.kind);
            self.items.push(item);
        }
        debug!(count, "loaded spreadsheet rows into batch");
    }

    /// Copies an item under a new id. An attached image is shared by
    /// reference and uploaded separately when the copy is submitted.
    pub fn duplicate(&mut self, sequence_id: SequenceId) -> Result<SequenceId, BatchError> {
        let source = self
            .get(sequence_id)
            .ok_or(BatchError::UnknownItem(sequence_id))?
            .clone();
        let new_id = self.next_id();
        self.items.push(BatchItem {
            sequence_id: new_id,
            server_id: None,
            ..source
        });
        Ok(new_id)
    }

    pub fn remove(&mut self, sequence_id: SequenceId) -> Result<BatchItem, BatchError> {
        let index = self
            .items
            .iter()
            .position(|i| i.sequence_id == sequence_id)
            .ok_or(BatchError::UnknownItem(sequence_id))?;
        Ok(self.items.remove(index))
    }

    fn item_mut(&mut self, sequence_id: SequenceId) -> Result<&mut BatchItem, BatchError> {
        self.items
            .iter_mut()
            .find(|i| i.sequence_id == sequence_id)
            .ok_or(BatchError::UnknownItem(sequence_id))
    }

    // every edit to text or answer goes through here so validity never goes stale
    fn edit_fields(
        &mut self,
        sequence_id: SequenceId,
        edit: impl FnOnce(&mut QuestionFields) -> bool,
    ) -> Result<(), BatchError> {
        let kind = self.kind;
        let item = self.item_mut(sequence_id)?;
        if let ItemOrigin::Imported { .. } = item.origin {
            return Err(BatchError::ImportedItemLocked(sequence_id));
        }
        if !edit(&mut item.fields) {
            return Err(BatchError::WrongKind { sequence_id, kind });
        }
        item.revalidate(kind);
        Ok(())
    }

    pub fn set_question_text(
        &mut self,
        sequence_id: SequenceId,
        text: &str,
    ) -> Result<(), BatchError> {
        self.edit_fields(sequence_id, |fields| {
            fields.text = text.to_string();
            true
        })
    }

    pub fn set_option(
        &mut self,
        sequence_id: SequenceId,
        letter: OptionLetter,
        text: &str,
    ) -> Result<(), BatchError> {
        self.edit_fields(sequence_id, |fields| match &mut fields.answer {
            AnswerFields::MultipleChoice { options, .. } => {
                options[letter.index()] = text.to_string();
                true
            }
            _ => false,
        })
    }

    /// Marks `letter` correct, clearing any previous selection.
    pub fn select_correct(
        &mut self,
        sequence_id: SequenceId,
        letter: OptionLetter,
    ) -> Result<(), BatchError> {
        self.edit_fields(sequence_id, |fields| match &mut fields.answer {
            AnswerFields::MultipleChoice { correct, .. } => {
                *correct = CorrectChoice::Letter(letter);
                true
            }
            _ => false,
        })
    }

    pub fn set_true_false(&mut self, sequence_id: SequenceId, value: bool) -> Result<(), BatchError> {
        self.edit_fields(sequence_id, |fields| match &mut fields.answer {
            AnswerFields::TrueFalse { value: current } => {
                *current = TruthValue::Known(value);
                true
            }
            _ => false,
        })
    }

    pub fn set_answer_text(&mut self, sequence_id: SequenceId, text: &str) -> Result<(), BatchError> {
        self.edit_fields(sequence_id, |fields| match &mut fields.answer {
            AnswerFields::FreeText { answer } => {
                *answer = text.to_string();
                true
            }
            _ => false,
        })
    }

    pub fn set_difficulty(
        &mut self,
        sequence_id: SequenceId,
        difficulty: Difficulty,
    ) -> Result<(), BatchError> {
        self.item_mut(sequence_id)?.difficulty = difficulty;
        Ok(())
    }

    pub fn attach_image(
        &mut self,
        sequence_id: SequenceId,
        image: Option<ImageRef>,
    ) -> Result<(), BatchError> {
        self.item_mut(sequence_id)?.image = image;
        Ok(())
    }

    pub(crate) fn record_server_id(&mut self, sequence_id: SequenceId, server_id: &str) {
        if let Ok(item) = self.item_mut(sequence_id) {
            item.server_id = Some(server_id.to_string());
        }
    }

    /// Switches the question type. With items present, `confirm` is asked
    /// (with the item count) and the whole batch is discarded on `true`;
    /// on `false` nothing changes. Returns whether the new type is active.
    pub fn change_kind(&mut self, kind: QuestionKind, confirm: impl FnOnce(usize) -> bool) -> bool {
        if kind == self.kind {
            return true;
        }
        if !self.discard_confirmed(confirm) {
            return false;
        }
        info!(from = %self.kind, to = %kind, "question type changed");
        self.kind = kind;
        true
    }

    /// Same contract as `change_kind`, for the target category.
    pub fn change_category(
        &mut self,
        category: Option<CategoryKey>,
        confirm: impl FnOnce(usize) -> bool,
    ) -> bool {
        if category == self.category {
            return true;
        }
        if !self.discard_confirmed(confirm) {
            return false;
        }
        self.category = category;
        true
    }

    fn discard_confirmed(&mut self, confirm: impl FnOnce(usize) -> bool) -> bool {
        if self.items.is_empty() {
            return true;
        }
        if !confirm(self.items.len()) {
            return false;
        }
        info!(discarded = self.items.len(), "batch cleared");
        self.items.clear();
        self.next_sequence = 1;
        true
    }
}
