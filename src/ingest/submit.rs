//! Category resolution and batch persistence.

use std::{fs, path::Path};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    batch::{BatchItem, ImageRef, ImportStats, QuestionBatch, SequenceId},
    question::{AnswerFields, CorrectChoice, OptionLetter, QuestionKind, TruthValue},
};
use crate::api::{
    AnswerPayload, ApiError, Category, CategoryFilter, CategoryKey, ContentApi,
    CreateQuestionRequest,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("the batch holds {batch} questions but the target expects {target}")]
    KindMismatch {
        batch: QuestionKind,
        target: QuestionKind,
    },

    #[error("a publisher name is required for this import")]
    MissingPublisher,

    #[error("no target category selected")]
    MissingCategory,
}

/// Where and how a batch is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitContext {
    pub category_id: String,
    pub kind: QuestionKind,
    pub publisher: Option<String>,
    pub require_publisher: bool,
}

impl SubmitContext {
    fn check(&self, batch: &QuestionBatch) -> Result<(), SubmitError> {
        if self.category_id.trim().is_empty() {
            return Err(SubmitError::MissingCategory);
        }
        check_target(
            batch,
            self.kind,
            self.publisher.as_deref(),
            self.require_publisher,
        )
    }
}

/// The preconditions that do not depend on a resolved category, so they
/// can run before any request is made.
pub fn check_target(
    batch: &QuestionBatch,
    kind: QuestionKind,
    publisher: Option<&str>,
    require_publisher: bool,
) -> Result<(), SubmitError> {
    if batch.kind() != kind {
        return Err(SubmitError::KindMismatch {
            batch: batch.kind(),
            target: kind,
        });
    }
    let has_publisher = publisher.is_some_and(|p| !p.trim().is_empty());
    if require_publisher && !has_publisher {
        return Err(SubmitError::MissingPublisher);
    }
    Ok(())
}

/// Answer texts sent for true/false questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrueFalseLabels {
    pub true_label: String,
    pub false_label: String,
}

impl Default for TrueFalseLabels {
    fn default() -> Self {
        Self {
            true_label: "Doğru".to_string(),
            false_label: "Yanlış".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Upload,
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub sequence_id: SequenceId,
    pub stage: FailureStage,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub stats: ImportStats,
    /// ids of the questions counted in `stats.saved`
    pub created_ids: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

/// Finds the category for `key`, creating it when none matches.
pub fn resolve_category<A>(api: &A, key: &CategoryKey) -> Result<Category, ApiError>
where
    A: ContentApi + ?Sized,
{
    let existing = api.list_categories(&CategoryFilter::from(key))?;
    if let Some(category) = existing.into_iter().find(|c| key.matches(c)) {
        debug!(id = %category.id, "using existing category");
        return Ok(category);
    }

    let category = api.create_category(key)?;
    info!(id = %category.id, grade = %key.grade, subject = %key.subject, unit = %key.unit, topic = %key.topic, "created category");
    Ok(category)
}

pub struct Submitter<'a, A: ContentApi + ?Sized> {
    api: &'a A,
    labels: TrueFalseLabels,
}

impl<'a, A: ContentApi + ?Sized> Submitter<'a, A> {
    pub fn new(api: &'a A, labels: TrueFalseLabels) -> Self {
        Self { api, labels }
    }

    /// Sends every valid item, in batch order, one request at a time.
    ///
    /// A failing item is counted and recorded; it never stops the items
    /// after it. Invalid items are neither sent nor counted.
    pub fn submit(
        &self,
        batch: &mut QuestionBatch,
        context: &SubmitContext,
    ) -> Result<SubmitOutcome, SubmitError> {
        context.check(batch)?;

        let mut outcome = SubmitOutcome {
            stats: batch.stats(),
            ..Default::default()
        };
        let pending: Vec<BatchItem> = batch.valid_items().cloned().collect();
        info!(items = pending.len(), kind = %context.kind, "submitting batch");

        for item in &pending {
            match self.submit_item(item, context) {
                Ok(id) => {
                    debug!(item = item.sequence_id(), %id, "question saved");
                    batch.record_server_id(item.sequence_id(), &id);
                    outcome.stats.saved += 1;
                    outcome.created_ids.push(id);
                }
                Err(failure) => {
                    warn!(item = failure.sequence_id, stage = ?failure.stage, reason = %failure.reason, "question not saved");
                    outcome.stats.failed += 1;
                    outcome.failures.push(failure);
                }
            }
        }

        info!(stats = %outcome.stats, "batch submitted");
        Ok(outcome)
    }

    fn submit_item(&self, item: &BatchItem, context: &SubmitContext) -> Result<String, ItemFailure> {
        let failure = |stage, reason: String| ItemFailure {
            sequence_id: item.sequence_id(),
            stage,
            reason,
        };

        let image_path = match item.image() {
            None => None,
            Some(ImageRef::Uploaded(url)) => Some(url.clone()),
            Some(ImageRef::Pending(path)) => Some(
                self.upload(path)
                    .map_err(|reason| failure(FailureStage::Upload, reason))?,
            ),
        };

        let request = build_request(item, context, &self.labels, image_path);
        self.api
            .create_question(&request)
            .map(|created| created.id)
            .map_err(|e| failure(FailureStage::Create, e.to_string()))
    }

    fn upload(&self, path: &Path) -> Result<String, String> {
        let bytes = fs::read(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        self.api
            .upload_image(&file_name, &bytes)
            .map(|uploaded| uploaded.url)
            .map_err(|e| e.to_string())
    }
}

/// Maps a validated item onto the create-request shape.
pub fn build_request(
    item: &BatchItem,
    context: &SubmitContext,
    labels: &TrueFalseLabels,
    image_path: Option<String>,
) -> CreateQuestionRequest {
    let fields = item.fields();
    let answers = match &fields.answer {
        AnswerFields::MultipleChoice { options, correct } => {
            let correct = match correct {
                CorrectChoice::Letter(letter) => Some(*letter),
                _ => None,
            };
            OptionLetter::ALL
                .iter()
                .map(|&letter| {
                    AnswerPayload::new(options[letter.index()].trim(), Some(letter) == correct)
                })
                .collect()
        }
        AnswerFields::TrueFalse { value } => {
            let is_true = matches!(value, TruthValue::Known(true));
            vec![
                AnswerPayload::new(labels.true_label.as_str(), is_true),
                AnswerPayload::new(labels.false_label.as_str(), !is_true),
            ]
        }
        AnswerFields::FreeText { answer } => vec![AnswerPayload::new(answer.trim(), true)],
    };

    CreateQuestionRequest {
        question_text: fields.text.trim().to_string(),
        question_type: context.kind.wire_name(),
        difficulty: item.difficulty().wire_name(),
        category_id: context.category_id.clone(),
        answers,
        image_path,
        publisher: context
            .publisher
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
    }
}
