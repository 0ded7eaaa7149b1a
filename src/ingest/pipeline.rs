//! End-to-end runs: spreadsheet or manual batch in, saved questions out.

use std::{fs, path::Path};

use thiserror::Error;
use tracing::{info, info_span};

use super::{
    batch::{ImportStats, QuestionBatch},
    grid::{decode, DecodeError},
    question::{Difficulty, QuestionKind},
    replicate::{replicate, ReplicationReport},
    rows::normalize_rows,
    schema::{detect, MissingColumnsError},
    submit::{
        check_target, resolve_category, ItemFailure, SubmitContext, SubmitError, Submitter,
        TrueFalseLabels,
    },
};
use crate::api::{ApiError, CategoryKey, ContentApi};

/// Failures that stop a run and need the user to fix something first.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    MissingColumns(#[from] MissingColumnsError),

    #[error("the file has no data rows, nothing to import")]
    EmptyFile,

    #[error("no importable rows: every row has an empty question")]
    NoImportableRows,

    #[error("could not resolve the target category: {0}")]
    Category(#[source] ApiError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryTarget {
    Id(String),
    /// looked up, and created when missing
    Key(CategoryKey),
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub kind: QuestionKind,
    /// used when the batch carries no category of its own
    pub category: Option<CategoryTarget>,
    pub publisher: Option<String>,
    pub require_publisher: bool,
    pub replicate: bool,
    pub game_points: u32,
    pub labels: TrueFalseLabels,
}

/// A spreadsheet turned into a batch, before anything is sent.
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub batch: QuestionBatch,
    pub skipped_blank: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub category_id: String,
    pub stats: ImportStats,
    pub created_ids: Vec<String>,
    pub failures: Vec<ItemFailure>,
    pub replication: Option<ReplicationReport>,
}

pub fn prepare_spreadsheet(
    bytes: &[u8],
    extension: &str,
    kind: QuestionKind,
    default_difficulty: Difficulty,
) -> Result<PreparedImport, ImportError> {
    let grid = decode(bytes, extension)?.ok_or(ImportError::EmptyFile)?;
    let columns = detect(&grid, kind)?;
    let rows = normalize_rows(&grid, &columns, default_difficulty);
    if rows.candidates.is_empty() {
        return Err(ImportError::NoImportableRows);
    }

    info!(
        rows = rows.candidates.len(),
        valid = rows.valid_count(),
        invalid = rows.invalid_count(),
        skipped = rows.skipped_blank,
        "spreadsheet normalized"
    );

    let mut batch = QuestionBatch::new(kind);
    let skipped_blank = rows.skipped_blank;
    batch.load_candidates(rows.candidates);
    Ok(PreparedImport {
        batch,
        skipped_blank,
    })
}

pub fn read_spreadsheet(
    path: &Path,
    kind: QuestionKind,
    default_difficulty: Difficulty,
) -> Result<PreparedImport, ImportError> {
    let bytes = fs::read(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    prepare_spreadsheet(&bytes, &extension, kind, default_difficulty)
}

/// Resolves the category, saves the batch and fans the new questions out.
///
/// The batch's own category wins over `options.category`. Kind and
/// publisher are checked before the category is looked up or created.
pub fn run_batch<A>(
    api: &A,
    batch: &mut QuestionBatch,
    options: &RunOptions,
) -> Result<RunReport, ImportError>
where
    A: ContentApi + ?Sized,
{
    let _span = info_span!("run_batch", kind = %options.kind, items = batch.len()).entered();

    check_target(
        batch,
        options.kind,
        options.publisher.as_deref(),
        options.require_publisher,
    )?;

    let target = match batch.category() {
        Some(key) => CategoryTarget::Key(key.clone()),
        None => options.category.clone().ok_or(SubmitError::MissingCategory)?,
    };
    let category_id = match target {
        CategoryTarget::Id(id) => id,
        CategoryTarget::Key(key) => resolve_category(api, &key).map_err(ImportError::Category)?.id,
    };

    let context = SubmitContext {
        category_id: category_id.clone(),
        kind: options.kind,
        publisher: options.publisher.clone(),
        require_publisher: options.require_publisher,
    };
    let outcome = Submitter::new(api, options.labels.clone()).submit(batch, &context)?;

    let replication = if options.replicate && !outcome.created_ids.is_empty() {
        Some(replicate(api, &outcome.created_ids, options.game_points))
    } else {
        None
    };

    Ok(RunReport {
        category_id,
        stats: outcome.stats,
        created_ids: outcome.created_ids,
        failures: outcome.failures,
        replication,
    })
}
