mod batch;
mod grid;
mod manual;
mod pipeline;
mod question;
mod replicate;
mod rows;
mod schema;
mod submit;
mod text;

pub use batch::{
    BatchError, BatchItem, ImageRef, ImportStats, ItemOrigin, QuestionBatch, SequenceId,
};
pub use grid::{decode, CellValue, DecodeError, RawGrid};
pub use manual::{load_manual_batch, parse_manual_batch, ManualFileError};
pub use pipeline::{
    prepare_spreadsheet, read_spreadsheet, run_batch, CategoryTarget, ImportError,
    PreparedImport, RunOptions, RunReport,
};
pub use question::{
    validate, AnswerFields, CorrectChoice, Difficulty, OptionLetter, QuestionFields,
    QuestionKind, TextRules, TruthValue, Validation,
};
pub use replicate::{list_all_games, replicate, ReplicationReport, ReplicationResult};
pub use rows::{classify_row, normalize_rows, CandidateQuestion, NormalizedRows};
pub use schema::{detect, detect_in_header, ColumnMap, ColumnRole, MissingColumnsError};
pub use submit::{
    build_request, check_target, resolve_category, FailureStage, ItemFailure, SubmitContext,
    SubmitError, SubmitOutcome, Submitter, TrueFalseLabels,
};
