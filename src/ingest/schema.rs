//! Locates the columns a question type needs by matching header text.

use std::{collections::BTreeMap, fmt};

use thiserror::Error;

use super::{
    grid::{CellValue, RawGrid},
    question::QuestionKind,
    text::normalize_label,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnRole {
    Question,
    Answer,
    OptionA,
    OptionB,
    OptionC,
    OptionD,
    CorrectOption,
    Difficulty,
}

impl ColumnRole {
    pub fn name(self) -> &'static str {
        match self {
            ColumnRole::Question => "question",
            ColumnRole::Answer => "answer",
            ColumnRole::OptionA => "optionA",
            ColumnRole::OptionB => "optionB",
            ColumnRole::OptionC => "optionC",
            ColumnRole::OptionD => "optionD",
            ColumnRole::CorrectOption => "correctOption",
            ColumnRole::Difficulty => "difficulty",
        }
    }

    /// Roles that must be present for `kind`, in reporting order.
    pub fn required_for(kind: QuestionKind) -> &'static [ColumnRole] {
        match kind {
            QuestionKind::MultipleChoice => &[
                ColumnRole::Question,
                ColumnRole::OptionA,
                ColumnRole::OptionB,
                ColumnRole::OptionC,
                ColumnRole::OptionD,
                ColumnRole::CorrectOption,
            ],
            QuestionKind::TrueFalse | QuestionKind::FreeText => {
                &[ColumnRole::Question, ColumnRole::Answer]
            }
        }
    }

    fn synonyms(self) -> &'static [Synonym] {
        use Synonym::{Contains, Exact};
        match self {
            ColumnRole::Question => &[Contains("soru"), Contains("question")],
            ColumnRole::Answer => &[
                Contains("cevap"),
                Contains("answer"),
                Contains("yanit"),
                Contains("dogru yanlis"),
                Contains("true false"),
            ],
            ColumnRole::OptionA => &option_synonyms::A,
            ColumnRole::OptionB => &option_synonyms::B,
            ColumnRole::OptionC => &option_synonyms::C,
            ColumnRole::OptionD => &option_synonyms::D,
            ColumnRole::CorrectOption => &[
                Contains("dogru secenek"),
                Contains("dogru cevap"),
                Contains("correct"),
                Contains("cevap"),
                Contains("answer"),
                Exact("dogru"),
            ],
            ColumnRole::Difficulty => {
                &[Contains("zorluk"), Contains("difficulty"), Contains("seviye")]
            }
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy)]
enum Synonym {
    /// substring of the normalized header
    Contains(&'static str),
    /// the whole normalized header
    Exact(&'static str),
}

impl Synonym {
    fn matches(self, header: &str) -> bool {
        match self {
            Synonym::Contains(needle) => header.contains(needle),
            Synonym::Exact(label) => header == label,
        }
    }
}

mod option_synonyms {
    use super::Synonym::{self, Contains, Exact};

    macro_rules! option {
        ($name:ident, $letter:literal) => {
            pub(super) const $name: [Synonym; 7] = [
                Exact($letter),
                Exact(concat!("sik ", $letter)),
                Contains(concat!("secenek ", $letter)),
                Contains(concat!($letter, " secenegi")),
                Contains(concat!($letter, " sikki")),
                Contains(concat!("option ", $letter)),
                Contains(concat!("choice ", $letter)),
            ];
        };
    }

    option!(A, "a");
    option!(B, "b");
    option!(C, "c");
    option!(D, "d");
}

/// Every required role the header row lacks, in canonical order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("missing required column(s) for {kind}: {}", names(.missing))]
pub struct MissingColumnsError {
    pub kind: QuestionKind,
    pub missing: Vec<ColumnRole>,
}

fn names(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(|role| role.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Role to column index for one (grid, kind) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    kind: QuestionKind,
    columns: BTreeMap<ColumnRole, usize>,
}

impl ColumnMap {
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    /// Index of a role that `detect` guaranteed to be present.
    pub(crate) fn required(&self, role: ColumnRole) -> usize {
        self.columns.get(&role).copied().unwrap_or(usize::MAX)
    }
}

pub fn detect(grid: &RawGrid, kind: QuestionKind) -> Result<ColumnMap, MissingColumnsError> {
    detect_in_header(grid.header(), kind)
}

pub fn detect_in_header(
    header: &[CellValue],
    kind: QuestionKind,
) -> Result<ColumnMap, MissingColumnsError> {
    let labels: Vec<String> = header
        .iter()
        .map(|cell| normalize_label(&cell.normalized()))
        .collect();

    let find = |role: ColumnRole| {
        labels.iter().position(|label| {
            !label.is_empty() && role.synonyms().iter().any(|synonym| synonym.matches(label))
        })
    };

    let mut columns = BTreeMap::new();
    let mut missing = Vec::new();
    for &role in ColumnRole::required_for(kind) {
        match find(role) {
            Some(index) => {
                columns.insert(role, index);
            }
            None => missing.push(role),
        }
    }
    if !missing.is_empty() {
        return Err(MissingColumnsError { kind, missing });
    }

    if let Some(index) = find(ColumnRole::Difficulty) {
        columns.insert(ColumnRole::Difficulty, index);
    }

    Ok(ColumnMap { kind, columns })
}
