//! Turns data rows into candidate questions for the spreadsheet path.

use tracing::{debug, trace};

use super::{
    grid::{CellValue, RawGrid},
    question::{
        validate, AnswerFields, CorrectChoice, Difficulty, OptionLetter, QuestionFields,
        QuestionKind, TextRules, TruthValue, Validation,
    },
    schema::{ColumnMap, ColumnRole},
};

/// One spreadsheet row after normalization. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuestion {
    sequence_id: u32,
    row_number: usize,
    fields: QuestionFields,
    difficulty: Difficulty,
    validation: Validation,
}

impl CandidateQuestion {
    pub fn new(
        sequence_id: u32,
        row_number: usize,
        kind: QuestionKind,
        fields: QuestionFields,
        difficulty: Difficulty,
    ) -> Self {
        let validation = classify_row(kind, row_number, &fields);
        Self {
            sequence_id,
            row_number,
            fields,
            difficulty,
            validation,
        }
    }

    pub fn sequence_id(&self) -> u32 {
        self.sequence_id
    }

    /// 1-based row in the sheet, the header being row 1.
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn fields(&self) -> &QuestionFields {
        &self.fields
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    pub fn is_valid(&self) -> bool {
        self.validation.is_valid()
    }

    pub(crate) fn into_parts(self) -> (usize, QuestionFields, Difficulty) {
        (self.row_number, self.fields, self.difficulty)
    }
}

/// Validation of an imported row, with the row number in the message.
pub fn classify_row(kind: QuestionKind, row_number: usize, fields: &QuestionFields) -> Validation {
    match validate(kind, fields, TextRules::Imported) {
        Validation::Invalid(message) => {
            Validation::Invalid(format!("Row {}: {}", row_number, message))
        }
        valid => valid,
    }
}

/// Rows kept as candidates plus how many were ignored for a blank question.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRows {
    pub candidates: Vec<CandidateQuestion>,
    pub skipped_blank: usize,
}

impl NormalizedRows {
    pub fn valid_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.candidates.len() - self.valid_count()
    }
}

pub fn normalize_rows(
    grid: &RawGrid,
    columns: &ColumnMap,
    default_difficulty: Difficulty,
) -> NormalizedRows {
    let kind = columns.kind();
    let question_column = columns.required(ColumnRole::Question);
    let mut result = NormalizedRows::default();

    for (row_number, row) in grid.data_rows() {
        let text = RawGrid::cell(row, question_column).normalized();
        if text.is_empty() {
            result.skipped_blank += 1;
            continue;
        }

        let fields = QuestionFields {
            text,
            answer: read_answer(kind, row, columns),
        };
        let difficulty = columns
            .get(ColumnRole::Difficulty)
            .and_then(|column| RawGrid::cell(row, column).normalized().parse().ok())
            .unwrap_or(default_difficulty);

        let sequence_id = result.candidates.len() as u32 + 1;
        let candidate = CandidateQuestion::new(sequence_id, row_number, kind, fields, difficulty);
        trace!(row = row_number, question = %candidate.fields.text, "row normalized");
        if let Some(error) = candidate.validation().error() {
            debug!(row = row_number, %error, "row rejected");
        }
        result.candidates.push(candidate);
    }

    result
}

fn read_answer(kind: QuestionKind, row: &[CellValue], columns: &ColumnMap) -> AnswerFields {
    let cell = |role: ColumnRole| RawGrid::cell(row, columns.required(role)).normalized();

    match kind {
        QuestionKind::MultipleChoice => AnswerFields::MultipleChoice {
            options: OptionLetter::ALL.map(|letter| cell(option_role(letter))),
            correct: CorrectChoice::from_cell(&cell(ColumnRole::CorrectOption)),
        },
        QuestionKind::TrueFalse => AnswerFields::TrueFalse {
            value: TruthValue::from_cell(&cell(ColumnRole::Answer)),
        },
        QuestionKind::FreeText => AnswerFields::FreeText {
            answer: cell(ColumnRole::Answer),
        },
    }
}

fn option_role(letter: OptionLetter) -> ColumnRole {
    match letter {
        OptionLetter::A => ColumnRole::OptionA,
        OptionLetter::B => ColumnRole::OptionB,
        OptionLetter::C => ColumnRole::OptionC,
        OptionLetter::D => ColumnRole::OptionD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{grid::decode, schema::detect};

    fn rows(csv: &str, kind: QuestionKind) -> NormalizedRows {
        let grid = decode(csv.as_bytes(), "csv").unwrap().unwrap();
        let columns = detect(&grid, kind).unwrap();
        normalize_rows(&grid, &columns, Difficulty::Medium)
    }

    #[test]
    fn true_false_dogru_is_true() {
        let result = rows("Soru,Cevap\nGüneş bir yıldızdır,Doğru\n", QuestionKind::TrueFalse);
        let candidate = &result.candidates[0];
        assert!(candidate.is_valid());
        assert_eq!(
            candidate.fields().answer,
            AnswerFields::TrueFalse {
                value: TruthValue::Known(true)
            }
        );
    }

    #[test]
    fn true_false_unknown_token_names_row_and_value() {
        let result = rows("Soru,Cevap\nAy bir gezegendir,maybe\n", QuestionKind::TrueFalse);
        let candidate = &result.candidates[0];
        assert!(!candidate.is_valid());
        assert_eq!(
            candidate.validation().error(),
            Some("Row 2: invalid true/false value 'maybe'")
        );
    }

    #[test]
    fn multiple_choice_letter_is_case_insensitive() {
        let result = rows(
            "Soru;A;B;C;D;Doğru Cevap\nHangisi memelidir?;Kartal;Yunus;Köpekbalığı;Kurbağa;b\n",
            QuestionKind::MultipleChoice,
        );
        let candidate = &result.candidates[0];
        assert!(candidate.is_valid());
        assert_eq!(
            candidate.fields().answer,
            AnswerFields::MultipleChoice {
                options: ["Kartal", "Yunus", "Köpekbalığı", "Kurbağa"].map(str::to_string),
                correct: CorrectChoice::Letter(OptionLetter::B),
            }
        );
    }

    #[test]
    fn blank_question_rows_are_skipped_not_invalid() {
        let result = rows(
            "Question,Answer\nCapital of France?,Paris\n,orphan answer\nab,x\n",
            QuestionKind::FreeText,
        );
        assert_eq!(result.skipped_blank, 1);
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.valid_count(), 1);
        assert_eq!(result.invalid_count(), 1);

        let short = &result.candidates[1];
        assert_eq!(short.sequence_id(), 2);
        assert_eq!(short.row_number(), 4);
        assert!(short.validation().error().unwrap().starts_with("Row 4: "));
    }

    #[test]
    fn difficulty_column_overrides_default() {
        let result = rows(
            "Soru,Cevap,Zorluk\nBir artı bir?,2,Zor\nİki artı iki?,4,??\n",
            QuestionKind::FreeText,
        );
        assert_eq!(result.candidates[0].difficulty(), Difficulty::Hard);
        assert_eq!(result.candidates[1].difficulty(), Difficulty::Medium);
    }

    #[test]
    fn numeric_cells_feed_true_false_tokens() {
        let grid = RawGrid::new(vec![
            vec![CellValue::Text("Soru".into()), CellValue::Text("Cevap".into())],
            vec![CellValue::Text("Su 100 derecede kaynar".into()), CellValue::Number(1.0)],
            vec![CellValue::Text("Buz sıcaktır".into()), CellValue::Number(0.0)],
        ]);
        let columns = detect(&grid, QuestionKind::TrueFalse).unwrap();
        let result = normalize_rows(&grid, &columns, Difficulty::Easy);
        assert_eq!(result.valid_count(), 2);
        assert_eq!(
            result.candidates[1].fields().answer,
            AnswerFields::TrueFalse {
                value: TruthValue::Known(false)
            }
        );
    }

    #[test]
    fn reclassifying_a_valid_row_stays_valid() {
        let result = rows("Soru,Cevap\nGüneş doğudan doğar,evet\n", QuestionKind::TrueFalse);
        let candidate = &result.candidates[0];
        assert!(candidate.is_valid());
        assert!(classify_row(QuestionKind::TrueFalse, candidate.row_number(), candidate.fields())
            .is_valid());
    }
}
