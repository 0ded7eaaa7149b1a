//! Hand-authored batches described in a YAML file.
//!
//! ```yaml
//! type: mc
//! difficulty: easy
//! category: { grade: "5", subject: Fen Bilimleri, unit: Güneş Sistemi, topic: Gezegenler }
//! questions:
//!   - text: Hangisi bir gezegendir?
//!     options: [Ay, Mars, Güneş, Halley]
//!     correct: B
//!     image: img/mars.png
//!     copies: 1
//! ```

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::api::CategoryKey;

use super::{
    batch::{BatchError, ImageRef, QuestionBatch, SequenceId},
    question::{Difficulty, OptionLetter, QuestionKind, TruthValue},
};

#[derive(Error, Debug)]
pub enum ManualFileError {
    #[error("could not read batch file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid batch file: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("{0}")]
    Type(String),

    #[error("question {index}: {message}")]
    Entry { index: usize, message: String },

    #[error(transparent)]
    Batch(#[from] BatchError),
}

#[derive(Debug, Deserialize)]
struct ManualFile {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    category: Option<CategoryKey>,
    questions: Vec<ManualEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManualEntry {
    text: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    correct: Option<String>,
    #[serde(default)]
    answer: Option<ManualAnswer>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    copies: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManualAnswer {
    Flag(bool),
    Text(String),
}

pub fn load_manual_batch(path: &Path) -> Result<QuestionBatch, ManualFileError> {
    let content = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_manual_batch(&content, base_dir)
}

/// Builds a batch by replaying each entry as add/edit/duplicate gestures.
/// Image paths are resolved against `base_dir`.
pub fn parse_manual_batch(content: &str, base_dir: &Path) -> Result<QuestionBatch, ManualFileError> {
    let file: ManualFile = serde_yaml_ng::from_str(content)?;
    let kind: QuestionKind = file.kind.parse().map_err(ManualFileError::Type)?;
    let default_difficulty = match &file.difficulty {
        Some(d) => d.parse().map_err(ManualFileError::Type)?,
        None => Difficulty::default(),
    };

    let mut batch = QuestionBatch::new(kind);
    if let Some(key) = &file.category {
        let key = CategoryKey::new(&key.grade, &key.subject, &key.unit, &key.topic);
        batch.change_category(Some(key), |_| true);
    }
    for (index, entry) in file.questions.into_iter().enumerate() {
        let entry_error = |message: String| ManualFileError::Entry {
            index: index + 1,
            message,
        };
        let id = batch.add_item();
        batch.set_question_text(id, &entry.text)?;
        apply_answer(&mut batch, id, kind, &entry).map_err(entry_error)?;

        let difficulty = match &entry.difficulty {
            Some(d) => d.parse().map_err(entry_error)?,
            None => default_difficulty,
        };
        batch.set_difficulty(id, difficulty)?;

        if let Some(image) = &entry.image {
            batch.attach_image(id, Some(ImageRef::Pending(base_dir.join(image))))?;
        }
        for _ in 0..entry.copies {
            batch.duplicate(id)?;
        }
    }
    Ok(batch)
}

fn apply_answer(
    batch: &mut QuestionBatch,
    id: SequenceId,
    kind: QuestionKind,
    entry: &ManualEntry,
) -> Result<(), String> {
    let batch_error = |e: BatchError| e.to_string();
    match kind {
        QuestionKind::MultipleChoice => {
            if entry.answer.is_some() {
                return Err("multiple choice questions use `options` and `correct`".to_string());
            }
            let options = entry.options.as_deref().unwrap_or_default();
            if options.len() > OptionLetter::ALL.len() {
                return Err(format!("{} options given, at most 4 allowed", options.len()));
            }
            for (letter, text) in OptionLetter::ALL.iter().zip(options) {
                batch.set_option(id, *letter, text).map_err(batch_error)?;
            }
            if let Some(correct) = &entry.correct {
                let letter = OptionLetter::parse(correct)
                    .ok_or_else(|| format!("invalid correct option '{}'", correct))?;
                batch.select_correct(id, letter).map_err(batch_error)?;
            }
        }
        QuestionKind::TrueFalse => {
            if entry.options.is_some() || entry.correct.is_some() {
                return Err("true/false questions only take `answer`".to_string());
            }
            let value = match &entry.answer {
                None => true,
                Some(ManualAnswer::Flag(flag)) => *flag,
                Some(ManualAnswer::Text(token)) => match TruthValue::from_cell(token) {
                    TruthValue::Known(flag) => flag,
                    _ => return Err(format!("invalid true/false value '{}'", token)),
                },
            };
            batch.set_true_false(id, value).map_err(batch_error)?;
        }
        QuestionKind::FreeText => {
            if entry.options.is_some() || entry.correct.is_some() {
                return Err("free text questions only take `answer`".to_string());
            }
            let answer = match &entry.answer {
                None => String::new(),
                Some(ManualAnswer::Text(text)) => text.clone(),
                Some(ManualAnswer::Flag(flag)) => flag.to_string(),
            };
            batch.set_answer_text(id, &answer).map_err(batch_error)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::question::{AnswerFields, CorrectChoice};

    #[test]
    fn multiple_choice_entries_with_copies_and_images() {
        let yaml = r#"
type: mc
difficulty: kolay
questions:
  - text: Hangisi bir gezegendir?
    options: [Ay, Mars, Güneş, Halley]
    correct: b
    image: img/mars.png
    copies: 2
  - text: Eksik seçenekli soru
    options: [bir, iki]
"#;
        let batch = parse_manual_batch(yaml, Path::new("/data")).unwrap();
        assert_eq!(batch.kind(), QuestionKind::MultipleChoice);
        assert_eq!(batch.len(), 4);

        let first = &batch.items()[0];
        assert!(first.is_valid());
        assert_eq!(first.difficulty(), Difficulty::Easy);
        assert_eq!(
            first.image(),
            Some(&ImageRef::Pending(Path::new("/data/img/mars.png").to_path_buf()))
        );
        assert!(matches!(
            &first.fields().answer,
            AnswerFields::MultipleChoice { correct: CorrectChoice::Letter(OptionLetter::B), .. }
        ));

        let copies: Vec<_> = batch.items()[1..3].iter().collect();
        assert!(copies.iter().all(|c| c.fields() == first.fields() && c.image() == first.image()));

        let last = &batch.items()[3];
        assert_eq!(last.validation().error(), Some("options C, D are empty"));
    }

    #[test]
    fn true_false_accepts_flags_and_tokens() {
        let yaml = "type: tf\nquestions:\n  - text: Su 0 derecede donar\n    answer: true\n  - text: Ateş soğuktur\n    answer: Yanlış\n";
        let batch = parse_manual_batch(yaml, Path::new(".")).unwrap();
        assert_eq!(batch.stats().valid, 2);
        assert_eq!(
            batch.items()[1].fields().answer,
            AnswerFields::TrueFalse {
                value: TruthValue::Known(false)
            }
        );
    }

    #[test]
    fn fields_for_another_type_are_rejected_with_position() {
        let yaml = "type: text\nquestions:\n  - text: Başkent?\n    answer: Ankara\n  - text: Ya bu?\n    options: [a, b, c, d]\n";
        let err = parse_manual_batch(yaml, Path::new(".")).unwrap_err();
        assert!(matches!(err, ManualFileError::Entry { index: 2, .. }), "{err}");
    }

    #[test]
    fn category_block_targets_the_batch() {
        let yaml = "type: text\ncategory:\n  grade: 6\n  subject: ' Tarih '\n  unit: Osmanlı\n  topic: Kuruluş\nquestions:\n  - text: Kurucu kimdir?\n    answer: Osman Bey\n";
        let batch = parse_manual_batch(yaml, Path::new(".")).unwrap();
        assert_eq!(
            batch.category(),
            Some(&CategoryKey::new("6", "Tarih", "Osmanlı", "Kuruluş"))
        );
        assert_eq!(batch.len(), 1);

        let without = parse_manual_batch("type: tf\nquestions: []\n", Path::new(".")).unwrap();
        assert_eq!(without.category(), None);
    }

    #[test]
    fn unknown_type_is_reported() {
        let err = parse_manual_batch("type: essay\nquestions: []\n", Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("unknown question type"));
    }
}
