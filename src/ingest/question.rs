//! Canonical question model and the validation shared by both entry paths.

use std::{fmt, str::FromStr};

use super::text::fold;

const TRUE_TOKENS: [&str; 7] = ["dogru", "true", "d", "t", "evet", "yes", "1"];
const FALSE_TOKENS: [&str; 7] = ["yanlis", "false", "y", "f", "hayir", "no", "0"];

/// Spreadsheet rows need a little more than a non-blank question.
pub const MIN_IMPORTED_TEXT_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    FreeText,
}

impl QuestionKind {
    pub fn wire_name(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::FreeText => "free_text",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).replace(['-', ' '], "_").as_str() {
            "mc" | "multiple_choice" | "coktan_secmeli" => Ok(QuestionKind::MultipleChoice),
            "tf" | "true_false" | "dogru_yanlis" => Ok(QuestionKind::TrueFalse),
            "text" | "free_text" | "qa" | "klasik" => Ok(QuestionKind::FreeText),
            other => Err(format!(
                "unknown question type '{}', expected mc, tf or text",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn wire_name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "easy" | "kolay" => Ok(Difficulty::Easy),
            "medium" | "orta" => Ok(Difficulty::Medium),
            "hard" | "zor" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [OptionLetter::A, OptionLetter::B, OptionLetter::C, OptionLetter::D];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Accepts "b", " B ", "B)" and similar.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim().trim_end_matches([')', '.']).trim();
        match token.to_ascii_uppercase().as_str() {
            "A" => Some(OptionLetter::A),
            "B" => Some(OptionLetter::B),
            "C" => Some(OptionLetter::C),
            "D" => Some(OptionLetter::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Which option is marked correct. One letter at most, so selecting a new
/// one always replaces the previous selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectChoice {
    Unset,
    Unrecognized(String),
    Letter(OptionLetter),
}

impl CorrectChoice {
    pub fn from_cell(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return CorrectChoice::Unset;
        }
        OptionLetter::parse(raw).map_or_else(
            || CorrectChoice::Unrecognized(raw.trim().to_string()),
            CorrectChoice::Letter,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TruthValue {
    Missing,
    Unrecognized(String),
    Known(bool),
}

impl TruthValue {
    pub fn from_cell(raw: &str) -> Self {
        let token = fold(raw);
        if token.is_empty() {
            TruthValue::Missing
        } else if TRUE_TOKENS.contains(&token.as_str()) {
            TruthValue::Known(true)
        } else if FALSE_TOKENS.contains(&token.as_str()) {
            TruthValue::Known(false)
        } else {
            TruthValue::Unrecognized(raw.trim().to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerFields {
    MultipleChoice {
        options: [String; 4],
        correct: CorrectChoice,
    },
    TrueFalse {
        value: TruthValue,
    },
    FreeText {
        answer: String,
    },
}

impl AnswerFields {
    /// Starting answer for a freshly added item. True/false starts pinned.
    pub fn blank(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::MultipleChoice => AnswerFields::MultipleChoice {
                options: Default::default(),
                correct: CorrectChoice::Unset,
            },
            QuestionKind::TrueFalse => AnswerFields::TrueFalse {
                value: TruthValue::Known(true),
            },
            QuestionKind::FreeText => AnswerFields::FreeText {
                answer: String::new(),
            },
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerFields::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            AnswerFields::TrueFalse { .. } => QuestionKind::TrueFalse,
            AnswerFields::FreeText { .. } => QuestionKind::FreeText,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFields {
    pub text: String,
    pub answer: AnswerFields,
}

impl QuestionFields {
    pub fn blank(kind: QuestionKind) -> Self {
        Self {
            text: String::new(),
            answer: AnswerFields::blank(kind),
        }
    }
}

/// Extra text rules that depend on where an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRules {
    Manual,
    Imported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(String),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Validation::Valid => None,
            Validation::Invalid(message) => Some(message),
        }
    }
}

/// Classifies `fields` under `kind`. Pure: same inputs, same verdict.
pub fn validate(kind: QuestionKind, fields: &QuestionFields, rules: TextRules) -> Validation {
    match check(kind, fields, rules) {
        Ok(()) => Validation::Valid,
        Err(message) => Validation::Invalid(message),
    }
}

fn check(kind: QuestionKind, fields: &QuestionFields, rules: TextRules) -> Result<(), String> {
    let text = fields.text.trim();
    if text.is_empty() {
        return Err("question text is required".to_string());
    }
    if rules == TextRules::Imported && text.chars().count() < MIN_IMPORTED_TEXT_LEN {
        return Err(format!(
            "question text must be at least {} characters",
            MIN_IMPORTED_TEXT_LEN
        ));
    }

    if fields.answer.kind() != kind {
        return Err(format!(
            "answer fields are {} but the question type is {}",
            fields.answer.kind(),
            kind
        ));
    }

    match &fields.answer {
        AnswerFields::MultipleChoice { options, correct } => {
            let empty: Vec<String> = OptionLetter::ALL
                .iter()
                .filter(|letter| options[letter.index()].trim().is_empty())
                .map(ToString::to_string)
                .collect();
            match empty.len() {
                0 => {}
                1 => return Err(format!("option {} is empty", empty[0])),
                _ => return Err(format!("options {} are empty", empty.join(", "))),
            }
            match correct {
                CorrectChoice::Letter(_) => Ok(()),
                CorrectChoice::Unset => Err("the correct option is not selected".to_string()),
                CorrectChoice::Unrecognized(token) => Err(format!(
                    "invalid correct option '{}', expected A, B, C or D",
                    token
                )),
            }
        }
        AnswerFields::TrueFalse { value } => match value {
            TruthValue::Known(_) => Ok(()),
            TruthValue::Missing => Err("true/false value is missing".to_string()),
            TruthValue::Unrecognized(token) => {
                Err(format!("invalid true/false value '{}'", token))
            }
        },
        AnswerFields::FreeText { answer } => {
            if answer.trim().is_empty() {
                Err("answer is required".to_string())
            } else {
                Ok(())
            }
        }
    }
}
