use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The (grade, subject, unit, topic) tuple that identifies a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryKey {
    #[serde(deserialize_with = "string_or_number")]
    pub grade: String,
    pub subject: String,
    pub unit: String,
    pub topic: String,
}

impl CategoryKey {
    pub fn new(grade: &str, subject: &str, unit: &str, topic: &str) -> Self {
        Self {
            grade: grade.trim().to_string(),
            subject: subject.trim().to_string(),
            unit: unit.trim().to_string(),
            topic: topic.trim().to_string(),
        }
    }

    pub fn matches(&self, category: &Category) -> bool {
        fn same(a: &str, b: &str) -> bool {
            a.trim().to_lowercase() == b.trim().to_lowercase()
        }
        same(&self.grade, &category.grade)
            && same(&self.subject, &category.subject)
            && same(&self.unit, &category.unit)
            && same(&self.topic, &category.topic)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl From<&CategoryKey> for CategoryFilter {
    fn from(key: &CategoryKey) -> Self {
        Self {
            grade: Some(key.grade.clone()),
            subject: Some(key.subject.clone()),
            unit: Some(key.unit.clone()),
            topic: Some(key.topic.clone()),
        }
    }
}

impl CategoryFilter {
    pub(crate) fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("grade", self.grade.as_deref()),
            ("subject", self.subject.as_deref()),
            ("unit", self.unit.as_deref()),
            ("topic", self.topic.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Game {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One page of the game listing.
#[derive(Debug, Clone, PartialEq)]
pub struct GamePage {
    pub games: Vec<Game>,
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedQuestion {
    pub id: String,
}

/// Canonical create-request shared by every question type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: &'static str,
    pub difficulty: &'static str,
    pub category_id: String,
    pub answers: Vec<AnswerPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub text: String,
    pub is_correct: bool,
}

impl AnswerPayload {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionToGame {
    pub question_id: String,
    pub points: u32,
}

// ids come back as strings from some endpoints and numbers from others;
// grades are often written as bare numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or a number, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_uses_camel_case_and_skips_missing_image() {
        let request = CreateQuestionRequest {
            question_text: "2 + 2?".to_string(),
            question_type: "free_text",
            difficulty: "easy",
            category_id: "c1".to_string(),
            answers: vec![AnswerPayload::new("4", true)],
            image_path: None,
            publisher: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "questionText": "2 + 2?",
                "type": "free_text",
                "difficulty": "easy",
                "categoryId": "c1",
                "answers": [{"text": "4", "isCorrect": true}],
            })
        );
    }

    #[test]
    fn numeric_ids_become_strings() {
        let game: Game = serde_json::from_value(json!({"id": 42, "name": "Quiz"})).unwrap();
        assert_eq!(game.id, "42");
    }

    #[test]
    fn category_key_matches_ignoring_case_and_padding() {
        let key = CategoryKey::new("5", "Matematik", "Sayılar", " Kesirler ");
        let category = Category {
            id: "1".into(),
            grade: "5".into(),
            subject: "matematik".into(),
            unit: "Sayılar".into(),
            topic: "Kesirler".into(),
        };
        assert!(key.matches(&category));
    }
}
