use async_trait::async_trait;
use serde::Deserialize;
use trivia_core::model::{AnswerOption, Question};

use crate::error::ProviderError;

/// What to ask a question provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub topic_hints: String,
    /// Recently served question texts the provider should avoid.
    pub exclude_texts: Vec<String>,
    pub count: usize,
}

/// Remote producer of question batches.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch a batch of candidate questions.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the provider cannot be reached, answers with a
    /// failure status, or returns data that does not describe valid questions.
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, ProviderError>;
}

//
// ─── WIRE FORMAT ───────────────────────────────────────────────────────────────
//

/// One question as produced by the generator.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub options: Vec<OptionRecord>,
    #[serde(rename = "correctAnswerKey")]
    pub correct_answer_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionRecord {
    pub key: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionPayload {
    Bare(Vec<QuestionRecord>),
    Wrapped { questions: Vec<QuestionRecord> },
}

impl QuestionRecord {
    /// Validate the record into a domain `Question`.
    ///
    /// Keys are trimmed and upper-cased and must be a single character.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::MalformedResponse` for bad keys or invalid questions.
    pub fn into_question(self) -> Result<Question, ProviderError> {
        let options = self
            .options
            .into_iter()
            .map(|option| -> Result<AnswerOption, ProviderError> {
                Ok(AnswerOption::new(parse_key(&option.key)?, option.text.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let correct_key = parse_key(&self.correct_answer_key)?;

        Question::new(self.question, options, correct_key)
            .map_err(|err| ProviderError::MalformedResponse(err.to_string()))
    }
}

fn parse_key(raw: &str) -> Result<char, ProviderError> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Ok(key.to_ascii_uppercase()),
        _ => Err(ProviderError::MalformedResponse(format!(
            "option key {raw:?} is not a single character"
        ))),
    }
}

/// Parse generator output into questions.
///
/// Accepts a bare JSON array or an object with a `questions` array, optionally
/// wrapped in a fenced code block.
///
/// # Errors
///
/// Records that fail validation are skipped; the rest are returned.
///
/// # Errors
///
/// Returns `ProviderError::MalformedResponse` if the text is not question JSON
/// or records arrived but none of them is a valid question.
pub fn parse_questions(raw: &str) -> Result<Vec<Question>, ProviderError> {
    let payload: QuestionPayload = serde_json::from_str(strip_code_fence(raw))?;
    let records = match payload {
        QuestionPayload::Bare(records) | QuestionPayload::Wrapped { questions: records } => {
            records
        }
    };

    let received = records.len();
    let mut questions = Vec::with_capacity(received);
    let mut last_error = None;
    for (index, record) in records.into_iter().enumerate() {
        match record.into_question() {
            Ok(question) => questions.push(question),
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping invalid question record");
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(err) if questions.is_empty() => Err(err),
        _ => Ok(questions),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening fence.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = r#"[{
        "question": "How many legs does a spider have?",
        "options": [
            {"key": "A", "text": "Six"},
            {"key": "B", "text": "Eight"},
            {"key": "C", "text": "Ten"},
            {"key": "D", "text": "Four"}
        ],
        "correctAnswerKey": "B"
    }]"#;

    #[test]
    fn parses_bare_array() {
        let questions = parse_questions(ONE).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text(), "How many legs does a spider have?");
        assert_eq!(questions[0].correct_option().text(), "Eight");
    }

    #[test]
    fn parses_wrapped_object_in_code_fence() {
        let raw = format!("```json\n{{\"questions\": {ONE}}}\n```");
        let questions = parse_questions(&raw).unwrap();
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn lowercase_keys_are_normalized() {
        let raw = ONE.replace("\"B\"", "\"b\"");
        let questions = parse_questions(&raw).unwrap();
        assert_eq!(questions[0].correct_key(), 'B');
    }

    fn spider_records(count: usize) -> Vec<serde_json::Value> {
        let one: Vec<serde_json::Value> = serde_json::from_str(ONE).unwrap();
        (0..count)
            .map(|idx| {
                let mut record = one[0].clone();
                record["question"] = format!("Spider question {idx}?").into();
                record
            })
            .collect()
    }

    #[test]
    fn invalid_records_are_skipped_when_others_are_valid() {
        let mut records = spider_records(10);
        records[9]["options"].as_array_mut().unwrap().pop();
        let raw = serde_json::Value::Array(records).to_string();

        let questions = parse_questions(&raw).unwrap();
        assert_eq!(questions.len(), 9);
        assert!(questions.iter().all(|q| q.text() != "Spider question 9?"));
    }

    #[test]
    fn all_invalid_records_are_malformed() {
        let mut records = spider_records(2);
        for record in &mut records {
            record["correctAnswerKey"] = "E".into();
        }
        let raw = serde_json::Value::Array(records).to_string();

        let err = parse_questions(&raw).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn empty_array_yields_no_questions() {
        assert!(parse_questions("[]").unwrap().is_empty());
    }

    #[test]
    fn multi_character_key_is_malformed() {
        let raw = ONE.replace("\"key\": \"A\"", "\"key\": \"AA\"");
        let err = parse_questions(&raw).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn correct_key_outside_options_is_malformed() {
        let raw = ONE.replace("\"correctAnswerKey\": \"B\"", "\"correctAnswerKey\": \"E\"");
        let err = parse_questions(&raw).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_questions("Sorry, I can't help with that.").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
        assert!(!err.is_unavailable());
    }
}
