use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use trivia_core::model::Question;

use crate::config::{DEFAULT_REQUEST_TIMEOUT, GeneratorConfig};
use crate::error::ProviderError;
use crate::prompt::build_prompt;
use crate::question_source::{QuestionRequest, QuestionSource, parse_questions};

/// `QuestionSource` backed by an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct GeneratorService {
    client: Client,
    config: Option<GeneratorConfig>,
    timeout: Duration,
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to an HTTP client without a timeout");
            Client::new()
        })
}

impl GeneratorService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: build_client(DEFAULT_REQUEST_TIMEOUT),
            config,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bound every HTTP request by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send a prompt and return the model's message content.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the service is disabled, the request fails,
    /// or the response carries no content.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let config = self.config.as_ref().ok_or(ProviderError::Disabled)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: 0.9,
            response_format: question_response_format(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        let body: ChatResponse = serde_json::from_str(&body)?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse("empty completion".into()))?;

        Ok(content.trim().to_string())
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Http(err)
        }
    }
}

/// Structured-output request for `{"questions": [...]}`.
fn question_response_format() -> Value {
    let option = json!({
        "type": "object",
        "properties": {
            "key": { "type": "string" },
            "text": { "type": "string" }
        },
        "required": ["key", "text"],
        "additionalProperties": false
    });
    let question = json!({
        "type": "object",
        "properties": {
            "question": { "type": "string" },
            "options": { "type": "array", "items": option },
            "correctAnswerKey": { "type": "string" }
        },
        "required": ["question", "options", "correctAnswerKey"],
        "additionalProperties": false
    });
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "trivia_questions",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "questions": { "type": "array", "items": question }
                },
                "required": ["questions"],
                "additionalProperties": false
            }
        }
    })
}

#[async_trait]
impl QuestionSource for GeneratorService {
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, ProviderError> {
        let prompt = build_prompt(request);
        let content = self.complete(&prompt).await?;
        let questions = parse_questions(&content)?;
        tracing::debug!(count = questions.len(), "generator returned questions");
        Ok(questions)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
