use std::env;
use std::time::Duration;

/// Topics offered to the generator when none are configured.
pub const DEFAULT_TOPIC_HINTS: &str = "maths (addition, subtraction, multiplication, division, \
dates, times), science, space (solar system), literature (books like Dog Man, Pokémon, \
Diary of a Wimpy Kid)";

/// Upper bound on a single provider call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the OpenAI-compatible question generator.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeneratorConfig {
    /// Read `TRIVIA_AI_API_KEY`, `TRIVIA_AI_BASE_URL`, and `TRIVIA_AI_MODEL`.
    ///
    /// Returns `None` when no usable API key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("TRIVIA_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("TRIVIA_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("TRIVIA_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Topic hints from `TRIVIA_TOPICS`, falling back to [`DEFAULT_TOPIC_HINTS`].
#[must_use]
pub fn topic_hints_from_env() -> String {
    env::var("TRIVIA_TOPICS")
        .ok()
        .filter(|topics| !topics.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TOPIC_HINTS.to_owned())
}

/// Provider timeout from `TRIVIA_TIMEOUT_SECS`, falling back to [`DEFAULT_REQUEST_TIMEOUT`].
///
/// Zero or unparseable values are ignored.
#[must_use]
pub fn request_timeout_from_env() -> Duration {
    env::var("TRIVIA_TIMEOUT_SECS")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs)
}
