mod terminal;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use services::config::{request_timeout_from_env, topic_hints_from_env};
use services::{GeneratorService, QuizLoopService};
use trivia_core::model::QuizSettings;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTimeout { raw: String },
    EmptyTopics,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTimeout { raw } => write!(f, "invalid --timeout-secs value: {raw}"),
            ArgsError::EmptyTopics => write!(f, "--topics cannot be empty"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--topics <text>] [--timeout-secs <n>] [--verbose]");
    eprintln!();
    eprintln!("Keys while playing:");
    eprintln!("  a-d answer, Enter next question, r new questions, q quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TRIVIA_AI_API_KEY (required), TRIVIA_AI_BASE_URL, TRIVIA_AI_MODEL");
    eprintln!("  TRIVIA_TOPICS, TRIVIA_TIMEOUT_SECS, TRIVIA_LOG");
}

#[derive(Debug)]
struct Args {
    topics: String,
    timeout: Duration,
    verbose: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut topics = topic_hints_from_env();
        let mut timeout = request_timeout_from_env();
        let mut verbose = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--topics" => {
                    let value = require_value(args, "--topics")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::EmptyTopics);
                    }
                    topics = value;
                }
                "--timeout-secs" => {
                    let value = require_value(args, "--timeout-secs")?;
                    let secs: u64 = value
                        .trim()
                        .parse()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or_else(|| ArgsError::InvalidTimeout { raw: value.clone() })?;
                    timeout = Duration::from_secs(secs);
                }
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            topics,
            timeout,
            verbose,
        })
    }
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("TRIVIA_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| format!("failed to initialize tracing subscriber: {err}"))?;
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    init_tracing(parsed.verbose)?;

    let generator = GeneratorService::from_env().with_timeout(parsed.timeout);
    if !generator.enabled() {
        tracing::warn!("TRIVIA_AI_API_KEY is not set; question requests will fail");
    }

    let quiz = QuizLoopService::new(Arc::new(generator), QuizSettings::default())
        .with_topic_hints(parsed.topics)
        .with_timeout(parsed.timeout);

    terminal::play(quiz).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
