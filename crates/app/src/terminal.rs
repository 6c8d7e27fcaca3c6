//! Line-oriented terminal front end for a quiz.

use std::fmt::Write as _;
use std::io::Write as _;

use services::QuizLoopService;
use tokio::io::{AsyncBufReadExt, BufReader};
use trivia_core::model::QuizResult;
use trivia_core::{QuizSnapshot, QuizStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Answer(char),
    Next,
    Restart,
    Quit,
    Unknown,
}

fn parse_intent(line: &str) -> Intent {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" | "n" | "next" => Intent::Next,
        "r" | "restart" | "new" => Intent::Restart,
        "q" | "quit" | "exit" => Intent::Quit,
        _ => {
            let mut chars = line.chars();
            match (chars.next(), chars.next()) {
                (Some(key), None) if key.is_ascii_alphabetic() => {
                    Intent::Answer(key.to_ascii_uppercase())
                }
                _ => Intent::Unknown,
            }
        }
    }
}

fn render(snapshot: &QuizSnapshot, result: Option<&QuizResult>) -> String {
    let mut out = String::new();
    match snapshot.status {
        QuizStatus::Empty => {
            out.push_str("No questions loaded yet. Type 'r' to start!\n");
        }
        QuizStatus::Loading => out.push_str("Getting new trivia...\n"),
        QuizStatus::Failed => {
            let detail = snapshot.error_detail.as_deref().unwrap_or("unknown error");
            let _ = writeln!(out, "Oops! {detail}");
            out.push_str("Type 'r' to try again or 'q' to quit.\n");
        }
        QuizStatus::Active => {
            if let Some(question) = snapshot.current_question() {
                let _ = writeln!(
                    out,
                    "\nQuestion {} / {}",
                    snapshot.current_index + 1,
                    snapshot.total()
                );
                let _ = writeln!(out, "{}", question.text());
                for option in question.options() {
                    let _ = writeln!(out, "  {}: {}", option.key(), option.text());
                }
                if snapshot.selected_key.is_some() {
                    out.push_str("Press Enter for the next question.\n");
                } else {
                    out.push_str("Your answer: ");
                }
            }
        }
        QuizStatus::Completed => {
            out.push_str("\nQuiz Completed!\n");
            if let Some(result) = result {
                let _ = writeln!(out, "{}/{}", result.score(), result.total());
                let _ = writeln!(out, "{}", result.tier().message());
            }
            out.push_str("Type 'r' to play again or 'q' to quit.\n");
        }
    }
    out
}

fn feedback(snapshot: &QuizSnapshot, correct: bool) -> String {
    if correct {
        return "That's correct!".to_owned();
    }
    match snapshot.current_question() {
        Some(question) => {
            let answer = question.correct_option();
            format!(
                "Oops! Not quite. The answer was {}: {}",
                answer.key(),
                answer.text()
            )
        }
        None => "Oops! Not quite.".to_owned(),
    }
}

fn show(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

/// Run the quiz against stdin/stdout until the user quits or input ends.
///
/// # Errors
///
/// Returns an I/O error if stdin cannot be read.
pub async fn play(quiz: QuizLoopService) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Getting new trivia...");
    let snapshot = quiz.start_new_quiz().await;
    show(&render(&snapshot, quiz.result().as_ref()))?;

    while let Some(line) = lines.next_line().await? {
        match parse_intent(&line) {
            Intent::Quit => break,
            Intent::Restart => {
                println!("Getting new trivia...");
                quiz.start_new_quiz().await;
            }
            Intent::Answer(key) => match quiz.submit_answer(key) {
                Ok(correct) => println!("{}", feedback(&quiz.snapshot(), correct)),
                Err(err) => println!("{err}"),
            },
            Intent::Next => {
                if let Err(err) = quiz.advance() {
                    println!("{err}");
                }
            }
            Intent::Unknown => {
                println!("Type a letter to answer, Enter for next, 'r' for new questions, 'q' to quit.");
            }
        }
        show(&render(&quiz.snapshot(), quiz.result().as_ref()))?;
    }
    Ok(())
}
