use std::fmt::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};

use lingo_core::model::SessionSummary;
use services::{DriverEvent, Prompt, SessionDriver, SessionView};

/// One line of learner input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// 1-based pick from the option list.
    Choose(usize),
    /// Free text, used when the session is too small for options.
    Answer(String),
    Reveal,
    Next,
    Quit,
    Help,
}

/// Commands are `r`, `n`, `q` and `h`, optionally prefixed with `:`. Without
/// options every bare word is an answer, so only the `:` form is a command.
#[must_use]
pub fn parse_input(line: &str, option_count: usize) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(command) = line.strip_prefix(':') {
        return parse_command(command);
    }
    if option_count == 0 {
        return Some(Input::Answer(line.to_owned()));
    }
    if let Some(command) = parse_command(line) {
        return Some(command);
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=option_count).contains(&n) => Some(Input::Choose(n)),
        Ok(_) => None,
        Err(_) => Some(Input::Answer(line.to_owned())),
    }
}

fn parse_command(word: &str) -> Option<Input> {
    match word.trim().to_ascii_lowercase().as_str() {
        "r" | "reveal" => Some(Input::Reveal),
        "n" | "next" => Some(Input::Next),
        "q" | "quit" => Some(Input::Quit),
        "h" | "?" | "help" => Some(Input::Help),
        _ => None,
    }
}

/// How the quiz loop ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub summary: Option<SessionSummary>,
    pub experience_gained: u64,
    pub quit_early: bool,
}

/// Drive one session from stdin until it completes or the learner quits.
///
/// # Errors
///
/// Returns an I/O error if stdin cannot be read.
pub async fn run_quiz(mut driver: SessionDriver) -> std::io::Result<Outcome> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut quit_early = false;

    println!("{}", format_view(&driver.view()));
    while !driver.engine().is_complete() {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    quit_early = true;
                    break;
                };
                let view = driver.view();
                let changed = match parse_input(&line, view.answer_options.len()) {
                    Some(Input::Choose(n)) => view
                        .answer_options
                        .get(n - 1)
                        .is_some_and(|option| driver.select_answer(option)),
                    Some(Input::Answer(text)) => driver.select_answer(&text),
                    Some(Input::Reveal) => driver.reveal_answer(),
                    Some(Input::Next) => driver.next(),
                    Some(Input::Quit) => {
                        quit_early = true;
                        break;
                    }
                    Some(Input::Help) => {
                        println!("{HELP}");
                        false
                    }
                    None => {
                        println!("Pick an option number, or r / n / q (h for help).");
                        false
                    }
                };
                if changed {
                    println!("{}", format_view(&driver.view()));
                }
            }
            event = driver.next_event() => match event {
                Some(DriverEvent::Advanced { .. }) => println!("{}", format_view(&driver.view())),
                Some(DriverEvent::Progress(update)) => {
                    tracing::debug!(
                        item_id = %update.item_id,
                        mastery = update.mastery_percent,
                        "progress saved"
                    );
                }
                None => break,
            },
        }
    }

    if quit_early {
        driver.shutdown();
    }
    driver.flush().await;
    for event in driver.drain_ready() {
        tracing::debug!(?event, "late driver event");
    }

    Ok(Outcome {
        summary: driver.summary(),
        experience_gained: driver.experience_gained(),
        quit_early,
    })
}

const HELP: &str = "Commands: <number> pick an option, r reveal, n next, q quit. \
Without options, type the answer and use :r, :n, :q for commands.";

#[must_use]
pub fn format_view(view: &SessionView) -> String {
    let mut out = String::new();
    if view.completed {
        return "Session complete.".to_owned();
    }
    let Some(item) = view.current_item.as_ref() else {
        return out;
    };

    let _ = writeln!(out, "\n[{}/{}]", view.position + 1, view.total);
    match &view.prompt {
        Some(Prompt::Listen(media)) => {
            let _ = writeln!(out, "Listen ({media}) and pick the word.");
        }
        Some(Prompt::Definition(definition)) => {
            let _ = writeln!(out, "Which word means \"{definition}\"?");
        }
        Some(Prompt::Term(term)) => {
            let _ = writeln!(out, "What does \"{term}\" mean?");
        }
        None => {}
    }

    for (idx, option) in view.answer_options.iter().enumerate() {
        let marker = match (&view.selected_answer, &view.correct_answer) {
            (_, Some(correct)) if option == correct => "*",
            (Some(selected), _) if option == selected => "x",
            _ => " ",
        };
        let _ = writeln!(out, "  {marker} {}. {option}", idx + 1);
    }
    if view.answer_options.is_empty() && !view.revealed {
        let _ = writeln!(out, "  (type your answer; :r reveal, :n next, :q quit)");
    }

    if view.revealed {
        match view.is_correct {
            Some(true) => {
                let _ = writeln!(out, "Correct!");
            }
            Some(false) => {
                let _ = writeln!(out, "Not quite.");
            }
            None => {}
        }
        if let Some(answer) = &view.correct_answer {
            let _ = writeln!(out, "Answer: {answer}");
        }
        if let Some(pronunciation) = item.pronunciation() {
            let _ = writeln!(out, "Pronunciation: {pronunciation}");
        }
        if let Some(example) = item.rendered_example() {
            let _ = writeln!(out, "Example: {example}");
        }
        if let Some(remaining) = view.remaining_auto_advance {
            let skip = if view.answer_options.is_empty() { ":n" } else { "n" };
            let _ = writeln!(out, "Next in {}s ({skip} to skip ahead)", remaining.as_secs());
        }
    }

    let stats = view.stats;
    let _ = write!(
        out,
        "correct {}  incorrect {}  skipped {}",
        stats.correct, stats.incorrect, stats.skipped
    );
    out
}

#[must_use]
pub fn format_outcome(outcome: &Outcome, total_experience: u64, mastery: u8) -> String {
    let mut out = String::new();
    if outcome.quit_early {
        let _ = writeln!(out, "Session ended early.");
    }
    if let Some(summary) = &outcome.summary {
        let stats = summary.stats;
        let _ = writeln!(
            out,
            "{} items: {} correct, {} incorrect, {} skipped, {} unanswered ({}% accuracy)",
            summary.total_items,
            stats.correct,
            stats.incorrect,
            stats.skipped,
            summary.unanswered(),
            summary.accuracy_percent()
        );
    }
    let _ = write!(
        out,
        "+{} XP this session, {} XP total, {}% of the category mastered",
        outcome.experience_gained, total_experience, mastery
    );
    out
}
