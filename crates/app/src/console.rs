use std::io::{self, BufRead, Write};

use services::UserPrompt;
use study_core::{ClampWarning, Subject};

/// Terminal-backed prompt: questions on stderr, answers from stdin.
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl UserPrompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{question} [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn warn(&self, warning: &ClampWarning) {
        eprintln!("warning: {warning}");
    }

    fn notify(&self, message: &str) {
        println!("{message}");
    }
}

/// One line per subject: id, marks strip, done/total, title.
pub fn render_subject(subject: &Subject) -> String {
    let strip: String = subject
        .marks()
        .iter()
        .map(|done| if *done { '#' } else { '.' })
        .collect();
    let progress = subject.progress();
    let badge = if progress.is_complete() { " (complete)" } else { "" };
    format!(
        "{}  [{}] {}/{}  {}{}",
        subject.id(),
        strip,
        progress.done,
        progress.total,
        subject.title(),
        badge
    )
}
