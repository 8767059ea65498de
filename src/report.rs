//! Operator-facing output.
//!
//! Everything here writes to stdout; diagnostics go through `tracing` to the
//! log file instead.

use std::{cell::RefCell, path::Path, time::Duration};

use console::{StyledObject, style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    login::LoginError,
    orchestrator::{Observer, Outcome, Stage, Tally},
};

pub fn info(message: &str) {
    println!("{}", status_line(style("ℹ").cyan(), message));
}

pub fn success(message: &str) {
    println!("{}", status_line(style("✓").green(), message));
}

pub fn warn(message: &str) {
    println!("{}", status_line(style("⚠").yellow(), message));
}

pub fn failure(message: &str) {
    println!("{}", status_line(style("✗").red().bold(), message));
}

fn status_line(symbol: StyledObject<&str>, message: &str) -> String {
    format!("{symbol} {message}")
}

pub fn rule(title: &str) {
    let line = style("═".repeat(51)).cyan();
    println!("\n{line}\n{}\n{line}", style(title).bold());
}

pub fn panel(title: &str, lines: &[&str]) {
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .chain([title.chars().count() + 2])
        .max()
        .unwrap_or_default();

    let edge = |text: &str| style(text.to_owned()).cyan();

    println!();
    println!(
        "{}{}{}",
        edge("╭─ "),
        style(title).bold(),
        edge(&format!(" {}╮", "─".repeat(width - title.chars().count() - 1)))
    );
    for line in lines {
        println!("{} {line:<width$} {}", edge("│"), edge("│"));
    }
    println!("{}", edge(&format!("╰{}╯", "─".repeat(width + 2))));
    println!();
}

pub fn banner() {
    panel("SESSION MAKER", &["Batch-create Telegram sessions from a list of phone numbers"]);
}

/// Message shown for a failed attempt.
pub fn failure_message(phone_number: &str, err: &LoginError) -> String {
    match err {
        LoginError::InvalidPhoneNumber => format!("Invalid phone number: {phone_number}"),
        LoginError::InvalidApiCredentials => "Invalid API ID or API Hash".to_owned(),
        LoginError::InvalidCode => "Invalid verification code".to_owned(),
        LoginError::InvalidPassword => "Invalid 2FA password".to_owned(),
        LoginError::FloodWait { seconds } => {
            format!("Flood wait error. Please wait {seconds} seconds")
        }
        LoginError::Cancelled => "Skipped by user".to_owned(),
        LoginError::Other(err) => format!("Error: {err:#}"),
    }
}

pub fn render_summary(tally: &Tally) -> String {
    let rows = [
        ("Successful", tally.successes),
        ("Failed", tally.failures),
        ("Total", tally.total),
    ];
    let count_width = rows
        .iter()
        .map(|(_, count)| count.to_string().len())
        .max()
        .unwrap_or_default()
        .max("Count".len());
    let status_width = "Successful".len();

    let border = |left: &str, mid: &str, right: &str| {
        style(format!(
            "{left}{}{mid}{}{right}",
            "─".repeat(status_width + 2),
            "─".repeat(count_width + 2)
        ))
        .cyan()
        .to_string()
    };
    let bar = style("│").cyan();
    // pad before styling so escape codes don't count towards the width
    let row = |status: StyledObject<String>, count: StyledObject<String>| {
        format!("{bar} {status} {bar} {count} {bar}")
    };
    let cell = |text: String| style(text);

    let mut out = vec![
        style("Session Creation Summary").bold().to_string(),
        border("╭", "┬", "╮"),
        row(
            cell(format!("{:^status_width$}", "Status")).bold(),
            cell(format!("{:^count_width$}", "Count")).bold(),
        ),
        border("├", "┼", "┤"),
    ];
    for (index, (status, count)) in rows.into_iter().enumerate() {
        let status = cell(format!("{status:^status_width$}"));
        let count = cell(format!("{count:^count_width$}"));
        out.push(match index {
            0 => row(status.green(), count.green()),
            1 => row(status.red(), count.red()),
            _ => row(status.bold(), count.bold()),
        });
    }
    out.push(border("╰", "┴", "╯"));
    out.join("\n")
}

pub fn summary(tally: &Tally, sessions_dir: &Path) {
    println!();
    println!("{}", render_summary(tally));
    println!();

    if tally.successes > 0 {
        panel(
            "Done",
            &[format!("Session files saved in: {}/", sessions_dir.display()).as_str()],
        );
    }
}

/// Shows a spinner during network stages and clears it before prompts.
#[derive(Default)]
pub struct ConsoleObserver {
    spinner: RefCell<Option<ProgressBar>>,
}

impl ConsoleObserver {
    fn set_spinner(&self, message: &'static str) {
        let mut spinner = self.spinner.borrow_mut();
        let spinner = spinner.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        spinner.set_message(message);
    }

    fn clear_spinner(&self) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }
    }
}

impl Observer for ConsoleObserver {
    fn attempt_started(&self, phone_number: &str) {
        println!("\n{} Creating session for {phone_number}", style("→").cyan().bold());
    }

    fn stage(&self, stage: Stage) {
        match stage {
            Stage::Connecting => self.set_spinner("Connecting to Telegram..."),
            Stage::RequestingCode => self.set_spinner("Sending code request..."),
            Stage::SubmittingCode => self.set_spinner("Signing in..."),
            Stage::SubmittingPassword => self.set_spinner("Checking 2FA password..."),
            Stage::Saving => self.set_spinner("Saving session..."),
            Stage::AwaitingCode | Stage::AwaitingPassword => self.clear_spinner(),
        }
    }

    fn attempt_finished(&self, phone_number: &str, outcome: &Outcome) {
        self.clear_spinner();
        match outcome {
            Outcome::Success {
                session_path,
                already_authorized,
            } => {
                let name = session_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if *already_authorized {
                    success(&format!("Session already authorized: {name}"));
                } else {
                    success(&format!("Session created successfully: {name}"));
                }
            }
            Outcome::Failure(err) => failure(&failure_message(phone_number, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_counts() {
        let tally = Tally {
            successes: 3,
            failures: 1,
            total: 4,
        };
        let rendered = render_summary(&tally);
        let rendered = console::strip_ansi_codes(&rendered);
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines[0], "Session Creation Summary");
        assert!(lines[4].contains("Successful") && lines[4].contains('3'));
        assert!(lines[5].contains("Failed") && lines[5].contains('1'));
        assert!(lines[6].contains("Total") && lines[6].contains('4'));
        // every row has the same display width
        let widths: Vec<_> = lines[1..].iter().map(|line| line.chars().count()).collect();
        assert!(widths.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn status_lines_color_only_the_symbol() {
        let line = status_line(style("✓").green().force_styling(true), "Loaded 2 API credential(s)");

        assert!(line.starts_with("\u{1b}[32m✓"));
        assert_eq!(console::strip_ansi_codes(&line), "✓ Loaded 2 API credential(s)");
    }

    #[test]
    fn summary_rows_are_colored_by_status() {
        console::set_colors_enabled(true);
        let rendered = render_summary(&Tally {
            successes: 1,
            failures: 1,
            total: 2,
        });
        let lines: Vec<_> = rendered.lines().collect();

        assert!(lines[4].contains("\u{1b}[32m"));
        assert!(lines[5].contains("\u{1b}[31m"));
        assert!(!lines[4].contains("\u{1b}[31m"));
    }

    #[test]
    fn failure_messages_name_the_cause() {
        assert_eq!(
            failure_message("+1abc", &LoginError::InvalidPhoneNumber),
            "Invalid phone number: +1abc"
        );
        assert_eq!(
            failure_message("+1", &LoginError::FloodWait { seconds: 60 }),
            "Flood wait error. Please wait 60 seconds"
        );
        assert_eq!(failure_message("+1", &LoginError::Cancelled), "Skipped by user");
    }
}
