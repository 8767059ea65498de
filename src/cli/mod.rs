use std::{path::PathBuf, process::ExitCode, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::{config::Config, logging};

mod create;
mod init;

#[derive(Debug, Parser)]
#[clap(
    version,
    about = "Batch-create Telegram sessions from a list of phone numbers",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// `create` flags, accepted without naming the subcommand.
    #[clap(flatten)]
    create: Create,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in every phone number and save its session (default).
    Create(Create),
    /// Write template phone and API credential files.
    Init(Init),
}

#[derive(Debug, Default, Parser)]
struct Create {
    #[clap(flatten)]
    files: Files,
    /// Directory the session files are written to.
    #[clap(long)]
    sessions_dir: Option<PathBuf>,
    /// Pause between two phone numbers, in milliseconds.
    #[clap(long)]
    cooldown_ms: Option<u64>,
    /// Don't ask for confirmation before starting.
    #[clap(long, short)]
    yes: bool,
    /// Exit without waiting for Enter.
    #[clap(long)]
    no_wait: bool,
}

#[derive(Debug, Default, Parser)]
struct Init {
    #[clap(flatten)]
    files: Files,
}

#[derive(Debug, Default, Parser)]
struct Files {
    /// Phone numbers, one per line.
    #[clap(long)]
    phone_file: Option<PathBuf>,
    /// API credentials, `api_id,api_hash` per line.
    #[clap(long)]
    api_file: Option<PathBuf>,
}

impl Cli {
    pub async fn process(self) -> Result<ExitCode> {
        let config = Config::from_env()?;
        let _log_guard = logging::init(&config.log_dir)?;

        let command = self.command.unwrap_or(Command::Create(self.create));
        tracing::debug!(?config, ?command);

        match command {
            Command::Create(Create {
                files,
                sessions_dir,
                cooldown_ms,
                yes,
                no_wait,
            }) => {
                let options = create::Options {
                    phone_file: files.phone_file.unwrap_or(config.phone_file),
                    api_file: files.api_file.unwrap_or(config.api_file),
                    sessions_dir: sessions_dir.unwrap_or(config.sessions_dir),
                    cooldown: Duration::from_millis(cooldown_ms.unwrap_or(config.cooldown_ms)),
                    assume_yes: yes,
                };
                create::process(options, no_wait).await
            }
            Command::Init(Init { files }) => init::process(
                &files.phone_file.unwrap_or(config.phone_file),
                &files.api_file.unwrap_or(config.api_file),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_create() {
        let cli = Cli::try_parse_from(["session-maker"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.create.yes && !cli.create.no_wait);
    }

    #[test]
    fn create_flags_work_without_the_subcommand() {
        let cli = Cli::try_parse_from(["session-maker", "--no-wait", "-y", "--sessions-dir", "out"])
            .unwrap();

        assert!(cli.command.is_none());
        assert!(cli.create.yes && cli.create.no_wait);
        assert_eq!(cli.create.sessions_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn top_level_flags_conflict_with_a_subcommand() {
        assert!(Cli::try_parse_from(["session-maker", "--no-wait", "init"]).is_err());
    }

    #[test]
    fn create_flags_parse() {
        let cli = Cli::try_parse_from([
            "session-maker",
            "create",
            "--phone-file",
            "numbers.txt",
            "--cooldown-ms",
            "250",
            "-y",
            "--no-wait",
        ])
        .unwrap();

        let Some(Command::Create(create)) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(create.files.phone_file, Some(PathBuf::from("numbers.txt")));
        assert_eq!(create.cooldown_ms, Some(250));
        assert!(create.yes && create.no_wait);
    }

    #[test]
    fn init_accepts_file_overrides() {
        let cli = Cli::try_parse_from(["session-maker", "init", "--api-file", "keys.csv"]).unwrap();
        let Some(Command::Init(init)) = cli.command else {
            panic!("expected init");
        };
        assert_eq!(init.files.api_file, Some(PathBuf::from("keys.csv")));
    }
}
