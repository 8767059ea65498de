use std::{fs, io, path::PathBuf, process::ExitCode, time::Duration};

use anyhow::Result;

use crate::{
    collect::{self, collect_credentials},
    login::LoginConnector,
    orchestrator::{Batch, Observer, Orchestrator, Pacer, TokioPacer},
    prompt::{self, Prompter, TerminalPrompter},
    report::{self, ConsoleObserver},
    store,
    wrapped_client::GrammersConnector,
};

#[derive(Debug)]
pub struct Options {
    pub phone_file: PathBuf,
    pub api_file: PathBuf,
    pub sessions_dir: PathBuf,
    pub cooldown: Duration,
    pub assume_yes: bool,
}

/// Setup failure. Nothing has been attempted when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] store::Error),
    #[error(transparent)]
    Collect(#[from] collect::Error),
    #[error(transparent)]
    Prompt(#[from] prompt::Error),
    #[error("failed to create sessions directory {}", .path.display())]
    SessionsDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    fn is_interrupted(&self) -> bool {
        match self {
            Self::Collect(err) => err.is_interrupted(),
            Self::Prompt(err) => matches!(err, prompt::Error::Interrupted),
            _ => false,
        }
    }

    // Broken environment rather than bad operator input.
    fn is_fault(&self) -> bool {
        match self {
            Self::SessionsDir { .. } | Self::Store(store::Error::Io { .. }) => true,
            Self::Collect(collect::Error::Store(store::Error::Io { .. })) => true,
            Self::Prompt(err) | Self::Collect(collect::Error::Prompt(err)) => {
                !matches!(err, prompt::Error::Interrupted)
            }
            _ => false,
        }
    }

    fn created_template(&self) -> bool {
        matches!(
            self,
            Self::Store(store::Error::NotFound { .. })
                | Self::Collect(collect::Error::Store(store::Error::NotFound { .. }))
        )
    }
}

#[derive(Debug)]
pub enum RunStatus {
    Completed(Batch),
    Declined,
}

/// How a `create` run ended, as far as the exit code is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Completed,
    Declined,
    Interrupted,
    /// Missing or unusable input files, or bad interactive entry. The operator
    /// has been told what to fix.
    SetupFailed,
    /// The filesystem or terminal failed underneath us.
    Fault,
}

impl Ending {
    fn of(result: &Result<RunStatus, Error>) -> Self {
        match result {
            Ok(RunStatus::Completed(_)) => Self::Completed,
            Ok(RunStatus::Declined) => Self::Declined,
            Err(err) if err.is_interrupted() => Self::Interrupted,
            Err(err) if err.is_fault() => Self::Fault,
            Err(_) => Self::SetupFailed,
        }
    }

    fn is_failure(self) -> bool {
        self == Self::Fault
    }

    fn waits_for_enter(self) -> bool {
        self != Self::Interrupted
    }

    fn exit_code(self) -> ExitCode {
        if self.is_failure() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

pub async fn process(options: Options, no_wait: bool) -> Result<ExitCode> {
    report::banner();

    let prompter = TerminalPrompter::default();
    let pacer = TokioPacer::new(options.cooldown);

    let result = run(
        &options,
        &prompter,
        &GrammersConnector,
        &ConsoleObserver::default(),
        &pacer,
    )
    .await;

    let ending = Ending::of(&result);
    match result {
        Ok(RunStatus::Completed(batch)) => {
            report::summary(&batch.tally, &options.sessions_dir);
            if batch.interrupted {
                report::warn("Operation cancelled by user");
            }
        }
        Ok(RunStatus::Declined) => report::warn("Operation cancelled"),
        Err(err) if ending == Ending::Interrupted => {
            tracing::info!(%err, "interrupted during setup");
            report::warn("Operation cancelled by user");
        }
        Err(err) => {
            tracing::error!(?err, ?ending, "setup failed");
            report::failure(&format!("Error: {err}"));
            if err.created_template() {
                report::success("Example file created. Please fill it in and run again.");
            }
        }
    }

    if !no_wait && ending.waits_for_enter() {
        // any answer, including an interrupt, means exit
        let _ = prompter.input_detached("Press Enter to exit").await;
    }

    Ok(ending.exit_code())
}

pub async fn run<C, P, O, W>(
    options: &Options,
    prompter: &P,
    connector: &C,
    observer: &O,
    pacer: &W,
) -> Result<RunStatus, Error>
where
    C: LoginConnector,
    P: Prompter,
    O: Observer,
    W: Pacer,
{
    fs::create_dir_all(&options.sessions_dir).map_err(|source| Error::SessionsDir {
        path: options.sessions_dir.clone(),
        source,
    })?;

    let phone_numbers = store::load_phones(&options.phone_file)?;
    report::success(&format!(
        "Loaded {} phone number(s) from {}",
        phone_numbers.len(),
        options.phone_file.display()
    ));

    let credentials = collect_credentials(prompter, &options.api_file, phone_numbers.len())?;

    if !options.assume_yes
        && !prompter.confirm(
            &format!(
                "Ready to create {} session(s). Continue?",
                phone_numbers.len()
            ),
            true,
        )?
    {
        tracing::info!("operator declined");
        return Ok(RunStatus::Declined);
    }

    report::rule("Starting Session Creation...");

    let batch = Orchestrator {
        connector,
        prompter,
        observer,
        pacer,
        sessions_dir: &options.sessions_dir,
    }
    .run(&phone_numbers, &credentials)
    .await;

    tracing::info!(tally = ?batch.tally, interrupted = batch.interrupted, "batch finished");
    Ok(RunStatus::Completed(batch))
}
