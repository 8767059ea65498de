use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::Instrument;

use crate::{
    credentials::{ApiCredential, CredentialSet},
    login::{LoginClient, LoginConnector, LoginError, SignIn},
    phone,
    prompt::{self, Prompter},
};

impl From<prompt::Error> for LoginError {
    fn from(err: prompt::Error) -> Self {
        match err {
            prompt::Error::Interrupted => LoginError::Cancelled,
            prompt::Error::Dialoguer(err) => LoginError::Other(err.into()),
            prompt::Error::Join(err) => LoginError::Other(err.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub successes: usize,
    pub failures: usize,
    pub total: usize,
}

impl Tally {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success { .. } => self.successes += 1,
            Outcome::Failure(_) => self.failures += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug)]
pub enum Outcome {
    Success {
        session_path: PathBuf,
        already_authorized: bool,
    },
    Failure(LoginError),
}

/// Handshake progress of the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connecting,
    RequestingCode,
    AwaitingCode,
    SubmittingCode,
    AwaitingPassword,
    SubmittingPassword,
    Saving,
}

pub trait Observer {
    fn attempt_started(&self, phone_number: &str);
    fn stage(&self, stage: Stage);
    fn attempt_finished(&self, phone_number: &str, outcome: &Outcome);
}

/// Time and interrupt source for the batch.
#[allow(async_fn_in_trait)]
pub trait Pacer {
    /// Fixed pause between two attempts.
    async fn cooldown(&self);
    /// Resolves once the operator interrupts.
    async fn interrupted(&self);
}

pub struct TokioPacer {
    cooldown: Duration,
}

impl TokioPacer {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }
}

impl Pacer for TokioPacer {
    async fn cooldown(&self) {
        tokio::time::sleep(self.cooldown).await;
    }

    async fn interrupted(&self) {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(?err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Debug, Default)]
pub struct Batch {
    pub tally: Tally,
    /// Set when the operator interrupted between two attempts; the remaining
    /// numbers were not attempted.
    pub interrupted: bool,
}

pub struct Orchestrator<'a, C, P, O, W> {
    pub connector: &'a C,
    pub prompter: &'a P,
    pub observer: &'a O,
    pub pacer: &'a W,
    pub sessions_dir: &'a Path,
}

impl<C, P, O, W> Orchestrator<'_, C, P, O, W>
where
    C: LoginConnector,
    P: Prompter,
    O: Observer,
    W: Pacer,
{
    /// Attempts every phone number in order. A failed number never stops
    /// the batch.
    pub async fn run(&self, phone_numbers: &[String], credentials: &CredentialSet) -> Batch {
        let mut batch = Batch::default();

        for (index, phone_number) in phone_numbers.iter().enumerate() {
            let credential = credentials.resolve(index);

            let span = tracing::info_span!("attempt", index, phone_number = phone_number.as_str());

            self.observer.attempt_started(phone_number);
            let outcome = self
                .attempt(phone_number, credential)
                .instrument(span.clone())
                .await;
            batch.tally.record(&outcome);
            self.observer.attempt_finished(phone_number, &outcome);

            span.in_scope(|| {
                tracing::info!(
                    success = matches!(outcome, Outcome::Success { .. }),
                    successes = batch.tally.successes,
                    failures = batch.tally.failures,
                    "attempt finished"
                )
            });

            if index + 1 < phone_numbers.len() {
                tokio::select! {
                    _ = self.pacer.cooldown() => {}
                    _ = self.pacer.interrupted() => {
                        tracing::info!("interrupted between attempts");
                        batch.interrupted = true;
                        break;
                    }
                }
            }
        }

        batch
    }

    // Prompts are read off the runtime thread, so the interrupt branch can win
    // even while the operator is being asked for a code or password.
    async fn attempt(&self, phone_number: &str, credential: &ApiCredential) -> Outcome {
        let Some(normalized) = phone::normalize(phone_number) else {
            tracing::warn!("phone number is not a digit sequence");
            return Outcome::Failure(LoginError::InvalidPhoneNumber);
        };
        let session_path = phone::session_path(self.sessions_dir, &normalized);
        let existed = session_path.exists();

        let result = tokio::select! {
            result = self.login(&normalized, &session_path, credential) => result,
            _ = self.pacer.interrupted() => Err(LoginError::Cancelled),
        };

        match result {
            Ok(already_authorized) => Outcome::Success {
                session_path,
                already_authorized,
            },
            Err(err) => {
                tracing::warn!(?err, "login failed");
                if !existed {
                    discard_session(&session_path);
                }
                Outcome::Failure(err)
            }
        }
    }

    // Returns whether the session was already authorized.
    async fn login(
        &self,
        phone_number: &str,
        session_path: &Path,
        credential: &ApiCredential,
    ) -> Result<bool, LoginError> {
        self.observer.stage(Stage::Connecting);
        let client = self.connector.connect(session_path, credential).await?;

        let already_authorized = client.is_authorized().await?;
        tracing::debug!(already_authorized);

        if !already_authorized {
            self.observer.stage(Stage::RequestingCode);
            let login_token = client.request_code(phone_number).await?;

            self.observer.stage(Stage::AwaitingCode);
            let code = self
                .prompter
                .input_detached(&format!("Enter the code sent to {phone_number}"))
                .await?;

            self.observer.stage(Stage::SubmittingCode);
            if let SignIn::PasswordRequired(password_token) =
                client.submit_code(&login_token, &code).await?
            {
                self.observer.stage(Stage::AwaitingPassword);
                let password = self
                    .prompter
                    .password_detached("Enter your 2FA password")
                    .await?;

                self.observer.stage(Stage::SubmittingPassword);
                client.submit_password(password_token, &password).await?;
            }
        }

        self.observer.stage(Stage::Saving);
        client.finish().await?;

        Ok(already_authorized)
    }
}

// Drops the unauthorized session file a failed attempt left behind.
fn discard_session(session_path: &Path) {
    match fs::remove_file(session_path) {
        Ok(()) => tracing::debug!(session_path = %session_path.display(), "removed unauthorized session"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(?err, session_path = %session_path.display(), "failed to remove session")
        }
    }
}
