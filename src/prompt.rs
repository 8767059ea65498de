use std::{cell::RefCell, io};

use dialoguer::{Confirm, Input, Password};
use tokio::task::{JoinError, JoinHandle};

use crate::report;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("interrupted by operator")]
    Interrupted,
    #[error(transparent)]
    Dialoguer(dialoguer::Error),
    #[error("prompt task failed")]
    Join(#[from] JoinError),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(err) if err.kind() == io::ErrorKind::Interrupted => {
                Self::Interrupted
            }
            err => Self::Dialoguer(err),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Operator prompts.
#[allow(async_fn_in_trait)]
pub trait Prompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
    /// Free text; may be empty.
    fn input(&self, prompt: &str) -> Result<String>;

    /// [`Prompter::input`] read off the runtime thread, so the returned
    /// future can lose a race against an interrupt.
    async fn input_detached(&self, prompt: &str) -> Result<String>;
    /// Text entered without echo, read off the runtime thread.
    async fn password_detached(&self, prompt: &str) -> Result<String>;
}

type PendingRead = JoinHandle<Result<String>>;

#[derive(Default)]
pub struct TerminalPrompter {
    // A detached read whose caller went away. It still owns stdin.
    abandoned: RefCell<Option<PendingRead>>,
}

impl TerminalPrompter {
    async fn detached<F>(&self, read: F) -> Result<String>
    where
        F: FnOnce() -> Result<String> + Send + 'static,
    {
        let abandoned = self.abandoned.borrow_mut().take();
        if let Some(abandoned) = abandoned {
            report::warn("Press Enter to continue");
            // whatever was typed belonged to the cancelled prompt
            let _ = abandoned.await;
        }

        // The handle stays in `abandoned` until the read completes, so a
        // cancelled caller leaves it behind for the next prompt to drain.
        let mut slot = self.abandoned.borrow_mut();
        let handle = slot.insert(tokio::task::spawn_blocking(read));
        let result = handle.await;
        *slot = None;
        result?
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn input(&self, prompt: &str) -> Result<String> {
        read_input(prompt)
    }

    async fn input_detached(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.to_owned();
        self.detached(move || read_input(&prompt)).await
    }

    async fn password_detached(&self, prompt: &str) -> Result<String> {
        let prompt = prompt.to_owned();
        self.detached(move || read_password(&prompt)).await
    }
}

fn read_input(prompt: &str) -> Result<String> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(value.trim().to_owned())
}

fn read_password(prompt: &str) -> Result<String> {
    Ok(Password::new().with_prompt(prompt).interact()?)
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;

    use super::*;

    #[derive(Debug, Clone)]
    pub enum Answer {
        Confirm(bool),
        Text(String),
        Interrupt,
        /// A detached read that never returns, like an operator who walked away.
        Block,
    }

    /// Replays scripted answers in order and records every prompt shown.
    #[derive(Default)]
    pub struct ScriptedPrompter {
        answers: RefCell<VecDeque<Answer>>,
        pub prompts: RefCell<Vec<String>>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
            Self {
                answers: RefCell::new(answers.into_iter().collect()),
                prompts: RefCell::default(),
            }
        }

        pub fn remaining(&self) -> usize {
            self.answers.borrow().len()
        }

        fn next(&self, prompt: &str) -> Result<Answer> {
            self.prompts.borrow_mut().push(prompt.to_owned());
            match self.answers.borrow_mut().pop_front() {
                Some(Answer::Interrupt) => Err(Error::Interrupted),
                Some(Answer::Block) => panic!("blocking answer for non-detached prompt {prompt:?}"),
                Some(answer) => Ok(answer),
                None => panic!("no scripted answer for prompt {prompt:?}"),
            }
        }

        async fn detached_text(&self, prompt: &str) -> Result<String> {
            let blocks = matches!(self.answers.borrow().front(), Some(Answer::Block));
            if blocks {
                self.prompts.borrow_mut().push(prompt.to_owned());
                self.answers.borrow_mut().pop_front();
                return std::future::pending().await;
            }
            self.text(prompt)
        }

        fn text(&self, prompt: &str) -> Result<String> {
            match self.next(prompt)? {
                Answer::Text(text) => Ok(text),
                other => panic!("expected text answer for {prompt:?}, got {other:?}"),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
            match self.next(prompt)? {
                Answer::Confirm(value) => Ok(value),
                other => panic!("expected confirm answer for {prompt:?}, got {other:?}"),
            }
        }

        fn input(&self, prompt: &str) -> Result<String> {
            self.text(prompt)
        }

        async fn input_detached(&self, prompt: &str) -> Result<String> {
            self.detached_text(prompt).await
        }

        async fn password_detached(&self, prompt: &str) -> Result<String> {
            self.detached_text(prompt).await
        }
    }

    pub fn text(value: &str) -> Answer {
        Answer::Text(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn interrupted_read_maps_to_interrupted() {
        let err = dialoguer::Error::IO(io::Error::new(io::ErrorKind::Interrupted, "read interrupted"));
        assert!(matches!(Error::from(err), Error::Interrupted));

        let err = dialoguer::Error::IO(io::Error::other("broken pipe"));
        assert!(matches!(Error::from(err), Error::Dialoguer(_)));
    }

    #[tokio::test]
    async fn abandoned_read_is_drained_before_the_next_prompt() {
        let prompter = TerminalPrompter::default();
        let (late_tx, late_rx) = mpsc::channel::<String>();

        tokio::select! {
            biased;
            _ = prompter.detached(move || Ok(late_rx.recv().unwrap_or_default())) => {
                panic!("read finished before any input")
            }
            _ = tokio::task::yield_now() => {}
        }
        assert!(prompter.abandoned.borrow().is_some());

        late_tx.send("typed for the cancelled prompt".to_owned()).unwrap();
        let answer = prompter.detached(|| Ok("fresh".to_owned())).await.unwrap();

        assert_eq!(answer, "fresh");
        assert!(prompter.abandoned.borrow().is_none());
    }
}
