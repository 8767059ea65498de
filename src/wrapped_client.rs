use std::path::{Path, PathBuf};

use anyhow::Context;
use grammers_client::{
    Client, InvocationError, SignInError,
    client::auth::AuthorizationError,
    session::Session,
    types::{LoginToken, PasswordToken},
};

use crate::{
    credentials::ApiCredential,
    login::{LoginClient, LoginConnector, LoginError, Result, SignIn},
};

impl From<InvocationError> for LoginError {
    fn from(err: InvocationError) -> Self {
        let classified = match &err {
            InvocationError::Rpc(rpc) => LoginError::from_rpc(&rpc.name, rpc.value),
            _ => None,
        };
        classified.unwrap_or_else(|| LoginError::Other(err.into()))
    }
}

impl From<AuthorizationError> for LoginError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::Invoke(err) => err.into(),
            err => LoginError::Other(err.into()),
        }
    }
}

fn sign_in_failure(err: SignInError) -> LoginError {
    match err {
        SignInError::InvalidCode => LoginError::InvalidCode,
        SignInError::InvalidPassword => LoginError::InvalidPassword,
        SignInError::Other(err) => err.into(),
        err => LoginError::Other(err.into()),
    }
}

/// Connects [`WrappedClient`]s through `grammers`.
#[derive(Debug, Default)]
pub struct GrammersConnector;

impl LoginConnector for GrammersConnector {
    type Client = WrappedClient;

    async fn connect(&self, session_path: &Path, credential: &ApiCredential) -> Result<WrappedClient> {
        WrappedClient::connect(session_path.to_owned(), credential).await
    }
}

/// A `grammers` client tied to the session file it was loaded from.
pub struct WrappedClient {
    session_path: PathBuf,
    client: Client,
}

impl WrappedClient {
    pub async fn connect(session_path: PathBuf, credential: &ApiCredential) -> Result<Self> {
        let session = Session::load_file_or_create(&session_path)
            .with_context(|| format!("failed to open session {}", session_path.display()))?;

        let client = Client::connect(grammers_client::Config {
            session,
            api_id: credential.api_id,
            api_hash: credential.api_hash.clone(),
            params: Default::default(),
        })
        .await?;

        tracing::debug!(session_path = %session_path.display(), "connected");

        Ok(Self {
            session_path,
            client,
        })
    }
}

impl LoginClient for WrappedClient {
    type LoginToken = LoginToken;
    type PasswordToken = PasswordToken;

    async fn is_authorized(&self) -> Result<bool> {
        Ok(self.client.is_authorized().await?)
    }

    async fn request_code(&self, phone_number: &str) -> Result<LoginToken> {
        Ok(self.client.request_login_code(phone_number).await?)
    }

    async fn submit_code(&self, token: &LoginToken, code: &str) -> Result<SignIn<PasswordToken>> {
        match self.client.sign_in(token, code).await {
            Ok(user) => {
                tracing::debug!(user_id = user.id(), "signed in");
                Ok(SignIn::Authorized)
            }
            Err(SignInError::PasswordRequired(token)) => Ok(SignIn::PasswordRequired(token)),
            Err(err) => Err(sign_in_failure(err)),
        }
    }

    async fn submit_password(&self, token: PasswordToken, password: &str) -> Result<()> {
        let user = self
            .client
            .check_password(token, password)
            .await
            .map_err(sign_in_failure)?;
        tracing::debug!(user_id = user.id(), "second factor accepted");
        Ok(())
    }

    async fn finish(self) -> Result<()> {
        self.client.sync_update_state();
        self.client
            .session()
            .save_to_file(&self.session_path)
            .with_context(|| format!("failed to save session {}", self.session_path.display()))?;
        tracing::debug!(session_path = %self.session_path.display(), "session saved, disconnecting");
        Ok(())
    }
}
