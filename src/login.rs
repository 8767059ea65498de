//! Call-and-response contract of the external login handshake.
//!
//! The orchestrator only ever talks to these traits; the MTProto side lives
//! in [`crate::wrapped_client`].

use std::path::Path;

use crate::credentials::ApiCredential;

/// Terminal failure of a single phone number's login attempt.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("invalid phone number")]
    InvalidPhoneNumber,
    #[error("invalid API ID or API hash")]
    InvalidApiCredentials,
    #[error("invalid verification code")]
    InvalidCode,
    #[error("invalid 2FA password")]
    InvalidPassword,
    #[error("flood wait, retry in {seconds} seconds")]
    FloodWait { seconds: u32 },
    #[error("skipped by operator")]
    Cancelled,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = LoginError> = std::result::Result<T, E>;

impl LoginError {
    /// Maps an MTProto RPC error name (without the numeric suffix) to a
    /// named failure. `value` carries the suffix, e.g. the wait of
    /// `FLOOD_WAIT_30`.
    pub fn from_rpc(name: &str, value: Option<u32>) -> Option<Self> {
        Some(match name {
            "PHONE_NUMBER_INVALID" => Self::InvalidPhoneNumber,
            "API_ID_INVALID" | "API_ID_PUBLISHED_FLOOD" => Self::InvalidApiCredentials,
            "PHONE_CODE_INVALID" | "PHONE_CODE_EMPTY" | "PHONE_CODE_EXPIRED" => Self::InvalidCode,
            "PASSWORD_HASH_INVALID" => Self::InvalidPassword,
            "FLOOD_WAIT" => Self::FloodWait {
                seconds: value.unwrap_or_default(),
            },
            _ => return None,
        })
    }
}

/// Result of submitting a verification code.
#[derive(Debug)]
pub enum SignIn<P> {
    Authorized,
    PasswordRequired(P),
}

/// Opens clients bound to a session file.
#[allow(async_fn_in_trait)]
pub trait LoginConnector {
    type Client: LoginClient;

    async fn connect(&self, session_path: &Path, credential: &ApiCredential)
    -> Result<Self::Client>;
}

#[allow(async_fn_in_trait)]
pub trait LoginClient {
    type LoginToken;
    type PasswordToken;

    async fn is_authorized(&self) -> Result<bool>;

    async fn request_code(&self, phone_number: &str) -> Result<Self::LoginToken>;

    async fn submit_code(
        &self,
        token: &Self::LoginToken,
        code: &str,
    ) -> Result<SignIn<Self::PasswordToken>>;

    async fn submit_password(&self, token: Self::PasswordToken, password: &str) -> Result<()>;

    /// Persists the session file and drops the connection.
    async fn finish(self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_names_map_to_failure_kinds() {
        assert!(matches!(
            LoginError::from_rpc("PHONE_NUMBER_INVALID", None),
            Some(LoginError::InvalidPhoneNumber)
        ));
        assert!(matches!(
            LoginError::from_rpc("API_ID_INVALID", None),
            Some(LoginError::InvalidApiCredentials)
        ));
        assert!(matches!(
            LoginError::from_rpc("PHONE_CODE_EXPIRED", None),
            Some(LoginError::InvalidCode)
        ));
        assert!(matches!(
            LoginError::from_rpc("FLOOD_WAIT", Some(42)),
            Some(LoginError::FloodWait { seconds: 42 })
        ));
        assert!(LoginError::from_rpc("AUTH_KEY_UNREGISTERED", None).is_none());
    }

    #[test]
    fn flood_wait_message_reports_duration() {
        let err = LoginError::FloodWait { seconds: 300 };
        assert_eq!(err.to_string(), "flood wait, retry in 300 seconds");
    }
}
