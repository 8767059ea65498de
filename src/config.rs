use std::path::PathBuf;

use serde::Deserialize;

pub const ENV_PREFIX: &str = "SESSION_MAKER_";

/// Settings read from `SESSION_MAKER_*` environment variables (and `.env`).
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_phone_file")]
    pub phone_file: PathBuf,
    #[serde(default = "default_api_file")]
    pub api_file: PathBuf,
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

fn default_phone_file() -> PathBuf {
    "phone.csv".into()
}

fn default_api_file() -> PathBuf {
    "api.csv".into()
}

fn default_sessions_dir() -> PathBuf {
    "sessions".into()
}

fn default_log_dir() -> PathBuf {
    "logs".into()
}

fn default_cooldown_ms() -> u64 {
    1000
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config: Config = envy::prefixed(ENV_PREFIX)
            .from_iter(Vec::<(String, String)>::new())
            .unwrap();

        assert_eq!(config.phone_file, PathBuf::from("phone.csv"));
        assert_eq!(config.api_file, PathBuf::from("api.csv"));
        assert_eq!(config.sessions_dir, PathBuf::from("sessions"));
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.cooldown_ms, 1000);
    }

    #[test]
    fn prefixed_variables_override_defaults() {
        let config: Config = envy::prefixed(ENV_PREFIX)
            .from_iter([
                ("SESSION_MAKER_PHONE_FILE".to_owned(), "data/phones.txt".to_owned()),
                ("SESSION_MAKER_COOLDOWN_MS".to_owned(), "2500".to_owned()),
                ("PHONE_FILE".to_owned(), "ignored".to_owned()),
            ])
            .unwrap();

        assert_eq!(config.phone_file, PathBuf::from("data/phones.txt"));
        assert_eq!(config.cooldown_ms, 2500);
    }

    #[test]
    fn malformed_cooldown_is_rejected() {
        let result: Result<Config, _> = envy::prefixed(ENV_PREFIX)
            .from_iter([("SESSION_MAKER_COOLDOWN_MS".to_owned(), "soon".to_owned())]);

        assert!(result.is_err());
    }
}
