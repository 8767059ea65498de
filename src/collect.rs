use std::path::Path;

use crate::{
    credentials::{ApiCredential, CredentialSet},
    prompt::{self, Prompter},
    report, store,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] store::Error),
    #[error("invalid API ID {input:?}")]
    InvalidApiId { input: String },
    #[error("no API credentials provided")]
    NoCredentials,
    #[error(transparent)]
    Prompt(#[from] prompt::Error),
}

impl Error {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Prompt(prompt::Error::Interrupted))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

const API_PORTAL_URL: &str = "https://my.telegram.org/apps";

/// Decides which API credentials the batch uses, either from `api_file` or
/// from the operator.
pub fn collect_credentials(
    prompter: &impl Prompter,
    api_file: &Path,
    phone_count: usize,
) -> Result<CredentialSet> {
    let use_file = prompter.confirm(
        &format!("Do you have API credentials in {}?", api_file.display()),
        false,
    )?;

    let set = if use_file {
        load_from_file(api_file)?
    } else {
        prompt_credentials(prompter, phone_count)?
    };

    let fallback_count = set.fallback_count(phone_count);
    if fallback_count > 0 {
        report::warn(&format!(
            "{fallback_count} phone number(s) have no API credentials of their own \
             and will use the first pair"
        ));
    }

    tracing::info!(per_phone = set.is_per_phone(), phone_count, fallback_count, "api credentials resolved");
    Ok(set)
}

fn load_from_file(api_file: &Path) -> Result<CredentialSet> {
    let loaded = store::load_api_credentials(api_file)?;

    for row in &loaded.skipped {
        report::warn(&format!(
            "Skipping invalid row {}: {:?} ({})",
            row.line, row.content, row.reason
        ));
    }

    let count = loaded.credentials.len();
    let set = CredentialSet::from_loaded(loaded.credentials).ok_or(Error::NoCredentials)?;

    report::success(&format!("Loaded {count} API credential(s)"));
    if set.is_per_phone() {
        report::info("Using multiple API credentials (one per phone number)");
    } else {
        report::info("Using single API credential for all phone numbers");
    }

    Ok(set)
}

fn prompt_credentials(prompter: &impl Prompter, phone_count: usize) -> Result<CredentialSet> {
    report::panel(
        "API Credentials Required",
        &[format!("Get your API credentials from: {API_PORTAL_URL}").as_str()],
    );

    let use_multiple = prompter.confirm(
        "Do you want to use different API credentials for each phone number?",
        false,
    )?;

    let set = if use_multiple {
        report::info(&format!("You need to enter {phone_count} API credential(s)"));

        let mut entries = Vec::with_capacity(phone_count);
        for index in 0..phone_count {
            println!("API Credentials #{}", index + 1);
            entries.push(prompt_pair(prompter, "  Enter API ID", "  Enter API Hash")?);
        }
        CredentialSet::per_phone(entries)
    } else {
        println!("Enter API Credentials (will be used for all phone numbers)");
        prompt_pair(prompter, "  API ID", "  API Hash")?.map(CredentialSet::Shared)
    };

    let set = set.ok_or(Error::NoCredentials)?;
    report::success("API credentials configured successfully");
    Ok(set)
}

// A blank id or hash leaves the slot empty; a malformed id aborts.
fn prompt_pair(
    prompter: &impl Prompter,
    id_prompt: &str,
    hash_prompt: &str,
) -> Result<Option<ApiCredential>> {
    let api_id = prompter.input(id_prompt)?;
    let api_hash = prompter.input(hash_prompt)?;

    if api_id.is_empty() || api_hash.is_empty() {
        return Ok(None);
    }

    ApiCredential::parse(&api_id, &api_hash)
        .map(Some)
        .map_err(|_| Error::InvalidApiId { input: api_id })
}
