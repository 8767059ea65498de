use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::credentials::ApiCredential;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{} not found, a template was created in its place", .path.display())]
    NotFound { path: PathBuf },
    #[error("{} is empty", .path.display())]
    Empty { path: PathBuf },
    #[error("no valid API credentials found in {}", .path.display())]
    NoValidCredentials { path: PathBuf },
    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

const PHONE_TEMPLATE: &str = "+1234567890\n+9876543210\n";
const API_TEMPLATE: &str = "123456,abcdef1234567890abcdef1234567890\n\
                            789012,1234567890abcdef1234567890abcdef\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: usize,
    pub content: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("expected api_id and api_hash")]
    MissingField,
    #[error("api_id is not an integer")]
    InvalidApiId,
}

#[derive(Debug)]
pub struct LoadedCredentials {
    pub credentials: Vec<ApiCredential>,
    pub skipped: Vec<SkippedRow>,
}

/// Reads one phone number per non-blank line, in file order.
pub fn load_phones(path: &Path) -> Result<Vec<String>> {
    let Some(content) = read_or_create(path, PHONE_TEMPLATE)? else {
        return Err(Error::NotFound {
            path: path.to_owned(),
        });
    };

    let phones: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect();

    if phones.is_empty() {
        return Err(Error::Empty {
            path: path.to_owned(),
        });
    }

    tracing::debug!(path = %path.display(), count = phones.len(), "loaded phone numbers");
    Ok(phones)
}

/// Reads `api_id,api_hash` rows. Malformed rows are skipped and reported in
/// [`LoadedCredentials::skipped`] instead of failing the load.
pub fn load_api_credentials(path: &Path) -> Result<LoadedCredentials> {
    let Some(content) = read_or_create(path, API_TEMPLATE)? else {
        return Err(Error::NotFound {
            path: path.to_owned(),
        });
    };

    let mut credentials = vec![];
    let mut skipped = vec![];

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Ok(credential) => credentials.push(credential),
            Err(reason) => {
                tracing::warn!(line = index + 1, %reason, "skipping credential row");
                skipped.push(SkippedRow {
                    line: index + 1,
                    content: line.to_owned(),
                    reason,
                });
            }
        }
    }

    if credentials.is_empty() {
        return Err(Error::NoValidCredentials {
            path: path.to_owned(),
        });
    }

    tracing::debug!(
        path = %path.display(),
        count = credentials.len(),
        skipped = skipped.len(),
        "loaded api credentials"
    );
    Ok(LoadedCredentials {
        credentials,
        skipped,
    })
}

/// Writes whichever template files are missing. Returns the paths created.
pub fn write_templates(phone_file: &Path, api_file: &Path) -> Result<Vec<PathBuf>> {
    let mut created = vec![];
    for (path, template) in [(phone_file, PHONE_TEMPLATE), (api_file, API_TEMPLATE)] {
        if !path.exists() {
            write(path, template)?;
            created.push(path.to_owned());
        }
    }
    Ok(created)
}

fn parse_row(line: &str) -> Result<ApiCredential, SkipReason> {
    let mut fields = line.split(',').map(|field| field.trim().trim_matches('"').trim());

    let (Some(api_id), Some(api_hash)) = (fields.next(), fields.next()) else {
        return Err(SkipReason::MissingField);
    };
    if api_id.is_empty() || api_hash.is_empty() {
        return Err(SkipReason::MissingField);
    }

    ApiCredential::parse(api_id, api_hash).map_err(|_| SkipReason::InvalidApiId)
}

// `None` means the file was missing and the template has been written.
fn read_or_create(path: &Path, template: &str) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "file missing, writing template");
            write(path, template)?;
            Ok(None)
        }
        Err(source) => Err(Error::Io {
            path: path.to_owned(),
            source,
        }),
    }
}

fn write(path: &Path, content: &str) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, content).map_err(io_err)
}
