use std::{path::Path, process::ExitCode};

use anyhow::Result;

use crate::{report, store};

pub fn process(phone_file: &Path, api_file: &Path) -> Result<ExitCode> {
    let created = store::write_templates(phone_file, api_file)?;
    tracing::info!(?created, "templates written");

    if created.is_empty() {
        report::info("Nothing to do, both files already exist");
    }
    for path in created {
        report::success(&format!("Created {}", path.display()));
    }

    Ok(ExitCode::SUCCESS)
}
