//! Self-update command

use std::process::ExitCode;

use anyhow::{Context, Result};
use gentoo_update_self::{SelfUpdater, UpdateResult};

use crate::{finish, output, run_interruptible_with};

/// Replace the running program, restoring it when interrupted mid-update
pub async fn run() -> ExitCode {
    let (updater, name) = match prepare() {
        Ok(prepared) => prepared,
        Err(e) => return finish(Err(e)),
    };
    let recovery = updater.interrupt_recovery();

    run_interruptible_with(
        move || update(&updater, &name),
        move || match recovery.restore() {
            Ok(true) => output::warning("Update interrupted, previous version restored."),
            Ok(false) => {}
            Err(e) => output::error(&format!("Could not restore the previous version: {}", e)),
        },
    )
    .await
}

fn prepare() -> Result<(SelfUpdater, String)> {
    let config = super::prepare()?;
    let updater = SelfUpdater::new(&config).context("Failed to prepare the update")?;
    Ok((updater, config.identity().name.clone()))
}

fn update(updater: &SelfUpdater, name: &str) -> Result<()> {
    match updater.run()? {
        UpdateResult::AlreadyUpToDate { current, available } => {
            output::success(&format!(
                "{} is already up-to-date (running v{}, published v{}).",
                name, current, available
            ));
        }
        UpdateResult::Updated { from, to } => {
            output::success(&format!(
                "You have upgraded {} from version {} to {}.",
                name, from, to
            ));
        }
    }
    Ok(())
}
