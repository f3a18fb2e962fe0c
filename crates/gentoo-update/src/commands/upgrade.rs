//! System upgrade command

use std::io;

use anyhow::Result;
use gentoo_update_core::prompt::ConsolePrompter;
use gentoo_update_core::{Orchestrator, SystemRunner};
use tracing::debug;

use crate::output;

pub fn run() -> Result<()> {
    let config = super::prepare()?;
    let mut runner = SystemRunner::new();
    let mut prompter = ConsolePrompter;
    let mut out = io::stdout();
    let mut err = io::stderr();

    let mut orchestrator =
        Orchestrator::new(&config, &mut runner, &mut prompter, &mut out, &mut err);
    let outcome = orchestrator.run()?;
    debug!("Workflow finished: {:?}", outcome);

    let failed = orchestrator.step_failures();
    if !failed.is_empty() {
        let steps: Vec<&str> = failed.iter().map(|f| f.step).collect();
        output::warning(&format!(
            "Some post-update steps failed: {}",
            steps.join(", ")
        ));
    }
    Ok(())
}
