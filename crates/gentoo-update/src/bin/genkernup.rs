//! genkernup - rebuild the kernel after a kernel source upgrade
//!
//! Points `/usr/src/linux` at the newest installed source tree and builds
//! it with genkernel.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use gentoo_update::{commands, init_tracing, output, run_interruptible};
use gentoo_update_core::kernel::{upgrade_kernel, KernelOutcome};
use gentoo_update_core::SystemRunner;
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    run_interruptible(rebuild).await
}

fn rebuild() -> Result<()> {
    let config = commands::prepare()?;
    let mut runner = SystemRunner::new();
    let mut out = io::stdout();

    match upgrade_kernel(&config.settings().kernel, &mut runner, &mut out)? {
        KernelOutcome::UpToDate(name) => debug!("Kernel {} is the newest installed", name),
        KernelOutcome::Rebuilt { from, to } => {
            output::success(&format!("Built and installed {} (was {}).", to, from))
        }
    }
    Ok(())
}
