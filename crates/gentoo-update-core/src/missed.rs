//! Second pass for upgrades `emerge -uDN world` leaves behind
//!
//! An empty-tree pretend listing shows every package of the world set;
//! entries flagged `U` are upgrades the regular pass did not pick up.

use std::io::Write;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::config::ExternalCommand;
use crate::error::Result;
use crate::patterns::MISSED_UPDATE_PATTERN;
use crate::runner::CommandRunner;

static MISSED_UPDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MISSED_UPDATE_PATTERN).expect("missed update regex is valid"));

/// Package atoms flagged as upgrades in an empty-tree listing
pub fn missed_updates<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            MISSED_UPDATE_RE
                .captures(line.as_ref().trim())
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

/// Commands used by the scan
pub struct MissedUpdateScan<'a> {
    pub listing: &'a ExternalCommand,
    pub update: &'a ExternalCommand,
}

impl MissedUpdateScan<'_> {
    /// List missed upgrades and emerge each one
    ///
    /// Failures of individual package updates are logged; only a listing
    /// that cannot be started is an error. Returns the number of atoms found.
    pub fn run(&self, runner: &mut dyn CommandRunner, out: &mut dyn Write) -> Result<usize> {
        write!(out, "\nChecking for any updates portage missed...")?;
        let captured = runner.capture(self.listing)?;
        writeln!(out, "done.\n")?;
        if !captured.status.is_success() {
            warn!("{} finished with {}", self.listing, captured.status);
        }

        let atoms = missed_updates(captured.output.lines());
        match atoms.len() {
            0 => {
                writeln!(out, "No missed packages found.")?;
                return Ok(0);
            }
            1 => writeln!(out, "Found the following missed update:")?,
            n => writeln!(out, "Found the following {} missed updates:", n)?,
        }
        for atom in &atoms {
            writeln!(out, "{}", atom)?;
        }

        writeln!(out, "\nUpdating the above packages.\n")?;
        for atom in &atoms {
            let command = self.update.with_arg(format!("={}", atom));
            info!("Updating missed package {}", atom);
            if let Err(e) = runner.run_checked(&command) {
                warn!("Missed update of {} failed: {}", atom, e);
            }
        }

        Ok(atoms.len())
    }
}
