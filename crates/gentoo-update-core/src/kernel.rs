//! Kernel source selection for genkernel rebuilds
//!
//! Reads `eselect kernel list`, switches the `/usr/src/linux` symlink to the
//! newest installed source tree and builds it.

use std::io::Write;
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::config::KernelSettings;
use crate::error::{Error, Result};
use crate::patterns::KERNEL_ENTRY_PATTERN;
use crate::runner::CommandRunner;

static KERNEL_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(KERNEL_ENTRY_PATTERN).expect("kernel entry regex is valid"));

/// One installed kernel source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelEntry {
    /// Number accepted by `eselect kernel set`
    pub index: u32,
    pub name: String,
    /// Whether the symlink points at this tree
    pub current: bool,
}

/// Parsed `eselect kernel list` output, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelList {
    entries: Vec<KernelEntry>,
}

impl KernelList {
    /// Parse listing lines; lines that are not entries are skipped
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        let entries = lines
            .iter()
            .filter_map(|line| {
                let caps = KERNEL_ENTRY_RE.captures(line.as_ref())?;
                Some(KernelEntry {
                    index: caps[1].parse().ok()?,
                    name: caps[2].to_string(),
                    current: caps.get(3).is_some(),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[KernelEntry] {
        &self.entries
    }

    /// Entry the symlink points at
    pub fn current(&self) -> Option<&KernelEntry> {
        self.entries.iter().find(|e| e.current)
    }

    /// Last listed entry, which eselect sorts newest
    pub fn newest(&self) -> Option<&KernelEntry> {
        self.entries.last()
    }
}

/// Result of a kernel upgrade attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelOutcome {
    /// The newest source tree is already selected
    UpToDate(String),
    /// A newer tree was selected and built
    Rebuilt { from: String, to: String },
}

/// Select the newest kernel source and build it
pub fn upgrade_kernel(
    settings: &KernelSettings,
    runner: &mut dyn CommandRunner,
    out: &mut dyn Write,
) -> Result<KernelOutcome> {
    write!(out, "Finding our kernels...")?;
    let captured = runner.capture(&settings.list)?;
    if !captured.status.is_success() {
        return Err(Error::command_failed(
            settings.list.to_string(),
            captured.status.to_string(),
        ));
    }
    writeln!(out, "done.")?;

    write!(out, "Finding our current kernel...")?;
    let list = KernelList::parse(captured.output.lines());
    let current = list
        .current()
        .ok_or_else(|| Error::precondition("Unable to find current kernel."))?
        .clone();
    writeln!(out, "done.")?;

    let newest = list
        .newest()
        .ok_or_else(|| Error::precondition("Unable to find current kernel."))?
        .clone();
    if newest == current {
        writeln!(out, "No newer kernels available.")?;
        return Ok(KernelOutcome::UpToDate(current.name));
    }

    info!("Switching kernel from {} to {}", current.name, newest.name);
    runner.run_checked(&settings.set.with_arg(newest.index.to_string()))?;
    runner.run_checked(&settings.build)?;

    Ok(KernelOutcome::Rebuilt {
        from: current.name,
        to: newest.name,
    })
}
