//! The upgrade workflow
//!
//! Drives Portage through sync, pretend listing, plan parsing,
//! confirmation, the real update and the post-update steps:
//!
//! ```text
//! Idle -> Syncing -> Listing -> PlanReady -> Blocked | Confirming
//!      -> Applying -> PostSteps -> Done
//! ```
//!
//! `Blocked` and any failing step end in `Failed`. Sync failures and
//! post-step failures are logged and the workflow carries on.

use std::fmt;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::{AppConfig, ExternalCommand};
use crate::distfiles::wipe_distfiles;
use crate::error::{Error, Result};
use crate::missed::MissedUpdateScan;
use crate::plan::{PlanParser, RawOutput, UpdatePlan};
use crate::prompt::{Answer, Prompter};
use crate::runner::CommandRunner;

/// Confirmation question
pub const CONFIRM_PROMPT: &str = "Would you like to update Gentoo? (yes/no)";

/// Workflow states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Syncing,
    Listing,
    PlanReady,
    Blocked,
    Confirming,
    Applying,
    PostSteps,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Listing => "listing",
            Self::PlanReady => "plan-ready",
            Self::Blocked => "blocked",
            Self::Confirming => "confirming",
            Self::Applying => "applying",
            Self::PostSteps => "post-steps",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// The pretend listing had nothing to merge
    UpToDate,
    /// The user answered no
    Aborted,
    /// Updates were applied
    Upgraded { packages: usize },
}

/// Post-update step that failed without stopping the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: &'static str,
    pub message: String,
}

/// Runs one pass of the upgrade workflow
pub struct Orchestrator<'a> {
    config: &'a AppConfig,
    runner: &'a mut dyn CommandRunner,
    prompter: &'a mut dyn Prompter,
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
    phase: Phase,
    history: Vec<Phase>,
    step_failures: Vec<StepFailure>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a AppConfig,
        runner: &'a mut dyn CommandRunner,
        prompter: &'a mut dyn Prompter,
        out: &'a mut dyn Write,
        err: &'a mut dyn Write,
    ) -> Self {
        Self {
            config,
            runner,
            prompter,
            out,
            err,
            phase: Phase::Idle,
            history: vec![Phase::Idle],
            step_failures: Vec::new(),
        }
    }

    /// Current state
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// Post-update steps that failed
    pub fn step_failures(&self) -> &[StepFailure] {
        &self.step_failures
    }

    /// Run the workflow to completion
    ///
    /// Any error leaves the orchestrator in [`Phase::Failed`].
    pub fn run(&mut self) -> Result<WorkflowOutcome> {
        let result = self.drive();
        if result.is_err() {
            self.enter(Phase::Failed);
        }
        result
    }

    fn drive(&mut self) -> Result<WorkflowOutcome> {
        self.sync()?;

        self.enter(Phase::Listing);
        let raw = self.capture_listing()?;

        let parser = PlanParser::new(self.config.settings().portage.header_lines);
        let plan = parser.parse(&raw)?;
        self.enter(Phase::PlanReady);

        if plan.has_blockers() {
            self.enter(Phase::Blocked);
            if let Some(line) = plan.first_blocker() {
                warn!("Portage reports a blocker: {}", line);
            }
            return Err(Error::Blocked {
                raw_lines: plan.raw().lines().to_vec(),
            });
        }

        if plan.is_empty() {
            writeln!(self.out, "\n\nNo updates found.")?;
            self.scan_missed_updates();
            self.enter(Phase::Done);
            return Ok(WorkflowOutcome::UpToDate);
        }

        self.announce(&plan)?;
        self.enter(Phase::Confirming);
        if !self.confirm()? {
            writeln!(self.out, "Portage update has been aborted.")?;
            self.enter(Phase::Done);
            return Ok(WorkflowOutcome::Aborted);
        }

        self.enter(Phase::Applying);
        writeln!(self.out, "Updating packages in portage")?;
        let apply = self.config.settings().commands.apply.clone();
        self.runner.run_checked(&apply)?;

        self.enter(Phase::PostSteps);
        self.post_steps(&plan)?;

        writeln!(
            self.out,
            "\nAll finished! Your Gentoo installation has been successfully updated."
        )?;
        self.enter(Phase::Done);
        Ok(WorkflowOutcome::Upgraded {
            packages: plan.pending_count(),
        })
    }

    fn enter(&mut self, phase: Phase) {
        debug!("Workflow {} -> {}", self.phase, phase);
        self.phase = phase;
        self.history.push(phase);
    }

    /// Refresh the tree; stale metadata still allows a listing
    fn sync(&mut self) -> Result<()> {
        self.enter(Phase::Syncing);
        writeln!(self.out, "Beginning rsync of portage.\n")?;
        let sync = self.config.settings().commands.sync.clone();
        match self.runner.run(&sync) {
            Ok(status) if status.is_success() => {}
            Ok(status) => {
                warn!("{} finished with {}", sync, status);
                writeln!(self.err, "WARNING: '{}' failed with {}, continuing.", sync, status)?;
            }
            Err(e) => {
                warn!("{} could not be run: {}", sync, e);
                writeln!(self.err, "WARNING: '{}' could not be run: {}, continuing.", sync, e)?;
            }
        }
        writeln!(self.out, "\nPortage updated, checking for package updates.")?;
        Ok(())
    }

    fn capture_listing(&mut self) -> Result<RawOutput> {
        let pretend = self.config.settings().commands.pretend.clone();
        let captured = self.runner.capture(&pretend)?;
        if !captured.status.is_success() {
            warn!("{} finished with {}", pretend, captured.status);
        }
        Ok(captured.output)
    }

    /// Show the count and let emerge print the colored plan
    fn announce(&mut self, plan: &UpdatePlan<'_>) -> Result<()> {
        match plan.pending_count() {
            1 => writeln!(self.out, "\n\n1 package update found!")?,
            n => writeln!(self.out, "\n\n{} package updates found!", n)?,
        }
        let pretend = self.config.settings().commands.pretend.clone();
        if let Err(e) = self.runner.run(&pretend) {
            warn!("Could not display the update plan: {}", e);
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Ask until the answer is yes or no
    fn confirm(&mut self) -> Result<bool> {
        loop {
            let input = self.prompter.ask(CONFIRM_PROMPT)?;
            match Answer::parse(&input) {
                Some(Answer::Yes) => return Ok(true),
                Some(Answer::No) => return Ok(false),
                None => {
                    writeln!(
                        self.out,
                        "Input '{}' not understood. Try again.\n",
                        input.trim().to_lowercase()
                    )?;
                }
            }
        }
    }

    fn post_steps(&mut self, plan: &UpdatePlan<'_>) -> Result<()> {
        let config = self.config;
        let settings = config.settings();

        self.scan_missed_updates();

        writeln!(
            self.out,
            "\nChecking Gentoo for package dependency errors.\n"
        )?;
        self.best_effort_command("dependency-rebuild", &settings.commands.dependency_rebuild);

        write!(self.out, "\nRemoving distfiles from system...")?;
        let distfiles = settings.portage.distfiles_dir.clone();
        match wipe_distfiles(Path::new(distfiles.as_str())) {
            Ok(count) => {
                info!("Removed {} distfiles", count);
                writeln!(self.out, "done!\n")?;
            }
            Err(e) => {
                writeln!(self.out)?;
                self.record_failure("distfile-cleanup", e.to_string());
            }
        }

        writeln!(
            self.out,
            "Invoking {} to check for configuration updates.\n",
            settings.commands.config_merge.program()
        )?;
        self.best_effort_command("config-merge", &settings.commands.config_merge);

        if plan.needs_man_page_rebuild() {
            write!(
                self.out,
                "Running {} for updated man pages...",
                settings.commands.man_index
            )?;
            self.best_effort_command("man-index", &settings.commands.man_index);
            writeln!(self.out, "done!")?;
        }

        Ok(())
    }

    fn scan_missed_updates(&mut self) {
        let config = self.config;
        let settings = config.settings();
        if !settings.portage.scan_missed_updates {
            return;
        }
        let scan = MissedUpdateScan {
            listing: &settings.commands.empty_tree_pretend,
            update: &settings.commands.missed_update,
        };
        if let Err(e) = scan.run(&mut *self.runner, &mut *self.out) {
            self.record_failure("missed-updates", e.to_string());
        }
    }

    fn best_effort_command(&mut self, step: &'static str, command: &ExternalCommand) {
        if let Err(e) = self.runner.run_checked(command) {
            self.record_failure(step, e.to_string());
        }
    }

    fn record_failure(&mut self, step: &'static str, message: String) {
        warn!("Post-update step {} failed: {}", step, message);
        if let Err(e) = writeln!(self.err, "WARNING: {} failed: {}", step, message) {
            warn!("Could not report the {} failure on stderr: {}", step, e);
        }
        self.step_failures.push(StepFailure { step, message });
    }
}
