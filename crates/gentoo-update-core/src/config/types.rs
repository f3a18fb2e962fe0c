//! Configuration types
//!
//! Every key is required in the merged document; the embedded defaults
//! provide all of them.

use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Complete gentoo-update settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Portage tree locations and listing format
    pub portage: PortageSettings,

    /// External commands driven by the workflow
    pub commands: CommandSettings,

    /// Self-update source
    pub self_update: SelfUpdateSettings,

    /// Kernel helper commands
    pub kernel: KernelSettings,
}

/// Portage tree locations and listing format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortageSettings {
    /// Directories whose presence identifies a Gentoo host (any one suffices)
    pub marker_dirs: Vec<Utf8PathBuf>,

    /// Distfile cache emptied after an upgrade
    pub distfiles_dir: Utf8PathBuf,

    /// Lines emerge prints before the package list
    pub header_lines: usize,

    /// Run the empty-tree pass for upgrades the first pass missed
    pub scan_missed_updates: bool,
}

/// External commands driven by the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSettings {
    pub sync: ExternalCommand,
    pub pretend: ExternalCommand,
    pub apply: ExternalCommand,
    pub empty_tree_pretend: ExternalCommand,
    /// Invoked once per missed package with `=<atom>` appended
    pub missed_update: ExternalCommand,
    pub dependency_rebuild: ExternalCommand,
    pub config_merge: ExternalCommand,
    pub man_index: ExternalCommand,
}

/// Self-update source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelfUpdateSettings {
    /// Location of the newest release
    pub url: String,

    /// Download timeout in seconds
    pub timeout_secs: u64,

    /// `User-Agent` header sent with the download
    pub user_agent: String,

    /// Scratch directory for the download (process temp dir when unset)
    pub temp_dir: Option<Utf8PathBuf>,
}

/// Kernel helper commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KernelSettings {
    pub list: ExternalCommand,
    /// Invoked with the entry number appended
    pub set: ExternalCommand,
    pub build: ExternalCommand,
}

/// A program and its arguments, written as a YAML list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Create a command from a program and its arguments
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Program name or path
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Copy of this command with one more trailing argument
    pub fn with_arg(&self, arg: impl Into<String>) -> Self {
        let mut command = self.clone();
        command.args.push(arg.into());
        command
    }
}

impl TryFrom<Vec<String>> for ExternalCommand {
    type Error = String;

    fn try_from(mut value: Vec<String>) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err("command must name a program".to_string());
        }
        let program = value.remove(0);
        Ok(Self {
            program,
            args: value,
        })
    }
}

impl From<ExternalCommand> for Vec<String> {
    fn from(command: ExternalCommand) -> Self {
        std::iter::once(command.program)
            .chain(command.args)
            .collect()
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        let cmd = ExternalCommand::new("emerge", ["-uDpN", "world"]);
        assert_eq!(cmd.to_string(), "emerge -uDpN world");
    }

    #[test]
    fn test_with_arg_leaves_original_untouched() {
        let cmd = ExternalCommand::new("emerge", ["-u"]);
        let extended = cmd.with_arg("=dev-lang/rust-1.80.0");
        assert_eq!(extended.args(), ["-u", "=dev-lang/rust-1.80.0"]);
        assert_eq!(cmd.args(), ["-u"]);
    }

    #[test]
    fn test_command_from_yaml_list() {
        let cmd: ExternalCommand = serde_yaml_ng::from_str("[makewhatis, -u]").unwrap();
        assert_eq!(cmd.program(), "makewhatis");
        assert_eq!(cmd.args(), ["-u"]);
    }

    #[test]
    fn test_empty_command_rejected() {
        let result: Result<ExternalCommand, _> = serde_yaml_ng::from_str("[]");
        assert!(result.is_err());
    }
}
