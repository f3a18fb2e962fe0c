//! Program identity and the release stamp embedded in the binary
//!
//! The stamp is a block of plain text lines compiled into every build. A
//! downloaded candidate is only trusted when the same block can be found in
//! its bytes, and the revision reported by `-v` is read back from it.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::{Error, Result};
use crate::matcher::find_line;
use crate::patterns::VERSION_PATTERN;

macro_rules! revision_literal {
    () => {
        "4.44"
    };
}

macro_rules! integrity_literal {
    () => {
        "# gentoo-update: portage upgrade orchestrator"
    };
}

/// Human readable program name
pub const DISPLAY_NAME: &str = "GentooUpdate";

/// Text block embedded in the binary, one marker per line
#[used]
pub static RELEASE_STAMP: &str = concat!(
    "\n",
    integrity_literal!(),
    "\nrev = ",
    revision_literal!(),
    "\n"
);

/// A numeric program revision, compared as a real number
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Revision(f64);

impl Revision {
    /// Create a revision from a finite number
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    /// Raw numeric value
    pub fn value(self) -> f64 {
        self.0
    }

    /// Extract the revision from a `rev = <number>` line
    pub fn from_marker_line(line: &str) -> Result<Self> {
        let (_, value) = line
            .split_once('=')
            .ok_or_else(|| Error::config(format!("revision line has no '=': {line}")))?;
        value.parse()
    }
}

impl FromStr for Revision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Revision::new)
            .ok_or_else(|| Error::config(format!("invalid revision number: '{trimmed}'")))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name and revision of the running program
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramIdentity {
    /// Invocation name, used in usage text and temp file prefixes
    pub name: String,

    /// Display name printed by `-v`
    pub display_name: &'static str,

    /// Revision read from [`RELEASE_STAMP`]
    pub revision: Revision,
}

impl ProgramIdentity {
    /// Identity of the running build
    pub fn current(name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            display_name: DISPLAY_NAME,
            revision: stamped_revision()?,
        })
    }

    /// Format as `-v` output
    pub fn version_line(&self) -> String {
        format!("{} v{}", self.display_name, self.revision)
    }
}

/// Revision recorded in this build's release stamp
pub fn stamped_revision() -> Result<Revision> {
    let pattern = Regex::new(VERSION_PATTERN)?;
    let lines: Vec<&str> = RELEASE_STAMP.lines().collect();
    let line = find_line(&pattern, &lines)
        .ok_or_else(|| Error::config("release stamp carries no revision line"))?;
    Revision::from_marker_line(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{INTEGRITY_LINE, INTEGRITY_PATTERN};

    #[test]
    fn test_stamp_carries_integrity_line() {
        let pattern = Regex::new(INTEGRITY_PATTERN).unwrap();
        let lines: Vec<&str> = RELEASE_STAMP.lines().collect();
        assert_eq!(find_line(&pattern, &lines), Some(INTEGRITY_LINE));
        assert_eq!(integrity_literal!(), INTEGRITY_LINE);
    }

    #[test]
    fn test_stamped_revision_parses() {
        let rev = stamped_revision().unwrap();
        assert_eq!(rev, "4.44".parse().unwrap());
    }

    #[test]
    fn test_revision_ordering_is_numeric() {
        let a: Revision = "4.5".parse().unwrap();
        let b: Revision = "4.43".parse().unwrap();
        assert!(a > b);
        assert!(a >= Revision::new(4.5).unwrap());
    }

    #[test]
    fn test_revision_from_marker_line() {
        let rev = Revision::from_marker_line("rev = 5.01  ").unwrap();
        assert_eq!(rev.value(), 5.01);
        assert!(Revision::from_marker_line("rev = five").is_err());
        assert!(Revision::from_marker_line("rev 5").is_err());
        assert!("nan".parse::<Revision>().is_err());
    }

    #[test]
    fn test_version_line() {
        let identity = ProgramIdentity::current("gentoo-update").unwrap();
        assert_eq!(identity.version_line(), "GentooUpdate v4.44");
    }
}
