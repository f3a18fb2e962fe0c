//! Literal patterns used to classify external command output
//!
//! Every piece of text that gentoo-update reacts to lives here, so the
//! contract with Portage and with published releases can be read in one place.

/// Whole-line integrity marker carried by every genuine release
pub const INTEGRITY_LINE: &str = "# gentoo-update: portage upgrade orchestrator";

/// Regex locating [`INTEGRITY_LINE`] in a downloaded candidate
pub const INTEGRITY_PATTERN: &str = r"^# gentoo-update: portage upgrade orchestrator$";

/// Regex locating the revision line (`rev = <number>`) in a candidate
pub const VERSION_PATTERN: &str = r"^rev = ";

/// Emerge marks a package blocked by an installed one with this prefix
pub const BLOCKER_MARKER: &str = "[blocks B";

/// Installing or upgrading this package invalidates the man page index
pub const MAN_PAGES_PACKAGE: &str = "sys-apps/man-pages";

/// Emerge prints this when the dependency graph is empty
pub const NOTHING_TO_MERGE: &str = "[nothing to merge]";

/// Regex matching the unread news banner emerge appends to its listing
pub const NEWS_NOTICE_PATTERN: &str = r"(?i)news items? need reading|eselect news";

/// Regex matching an upgrade in an `emerge -ep` listing, capturing the atom
pub const MISSED_UPDATE_PATTERN: &str = r"^\[ebuild[^\]]*\bU\b[^\]]*\]\s+(\S+)";

/// Regex matching one `eselect kernel list` entry
pub const KERNEL_ENTRY_PATTERN: &str = r"^\s*\[(\d+)\]\s+(\S+)(\s+\*)?\s*$";
