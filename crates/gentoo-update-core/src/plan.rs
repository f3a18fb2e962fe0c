//! Update plan parsing
//!
//! Turns the output of `emerge -uDpN world` into an [`UpdatePlan`]: how many
//! packages would change, whether Portage reports blockers, and whether the
//! man page index has to be rebuilt afterwards.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::matcher::{any_line_contains, find_line};
use crate::patterns::{BLOCKER_MARKER, MAN_PAGES_PACKAGE, NEWS_NOTICE_PATTERN, NOTHING_TO_MERGE};

/// Lines emerge prints before the first package in a pretend listing
pub const DEFAULT_HEADER_LINES: usize = 4;

static NEWS_NOTICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NEWS_NOTICE_PATTERN).expect("news notice regex is valid"));

static BLOCKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&regex::escape(BLOCKER_MARKER)).expect("blocker regex is valid")
});

/// Lines captured from a single external command run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    lines: Vec<String>,
}

impl RawOutput {
    /// Split captured text into trimmed lines
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(|line| line.trim().to_string()).collect(),
        }
    }

    /// Wrap already split lines, trimming each
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(|line| line.as_ref().trim().to_string())
                .collect(),
        }
    }

    /// Captured lines in output order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of captured lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// How a line after the header is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// A package emerge would merge
    Package,
    /// A package blocked by an installed one
    Blocker,
    /// Banner or spacing that does not stand for a package change
    Informational,
}

/// Classify one line of a pretend listing body
pub fn classify_line(line: &str) -> LineKind {
    if line.trim().is_empty() || line.contains(NOTHING_TO_MERGE) || NEWS_NOTICE_RE.is_match(line)
    {
        LineKind::Informational
    } else if line.contains(BLOCKER_MARKER) {
        LineKind::Blocker
    } else {
        LineKind::Package
    }
}

/// Decision derived from one pretend listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan<'a> {
    pending: usize,
    has_blockers: bool,
    needs_man_page_rebuild: bool,
    header_lines: usize,
    raw: &'a RawOutput,
}

impl<'a> UpdatePlan<'a> {
    /// Number of package changes emerge would make
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Whether emerge reported blocked packages
    pub fn has_blockers(&self) -> bool {
        self.has_blockers
    }

    /// Whether the man page package is part of the update
    pub fn needs_man_page_rebuild(&self) -> bool {
        self.needs_man_page_rebuild
    }

    /// Whether there is anything to apply
    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// The listing this plan was computed from
    pub fn raw(&self) -> &'a RawOutput {
        self.raw
    }

    /// Lines after the fixed header
    pub fn content_lines(&self) -> &'a [String] {
        &self.raw.lines()[self.header_lines..]
    }

    /// First blocker line, if any
    pub fn first_blocker(&self) -> Option<&'a str> {
        find_line(&BLOCKER_RE, self.content_lines())
    }
}

/// Parser for `emerge -uDpN world` output
#[derive(Debug, Clone, Copy)]
pub struct PlanParser {
    header_lines: usize,
}

impl Default for PlanParser {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_LINES)
    }
}

impl PlanParser {
    /// Create a parser that skips `header_lines` leading lines
    pub fn new(header_lines: usize) -> Self {
        Self { header_lines }
    }

    /// Number of header lines skipped
    pub fn header_lines(&self) -> usize {
        self.header_lines
    }

    /// Build the plan for a captured listing
    ///
    /// A listing shorter than the header is reported as [`Error::Parse`]
    /// with every captured line, never clamped to zero.
    pub fn parse<'a>(&self, raw: &'a RawOutput) -> Result<UpdatePlan<'a>> {
        if raw.len() < self.header_lines {
            return Err(Error::Parse {
                line_count: raw.len(),
                header_lines: self.header_lines,
                raw_lines: raw.lines().to_vec(),
            });
        }

        let content = &raw.lines()[self.header_lines..];
        let mut pending = 0;
        let mut has_blockers = false;
        for line in content {
            match classify_line(line) {
                LineKind::Informational => {}
                LineKind::Blocker => {
                    has_blockers = true;
                    pending += 1;
                }
                LineKind::Package => pending += 1,
            }
        }
        let needs_man_page_rebuild = any_line_contains(MAN_PAGES_PACKAGE, content);

        debug!(
            "Parsed plan: {} lines, {} pending, blockers={}, man-pages={}",
            raw.len(),
            pending,
            has_blockers,
            needs_man_page_rebuild
        );

        Ok(UpdatePlan {
            pending,
            has_blockers,
            needs_man_page_rebuild,
            header_lines: self.header_lines,
            raw,
        })
    }
}

/// Parse with the default four line header
pub fn parse_plan(raw: &RawOutput) -> Result<UpdatePlan<'_>> {
    PlanParser::default().parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [&str; 4] = [
        "",
        "These are the packages that would be merged, in order:",
        "",
        "Calculating dependencies... done!",
    ];

    fn listing(body: &[&str]) -> RawOutput {
        RawOutput::from_lines(HEADER.iter().chain(body.iter()))
    }

    #[test]
    fn test_header_only_means_nothing_pending() {
        let raw = listing(&[]);
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.pending_count(), 0);
        assert!(plan.is_empty());
        assert!(!plan.has_blockers());
        assert!(!plan.needs_man_page_rebuild());
    }

    #[test]
    fn test_counts_packages() {
        let raw = listing(&[
            "[ebuild     U  ] dev-lang/rust-1.80.0 [1.79.0]",
            "[ebuild     U  ] app-editors/vim-9.1 [9.0]",
        ]);
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.pending_count(), 2);
        assert_eq!(plan.content_lines().len(), 2);
    }

    #[test]
    fn test_blocker_detected() {
        let raw = listing(&[
            "[ebuild     U  ] dev-lang/rust-1.80.0 [1.79.0]",
            "[blocks B     ] app-misc/foo (\"app-misc/foo\" is blocking app-misc/bar-1.0)",
            "[ebuild  N     ] app-misc/bar-1.0",
        ]);
        let plan = parse_plan(&raw).unwrap();
        assert!(plan.has_blockers());
        assert!(plan.first_blocker().unwrap().starts_with("[blocks B"));
    }

    #[test]
    fn test_man_pages_trigger() {
        let raw = listing(&["[ebuild     U  ] sys-apps/man-pages-6.9 [6.8]"]);
        assert!(parse_plan(&raw).unwrap().needs_man_page_rebuild());

        let raw = listing(&["[ebuild     U  ] sys-apps/coreutils-9.5 [9.4]"]);
        assert!(!parse_plan(&raw).unwrap().needs_man_page_rebuild());
    }

    #[test]
    fn test_man_pages_in_header_is_ignored() {
        let raw = RawOutput::from_lines([
            "sys-apps/man-pages",
            "These are the packages that would be merged, in order:",
            "",
            "Calculating dependencies... done!",
        ]);
        assert!(!parse_plan(&raw).unwrap().needs_man_page_rebuild());
    }

    #[test]
    fn test_nothing_to_merge_is_not_an_update() {
        let raw = listing(&["[nothing to merge]"]);
        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.pending_count(), 0);
    }

    #[test]
    fn test_news_banner_is_not_an_update() {
        let raw = listing(&[
            "",
            "* IMPORTANT: 2 news items need reading for repository 'gentoo'.",
            "* Use eselect news read to view new items.",
            "",
        ]);
        assert_eq!(parse_plan(&raw).unwrap().pending_count(), 0);

        let raw = listing(&[
            "[ebuild     U  ] dev-lang/rust-1.80.0 [1.79.0]",
            "* Use eselect news to read news items.",
        ]);
        assert_eq!(parse_plan(&raw).unwrap().pending_count(), 1);
    }

    #[test]
    fn test_short_listing_is_a_parse_error() {
        let raw = RawOutput::from_lines(["", "Calculating dependencies... done!"]);
        match parse_plan(&raw) {
            Err(Error::Parse {
                line_count,
                header_lines,
                raw_lines,
            }) => {
                assert_eq!(line_count, 2);
                assert_eq!(header_lines, 4);
                assert_eq!(raw_lines, raw.lines().to_vec());
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_header_size() {
        let raw = RawOutput::from_lines(["header", "[ebuild  N     ] app-misc/bar-1.0"]);
        let plan = PlanParser::new(1).parse(&raw).unwrap();
        assert_eq!(plan.pending_count(), 1);
    }

    #[test]
    fn test_raw_output_trims_lines() {
        let raw = RawOutput::from_text("  a  \r\nb\n");
        assert_eq!(raw.lines(), ["a".to_string(), "b".to_string()]);
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line(""), LineKind::Informational);
        assert_eq!(classify_line("[nothing to merge]"), LineKind::Informational);
        assert_eq!(classify_line("[blocks B     ] x"), LineKind::Blocker);
        assert_eq!(classify_line("[ebuild   R   ] x"), LineKind::Package);
    }
}
