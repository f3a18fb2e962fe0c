//! Grep-style search over captured text lines

use regex::Regex;

use crate::error::Result;

/// Return the first line in `lines` that `pattern` matches anywhere
///
/// Lines are tested exactly as given. `None` means no line matched, which
/// is distinct from a matching empty line (`Some("")`).
pub fn find_line<'a, S: AsRef<str>>(pattern: &Regex, lines: &'a [S]) -> Option<&'a str> {
    find_line_index(pattern, lines).map(|i| lines[i].as_ref())
}

/// Position of the first line that `pattern` matches
pub fn find_line_index<S: AsRef<str>>(pattern: &Regex, lines: &[S]) -> Option<usize> {
    lines
        .iter()
        .position(|line| pattern.is_match(line.as_ref()))
}

/// Compile `pattern` and run [`find_line`]
pub fn find_line_str<'a, S: AsRef<str>>(pattern: &str, lines: &'a [S]) -> Result<Option<&'a str>> {
    let pattern = Regex::new(pattern)?;
    Ok(find_line(&pattern, lines))
}

/// Whether any line contains `needle` verbatim
pub fn any_line_contains<S: AsRef<str>>(needle: &str, lines: &[S]) -> bool {
    lines.iter().any(|line| line.as_ref().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_first_match() {
        let lines = ["alpha", "rev = 1", "rev = 2"];
        let re = Regex::new("^rev = ").unwrap();
        assert_eq!(find_line(&re, &lines), Some("rev = 1"));
        assert_eq!(find_line_index(&re, &lines), Some(1));
    }

    #[test]
    fn test_search_is_not_anchored() {
        let lines = vec!["[ebuild  U ] sys-apps/man-pages-6.0".to_string()];
        let re = Regex::new("man-pages").unwrap();
        assert!(find_line(&re, &lines).is_some());
    }

    #[test]
    fn test_not_found_is_distinct_from_empty_line() {
        let lines = ["", "x"];
        assert_eq!(find_line(&Regex::new("^$").unwrap(), &lines), Some(""));
        assert_eq!(find_line(&Regex::new("^y$").unwrap(), &lines), None);
    }

    #[test]
    fn test_lines_are_not_trimmed_before_matching() {
        let lines = ["  rev = 3"];
        let re = Regex::new("^rev = ").unwrap();
        assert_eq!(find_line(&re, &lines), None);
        assert_eq!(lines, ["  rev = 3"]);
    }

    #[test]
    fn test_empty_input() {
        let lines: Vec<String> = Vec::new();
        assert_eq!(find_line_str("anything", &lines).unwrap(), None);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let lines = ["a"];
        assert!(find_line_str("(", &lines).is_err());
    }

    #[test]
    fn test_any_line_contains_is_literal() {
        let lines = ["[blocks B     ] app-misc/foo"];
        assert!(any_line_contains("[blocks B", &lines));
        assert!(!any_line_contains("[blocks b", &lines));
    }
}
