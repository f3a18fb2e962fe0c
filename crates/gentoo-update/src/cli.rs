//! CLI argument parsing with clap
//!
//! The program takes at most one option. Anything clap rejects is reported
//! as an unrecognized option together with the usage text.

use clap::Parser;

/// Scripted Portage upgrade
#[derive(Parser, Debug)]
#[command(name = "gentoo-update")]
#[command(disable_version_flag = true, disable_help_flag = true)]
pub struct Cli {
    /// Print out the version
    #[arg(short = 'v', conflicts_with_all = ["update", "help"])]
    pub version: bool,

    /// Update to the newest version
    #[arg(short = 'u', conflicts_with = "help")]
    pub update: bool,

    /// Print this usage text
    #[arg(short = 'h', long = "help")]
    pub help: bool,
}

/// What one invocation asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Sync, confirm and apply updates
    Upgrade,
    /// Print the version line
    Version,
    /// Replace this program with the newest release
    SelfUpdate,
    /// Print the usage text
    Usage,
}

/// Why the arguments were rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    /// More than one argument
    TooMany,
    /// An argument that is not a known option
    Unrecognized(String),
}

/// Classify the arguments following the program name
pub fn parse_args(prog: &str, args: &[String]) -> Result<Action, ArgError> {
    if args.len() > 1 {
        return Err(ArgError::TooMany);
    }

    let argv = std::iter::once(prog).chain(args.iter().map(String::as_str));
    let cli = Cli::try_parse_from(argv)
        .map_err(|_| ArgError::Unrecognized(args.first().cloned().unwrap_or_default()))?;

    Ok(if cli.help {
        Action::Usage
    } else if cli.version {
        Action::Version
    } else if cli.update {
        Action::SelfUpdate
    } else {
        Action::Upgrade
    })
}

/// Usage text for `prog`
pub fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [option]\n\
         If run without an option, it updates the system.\n\n\
         Available Options:\n\
         -v    Prints out the version\n\
         -u    Updates to the newest version\n\
         -h    Prints this help\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Action, ArgError> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_args("gentoo-update", &args)
    }

    #[test]
    fn test_known_options() {
        assert_eq!(parse(&[]), Ok(Action::Upgrade));
        assert_eq!(parse(&["-v"]), Ok(Action::Version));
        assert_eq!(parse(&["-u"]), Ok(Action::SelfUpdate));
        assert_eq!(parse(&["-h"]), Ok(Action::Usage));
        assert_eq!(parse(&["--help"]), Ok(Action::Usage));
    }

    #[test]
    fn test_unknown_tokens() {
        for token in ["-x", "--version", "world", "-vu", ""] {
            assert_eq!(
                parse(&[token]),
                Err(ArgError::Unrecognized(token.to_string())),
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_more_than_one_argument() {
        assert_eq!(parse(&["-v", "-u"]), Err(ArgError::TooMany));
        assert_eq!(parse(&["-v", "-v", "-v"]), Err(ArgError::TooMany));
    }

    #[test]
    fn test_usage_names_program() {
        let text = usage("gu");
        assert!(text.starts_with("Usage: gu [option]\n"));
        assert!(text.contains("-u    Updates to the newest version"));
    }
}
