//! gentoo-update - scripted Portage upgrades
//!
//! Without an option the system is synced, the pending updates are listed
//! and, once confirmed, applied. `-u` replaces this program with the newest
//! release and `-v` prints its version.

use std::process::ExitCode;

use gentoo_update::cli::{self, Action, ArgError};
use gentoo_update::{commands, finish, init_tracing, program_name, run_interruptible};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let mut argv = std::env::args_os();
    let prog = program_name(argv.next());
    let args: Vec<String> = argv.map(|a| a.to_string_lossy().into_owned()).collect();

    let action = match cli::parse_args(&prog, &args) {
        Ok(action) => action,
        Err(ArgError::TooMany) => {
            print!("{}", cli::usage(&prog));
            return ExitCode::FAILURE;
        }
        Err(ArgError::Unrecognized(token)) => {
            eprintln!("{}: unrecognized option '{}'", prog, token);
            eprint!("{}", cli::usage(&prog));
            return ExitCode::FAILURE;
        }
    };

    match action {
        Action::Usage => {
            print!("{}", cli::usage(&prog));
            ExitCode::SUCCESS
        }
        Action::Version => finish(commands::version::run(&prog)),
        Action::SelfUpdate => commands::self_update::run().await,
        Action::Upgrade => run_interruptible(commands::upgrade::run).await,
    }
}
