//! Version command

use anyhow::Result;
use gentoo_update_core::ProgramIdentity;

pub fn run(prog: &str) -> Result<()> {
    let identity = ProgramIdentity::current(prog)?;
    println!("{}", identity.version_line());
    Ok(())
}
