//! Startup requirements: root privileges and a Gentoo host

use std::path::Path;

use camino::Utf8PathBuf;
use nix::unistd::{access, AccessFlags, Uid};
use tracing::debug;

use crate::error::{Error, Result};

/// Require an effective uid of 0
pub fn ensure_root() -> Result<()> {
    ensure_root_uid(Uid::effective())
}

fn ensure_root_uid(uid: Uid) -> Result<()> {
    if uid.is_root() {
        Ok(())
    } else {
        Err(Error::precondition(
            "This program must be run as root. Exiting.",
        ))
    }
}

/// Require one of the Portage marker directories to exist
pub fn ensure_portage_host(marker_dirs: &[Utf8PathBuf]) -> Result<()> {
    match marker_dirs.iter().find(|dir| dir.is_dir()) {
        Some(dir) => {
            debug!("Found Portage tree marker at {}", dir);
            Ok(())
        }
        None => Err(Error::precondition(
            "This program is being run on a non-Gentoo system. Exiting.",
        )),
    }
}

/// Require write access to `path` and to the directory holding it
///
/// Replacing a file by rename needs both.
pub fn ensure_replaceable(path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if !path.is_file()
        || access(path, AccessFlags::W_OK).is_err()
        || access(parent, AccessFlags::W_OK).is_err()
    {
        return Err(Error::permission(path));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_non_root_uid_rejected() {
        let err = ensure_root_uid(Uid::from_raw(1000)).unwrap_err();
        assert!(err.to_string().contains("must be run as root"));
        assert!(ensure_root_uid(Uid::from_raw(0)).is_ok());
    }

    #[test]
    fn test_portage_marker_any_of() {
        let temp = TempDir::new().unwrap();
        let present = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let missing = present.join("missing");

        assert!(ensure_portage_host(&[missing.clone(), present]).is_ok());
        let err = ensure_portage_host(&[missing]).unwrap_err();
        assert!(err.to_string().contains("non-Gentoo"));
        assert!(ensure_portage_host(&[]).is_err());
    }

    #[test]
    fn test_replaceable_requires_existing_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("prog");
        assert!(matches!(
            ensure_replaceable(&file),
            Err(Error::Permission { .. })
        ));

        std::fs::write(&file, b"x").unwrap();
        assert!(ensure_replaceable(&file).is_ok());
        assert!(ensure_replaceable(temp.path()).is_err());
    }
}
