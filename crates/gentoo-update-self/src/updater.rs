//! In-place replacement of the running program
//!
//! The running file is renamed to `<path>.old` before anything is
//! downloaded. From then on every rejected candidate renames the backup
//! back, except a candidate that carries the integrity line but no usable
//! revision: both files are then left where they are and reported.
//!
//! An update cut short by Ctrl-C is undone through [`InterruptRecovery`],
//! which the signal handler can run while the download is still blocked.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use gentoo_update_core::matcher::find_line;
use gentoo_update_core::patterns::{INTEGRITY_PATTERN, VERSION_PATTERN};
use gentoo_update_core::preflight::ensure_replaceable;
use gentoo_update_core::{AppConfig, Error, ProgramIdentity, Result, Revision};
use regex::Regex;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::download::{HttpFetcher, PayloadFetcher};

/// Backup file suffix
const BACKUP_SUFFIX: &str = ".old";

/// Patterns a candidate must match
#[derive(Debug, Clone)]
pub struct MarkerPatterns {
    /// Line proving the payload is a gentoo-update release
    pub integrity: Regex,

    /// `rev = <number>` line
    pub version: Regex,
}

impl MarkerPatterns {
    /// Patterns matching the release stamp of this program
    pub fn standard() -> Result<Self> {
        Ok(Self {
            integrity: Regex::new(INTEGRITY_PATTERN)?,
            version: Regex::new(VERSION_PATTERN)?,
        })
    }
}

/// Result of an update operation
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateResult {
    /// The published revision is not newer than the running one
    AlreadyUpToDate {
        current: Revision,
        available: Revision,
    },

    /// The program file now holds the published revision
    Updated { from: Revision, to: Revision },
}

/// Self-update manager
pub struct SelfUpdater {
    /// Revision of the running program
    current: Revision,

    /// Program name, used as the scratch file prefix
    program_name: String,

    /// File being replaced
    binary_path: PathBuf,

    /// Directory for the scratch file
    temp_dir: PathBuf,

    /// Release location
    url: String,

    patterns: MarkerPatterns,

    fetcher: Box<dyn PayloadFetcher + Send>,

    /// Scratch file of the update in progress
    scratch: Arc<Mutex<Option<PathBuf>>>,
}

/// Undoes an update interrupted from another thread
#[derive(Debug, Clone)]
pub struct InterruptRecovery {
    binary_path: PathBuf,
    backup_path: PathBuf,
    scratch: Arc<Mutex<Option<PathBuf>>>,
}

impl InterruptRecovery {
    /// Remove the scratch file and put the backup back when the program
    /// file is missing; `true` when the backup was restored
    pub fn restore(&self) -> Result<bool> {
        let scratch = self.scratch.lock().ok().and_then(|mut slot| slot.take());
        if let Some(path) = scratch {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed scratch file {:?}", path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove scratch file {:?}: {}", path, e),
            }
        }

        if self.binary_path.exists() || !self.backup_path.exists() {
            return Ok(false);
        }
        fs::rename(&self.backup_path, &self.binary_path)?;
        info!("Restored {:?} after interrupt", self.binary_path);
        Ok(true)
    }
}

impl SelfUpdater {
    /// Create an updater for the running program over HTTP
    pub fn new(config: &AppConfig) -> Result<Self> {
        let settings = &config.settings().self_update;
        let temp_dir = settings
            .temp_dir
            .clone()
            .map(|dir| dir.into_std_path_buf())
            .unwrap_or_else(std::env::temp_dir);

        Self::with_fetcher(
            config.identity(),
            config.self_path(),
            temp_dir,
            settings.url.clone(),
            Box::new(HttpFetcher::new(settings)?),
        )
    }

    /// Create an updater with an explicit payload source
    pub fn with_fetcher(
        identity: &ProgramIdentity,
        binary_path: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
        url: impl Into<String>,
        fetcher: Box<dyn PayloadFetcher + Send>,
    ) -> Result<Self> {
        let binary_path = binary_path.into();
        debug!(
            "Updater initialized: revision={}, path={:?}",
            identity.revision, binary_path
        );

        Ok(Self {
            current: identity.revision,
            program_name: identity.name.clone(),
            binary_path,
            temp_dir: temp_dir.into(),
            url: url.into(),
            patterns: MarkerPatterns::standard()?,
            fetcher,
            scratch: Arc::new(Mutex::new(None)),
        })
    }

    /// Replace the marker patterns
    pub fn with_patterns(mut self, patterns: MarkerPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    /// Path of the program file
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Path the program file is moved to during the update
    pub fn backup_path(&self) -> PathBuf {
        let mut path = OsString::from(self.binary_path.as_os_str());
        path.push(BACKUP_SUFFIX);
        PathBuf::from(path)
    }

    /// Handle for undoing this update from a signal handler
    pub fn interrupt_recovery(&self) -> InterruptRecovery {
        InterruptRecovery {
            binary_path: self.binary_path.clone(),
            backup_path: self.backup_path(),
            scratch: Arc::clone(&self.scratch),
        }
    }

    /// Download the published release and install it when newer
    pub fn run(&self) -> Result<UpdateResult> {
        info!("Starting self-update of {:?}", self.binary_path);
        ensure_replaceable(&self.binary_path)?;

        fs::create_dir_all(&self.temp_dir)?;

        let backup = self.backup_path();
        match fs::remove_file(&backup) {
            Ok(()) => debug!("Removed stale backup {:?}", backup),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        fs::rename(&self.binary_path, &backup)?;
        debug!("Moved {:?} to {:?}", self.binary_path, backup);

        let mut candidate = match tempfile::Builder::new()
            .prefix(&format!("{}.", self.program_name))
            .tempfile_in(&self.temp_dir)
        {
            Ok(file) => file,
            Err(e) => return self.rollback(&backup, e.into()),
        };
        self.track_scratch(Some(candidate.path().to_path_buf()));

        info!("Downloading {}", self.url);
        if let Err(e) = self.fetcher.fetch(&self.url, candidate.as_file_mut()) {
            self.discard(candidate);
            return self.rollback(&backup, e);
        }

        let bytes = match fs::read(candidate.path()) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.discard(candidate);
                return self.rollback(&backup, e.into());
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = text.lines().collect();

        if find_line(&self.patterns.integrity, &lines).is_none() {
            warn!("Downloaded payload carries no integrity line");
            self.discard(candidate);
            return self.rollback(&backup, Error::integrity(&self.url));
        }

        let available = match find_line(&self.patterns.version, &lines) {
            Some(line) => Revision::from_marker_line(line).map_err(|e| e.to_string()),
            None => Err("no revision line".to_string()),
        };
        let available = match available {
            Ok(revision) => revision,
            Err(reason) => {
                self.track_scratch(None);
                let kept = candidate
                    .into_temp_path()
                    .keep()
                    .map_err(|e| Error::Io(e.error))?;
                error!("Rejected candidate kept at {:?}: {}", kept, reason);
                return Err(Error::corrupt_candidate(reason, backup, kept));
            }
        };

        if self.current >= available {
            info!(
                "Running revision {} is not older than {}",
                self.current, available
            );
            self.discard(candidate);
            self.restore_backup(&backup)?;
            return Ok(UpdateResult::AlreadyUpToDate {
                current: self.current,
                available,
            });
        }

        if let Err(e) = self.install(candidate) {
            return self.rollback(&backup, e);
        }
        if let Err(e) = fs::remove_file(&backup) {
            warn!("Failed to remove backup {:?}: {}", backup, e);
        }

        info!("Updated from {} to {}", self.current, available);
        Ok(UpdateResult::Updated {
            from: self.current,
            to: available,
        })
    }

    /// Move the candidate over the program file and make it executable
    fn install(&self, candidate: NamedTempFile) -> Result<()> {
        self.track_scratch(None);
        if let Err(e) = candidate.into_temp_path().persist(&self.binary_path) {
            debug!("Rename into place failed ({}), copying instead", e.error);
            let temp_path = e.path;
            fs::copy(&temp_path, &self.binary_path)?;
            temp_path.close()?;
        }
        fs::set_permissions(&self.binary_path, fs::Permissions::from_mode(0o755))?;
        Ok(())
    }

    fn restore_backup(&self, backup: &Path) -> io::Result<()> {
        // An interrupt handler may already have put it back
        if !backup.exists() && self.binary_path.exists() {
            return Ok(());
        }
        fs::rename(backup, &self.binary_path)?;
        debug!("Restored {:?} from backup", self.binary_path);
        Ok(())
    }

    /// Put the backup back and fail with `err`
    fn rollback<T>(&self, backup: &Path, err: Error) -> Result<T> {
        warn!("Rolling back to {:?}: {}", backup, err);
        match self.restore_backup(backup) {
            Ok(()) => Err(err),
            Err(e) => {
                error!("Update failed ({}) and {:?} could not be restored: {}", err, backup, e);
                Err(Error::rollback_failed(err, backup, e))
            }
        }
    }

    fn track_scratch(&self, path: Option<PathBuf>) {
        if let Ok(mut slot) = self.scratch.lock() {
            *slot = path;
        }
    }

    fn discard(&self, candidate: NamedTempFile) {
        self.track_scratch(None);
        if let Err(e) = candidate.close() {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove scratch file: {}", e);
            }
        }
    }
}
