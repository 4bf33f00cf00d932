use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the lock file at the vault root. It is created once and left in
/// place; only the flock on it comes and goes.
const LOCK_FILE: &str = ".weekplan.lock";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How a command uses the vault.
///
/// Commands that rewrite notes, history or settings take `Write`, which
/// excludes everyone else. Listing commands take `Read`, so any number of
/// them run together but never see a move half done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Read,
    Write,
}

impl LockKind {
    /// How long to wait for other commands before giving up
    pub fn timeout(self) -> Duration {
        match self {
            // a listing is not worth holding the terminal for
            LockKind::Read => Duration::from_secs(2),
            LockKind::Write => Duration::from_secs(5),
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKind::Read => write!(f, "read"),
            LockKind::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("could not lock {path}: {source}")]
    Flock { path: PathBuf, source: io::Error },
    #[error("vault is busy: no {kind} lock on {path} after {}s, is another wp command running?", .waited.as_secs())]
    Busy {
        path: PathBuf,
        kind: LockKind,
        waited: Duration,
    },
}

/// Advisory lock on the vault, released when dropped.
///
/// Uses flock on Unix; elsewhere every acquire succeeds immediately.
#[derive(Debug)]
pub struct VaultLock {
    _file: File,
    kind: LockKind,
}

impl VaultLock {
    /// Lock for a command that changes the vault.
    pub fn write(vault_root: &Path) -> Result<Self, LockError> {
        Self::acquire(vault_root, LockKind::Write, LockKind::Write.timeout())
    }

    /// Lock for a command that only lists what is in the vault.
    pub fn read(vault_root: &Path) -> Result<Self, LockError> {
        Self::acquire(vault_root, LockKind::Read, LockKind::Read.timeout())
    }

    pub fn acquire(vault_root: &Path, kind: LockKind, timeout: Duration) -> Result<Self, LockError> {
        let path = vault_root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let start = Instant::now();
        let mut announced = false;
        loop {
            match try_lock(&file, kind) {
                Ok(()) => return Ok(VaultLock { _file: file, kind }),
                Err(e) if e.kind() != io::ErrorKind::WouldBlock => {
                    return Err(LockError::Flock { path, source: e });
                }
                Err(_) if start.elapsed() >= timeout => {
                    return Err(LockError::Busy {
                        path,
                        kind,
                        waited: timeout,
                    });
                }
                Err(_) => {
                    if !announced {
                        log::debug!("waiting for {} lock on {}", kind, path.display());
                        announced = true;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }

    pub fn kind(&self) -> LockKind {
        self.kind
    }
}

#[cfg(unix)]
fn try_lock(file: &File, kind: LockKind) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let operation = match kind {
        LockKind::Read => libc::LOCK_SH,
        LockKind::Write => libc::LOCK_EX,
    };
    if unsafe { libc::flock(file.as_raw_fd(), operation | libc::LOCK_NB) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File, _kind: LockKind) -> io::Result<()> {
    Ok(())
}
