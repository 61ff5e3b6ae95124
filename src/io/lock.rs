use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long a writer waits for another process before giving up
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_START: Duration = Duration::from_millis(2);
const RETRY_MAX: Duration = Duration::from_millis(50);

/// Exclusive advisory lock on a sidecar `<document>.lock` file, held for
/// one read-modify-write cycle of a shared database document.
///
/// The sidecar is never deleted: unlinking it while another process waits
/// on the old inode would let two writers hold "the" lock at once.
pub struct DocumentLock {
    _file: File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("timed out waiting for {path}: another chore process is writing")]
    Timeout { path: PathBuf },
}

impl DocumentLock {
    /// Lock `document`, retrying with backoff for up to `timeout`.
    pub fn acquire(document: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = sidecar_path(document);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + timeout;
        let mut wait = RETRY_START;
        while !try_lock_exclusive(&file) {
            let now = Instant::now();
            if now >= deadline {
                return Err(LockError::Timeout { path });
            }
            std::thread::sleep(wait.min(deadline - now));
            wait = (wait * 2).min(RETRY_MAX);
        }
        Ok(DocumentLock { _file: file })
    }
}

pub fn sidecar_path(document: &Path) -> PathBuf {
    let mut name = document.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    document.with_file_name(name)
}

// flock is released when the descriptor closes, i.e. when the guard drops.
#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
fn try_lock_exclusive(_file: &File) -> bool {
    true
}
