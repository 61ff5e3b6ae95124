use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches one file (by name, inside its parent directory) and reports
/// when it is created, modified, replaced or removed.
///
/// Atomic writes land as a rename onto the target, so the parent directory is
/// watched rather than the file's inode.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

impl DocumentWatcher {
    /// Start watching `path`. The parent directory must exist.
    pub fn start(path: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let file_name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                // Temp files and the lock file share the directory
                let relevant = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));

                if relevant {
                    let _ = tx.send(());
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(DocumentWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking: drain queued notifications and report whether any arrived.
    pub fn poll(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}
