//! Append-only log of data that could not be saved or was dropped on load.
//!
//! One markdown block per entry:
//!
//! ````text
//! ## 2025-06-01T12:00:00Z write: could not save list
//!
//! key: todo-items-v1
//! error: disk full
//!
//! ```text
//! [{"id":"k1", ...}]
//! ```
//!
//! ---
//! ````

use std::fmt::{self, Write as _};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tempfile::NamedTempFile;

const LOG_FILE: &str = ".recovery.log";

const PREAMBLE: &str = "\
<!-- chore recovery log: append-only record of data that could not be saved
     or was dropped while loading. View with: chore recovery
     Safe to delete if empty or stale. -->

---
";

const SEPARATOR: &str = "---";
const FENCE_OPEN: &str = "```text";
const FENCE_CLOSE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// Stored data failed validation and was dropped on load
    Parser,
    /// A local write failed; the in-memory list was kept
    Write,
    /// A remote database call failed
    Remote,
}

impl RecoveryCategory {
    const ALL: [RecoveryCategory; 3] = [
        RecoveryCategory::Parser,
        RecoveryCategory::Write,
        RecoveryCategory::Remote,
    ];

    fn as_str(self) -> &'static str {
        match self {
            RecoveryCategory::Parser => "parser",
            RecoveryCategory::Write => "write",
            RecoveryCategory::Remote => "remote",
        }
    }

    pub fn parse_category(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    /// The data that was lost, verbatim
    pub body: String,
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    fn stamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("## {} {}: {}\n\n", self.stamp(), self.category, self.description);
        for (key, value) in &self.fields {
            let _ = writeln!(out, "{}: {}", key, value);
        }
        if !self.body.is_empty() {
            let _ = writeln!(out, "\n{}", FENCE_OPEN);
            out.push_str(self.body.strip_suffix('\n').unwrap_or(&self.body));
            let _ = writeln!(out, "\n{}", FENCE_CLOSE);
        }
        let _ = writeln!(out, "\n{}", SEPARATOR);
        out
    }

    /// Shape used by `chore recovery --json`
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(v.as_str())))
            .collect();
        serde_json::json!({
            "timestamp": self.stamp(),
            "category": self.category.as_str(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }
}

/// Replace `path` with `content` via a sibling temp file and a rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Handle to the recovery log of a workspace. A disabled log drops entries,
/// which is what in-memory stores and most tests want.
#[derive(Debug, Clone, Default)]
pub struct RecoveryLog {
    path: Option<PathBuf>,
}

impl RecoveryLog {
    pub fn in_dir(chore_dir: &Path) -> Self {
        RecoveryLog {
            path: Some(recovery_log_path(chore_dir)),
        }
    }

    pub fn disabled() -> Self {
        RecoveryLog { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an entry. A log that cannot be written costs one stderr line.
    pub fn log(&self, entry: RecoveryEntry) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = append(path, &entry) {
            eprintln!("warning: could not write to recovery log: {}", e);
        }
    }
}

pub fn recovery_log_path(chore_dir: &Path) -> PathBuf {
    chore_dir.join(LOG_FILE)
}

fn append(path: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut text = String::new();
    if file.metadata()?.len() == 0 {
        text.push_str(PREAMBLE);
    }
    text.push_str(&entry.to_markdown());
    file.write_all(text.as_bytes())
}

/// Newest entries first, at most `limit` of them.
pub fn read_recovery_entries(chore_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(chore_dir)) else {
        return Vec::new();
    };
    let entries = parse_entries(&content);
    let take = limit.unwrap_or(entries.len());
    entries.into_iter().rev().take(take).collect()
}

/// Where the reader is inside one entry block
enum Section {
    Fields,
    Body,
}

/// Entries in file order. Blocks with an unreadable heading are skipped.
fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries: Vec<RecoveryEntry> = Vec::new();
    let mut current: Option<(RecoveryEntry, Section)> = None;

    for line in content.lines() {
        match current.as_mut() {
            Some((entry, Section::Body)) => {
                if line == FENCE_CLOSE {
                    current = current.map(|(e, _)| (e, Section::Fields));
                } else {
                    if !entry.body.is_empty() {
                        entry.body.push('\n');
                    }
                    entry.body.push_str(line);
                }
            }
            Some((entry, Section::Fields)) => {
                if line == SEPARATOR {
                    entries.extend(current.take().map(|(e, _)| e));
                } else if line.starts_with("## ") {
                    // Separator missing: close this block, reread the line as a heading
                    entries.extend(current.take().map(|(e, _)| e));
                    current = start_entry(line);
                } else if line.starts_with(FENCE_CLOSE) {
                    current = current.map(|(e, _)| (e, Section::Body));
                } else if let Some((key, value)) = line.trim().split_once(": ") {
                    entry.fields.push((key.to_string(), value.to_string()));
                }
            }
            None => current = start_entry(line),
        }
    }
    entries.extend(current.map(|(e, _)| e));
    entries
}

fn start_entry(line: &str) -> Option<(RecoveryEntry, Section)> {
    let (timestamp, category, description) = parse_entry_header(line.strip_prefix("## ")?)?;
    let entry = RecoveryEntry {
        timestamp,
        category,
        description,
        fields: Vec::new(),
        body: String::new(),
    };
    Some((entry, Section::Fields))
}

/// `<rfc3339> <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (stamp, rest) = header.split_once(' ')?;
    let (category, description) = rest.split_once(": ")?;
    Some((
        DateTime::parse_from_rfc3339(stamp).ok()?.with_timezone(&Utc),
        RecoveryCategory::parse_category(category)?,
        description.to_string(),
    ))
}
