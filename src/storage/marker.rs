//! File-backed activation markers guarded by advisory locks.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use log::{debug, warn};

use crate::domain::ActivationRecord;
use crate::error::{HookError, Result};

/// One marker file per session under a shared directory.
///
/// Readers take a shared lock and writers an exclusive one, so a reader
/// never sees a record that a concurrent writer has only half written.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    dir: PathBuf,
    prefix: String,
    lock_retry: Duration,
}

impl MarkerStore {
    /// Create a store rooted at `dir`.
    ///
    /// # Arguments
    /// * `dir` - Directory holding marker files
    /// * `prefix` - File name prefix, followed by the session id
    /// * `lock_retry` - Delay before the single retry on a contended read
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, lock_retry: Duration) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            lock_retry,
        }
    }

    /// Marker path for a session.
    ///
    /// Bytes outside `[A-Za-z0-9-]` are written as `_XX` hex escapes, so a
    /// session id can never escape the marker directory and distinct ids
    /// never share a file.
    pub fn path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, encode_session_id(session_id)))
    }

    /// Read the record for a session.
    ///
    /// A missing or empty marker is a default (not activated) record.
    pub fn load(&self, session_id: &str) -> Result<ActivationRecord> {
        let path = self.path(session_id);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No marker at {}", path.display());
                return Ok(ActivationRecord::default());
            }
            Err(e) => return Err(unreadable(&path, e)),
        };

        self.lock_shared(&file, &path)?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content);
        let _ = FileExt::unlock(&file);

        read.map_err(|e| unreadable(&path, e))?;
        parse_record(&content).map_err(|e| unreadable(&path, e))
    }

    /// Apply `f` to the session's record under an exclusive lock and persist it.
    ///
    /// Creates the marker if missing. Content that fails to parse is
    /// replaced rather than propagated, since the writer owns the file.
    pub fn update<F>(&self, session_id: &str, f: F) -> Result<ActivationRecord>
    where
        F: FnOnce(&mut ActivationRecord),
    {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(session_id);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        FileExt::lock_exclusive(&file)?;
        let result = rewrite(&mut file, &path, f);
        let _ = FileExt::unlock(&file);
        result
    }

    /// Remove the session's marker. Returns whether one existed.
    pub fn clear(&self, session_id: &str) -> Result<bool> {
        let path = self.path(session_id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        FileExt::lock_exclusive(&file)?;
        let removed = fs::remove_file(&path);
        let _ = FileExt::unlock(&file);
        removed?;
        Ok(true)
    }

    /// Take a shared lock, retrying once after `lock_retry` on contention
    fn lock_shared(&self, file: &File, path: &Path) -> Result<()> {
        match FileExt::try_lock_shared(file) {
            Ok(()) => Ok(()),
            Err(e) if is_contended(&e) => {
                debug!("Marker {} is locked, retrying in {:?}", path.display(), self.lock_retry);
                thread::sleep(self.lock_retry);
                match FileExt::try_lock_shared(file) {
                    Ok(()) => Ok(()),
                    Err(e) if is_contended(&e) => Err(HookError::MarkerLockContention(path.to_path_buf())),
                    Err(e) => Err(unreadable(path, e)),
                }
            }
            Err(e) => Err(unreadable(path, e)),
        }
    }
}

fn rewrite<F>(file: &mut File, path: &Path, f: F) -> Result<ActivationRecord>
where
    F: FnOnce(&mut ActivationRecord),
{
    let mut content = String::new();
    file.read_to_string(&mut content)?;

    let mut record = match parse_record(&content) {
        Ok(record) => record,
        Err(e) => {
            warn!("Replacing corrupt marker {}: {}", path.display(), e);
            ActivationRecord::default()
        }
    };
    f(&mut record);

    let json = serde_json::to_string(&record)?;
    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    file.write_all(json.as_bytes())?;
    file.sync_data()?;

    debug!("Wrote marker {}: {}", path.display(), json);
    Ok(record)
}

fn encode_session_id(session_id: &str) -> String {
    let mut encoded = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("_{:02X}", byte));
        }
    }
    encoded
}

fn parse_record(content: &str) -> std::result::Result<ActivationRecord, serde_json::Error> {
    if content.trim().is_empty() {
        return Ok(ActivationRecord::default());
    }
    serde_json::from_str(content)
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == fs2::lock_contended_error().kind()
}

fn unreadable(path: &Path, reason: impl ToString) -> HookError {
    HookError::MarkerUnreadable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
