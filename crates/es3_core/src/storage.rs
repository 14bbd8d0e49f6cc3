//! Reading and writing save files, with timestamped backups.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::core_api::{CoreError, CoreErrorCode};

pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

const MAX_BACKUP_SUFFIX: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupPolicy {
    /// Copy the existing file to `<name>.bak-<YYYYMMDD-HHMMSS>` before overwriting.
    #[default]
    Timestamped,
    Skip,
}

pub fn read_save(path: &Path) -> Result<Vec<u8>, CoreError> {
    if !path.is_file() {
        return Err(CoreError::not_found(format!(
            "save file not found: {}",
            path.display()
        )));
    }
    fs::read(path).map_err(|e| io_error(path, "read", e))
}

/// Writes `bytes` to `path`, first backing up any existing content. Returns the
/// backup path if one was written.
pub fn write_save(
    path: &Path,
    bytes: &[u8],
    policy: BackupPolicy,
) -> Result<Option<PathBuf>, CoreError> {
    write_save_at(path, bytes, policy, Local::now().naive_local())
}

pub fn write_save_at(
    path: &Path,
    bytes: &[u8],
    policy: BackupPolicy,
    now: NaiveDateTime,
) -> Result<Option<PathBuf>, CoreError> {
    let backup = match policy {
        BackupPolicy::Timestamped if path.exists() => Some(write_backup(path, now)?),
        _ => None,
    };

    fs::write(path, bytes).map_err(|e| io_error(path, "write", e))?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(backup)
}

/// Name of the first backup candidate for `path` at `now`.
pub fn backup_path(path: &Path, now: NaiveDateTime) -> Result<PathBuf, CoreError> {
    backup_candidate(path, now, 0)
}

/// Copies the current content of `path` to a fresh backup file.
///
/// A same-second repeat save gets `-1`, `-2`, ... appended; existing backups are never
/// overwritten.
pub fn write_backup(path: &Path, now: NaiveDateTime) -> Result<PathBuf, CoreError> {
    let content = fs::read(path).map_err(|e| io_error(path, "read", e))?;

    for attempt in 0..MAX_BACKUP_SUFFIX {
        let candidate = backup_candidate(path, now, attempt)?;
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(io_error(&candidate, "create", e)),
        };
        fill_backup(file, &candidate, &content)?;
        log::info!("backed up {} to {}", path.display(), candidate.display());
        return Ok(candidate);
    }

    Err(CoreError::new(
        CoreErrorCode::Io,
        format!(
            "no free backup name for {} after {MAX_BACKUP_SUFFIX} attempts",
            path.display()
        ),
    ))
}

/// Writes `content` into a freshly created backup. A partially written backup is removed
/// so its name does not stay taken.
fn fill_backup(mut file: impl Write, candidate: &Path, content: &[u8]) -> Result<(), CoreError> {
    if let Err(e) = file.write_all(content).and_then(|()| file.flush()) {
        drop(file);
        if let Err(remove_err) = fs::remove_file(candidate) {
            log::warn!(
                "could not remove partial backup {}: {remove_err}",
                candidate.display()
            );
        }
        return Err(io_error(candidate, "write", e));
    }
    Ok(())
}

fn backup_candidate(
    path: &Path,
    now: NaiveDateTime,
    attempt: u32,
) -> Result<PathBuf, CoreError> {
    let Some(file_name) = path.file_name() else {
        return Err(CoreError::new(
            CoreErrorCode::UnsupportedOperation,
            format!("save path has no file name: {}", path.display()),
        ));
    };

    let mut name = file_name.to_os_string();
    name.push(format!(".bak-{}", now.format(BACKUP_TIMESTAMP_FORMAT)));
    if attempt > 0 {
        name.push(format!("-{attempt}"));
    }
    Ok(path.with_file_name(name))
}

fn io_error(path: &Path, action: &str, e: std::io::Error) -> CoreError {
    CoreError::new(
        CoreErrorCode::Io,
        format!("failed to {action} {}: {e}", path.display()),
    )
}
