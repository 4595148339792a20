//! Crash-safe file writes
//!
//! Used for the settings file and the saved program model so a crash in the
//! middle of a save never leaves a half-written JSON document behind.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Write data to a file atomically with fsync
///
/// This function:
/// 1. Writes data to a temporary file in the same directory
/// 2. Calls fsync on the file
/// 3. Renames the temp file over the target
/// 4. Syncs the directory so the rename is durable
///
/// If any step fails, the temporary file is cleaned up.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    let temp_name = format!(
        ".{}.tmp.{}",
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string()),
        std::process::id()
    );
    let temp_path = parent.join(&temp_name);

    let write_result = (|| -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()
    })();

    if let Err(e) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    sync_directory(parent)
}

/// Copy `path` to `<path>.bak` unless a backup already exists.
///
/// Returns `true` when a backup was written by this call.
pub fn backup_once(path: &Path) -> io::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let backup = backup_path(path);
    if backup.exists() {
        return Ok(false);
    }

    fs::copy(path, &backup)?;
    Ok(true)
}

/// `<path>.bak`, keeping the original extension in the name
pub fn backup_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    name.into()
}

fn sync_directory(path: &Path) -> io::Result<()> {
    // Directories can be opened and fsynced on Unix; NTFS renames are atomic
    // without it.
    #[cfg(unix)]
    {
        File::open(path)?.sync_all()?;
    }

    #[cfg(not(unix))]
    {
        let _ = path;
    }

    Ok(())
}
