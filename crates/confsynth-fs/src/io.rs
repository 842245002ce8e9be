//! Atomic I/O operations with file locking and permission handling

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};

use fs2::FileExt;
use tracing::debug;

use crate::{Error, FileMode, NormalizedPath, Result};

/// Read the current bytes of a file, `None` if it does not exist.
pub fn read_existing(path: &NormalizedPath) -> Result<Option<Vec<u8>>> {
    let native_path = path.to_native();
    match fs::read(&native_path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(native_path, e)),
    }
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers never observe a partial file,
/// and creates missing parent directories.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;
    debug!(path = %path, bytes = content.len(), "atomic write complete");

    Ok(())
}

/// Give the owner write access to an existing file so it can be replaced.
///
/// A missing file is not an error.
pub fn relax_permissions(path: &NormalizedPath) -> Result<()> {
    let native_path = path.to_native();
    let metadata = match fs::metadata(&native_path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(native_path, e)),
    };

    let mut perms = metadata.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(perms.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        perms.set_readonly(false);
    }
    fs::set_permissions(&native_path, perms).map_err(|e| Error::io(native_path, e))
}

/// Apply the final permission bits to a written file.
pub fn apply_mode(path: &NormalizedPath, mode: FileMode) -> Result<()> {
    let native_path = path.to_native();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&native_path, fs::Permissions::from_mode(mode.bits()))
            .map_err(|e| Error::io(native_path, e))
    }
    #[cfg(not(unix))]
    {
        let metadata = fs::metadata(&native_path).map_err(|e| Error::io(&native_path, e))?;
        let mut perms = metadata.permissions();
        perms.set_readonly(mode.is_readonly());
        fs::set_permissions(&native_path, perms).map_err(|e| Error::io(native_path, e))
    }
}

/// Current permission bits of a file (lower nine bits).
#[cfg(unix)]
pub fn current_mode(path: &NormalizedPath) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    let native_path = path.to_native();
    let metadata = fs::metadata(&native_path).map_err(|e| Error::io(native_path, e))?;
    Ok(metadata.permissions().mode() & 0o777)
}
