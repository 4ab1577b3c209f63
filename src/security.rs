//! Owner-only permissions for persisted setting files
//!
//! Setting records can hold credentials (database passwords, OAuth secrets),
//! so the JSON store keeps its directory at 0o700 and its file at 0o600.

use crate::error::{Error, Result};
use std::path::Path;

/// Restrict a file to its owner (Unix: 0o600). No-op elsewhere.
///
/// # Errors
///
/// Returns `Error::FileRead` if metadata can't be read and `Error::FileWrite`
/// if the new mode can't be applied.
#[cfg(unix)]
pub fn set_secure_file_permissions(path: &Path) -> Result<()> {
    set_mode(path, 0o600)
}

/// Restrict a directory to its owner (Unix: 0o700). No-op elsewhere.
///
/// # Errors
///
/// Same as [`set_secure_file_permissions`].
#[cfg(unix)]
pub fn set_secure_dir_permissions(path: &Path) -> Result<()> {
    set_mode(path, 0o700)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .permissions();
    perms.set_mode(mode);

    fs::set_permissions(path, perms).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create `path` if missing and restrict it to the owner.
///
/// Directories that already exist keep their permissions; only freshly
/// created ones are tightened.
///
/// # Errors
///
/// Returns `Error::DirectoryCreate` if the directory cannot be created.
pub fn ensure_secure_dir(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    crate::error::create_dir(path)?;

    #[cfg(unix)]
    set_secure_dir_permissions(path)?;

    Ok(())
}

#[cfg(not(unix))]
pub fn set_secure_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(not(unix))]
pub fn set_secure_dir_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
