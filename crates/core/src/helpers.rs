use starbase_utils::fs::FsError;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Milliseconds since the Unix epoch.
pub fn now() -> u128 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Expand a leading `~` to the provided home directory.
pub fn expand_home_path<P: AsRef<Path>>(path: P, home_dir: &Path) -> PathBuf {
    let path = path.as_ref();

    match path.strip_prefix("~") {
        Ok(rest) => home_dir.join(rest),
        Err(_) => path.to_path_buf(),
    }
}


/// The I/O error behind a failed filesystem operation, if there is one.
pub fn fs_io_error(error: &FsError) -> Option<&io::Error> {
    match error {
        FsError::Copy { error, .. }
        | FsError::Create { error, .. }
        | FsError::Lock { error, .. }
        | FsError::Perms { error, .. }
        | FsError::Read { error, .. }
        | FsError::Remove { error, .. }
        | FsError::Rename { error, .. }
        | FsError::Unlock { error, .. }
        | FsError::Write { error, .. } => Some(error.as_ref()),
        _ => None,
    }
}
