pub use super::uninstall_error::CaskUninstallError;
use crate::env::CaskEnvironment;
use crate::id::CaskId;
use crate::layout::InstalledState;
use crate::manifest::{Cask, CleanupPath};
use crate::helpers::fs_io_error;
use starbase_utils::fs::{self, FsError};
use starbase_utils::glob::{self, wax::Pattern};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// The bundle and per-user state belonging to a cask.
#[derive(Clone, Debug, PartialEq)]
pub struct UninstallTarget {
    pub cleanup_paths: Vec<CleanupPath>,
    pub id: CaskId,
    pub install_path: PathBuf,
}

impl UninstallTarget {
    pub fn from_cask(cask: &Cask, app_dir: &Path) -> Self {
        Self {
            cleanup_paths: cask.cleanup_paths().to_vec(),
            id: cask.id().to_owned(),
            install_path: app_dir.join(cask.artifact().as_str()),
        }
    }

    /// Add cleanup paths not already present, keeping order.
    pub fn merge_cleanup_paths(&mut self, paths: &[CleanupPath]) {
        for path in paths {
            if !self.cleanup_paths.contains(path) {
                self.cleanup_paths.push(path.to_owned());
            }
        }
    }
}

impl From<&InstalledState> for UninstallTarget {
    fn from(state: &InstalledState) -> Self {
        Self {
            cleanup_paths: state.cleanup_paths.clone(),
            id: state.identifier.clone(),
            install_path: state.install_path.clone(),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ZapReport {
    /// Whether the application bundle existed and was removed.
    pub removed_bundle: bool,
    /// Cleanup paths that were removed.
    pub removed: Vec<PathBuf>,
    /// Cleanup paths that did not exist.
    pub missing: Vec<PathBuf>,
}

// Returns whether something was removed.
fn remove_path(path: &Path) -> Result<bool, FsError> {
    let metadata = match path.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(error) => {
            return Err(FsError::Read {
                path: path.to_path_buf(),
                error: Box::new(error),
            });
        }
    };

    let result = if metadata.is_symlink() {
        fs::remove_link(path)
    } else if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(_) => Ok(true),
        // Removed by someone else in the meantime
        Err(error) if fs_io_error(&error).is_some_and(|e| e.kind() == io::ErrorKind::NotFound) => {
            Ok(false)
        }
        Err(error) => Err(error),
    }
}

fn describe_failure(error: &FsError) -> String {
    match fs_io_error(error) {
        Some(io_error) => io_error.to_string(),
        None => error.to_string(),
    }
}

/// Resolve a cleanup path into concrete paths on disk. Wildcards only ever
/// match entries of the parent directory.
pub fn expand_cleanup_path(path: &CleanupPath, home_dir: &Path) -> Vec<PathBuf> {
    let expanded = path.expand(home_dir);

    if !path.has_wildcard() {
        return vec![expanded];
    }

    let (Some(parent), Some(file_name)) = (expanded.parent(), expanded.file_name()) else {
        return vec![];
    };

    let file_name = file_name.to_string_lossy();

    let pattern = match glob::create_glob(&file_name) {
        Ok(pattern) => pattern,
        Err(error) => {
            warn!(pattern = path.as_str(), "Invalid cleanup pattern: {error}");

            return vec![];
        }
    };

    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(dir = ?parent, "Unable to read cleanup directory: {error}");

            return vec![];
        }
    };

    let mut matches = entries
        .into_iter()
        .filter(|entry| pattern.is_match(Path::new(&entry.file_name())))
        .map(|entry| entry.path())
        .collect::<Vec<_>>();

    matches.sort();
    matches
}

/// Removes installed bundles, and with zap, the per-user state a cask
/// declares.
pub struct Uninstaller<'env> {
    env: &'env CaskEnvironment,
}

impl<'env> Uninstaller<'env> {
    pub fn new(env: &'env CaskEnvironment) -> Self {
        Self { env }
    }

    /// Remove only the application bundle. Returns false when it was
    /// already absent, so repeated calls are harmless.
    #[instrument(skip_all, fields(cask = target.id.as_str()))]
    pub fn uninstall(&self, target: &UninstallTarget) -> Result<bool, CaskUninstallError> {
        let path = &target.install_path;

        debug!(install_path = ?path, "Removing application bundle");

        let removed = remove_path(path).map_err(|error| {
            if fs_io_error(&error).is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied) {
                CaskUninstallError::PermissionDenied {
                    path: path.to_owned(),
                    error: Box::new(error),
                }
            } else {
                CaskUninstallError::RemoveFailed {
                    path: path.to_owned(),
                    error: Box::new(error),
                }
            }
        })?;

        if !removed {
            debug!(install_path = ?path, "Application bundle already absent");
        }

        Ok(removed)
    }

    /// Uninstall, then remove every cleanup path. Paths that cannot be
    /// removed do not stop the remaining paths, and are reported together.
    #[instrument(skip_all, fields(cask = target.id.as_str()))]
    pub fn zap(&self, target: &UninstallTarget) -> Result<ZapReport, CaskUninstallError> {
        let mut report = ZapReport {
            removed_bundle: self.uninstall(target)?,
            ..ZapReport::default()
        };
        let mut failures = vec![];

        for cleanup_path in &target.cleanup_paths {
            let paths = expand_cleanup_path(cleanup_path, &self.env.home_dir);

            if paths.is_empty() {
                debug!(pattern = cleanup_path.as_str(), "No paths matched");
            }

            for path in paths {
                match remove_path(&path) {
                    Ok(true) => {
                        debug!(path = ?path, "Removed cleanup path");

                        report.removed.push(path);
                    }
                    Ok(false) => {
                        report.missing.push(path);
                    }
                    Err(error) => {
                        warn!(path = ?path, "Failed to remove cleanup path: {error}");

                        failures.push((path, describe_failure(&error)));
                    }
                };
            }
        }

        if !failures.is_empty() {
            return Err(CaskUninstallError::ZapIncomplete {
                id: target.id.to_string(),
                failures,
            });
        }

        Ok(report)
    }
}
