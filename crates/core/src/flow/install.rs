pub use super::install_error::CaskInstallError;
use crate::cancel::CancelToken;
use crate::env::CaskEnvironment;
use crate::flow::fetch::VerifiedArtifact;
use crate::helpers::{fs_io_error, now};
use crate::id::CaskId;
use crate::layout::InstalledState;
use crate::manifest::{AppArtifact, Cask, CleanupPath};
use crate::os::OsRequirement;
use crate::utils::archive::{CaskArchiveError, create_unpacker};
use crate::version::CaskVersion;
use starbase_utils::fs::{self, FsError};
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const STAGE_MARKER: &str = ".cask-stage-";

const PREVIOUS_DIR: &str = "previous";
const UNPACK_DIR: &str = "unpacked";

/// Where and what a cask installs.
#[derive(Clone, Debug, PartialEq)]
pub struct InstallTarget {
    pub app_dir: PathBuf,
    pub artifact: AppArtifact,
    pub auto_updates: bool,
    pub cleanup_paths: Vec<CleanupPath>,
    pub id: CaskId,
    pub name: String,
    pub version: CaskVersion,
}

impl InstallTarget {
    pub fn new(cask: &Cask, app_dir: &Path) -> Self {
        Self {
            app_dir: app_dir.to_path_buf(),
            artifact: cask.artifact().to_owned(),
            auto_updates: cask.auto_updates(),
            cleanup_paths: cask.cleanup_paths().to_vec(),
            id: cask.id().to_owned(),
            name: cask.name().to_owned(),
            version: cask.version().to_owned(),
        }
    }

    pub fn from_state(state: &InstalledState) -> Self {
        Self {
            app_dir: state
                .install_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            artifact: state.artifact.clone(),
            auto_updates: state.auto_updates,
            cleanup_paths: state.cleanup_paths.clone(),
            id: state.identifier.clone(),
            name: state.name.clone(),
            version: state.version.clone(),
        }
    }

    /// Final location of the application bundle.
    pub fn install_path(&self) -> PathBuf {
        self.app_dir.join(self.artifact.as_str())
    }

    fn stage_prefix(&self) -> String {
        format!(".{}{STAGE_MARKER}", self.artifact)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// The requested version is already installed.
    SameVersion,
    /// A newer version is installed, installing would downgrade.
    NewerInstalled,
    /// The application updates itself.
    AutoUpdates,
}

/// What an install request should do given the currently installed state.
#[derive(Clone, Debug, PartialEq)]
pub enum InstallPlan {
    Install,
    Upgrade { from: CaskVersion },
    Reinstall { from: CaskVersion },
    Skip {
        installed: CaskVersion,
        reason: SkipReason,
    },
}

impl InstallPlan {
    pub fn decide(cask: &Cask, installed: Option<&InstalledState>, force: bool) -> Self {
        // A receipt without a bundle on disk is treated as not installed
        let Some(installed) = installed.filter(|state| state.install_path.exists()) else {
            return Self::Install;
        };

        let from = installed.version.clone();
        let reason = if cask.version() == &from {
            Some(SkipReason::SameVersion)
        } else if cask.version() < &from {
            Some(SkipReason::NewerInstalled)
        } else if cask.auto_updates() || installed.auto_updates {
            Some(SkipReason::AutoUpdates)
        } else {
            None
        };

        match reason {
            Some(reason) if !force => Self::Skip {
                installed: from,
                reason,
            },
            Some(_) => Self::Reinstall { from },
            None => Self::Upgrade { from },
        }
    }

    pub fn should_install(&self) -> bool {
        !matches!(self, Self::Skip { .. })
    }
}

fn find_io_error<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a io::Error> {
    let mut current = Some(error);

    while let Some(inner) = current {
        if let Some(io_error) = inner.downcast_ref::<io::Error>() {
            return Some(io_error);
        }

        if let Some(io_error) = inner.downcast_ref::<Box<io::Error>>() {
            return Some(io_error);
        }

        if let Some(fs_error) = inner.downcast_ref::<FsError>()
            && let Some(io_error) = fs_io_error(fs_error)
        {
            return Some(io_error);
        }

        current = inner.source();
    }

    None
}

fn is_storage_full(error: &io::Error) -> bool {
    // ENOSPC
    error.kind() == io::ErrorKind::StorageFull || error.raw_os_error() == Some(28)
}

fn is_permission_denied(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem
    )
}

async fn wait_for_cancel(token: Option<&CancelToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}

/// Places verified artifacts into the applications directory. Nothing is
/// visible at the final location until the staged bundle is complete.
pub struct Installer<'env> {
    cancel: Option<CancelToken>,
    env: &'env CaskEnvironment,
    timeout: Duration,
}

impl<'env> Installer<'env> {
    pub fn new(env: &'env CaskEnvironment) -> Self {
        Self {
            cancel: None,
            env,
            timeout: env.config.install.timeout(),
        }
    }

    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = Some(token);
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Fail if the host does not meet the cask's OS requirement.
    pub fn check_os(
        &self,
        id: &CaskId,
        requirement: Option<&OsRequirement>,
    ) -> Result<(), CaskInstallError> {
        if self.env.host_os.satisfies(requirement) {
            return Ok(());
        }

        Err(CaskInstallError::IncompatibleOS {
            id: id.to_string(),
            requirement: requirement.map(|req| req.to_string()).unwrap_or_default(),
            host: self.env.host_os.to_string(),
        })
    }

    #[instrument(skip_all, fields(cask = target.id.as_str()))]
    pub async fn install(
        &self,
        artifact: VerifiedArtifact,
        target: &InstallTarget,
        os_requirement: Option<&OsRequirement>,
    ) -> Result<InstalledState, CaskInstallError> {
        self.check_os(&target.id, os_requirement)?;

        fs::create_dir_all(&target.app_dir).map_err(|error| self.map_fs_error(target, error))?;

        let stage_dir = target.app_dir.join(format!(
            "{}{}",
            target.stage_prefix(),
            uuid::Uuid::new_v4().simple()
        ));

        debug!(stage_dir = ?stage_dir, "Creating stage area");

        fs::create_dir_all(&stage_dir).map_err(|error| self.map_fs_error(target, error))?;

        let result = match self.stage_until_aborted(&artifact, target, &stage_dir).await {
            Ok(staged_bundle) => self.swap(target, &staged_bundle, &stage_dir),
            Err(error) => Err(error),
        };

        // If the prior bundle could not be restored it still lives in the
        // stage, so leave it for recovery instead of deleting it
        if stage_dir.join(PREVIOUS_DIR).exists() && result.is_err() {
            warn!(
                stage_dir = ?stage_dir,
                "Previous bundle could not be restored, it will be recovered on the next run",
            );
        } else if let Err(error) = fs::remove_dir_all(&stage_dir) {
            warn!(stage_dir = ?stage_dir, "Failed to remove stage area: {error}");
        }

        let install_path = result?;

        debug!(install_path = ?install_path, "Installed application bundle");

        Ok(InstalledState {
            identifier: target.id.clone(),
            name: target.name.clone(),
            version: target.version.clone(),
            install_path,
            installed_at: now(),
            auto_updates: target.auto_updates,
            checksum: artifact.checksum().to_owned(),
            url: artifact.url().to_string(),
            artifact: target.artifact.clone(),
            cleanup_paths: target.cleanup_paths.clone(),
        })
    }

    /// Undo the effects of an install that was interrupted mid-swap: put a
    /// prior bundle back if the final location is empty, and remove stale
    /// stage areas. Must be called while holding the identifier's lock.
    #[instrument(skip_all, fields(cask = target.id.as_str()))]
    pub fn recover_interrupted(&self, target: &InstallTarget) -> Result<bool, CaskInstallError> {
        let prefix = target.stage_prefix();
        let install_path = target.install_path();
        let mut recovered = false;
        let entries =
            fs::read_dir(&target.app_dir).map_err(|error| self.map_fs_error(target, error))?;

        for entry in entries {
            let stage_dir = entry.path();

            if !entry.file_name().to_string_lossy().starts_with(&prefix) || !stage_dir.is_dir() {
                continue;
            }

            let previous = stage_dir.join(PREVIOUS_DIR);

            if previous.exists() && install_path.symlink_metadata().is_err() {
                warn!(
                    install_path = ?install_path,
                    "Restoring application bundle from an interrupted install",
                );

                fs::rename(&previous, &install_path)
                    .map_err(|error| self.map_fs_error(target, error))?;

                recovered = true;
            }

            debug!(stage_dir = ?stage_dir, "Removing stale stage area");

            fs::remove_dir_all(&stage_dir).map_err(|error| self.map_fs_error(target, error))?;
        }

        Ok(recovered)
    }

    // Unpacking is bounded by the timeout and stops on cancellation. A
    // blocking unpack still running after an abort only writes into the
    // stage area, which recovery removes on the next run.
    async fn stage_until_aborted(
        &self,
        artifact: &VerifiedArtifact,
        target: &InstallTarget,
        stage_dir: &Path,
    ) -> Result<PathBuf, CaskInstallError> {
        tokio::select! {
            biased;

            _ = wait_for_cancel(self.cancel.as_ref()) => {
                debug!("Install cancelled while staging");

                Err(CaskInstallError::Cancelled {
                    id: target.id.to_string(),
                })
            }
            result = tokio::time::timeout(self.timeout, self.stage(artifact, target, stage_dir)) => {
                match result {
                    Ok(result) => result,
                    Err(_) => Err(CaskInstallError::TimedOut {
                        id: target.id.to_string(),
                        seconds: self.timeout.as_secs(),
                    }),
                }
            }
        }
    }

    async fn stage(
        &self,
        artifact: &VerifiedArtifact,
        target: &InstallTarget,
        stage_dir: &Path,
    ) -> Result<PathBuf, CaskInstallError> {
        let unpack_dir = stage_dir.join(UNPACK_DIR);
        let staged_bundle = stage_dir.join(target.artifact.as_str());

        let Some(unpacker) = create_unpacker(artifact.file_name()) else {
            return Err(self.stage_failure(
                target,
                format!("unsupported artifact format {}", artifact.file_name()),
            ));
        };

        unpacker
            .unpack(artifact.path(), &unpack_dir)
            .await
            .map_err(|error| self.map_unpack_error(target, artifact, error))?;

        let Some(found) = find_bundle(&unpack_dir, &target.artifact) else {
            return Err(self.stage_failure(
                target,
                format!("{} was not found in {}", target.artifact, artifact.file_name()),
            ));
        };

        fs::rename(&found, &staged_bundle).map_err(|error| self.map_fs_error(target, error))?;

        let is_complete = staged_bundle.is_dir()
            && fs::read_dir(&staged_bundle).is_ok_and(|entries| !entries.is_empty());

        if !is_complete {
            return Err(self.stage_failure(target, "staged bundle is empty".into()));
        }

        Ok(staged_bundle)
    }

    fn swap(
        &self,
        target: &InstallTarget,
        staged_bundle: &Path,
        stage_dir: &Path,
    ) -> Result<PathBuf, CaskInstallError> {
        if self.cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
            return Err(CaskInstallError::Cancelled {
                id: target.id.to_string(),
            });
        }

        let install_path = target.install_path();
        let previous = stage_dir.join(PREVIOUS_DIR);
        let has_previous = install_path.symlink_metadata().is_ok();

        if has_previous {
            debug!(install_path = ?install_path, "Moving previous bundle aside");

            fs::rename(&install_path, &previous)
                .map_err(|error| self.map_fs_error(target, error))?;
        }

        if let Err(error) = fs::rename(staged_bundle, &install_path) {
            if has_previous {
                debug!(install_path = ?install_path, "Restoring previous bundle");

                if let Err(restore_error) = fs::rename(&previous, &install_path) {
                    warn!(
                        install_path = ?install_path,
                        "Failed to restore previous bundle: {restore_error}",
                    );
                }
            }

            return Err(self.map_fs_error(target, error));
        }

        Ok(install_path)
    }

    fn stage_failure(&self, target: &InstallTarget, reason: String) -> CaskInstallError {
        CaskInstallError::StageFailure {
            id: target.id.to_string(),
            artifact: target.artifact.to_string(),
            reason,
        }
    }

    fn map_fs_error(&self, target: &InstallTarget, error: FsError) -> CaskInstallError {
        let path = fs_error_path(&error).unwrap_or_else(|| target.app_dir.clone());
        let io_error = fs_io_error(&error);

        if io_error.is_some_and(is_permission_denied) {
            CaskInstallError::PermissionDenied {
                path,
                error: Box::new(error),
            }
        } else if io_error.is_some_and(is_storage_full) {
            CaskInstallError::InsufficientSpace {
                path,
                error: Box::new(error),
            }
        } else {
            let reason = match io_error {
                Some(io_error) => format!("{error} {io_error}"),
                None => error.to_string(),
            };

            self.stage_failure(target, reason)
        }
    }

    fn map_unpack_error(
        &self,
        target: &InstallTarget,
        artifact: &VerifiedArtifact,
        error: CaskArchiveError,
    ) -> CaskInstallError {
        let path = target.app_dir.clone();
        let io_error = find_io_error(&error);

        if io_error.is_some_and(is_permission_denied) {
            CaskInstallError::PermissionDenied {
                path,
                error: Box::new(error),
            }
        } else if io_error.is_some_and(is_storage_full) {
            CaskInstallError::InsufficientSpace {
                path,
                error: Box::new(error),
            }
        } else {
            CaskInstallError::UnpackFailure {
                id: target.id.to_string(),
                artifact: artifact.file_name().to_owned(),
                error: Box::new(error),
            }
        }
    }
}

fn fs_error_path(error: &FsError) -> Option<PathBuf> {
    match error {
        FsError::Rename { to, .. } => Some(to.to_owned()),
        FsError::Create { path, .. }
        | FsError::Read { path, .. }
        | FsError::Remove { path, .. }
        | FsError::Write { path, .. } => Some(path.to_owned()),
        _ => None,
    }
}

// Bundles are either at the root of the artifact or one directory deep.
fn find_bundle(unpack_dir: &Path, artifact: &AppArtifact) -> Option<PathBuf> {
    let direct = unpack_dir.join(artifact.as_str());

    if direct.is_dir() {
        return Some(direct);
    }

    fs::read_dir(unpack_dir)
        .ok()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && !path.ends_with("__MACOSX"))
        .map(|path| path.join(artifact.as_str()))
        .find(|path| path.is_dir())
}
