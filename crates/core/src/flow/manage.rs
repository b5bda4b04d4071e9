pub use super::manage_error::{CaskManageError, FailureClass};
use crate::cancel::CancelToken;
use crate::env::CaskEnvironment;
use crate::flow::fetch::{FetchOptions, Fetcher};
use crate::flow::install::{InstallPlan, InstallTarget, Installer, SkipReason};
use crate::flow::lock::LockMode;
use crate::flow::resolve::Resolver;
use crate::flow::uninstall::{UninstallTarget, Uninstaller, ZapReport};
use crate::id::CaskId;
use crate::layout::InstalledState;
use crate::manifest::Cask;
use crate::version::CaskVersion;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Clone, Debug)]
pub struct InstallOptions {
    pub fetch: FetchOptions,
    pub force: bool,
    pub lock_mode: LockMode,
}

impl InstallOptions {
    pub fn from_env(env: &CaskEnvironment) -> Self {
        Self {
            fetch: FetchOptions::from_config(&env.config.fetch),
            force: false,
            lock_mode: LockMode::Wait(Duration::from_secs(env.config.lock.wait)),
        }
    }

    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.fetch.cancel = Some(token);
    }
}

#[derive(Debug, PartialEq)]
pub enum InstallOutcome {
    Installed {
        plan: InstallPlan,
        state: InstalledState,
    },
    Skipped {
        installed: CaskVersion,
        reason: SkipReason,
    },
}

/// Runs full install, uninstall, and zap operations for casks, each under
/// the identifier's lock, and keeps receipts up to date.
pub struct Manager<'env> {
    env: &'env CaskEnvironment,
}

impl<'env> Manager<'env> {
    pub fn new(env: &'env CaskEnvironment) -> Self {
        Self { env }
    }

    /// Install a cask: check the OS, resolve the URL, download and verify
    /// the artifact, then atomically place the bundle and write a receipt.
    #[instrument(skip_all, fields(cask = cask.id().as_str()))]
    pub async fn install(
        &self,
        cask: &Cask,
        options: InstallOptions,
    ) -> Result<InstallOutcome, CaskManageError> {
        let mut installer = Installer::new(self.env);

        if let Some(token) = &options.fetch.cancel {
            installer.set_cancel_token(token.clone());
        }

        // Incompatible hosts never download anything
        installer.check_os(cask.id(), cask.os_constraint())?;

        let url = Resolver::new(cask).resolve()?;

        let _guard = self
            .env
            .locks
            .acquire(&self.env.store, cask.id(), options.lock_mode)
            .await?;

        let target = InstallTarget::new(cask, &self.env.app_dir);

        installer.recover_interrupted(&target)?;

        let previous = self.env.store.load_receipt(cask.id())?;
        let plan = InstallPlan::decide(cask, previous.as_ref(), options.force);

        if let InstallPlan::Skip { installed, reason } = plan {
            debug!(installed = %installed, ?reason, "Skipping install");

            return Ok(InstallOutcome::Skipped { installed, reason });
        }

        debug!(?plan, url = url.as_str(), "Installing cask");

        let artifact = Fetcher::new(self.env)?
            .fetch_with_retry(&url, cask.checksum(), &options.fetch)
            .await?;

        let state = installer
            .install(artifact, &target, cask.os_constraint())
            .await?;

        self.env.store.save_receipt(&state)?;

        // A renamed bundle leaves the old one behind. The new bundle is
        // already recorded, so failing to remove it is only a warning.
        if let Some(previous) = &previous
            && previous.install_path != state.install_path
        {
            debug!(
                old_path = ?previous.install_path,
                "Removing bundle from the previous version",
            );

            if let Err(error) =
                Uninstaller::new(self.env).uninstall(&UninstallTarget::from(previous))
            {
                warn!(
                    old_path = ?previous.install_path,
                    "Failed to remove the bundle from the previous version: {error}",
                );
            }
        }

        Ok(InstallOutcome::Installed { plan, state })
    }

    /// Remove the application bundle and receipt. Returns the removed
    /// receipt, or `None` if the cask was not installed.
    #[instrument(skip(self))]
    pub async fn uninstall(
        &self,
        id: &CaskId,
        lock_mode: LockMode,
    ) -> Result<Option<InstalledState>, CaskManageError> {
        let _guard = self
            .env
            .locks
            .acquire(&self.env.store, id, lock_mode)
            .await?;

        let Some(state) = self.env.store.load_receipt(id)? else {
            debug!("Not installed, nothing to uninstall");

            return Ok(None);
        };

        Installer::new(self.env).recover_interrupted(&InstallTarget::from_state(&state))?;
        Uninstaller::new(self.env).uninstall(&UninstallTarget::from(&state))?;

        self.env.store.remove_receipt(id)?;

        Ok(Some(state))
    }

    /// Uninstall and remove all declared per-user state. Cleanup paths come
    /// from the receipt, plus the manifest when one is provided. The receipt
    /// is kept when any path could not be removed, so zap can be retried.
    #[instrument(skip(self, cask))]
    pub async fn zap(
        &self,
        id: &CaskId,
        cask: Option<&Cask>,
        lock_mode: LockMode,
    ) -> Result<ZapReport, CaskManageError> {
        if let Some(cask) = cask
            && cask.id() != id
        {
            return Err(CaskManageError::MismatchedIdentifier {
                expected: id.to_string(),
                actual: cask.id().to_string(),
            });
        }

        let _guard = self
            .env
            .locks
            .acquire(&self.env.store, id, lock_mode)
            .await?;

        let state = self.env.store.load_receipt(id)?;

        let target = match (&state, cask) {
            (Some(state), Some(cask)) => {
                let mut target = UninstallTarget::from(state);
                target.merge_cleanup_paths(cask.cleanup_paths());
                target
            }
            (Some(state), None) => UninstallTarget::from(state),
            (None, Some(cask)) => UninstallTarget::from_cask(cask, &self.env.app_dir),
            (None, None) => {
                return Err(CaskManageError::NotInstalled { id: id.to_string() });
            }
        };

        if let Some(state) = &state {
            Installer::new(self.env).recover_interrupted(&InstallTarget::from_state(state))?;
        }

        let report = Uninstaller::new(self.env).zap(&target)?;

        self.env.store.remove_receipt(id)?;

        Ok(report)
    }

    /// All installed casks, sorted by identifier.
    pub fn list(&self) -> Result<Vec<InstalledState>, CaskManageError> {
        Ok(self.env.store.load_receipts()?)
    }
}
