use crate::config::CaskConfig;
use crate::env_error::CaskEnvError;
use crate::flow::lock::InstallLocks;
use crate::layout::Store;
use crate::os::HostOs;
use starbase_utils::dirs::home_dir;
use starbase_utils::env::path_var;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_APP_DIR: &str = "/Applications";

#[derive(Clone)]
pub struct CaskEnvironment {
    pub app_dir: PathBuf,
    pub config: CaskConfig,
    pub home_dir: PathBuf, // ~
    pub host_os: HostOs,
    pub locks: Arc<InstallLocks>,
    pub store: Store,
    pub test_only: bool,
}

impl CaskEnvironment {
    pub fn new() -> miette::Result<Self> {
        let home = home_dir().ok_or(CaskEnvError::MissingHomeDir)?;
        let mut root = path_var("CASK_HOME").unwrap_or_else(|| home.join(".cask"));

        if let Ok(rel_root) = root.strip_prefix("~") {
            root = home.join(rel_root);
        }

        Self::from(root, home)
    }

    pub fn new_testing(sandbox: &Path) -> miette::Result<Self> {
        let mut env = Self::from(sandbox.join(".cask"), sandbox.join(".home"))?;
        env.app_dir = sandbox.join("Applications");
        env.test_only = true;

        Ok(env)
    }

    pub fn from<R: AsRef<Path>, H: AsRef<Path>>(root: R, home: H) -> miette::Result<Self> {
        let root = root.as_ref();
        let home = home.as_ref();

        debug!(
            store = ?root,
            home = ?home,
            "Creating cask environment, detecting store",
        );

        let config = CaskConfig::load_from(root)?;

        // Env var > config > default
        let app_dir = path_var("CASK_APP_DIR")
            .or_else(|| config.app_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_APP_DIR));

        Ok(CaskEnvironment {
            app_dir,
            home_dir: home.to_owned(),
            host_os: HostOs::detect()?,
            locks: Arc::new(InstallLocks::default()),
            store: Store::new(root),
            test_only: env::var("CASK_TEST").is_ok(),
            config,
        })
    }
}

impl AsRef<CaskEnvironment> for CaskEnvironment {
    fn as_ref(&self) -> &CaskEnvironment {
        self
    }
}

impl fmt::Debug for CaskEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaskEnvironment")
            .field("app_dir", &self.app_dir)
            .field("config", &self.config)
            .field("home_dir", &self.home_dir)
            .field("host_os", &self.host_os)
            .field("store", &self.store)
            .field("test_only", &self.test_only)
            .finish()
    }
}
