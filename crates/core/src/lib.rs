mod cancel;
pub mod checksum;
mod config;
mod config_error;
mod env;
mod env_error;
pub mod flow;
mod helpers;
mod id;
pub mod layout;
mod manifest;
mod manifest_error;
mod os;
pub mod utils;
mod version;

pub use cancel::*;
pub use checksum::{Checksum, CaskChecksumError};
pub use config::*;
pub use config_error::*;
pub use env::*;
pub use env_error::*;
pub use helpers::*;
pub use id::*;
pub use manifest::*;
pub use manifest_error::*;
pub use os::*;
pub use version::*;

pub use flow::fetch::{CaskFetchError, FetchOptions, Fetcher, VerifiedArtifact};
pub use flow::install::{CaskInstallError, InstallPlan, InstallTarget, Installer, SkipReason};
pub use flow::lock::{CaskLockError, InstallLocks, LockGuard, LockMode};
pub use flow::manage::{CaskManageError, FailureClass, InstallOptions, InstallOutcome, Manager};
pub use flow::resolve::{CaskResolveError, Resolver};
pub use flow::uninstall::{CaskUninstallError, UninstallTarget, Uninstaller, ZapReport};
pub use layout::{CaskLayoutError, InstalledState, Store};
