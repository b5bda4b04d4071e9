use crate::checksum::Checksum;
use crate::id::CaskId;
use crate::manifest::{AppArtifact, CleanupPath};
use crate::version::CaskVersion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Record of an installed cask, persisted as `receipts/<identifier>.json`.
/// Only read or written while holding the identifier's install lock.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct InstalledState {
    pub identifier: CaskId,
    pub name: String,
    pub version: CaskVersion,
    pub install_path: PathBuf,
    pub installed_at: u128,
    #[serde(default)]
    pub auto_updates: bool,
    pub checksum: Checksum,
    pub url: String,
    pub artifact: AppArtifact,
    #[serde(default)]
    pub cleanup_paths: Vec<CleanupPath>,
}
