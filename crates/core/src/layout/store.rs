use super::layout_error::CaskLayoutError;
use super::receipt::InstalledState;
use crate::id::CaskId;
use starbase_utils::{fs, json};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

#[derive(Clone, Debug)]
pub struct Store {
    pub dir: PathBuf,
    pub locks_dir: PathBuf,
    pub receipts_dir: PathBuf,
    pub temp_dir: PathBuf,
}

impl Store {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            locks_dir: dir.join("locks"),
            receipts_dir: dir.join("receipts"),
            temp_dir: dir.join("temp"),
        }
    }

    pub fn get_lock_dir(&self, id: &CaskId) -> PathBuf {
        self.locks_dir.join(id.as_str())
    }

    pub fn get_receipt_path(&self, id: &CaskId) -> PathBuf {
        self.receipts_dir.join(format!("{id}.json"))
    }

    /// Create a unique path in the temp directory for a download.
    pub fn create_temp_path(&self, file_name: &str) -> Result<PathBuf, CaskLayoutError> {
        fs::create_dir_all(&self.temp_dir)?;

        Ok(self
            .temp_dir
            .join(format!("{}.{file_name}.part", uuid::Uuid::new_v4().simple())))
    }

    #[instrument(skip(self))]
    pub fn load_receipt(&self, id: &CaskId) -> Result<Option<InstalledState>, CaskLayoutError> {
        let path = self.get_receipt_path(id);

        if !path.exists() {
            return Ok(None);
        }

        debug!(file = ?path, "Loading install receipt");

        let content = fs::read_file(&path)?;
        let state: InstalledState =
            serde_json::from_str(&content).map_err(|error| CaskLayoutError::InvalidReceipt {
                path: path.clone(),
                error: Box::new(error),
            })?;

        Ok(Some(state))
    }

    /// Write the receipt to a sibling temp file first, then rename it over
    /// the previous receipt, so readers never observe a partial record.
    #[instrument(skip_all)]
    pub fn save_receipt(&self, state: &InstalledState) -> Result<(), CaskLayoutError> {
        let path = self.get_receipt_path(&state.identifier);
        let temp_path = self.receipts_dir.join(format!(
            ".{}.{}.tmp",
            state.identifier,
            uuid::Uuid::new_v4().simple()
        ));

        debug!(file = ?path, version = %state.version, "Saving install receipt");

        json::write_file(&temp_path, state, true)?;

        if let Err(error) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);

            return Err(error.into());
        }

        Ok(())
    }

    /// Remove the receipt, returning whether one existed.
    pub fn remove_receipt(&self, id: &CaskId) -> Result<bool, CaskLayoutError> {
        let path = self.get_receipt_path(id);

        if !path.exists() {
            return Ok(false);
        }

        debug!(file = ?path, "Removing install receipt");

        fs::remove_file(&path)?;

        Ok(true)
    }

    /// Load every receipt in the store, sorted by identifier. Corrupt
    /// receipts are skipped with a warning.
    #[instrument(skip(self))]
    pub fn load_receipts(&self) -> Result<Vec<InstalledState>, CaskLayoutError> {
        let mut receipts = vec![];

        if !self.receipts_dir.exists() {
            return Ok(receipts);
        }

        for entry in fs::read_dir(&self.receipts_dir)? {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };

            if file_name.starts_with('.') || !file_name.ends_with(".json") {
                continue;
            }

            let Ok(id) = CaskId::new(file_name.trim_end_matches(".json")) else {
                continue;
            };

            match self.load_receipt(&id) {
                Ok(Some(state)) => receipts.push(state),
                Ok(None) => {}
                Err(error) => {
                    warn!(file = ?path, "Skipping unreadable receipt: {error}");
                }
            };
        }

        receipts.sort_by(|a, b| a.identifier.as_str().cmp(b.identifier.as_str()));

        Ok(receipts)
    }
}
