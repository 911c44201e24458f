//! Atomic load/save of the engine state file.

use crate::error::PersistenceResult;
use chrono::Utc;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use tradesmart_core::EngineState;

/// Store for the single engine state document.
///
/// Save is only ever called under the engine mutex, so the file has a
/// single writer for the lifetime of the process.
pub struct StateStore {
    path: PathBuf,
    initial_balance: Decimal,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, initial_balance: Decimal) -> Self {
        Self {
            path: path.into(),
            initial_balance,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state.
    ///
    /// An absent file yields a fresh default state. An unparseable file
    /// is renamed to `<name>.corrupted.<yyyymmddhhmmss>` and a fresh
    /// state is returned; only a hard IO failure is an error.
    pub fn load(&self) -> PersistenceResult<EngineState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state file, starting fresh");
                return Ok(EngineState::new(self.initial_balance));
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<EngineState>(&content) {
            Ok(state) => {
                info!(
                    path = %self.path.display(),
                    open = state.open_positions.len(),
                    closed = state.closed_positions.len(),
                    "Loaded engine state"
                );
                Ok(state)
            }
            Err(e) => {
                let backup = self.backup_path();
                error!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    %e,
                    "State file corrupt, backing it up and starting fresh"
                );
                if let Err(rename_err) = fs::rename(&self.path, &backup) {
                    warn!(%rename_err, "Failed to back up corrupt state file");
                }
                Ok(EngineState::new(self.initial_balance))
            }
        }
    }

    /// Persist the full state atomically.
    ///
    /// Serializes to a sibling `.tmp` file, then renames over the target
    /// so a partial write never clobbers the previous good file.
    pub fn save(&self, state: &EngineState) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state".to_string());
        self.path
            .with_file_name(format!("{name}.corrupted.{timestamp}"))
    }
}
