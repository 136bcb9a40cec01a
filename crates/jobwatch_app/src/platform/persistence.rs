use std::fs;
use std::path::{Path, PathBuf};

use jobwatch_core::Theme;
use jobwatch_engine::{write_atomically, PersistError};
use jobwatch_logging::{jobwatch_error, jobwatch_info, jobwatch_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to serialize client state: {0}")]
    Serialize(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Scalars remembered between runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientState {
    pub last_job_id: Option<String>,
    pub scenario_id: Option<String>,
    pub theme: Option<String>,
}

impl ClientState {
    /// Unknown theme names fall back to the default.
    pub fn theme(&self) -> Theme {
        self.theme
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default()
    }
}

/// Client state file with read-modify-write helpers. Failures are logged and
/// never interrupt the watch loop.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ClientState {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return ClientState::default();
            }
            Err(err) => {
                jobwatch_warn!("Failed to read client state from {:?}: {}", self.path, err);
                return ClientState::default();
            }
        };

        match ron::from_str(&content) {
            Ok(state) => {
                jobwatch_info!("Loaded client state from {:?}", self.path);
                state
            }
            Err(err) => {
                jobwatch_warn!("Failed to parse client state from {:?}: {}", self.path, err);
                ClientState::default()
            }
        }
    }

    pub fn save(&self, state: &ClientState) -> Result<(), StateError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(state, pretty)
            .map_err(|err| StateError::Serialize(err.to_string()))?;
        write_atomically(&self.path, content.as_bytes())?;
        Ok(())
    }

    pub fn remember_job(&self, job_id: Option<String>) {
        self.modify(|state| state.last_job_id = job_id);
    }

    pub fn remember_scenario(&self, scenario_id: String) {
        self.modify(|state| state.scenario_id = Some(scenario_id));
    }

    pub fn remember_theme(&self, theme: Theme) {
        self.modify(|state| state.theme = Some(theme.as_str().to_string()));
    }

    fn modify(&self, edit: impl FnOnce(&mut ClientState)) {
        let mut state = self.load();
        edit(&mut state);
        if let Err(err) = self.save(&state) {
            jobwatch_error!("Failed to write client state to {:?}: {}", self.path, err);
        }
    }
}
