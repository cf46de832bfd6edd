use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use solver::{SearchConfig, DEFAULT_LIVES};

/// Everything that can be configured for a run, read from a JSON file such as
/// `{"lives": 2, "termination": "exhaustive", "max_branches": 10000}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub lives: u32,
    #[serde(flatten)]
    pub search: SearchConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lives: DEFAULT_LIVES,
            search: SearchConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;

        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }
}
