use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};

/// Contents of `.git/config`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(default)]
    pub core: CoreConfig,
}

/// The `[core]` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub repositoryformatversion: u32,
    pub filemode: bool,
    pub bare: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            repositoryformatversion: 0,
            filemode: false,
            bare: false,
        }
    }
}

impl RepoConfig {
    /// Parse a config document.
    pub fn from_toml(text: &str) -> RepoResult<Self> {
        toml::from_str(text).map_err(|e| RepoError::Config(e.to_string()))
    }

    /// Render the config as a TOML document.
    pub fn to_toml(&self) -> RepoResult<String> {
        toml::to_string(self).map_err(|e| RepoError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> RepoResult<Self> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> RepoResult<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}
