// Per-user settings. The file lives at `~/.evm-runners/.env` and holds flat
// `KEY="value"` lines. It is read fully, mutated in memory and rewritten
// wholesale; there is only ever one CLI process touching it.

use crate::error::CliError;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER: &str = "https://evm-runners.fly.dev/";

const CONFIG_DIR: &str = ".evm-runners";
const CONFIG_FILE: &str = ".env";
const LEVELS_DIR: &str = "evm-runners-levels";

const KEY_SERVER: &str = "EVMR_SERVER";
const KEY_TOKEN: &str = "EVMR_TOKEN";
const KEY_ID: &str = "EVMR_ID";
const KEY_NAME: &str = "EVMR_NAME";
const KEY_LEVELS_DIR: &str = "EVMR_LEVELS_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server: String,
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    pub levels_dir: PathBuf,
}

impl Config {
    /// Fresh config for `init`, pointing at the default levels checkout
    /// inside `config_dir`.
    pub fn new_in(config_dir: &Path) -> Self {
        Config {
            server: DEFAULT_SERVER.to_string(),
            token: String::new(),
            user_id: String::new(),
            user_name: String::new(),
            levels_dir: config_dir.join(LEVELS_DIR),
        }
    }

    /// `~/.evm-runners`, falling back to the working directory when no
    /// home directory can be determined.
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::NotInitialized(path.to_path_buf()).into());
        }

        let mut config = Config {
            server: DEFAULT_SERVER.to_string(),
            token: String::new(),
            user_id: String::new(),
            user_name: String::new(),
            levels_dir: PathBuf::new(),
        };

        let entries = dotenvy::from_path_iter(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        for entry in entries {
            let (key, value) =
                entry.with_context(|| format!("Failed to parse config file {}", path.display()))?;
            match key.as_str() {
                KEY_SERVER if !value.is_empty() => config.server = value,
                KEY_TOKEN => config.token = value,
                KEY_ID => config.user_id = value,
                KEY_NAME => config.user_name = value,
                KEY_LEVELS_DIR => config.levels_dir = PathBuf::from(value),
                _ => tracing::debug!(%key, "ignoring unknown config key"),
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let levels_dir = self.levels_dir.to_string_lossy();
        let lines = [
            (KEY_SERVER, self.server.as_str()),
            (KEY_TOKEN, self.token.as_str()),
            (KEY_ID, self.user_id.as_str()),
            (KEY_NAME, self.user_name.as_str()),
            (KEY_LEVELS_DIR, levels_dir.as_ref()),
        ];
        let contents: String = lines
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"\n", key, quote(value)))
            .collect();

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config written");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    /// Authenticated commands call this before touching the server.
    pub fn require_auth(&self) -> Result<(), CliError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(CliError::NotAuthenticated)
        }
    }

    /// The levels checkout must exist for anything that reads levels.
    pub fn require_levels_dir(&self) -> Result<&Path, CliError> {
        if self.levels_dir.as_os_str().is_empty() || !self.levels_dir.is_dir() {
            return Err(CliError::LevelsDirMissing(self.levels_dir.clone()));
        }
        Ok(&self.levels_dir)
    }
}

// Escapes for double-quoted dotenv values: backslash, quote and `$`
// (dotenvy expands variables inside double quotes).
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
