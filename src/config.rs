use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_VERSION: u64 = 1;
const CONFIG_FILE: &str = "config.json";

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("daybook")
}

fn default_table() -> String {
    "tasks".into()
}

/// Hosted task table settings. An empty `url` means no remote.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub url: String,
    /// Usually left empty; the key is kept in the system keyring.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DaybookConfig {
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default = "default_data_dir")]
    pub data_directory: PathBuf,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_version() -> u64 {
    CONFIG_VERSION
}

impl Default for DaybookConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data_directory: default_data_dir(),
            remote: RemoteConfig {
                table: default_table(),
                ..RemoteConfig::default()
            },
            debug_logging: false,
        }
    }
}

impl DaybookConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("daybook")
            .join(CONFIG_FILE)
    }

    /// Read `path`, falling back to defaults when it is missing or invalid,
    /// then apply environment overrides.
    pub fn load(path: &Path) -> Self {
        let mut config = Self::load_file(path);
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// The file's values alone, without environment overrides.
    pub fn load_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        if let Some(dir) = non_empty("DAYBOOK_DATA_DIR") {
            self.data_directory = PathBuf::from(dir);
        }
        if let Some(url) = non_empty("DAYBOOK_REMOTE_URL") {
            self.remote.url = url;
        }
        if let Some(key) = non_empty("DAYBOOK_REMOTE_KEY") {
            self.remote.api_key = key;
        }
    }

    pub fn cache_directory(&self) -> PathBuf {
        self.data_directory.join("cache")
    }

    /// The configured remote URL, which also keys its API key in the keyring.
    pub fn remote_server(&self) -> Option<&str> {
        Some(self.remote.url.trim()).filter(|url| !url.is_empty())
    }

    /// Ensure the data and cache directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.cache_directory())
    }
}
