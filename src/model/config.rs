use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Configuration from .chore/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoreConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Which persistence backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Remote,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Local => write!(f, "local"),
            Backend::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Backend::Local),
            "remote" => Ok(Backend::Remote),
            other => Err(format!(
                "unknown backend '{}' (expected local or remote)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Storage key holding the serialized item list
    #[serde(default = "default_local_key")]
    pub key: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        LocalConfig {
            key: default_local_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Database document, relative to .chore/ unless absolute
    #[serde(default = "default_database")]
    pub database: String,
    /// Collection node holding one child per item
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            database: default_database(),
            collection: default_collection(),
        }
    }
}

fn default_local_key() -> String {
    "todo-items-v1".to_string()
}

fn default_database() -> String {
    "realtime.json".to_string()
}

fn default_collection() -> String {
    "todos".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Color overrides by theme slot name, as "#RRGGBB"
    #[serde(default)]
    pub colors: HashMap<String, String>,
}
