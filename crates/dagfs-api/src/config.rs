use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// Where the daemon's API listens. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5001,
            base_path: "/api/v0".into(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn load(path: impl AsRef<Path>) -> ApiResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> ApiResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// `http://host:port/api/v0`, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.host,
            self.port,
            self.base_path.trim_end_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
