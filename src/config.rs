use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:42069";
pub const DEFAULT_VIDEO_PATH: &str = "assets/vim.mp4";

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "HTTPFROMTCP_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the server binds, e.g. "0.0.0.0:42069"
    pub listen_addr: String,
    /// File served by the `/video` route
    pub video_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            video_path: DEFAULT_VIDEO_PATH.to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// If `HTTPFROMTCP_CONFIG` names a YAML file it is read first; `LISTEN`
    /// and `VIDEO_PATH` then override individual fields.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };

        if let Some(listen_addr) = lookup("LISTEN") {
            cfg.listen_addr = listen_addr;
        }
        if let Some(video_path) = lookup("VIDEO_PATH") {
            cfg.video_path = video_path;
        }

        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parses YAML; omitted fields keep their defaults.
    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}
