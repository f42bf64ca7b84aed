use std::path::{Path, PathBuf};
use std::time::Duration;

use repo_tree::{DEFAULT_BRANCH, GITHUB_ARCHIVE_BASE};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Server settings, read from `server.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for every path other than `/tree` and `/healthz`.
    pub static_dir: PathBuf,
    /// Parent of the per-request scratch directories. Defaults to the OS temp dir.
    pub scratch_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub branch: String,
    pub archive_base_url: String,
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            static_dir: PathBuf::from("../frontend"),
            scratch_dir: None,
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
            branch: DEFAULT_BRANCH.into(),
            archive_base_url: GITHUB_ARCHIVE_BASE.into(),
            user_agent: "repo-tree".into(),
        }
    }
}

/// Values given on the command line; each one wins over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
    pub scratch_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
}

impl ServerConfig {
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(static_dir) = overrides.static_dir {
            self.static_dir = static_dir;
        }
        if let Some(scratch_dir) = overrides.scratch_dir {
            self.scratch_dir = Some(scratch_dir);
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Config file path: `~/.config/repo-tree/server.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("repo-tree").join("server.toml"))
}

/// Load config from `path` (or the default location), falling back to
/// defaults if the file is missing or does not parse.
pub fn load_config(path: Option<&Path>) -> ServerConfig {
    let path = path.map(Path::to_path_buf).or_else(config_path);

    if let Some(path) = path
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        match toml::from_str::<ServerConfig>(&contents) {
            Ok(config) => return config,
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config, using defaults"
            ),
        }
    }

    ServerConfig::default()
}
