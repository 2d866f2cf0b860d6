//! Connection settings: command-line flags, `DKRON_*` environment
//! variables, then an optional TOML profile.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use dkron_core::config::DEFAULT_PORT;
use dkron_core::EndpointConfig;
use serde::{Deserialize, Serialize};

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// IP or hostname of a node in the cluster
    #[arg(long, env = "DKRON_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Port of the cluster node's HTTP API
    #[arg(long, env = "DKRON_PORT", global = true)]
    pub port: Option<u16>,

    /// Basic-auth username, when the cluster sits behind an authenticating proxy
    #[arg(long, env = "DKRON_USERNAME", global = true)]
    pub username: Option<String>,

    /// Basic-auth password
    #[arg(long, env = "DKRON_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Connect over HTTPS
    #[arg(long, env = "DKRON_USE_SSL", global = true)]
    pub use_ssl: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "DKRON_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,
}

/// Connection defaults read from a profile file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub endpoint: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub use_ssl: bool,
    pub timeout_secs: Option<u64>,
}

impl Profile {
    /// Read `path`, or the default location when `path` is `None`. A missing
    /// default file yields an empty profile; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        let profile = toml::from_str(&contents)
            .with_context(|| format!("parsing profile {}", path.display()))?;
        Ok(profile)
    }

    fn default_path() -> Option<PathBuf> {
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".config/dkron/ctl.toml"))
    }
}

impl ConnectionArgs {
    /// Flags win over the profile; the port falls back to the API default.
    pub fn resolve(self, profile: Profile) -> EndpointConfig {
        EndpointConfig {
            host: self.endpoint.or(profile.endpoint).unwrap_or_default(),
            port: self.port.or(profile.port).unwrap_or(DEFAULT_PORT),
            use_tls: self.use_ssl || profile.use_ssl,
            username: self.username.or(profile.username),
            password: self.password.or(profile.password),
            timeout: self
                .timeout_secs
                .or(profile.timeout_secs)
                .map(Duration::from_secs),
        }
    }
}
