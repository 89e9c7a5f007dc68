//! Server configuration.
//!
//! Configuration is read from a YAML document. The listen address can be
//! overridden with the `LISTEN` environment variable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_CONFIG_PATH: &str = "triton.yaml";

/// Seconds a connection may sit idle before a new request starts arriving.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Host name to document root, as written in the file.
    #[serde(default)]
    pub virtual_hosts: HashMap<String, PathBuf>,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            idle_timeout_secs: default_idle_timeout_secs(),
            virtual_hosts: HashMap::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from `TRITON_CONFIG` (or `triton.yaml`).
    ///
    /// A missing file is not an error; the defaults are used instead.
    pub fn load() -> Result<Self> {
        let path = std::env::var("TRITON_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    /// Loads `path`, falling back to the defaults if it does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::read(path.as_ref(), true)
    }

    /// Loads `path`, which must exist.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::read(path.as_ref(), false)
    }

    fn read(path: &Path, missing_ok: bool) -> Result<Self> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))?,
            Err(e) if missing_ok && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file {}", path.display()));
            }
        };

        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.listen_addr = addr;
        }

        Ok(cfg)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Read-only table mapping host names to canonical document roots.
///
/// Built once at startup and shared by every connection behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct VirtualHosts {
    roots: HashMap<String, PathBuf>,
}

impl VirtualHosts {
    /// Validates every document root and builds the table.
    ///
    /// Each root must exist and be a directory. Roots are canonicalized so
    /// containment checks compare resolved paths, and host names are
    /// lower-cased.
    pub fn load(hosts: &HashMap<String, PathBuf>) -> Result<Self> {
        let mut roots = HashMap::with_capacity(hosts.len());

        for (host, doc_root) in hosts {
            let meta = std::fs::metadata(doc_root).with_context(|| {
                format!("doc root for host {} does not exist: {}", host, doc_root.display())
            })?;

            if !meta.is_dir() {
                anyhow::bail!(
                    "doc root for host {} is not a directory: {}",
                    host,
                    doc_root.display()
                );
            }

            let canonical = doc_root.canonicalize().with_context(|| {
                format!("Failed to resolve doc root for host {}", host)
            })?;

            roots.insert(host.to_ascii_lowercase(), canonical);
        }

        Ok(Self { roots })
    }

    pub fn doc_root(&self, host: &str) -> Option<&Path> {
        self.roots
            .get(&host.to_ascii_lowercase())
            .map(|p| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
