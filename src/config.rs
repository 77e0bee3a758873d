//! Server configuration.
//!
//! A [`Config`] is built once at startup, from defaults, an optional YAML
//! file and command-line flags (in increasing order of precedence), and is
//! then handed to the bootstrap, the reactor and the dispatcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Deserialize;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

/// Listening socket, worker and reactor settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Total number of worker processes, the parent included.
    pub workers: usize,
    pub backlog: i32,
    /// Upper bound on a single readiness wait.
    pub poll_timeout_secs: u64,
    pub events_capacity: usize,
    /// Largest header block accepted before answering 400.
    pub max_header_bytes: usize,
    /// Value of the `Server` response header.
    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            workers: 1,
            backlog: 128,
            poll_timeout_secs: 5,
            events_capacity: 1024,
            max_header_bytes: 64 * 1024,
            server_name: "beacon".to_string(),
        }
    }
}

/// Document root and body streaming settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    pub index_file: String,
    pub chunk_size: usize,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            index_file: "index.html".to_string(),
            chunk_size: crate::http::producer::CHUNK_SIZE,
        }
    }
}

/// Command-line flags. Anything left unset falls back to the config file,
/// then to the built-in defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "beacon")]
#[command(about = "Simple asynchronous web-server")]
#[command(version)]
pub struct CliArgs {
    /// Address to listen on
    #[arg(long, env = "BEACON_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "BEACON_PORT")]
    pub port: Option<u16>,

    /// Number of worker processes
    #[arg(short = 'w', long = "workers")]
    pub workers: Option<usize>,

    /// Document root
    #[arg(short = 'r', long = "root")]
    pub document_root: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short = 'c', long = "config", env = "BEACON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            workers: None,
            document_root: None,
            config: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Builds the effective configuration for a command line.
    pub fn load(args: &CliArgs) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(host) = &args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(workers) = args.workers {
            self.server.workers = workers;
        }
        if let Some(root) = &args.document_root {
            self.static_files.root = root.clone();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.workers == 0 {
            bail!("worker count must be at least 1");
        }
        if self.static_files.chunk_size == 0 {
            bail!("chunk size must be greater than zero");
        }
        if self.server.poll_timeout_secs == 0 {
            bail!("poll timeout must be greater than zero");
        }
        if self.server.events_capacity == 0 {
            bail!("events capacity must be greater than zero");
        }
        if self.server.max_header_bytes == 0 {
            bail!("header size limit must be greater than zero");
        }
        Ok(())
    }

    /// `host:port` as given, suitable for `ToSocketAddrs`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}
