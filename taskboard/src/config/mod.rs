//! Board configuration.
//!
//! Settings are layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard/config.toml`)
//! 4. Compiled defaults
//!
//! A missing default file falls back to defaults. A `--config` path that
//! does not exist fails the load.

use std::path::PathBuf;
use std::time::Duration;

use taskboard_proto::task::UserId;

use crate::coordinator::{CoordinatorConfig, DEFAULT_MUTATION_TIMEOUT};
use crate::worker::WorkerConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A date or time format string is not valid strftime syntax.
    #[error("invalid {key} {value:?}")]
    InvalidFormat {
        /// Config key holding the format.
        key: &'static str,
        /// The rejected format string.
        value: String,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// `config.toml` as written on disk.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    session: SessionFileConfig,
    sync: SyncFileConfig,
    ui: UiFileConfig,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    user_id: Option<String>,
    seed_file: Option<PathBuf>,
}

/// `[sync]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SyncFileConfig {
    mutation_timeout_ms: Option<u64>,
    remote_latency_ms: Option<u64>,
    channel_capacity: Option<usize>,
    notice_buffer: Option<usize>,
    log_capacity: Option<usize>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    date_format: Option<String>,
    time_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Board settings after merging every layer.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    // -- Session --
    /// Current user, used by the "assigned to me" filter.
    pub user_id: UserId,
    /// JSON seed for the in-memory remote. `None` uses the demo board.
    pub seed_file: Option<PathBuf>,

    // -- Sync --
    /// Deadline for each remote write.
    pub mutation_timeout: Duration,
    /// Artificial latency added by the in-memory remote.
    pub remote_latency: Duration,
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,
    /// Capacity of the rollback notice channel.
    pub notice_buffer: usize,
    /// Number of mutation records kept for the status bar.
    pub log_capacity: usize,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Date display format string (chrono).
    pub date_format: String,
    /// Time display format string (chrono).
    pub time_format: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            user_id: UserId::new("me"),
            seed_file: None,
            mutation_timeout: DEFAULT_MUTATION_TIMEOUT,
            remote_latency: Duration::from_millis(150),
            channel_capacity: 256,
            notice_buffer: 32,
            log_capacity: 64,
            poll_timeout: Duration::from_millis(50),
            date_format: "%Y-%m-%d".to_string(),
            time_format: "%H:%M".to_string(),
        }
    }
}

impl BoardConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// Otherwise the default path (`~/.config/taskboard/config.toml`) is
    /// tried and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed,
    /// or if a display format is not valid strftime syntax.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        let config = Self::resolve(cli, &file);
        check_format("date_format", &config.date_format)?;
        check_format("time_format", &config.time_format)?;
        Ok(config)
    }

    /// Resolve a `BoardConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            user_id: cli
                .user_id
                .clone()
                .or_else(|| file.session.user_id.clone())
                .map_or(defaults.user_id, UserId::new),
            seed_file: cli
                .seed
                .clone()
                .or_else(|| file.session.seed_file.clone()),
            mutation_timeout: cli
                .mutation_timeout_ms
                .or(file.sync.mutation_timeout_ms)
                .map_or(defaults.mutation_timeout, Duration::from_millis),
            remote_latency: cli
                .latency_ms
                .or(file.sync.remote_latency_ms)
                .map_or(defaults.remote_latency, Duration::from_millis),
            channel_capacity: file
                .sync
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            notice_buffer: file.sync.notice_buffer.unwrap_or(defaults.notice_buffer),
            log_capacity: file.sync.log_capacity.unwrap_or(defaults.log_capacity),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            date_format: file
                .ui
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
            time_format: file
                .ui
                .time_format
                .clone()
                .unwrap_or(defaults.time_format),
        }
    }

    /// Coordinator tunables from this configuration.
    #[must_use]
    pub const fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            mutation_timeout: self.mutation_timeout,
            log_capacity: self.log_capacity,
            notice_buffer: self.notice_buffer,
        }
    }

    /// Worker channel sizes from this configuration.
    #[must_use]
    pub const fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            channel_capacity: self.channel_capacity,
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal project board with optimistic sync")]
pub struct CliArgs {
    /// Your user id, for the "assigned to me" filter.
    #[arg(long, env = "TASKBOARD_USER")]
    pub user_id: Option<String>,

    /// JSON file with tasks and projects to seed the board.
    #[arg(long, env = "TASKBOARD_SEED")]
    pub seed: Option<PathBuf>,

    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Deadline for each remote write, in milliseconds.
    #[arg(long)]
    pub mutation_timeout_ms: Option<u64>,

    /// Artificial remote latency, in milliseconds.
    #[arg(long)]
    pub latency_ms: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskboard.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Rejects strftime strings chrono cannot render.
fn check_format(key: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = chrono::format::StrftimeItems::new(value)
        .any(|item| matches!(item, chrono::format::Item::Error));
    if invalid {
        return Err(ConfigError::InvalidFormat {
            key,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("taskboard").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
