//! Runtime configuration and startup validation.
//!
//! A [`Config`] is built exactly once at process entry, either from the
//! process environment ([`Config::from_env`]) or from a YAML file
//! ([`Config::load`]), and then passed explicitly to everything else.
//! Nothing below the entry point reads the environment.
//!
//! # Environment
//!
//! | variable        | default                  |
//! |-----------------|--------------------------|
//! | `POLL_TIME`     | `30` (seconds)           |
//! | `PROFILER_BIN`  | `/sbin/apparmor_parser`  |
//! | `PROFILES_DIR`  | `/app/profiles`          |
//! | `ETC_APPARMORD` | `/etc/apparmor.d/custom` |
//! | `LINK_STRATEGY` | `hardlink`               |

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

pub const ENV_POLL_TIME: &str = "POLL_TIME";
pub const ENV_PROFILER_BIN: &str = "PROFILER_BIN";
pub const ENV_PROFILES_DIR: &str = "PROFILES_DIR";
pub const ENV_TARGET_DIR: &str = "ETC_APPARMORD";
pub const ENV_LINK_STRATEGY: &str = "LINK_STRATEGY";

pub const DEFAULT_POLL_SECS: u64 = 30;
pub const DEFAULT_PROFILER_BIN: &str = "/sbin/apparmor_parser";
pub const DEFAULT_PROFILES_DIR: &str = "/app/profiles";
pub const DEFAULT_TARGET_DIR: &str = "/etc/apparmor.d/custom";

// ---------------------------------------------------------------------------
// LinkStrategy
// ---------------------------------------------------------------------------

/// How a missing or outdated destination file is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStrategy {
    /// Try a hard link first, fall back to a full copy.
    #[default]
    HardLink,
    /// Always write a full copy.
    Copy,
}

impl FromStr for LinkStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hardlink" | "hard-link" | "link" => Ok(Self::HardLink),
            "copy" => Ok(Self::Copy),
            other => Err(ConfigError::InvalidStrategy {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LinkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStrategy::HardLink => write!(f, "hardlink"),
            LinkStrategy::Copy => write!(f, "copy"),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Seconds between two sync passes of the daemon.
    pub poll_interval_secs: u64,
    /// Profiler binary that must be present on the host.
    pub profiler_bin: PathBuf,
    /// Source directory holding the profiles to mirror.
    pub profiles_dir: PathBuf,
    /// Managed target directory the profiles are mirrored into.
    pub target_dir: PathBuf,
    pub link_strategy: LinkStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_SECS,
            profiler_bin: PathBuf::from(DEFAULT_PROFILER_BIN),
            profiles_dir: PathBuf::from(DEFAULT_PROFILES_DIR),
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            link_strategy: LinkStrategy::default(),
        }
    }
}

impl Config {
    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Missing keys fall back to
    /// the defaults; present keys are validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_POLL_TIME) {
            config.poll_interval_secs = parse_poll_interval(&raw)?;
        }
        if let Some(bin) = lookup(ENV_PROFILER_BIN) {
            config.profiler_bin = PathBuf::from(bin);
        }
        if let Some(dir) = lookup(ENV_PROFILES_DIR) {
            config.profiles_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_TARGET_DIR) {
            config.target_dir = PathBuf::from(dir);
        }
        if let Some(strategy) = lookup(ENV_LINK_STRATEGY) {
            config.link_strategy = strategy.parse()?;
        }

        Ok(config)
    }

    /// Load a config from a YAML file. Omitted fields take their defaults.
    ///
    /// Returns `ConfigError::Parse` (with path + line context) if malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        if config.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval {
                value: "0".to_string(),
            });
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn parse_poll_interval(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidPollInterval {
            value: raw.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Preflight
// ---------------------------------------------------------------------------

/// What [`preflight`] had to do to make the host usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preflight {
    /// The target directory did not exist and was created.
    pub target_created: bool,
}

/// Validate the host against `config` before the first sync pass.
///
/// 1. The profiler binary must exist.
/// 2. The target directory is created (with parents) if missing.
pub fn preflight(config: &Config) -> Result<Preflight, ConfigError> {
    if !config.profiler_bin.exists() {
        return Err(ConfigError::ProfilerMissing {
            path: config.profiler_bin.clone(),
        });
    }

    let target = &config.target_dir;
    if target.exists() {
        if !target.is_dir() {
            return Err(io_err(
                target,
                std::io::Error::other("target path exists and is not a directory"),
            ));
        }
        return Ok(Preflight {
            target_created: false,
        });
    }

    std::fs::create_dir_all(target).map_err(|e| io_err(target, e))?;
    tracing::info!("directory {} created", target.display());
    Ok(Preflight {
        target_created: true,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
