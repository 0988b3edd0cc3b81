//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use heat_core::roster::DEFAULT_MAX_COMPETITORS;
use heat_core::{Discipline, ResultOrder};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Discipline used when `--discipline` is not given.
    pub discipline: Discipline,

    /// Gap between automatic starts, in seconds.
    pub gap_seconds: u32,

    /// How often the session loop refreshes, in milliseconds.
    pub tick_interval_ms: u64,

    /// Default ordering of the results table.
    pub results_order: ResultOrder,

    /// Largest roster accepted.
    pub max_competitors: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discipline: Discipline::Manual,
            gap_seconds: 10,
            tick_interval_ms: 100,
            results_order: ResultOrder::Start,
            max_competitors: DEFAULT_MAX_COMPETITORS,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (HEAT_*)
        figment = figment.merge(Env::prefixed("HEAT_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for heat.
///
/// On Linux: `~/.config/heat`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("heat"))
}
