/// Player configuration
use crate::error::{PlayerError, Result};
use nova_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "nova.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

/// Behaviour of the simulated media engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Base URL the primary `yt_audio` locators point at
    #[serde(default = "default_source_endpoint")]
    pub source_endpoint: String,

    /// Time a prepare takes to complete
    #[serde(default = "default_prepare_delay_ms")]
    pub prepare_delay_ms: u64,

    /// Duration reported for every track
    #[serde(default = "default_track_duration_secs")]
    pub track_duration_secs: u64,

    /// Locators containing any of these fragments fail to prepare
    #[serde(default)]
    pub failing_locators: Vec<String>,

    /// Advertise incremental playlist edits
    #[serde(default)]
    pub incremental_queue_edits: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (NOVA_PLAYBACK__PREPARE_TIMEOUT_MS=...)
        settings = settings.add_source(
            config::Environment::with_prefix("NOVA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlayerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PlayerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.max_attach_attempts == 0 {
            return Err(PlayerError::Config(
                "max_attach_attempts must be at least 1".to_string(),
            ));
        }

        if self.playback.event_capacity == 0 {
            return Err(PlayerError::Config(
                "event_capacity must be at least 1".to_string(),
            ));
        }

        if self.simulation.track_duration_secs == 0 {
            return Err(PlayerError::Config(
                "simulation.track_duration_secs must be at least 1".to_string(),
            ));
        }

        if self.simulation.prepare_delay_ms >= self.playback.prepare_timeout_ms {
            tracing::warn!(
                "Simulated prepare delay ({} ms) exceeds the prepare timeout ({} ms); every track will time out",
                self.simulation.prepare_delay_ms,
                self.playback.prepare_timeout_ms
            );
        }

        Ok(())
    }
}

// Default values
fn default_source_endpoint() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_prepare_delay_ms() -> u64 {
    250
}

fn default_track_duration_secs() -> u64 {
    180
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            source_endpoint: default_source_endpoint(),
            prepare_delay_ms: default_prepare_delay_ms(),
            track_duration_secs: default_track_duration_secs(),
            failing_locators: Vec::new(),
            incremental_queue_edits: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_playback::RepeatMode;
    use std::io::Write;

    #[test]
    fn test_loads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[playback]
prepare_timeout_ms = 5000
fallback_endpoint = "http://backend.invalid"
repeat = "all"

[simulation]
prepare_delay_ms = 10
failing_locators = ["video_id=broken"]
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.playback.prepare_timeout_ms, 5000);
        assert_eq!(
            config.playback.fallback_endpoint.as_deref(),
            Some("http://backend.invalid")
        );
        assert_eq!(config.playback.repeat, RepeatMode::All);
        // Unset fields keep their defaults
        assert_eq!(config.playback.max_attach_attempts, 2);
        assert_eq!(config.simulation.prepare_delay_ms, 10);
        assert_eq!(config.simulation.track_duration_secs, 180);
        assert_eq!(config.simulation.failing_locators, vec!["video_id=broken"]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/nova.toml")));
        assert!(matches!(result, Err(PlayerError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.playback.max_attach_attempts = 0;
        assert!(config.validate().is_err());
    }
}
