//! Configuration
//!
//! Centralized configuration for the chat client, loaded from a TOML file
//! at `~/.config/cortex/cortex.toml` with environment overrides.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. Environment variables (`CORTEX_BASE_URL`, `CORTEX_TTS_VOICE`,
//!    `CORTEX_TTS_LANG`)
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8000"
//!
//! [speech]
//! voice = "af_heart"
//! lang_code = "a"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{DEFAULT_LANG_CODE, DEFAULT_VOICE};
use crate::speech::VoiceSettings;

/// Default backend base URL when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Backend base URL
    pub base_url: Option<String>,
}

/// Speech section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechToml {
    /// Synthesis voice
    pub voice: Option<String>,
    /// Language code
    pub lang_code: Option<String>,
}

/// Raw TOML configuration file structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CortexToml {
    /// Backend settings
    pub backend: BackendToml,
    /// Speech settings
    pub speech: SpeechToml,
}

/// Resolved configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CortexConfig {
    /// Backend base URL (no trailing slash)
    pub base_url: String,
    /// Synthesis voice
    pub voice: String,
    /// Synthesis language code
    pub lang_code: String,
}

impl Default for CortexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            lang_code: DEFAULT_LANG_CODE.to_string(),
        }
    }
}

impl CortexConfig {
    /// Load configuration from the default path and the environment
    ///
    /// A missing config file is not an error; a malformed one is logged and
    /// ignored so the client still starts.
    pub fn load() -> Self {
        let file = default_config_path().and_then(|path| {
            if !path.exists() {
                return None;
            }
            match load_config_from_path(&path) {
                Ok(toml) => Some(toml),
                Err(error) => {
                    tracing::warn!(%error, path = %path.display(), "Ignoring malformed config");
                    None
                }
            }
        });
        Self::from_sources(file)
    }

    /// Resolve configuration from an optional file, then apply environment
    /// overrides
    pub fn from_sources(file: Option<CortexToml>) -> Self {
        let mut config = Self::default();

        if let Some(toml) = file {
            if let Some(base_url) = toml.backend.base_url {
                config.base_url = base_url;
            }
            if let Some(voice) = toml.speech.voice {
                config.voice = voice;
            }
            if let Some(lang_code) = toml.speech.lang_code {
                config.lang_code = lang_code;
            }
        }

        if let Ok(base_url) = std::env::var("CORTEX_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(voice) = std::env::var("CORTEX_TTS_VOICE") {
            config.voice = voice;
        }
        if let Ok(lang_code) = std::env::var("CORTEX_TTS_LANG") {
            config.lang_code = lang_code;
        }

        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }
        config
    }

    /// The speech settings portion of the configuration
    pub fn voice_settings(&self) -> VoiceSettings {
        VoiceSettings {
            voice: self.voice.clone(),
            lang_code: self.lang_code.clone(),
        }
    }
}

/// Default configuration file path (XDG config directory)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cortex").join("cortex.toml"))
}

/// Load and parse a configuration file
pub fn load_config_from_path(path: &std::path::Path) -> Result<CortexToml, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&data)?)
}
