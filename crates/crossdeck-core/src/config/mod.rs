//! Console configuration

mod io;

pub use io::{load_config, save_config};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;

/// Top-level configuration for the mixing console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Audio backend settings (device, buffer size, sample rate)
    #[serde(default)]
    pub audio: AudioConfig,

    /// Where session recordings are written (None = ~/Music/crossdeck)
    #[serde(default)]
    pub recording_dir: Option<PathBuf>,
}

impl ConsoleConfig {
    /// Directory for session recordings, resolving the default
    pub fn recording_dir(&self) -> PathBuf {
        if let Some(dir) = &self.recording_dir {
            return dir.clone();
        }
        dirs::audio_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crossdeck")
    }
}

/// Default location of the console config file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crossdeck")
        .join("config.yaml")
}
