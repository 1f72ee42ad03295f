use crate::ring::{
    HIGHLIGHT_DURATION, HIGHLIGHT_SCALE, MAX_TRANSITION, SCROLL_DURATION, SELECT_DURATION,
};
use crate::sys::Ease;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RingConfig {
    pub scroll_duration_ms: u64,
    pub select_duration_ms: u64,
    pub highlight_duration_ms: u64,
    pub max_transition_ms: u64,
    pub highlight_scale: f64,
    pub scroll_ease: Ease,
    pub select_ease: Ease,
    /// Let scroll frames move the highlight before the tween settles.
    pub live_highlight_during_scroll: bool,
    pub initial_index: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            scroll_duration_ms: SCROLL_DURATION.as_millis() as u64,
            select_duration_ms: SELECT_DURATION.as_millis() as u64,
            highlight_duration_ms: HIGHLIGHT_DURATION.as_millis() as u64,
            max_transition_ms: MAX_TRANSITION.as_millis() as u64,
            highlight_scale: HIGHLIGHT_SCALE,
            scroll_ease: Ease::EaseOut,
            select_ease: Ease::EaseOut,
            live_highlight_during_scroll: true,
            initial_index: 0,
        }
    }
}

impl RingConfig {
    pub fn scroll_duration(&self) -> Duration {
        Duration::from_millis(self.scroll_duration_ms)
    }

    pub fn select_duration(&self) -> Duration {
        Duration::from_millis(self.select_duration_ms)
    }

    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_duration_ms)
    }

    pub fn max_transition(&self) -> Duration {
        Duration::from_millis(self.max_transition_ms)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn get_config_path() -> Result<std::path::PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "orbit", "orbit").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<RingConfig, ConfigError> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(path: &std::path::Path) -> Result<RingConfig, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("ORBIT"))
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_default() -> RingConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Using default ring config: {}", e);
            RingConfig::default()
        }
    }
}

pub fn write_default_config() -> Result<std::path::PathBuf, ConfigError> {
    let path = get_config_path()?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");
