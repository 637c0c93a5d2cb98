use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::demo::Mode;
use crate::render::visualizer::Skin;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub skin: Skin,
    #[serde(default)]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_camera")]
    pub camera: bool,
    #[serde(default = "default_recognize_every")]
    pub recognize_every: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            origin: default_origin(),
            poll_ms: default_poll_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            skin: Skin::default(),
            font: None,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera: default_camera(),
            recognize_every: default_recognize_every(),
        }
    }
}

fn default_origin() -> String { "http://127.0.0.1:5000".into() }
fn default_poll_ms() -> u64 { 1000 }
fn default_timeout_ms() -> u64 { 3000 }
fn default_width() -> u32 { 1000 }
fn default_height() -> u32 { 500 }
fn default_fps() -> u32 { 60 }
fn default_camera() -> bool { true }
fn default_recognize_every() -> u32 { 90 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// `./aeromix.toml`, then `~/.config/aeromix/config.toml`, then the
/// platform config directory.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("aeromix.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("aeromix").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("aeromix").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.backend.mode, Mode::Simulated);
        assert_eq!(cfg.backend.poll_ms, 1000);
        assert_eq!((cfg.display.width, cfg.display.height), (1000, 500));
        assert!(cfg.capture.camera);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [backend]
            mode = "remote"
            origin = "http://mixer.local:5000"

            [display]
            skin = "bars"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.backend.mode, Mode::Remote);
        assert_eq!(cfg.backend.origin, "http://mixer.local:5000");
        assert_eq!(cfg.backend.timeout_ms, 3000);
        assert_eq!(cfg.display.skin, Skin::Bars);
        assert_eq!(cfg.display.fps, 60);
    }

    #[test]
    fn missing_file_is_none() {
        assert!(load_config(Path::new("/nonexistent/aeromix.toml")).is_none());
    }
}
