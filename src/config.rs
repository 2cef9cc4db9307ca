use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::debounce::ClickBand;
use crate::smoothing::{ActiveRect, ScreenSize};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("no home directory to hold the config")]
    NoHome,
    #[error("smoothing_factor must be a positive value, got {0}")]
    SmoothingFactor(f64),
    #[error("click_distance_band {0}")]
    ClickBand(String),
    #[error("frame_vertical_offset ({offset}) must not exceed frame_margin ({margin})")]
    VerticalOffset { offset: u32, margin: u32 },
    #[error("{0}")]
    Dimensions(String),
}

// ---------- on-disk profile ----------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub smoothing_factor: f64,
    pub click_distance_band: Vec<i64>,
    pub frame_margin: u32,
    pub frame_vertical_offset: u32,
}

impl Default for EngineSection {
    fn default() -> Self {
        let band = ClickBand::default();
        Self {
            smoothing_factor: 7.0,
            click_distance_band: vec![i64::from(band.low), i64::from(band.high)],
            frame_margin: 90,
            frame_vertical_offset: 85,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerSection {
    pub command: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default = "default_camera")]
    pub camera: Dimensions,
    #[serde(default = "default_screen")]
    pub screen: Dimensions,
    #[serde(default)]
    pub tracker: TrackerSection,
}

fn default_camera() -> Dimensions {
    Dimensions {
        width: 640,
        height: 480,
    }
}

fn default_screen() -> Dimensions {
    Dimensions {
        width: 1920,
        height: 1080,
    }
}

// ---------- validated runtime config ----------

/// Engine parameters, fixed for the lifetime of a run.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    /// Divides each frame's cursor delta; 1 means no smoothing.
    pub smoothing_factor: f64,
    pub click_band: ClickBand,
    /// Pixels trimmed from each camera-frame edge.
    pub frame_margin: u32,
    /// Upward shift of the active rectangle, at most `frame_margin`.
    pub frame_vertical_offset: u32,
    pub camera_width: u32,
    pub camera_height: u32,
    pub screen: ScreenSize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let cam = default_camera();
        let scr = default_screen();
        Self {
            smoothing_factor: 7.0,
            click_band: ClickBand::default(),
            frame_margin: 90,
            frame_vertical_offset: 85,
            camera_width: cam.width,
            camera_height: cam.height,
            screen: ScreenSize {
                width: scr.width,
                height: scr.height,
            },
        }
    }
}

impl EngineConfig {
    pub fn active_rect(&self) -> ActiveRect {
        ActiveRect::from_frame(
            self.camera_width,
            self.camera_height,
            self.frame_margin,
            self.frame_vertical_offset,
        )
    }
}

pub fn click_band(values: &[i64]) -> Result<ClickBand, ConfigError> {
    let [low, high] = values else {
        return Err(ConfigError::ClickBand(format!(
            "must have exactly 2 integer values, got {}",
            values.len()
        )));
    };
    if *low < 0 || *high < 0 {
        return Err(ConfigError::ClickBand(
            "must have only positive integer values".into(),
        ));
    }
    if low > high {
        return Err(ConfigError::ClickBand(format!(
            "min ({low}) must be less than max ({high})"
        )));
    }
    let conv = |v: i64| {
        u32::try_from(v).map_err(|_| ConfigError::ClickBand(format!("value {v} is too large")))
    };
    Ok(ClickBand {
        low: conv(*low)?,
        high: conv(*high)?,
    })
}

impl Profile {
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let e = &self.engine;
        // NaN fails this comparison too.
        if !(e.smoothing_factor > 0.0 && e.smoothing_factor.is_finite()) {
            return Err(ConfigError::SmoothingFactor(e.smoothing_factor));
        }
        let band = click_band(&e.click_distance_band)?;
        if e.frame_vertical_offset > e.frame_margin {
            return Err(ConfigError::VerticalOffset {
                offset: e.frame_vertical_offset,
                margin: e.frame_margin,
            });
        }
        for (what, d) in [("camera", self.camera), ("screen", self.screen)] {
            if d.width == 0 || d.height == 0 {
                return Err(ConfigError::Dimensions(format!(
                    "{what} dimensions must be non-zero, got {}x{}",
                    d.width, d.height
                )));
            }
        }
        let m = u64::from(e.frame_margin) * 2;
        if m >= u64::from(self.camera.width) || m >= u64::from(self.camera.height) {
            return Err(ConfigError::Dimensions(format!(
                "frame_margin {} leaves no active area in a {}x{} camera frame",
                e.frame_margin, self.camera.width, self.camera.height
            )));
        }

        Ok(EngineConfig {
            smoothing_factor: e.smoothing_factor,
            click_band: band,
            frame_margin: e.frame_margin,
            frame_vertical_offset: e.frame_vertical_offset,
            camera_width: self.camera.width,
            camera_height: self.camera.height,
            screen: ScreenSize {
                width: self.screen.width,
                height: self.screen.height,
            },
        })
    }
}

// ---------- loading ----------

#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineConfig,
    pub tracker_command: Option<String>,
    pub source: PathBuf,
}

fn config_dir() -> Result<PathBuf, ConfigError> {
    let home = UserDirs::new().ok_or(ConfigError::NoHome)?;
    Ok(home.home_dir().join(".config").join("handctl"))
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl Settings {
    /// Load `path`, or the per-user config (installing the default on first
    /// use) when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => install_default()?,
        };
        let txt = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let profile = Profile::from_toml_str(&txt, &path.display().to_string())?;
        let engine = profile.engine_config()?;
        Ok(Self {
            engine,
            tracker_command: profile.tracker.command.filter(|c| !c.trim().is_empty()),
            source: path,
        })
    }
}

fn install_default() -> Result<PathBuf, ConfigError> {
    let path = default_config_path()?;
    if !path.exists() {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        fs::write(&path, default_profile_text()).map_err(io_err)?;
        info!("installed default config at {}", path.display());
    }
    Ok(path)
}

/// Permission and config diagnostics for the `doctor` command.
pub fn doctor_report() -> serde_json::Value {
    let uinput_ok = Path::new("/dev/uinput").exists();
    let in_input_group = check_in_input_group();
    let config_path = default_config_path().ok();
    let config = match &config_path {
        Some(path) => config_status(path),
        None => "no home directory".to_string(),
    };
    serde_json::json!({
        "uinput_present": uinput_ok,
        "input_group_member": in_input_group,
        "config_path": config_path,
        "config": config,
        "hints": {
            "udev_rule": "/etc/udev/rules.d/80-uinput.rules",
            "add_user_to_input_group": "sudo usermod -aG input $USER && newgrp input"
        }
    })
}

/// Read-only status of the config file; unlike `Settings::load` this never
/// installs the default.
fn config_status(path: &Path) -> String {
    if !path.exists() {
        return "missing".to_string();
    }
    match Settings::load(Some(path)) {
        Ok(_) => "ok".to_string(),
        Err(e) => e.to_string(),
    }
}

fn check_in_input_group() -> bool {
    let Ok(s) = fs::read_to_string("/etc/group") else {
        return false;
    };
    let user = whoami::username();
    s.lines()
        .filter(|line| line.starts_with("input:"))
        .any(|line| {
            line.split(':')
                .nth(3)
                .unwrap_or("")
                .split(',')
                .any(|u| u == user)
        })
}
