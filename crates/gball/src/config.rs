use crate::events::AppEvent;
use async_channel::Sender;
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use palette::Srgba;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use simtelem::irsdk;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

pub const G_SCALE_RANGE: (f64, f64) = (0.5, 5.0);
pub const ALPHA_RANGE: (f64, f64) = (0.05, 0.95);
const MIN_INTERVAL_MS: u64 = 1;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, DeserializeFromStr, EnumString, StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[strum(serialize = "irsdk", serialize = "iracing")]
    Irsdk,
    #[strum(serialize = "demo")]
    Demo,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub irsdk_path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Irsdk,
            irsdk_path: PathBuf::from(irsdk::DEFAULT_PATH),
        }
    }
}

/// Background colour written as `#rrggbbaa` (or `#rrggbb`, fully opaque).
#[derive(Debug, Clone, Copy, PartialEq, SerializeDisplay, DeserializeFromStr)]
pub struct Rgba(pub Srgba<u8>);

impl Rgba {
    pub fn transparent() -> Self {
        Self(Srgba::new(0, 0, 0, 0))
    }

    pub fn to_f64(self) -> Srgba<f64> {
        self.0.into_format()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid colour '{0}', expected #rrggbb or #rrggbbaa")]
pub struct ParseRgbaError(String);

impl FromStr for Rgba {
    type Err = ParseRgbaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRgbaError(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(err());
        }

        let channel = |i: usize| {
            hex.get(i * 2..i * 2 + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .ok_or_else(err)
        };
        let alpha = if hex.len() == 8 { channel(3)? } else { u8::MAX };
        Ok(Self(Srgba::new(channel(0)?, channel(1)?, channel(2)?, alpha)))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b, a) = self.0.into_components();
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowSize {
    pub width: i32,
    pub height: i32,
}

/// Offset of the window's top-left corner from the top-left of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Outer ring radius in g.
    pub g_scale: f64,
    /// EMA weight of the newest sample; higher reacts faster.
    pub smoothing_alpha: f64,
    pub gravity_compensation_enabled: bool,
    pub show_trail: bool,
    pub show_help: bool,
    pub hotkeys_enabled: bool,
    pub background_rgba: Rgba,
    pub poll_interval_ms: u64,
    pub render_interval_ms: u64,
    pub window_size: WindowSize,
    pub window_position: WindowPosition,
    pub source: SourceConfig,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            g_scale: 2.0,
            smoothing_alpha: 0.25,
            gravity_compensation_enabled: false,
            show_trail: true,
            show_help: false,
            hotkeys_enabled: true,
            background_rgba: Rgba::transparent(),
            poll_interval_ms: 16,
            render_interval_ms: 16,
            window_size: WindowSize {
                width: 280,
                height: 280,
            },
            window_position: WindowPosition { x: 40, y: 40 },
            source: SourceConfig::default(),
        }
    }
}

impl DisplayConfig {
    /// Clamps user-supplied values into their valid ranges.
    pub fn sanitize(mut self) -> Self {
        let defaults = Self::default();
        self.g_scale = clamp_or(self.g_scale, G_SCALE_RANGE, defaults.g_scale);
        self.smoothing_alpha = clamp_or(self.smoothing_alpha, ALPHA_RANGE, defaults.smoothing_alpha);
        self.poll_interval_ms = self.poll_interval_ms.max(MIN_INTERVAL_MS);
        self.render_interval_ms = self.render_interval_ms.max(MIN_INTERVAL_MS);
        self.window_size.width = self.window_size.width.max(1);
        self.window_size.height = self.window_size.height.max(1);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }
}

fn clamp_or(value: f64, (min, max): (f64, f64), fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("io", "gball", "gball").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<DisplayConfig, ConfigError> {
    load_config_from(&get_config_path()?)
}

/// Reads the document at `path` (if any) and applies `GBALL_*` environment overrides.
pub fn load_config_from(path: &Path) -> Result<DisplayConfig, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("GBALL").try_parsing(true))
        .build()?;

    Ok(s.try_deserialize::<DisplayConfig>()?.sanitize())
}

pub fn parse_config(document: &str) -> Result<DisplayConfig, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from_str(document, config::FileFormat::Toml))
        .build()?;

    Ok(s.try_deserialize::<DisplayConfig>()?.sanitize())
}

/// Loads the config, writing the default document on first run. An unreadable
/// file falls back to defaults.
pub fn load_or_setup() -> DisplayConfig {
    match get_config_path() {
        Ok(path) => load_or_setup_at(&path),
        Err(e) => {
            log::warn!("Using default config: {}", e);
            DisplayConfig::default()
        }
    }
}

pub fn load_or_setup_at(path: &Path) -> DisplayConfig {
    if !path.exists() {
        match write_default_config_at(path) {
            Ok(()) => log::info!("Wrote default config to {}", path.display()),
            Err(e) => log::warn!("Failed to write default config: {}", e),
        }
    }

    match load_config_from(path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Using default config: {}", e);
            DisplayConfig::default()
        }
    }
}

pub fn write_default_config() -> Result<PathBuf, ConfigError> {
    let path = get_config_path()?;
    write_default_config_at(&path)?;
    Ok(path)
}

fn write_default_config_at(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(path, DEFAULT_CONFIG)?;
    }
    Ok(())
}

/// Persists the session's settings, including hotkey changes and the window position.
pub fn save_config(config: &DisplayConfig) -> Result<PathBuf, ConfigError> {
    let path = get_config_path()?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(&path, toml::to_string_pretty(config)?)?;
    Ok(path)
}

pub const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));

                if relevant
                    && event.paths.iter().any(|p| p == &config_path)
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_deserialization() {
        let cases = vec![
            ("\"irsdk\"", SourceKind::Irsdk),
            ("\"IRSDK\"", SourceKind::Irsdk),
            ("\"iracing\"", SourceKind::Irsdk),
            ("\"demo\"", SourceKind::Demo),
            ("\"Demo\"", SourceKind::Demo),
        ];

        for (json, expected) in cases {
            let deserialized: SourceKind = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
        assert!(serde_json::from_str::<SourceKind>("\"udp\"").is_err());
    }

    #[test]
    fn test_rgba_parsing() {
        assert_eq!(
            "#00000000".parse::<Rgba>().unwrap(),
            Rgba::transparent()
        );
        assert_eq!(
            "#1a2B3c80".parse::<Rgba>().unwrap(),
            Rgba(Srgba::new(0x1a, 0x2b, 0x3c, 0x80))
        );
        assert_eq!(
            "ff8000".parse::<Rgba>().unwrap(),
            Rgba(Srgba::new(0xff, 0x80, 0x00, 0xff))
        );
        assert!("#12345".parse::<Rgba>().is_err());
        assert!("#gg000000".parse::<Rgba>().is_err());
        assert_eq!(Rgba(Srgba::new(1, 2, 254, 255)).to_string(), "#0102feff");
    }

    #[test]
    fn test_default_document_matches_defaults() {
        assert_eq!(parse_config(DEFAULT_CONFIG).unwrap(), DisplayConfig::default());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config = parse_config(
            r##"
            g_scale = 3.0
            background_rgba = "#10203040"

            [source]
            kind = "demo"
            "##,
        )
        .unwrap();

        assert_eq!(config.g_scale, 3.0);
        assert_eq!(config.background_rgba, Rgba(Srgba::new(0x10, 0x20, 0x30, 0x40)));
        assert_eq!(config.source.kind, SourceKind::Demo);
        assert_eq!(config.source.irsdk_path, PathBuf::from(irsdk::DEFAULT_PATH));
        assert_eq!(config.smoothing_alpha, 0.25);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = parse_config(
            r#"
            g_scale = 12.0
            smoothing_alpha = 0.0
            poll_interval_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.g_scale, 5.0);
        assert_eq!(config.smoothing_alpha, 0.05);
        assert_eq!(config.poll_interval_ms, 1);
    }

    #[test]
    fn test_unparsable_document_is_an_error() {
        assert!(parse_config("g_scale = [").is_err());
        assert!(parse_config("g_scale = \"wide\"").is_err());
    }

    #[test]
    fn test_saved_document_reloads() {
        let mut config = DisplayConfig::default();
        config.g_scale = 2.75;
        config.show_help = true;
        config.window_position = WindowPosition { x: 300, y: 12 };
        config.background_rgba = Rgba(Srgba::new(0, 0, 0, 0x60));

        let toml = toml::to_string_pretty(&config).unwrap();
        assert_eq!(parse_config(&toml).unwrap(), config);
    }

    #[test]
    fn test_first_run_writes_default_and_applies_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gball").join("config.toml");

        // SAFETY: no other test depends on GBALL_* variables
        unsafe { std::env::set_var("GBALL_G_SCALE", "3.5") };
        let config = load_or_setup_at(&path);
        unsafe { std::env::remove_var("GBALL_G_SCALE") };

        assert!(path.exists());
        assert_eq!(fs_err::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
        assert_eq!(config.g_scale, 3.5);
        assert_eq!(config.smoothing_alpha, 0.25);
    }

    #[test]
    fn test_unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs_err::write(&path, "g_scale = [").unwrap();

        assert_eq!(load_or_setup_at(&path), DisplayConfig::default());
    }
}
