//! Settings - persisted user preferences
//!
//! One flat record stored as indented JSON next to the log file. The store owns the
//! only copy; every mutation goes to disk before it becomes visible to readers.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::{app, modifiers, vk};
use crate::hotkey::HotkeyChord;

/// Which part of the display a capture covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Bounds of the primary monitor
    #[default]
    ActiveScreen,
    /// Bounds of the foreground window
    ActiveWindow,
    /// Bounding box of every connected monitor
    VirtualDesktop,
}

impl CaptureMode {
    pub fn all() -> [CaptureMode; 3] {
        [Self::ActiveScreen, Self::ActiveWindow, Self::VirtualDesktop]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ActiveScreen => "Active Screen",
            Self::ActiveWindow => "Active Window",
            Self::VirtualDesktop => "All Screens",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Logging verbosity, stored as its ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn all() -> [LogLevel; 5] {
        [Self::Trace, Self::Debug, Self::Info, Self::Warn, Self::Error]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Trace => "Trace",
            Self::Debug => "Debug",
            Self::Info => "Info",
            Self::Warn => "Warning",
            Self::Error => "Error",
        }
    }

    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Trace => log::LevelFilter::Trace,
            Self::Debug => log::LevelFilter::Debug,
            Self::Info => log::LevelFilter::Info,
            Self::Warn => log::LevelFilter::Warn,
            Self::Error => log::LevelFilter::Error,
        }
    }
}

// Ordinals from a hand-edited file clamp into range instead of rejecting the file.
impl From<i64> for LogLevel {
    fn from(value: i64) -> Self {
        match value {
            i64::MIN..=0 => Self::Trace,
            1 => Self::Debug,
            2 => Self::Info,
            3 => Self::Warn,
            _ => Self::Error,
        }
    }
}

impl From<LogLevel> for u8 {
    fn from(level: LogLevel) -> Self {
        level as u8
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Win32 modifier mask of the capture hotkey
    pub hotkey_modifiers: u32,
    /// Win32 virtual-key code of the capture hotkey
    pub hotkey_key: u32,
    pub capture_mode: CaptureMode,
    /// Folder screenshots are written to
    pub screenshot_path: PathBuf,
    /// Launch at user logon
    pub start_with_system: bool,
    pub logging_enabled: bool,
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey_modifiers: modifiers::CONTROL | modifiers::SHIFT,
            hotkey_key: vk::KEY_A + (b'S' - b'A') as u32,
            capture_mode: CaptureMode::ActiveScreen,
            screenshot_path: default_screenshot_dir(),
            start_with_system: false,
            logging_enabled: true,
            log_level: LogLevel::Info,
        }
    }
}

impl Settings {
    pub fn hotkey(&self) -> HotkeyChord {
        HotkeyChord::new(self.hotkey_modifiers, self.hotkey_key)
    }

    /// Level the logger should run at right now
    pub fn effective_log_level(&self) -> log::LevelFilter {
        if self.logging_enabled {
            self.log_level.to_level_filter()
        } else {
            log::LevelFilter::Off
        }
    }
}

/// `<Pictures>/TrayShot`, or the closest thing this machine has
pub fn default_screenshot_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .map(|pictures| pictures.join(app::NAME))
        .unwrap_or_else(|| PathBuf::from("Screenshots"))
}

/// `<config dir>/TrayShot`, home of the settings and log files
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app::NAME)
}

/// Result of reading the settings file
enum Loaded {
    Settings(Settings),
    Missing,
    Unusable(anyhow::Error),
}

fn read_settings(path: &Path) -> Loaded {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Loaded::Missing,
        Err(e) => return Loaded::Unusable(anyhow::Error::new(e).context("read settings file")),
    };

    match serde_json::from_str(&contents) {
        Ok(settings) => Loaded::Settings(settings),
        Err(e) => Loaded::Unusable(anyhow::Error::new(e).context("parse settings file")),
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create settings folder {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, json).with_context(|| format!("Failed to write settings to {:?}", path))?;
    Ok(())
}

/// Owner of the persisted [`Settings`]
///
/// Shared between the tray shell (which mutates it) and the capture workers (which
/// take snapshots) behind an `Arc`.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<Settings>,
}

impl SettingsStore {
    /// Default settings file location
    pub fn default_path() -> PathBuf {
        config_dir().join(app::SETTINGS_FILE)
    }

    /// Open the store at the default location
    pub fn open_default() -> Self {
        Self::open(Self::default_path())
    }

    /// Load settings from `path`
    ///
    /// A missing or unreadable file is replaced with defaults, which are written back
    /// immediately. A write failure here is logged; the store still works in memory.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let settings = match read_settings(&path) {
            Loaded::Settings(settings) => {
                info!("Settings loaded from {:?}", path);
                return Self {
                    path,
                    current: RwLock::new(settings),
                };
            }
            Loaded::Missing => {
                info!("No settings file at {:?}, using defaults", path);
                Settings::default()
            }
            Loaded::Unusable(e) => {
                warn!("Settings file {:?} unusable, resetting to defaults: {:#}", path, e);
                Settings::default()
            }
        };

        if let Err(e) = write_settings(&path, &settings) {
            error!("Failed to persist default settings: {:#}", e);
        }

        Self {
            path,
            current: RwLock::new(settings),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> Settings {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `change`, persist, then publish
    ///
    /// On error nothing is published and the previous settings stay current.
    pub fn update<F>(&self, change: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = current.clone();
        change(&mut next);

        write_settings(&self.path, &next)?;
        info!("Settings saved to {:?}", self.path);

        *current = next.clone();
        Ok(next)
    }

    pub fn set_capture_mode(&self, mode: CaptureMode) -> Result<Settings> {
        self.update(|s| s.capture_mode = mode)
    }

    pub fn set_hotkey(&self, chord: HotkeyChord) -> Result<Settings> {
        self.update(|s| {
            s.hotkey_modifiers = chord.modifiers;
            s.hotkey_key = chord.key;
        })
    }

    pub fn set_screenshot_path(&self, path: impl Into<PathBuf>) -> Result<Settings> {
        let path = path.into();
        self.update(|s| s.screenshot_path = path)
    }

    pub fn set_start_with_system(&self, enabled: bool) -> Result<Settings> {
        self.update(|s| s.start_with_system = enabled)
    }

    pub fn set_logging_enabled(&self, enabled: bool) -> Result<Settings> {
        self.update(|s| s.logging_enabled = enabled)
    }

    pub fn set_log_level(&self, level: LogLevel) -> Result<Settings> {
        self.update(|s| s.log_level = level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings {
            hotkey_modifiers: modifiers::CONTROL | modifiers::ALT,
            hotkey_key: vk::SNAPSHOT,
            capture_mode: CaptureMode::VirtualDesktop,
            screenshot_path: PathBuf::from("D:/Shots/Work"),
            start_with_system: true,
            logging_enabled: false,
            log_level: LogLevel::Debug,
        }
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        write_settings(&path, &sample()).unwrap();
        let store = SettingsStore::open(&path);

        assert_eq!(store.snapshot(), sample());
    }

    #[test]
    fn file_uses_camel_case_names_and_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        write_settings(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        for field in [
            "hotkeyModifiers",
            "hotkeyKey",
            "captureMode",
            "screenshotPath",
            "startWithSystem",
            "loggingEnabled",
            "logLevel",
        ] {
            assert!(text.contains(&format!("\"{}\"", field)), "missing {}", field);
        }
        assert!(text.contains("\"VirtualDesktop\""));
        assert!(text.contains("\"logLevel\": 1"));
        assert!(text.contains('\n'));
    }

    #[test]
    fn missing_file_yields_defaults_and_writes_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = SettingsStore::open(&path);

        assert_eq!(store.snapshot(), Settings::default());
        assert!(path.exists());
        let on_disk: Settings = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, Settings::default());
    }

    #[test]
    fn corrupt_file_is_replaced_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ this is not json").unwrap();

        let store = SettingsStore::open(&path);

        assert_eq!(store.snapshot(), Settings::default());
        let on_disk: Settings = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "captureMode": "ActiveWindow", "logLevel": 9 }"#).unwrap();

        let settings = SettingsStore::open(&path).snapshot();

        assert_eq!(settings.capture_mode, CaptureMode::ActiveWindow);
        assert_eq!(settings.log_level, LogLevel::Error);
        assert_eq!(settings.hotkey(), Settings::default().hotkey());
        assert!(settings.logging_enabled);
    }

    #[test]
    fn wild_log_level_keeps_the_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "captureMode": "VirtualDesktop", "startWithSystem": true, "logLevel": 300 }"#,
        )
        .unwrap();

        let settings = SettingsStore::open(&path).snapshot();

        assert_eq!(settings.capture_mode, CaptureMode::VirtualDesktop);
        assert!(settings.start_with_system);
        assert_eq!(settings.log_level, LogLevel::Error);

        fs::write(&path, r#"{ "captureMode": "ActiveWindow", "logLevel": -1 }"#).unwrap();
        let settings = SettingsStore::open(&path).snapshot();
        assert_eq!(settings.capture_mode, CaptureMode::ActiveWindow);
        assert_eq!(settings.log_level, LogLevel::Trace);
    }

    #[test]
    fn updates_are_persisted_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path);

        store.set_capture_mode(CaptureMode::ActiveWindow).unwrap();
        store.set_hotkey(HotkeyChord::new(modifiers::ALT, vk::F1 + 8)).unwrap();
        store.set_screenshot_path(dir.path().join("out")).unwrap();
        store.set_start_with_system(true).unwrap();
        store.set_logging_enabled(false).unwrap();
        store.set_log_level(LogLevel::Trace).unwrap();

        let reopened = SettingsStore::open(&path).snapshot();
        assert_eq!(reopened, store.snapshot());
        assert_eq!(reopened.capture_mode, CaptureMode::ActiveWindow);
        assert_eq!(reopened.hotkey(), HotkeyChord::new(modifiers::ALT, vk::F1 + 8));
        assert_eq!(reopened.screenshot_path, dir.path().join("out"));
        assert!(reopened.start_with_system);
        assert!(!reopened.logging_enabled);
        assert_eq!(reopened.log_level, LogLevel::Trace);
    }

    #[test]
    fn failed_write_keeps_previous_settings() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a file where a folder should be").unwrap();
        let store = SettingsStore::open(blocker.join("settings.json"));
        let before = store.snapshot();

        let result = store.set_capture_mode(CaptureMode::VirtualDesktop);

        assert!(result.is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn disabled_logging_turns_logger_off() {
        let mut settings = Settings::default();
        assert_eq!(settings.effective_log_level(), log::LevelFilter::Info);

        settings.logging_enabled = false;
        assert_eq!(settings.effective_log_level(), log::LevelFilter::Off);
    }

    #[test]
    fn log_level_ordinals_are_stable() {
        for (ordinal, level) in LogLevel::all().into_iter().enumerate() {
            assert_eq!(u8::from(level), ordinal as u8);
            assert_eq!(LogLevel::from(ordinal as i64), level);
        }
        assert_eq!(LogLevel::from(200), LogLevel::Error);
        assert_eq!(LogLevel::from(-3), LogLevel::Trace);
    }
}
