//! TrayShot - tray-resident screenshot utility
//!
//! The capture, settings and persistence core is platform-neutral and driven through
//! small provider traits; the Win32 implementations and the tray shell are only
//! compiled on Windows.

pub mod autostart;
pub mod capture;
pub mod constants;
pub mod dispatcher;
pub mod hotkey;
pub mod logging;
pub mod persistence;
pub mod settings;

#[cfg(windows)]
pub mod app;
#[cfg(windows)]
pub mod ui;

// Re-export commonly used types
pub use capture::{CaptureEngine, CaptureRegion, CapturedImage, ScreenCaptureProvider};
pub use dispatcher::CaptureDispatcher;
pub use hotkey::{HotkeyChord, HotkeyRegistrar};
pub use settings::{CaptureMode, LogLevel, Settings, SettingsStore};

#[cfg(windows)]
pub use capture::windows::GdiCaptureProvider;
