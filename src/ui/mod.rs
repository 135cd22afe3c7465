// ui/mod.rs - Tray Shell User Interface
//
// The tray icon with its context menu, and the few native dialogs it opens.

pub mod dialogs;
mod tray;

pub use tray::{SystemTray, TrayCommand};
