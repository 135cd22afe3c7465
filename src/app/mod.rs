// app/mod.rs - Tray Application
//
// The winit application that owns the tray, the hotkey registration and the
// autostart entry, and turns their events into captures and settings changes.

mod events;
mod shell;

pub use events::UserEvent;
pub use shell::TrayShotApp;
