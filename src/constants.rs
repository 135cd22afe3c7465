// constants.rs - Application-wide Constants
//
// Centralized names, file names and Win32 key constants.
// Kept free of the windows crate so the core builds on every host.

/// Application identity and on-disk names
pub mod app {
    /// Display name, config folder name and autostart value name
    pub const NAME: &str = "TrayShot";
    /// Settings file inside the config folder
    pub const SETTINGS_FILE: &str = "settings.json";
    /// Log file inside the config folder
    pub const LOG_FILE: &str = "trayshot.log";
    /// Prefix of every saved screenshot
    pub const SCREENSHOT_PREFIX: &str = "Screenshot_";
    /// chrono format for the timestamp part of a screenshot file name
    pub const SCREENSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%3f";
    /// Id of the one global hotkey we register
    pub const HOTKEY_ID: i32 = 1;
}

/// Win32 hotkey modifier bits (same values as MOD_ALT etc.)
pub mod modifiers {
    pub const ALT: u32 = 0x0001;
    pub const CONTROL: u32 = 0x0002;
    pub const SHIFT: u32 = 0x0004;
    pub const WIN: u32 = 0x0008;
    /// Suppress auto-repeat while the chord is held
    pub const NOREPEAT: u32 = 0x4000;
    /// Every bit a stored chord may carry
    pub const ALL: u32 = ALT | CONTROL | SHIFT | WIN;
}

/// Win32 virtual-key codes used by name
pub mod vk {
    pub const BACK: u32 = 0x08;
    pub const TAB: u32 = 0x09;
    pub const RETURN: u32 = 0x0D;
    pub const PAUSE: u32 = 0x13;
    pub const ESCAPE: u32 = 0x1B;
    pub const SPACE: u32 = 0x20;
    pub const PRIOR: u32 = 0x21;
    pub const NEXT: u32 = 0x22;
    pub const END: u32 = 0x23;
    pub const HOME: u32 = 0x24;
    pub const LEFT: u32 = 0x25;
    pub const UP: u32 = 0x26;
    pub const RIGHT: u32 = 0x27;
    pub const DOWN: u32 = 0x28;
    pub const SNAPSHOT: u32 = 0x2C;
    pub const INSERT: u32 = 0x2D;
    pub const DELETE: u32 = 0x2E;
    /// '0'..='9' map to 0x30..=0x39
    pub const DIGIT_0: u32 = 0x30;
    /// 'A'..='Z' map to 0x41..=0x5A
    pub const KEY_A: u32 = 0x41;
    /// F1..=F24 map to 0x70..=0x87
    pub const F1: u32 = 0x70;
    pub const F24: u32 = 0x87;
}

/// Tray icon dimensions
pub mod tray {
    /// Icon edge length in pixels
    pub const ICON_SIZE: u32 = 32;
}
