// ui/tray.rs - System Tray Icon Implementation
//
// Tray icon plus the context menu that drives every setting.

use anyhow::{Context, Result};
use log::{info, warn};
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use crate::constants::{app, tray};
use crate::hotkey::HotkeyChord;
use crate::settings::{CaptureMode, LogLevel, Settings};

/// What a menu click asks the application to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    CaptureNow,
    SetCaptureMode(CaptureMode),
    SetHotkey(HotkeyChord),
    ChooseFolder,
    OpenFolder,
    ToggleAutostart,
    ToggleLogging,
    SetLogLevel(LogLevel),
    Exit,
}

/// Menu items kept for id matching and check-mark updates
struct TrayMenuItems {
    capture_now: MenuItem,
    modes: Vec<(CaptureMode, CheckMenuItem)>,
    hotkeys: Vec<(HotkeyChord, CheckMenuItem)>,
    custom_hotkey: CheckMenuItem,
    choose_folder: MenuItem,
    open_folder: MenuItem,
    autostart: CheckMenuItem,
    logging_enabled: CheckMenuItem,
    levels: Vec<(LogLevel, CheckMenuItem)>,
    exit: MenuItem,
}

/// System tray icon manager
pub struct SystemTray {
    tray_icon: TrayIcon,
    items: TrayMenuItems,
}

impl SystemTray {
    /// Build the icon and menu, checked to match `settings`
    pub fn new(settings: &Settings) -> Result<Self> {
        info!("Initializing system tray icon");

        let capture_now = MenuItem::new("Take Screenshot", true, None);

        let modes: Vec<_> = CaptureMode::all()
            .into_iter()
            .map(|mode| (mode, CheckMenuItem::new(mode.label(), true, false, None)))
            .collect();
        let mode_menu = Submenu::new("Capture Mode", true);
        for (_, item) in &modes {
            mode_menu.append(item).context("menu append capture mode")?;
        }

        let hotkeys: Vec<_> = HotkeyChord::presets()
            .into_iter()
            .map(|chord| (chord, CheckMenuItem::new(chord.to_string(), true, false, None)))
            .collect();
        let custom_hotkey = CheckMenuItem::new("Custom", false, false, None);
        let hotkey_menu = Submenu::new("Hotkey", true);
        for (_, item) in &hotkeys {
            hotkey_menu.append(item).context("menu append hotkey preset")?;
        }
        hotkey_menu
            .append_items(&[&PredefinedMenuItem::separator(), &custom_hotkey])
            .context("menu append custom hotkey")?;

        let choose_folder = MenuItem::new("Save Folder...", true, None);
        let open_folder = MenuItem::new("Open Save Folder", true, None);
        let autostart = CheckMenuItem::new("Start with Windows", true, false, None);

        let logging_enabled = CheckMenuItem::new("Enabled", true, false, None);
        let levels: Vec<_> = LogLevel::all()
            .into_iter()
            .map(|level| (level, CheckMenuItem::new(level.label(), true, false, None)))
            .collect();
        let logging_menu = Submenu::new("Logging", true);
        logging_menu
            .append_items(&[&logging_enabled, &PredefinedMenuItem::separator()])
            .context("menu append logging toggle")?;
        for (_, item) in &levels {
            logging_menu.append(item).context("menu append log level")?;
        }

        let exit = MenuItem::new("Exit", true, None);

        let menu = Menu::new();
        menu.append_items(&[
            &capture_now,
            &PredefinedMenuItem::separator(),
            &mode_menu,
            &hotkey_menu,
            &PredefinedMenuItem::separator(),
            &choose_folder,
            &open_folder,
            &PredefinedMenuItem::separator(),
            &autostart,
            &logging_menu,
            &PredefinedMenuItem::separator(),
            &exit,
        ])
        .context("menu append items")?;

        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(app::NAME)
            .with_icon(create_tray_icon()?)
            .build()
            .context("build tray icon")?;

        let tray = Self {
            tray_icon,
            items: TrayMenuItems {
                capture_now,
                modes,
                hotkeys,
                custom_hotkey,
                choose_folder,
                open_folder,
                autostart,
                logging_enabled,
                levels,
                exit,
            },
        };
        tray.sync(settings, true);

        info!("System tray icon initialized successfully");
        Ok(tray)
    }

    /// Translate a menu click into a command
    pub fn command_for(&self, id: &MenuId) -> Option<TrayCommand> {
        let items = &self.items;

        if id == items.capture_now.id() {
            return Some(TrayCommand::CaptureNow);
        }
        if let Some((mode, _)) = items.modes.iter().find(|(_, item)| item.id() == id) {
            return Some(TrayCommand::SetCaptureMode(*mode));
        }
        if let Some((chord, _)) = items.hotkeys.iter().find(|(_, item)| item.id() == id) {
            return Some(TrayCommand::SetHotkey(*chord));
        }
        if id == items.choose_folder.id() {
            return Some(TrayCommand::ChooseFolder);
        }
        if id == items.open_folder.id() {
            return Some(TrayCommand::OpenFolder);
        }
        if id == items.autostart.id() {
            return Some(TrayCommand::ToggleAutostart);
        }
        if id == items.logging_enabled.id() {
            return Some(TrayCommand::ToggleLogging);
        }
        if let Some((level, _)) = items.levels.iter().find(|(_, item)| item.id() == id) {
            return Some(TrayCommand::SetLogLevel(*level));
        }
        if id == items.exit.id() {
            return Some(TrayCommand::Exit);
        }
        None
    }

    /// Re-check menu items and refresh the tooltip from `settings`
    ///
    /// muda flips a check item on click before we see the event, so this runs
    /// after every command, successful or not.
    pub fn sync(&self, settings: &Settings, hotkey_active: bool) {
        let items = &self.items;

        for (mode, item) in &items.modes {
            item.set_checked(*mode == settings.capture_mode);
        }

        let chord = settings.hotkey();
        for (preset, item) in &items.hotkeys {
            item.set_checked(*preset == chord);
        }
        if chord.is_preset() {
            items.custom_hotkey.set_text("Custom (edit settings.json)");
            items.custom_hotkey.set_checked(false);
        } else {
            items.custom_hotkey.set_text(format!("Custom: {}", chord));
            items.custom_hotkey.set_checked(true);
        }

        items.autostart.set_checked(settings.start_with_system);
        items.logging_enabled.set_checked(settings.logging_enabled);
        for (level, item) in &items.levels {
            item.set_checked(*level == settings.log_level);
            item.set_enabled(settings.logging_enabled);
        }

        let tooltip = if hotkey_active {
            format!("{} - {} ({})", app::NAME, chord, settings.capture_mode)
        } else {
            format!("{} - hotkey {} unavailable", app::NAME, chord)
        };
        if let Err(e) = self.tray_icon.set_tooltip(Some(tooltip)) {
            warn!("Failed to update tray tooltip: {}", e);
        }
    }
}

/// Create the tray icon
fn create_tray_icon() -> Result<Icon> {
    let size = tray::ICON_SIZE;
    Icon::from_rgba(camera_icon_rgba(size), size, size).context("create tray icon")
}

/// Camera glyph: white-outlined blue body, white lens, small viewfinder bump
fn camera_icon_rgba(size: u32) -> Vec<u8> {
    const BODY: [u8; 4] = [50, 100, 255, 255];
    const OUTLINE: [u8; 4] = [255, 255, 255, 255];
    const LENS: [u8; 4] = [235, 240, 255, 255];

    let mut rgba = vec![0u8; (size * size * 4) as usize];
    let s = size as f32;
    let (body_top, body_bottom) = (s * 0.28, s * 0.88);
    let (body_left, body_right) = (s * 0.06, s * 0.94);
    let (cx, cy, lens_r) = (s * 0.5, s * 0.58, s * 0.2);

    for y in 0..size {
        for x in 0..size {
            let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
            let in_body = fx >= body_left && fx <= body_right && fy >= body_top && fy <= body_bottom;
            let in_bump = fx >= s * 0.32 && fx <= s * 0.62 && fy >= s * 0.14 && fy < body_top;
            let on_edge = in_body
                && (fx - body_left < 1.5
                    || body_right - fx < 1.5
                    || fy - body_top < 1.5
                    || body_bottom - fy < 1.5);
            let d = ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt();

            let color = if in_body && d <= lens_r * 0.55 {
                Some(BODY)
            } else if in_body && d <= lens_r {
                Some(LENS)
            } else if on_edge || in_bump {
                Some(OUTLINE)
            } else if in_body {
                Some(BODY)
            } else {
                None
            };

            if let Some(color) = color {
                let offset = ((y * size + x) * 4) as usize;
                rgba[offset..offset + 4].copy_from_slice(&color);
            }
        }
    }
    rgba
}
