// app/shell.rs - Tray Application State and Event Handling

use std::fs;
use std::process::Command;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tray_icon::{MouseButton, TrayIconEvent};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoopProxy};
use winit::window::WindowId;

use super::events::{self, UserEvent};
use crate::autostart::windows::RegistryAutostart;
use crate::autostart::{self, AutostartProvider};
use crate::constants::app;
use crate::dispatcher::CaptureDispatcher;
use crate::hotkey::windows::Win32HotkeyProvider;
use crate::hotkey::{HotkeyChord, HotkeyRegistrar, RegistrationState};
use crate::logging;
use crate::settings::SettingsStore;
use crate::ui::{dialogs, SystemTray, TrayCommand};

/// Main application state
pub struct TrayShotApp {
    settings: Arc<SettingsStore>,
    dispatcher: CaptureDispatcher,
    autostart: RegistryAutostart,
    proxy: EventLoopProxy<UserEvent>,

    /// Created on first resume
    tray: Option<SystemTray>,
    hotkey: Option<HotkeyRegistrar<Win32HotkeyProvider>>,

    /// Set when the shell could not start; main reports it after the loop ends
    startup_error: Option<anyhow::Error>,
}

impl TrayShotApp {
    pub fn new(
        settings: Arc<SettingsStore>,
        dispatcher: CaptureDispatcher,
        proxy: EventLoopProxy<UserEvent>,
    ) -> Self {
        Self {
            settings,
            dispatcher,
            autostart: RegistryAutostart::new(),
            proxy,
            tray: None,
            hotkey: None,
            startup_error: None,
        }
    }

    pub fn take_startup_error(&mut self) -> Option<anyhow::Error> {
        self.startup_error.take()
    }

    /// Tray, hotkey and autostart. A hotkey conflict or autostart error is not fatal.
    fn start(&mut self) -> Result<()> {
        let settings = self.settings.snapshot();

        events::forward_tray_events(&self.proxy);
        self.tray = Some(SystemTray::new(&settings).context("System tray icon could not be created")?);

        let proxy = self.proxy.clone();
        let provider = Win32HotkeyProvider::new(move |id| {
            if proxy.send_event(UserEvent::HotkeyPressed(id)).is_err() {
                debug!("Event loop closed, hotkey {} dropped", id);
            }
        })?;
        self.hotkey = Some(HotkeyRegistrar::new(provider, app::HOTKEY_ID));
        self.apply_hotkey(settings.hotkey());

        if let Err(e) = autostart::reconcile(&self.autostart, settings.start_with_system) {
            warn!("Autostart could not be synchronized: {:#}", e);
        }

        self.sync_tray();
        info!(
            "{} ready: {} captures {}, saving to {:?}",
            app::NAME,
            settings.hotkey(),
            settings.capture_mode,
            settings.screenshot_path
        );
        Ok(())
    }

    /// Re-register the global hotkey; a conflict leaves it inert until the next change
    fn apply_hotkey(&mut self, chord: HotkeyChord) {
        let Some(registrar) = self.hotkey.as_mut() else {
            return;
        };
        if let Err(e) = registrar.apply(chord) {
            error!("{:#}", e);
            dialogs::warn(
                "Hotkey unavailable",
                &e.context("Another application may already use it. Pick a different hotkey from the tray menu."),
            );
        }
    }

    fn hotkey_active(&self) -> bool {
        self.hotkey
            .as_ref()
            .is_some_and(|r| matches!(r.state(), RegistrationState::Registered(_)))
    }

    fn sync_tray(&self) {
        if let Some(tray) = &self.tray {
            tray.sync(&self.settings.snapshot(), self.hotkey_active());
        }
    }

    fn capture(&self) {
        // Detached; the task logs its own outcome
        drop(self.dispatcher.dispatch());
    }

    fn handle_command(&mut self, command: TrayCommand, event_loop: &ActiveEventLoop) {
        debug!("Tray command: {:?}", command);

        let result = match command {
            TrayCommand::CaptureNow => {
                self.capture();
                Ok(())
            }
            TrayCommand::SetCaptureMode(mode) => self.settings.set_capture_mode(mode).map(|_| ()),
            TrayCommand::SetHotkey(chord) => self.settings.set_hotkey(chord).map(|_| {
                self.apply_hotkey(chord);
            }),
            TrayCommand::ChooseFolder => self.choose_folder(),
            TrayCommand::OpenFolder => self.open_folder(),
            TrayCommand::ToggleAutostart => self.toggle_autostart(),
            TrayCommand::ToggleLogging => {
                let enabled = !self.settings.snapshot().logging_enabled;
                self.settings.set_logging_enabled(enabled).map(|s| {
                    logging::apply(&s);
                })
            }
            TrayCommand::SetLogLevel(level) => self.settings.set_log_level(level).map(|s| {
                logging::apply(&s);
            }),
            TrayCommand::Exit => {
                info!("Exit requested from tray");
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = result {
            error!("{:?} failed: {:#}", command, e);
            dialogs::warn("Settings not changed", &e);
        }
        self.sync_tray();
    }

    fn choose_folder(&self) -> Result<()> {
        let current = self.settings.snapshot().screenshot_path;
        match dialogs::pick_folder(&current) {
            Some(folder) => {
                self.settings.set_screenshot_path(folder)?;
                Ok(())
            }
            None => {
                debug!("Folder selection cancelled");
                Ok(())
            }
        }
    }

    fn open_folder(&self) -> Result<()> {
        let folder = self.settings.snapshot().screenshot_path;
        fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create screenshot folder {:?}", folder))?;
        Command::new("explorer")
            .arg(&folder)
            .spawn()
            .with_context(|| format!("Failed to open {:?}", folder))?;
        Ok(())
    }

    /// OS entry first; the setting is only stored once the registry agrees
    fn toggle_autostart(&self) -> Result<()> {
        let wanted = !self.settings.snapshot().start_with_system;
        self.autostart.set_enabled(wanted)?;
        if let Err(e) = self.settings.set_start_with_system(wanted) {
            if let Err(undo) = self.autostart.set_enabled(!wanted) {
                warn!("Autostart rollback failed: {:#}", undo);
            }
            return Err(e);
        }
        Ok(())
    }

    fn handle_tray_event(&self, event: TrayIconEvent) {
        if let TrayIconEvent::DoubleClick {
            button: MouseButton::Left,
            ..
        } = event
        {
            self.capture();
        }
    }

    fn shutdown(&mut self) {
        events::stop_forwarding();
        // Registrar first: it unregisters through the provider's window
        self.hotkey = None;
        self.tray = None;
    }
}

impl ApplicationHandler<UserEvent> for TrayShotApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.tray.is_some() || self.startup_error.is_some() {
            return;
        }
        info!("Application resumed");

        if let Err(e) = self.start() {
            error!("Startup failed: {:#}", e);
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, _event: WindowEvent) {
        // No winit windows; the hotkey sink is a raw Win32 window
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::HotkeyPressed(id) if id == app::HOTKEY_ID => self.capture(),
            UserEvent::HotkeyPressed(id) => warn!("Unknown hotkey id {}", id),
            UserEvent::Menu(menu_event) => {
                let command = self.tray.as_ref().and_then(|t| t.command_for(menu_event.id()));
                match command {
                    Some(command) => self.handle_command(command, event_loop),
                    None => debug!("Menu event without command: {:?}", menu_event.id()),
                }
            }
            UserEvent::Tray(tray_event) => self.handle_tray_event(tray_event),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        info!("{} shutting down", app::NAME);
        self.shutdown();
    }
}

impl Drop for TrayShotApp {
    fn drop(&mut self) {
        if self.tray.is_some() || self.hotkey.is_some() {
            self.shutdown();
        }
    }
}
