// main.rs - TrayShot Application Entry Point
//
// Wires the settings store, logging, the capture runtime and the tray event loop
// together. There is no main window; the process lives in the notification area.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Result;

#[cfg(windows)]
fn main() -> Result<()> {
    let result = run();
    if let Err(e) = &result {
        log::error!("{:#}", e);
        trayshot::ui::dialogs::fatal(e);
    }
    result
}

#[cfg(windows)]
fn run() -> Result<()> {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Context;
    use log::info;
    use winit::event_loop::{ControlFlow, EventLoop};

    use trayshot::app::{TrayShotApp, UserEvent};
    use trayshot::{logging, CaptureDispatcher, CaptureEngine, GdiCaptureProvider, Settings, SettingsStore};

    // Log with defaults until the stored level is known
    logging::init(&Settings::default(), &logging::log_path());
    info!("Starting {} {}", trayshot::constants::app::NAME, env!("CARGO_PKG_VERSION"));

    let settings = Arc::new(SettingsStore::open_default());
    logging::apply(&settings.snapshot());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("trayshot-worker")
        .build()
        .context("Failed to start the capture runtime")?;

    let engine = Arc::new(CaptureEngine::new(Arc::new(GdiCaptureProvider::new())));
    let dispatcher = CaptureDispatcher::new(runtime.handle().clone(), engine, Arc::clone(&settings));

    // Create event loop with UserEvent support
    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = TrayShotApp::new(settings, dispatcher, event_loop.create_proxy());
    let run_result = event_loop.run_app(&mut app).context("Event loop error");

    if let Some(e) = app.take_startup_error() {
        return Err(e);
    }
    run_result?;
    drop(app);

    // Let captures already in flight finish writing
    runtime.shutdown_timeout(Duration::from_secs(5));
    info!("{} exited", trayshot::constants::app::NAME);
    Ok(())
}

#[cfg(not(windows))]
fn main() -> Result<()> {
    env_logger::init();
    anyhow::bail!("TrayShot needs the Windows desktop (tray icon, global hotkeys, GDI capture)")
}
