// app/events.rs - Events delivered to the winit event loop

use std::sync::Mutex;

use log::{debug, warn};
use muda::MenuEvent;
use tray_icon::TrayIconEvent;
use winit::event_loop::EventLoopProxy;

/// Custom user events for the event loop
#[derive(Debug)]
pub enum UserEvent {
    /// A registered global hotkey fired
    HotkeyPressed(i32),
    /// Tray context menu item clicked
    Menu(MenuEvent),
    /// Mouse activity on the tray icon itself
    Tray(TrayIconEvent),
}

/// Route tray and menu events through the event loop
///
/// Both handlers can be invoked from outside the UI thread, so the proxy sits
/// behind a mutex.
pub(crate) fn forward_tray_events(proxy: &EventLoopProxy<UserEvent>) {
    let menu_proxy = Mutex::new(proxy.clone());
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        send(&menu_proxy, UserEvent::Menu(event));
    }));

    let tray_proxy = Mutex::new(proxy.clone());
    TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
        send(&tray_proxy, UserEvent::Tray(event));
    }));
}

/// Stop forwarding; used on shutdown
pub(crate) fn stop_forwarding() {
    MenuEvent::set_event_handler(None::<fn(MenuEvent)>);
    TrayIconEvent::set_event_handler(None::<fn(TrayIconEvent)>);
}

fn send(proxy: &Mutex<EventLoopProxy<UserEvent>>, event: UserEvent) {
    let Ok(proxy) = proxy.lock() else {
        warn!("Event proxy lock poisoned, dropping {:?}", event);
        return;
    };
    if proxy.send_event(event).is_err() {
        debug!("Event loop closed, event dropped");
    }
}
