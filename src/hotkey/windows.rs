//! Win32 hotkey provider
//!
//! `RegisterHotKey` delivers `WM_HOTKEY` to a window owned by the registering
//! thread. We create a message-only window on the UI thread; winit's message pump
//! dispatches to it like any other window on that thread.

use std::cell::RefCell;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Context, Result};
use log::{error, info, trace};

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, RegisterClassExW, HWND_MESSAGE,
    WINDOW_EX_STYLE, WINDOW_STYLE, WM_HOTKEY, WNDCLASSEXW,
};

use super::{HotkeyChord, HotkeyProvider};
use crate::constants::modifiers;

const CLASS_NAME: PCWSTR = w!("TrayShotHotkeySink");

type HotkeyCallback = Box<dyn Fn(i32)>;

// The window procedure runs on the thread that created the window
thread_local! {
    static ON_HOTKEY: RefCell<Option<HotkeyCallback>> = const { RefCell::new(None) };
}

/// Hotkey provider backed by a hidden message-only window
pub struct Win32HotkeyProvider {
    hwnd: HWND,
}

impl Win32HotkeyProvider {
    /// Create the message window; `on_hotkey` receives the id of each fired hotkey
    pub fn new(on_hotkey: impl Fn(i32) + 'static) -> Result<Self> {
        unsafe {
            let hinstance = GetModuleHandleW(None).context("GetModuleHandleW failed")?;

            // Register window class (only once)
            static CLASS_REGISTERED: AtomicBool = AtomicBool::new(false);
            if !CLASS_REGISTERED.swap(true, Ordering::SeqCst) {
                let wc = WNDCLASSEXW {
                    cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
                    lpfnWndProc: Some(window_proc),
                    hInstance: hinstance.into(),
                    lpszClassName: CLASS_NAME,
                    ..Default::default()
                };

                if RegisterClassExW(&wc) == 0 {
                    CLASS_REGISTERED.store(false, Ordering::SeqCst);
                    return Err(anyhow!("Failed to register hotkey window class"));
                }
            }

            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                CLASS_NAME,
                w!("TrayShot Hotkey"),
                WINDOW_STYLE::default(),
                0,
                0,
                0,
                0,
                Some(HWND_MESSAGE),
                None,
                Some(hinstance.into()),
                None,
            )
            .context("Failed to create hotkey message window")?;

            ON_HOTKEY.with(|slot| *slot.borrow_mut() = Some(Box::new(on_hotkey)));

            info!("Hotkey message window created: {:?}", hwnd);
            Ok(Self { hwnd })
        }
    }
}

impl HotkeyProvider for Win32HotkeyProvider {
    fn register(&mut self, id: i32, chord: HotkeyChord) -> Result<()> {
        let mods = (chord.modifiers & modifiers::ALL) | modifiers::NOREPEAT;
        unsafe { RegisterHotKey(Some(self.hwnd), id, HOT_KEY_MODIFIERS(mods), chord.key) }
            .with_context(|| format!("RegisterHotKey({}) failed", chord))
    }

    fn unregister(&mut self, id: i32) -> Result<()> {
        unsafe { UnregisterHotKey(Some(self.hwnd), id) }
            .with_context(|| format!("UnregisterHotKey({}) failed", id))
    }
}

impl Drop for Win32HotkeyProvider {
    fn drop(&mut self) {
        ON_HOTKEY.with(|slot| slot.borrow_mut().take());
        unsafe {
            if let Err(e) = DestroyWindow(self.hwnd) {
                error!("Failed to destroy hotkey window: {}", e);
            }
        }
    }
}

/// Window procedure
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_HOTKEY {
        let id = wparam.0 as i32;
        trace!("WM_HOTKEY id={}", id);
        ON_HOTKEY.with(|slot| {
            if let Some(callback) = slot.borrow().as_ref() {
                callback(id);
            }
        });
        return LRESULT(0);
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}
