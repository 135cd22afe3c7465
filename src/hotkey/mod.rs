//! Global hotkey - chord model and registration state machine
//!
//! A chord is a Win32 modifier mask plus a virtual-key code, exactly what
//! `RegisterHotKey` takes. The OS side lives behind [`HotkeyProvider`].

#[cfg(windows)]
pub mod windows;

use std::fmt;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use crate::constants::{modifiers, vk};

/// Shortcuts offered in the tray menu
pub const PRESETS: &[&str] = &[
    "PrintScreen",
    "Ctrl+PrintScreen",
    "Ctrl+Shift+PrintScreen",
    "Ctrl+Shift+S",
    "Ctrl+Alt+S",
];

/// Modifier mask + key code identifying one global hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotkeyChord {
    pub modifiers: u32,
    pub key: u32,
}

impl HotkeyChord {
    pub fn new(modifiers: u32, key: u32) -> Self {
        Self { modifiers, key }
    }

    /// Parse a shortcut string like "Ctrl+Shift+S"
    pub fn parse(s: &str) -> Result<Self> {
        let mut mods = 0u32;
        let mut key: Option<u32> = None;

        for token in s.split('+') {
            let token = token.trim();
            match token.to_lowercase().as_str() {
                "ctrl" | "control" => mods |= modifiers::CONTROL,
                "alt" => mods |= modifiers::ALT,
                "shift" => mods |= modifiers::SHIFT,
                "win" | "super" | "meta" => mods |= modifiers::WIN,
                _ => {
                    if key.is_some() {
                        bail!("multiple key codes in shortcut: {s:?}");
                    }
                    key = Some(parse_key(token)?);
                }
            }
        }

        let key = key.with_context(|| format!("no key code found in shortcut: {s:?}"))?;
        Ok(Self::new(mods, key))
    }

    /// Every preset, parsed
    pub fn presets() -> Vec<HotkeyChord> {
        PRESETS
            .iter()
            .filter_map(|p| HotkeyChord::parse(p).ok())
            .collect()
    }

    pub fn is_preset(&self) -> bool {
        Self::presets().contains(self)
    }
}

impl fmt::Display for HotkeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (modifiers::CONTROL, "Ctrl"),
            (modifiers::ALT, "Alt"),
            (modifiers::SHIFT, "Shift"),
            (modifiers::WIN, "Win"),
        ];
        for (bit, name) in names {
            if self.modifiers & bit != 0 {
                write!(f, "{}+", name)?;
            }
        }
        match key_name(self.key) {
            Some(name) => f.write_str(&name),
            None => write!(f, "0x{:02X}", self.key),
        }
    }
}

/// Map a key name to a virtual-key code.
fn parse_key(token: &str) -> Result<u32> {
    let mut chars = token.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphabetic() {
            return Ok(vk::KEY_A + (ch.to_ascii_uppercase() as u32 - 'A' as u32));
        }
        if ch.is_ascii_digit() {
            return Ok(vk::DIGIT_0 + (ch as u32 - '0' as u32));
        }
    }

    let lower = token.to_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
        if (1..=24).contains(&n) {
            return Ok(vk::F1 + n - 1);
        }
    }

    let code = match lower.as_str() {
        "printscreen" | "prtsc" | "print" => vk::SNAPSHOT,
        "space" => vk::SPACE,
        "enter" | "return" => vk::RETURN,
        "tab" => vk::TAB,
        "escape" | "esc" => vk::ESCAPE,
        "backspace" => vk::BACK,
        "insert" | "ins" => vk::INSERT,
        "delete" | "del" => vk::DELETE,
        "home" => vk::HOME,
        "end" => vk::END,
        "pageup" => vk::PRIOR,
        "pagedown" => vk::NEXT,
        "pause" => vk::PAUSE,
        "up" => vk::UP,
        "down" => vk::DOWN,
        "left" => vk::LEFT,
        "right" => vk::RIGHT,
        _ => bail!("unknown key: {token:?}"),
    };
    Ok(code)
}

fn key_name(code: u32) -> Option<String> {
    let name = match code {
        c if (vk::KEY_A..vk::KEY_A + 26).contains(&c) => {
            char::from_u32(c).map(String::from)?
        }
        c if (vk::DIGIT_0..vk::DIGIT_0 + 10).contains(&c) => {
            char::from_u32(c).map(String::from)?
        }
        c if (vk::F1..=vk::F24).contains(&c) => format!("F{}", c - vk::F1 + 1),
        vk::SNAPSHOT => "PrintScreen".into(),
        vk::SPACE => "Space".into(),
        vk::RETURN => "Enter".into(),
        vk::TAB => "Tab".into(),
        vk::ESCAPE => "Escape".into(),
        vk::BACK => "Backspace".into(),
        vk::INSERT => "Insert".into(),
        vk::DELETE => "Delete".into(),
        vk::HOME => "Home".into(),
        vk::END => "End".into(),
        vk::PRIOR => "PageUp".into(),
        vk::NEXT => "PageDown".into(),
        vk::PAUSE => "Pause".into(),
        vk::UP => "Up".into(),
        vk::DOWN => "Down".into(),
        vk::LEFT => "Left".into(),
        vk::RIGHT => "Right".into(),
        _ => return None,
    };
    Some(name)
}

/// OS primitive for system-wide hotkeys
pub trait HotkeyProvider {
    fn register(&mut self, id: i32, chord: HotkeyChord) -> Result<()>;
    fn unregister(&mut self, id: i32) -> Result<()>;
}

/// Where the registrar stands with the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registered(HotkeyChord),
}

/// Keeps exactly one hotkey id bound to the configured chord
///
/// Every [`apply`](Self::apply) goes through `Unregistered` first. A failed
/// registration leaves it there: no retry, no fallback chord.
pub struct HotkeyRegistrar<P: HotkeyProvider> {
    provider: P,
    id: i32,
    state: RegistrationState,
}

impl<P: HotkeyProvider> HotkeyRegistrar<P> {
    pub fn new(provider: P, id: i32) -> Self {
        Self {
            provider,
            id,
            state: RegistrationState::Unregistered,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Bind the hotkey id to `chord`
    pub fn apply(&mut self, chord: HotkeyChord) -> Result<()> {
        self.unregister();

        self.provider
            .register(self.id, chord)
            .with_context(|| format!("Hotkey {} could not be registered", chord))?;

        self.state = RegistrationState::Registered(chord);
        info!("Global hotkey registered: {}", chord);
        Ok(())
    }

    /// Release the hotkey id; the OS result is only logged
    pub fn unregister(&mut self) {
        if let Err(e) = self.provider.unregister(self.id) {
            debug!("Unregister hotkey {} ignored: {:#}", self.id, e);
        }
        if let RegistrationState::Registered(previous) = self.state {
            debug!("Hotkey {} released", previous);
        }
        self.state = RegistrationState::Unregistered;
    }
}

impl<P: HotkeyProvider> Drop for HotkeyRegistrar<P> {
    fn drop(&mut self) {
        if matches!(self.state, RegistrationState::Registered(_)) {
            if let Err(e) = self.provider.unregister(self.id) {
                warn!("Failed to release hotkey on shutdown: {:#}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Register(i32, HotkeyChord),
        Unregister(i32),
    }

    /// Records calls; refuses chords listed in `taken`
    #[derive(Default)]
    struct FakeProvider {
        calls: Vec<Call>,
        taken: HashSet<HotkeyChord>,
        fail_unregister: bool,
    }

    impl HotkeyProvider for FakeProvider {
        fn register(&mut self, id: i32, chord: HotkeyChord) -> Result<()> {
            self.calls.push(Call::Register(id, chord));
            if self.taken.contains(&chord) {
                return Err(anyhow!("hotkey already registered"));
            }
            Ok(())
        }

        fn unregister(&mut self, id: i32) -> Result<()> {
            self.calls.push(Call::Unregister(id));
            if self.fail_unregister {
                return Err(anyhow!("not registered"));
            }
            Ok(())
        }
    }

    fn chord(s: &str) -> HotkeyChord {
        HotkeyChord::parse(s).unwrap()
    }

    #[test]
    fn parse_ctrl_shift_s() {
        let hk = chord("Ctrl+Shift+S");
        assert_eq!(hk, HotkeyChord::new(modifiers::CONTROL | modifiers::SHIFT, 0x53));
    }

    #[test]
    fn parse_case_insensitive_named_keys() {
        assert_eq!(chord("ctrl+alt+printscreen"), HotkeyChord::new(0x3, 0x2C));
        assert_eq!(chord("win+F12"), HotkeyChord::new(modifiers::WIN, 0x7B));
        assert_eq!(chord("Shift + 7"), HotkeyChord::new(modifiers::SHIFT, 0x37));
    }

    #[test]
    fn parse_single_key() {
        assert_eq!(chord("PrintScreen"), HotkeyChord::new(0, vk::SNAPSHOT));
    }

    #[test]
    fn parse_errors() {
        assert!(HotkeyChord::parse("Ctrl+Alt").is_err());
        assert!(HotkeyChord::parse("Ctrl+Banana").is_err());
        assert!(HotkeyChord::parse("Ctrl+A+B").is_err());
        assert!(HotkeyChord::parse("F25").is_err());
    }

    #[test]
    fn presets_display_as_written() {
        for preset in PRESETS {
            assert_eq!(chord(preset).to_string(), *preset);
        }
        assert_eq!(HotkeyChord::presets().len(), PRESETS.len());
    }

    #[test]
    fn unknown_key_displays_as_hex() {
        assert_eq!(HotkeyChord::new(modifiers::ALT, 0xBA).to_string(), "Alt+0xBA");
    }

    #[test]
    fn reapplying_a_conflicted_chord_retries_registration() {
        let taken = chord("Ctrl+PrintScreen");
        let mut provider = FakeProvider::default();
        provider.taken.insert(taken);
        let mut registrar = HotkeyRegistrar::new(provider, 3);

        assert!(registrar.apply(taken).is_err());
        assert_eq!(registrar.state(), RegistrationState::Unregistered);

        // Other application released it; picking the same chord again binds it
        registrar.provider_mut().taken.clear();
        registrar.apply(taken).unwrap();

        assert_eq!(registrar.state(), RegistrationState::Registered(taken));
        let registers = registrar
            .provider()
            .calls
            .iter()
            .filter(|c| **c == Call::Register(3, taken))
            .count();
        assert_eq!(registers, 2);
    }

    #[test]
    fn apply_unregisters_before_registering() {
        let mut registrar = HotkeyRegistrar::new(FakeProvider::default(), 7);

        registrar.apply(chord("Ctrl+Shift+S")).unwrap();
        registrar.apply(chord("PrintScreen")).unwrap();

        assert_eq!(
            registrar.provider().calls,
            vec![
                Call::Unregister(7),
                Call::Register(7, chord("Ctrl+Shift+S")),
                Call::Unregister(7),
                Call::Register(7, chord("PrintScreen")),
            ]
        );
        assert_eq!(registrar.state(), RegistrationState::Registered(chord("PrintScreen")));
    }

    #[test]
    fn unregister_failure_is_ignored() {
        let provider = FakeProvider {
            fail_unregister: true,
            ..Default::default()
        };
        let mut registrar = HotkeyRegistrar::new(provider, 1);

        registrar.apply(chord("Ctrl+Alt+S")).unwrap();

        assert_eq!(registrar.state(), RegistrationState::Registered(chord("Ctrl+Alt+S")));
    }

    #[test]
    fn conflict_leaves_registrar_unregistered_without_retry() {
        let mut provider = FakeProvider::default();
        provider.taken.insert(chord("PrintScreen"));
        let mut registrar = HotkeyRegistrar::new(provider, 1);
        registrar.apply(chord("Ctrl+Shift+S")).unwrap();

        let err = registrar.apply(chord("PrintScreen")).unwrap_err();

        assert!(err.to_string().contains("PrintScreen"));
        assert_eq!(registrar.state(), RegistrationState::Unregistered);
        let registers = registrar
            .provider()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Register(..)))
            .count();
        assert_eq!(registers, 2);
    }
}
