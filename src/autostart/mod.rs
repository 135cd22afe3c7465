//! Autostart - launch at user logon

#[cfg(windows)]
pub mod windows;

use anyhow::Result;
use log::info;

/// OS mechanism that starts the application at logon
pub trait AutostartProvider {
    fn is_enabled(&self) -> Result<bool>;
    fn set_enabled(&self, enabled: bool) -> Result<()>;
}

/// Bring the OS registration in line with the stored setting
///
/// When wanted the entry is always rewritten so it follows a moved executable.
pub fn reconcile(provider: &dyn AutostartProvider, wanted: bool) -> Result<()> {
    if wanted {
        provider.set_enabled(true)?;
        info!("Autostart entry refreshed");
    } else if provider.is_enabled()? {
        provider.set_enabled(false)?;
        info!("Stale autostart entry removed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeAutostart {
        enabled: Cell<bool>,
        writes: RefCell<Vec<bool>>,
    }

    impl AutostartProvider for FakeAutostart {
        fn is_enabled(&self) -> Result<bool> {
            Ok(self.enabled.get())
        }

        fn set_enabled(&self, enabled: bool) -> Result<()> {
            self.writes.borrow_mut().push(enabled);
            self.enabled.set(enabled);
            Ok(())
        }
    }

    #[test]
    fn wanted_entry_is_rewritten_even_if_present() {
        let fake = FakeAutostart::default();
        fake.enabled.set(true);

        reconcile(&fake, true).unwrap();

        assert_eq!(*fake.writes.borrow(), vec![true]);
        assert!(fake.enabled.get());
    }

    #[test]
    fn unwanted_entry_is_removed() {
        let fake = FakeAutostart::default();
        fake.enabled.set(true);

        reconcile(&fake, false).unwrap();

        assert_eq!(*fake.writes.borrow(), vec![false]);
        assert!(!fake.enabled.get());
    }

    #[test]
    fn absent_and_unwanted_touches_nothing() {
        let fake = FakeAutostart::default();

        reconcile(&fake, false).unwrap();

        assert!(fake.writes.borrow().is_empty());
    }
}
