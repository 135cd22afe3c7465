//! Autostart through the per-user `Run` registry key

use std::io::ErrorKind;

use anyhow::{Context, Result};
use log::info;
use winreg::enums::HKEY_CURRENT_USER;
use winreg::RegKey;

use super::AutostartProvider;
use crate::constants::app;

const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// `HKCU\...\Run\TrayShot = "<path to exe>"`
#[derive(Debug, Default)]
pub struct RegistryAutostart;

impl RegistryAutostart {
    pub fn new() -> Self {
        Self
    }

    fn run_key() -> Result<RegKey> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (key, _) = hkcu
            .create_subkey(RUN_KEY)
            .context("Failed to open the Run registry key")?;
        Ok(key)
    }
}

impl AutostartProvider for RegistryAutostart {
    fn is_enabled(&self) -> Result<bool> {
        let key = Self::run_key()?;
        match key.get_value::<String, _>(app::NAME) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("Failed to read autostart value"),
        }
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        let key = Self::run_key()?;
        if enabled {
            let exe = std::env::current_exe().context("Failed to locate current executable")?;
            let command = format!("\"{}\"", exe.display());
            key.set_value(app::NAME, &command)
                .context("Failed to write autostart value")?;
            info!("Autostart enabled: {}", command);
        } else {
            match key.delete_value(app::NAME) {
                Ok(()) => info!("Autostart disabled"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e).context("Failed to remove autostart value"),
            }
        }
        Ok(())
    }
}
