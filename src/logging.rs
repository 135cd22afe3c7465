//! Logging - env_logger writing to a file next to the settings
//!
//! The logger itself accepts everything; the effective level is the global
//! `log::max_level`, which follows the settings and can change at runtime.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use log::{info, LevelFilter};

use crate::constants::app;
use crate::settings::{self, Settings};

/// Default log file location
pub fn log_path() -> PathBuf {
    settings::config_dir().join(app::LOG_FILE)
}

/// Install the global logger and apply the level from `settings`
///
/// Falls back to stderr when the log file cannot be opened. `RUST_LOG` may narrow
/// (never widen) what the settings allow.
pub fn init(settings: &Settings, path: &Path) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"));
    builder.format_timestamp_millis();

    let file = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(path));
    let opened = match file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            Ok(())
        }
        Err(e) => Err(e),
    };

    if builder.try_init().is_err() {
        // Already installed (tests, or a second init); only adjust the level
        apply(settings);
        return;
    }

    apply(settings);
    match opened {
        Ok(()) => info!("Logging to {:?}", path),
        Err(e) => log::warn!("Cannot open log file {:?} ({}), logging to stderr", path, e),
    }
}

/// Re-apply the level after the logging settings changed
pub fn apply(settings: &Settings) -> LevelFilter {
    let level = settings.effective_log_level();
    log::set_max_level(level);
    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::LogLevel;

    #[test]
    fn apply_follows_settings() {
        let mut settings = Settings {
            log_level: LogLevel::Warn,
            ..Settings::default()
        };
        assert_eq!(apply(&settings), LevelFilter::Warn);
        assert_eq!(log::max_level(), LevelFilter::Warn);

        settings.logging_enabled = false;
        assert_eq!(apply(&settings), LevelFilter::Off);
        assert_eq!(log::max_level(), LevelFilter::Off);
    }

    #[test]
    fn log_path_lives_in_config_folder() {
        let path = log_path();
        assert!(path.ends_with(Path::new(app::NAME).join(app::LOG_FILE)));
    }
}
