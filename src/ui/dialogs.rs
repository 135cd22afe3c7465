// ui/dialogs.rs - Native Dialogs
//
// Message boxes and the folder picker. All of these block the calling thread
// until the user answers.

use std::path::{Path, PathBuf};

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};

use crate::constants::app;

/// Non-fatal problem the user should know about (hotkey taken, settings not saved)
pub fn warn(title: &str, error: &anyhow::Error) {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(format!("{} - {}", app::NAME, title))
        .set_description(format!("{:#}", error))
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Startup failure; the process exits after this
pub fn fatal(error: &anyhow::Error) {
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(app::NAME)
        .set_description(format!("{} could not start:\n\n{:#}", app::NAME, error))
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Ask for a screenshot folder, starting at `current`
pub fn pick_folder(current: &Path) -> Option<PathBuf> {
    let mut dialog = FileDialog::new().set_title("Choose screenshot folder");
    if current.is_dir() {
        dialog = dialog.set_directory(current);
    }
    dialog.pick_folder()
}
