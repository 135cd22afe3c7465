//! Screenshot persistence - PNG files named after the local capture time

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::ImageFormat;
use log::info;

use crate::capture::CapturedImage;
use crate::constants::app;

/// `Screenshot_<yyyy-MM-dd_HH-mm-ss-fff>.png`
pub fn screenshot_file_name(timestamp: &DateTime<Local>) -> String {
    format!(
        "{}{}.png",
        app::SCREENSHOT_PREFIX,
        timestamp.format(app::SCREENSHOT_TIMESTAMP_FORMAT)
    )
}

/// Save `image` under `directory`, stamped with the current local time
pub fn save(image: &CapturedImage, directory: &Path) -> Result<PathBuf> {
    save_at(image, directory, &Local::now())
}

/// Save `image` under `directory` with an explicit timestamp
///
/// The directory (and its parents) is created when missing. A file from the same
/// millisecond is overwritten. Encoding happens before anything touches the disk,
/// so an encoder error leaves no file behind.
pub fn save_at(image: &CapturedImage, directory: &Path, timestamp: &DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create screenshot folder {:?}", directory))?;

    let mut png = Vec::new();
    image
        .pixels
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode PNG")?;

    let path = directory.join(screenshot_file_name(timestamp));
    fs::write(&path, &png).with_context(|| format!("Failed to write {:?}", path))?;

    info!(
        "Saved {}x{} screenshot to {:?} ({} bytes)",
        image.width(),
        image.height(),
        path,
        png.len()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureRegion;
    use chrono::{Duration, TimeZone};
    use image::{Rgba, RgbaImage};

    fn image(width: u32, height: u32) -> CapturedImage {
        CapturedImage::new(
            CaptureRegion::new(0, 0, width as i32, height as i32),
            RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255])),
        )
    }

    fn at(ms: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn file_name_has_millisecond_timestamp() {
        assert_eq!(screenshot_file_name(&at(42)), "Screenshot_2024-03-09_07-05-03-042.png");
    }

    #[test]
    fn names_one_millisecond_apart_sort_in_time_order() {
        let names: Vec<String> = [0, 1, 2, 999, 1000, 61_000, 3_600_000]
            .into_iter()
            .map(|ms| screenshot_file_name(&at(ms)))
            .collect();

        for pair in names.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn save_creates_missing_folders_and_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b");

        let path = save_at(&image(4, 3), &target, &at(7)).unwrap();

        assert_eq!(path, target.join("Screenshot_2024-03-09_07-05-03-007.png"));
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(*decoded.get_pixel(3, 2), Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn same_millisecond_overwrites() {
        let dir = tempfile::tempdir().unwrap();

        let first = save_at(&image(2, 2), dir.path(), &at(5)).unwrap();
        let second = save_at(&image(5, 1), dir.path(), &at(5)).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(image::open(&second).unwrap().width(), 5);
    }

    #[test]
    fn placeholder_saves_as_one_pixel_png() {
        let dir = tempfile::tempdir().unwrap();
        let placeholder = CapturedImage::placeholder(CaptureRegion::new(0, 0, 0, 0));

        let path = save(&placeholder, dir.path()).unwrap();

        assert_eq!(image::open(&path).unwrap().to_rgba8().dimensions(), (1, 1));
    }

    #[test]
    fn encode_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let empty = CapturedImage::new(CaptureRegion::new(0, 0, 0, 0), RgbaImage::new(0, 0));

        assert!(save_at(&empty, dir.path(), &at(0)).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unwritable_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-folder");
        fs::write(&blocker, b"x").unwrap();

        assert!(save_at(&image(1, 1), &blocker, &at(0)).is_err());
    }
}
