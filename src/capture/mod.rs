// capture/mod.rs - Screen Capture Module
//
// Region arithmetic and the capture engine are platform-independent.
// The pixels themselves come from a ScreenCaptureProvider; the Windows one
// lives in the windows submodule.

#[cfg(target_os = "windows")]
pub mod windows;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use image::RgbaImage;
use log::{debug, info};

pub use crate::settings::CaptureMode;

/// Screen region to capture, in virtual-desktop coordinates
///
/// Signed so that monitors left of or above the primary, and degenerate sizes
/// reported by the OS, are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from left/top/right/bottom edges (Win32 RECT layout)
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Nothing to blit
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// One connected display as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorInfo {
    pub bounds: CaptureRegion,
    pub primary: bool,
}

impl MonitorInfo {
    pub fn new(bounds: CaptureRegion, primary: bool) -> Self {
        Self { bounds, primary }
    }
}

/// Pixels of one capture, RGBA, sized to the captured region
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Where on the desktop the pixels came from
    pub region: CaptureRegion,
    pub pixels: RgbaImage,
}

impl CapturedImage {
    pub fn new(region: CaptureRegion, pixels: RgbaImage) -> Self {
        Self { region, pixels }
    }

    /// 1x1 blank stand-in for a degenerate region
    pub fn placeholder(region: CaptureRegion) -> Self {
        Self {
            region,
            pixels: RgbaImage::new(1, 1),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// OS access needed to take a screenshot
pub trait ScreenCaptureProvider: Send + Sync {
    /// Bounds of every connected monitor
    fn monitors(&self) -> Result<Vec<MonitorInfo>>;

    /// Bounds of the foreground window, `None` if there is none or the query fails
    fn foreground_window_bounds(&self) -> Option<CaptureRegion>;

    /// Copy the desktop's current contents inside `region` (never degenerate)
    fn blit(&self, region: &CaptureRegion) -> Result<CapturedImage>;
}

/// Primary monitor bounds; first monitor if none is flagged; empty if no monitors
pub fn primary_bounds(monitors: &[MonitorInfo]) -> CaptureRegion {
    monitors
        .iter()
        .find(|m| m.primary)
        .or_else(|| monitors.first())
        .map(|m| m.bounds)
        .unwrap_or_default()
}

/// Axis-aligned box covering every monitor
pub fn virtual_desktop_bounds(monitors: &[MonitorInfo]) -> CaptureRegion {
    let Some(first) = monitors.first() else {
        return CaptureRegion::default();
    };

    let (mut min_x, mut min_y) = (first.bounds.x, first.bounds.y);
    let (mut max_x, mut max_y) = (first.bounds.right(), first.bounds.bottom());
    for monitor in &monitors[1..] {
        min_x = min_x.min(monitor.bounds.x);
        min_y = min_y.min(monitor.bounds.y);
        max_x = max_x.max(monitor.bounds.right());
        max_y = max_y.max(monitor.bounds.bottom());
    }

    CaptureRegion::from_edges(min_x, min_y, max_x, max_y)
}

/// Region a capture in `mode` covers for the given monitor topology
pub fn resolve_region(
    mode: CaptureMode,
    monitors: &[MonitorInfo],
    foreground: Option<CaptureRegion>,
) -> CaptureRegion {
    match mode {
        CaptureMode::ActiveScreen => primary_bounds(monitors),
        CaptureMode::ActiveWindow => foreground.unwrap_or_else(|| primary_bounds(monitors)),
        CaptureMode::VirtualDesktop => virtual_desktop_bounds(monitors),
    }
}

/// Turns a capture mode into pixels
///
/// Holds no state between captures apart from a counter used in log lines.
pub struct CaptureEngine {
    provider: Arc<dyn ScreenCaptureProvider>,
    invocations: AtomicU64,
}

impl CaptureEngine {
    pub fn new(provider: Arc<dyn ScreenCaptureProvider>) -> Self {
        Self {
            provider,
            invocations: AtomicU64::new(0),
        }
    }

    /// Number of captures started so far
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Capture using the provider's current monitor and foreground-window state
    pub fn capture(&self, mode: CaptureMode) -> Result<CapturedImage> {
        let count = self.next_invocation();
        let monitors = self
            .provider
            .monitors()
            .with_context(|| format!("Capture #{}: monitor enumeration failed", count))?;
        let foreground = match mode {
            CaptureMode::ActiveWindow => {
                let bounds = self.provider.foreground_window_bounds();
                if bounds.is_none() {
                    info!("No foreground window bounds, capturing active screen instead");
                }
                bounds
            }
            _ => None,
        };
        self.capture_numbered(count, mode, &monitors, foreground)
    }

    /// Capture for an explicit monitor list and foreground-window bounds
    pub fn capture_with(
        &self,
        mode: CaptureMode,
        monitors: &[MonitorInfo],
        foreground: Option<CaptureRegion>,
    ) -> Result<CapturedImage> {
        let count = self.next_invocation();
        self.capture_numbered(count, mode, monitors, foreground)
    }

    fn next_invocation(&self) -> u64 {
        self.invocations.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn capture_numbered(
        &self,
        count: u64,
        mode: CaptureMode,
        monitors: &[MonitorInfo],
        foreground: Option<CaptureRegion>,
    ) -> Result<CapturedImage> {
        let region = resolve_region(mode, monitors, foreground);
        debug!(
            "Capture #{}: mode={:?} monitors={} region={:?}",
            count,
            mode,
            monitors.len(),
            region
        );

        if region.is_degenerate() {
            info!("Capture #{}: degenerate region {:?}, using 1x1 placeholder", count, region);
            return Ok(CapturedImage::placeholder(region));
        }

        let image = self.provider.blit(&region)?;
        if image.width() != region.width as u32 || image.height() != region.height as u32 {
            bail!(
                "Blit returned {}x{} for a {}x{} region",
                image.width(),
                image.height(),
                region.width,
                region.height
            );
        }
        Ok(image)
    }
}
