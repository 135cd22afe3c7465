// capture/windows.rs - GDI Screen Capture
//
// One BitBlt from the screen DC per capture. Monitor and window bounds come
// straight from Win32; the manifest makes the process per-monitor DPI aware,
// so those bounds are in physical pixels.

use std::mem;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use log::{debug, warn};
use windows::core::BOOL;
use windows::Win32::Foundation::{LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject,
    EnumDisplayMonitors, GetDC, GetDIBits, GetMonitorInfoW, ReleaseDC, SelectObject, BITMAPINFO,
    BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HDC, HMONITOR, MONITORINFO, MONITORINFOF_PRIMARY,
    SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetSystemMetrics, GetWindowRect, SM_CXSCREEN, SM_CYSCREEN,
};

use super::{CaptureRegion, CapturedImage, MonitorInfo, ScreenCaptureProvider};

/// Screen capture through the classic GDI desktop DC
#[derive(Debug, Default)]
pub struct GdiCaptureProvider;

impl GdiCaptureProvider {
    pub fn new() -> Self {
        Self
    }
}

/// EnumDisplayMonitors callback; `data` points at the Vec being filled
unsafe extern "system" fn collect_monitor(
    monitor: HMONITOR,
    _hdc: HDC,
    _clip: *mut RECT,
    data: LPARAM,
) -> BOOL {
    let monitors = &mut *(data.0 as *mut Vec<MonitorInfo>);

    let mut info = MONITORINFO {
        cbSize: mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if GetMonitorInfoW(monitor, &mut info).as_bool() {
        let rc = info.rcMonitor;
        monitors.push(MonitorInfo::new(
            CaptureRegion::from_edges(rc.left, rc.top, rc.right, rc.bottom),
            info.dwFlags & MONITORINFOF_PRIMARY != 0,
        ));
    }
    BOOL(1)
}

impl ScreenCaptureProvider for GdiCaptureProvider {
    fn monitors(&self) -> Result<Vec<MonitorInfo>> {
        let mut monitors: Vec<MonitorInfo> = Vec::new();
        unsafe {
            let _ = EnumDisplayMonitors(
                None,
                None,
                Some(collect_monitor),
                LPARAM(&mut monitors as *mut Vec<MonitorInfo> as isize),
            );
        }

        if monitors.is_empty() {
            // Fallback to screen dimensions
            warn!("EnumDisplayMonitors reported nothing, using primary screen metrics");
            let (width, height) =
                unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
            monitors.push(MonitorInfo::new(CaptureRegion::new(0, 0, width, height), true));
        }

        debug!("Monitors: {:?}", monitors);
        Ok(monitors)
    }

    fn foreground_window_bounds(&self) -> Option<CaptureRegion> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_invalid() {
                return None;
            }

            let mut rect = RECT::default();
            if let Err(e) = GetWindowRect(hwnd, &mut rect) {
                warn!("GetWindowRect failed for foreground window {:?}: {}", hwnd, e);
                return None;
            }
            Some(CaptureRegion::from_edges(rect.left, rect.top, rect.right, rect.bottom))
        }
    }

    fn blit(&self, region: &CaptureRegion) -> Result<CapturedImage> {
        if region.is_degenerate() {
            return Err(anyhow!("Cannot blit degenerate region {:?}", region));
        }

        let width = region.width;
        let height = region.height;
        let mut buffer = vec![0u8; width as usize * height as usize * 4];

        unsafe {
            let screen_dc = GetDC(None);
            if screen_dc.is_invalid() {
                return Err(anyhow!("GetDC for the screen failed"));
            }
            let mem_dc = CreateCompatibleDC(Some(screen_dc));
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let old_bitmap = SelectObject(mem_dc, bitmap.into());

            let blitted = BitBlt(
                mem_dc,
                0,
                0,
                width,
                height,
                Some(screen_dc),
                region.x,
                region.y,
                SRCCOPY,
            );

            // Deselect before GetDIBits; a selected bitmap must not be read
            SelectObject(mem_dc, old_bitmap);

            let mut bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    biHeight: -height, // Negative = top-down
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    biSizeImage: 0,
                    biXPelsPerMeter: 0,
                    biYPelsPerMeter: 0,
                    biClrUsed: 0,
                    biClrImportant: 0,
                },
                bmiColors: [Default::default()],
            };

            let lines = if blitted.is_ok() {
                GetDIBits(
                    mem_dc,
                    bitmap,
                    0,
                    height as u32,
                    Some(buffer.as_mut_ptr() as *mut std::ffi::c_void),
                    &mut bmi,
                    DIB_RGB_COLORS,
                )
            } else {
                0
            };

            let _ = DeleteObject(bitmap.into());
            let _ = DeleteDC(mem_dc);
            ReleaseDC(None, screen_dc);

            blitted.with_context(|| format!("BitBlt failed for {:?}", region))?;
            if lines != height {
                return Err(anyhow!("GetDIBits copied {} of {} lines", lines, height));
            }
        }

        // BGRA to RGBA; GDI leaves alpha at zero
        for pixel in buffer.chunks_exact_mut(4) {
            pixel.swap(0, 2);
            pixel[3] = 255;
        }

        let pixels = RgbaImage::from_raw(width as u32, height as u32, buffer)
            .ok_or_else(|| anyhow!("Pixel buffer does not match {}x{}", width, height))?;
        Ok(CapturedImage::new(*region, pixels))
    }
}
