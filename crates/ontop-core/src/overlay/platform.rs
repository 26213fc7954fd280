//! Platform-specific overlay elevation
//!
//! Overlay windows must stay visible above full-screen applications and
//! games and follow the user across virtual desktops. The cross-platform
//! builder flags (always-on-top, visible on all workspaces) get most of the
//! way there; this module raises the native window to the highest level each
//! platform offers.

use tauri::WebviewWindow;
use tracing::debug;

use crate::Error;

/// Raise an overlay window above full-screen content.
pub fn elevate_overlay(window: &WebviewWindow) -> Result<(), Error> {
    debug!(label = %window.label(), "elevating overlay window");

    #[cfg(target_os = "macos")]
    elevate_overlay_macos(window)?;

    #[cfg(target_os = "windows")]
    elevate_overlay_windows(window)?;

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        // The always_on_top and visible_on_all_workspaces builder flags are
        // all the window managers here support.
        let _ = window;
    }

    Ok(())
}

/// Screen-saver window level, joins every space including full-screen ones.
#[cfg(target_os = "macos")]
fn elevate_overlay_macos(window: &WebviewWindow) -> Result<(), Error> {
    let ns_window_ptr = window
        .ns_window()
        .map_err(|e| Error::WindowCreation(format!("Failed to get NSWindow handle: {}", e)))?;

    // AppKit calls must happen on the main thread; only the address crosses
    // the thread boundary.
    let ptr_addr = ns_window_ptr as usize;

    window
        .run_on_main_thread(move || {
            use objc2::rc::Retained;
            use objc2_app_kit::{NSScreenSaverWindowLevel, NSWindow, NSWindowCollectionBehavior};

            // SAFETY: the window outlives this closure, which runs before
            // the overlay is shown.
            let ns_window: Option<Retained<NSWindow>> =
                unsafe { Retained::retain(ptr_addr as *mut NSWindow) };
            let Some(ns_window) = ns_window else {
                tracing::warn!("NSWindow pointer was null, overlay not elevated");
                return;
            };

            ns_window.setLevel(NSScreenSaverWindowLevel);
            ns_window.setHasShadow(false);

            let behavior = NSWindowCollectionBehavior::CanJoinAllSpaces
                | NSWindowCollectionBehavior::Stationary
                | NSWindowCollectionBehavior::IgnoresCycle
                | NSWindowCollectionBehavior::FullScreenAuxiliary;
            ns_window.setCollectionBehavior(behavior);
        })
        .map_err(|e| Error::WindowCreation(format!("Failed to run on main thread: {}", e)))?;

    Ok(())
}

/// Tool window (no taskbar or Alt+Tab entry) pinned to the topmost band.
#[cfg(target_os = "windows")]
fn elevate_overlay_windows(window: &WebviewWindow) -> Result<(), Error> {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{
        GWL_EXSTYLE, GetWindowLongPtrW, HWND_TOPMOST, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
        SetWindowLongPtrW, SetWindowPos, WS_EX_TOOLWINDOW,
    };

    let hwnd = window
        .hwnd()
        .map_err(|e| Error::WindowCreation(format!("Failed to get HWND handle: {}", e)))?;

    unsafe {
        let hwnd = HWND(hwnd.0);

        let mut ex_style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
        ex_style |= WS_EX_TOOLWINDOW.0 as isize;
        SetWindowLongPtrW(hwnd, GWL_EXSTYLE, ex_style);

        SetWindowPos(
            hwnd,
            Some(HWND_TOPMOST),
            0,
            0,
            0,
            0,
            SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
        )
        .map_err(|e| Error::WindowCreation(format!("Failed to set window position: {}", e)))?;
    }

    Ok(())
}
