//! Tauri backend for the overlay manager.

use tauri::{
    AppHandle, Emitter, EventTarget, LogicalSize, Manager, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder, window::Color,
};
use tracing::warn;

use crate::{
    Error,
    click_through::InputTransparency,
    geometry::{Bounds, Point, Size},
    monitor::CursorProbe,
    overlay::{HoverUpdate, OverlayWindow, WindowHost, WindowSpec, elevate_overlay},
};

/// Event the host page listens on for hover/header updates.
pub const HOVER_EVENT: &str = "overlay-hover-update";

pub struct TauriHost {
    app: AppHandle,
}

impl TauriHost {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl WindowHost for TauriHost {
    type Window = TauriOverlayWindow;

    fn create(&self, spec: &WindowSpec) -> Result<Self::Window, Error> {
        let url = WebviewUrl::App(spec.host_page().into());

        // Created hidden so the window only appears once it has been raised
        // to its final level.
        let window = WebviewWindowBuilder::new(&self.app, &spec.label, url)
            .title(&spec.title)
            .inner_size(spec.size.width, spec.size.height)
            .decorations(false)
            .transparent(true)
            .background_color(Color(0, 0, 0, 0))
            .always_on_top(true)
            .visible_on_all_workspaces(true)
            .skip_taskbar(true)
            .resizable(true)
            .shadow(false)
            .visible(false)
            .build()
            .map_err(|e| Error::WindowCreation(format!("{}: {}", spec.label, e)))?;

        let shown = elevate_overlay(&window).and_then(|_| {
            window
                .show()
                .map_err(|e| Error::WindowCreation(format!("{}: {}", spec.label, e)))
        });

        if let Err(e) = shown {
            if let Err(destroy_err) = window.destroy() {
                warn!(label = %spec.label, error = %destroy_err, "failed to discard half-built overlay");
            }
            return Err(e);
        }

        Ok(TauriOverlayWindow { window })
    }
}

#[derive(Clone)]
pub struct TauriOverlayWindow {
    window: WebviewWindow,
}

impl TauriOverlayWindow {
    pub fn inner(&self) -> &WebviewWindow {
        &self.window
    }

    /// Only failures on a window that no longer exists are reported as
    /// missing; anything else leaves the window's polls running.
    fn window_error(&self, e: tauri::Error) -> Error {
        let label = self.window.label();
        let missing = matches!(e, tauri::Error::WindowNotFound | tauri::Error::WebviewNotFound)
            || self.window.app_handle().get_webview_window(label).is_none();
        if missing {
            Error::WindowNotFound(format!("{} ({})", label, e))
        } else {
            Error::Platform(format!("{}: {}", label, e))
        }
    }
}

impl CursorProbe for TauriOverlayWindow {
    fn cursor_position(&self) -> Result<Point, Error> {
        let scale = self.window.scale_factor().map_err(|e| self.window_error(e))?;
        let cursor = self
            .window
            .cursor_position()
            .map_err(|e| self.window_error(e))?
            .to_logical::<f64>(scale);
        Ok(Point::new(cursor.x, cursor.y))
    }

    fn bounds(&self) -> Result<Bounds, Error> {
        let scale = self.window.scale_factor().map_err(|e| self.window_error(e))?;
        let origin = self
            .window
            .outer_position()
            .map_err(|e| self.window_error(e))?
            .to_logical::<f64>(scale);
        let size = self
            .window
            .outer_size()
            .map_err(|e| self.window_error(e))?
            .to_logical::<f64>(scale);
        Ok(Bounds::new(origin.x, origin.y, size.width, size.height))
    }
}

impl OverlayWindow for TauriOverlayWindow {
    fn label(&self) -> &str {
        self.window.label()
    }

    fn show_and_focus(&self) -> Result<(), Error> {
        self.window.show().map_err(|e| self.window_error(e))?;
        self.window.unminimize().map_err(|e| self.window_error(e))?;
        self.window.set_focus().map_err(|e| self.window_error(e))?;
        Ok(())
    }

    // Tauri has no forwarding variant; pointer tracking in the manager
    // stands in for forwarded enter/leave events.
    fn set_input_transparency(&self, transparency: InputTransparency) -> Result<(), Error> {
        self.window
            .set_ignore_cursor_events(transparency.is_transparent())
            .map_err(|e| self.window_error(e))
    }

    fn set_size(&self, size: Size) -> Result<(), Error> {
        self.window
            .set_size(LogicalSize::new(size.width, size.height))
            .map_err(|e| self.window_error(e))
    }

    fn emit_hover(&self, update: HoverUpdate) -> Result<(), Error> {
        let target = EventTarget::WebviewWindow {
            label: self.window.label().to_string(),
        };
        self.window
            .emit_to(target, HOVER_EVENT, update)
            .map_err(|e| self.window_error(e))
    }

    fn close(&self) -> Result<(), Error> {
        self.window.close().map_err(|e| self.window_error(e))
    }
}
