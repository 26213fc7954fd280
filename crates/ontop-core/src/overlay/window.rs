use serde::Serialize;
use tokio::time::Instant;

use crate::{
    Error,
    click_through::{ClickThroughController, InputTransparency},
    geometry::{AspectRatio, Bounds, Size},
    monitor::{CursorProbe, PollSubscription, WindowKey},
    registry::OverlayItem,
    settings::OverlaySettings,
};

/// Page inside the app bundle that hosts the embedded content.
pub const HOST_PAGE: &str = "overlay.html";

pub const OVERLAY_LABEL_PREFIX: &str = "overlay-";

/// Everything a backend needs to build one overlay window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub label: String,
    pub item_id: String,
    pub url: String,
    pub title: String,
    pub size: Size,
    pub aspect_ratio: Option<AspectRatio>,
}

impl WindowSpec {
    pub fn for_item(item: &OverlayItem, generation: u64, settings: &OverlaySettings) -> Self {
        let size = if item.width > 0 && item.height > 0 {
            Size::new(item.width as f64, item.height as f64)
        } else {
            Size::new(settings.default_width as f64, settings.default_height as f64)
        };

        Self {
            label: window_label(&item.id, generation),
            item_id: item.id.clone(),
            url: item.url.clone(),
            title: item.name.clone().unwrap_or_else(|| item.url.clone()),
            size,
            aspect_ratio: AspectRatio::from_dimensions(item.width as f64, item.height as f64),
        }
    }

    /// Host page path carrying the item id and content URL as query
    /// parameters.
    pub fn host_page(&self) -> String {
        format!(
            "{}?id={}&url={}",
            HOST_PAGE,
            urlencoding::encode(&self.item_id),
            urlencoding::encode(&self.url)
        )
    }
}

/// Window labels only allow a restricted alphabet, so the item id is
/// sanitised and suffixed with the generation to keep labels unique.
pub fn window_label(id: &str, generation: u64) -> String {
    let safe: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}-{}", OVERLAY_LABEL_PREFIX, safe, generation)
}

/// Payload pushed to the host page on every hover sample.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HoverUpdate {
    pub hovering: bool,
    pub header_visible: bool,
}

/// Creates native overlay windows.
pub trait WindowHost: Send + 'static {
    type Window: OverlayWindow;

    /// Build, elevate and show a window. On failure nothing may be left
    /// behind.
    fn create(&self, spec: &WindowSpec) -> Result<Self::Window, Error>;
}

/// A live native overlay window. Cheap to clone; clones refer to the same
/// window.
pub trait OverlayWindow: CursorProbe + Clone {
    fn label(&self) -> &str;
    fn show_and_focus(&self) -> Result<(), Error>;
    fn set_input_transparency(&self, transparency: InputTransparency) -> Result<(), Error>;
    fn set_size(&self, size: Size) -> Result<(), Error>;
    fn emit_hover(&self, update: HoverUpdate) -> Result<(), Error>;
    fn close(&self) -> Result<(), Error>;
}

/// Header is shown during the grace period after opening and afterwards
/// only while the cursor hovers the window.
pub fn header_visible(hovering: bool, since_open: std::time::Duration, grace: std::time::Duration) -> bool {
    hovering || since_open < grace
}

pub struct OverlayWindowState<W: OverlayWindow> {
    pub id: String,
    pub key: WindowKey,
    pub window: W,
    pub bounds: Bounds,
    pub aspect_ratio: Option<AspectRatio>,
    /// Last size committed to the registry.
    pub committed: Size,
    pub controller: ClickThroughController,
    pub hovering: bool,
    pub opened_at: Instant,
    pub(crate) poll: PollSubscription,
    pub(crate) pointer_poll: Option<PollSubscription>,
}

impl<W: OverlayWindow> OverlayWindowState<W> {
    pub fn click_through(&self) -> bool {
        self.controller.is_passthrough()
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_active()
    }

    pub fn is_tracking_pointer(&self) -> bool {
        self.pointer_poll.as_ref().is_some_and(|p| p.is_active())
    }

    /// Stop every poll tied to this window.
    pub(crate) fn release(&mut self) {
        self.poll.stop();
        if let Some(mut pointer) = self.pointer_poll.take() {
            pointer.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn item(id: &str, width: u32, height: u32) -> OverlayItem {
        OverlayItem {
            id: id.to_string(),
            url: "https://example.com/a b?c=d".to_string(),
            name: None,
            width,
            height,
        }
    }

    #[test]
    fn spec_uses_item_size_and_ratio() {
        let spec = WindowSpec::for_item(&item("1", 1920, 1080), 3, &OverlaySettings::default());
        assert_eq!(spec.size, Size::new(1920.0, 1080.0));
        assert_eq!(spec.label, "overlay-1-3");
        assert!(spec.aspect_ratio.is_some());
    }

    #[test]
    fn spec_falls_back_to_default_size_without_ratio() {
        let spec = WindowSpec::for_item(&item("1", 0, 1080), 1, &OverlaySettings::default());
        assert_eq!(spec.size, Size::new(480.0, 720.0));
        assert!(spec.aspect_ratio.is_none());
    }

    #[test]
    fn host_page_encodes_parameters() {
        let spec = WindowSpec::for_item(&item("1", 480, 720), 1, &OverlaySettings::default());
        assert_eq!(
            spec.host_page(),
            "overlay.html?id=1&url=https%3A%2F%2Fexample.com%2Fa%20b%3Fc%3Dd"
        );
    }

    #[test]
    fn labels_are_sanitised() {
        assert_eq!(window_label("a.b/c", 7), "overlay-a_b_c-7");
    }

    #[test]
    fn header_follows_grace_then_hover() {
        let grace = Duration::from_millis(1000);
        assert!(header_visible(false, Duration::from_millis(200), grace));
        assert!(!header_visible(false, Duration::from_millis(1000), grace));
        assert!(header_visible(true, Duration::from_millis(5000), grace));
    }
}
