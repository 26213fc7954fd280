pub mod manager;
pub mod platform;
pub mod tauri_host;
pub mod window;

pub use manager::{ControlEvent, OverlayManager, SizeCommit};
pub use platform::elevate_overlay;
pub use tauri_host::{HOVER_EVENT, TauriHost, TauriOverlayWindow};
pub use window::*;
