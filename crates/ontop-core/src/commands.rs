//! IPC surface used by the main window and the overlay host page.
//!
//! Everything that touches the overlay manager is async so it runs off the
//! main thread: window creation and most window getters block on the event
//! loop, which would deadlock against a command holding the manager lock.

use std::sync::Mutex;

use serde::Serialize;
use tauri::{AppHandle, State, WebviewWindow, command};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tracing::{error, info};

use crate::{
    autostart::LoginItem,
    geometry::Point,
    overlay::{OverlayManager, TauriHost},
    registry::{NewOverlayItem, OverlayItem, OverlayRegistry, SIZE_PRESETS, SizePreset},
};

pub struct OverlayState(pub Mutex<OverlayManager<TauriHost>>);
pub struct RegistryState(pub Mutex<OverlayRegistry>);
pub struct StartupState(pub Option<LoginItem>);

/// Click-through and hover state reported back to an overlay host page.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayStatus {
    pub id: String,
    pub click_through: bool,
    pub hovering: bool,
}

#[command]
pub fn list_items(registry: State<'_, RegistryState>) -> Result<Vec<OverlayItem>, String> {
    let registry = registry.0.lock().map_err(|e| e.to_string())?;
    Ok(registry.list_items())
}

#[command]
pub fn add_item(
    registry: State<'_, RegistryState>,
    item: NewOverlayItem,
) -> Result<Vec<OverlayItem>, String> {
    let mut registry = registry.0.lock().map_err(|e| e.to_string())?;
    let created = registry.create_item(item).map_err(|e| e.to_string())?;
    info!(id = %created.id, url = %created.url, "overlay item added");
    Ok(registry.list_items())
}

/// Delete an item, closing its overlay first if one is open.
#[command]
pub async fn remove_item(
    overlays: State<'_, OverlayState>,
    registry: State<'_, RegistryState>,
    id: String,
) -> Result<Vec<OverlayItem>, String> {
    {
        let mut manager = overlays.0.lock().map_err(|e| e.to_string())?;
        manager.close(&id);
    }

    let mut registry = registry.0.lock().map_err(|e| e.to_string())?;
    registry.remove_item(&id).map_err(|e| e.to_string())
}

#[command]
pub fn update_item_size(
    registry: State<'_, RegistryState>,
    id: String,
    width: u32,
    height: u32,
) -> Result<Vec<OverlayItem>, String> {
    let mut registry = registry.0.lock().map_err(|e| e.to_string())?;
    registry
        .update_size(&id, width, height)
        .map_err(|e| e.to_string())
}

#[command]
pub fn list_size_presets() -> Vec<SizePreset> {
    SIZE_PRESETS.to_vec()
}

/// Open (or focus) the overlay for a registry item. Failures are also shown
/// to the user as a native dialog.
#[command]
pub async fn open_overlay(
    app: AppHandle,
    overlays: State<'_, OverlayState>,
    registry: State<'_, RegistryState>,
    id: String,
) -> Result<String, String> {
    let item = {
        let registry = registry.0.lock().map_err(|e| e.to_string())?;
        registry.get(&id).cloned()
    };
    let Some(item) = item else {
        let message = format!("Overlay item {} not found", id);
        notify_failure(&app, &message);
        return Err(message);
    };

    let opened = {
        let mut manager = overlays.0.lock().map_err(|e| e.to_string())?;
        manager.open(&item).map(|window| window.inner().label().to_string())
    };

    opened.map_err(|e| {
        let message = e.to_string();
        notify_failure(&app, &format!("Could not open {}: {}", item.url, message));
        message
    })
}

#[command]
pub async fn close_overlay(overlays: State<'_, OverlayState>, id: String) -> Result<bool, String> {
    let mut manager = overlays.0.lock().map_err(|e| e.to_string())?;
    Ok(manager.close(&id))
}

#[command]
pub async fn close_all_overlays(overlays: State<'_, OverlayState>) -> Result<(), String> {
    let mut manager = overlays.0.lock().map_err(|e| e.to_string())?;
    manager.teardown();
    Ok(())
}

#[command]
pub async fn list_open_overlays(overlays: State<'_, OverlayState>) -> Result<Vec<String>, String> {
    let manager = overlays.0.lock().map_err(|e| e.to_string())?;
    let mut ids = manager.ids();
    ids.sort();
    Ok(ids)
}

#[command]
pub async fn overlay_status(
    window: WebviewWindow,
    overlays: State<'_, OverlayState>,
) -> Result<OverlayStatus, String> {
    let manager = overlays.0.lock().map_err(|e| e.to_string())?;
    let id = overlay_id(&manager, &window)?;
    let state = manager
        .state(&id)
        .ok_or_else(|| format!("Overlay {} is not open", id))?;

    Ok(OverlayStatus {
        id,
        click_through: state.click_through(),
        hovering: state.hovering,
    })
}

#[command]
pub async fn overlay_set_click_through(
    window: WebviewWindow,
    overlays: State<'_, OverlayState>,
    enabled: bool,
) -> Result<bool, String> {
    let mut manager = overlays.0.lock().map_err(|e| e.to_string())?;
    let id = overlay_id(&manager, &window)?;
    manager
        .set_click_through(&id, enabled)
        .map_err(|e| e.to_string())
}

#[command]
pub async fn overlay_toggle_click_through(
    window: WebviewWindow,
    overlays: State<'_, OverlayState>,
) -> Result<bool, String> {
    let mut manager = overlays.0.lock().map_err(|e| e.to_string())?;
    let id = overlay_id(&manager, &window)?;
    manager.toggle_click_through(&id).map_err(|e| e.to_string())
}

/// Pointer position reported by the host page, in window-local logical
/// coordinates.
#[command]
pub async fn overlay_pointer_moved(
    window: WebviewWindow,
    overlays: State<'_, OverlayState>,
    x: f64,
    y: f64,
) -> Result<(), String> {
    let mut manager = overlays.0.lock().map_err(|e| e.to_string())?;
    let id = overlay_id(&manager, &window)?;
    manager
        .pointer_moved(&id, Point::new(x, y))
        .map_err(|e| e.to_string())
}

#[command]
pub fn get_startup_enabled(startup: State<'_, StartupState>) -> Result<bool, String> {
    match &startup.0 {
        Some(item) => item.is_enabled().map_err(|e| e.to_string()),
        None => Ok(false),
    }
}

#[command]
pub fn set_startup_enabled(
    startup: State<'_, StartupState>,
    enabled: bool,
) -> Result<bool, String> {
    let item = startup
        .0
        .as_ref()
        .ok_or_else(|| "Startup registration is unavailable".to_string())?;
    item.set_enabled(enabled).map_err(|e| e.to_string())
}

#[command]
pub async fn app_quit(
    app: AppHandle,
    overlays: State<'_, OverlayState>,
) -> Result<(), String> {
    {
        let mut manager = overlays.0.lock().map_err(|e| e.to_string())?;
        manager.teardown();
    }
    info!("quit requested");
    app.exit(0);
    Ok(())
}

fn overlay_id(
    manager: &OverlayManager<TauriHost>,
    window: &WebviewWindow,
) -> Result<String, String> {
    manager
        .id_for_label(window.label())
        .ok_or_else(|| format!("{} is not an open overlay", window.label()))
}

fn notify_failure(app: &AppHandle, message: &str) {
    error!(reason = message, "overlay could not be opened");
    app.dialog()
        .message(message)
        .title("OnTop")
        .kind(MessageDialogKind::Error)
        .show(|_| {});
}
