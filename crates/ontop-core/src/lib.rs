pub mod autostart;
pub mod click_through;
pub mod commands;
pub mod error;
pub mod geometry;
pub mod monitor;
pub mod overlay;
pub mod registry;
pub mod settings;

pub use autostart::*;
pub use click_through::*;
pub use commands::*;
pub use error::*;
pub use geometry::*;
pub use monitor::*;
pub use overlay::*;
pub use registry::*;
pub use settings::*;

use std::sync::Mutex;

use tauri::{
    AppHandle, Manager, RunEvent, WindowEvent, Wry,
    plugin::{Builder, TauriPlugin},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

/// Sender side of the control channel, for forwarding native window events.
pub struct ControlSender(pub UnboundedSender<ControlEvent>);

pub fn init() -> TauriPlugin<Wry> {
    Builder::<Wry, ()>::new("ontop")
        .invoke_handler(tauri::generate_handler![
            commands::list_items,
            commands::add_item,
            commands::remove_item,
            commands::update_item_size,
            commands::list_size_presets,
            commands::open_overlay,
            commands::close_overlay,
            commands::close_all_overlays,
            commands::list_open_overlays,
            // Overlay host page
            commands::overlay_status,
            commands::overlay_set_click_through,
            commands::overlay_toggle_click_through,
            commands::overlay_pointer_moved,
            // App
            commands::get_startup_enabled,
            commands::set_startup_enabled,
            commands::app_quit
        ])
        .setup(|app, _api| {
            let config_dir = app.path().app_config_dir()?;
            let data_dir = app.path().app_data_dir()?;

            let settings = OverlaySettings::load(&config_dir.join(SETTINGS_FILE));
            let registry = OverlayRegistry::open(data_dir.join(STORE_FILE));
            info!(
                items = registry.list_items().len(),
                path = %registry.path().display(),
                "overlay registry loaded"
            );

            // Poll tasks are spawned from arbitrary threads, so the manager
            // keeps its own handle to the async runtime.
            let runtime = tauri::async_runtime::handle().inner().clone();

            let (tx, rx) = mpsc::unbounded_channel();
            let manager = OverlayManager::new(
                TauriHost::new(app.app_handle().clone()),
                settings,
                runtime,
                tx.clone(),
            );
            app.manage(OverlayState(Mutex::new(manager)));
            app.manage(RegistryState(Mutex::new(registry)));
            app.manage(ControlSender(tx));

            let startup = match LoginItem::for_current_exe(&app.package_info().name) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, "startup registration unavailable");
                    None
                }
            };
            app.manage(StartupState(startup));

            tauri::async_runtime::spawn(control_loop(app.app_handle().clone(), rx));

            Ok(())
        })
        .on_event(|app, event| match event {
            RunEvent::WindowEvent { label, event, .. } => forward_window_event(app, label, event),
            RunEvent::Exit => {
                // Runs on the main thread, so never wait for the lock here.
                let overlays = app.state::<OverlayState>();
                match overlays.0.try_lock() {
                    Ok(mut manager) => manager.teardown(),
                    Err(e) => warn!(error = %e, "overlays not torn down on exit"),
                };
            }
            _ => {}
        })
        .build()
}

/// Owns every mutation driven by background polls and native callbacks.
async fn control_loop(app: AppHandle, mut events: UnboundedReceiver<ControlEvent>) {
    while let Some(event) = events.recv().await {
        let commit = {
            let overlays = app.state::<OverlayState>();
            let mut manager = match overlays.0.lock() {
                Ok(manager) => manager,
                Err(e) => {
                    error!(error = %e, "overlay state poisoned, control loop stopping");
                    break;
                }
            };
            manager.dispatch(event)
        };

        let Some(commit) = commit else {
            continue;
        };

        let registry = app.state::<RegistryState>();
        let result = match registry.0.lock() {
            Ok(mut registry) => commit.apply(&mut registry).map(|_| ()),
            Err(e) => {
                error!(error = %e, "registry state poisoned");
                continue;
            }
        };
        if let Err(e) = result {
            warn!(id = %commit.id, error = %e, "overlay size not persisted");
        }
    }
    debug!("control loop finished");
}

fn forward_window_event(app: &AppHandle, label: &str, event: &WindowEvent) {
    if !label.starts_with(OVERLAY_LABEL_PREFIX) {
        return;
    }

    let message = match event {
        WindowEvent::Resized(physical) => {
            let scale = app
                .get_webview_window(label)
                .and_then(|window| window.scale_factor().ok())
                .unwrap_or(1.0);
            let logical = physical.to_logical::<f64>(scale);
            ControlEvent::Resized {
                label: label.to_string(),
                size: Size::new(logical.width, logical.height),
            }
        }
        WindowEvent::Destroyed => ControlEvent::Destroyed {
            label: label.to_string(),
        },
        _ => return,
    };

    let sender = app.state::<ControlSender>();
    if sender.0.send(message).is_err() {
        debug!(label, "control loop gone, window event dropped");
    }
}
