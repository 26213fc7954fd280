mod logging;
mod tray;

use std::path::PathBuf;

use tauri::{Manager, RunEvent, WindowEvent};
use tracing::{info, warn};

use ontop_core::{OverlaySettings, SETTINGS_FILE};

pub use tray::{MAIN_WINDOW, focus_running_instance, show_main_window};

/// Same location the core plugin resolves through the path resolver, which
/// is not available until the app is built.
fn settings_path(identifier: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(identifier).join(SETTINGS_FILE))
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let context = tauri::generate_context!();

    let settings = settings_path(&context.config().identifier)
        .map(|path| OverlaySettings::load(&path))
        .unwrap_or_default();
    logging::init(settings.debug_logging);

    // Must be the first plugin so a second launch exits before building
    // anything of its own.
    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, args, cwd| {
            focus_running_instance(app, args, cwd);
        }))
        .plugin(tauri_plugin_dialog::init())
        .plugin(ontop_core::init())
        .setup(|app| {
            tray::setup_tray(app)?;
            info!(version = %app.package_info().version, "OnTop started");
            Ok(())
        })
        .on_window_event(|window, event| {
            // The URL list hides to the tray instead of closing.
            if let WindowEvent::CloseRequested { api, .. } = event {
                if window.label() == MAIN_WINDOW {
                    api.prevent_close();
                    if let Err(e) = window.hide() {
                        warn!(error = %e, "failed to hide main window");
                    }
                }
            }
        })
        .build(context)
        .expect("error building OnTop");

    app.run(|_app, event| {
        // Closing the last overlay must not end the tray process; explicit
        // exits carry a code and go through.
        if let RunEvent::ExitRequested { code: None, api, .. } = event {
            api.prevent_exit();
        }
    });
}
