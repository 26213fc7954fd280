use tauri::{
    App, AppHandle, Manager, Runtime, WebviewUrl, WebviewWindowBuilder,
    image::Image,
    menu::{MenuBuilder, MenuItemBuilder, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
};
use tracing::{error, info, warn};

use ontop_core::OverlayState;

pub const MAIN_WINDOW: &str = "main";

const TRAY_ICON: &[u8] = include_bytes!("../icons/32x32.png");

pub fn setup_tray(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let open = MenuItemBuilder::with_id("open", "Open OnTop").build(app)?;
    let close_all = MenuItemBuilder::with_id("close_all", "Close All Overlays").build(app)?;
    let separator = PredefinedMenuItem::separator(app)?;
    let quit = MenuItemBuilder::with_id("quit", "Quit").build(app)?;

    let menu = MenuBuilder::new(app)
        .item(&open)
        .item(&close_all)
        .item(&separator)
        .item(&quit)
        .build()?;

    let icon = Image::from_bytes(TRAY_ICON)?;

    TrayIconBuilder::with_id("ontop")
        .icon(icon)
        .menu(&menu)
        .show_menu_on_left_click(false)
        .tooltip("OnTop")
        .on_menu_event(|app, event| {
            handle_menu_event(app, event.id.as_ref());
        })
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                if let Err(e) = show_main_window(tray.app_handle()) {
                    warn!(error = %e, "failed to show main window");
                }
            }
        })
        .build(app)?;

    Ok(())
}

/// Shows the URL list window, recreating it if it was destroyed.
pub fn show_main_window<R: Runtime>(app: &AppHandle<R>) -> Result<(), tauri::Error> {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW) {
        window.show()?;
        window.unminimize()?;
        window.set_focus()?;
        return Ok(());
    }

    WebviewWindowBuilder::new(app, MAIN_WINDOW, WebviewUrl::App("index.html".into()))
        .title("OnTop")
        .inner_size(520.0, 640.0)
        .min_inner_size(420.0, 480.0)
        .center()
        .resizable(true)
        .visible(true)
        .build()?;

    Ok(())
}

/// Runs in the first instance when the app is launched again.
pub fn focus_running_instance<R: Runtime>(app: &AppHandle<R>, args: Vec<String>, cwd: String) {
    info!(?args, cwd, "second launch, focusing running instance");
    if let Err(e) = show_main_window(app) {
        warn!(error = %e, "failed to focus main window");
    }
}

fn handle_menu_event<R: Runtime>(app: &AppHandle<R>, id: &str) {
    match id {
        "open" => {
            if let Err(e) = show_main_window(app) {
                error!(error = %e, "failed to open main window");
            }
        }
        "close_all" => {
            // Menu events arrive on the main thread; the manager lock may be
            // held by a command waiting on it.
            let app = app.clone();
            tauri::async_runtime::spawn(async move {
                close_all_overlays(&app);
            });
        }
        "quit" => {
            let app = app.clone();
            tauri::async_runtime::spawn(async move {
                close_all_overlays(&app);
                info!("quit from tray");
                app.exit(0);
            });
        }
        _ => {}
    }
}

fn close_all_overlays<R: Runtime>(app: &AppHandle<R>) {
    let overlays = app.state::<OverlayState>();
    match overlays.0.lock() {
        Ok(mut manager) => manager.teardown(),
        Err(e) => error!(error = %e, "overlay state poisoned"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tauri::test::mock_app;

    #[test]
    fn second_launch_brings_back_a_closed_main_window() {
        let app = mock_app();
        let handle = app.handle();
        assert!(handle.get_webview_window(MAIN_WINDOW).is_none());

        focus_running_instance(handle, vec!["ontop".into()], String::new());
        assert!(handle.get_webview_window(MAIN_WINDOW).is_some());

        focus_running_instance(handle, vec!["ontop".into()], String::new());
        assert_eq!(handle.webview_windows().len(), 1);
    }
}
