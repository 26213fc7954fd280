const COMMANDS: &[&str] = &[
    "list_items",
    "add_item",
    "remove_item",
    "update_item_size",
    "list_size_presets",
    "open_overlay",
    "close_overlay",
    "close_all_overlays",
    "list_open_overlays",
    "overlay_status",
    "overlay_set_click_through",
    "overlay_toggle_click_through",
    "overlay_pointer_moved",
    "get_startup_enabled",
    "set_startup_enabled",
    "app_quit",
];

fn main() {
    tauri_plugin::Builder::new(COMMANDS).build();
}
