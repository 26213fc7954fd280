//! Click-through state machine for overlay windows.
//!
//! Input transparency is a window-wide property: a window either receives
//! pointer input or lets it fall through to whatever is beneath it. To keep
//! the drag handle and resize grip usable while the rest of the window passes
//! clicks through, the controller re-evaluates the property on every pointer
//! sample and only turns the window interactive while the cursor sits over a
//! control region.

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point, Size};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum InputMode {
    /// Fully interactive.
    #[default]
    Normal,
    /// Input-transparent except over a control region.
    Passthrough,
}

/// What the window backend should apply to the native window.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum InputTransparency {
    #[default]
    Interactive,
    /// Pointer input goes to the window beneath. With `forward` set the
    /// content still sees enter/leave so it can react to hover.
    Transparent { forward: bool },
}

impl InputTransparency {
    pub fn is_transparent(&self) -> bool {
        matches!(self, InputTransparency::Transparent { .. })
    }
}

/// Part of an overlay window that stays clickable in passthrough mode.
/// Coordinates are local to the window.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ControlRegion {
    /// Full-width strip along the top edge.
    DragHandle { height: f64 },
    /// Square in the bottom-right corner.
    ResizeGrip { size: f64 },
    /// Arbitrary rectangle.
    Rect { bounds: Bounds },
}

impl ControlRegion {
    pub fn contains(&self, local: Point, window: Size) -> bool {
        let area = match *self {
            ControlRegion::DragHandle { height } => Bounds::new(0.0, 0.0, window.width, height),
            ControlRegion::ResizeGrip { size } => Bounds::new(
                window.width - size,
                window.height - size,
                size,
                size,
            ),
            ControlRegion::Rect { bounds } => bounds,
        };
        area.contains(local)
    }
}

#[derive(Debug, Clone)]
pub struct ClickThroughController {
    mode: InputMode,
    regions: Vec<ControlRegion>,
    applied: InputTransparency,
}

impl ClickThroughController {
    pub fn new(regions: Vec<ControlRegion>) -> Self {
        Self {
            mode: InputMode::Normal,
            regions,
            applied: InputTransparency::Interactive,
        }
    }

    /// Controller with the standard drag handle and resize grip.
    pub fn with_default_regions(drag_handle_height: f64, resize_grip_size: f64) -> Self {
        Self::new(vec![
            ControlRegion::DragHandle {
                height: drag_handle_height,
            },
            ControlRegion::ResizeGrip {
                size: resize_grip_size,
            },
        ])
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_passthrough(&self) -> bool {
        self.mode == InputMode::Passthrough
    }

    /// Transparency most recently handed out to the backend.
    pub fn applied(&self) -> InputTransparency {
        self.applied
    }

    pub fn in_control_region(&self, local: Point, window: Size) -> bool {
        self.regions.iter().any(|r| r.contains(local, window))
    }

    /// Switch modes. Returns the transparency to apply, or `None` when the
    /// mode did not change.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<InputTransparency> {
        let target = if enabled {
            InputMode::Passthrough
        } else {
            InputMode::Normal
        };
        if target == self.mode {
            return None;
        }

        self.mode = target;
        let transparency = match target {
            InputMode::Normal => InputTransparency::Interactive,
            InputMode::Passthrough => InputTransparency::Transparent { forward: true },
        };
        self.applied = transparency;
        Some(transparency)
    }

    /// Put back a mode and transparency captured before a change the
    /// backend refused.
    pub fn restore(&mut self, mode: InputMode, applied: InputTransparency) {
        self.mode = mode;
        self.applied = applied;
    }

    /// Re-evaluate for a pointer sample in window-local coordinates.
    ///
    /// Ignored in `Normal` mode. In `Passthrough` mode the window is made
    /// interactive over a control region and transparent with forwarding
    /// elsewhere. Returns `Some` only when the applied transparency changes,
    /// so repeated identical samples are free.
    pub fn on_mouse_move(&mut self, local: Point, window: Size) -> Option<InputTransparency> {
        if !self.is_passthrough() {
            return None;
        }

        let desired = if self.in_control_region(local, window) {
            InputTransparency::Interactive
        } else {
            InputTransparency::Transparent { forward: true }
        };

        if desired == self.applied {
            return None;
        }
        self.applied = desired;
        Some(desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Size = Size {
        width: 480.0,
        height: 720.0,
    };

    fn controller() -> ClickThroughController {
        ClickThroughController::with_default_regions(32.0, 18.0)
    }

    #[test]
    fn starts_interactive() {
        let ctl = controller();
        assert_eq!(ctl.mode(), InputMode::Normal);
        assert_eq!(ctl.applied(), InputTransparency::Interactive);
    }

    #[test]
    fn enabling_makes_window_transparent_with_forwarding() {
        let mut ctl = controller();
        assert_eq!(
            ctl.set_enabled(true),
            Some(InputTransparency::Transparent { forward: true })
        );
        assert_eq!(ctl.set_enabled(true), None);
    }

    #[test]
    fn enable_then_disable_restores_interactive() {
        let mut ctl = controller();
        assert!(ctl.set_enabled(true).is_some_and(|t| t.is_transparent()));
        assert_eq!(ctl.set_enabled(false), Some(InputTransparency::Interactive));
        assert_eq!(ctl.mode(), InputMode::Normal);
        assert_eq!(ctl.applied(), InputTransparency::Interactive);
    }

    #[test]
    fn restore_keeps_region_override() {
        let mut ctl = controller();
        ctl.set_enabled(true);
        ctl.on_mouse_move(Point::new(200.0, 10.0), WINDOW);
        let before = (ctl.mode(), ctl.applied());

        ctl.set_enabled(false);
        ctl.restore(before.0, before.1);
        assert_eq!(ctl.mode(), InputMode::Passthrough);
        assert_eq!(ctl.applied(), InputTransparency::Interactive);
        // Still over the handle, so nothing new to apply.
        assert_eq!(ctl.on_mouse_move(Point::new(210.0, 12.0), WINDOW), None);
    }

    #[test]
    fn moves_are_ignored_in_normal_mode() {
        let mut ctl = controller();
        assert_eq!(ctl.on_mouse_move(Point::new(10.0, 10.0), WINDOW), None);
        assert_eq!(ctl.on_mouse_move(Point::new(200.0, 300.0), WINDOW), None);
    }

    #[test]
    fn drag_handle_is_interactive_in_passthrough() {
        let mut ctl = controller();
        ctl.set_enabled(true);
        assert_eq!(
            ctl.on_mouse_move(Point::new(200.0, 10.0), WINDOW),
            Some(InputTransparency::Interactive)
        );
        assert_eq!(
            ctl.on_mouse_move(Point::new(200.0, 300.0), WINDOW),
            Some(InputTransparency::Transparent { forward: true })
        );
    }

    #[test]
    fn resize_grip_is_interactive_in_passthrough() {
        let mut ctl = controller();
        ctl.set_enabled(true);
        assert_eq!(
            ctl.on_mouse_move(Point::new(470.0, 710.0), WINDOW),
            Some(InputTransparency::Interactive)
        );
        assert_eq!(ctl.applied(), InputTransparency::Interactive);
    }

    #[test]
    fn repeated_samples_do_not_reapply() {
        let mut ctl = controller();
        ctl.set_enabled(true);
        assert_eq!(ctl.on_mouse_move(Point::new(100.0, 400.0), WINDOW), None);
        assert!(ctl.on_mouse_move(Point::new(100.0, 5.0), WINDOW).is_some());
        assert_eq!(ctl.on_mouse_move(Point::new(120.0, 6.0), WINDOW), None);
    }

    #[test]
    fn custom_rect_region() {
        let mut ctl = ClickThroughController::new(vec![ControlRegion::Rect {
            bounds: Bounds::new(40.0, 40.0, 20.0, 20.0),
        }]);
        ctl.set_enabled(true);
        assert_eq!(
            ctl.on_mouse_move(Point::new(50.0, 50.0), WINDOW),
            Some(InputTransparency::Interactive)
        );
    }
}
