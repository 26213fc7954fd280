use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::{
    Error,
    click_through::{ClickThroughController, InputTransparency},
    geometry::{Bounds, Point, Size},
    monitor::{HoverSample, MouseMonitor, PollSubscription, SampleKind, WindowKey},
    overlay::{
        HoverUpdate, OverlayWindow, OverlayWindowState, WindowHost, WindowSpec, header_visible,
    },
    registry::{OverlayItem, OverlayRegistry},
    settings::OverlaySettings,
};

/// Messages delivered to the control context that owns the manager. Poll
/// tasks and native window callbacks never touch manager state directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    Sample(HoverSample),
    Resized { label: String, size: Size },
    Destroyed { label: String },
}

/// A resize that settled on a new size and should be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeCommit {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl SizeCommit {
    pub fn apply(&self, registry: &mut OverlayRegistry) -> Result<Vec<OverlayItem>, Error> {
        registry.update_size(&self.id, self.width, self.height)
    }
}

pub struct OverlayManager<H: WindowHost> {
    host: H,
    settings: OverlaySettings,
    monitor: MouseMonitor,
    events: UnboundedSender<ControlEvent>,
    windows: HashMap<String, OverlayWindowState<H::Window>>,
    next_generation: u64,
}

impl<H: WindowHost> OverlayManager<H> {
    pub fn new(
        host: H,
        settings: OverlaySettings,
        runtime: Handle,
        events: UnboundedSender<ControlEvent>,
    ) -> Self {
        Self {
            host,
            settings,
            monitor: MouseMonitor::new(runtime),
            events,
            windows: HashMap::new(),
            next_generation: 0,
        }
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    /// Open the overlay for `item`, or bring the existing one to the front.
    ///
    /// A creation failure leaves the live-window map untouched.
    pub fn open(&mut self, item: &OverlayItem) -> Result<H::Window, Error> {
        if let Some(state) = self.windows.get(&item.id) {
            match state.window.show_and_focus() {
                Ok(()) => {
                    debug!(id = %item.id, "overlay already open, focused");
                    return Ok(state.window.clone());
                }
                Err(e) if e.is_stale() => {
                    debug!(id = %item.id, "existing overlay vanished, recreating");
                    if let Some(mut stale) = self.windows.remove(&item.id) {
                        stale.release();
                    }
                }
                Err(e) => return Err(e),
            }
        }

        let generation = self.next_generation + 1;
        let spec = WindowSpec::for_item(item, generation, &self.settings);

        let window = self.host.create(&spec).map_err(|e| {
            error!(id = %item.id, error = %e, "failed to create overlay window");
            e
        })?;
        self.next_generation = generation;

        let key = WindowKey {
            id: item.id.clone(),
            generation,
        };
        let poll = start_poll(
            &self.monitor,
            &self.events,
            &window,
            &key,
            SampleKind::Hover,
            self.settings.poll_interval(),
        );

        let state = OverlayWindowState {
            id: item.id.clone(),
            key,
            window: window.clone(),
            bounds: Bounds::from_origin_size(Point::default(), spec.size),
            aspect_ratio: spec.aspect_ratio,
            committed: spec.size,
            controller: ClickThroughController::with_default_regions(
                self.settings.drag_handle_height,
                self.settings.resize_grip_size,
            ),
            hovering: false,
            opened_at: Instant::now(),
            poll,
            pointer_poll: None,
        };
        self.windows.insert(item.id.clone(), state);

        info!(id = %item.id, label = %spec.label, "overlay opened");
        Ok(window)
    }

    /// Close the overlay for `id`. Polling stops before the window is
    /// released. Returns `false` when nothing was open.
    pub fn close(&mut self, id: &str) -> bool {
        let Some(mut state) = self.windows.remove(id) else {
            return false;
        };

        state.release();
        if let Err(e) = state.window.close() {
            if e.is_stale() {
                debug!(id, "overlay already gone");
            } else {
                warn!(id, error = %e, "failed to close overlay window");
            }
        }

        info!(id, "overlay closed");
        true
    }

    /// Drop bookkeeping for a window the platform already destroyed.
    pub fn forget_label(&mut self, label: &str) -> Option<String> {
        let id = self.id_for_label(label)?;
        if let Some(mut state) = self.windows.remove(&id) {
            state.release();
            info!(id = %id, label, "overlay window destroyed");
        }
        Some(id)
    }

    /// Close every overlay and release all polls.
    pub fn teardown(&mut self) {
        let ids: Vec<String> = self.windows.keys().cloned().collect();
        for id in ids {
            self.close(&id);
        }
    }

    pub fn set_click_through(&mut self, id: &str, enabled: bool) -> Result<bool, Error> {
        let state = self
            .windows
            .get_mut(id)
            .ok_or_else(|| Error::WindowNotFound(id.to_string()))?;

        let (mode, applied) = (state.controller.mode(), state.controller.applied());
        if let Some(transparency) = state.controller.set_enabled(enabled) {
            if let Err(e) = state.window.set_input_transparency(transparency) {
                state.controller.restore(mode, applied);
                return Err(e);
            }
        }

        if enabled {
            if state.pointer_poll.is_none() {
                state.pointer_poll = Some(start_poll(
                    &self.monitor,
                    &self.events,
                    &state.window,
                    &state.key,
                    SampleKind::Pointer,
                    self.settings.pointer_interval(),
                ));
            }
        } else if let Some(mut pointer) = state.pointer_poll.take() {
            pointer.stop();
        }

        debug!(id, enabled, "click-through updated");
        Ok(state.click_through())
    }

    pub fn toggle_click_through(&mut self, id: &str) -> Result<bool, Error> {
        let enabled = !self
            .windows
            .get(id)
            .ok_or_else(|| Error::WindowNotFound(id.to_string()))?
            .click_through();
        self.set_click_through(id, enabled)
    }

    /// Window-level pointer move, in window-local coordinates.
    pub fn pointer_moved(&mut self, id: &str, local: Point) -> Result<(), Error> {
        let state = self
            .windows
            .get_mut(id)
            .ok_or_else(|| Error::WindowNotFound(id.to_string()))?;

        let size = state.bounds.size();
        if let Some(transparency) = state.controller.on_mouse_move(local, size) {
            apply_transparency(state, transparency);
        }
        Ok(())
    }

    /// Apply one control message. Returns a size commit when a resize
    /// settled on a new size.
    pub fn dispatch(&mut self, event: ControlEvent) -> Option<SizeCommit> {
        match event {
            ControlEvent::Sample(sample) => {
                self.handle_sample(sample);
                None
            }
            ControlEvent::Resized { label, size } => {
                let id = self.id_for_label(&label)?;
                self.resize(&id, size)
            }
            ControlEvent::Destroyed { label } => {
                self.forget_label(&label);
                None
            }
        }
    }

    pub fn handle_sample(&mut self, sample: HoverSample) {
        let grace = self.settings.header_grace();
        let Some(state) = self.windows.get_mut(&sample.key.id) else {
            trace!(id = %sample.key.id, "sample for closed overlay dropped");
            return;
        };
        if state.key != sample.key {
            trace!(id = %sample.key.id, "sample from previous window dropped");
            return;
        }

        state.bounds = sample.bounds;

        match sample.kind {
            SampleKind::Hover => {
                state.hovering = sample.inside;
                let update = HoverUpdate {
                    hovering: sample.inside,
                    header_visible: header_visible(
                        sample.inside,
                        state.opened_at.elapsed(),
                        grace,
                    ),
                };
                if let Err(e) = state.window.emit_hover(update) {
                    debug!(id = %state.id, error = %e, "hover update not delivered");
                }
            }
            SampleKind::Pointer => {
                let local = sample.local();
                if let Some(transparency) =
                    state.controller.on_mouse_move(local, sample.bounds.size())
                {
                    apply_transparency(state, transparency);
                }
            }
        }
    }

    /// User resize of `id` to `proposed`. The size is projected onto the
    /// locked aspect ratio and pushed back to the window when it differs.
    pub fn resize(&mut self, id: &str, proposed: Size) -> Option<SizeCommit> {
        let state = self.windows.get_mut(id)?;
        if !proposed.is_positive() {
            return None;
        }

        let target = match state.aspect_ratio {
            Some(ratio) => ratio.project(state.committed, proposed),
            None => proposed.rounded(),
        };

        if !target.approx_eq(&proposed) {
            if let Err(e) = state.window.set_size(target) {
                debug!(id, error = %e, "could not apply projected size");
            }
        }

        state.bounds.width = target.width;
        state.bounds.height = target.height;

        if target == state.committed {
            return None;
        }
        state.committed = target;

        debug!(id, width = target.width, height = target.height, "overlay resized");
        Some(SizeCommit {
            id: id.to_string(),
            width: target.width as u32,
            height: target.height as u32,
        })
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.windows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.windows.keys().cloned().collect()
    }

    pub fn state(&self, id: &str) -> Option<&OverlayWindowState<H::Window>> {
        self.windows.get(id)
    }

    pub fn id_for_label(&self, label: &str) -> Option<String> {
        self.windows
            .values()
            .find(|s| s.window.label() == label)
            .map(|s| s.id.clone())
    }
}

fn start_poll<W: OverlayWindow>(
    monitor: &MouseMonitor,
    events: &UnboundedSender<ControlEvent>,
    window: &W,
    key: &WindowKey,
    kind: SampleKind,
    period: Duration,
) -> PollSubscription {
    let events = events.clone();
    monitor.start(window.clone(), key.clone(), kind, period, move |sample| {
        events.send(ControlEvent::Sample(sample)).is_ok()
    })
}

fn apply_transparency<W: OverlayWindow>(
    state: &mut OverlayWindowState<W>,
    transparency: InputTransparency,
) {
    if let Err(e) = state.window.set_input_transparency(transparency) {
        if e.is_stale() {
            debug!(id = %state.id, "transparency change for closed overlay dropped");
        } else {
            warn!(id = %state.id, error = %e, "failed to change input transparency");
        }
    }
}
