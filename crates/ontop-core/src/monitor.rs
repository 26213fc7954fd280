//! Mouse monitor
//!
//! Embedded web content swallows pointer events before the outer window sees
//! them, so hover detection polls the global cursor instead. Each overlay
//! window gets a periodic task that compares the cursor with the window's
//! bounds and reports a [`HoverSample`] on every tick, whether or not the
//! state changed.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, trace};

use crate::Error;
use crate::geometry::{Bounds, Point};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Source of cursor and window geometry, in logical pixels.
pub trait CursorProbe: Send + Sync + 'static {
    fn cursor_position(&self) -> Result<Point, Error>;

    /// Current outer bounds. Fails once the window is gone.
    fn bounds(&self) -> Result<Bounds, Error>;
}

/// Identity of one live window. The generation distinguishes a reopened
/// window from the one it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowKey {
    pub id: String,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Slow poll driving header auto-hide.
    Hover,
    /// Fast poll driving click-through re-evaluation.
    Pointer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverSample {
    pub key: WindowKey,
    pub kind: SampleKind,
    /// Monotonic per subscription, starting at zero.
    pub tick: u64,
    pub inside: bool,
    pub cursor: Point,
    pub bounds: Bounds,
}

impl HoverSample {
    /// Cursor position relative to the window's top-left corner.
    pub fn local(&self) -> Point {
        self.bounds.to_local(self.cursor)
    }
}

/// Take one measurement from `probe`.
pub fn sample_cursor<P: CursorProbe + ?Sized>(probe: &P) -> Result<(bool, Point, Bounds), Error> {
    let bounds = probe.bounds()?;
    let cursor = probe.cursor_position()?;
    Ok((bounds.contains(cursor), cursor, bounds))
}

/// Spawns polling tasks onto a tokio runtime.
#[derive(Debug, Clone)]
pub struct MouseMonitor {
    runtime: Handle,
}

impl MouseMonitor {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Start polling `probe` every `period`.
    ///
    /// `sink` receives every sample and returns `false` once nobody is
    /// listening anymore, which ends the subscription. A probe error means
    /// the window is gone: the task ends quietly and emits nothing further.
    pub fn start<P, F>(
        &self,
        probe: P,
        key: WindowKey,
        kind: SampleKind,
        period: Duration,
        sink: F,
    ) -> PollSubscription
    where
        P: CursorProbe,
        F: Fn(HoverSample) -> bool + Send + 'static,
    {
        let gate = Arc::new(Mutex::new(true));
        let task_gate = gate.clone();
        let period = period.max(Duration::from_millis(1));

        let task = self.runtime.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick = 0u64;

            loop {
                ticker.tick().await;

                if !is_open(&task_gate) {
                    break;
                }

                let measured = sample_cursor(&probe);

                // The gate is held while emitting so that `stop` cannot
                // return while a sample is still on its way out.
                let mut live = task_gate.lock().unwrap_or_else(PoisonError::into_inner);
                if !*live {
                    break;
                }

                match measured {
                    Ok((inside, cursor, bounds)) => {
                        trace!(id = %key.id, tick, inside, "hover sample");
                        let delivered = sink(HoverSample {
                            key: key.clone(),
                            kind,
                            tick,
                            inside,
                            cursor,
                            bounds,
                        });
                        if !delivered {
                            *live = false;
                            break;
                        }
                    }
                    Err(e) if e.is_stale() => {
                        debug!(id = %key.id, error = %e, "window gone, polling stopped");
                        *live = false;
                        break;
                    }
                    Err(e) => {
                        debug!(id = %key.id, tick, error = %e, "cursor sample failed");
                    }
                }

                tick += 1;
            }
        });

        PollSubscription {
            gate,
            task: Some(task),
        }
    }
}

fn is_open(gate: &Mutex<bool>) -> bool {
    *gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running poll task. Dropping it stops the task.
#[derive(Debug)]
pub struct PollSubscription {
    gate: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl PollSubscription {
    /// Cancel the poll. Once this returns no further samples are delivered,
    /// even if a tick was already in flight. Calling it again does nothing.
    pub fn stop(&mut self) {
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = false;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        is_open(&self.gate) && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for PollSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}
