//! Normalizes raw viewport notifications into engine events.
//!
//! Scroll signals are coalesced to the latest position per drain and
//! followed by a trailing [`EngineEvent::ScrollSettled`] once the viewport
//! has been quiet for the configured timeout. Resize signals are debounced
//! the same way; while a resize is pending, scroll and crossing events are
//! held back because the resize rebuild supersedes them.

use std::time::Duration;

use smallvec::SmallVec;
use web_time::Instant;

use crate::config::ScrollerConfig;

/// Edge of the cradle a boundary notification refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryEdge {
    Head,
    Tail,
}

/// Raw notification from the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportSignal {
    Scroll {
        position: f64,
    },
    Resize {
        length: f64,
        cross_length: f64,
    },
    /// A cradle edge entered or left the viewport's trigger zone.
    Crossing {
        edge: BoundaryEdge,
        crossed_outward: bool,
    },
}

/// Normalized event consumed by the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineEvent {
    Scrolled {
        position: f64,
    },
    ScrollSettled {
        position: f64,
    },
    ViewportResized {
        length: f64,
        cross_length: f64,
    },
    BoundaryCrossed {
        edge: BoundaryEdge,
        crossed_outward: bool,
    },
}

pub type EngineEvents = SmallVec<[EngineEvent; 4]>;

#[derive(Debug)]
pub struct SignalAdapter {
    scroll_settle_timeout: Duration,
    resize_settle_timeout: Duration,
    pending_scroll: Option<f64>,
    last_scroll: f64,
    settle_deadline: Option<Instant>,
    pending_resize: Option<(f64, f64)>,
    resize_deadline: Option<Instant>,
    pending_crossings: SmallVec<[(BoundaryEdge, bool); 2]>,
}

impl SignalAdapter {
    pub fn new(scroll_settle_timeout: Duration, resize_settle_timeout: Duration) -> Self {
        Self {
            scroll_settle_timeout,
            resize_settle_timeout,
            pending_scroll: None,
            last_scroll: 0.0,
            settle_deadline: None,
            pending_resize: None,
            resize_deadline: None,
            pending_crossings: SmallVec::new(),
        }
    }

    pub fn from_config(config: &ScrollerConfig) -> Self {
        Self::new(config.scroll_settle_timeout, config.resize_settle_timeout)
    }

    pub fn push(&mut self, signal: ViewportSignal, now: Instant) {
        match signal {
            ViewportSignal::Scroll { position } => {
                if !position.is_finite() {
                    log::warn!("ignoring non-finite scroll position {position}");
                    return;
                }
                self.pending_scroll = Some(position);
                self.last_scroll = position;
                self.settle_deadline = Some(now + self.scroll_settle_timeout);
            }
            ViewportSignal::Resize {
                length,
                cross_length,
            } => {
                self.pending_resize = Some((length, cross_length));
                self.resize_deadline = Some(now + self.resize_settle_timeout);
            }
            ViewportSignal::Crossing {
                edge,
                crossed_outward,
            } => {
                let crossing = (edge, crossed_outward);
                if !self.pending_crossings.contains(&crossing) {
                    self.pending_crossings.push(crossing);
                }
            }
        }
    }

    /// Emits the events that are due at `now`.
    pub fn drain(&mut self, now: Instant) -> EngineEvents {
        let mut events = EngineEvents::new();

        if let Some((length, cross_length)) = self.pending_resize {
            if self.resize_deadline.is_some_and(|deadline| now < deadline) {
                return events;
            }
            self.pending_resize = None;
            self.resize_deadline = None;
            // The rebuild reads the scroll position from the viewport.
            self.pending_scroll = None;
            self.pending_crossings.clear();
            events.push(EngineEvent::ViewportResized {
                length,
                cross_length,
            });
        }

        for (edge, crossed_outward) in self.pending_crossings.drain(..) {
            events.push(EngineEvent::BoundaryCrossed {
                edge,
                crossed_outward,
            });
        }
        if let Some(position) = self.pending_scroll.take() {
            events.push(EngineEvent::Scrolled { position });
        }
        if self.settle_deadline.is_some_and(|deadline| now >= deadline) {
            self.settle_deadline = None;
            events.push(EngineEvent::ScrollSettled {
                position: self.last_scroll,
            });
        }
        events
    }

    /// Earliest instant at which [`SignalAdapter::drain`] has timed work.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.settle_deadline, self.resize_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Drops queued scroll work; used when a reposition supersedes it.
    pub fn discard_scroll(&mut self) {
        self.pending_scroll = None;
        self.pending_crossings.clear();
    }

    /// Forgets the queued settle notification; a programmatic jump is not a
    /// user scroll.
    pub fn cancel_settle(&mut self) {
        self.settle_deadline = None;
    }
}
