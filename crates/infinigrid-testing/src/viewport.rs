use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use infinigrid_core::platform::Clock;
use infinigrid_core::session::{ViewportGeometry, ViewportProbe};
use web_time::Instant;

/// Viewport whose geometry is set explicitly by the test.
///
/// Clones share the same geometry, so one handle can be given to the session
/// while the test keeps another.
#[derive(Clone, Debug, Default)]
pub struct ManualViewport {
    geometry: Rc<Cell<ViewportGeometry>>,
}

impl ManualViewport {
    pub fn new(length: f64, cross_length: f64) -> Self {
        Self {
            geometry: Rc::new(Cell::new(ViewportGeometry {
                length,
                cross_length,
                scroll_position: 0.0,
            })),
        }
    }

    pub fn geometry(&self) -> ViewportGeometry {
        self.geometry.get()
    }

    pub fn set_scroll(&self, scroll_position: f64) {
        let mut geometry = self.geometry.get();
        geometry.scroll_position = scroll_position;
        self.geometry.set(geometry);
    }

    pub fn set_size(&self, length: f64, cross_length: f64) {
        let mut geometry = self.geometry.get();
        geometry.length = length;
        geometry.cross_length = cross_length;
        self.geometry.set(geometry);
    }
}

impl ViewportProbe for ManualViewport {
    fn geometry(&self) -> ViewportGeometry {
        self.geometry.get()
    }
}

/// Clock that only moves when the test advances it.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
