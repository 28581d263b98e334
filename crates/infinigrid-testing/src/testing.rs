use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use infinigrid_core::config::ScrollerConfig;
use infinigrid_core::session::{
    CacheChange, HostCallbacks, ItemException, ScrollerSession, ViewportGeometry,
};
use infinigrid_core::signal::{BoundaryEdge, ViewportSignal};
use infinigrid_core::snapshot::WindowSnapshot;
use infinigrid_core::window::WindowMetrics;

use crate::fetcher::ScriptedFetcher;
use crate::viewport::{ManualClock, ManualViewport};

/// Host notifications captured by a [`ScrollerTestRule`].
#[derive(Debug, Default)]
pub struct RecordedEvents {
    pub exceptions: Vec<ItemException>,
    pub range_changes: Vec<Option<(i64, i64)>>,
    pub repositions: Vec<i64>,
    pub settled: Vec<f64>,
    pub cache_changes: Vec<CacheChange>,
}

/// Headless harness for exercising a scroller session.
///
/// The rule owns the session together with a scripted fetcher, a manual
/// viewport and a manual clock, and records every host callback. It plays the
/// host's part: after each engine step the viewport's scroll position is set
/// to the position the engine asked for.
pub struct ScrollerTestRule<C> {
    session: ScrollerSession<C>,
    fetcher: ScriptedFetcher<C>,
    viewport: ManualViewport,
    clock: ManualClock,
    events: Rc<RefCell<RecordedEvents>>,
}

impl<C: 'static> ScrollerTestRule<C> {
    /// Creates a rule for the list `range` in a viewport of the given size.
    pub fn new(
        config: ScrollerConfig,
        range: Option<(i64, i64)>,
        viewport: ViewportGeometry,
        content: impl Fn(i64) -> C + 'static,
    ) -> Self {
        let fetcher = ScriptedFetcher::new(content);
        let manual_viewport = ManualViewport::new(viewport.length, viewport.cross_length);
        let clock = ManualClock::new();
        let events = Rc::new(RefCell::new(RecordedEvents::default()));
        let session = ScrollerSession::new(config, range, fetcher.clone(), manual_viewport.clone())
            .with_session_id(1)
            .with_clock(Rc::new(clock.clone()))
            .with_callbacks(recording_callbacks(&events));
        Self {
            session,
            fetcher,
            viewport: manual_viewport,
            clock,
            events,
        }
    }

    pub fn session(&self) -> &ScrollerSession<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ScrollerSession<C> {
        &mut self.session
    }

    pub fn fetcher(&self) -> &ScriptedFetcher<C> {
        &self.fetcher
    }

    pub fn viewport(&self) -> &ManualViewport {
        &self.viewport
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn events(&self) -> std::cell::Ref<'_, RecordedEvents> {
        self.events.borrow()
    }

    pub fn window(&self) -> WindowSnapshot {
        self.session.current_window()
    }

    /// Lays out the first window at `index` and drains resulting work.
    pub fn start(&mut self, index: i64) {
        self.session.start(index);
        self.pump_until_idle();
    }

    /// Scrolls the viewport to `position` and lets the engine react.
    pub fn scroll_to(&mut self, position: f64) {
        self.viewport.set_scroll(position);
        self.session
            .push_signal(ViewportSignal::Scroll { position });
        self.pump_until_idle();
    }

    pub fn scroll_by(&mut self, delta: f64) {
        let position = self.viewport.geometry().scroll_position + delta;
        self.scroll_to(position);
    }

    pub fn cross_boundary(&mut self, edge: BoundaryEdge, crossed_outward: bool) {
        self.session.push_signal(ViewportSignal::Crossing {
            edge,
            crossed_outward,
        });
        self.pump_until_idle();
    }

    /// Changes the viewport size; the re-layout runs once the resize
    /// debounce elapses (see [`ScrollerTestRule::advance_time`]).
    pub fn resize(&mut self, length: f64, cross_length: f64) {
        self.viewport.set_size(length, cross_length);
        self.session.push_signal(ViewportSignal::Resize {
            length,
            cross_length,
        });
        self.pump_until_idle();
    }

    pub fn advance_time(&mut self, by: Duration) {
        self.clock.advance(by);
        self.pump_until_idle();
    }

    /// Resolves every deferred fetch and drains the results.
    pub fn resolve_fetches(&mut self) -> usize {
        let resolved = self.fetcher.resolve_all();
        self.pump_until_idle();
        resolved
    }

    /// Drives the session until no signal or fetch work remains.
    pub fn pump_until_idle(&mut self) {
        let mut i = 0;
        loop {
            i += 1;
            if i > 100 {
                panic!("pump_until_idle looped too many times!");
            }
            let rounds = self.session.pump();
            if rounds == 0 {
                break;
            }
            log::trace!("pump_until_idle: session made progress in {rounds} rounds");
        }
        // Act as the host and follow the engine's scroll position.
        self.viewport
            .set_scroll(self.session.current_window().scroll_position);
    }

    /// Asserts the engine's structural invariants, panicking with a
    /// description of the first violation.
    pub fn assert_invariants(&self) {
        let window = self.window();
        let indices = window.indices();
        for pair in indices.windows(2) {
            assert_eq!(pair[1], pair[0] + 1, "cradle is not contiguous: {indices:?}");
        }

        let list = self.session.list();
        match list.bounds() {
            Some((low, high)) => {
                for &index in &indices {
                    assert!(
                        (low..=high).contains(&index),
                        "cradle index {index} outside [{low}, {high}]"
                    );
                }
                let axis = window
                    .axis_reference_index
                    .expect("non-empty list must have an axis");
                assert!((low..=high).contains(&axis), "axis {axis} outside list");
                assert!(window.head.iter().all(|slot| slot.index < axis));
                assert_eq!(window.tail.first().map(|slot| slot.index), Some(axis));

                let geometry = list.row_geometry();
                let metrics = WindowMetrics::from_config(
                    self.session.config(),
                    self.viewport.geometry().length,
                );
                let cap = metrics.cradle_row_count(&geometry) * list.cross_count();
                assert!(
                    indices.len() <= cap,
                    "cradle holds {} items, cap {cap}",
                    indices.len()
                );
            }
            None => {
                assert!(window.is_empty(), "empty list with non-empty cradle");
                assert_eq!(window.axis_reference_index, None);
            }
        }

        let cache = self.session.cache();
        if let Err(err) = cache.verify_bijection() {
            panic!("cache bijection broken: {err}");
        }
        for slot in window.slots() {
            if let Some(item_id) = slot.item_id {
                assert_eq!(
                    cache.item_id_at(slot.index),
                    Some(item_id),
                    "slot {} disagrees with cache",
                    slot.index
                );
            }
        }
    }
}

fn recording_callbacks(events: &Rc<RefCell<RecordedEvents>>) -> HostCallbacks {
    let exceptions = Rc::clone(events);
    let ranges = Rc::clone(events);
    let repositions = Rc::clone(events);
    let settled = Rc::clone(events);
    let cache_changes = Rc::clone(events);
    HostCallbacks::default()
        .on_item_exception(move |exception| {
            exceptions.borrow_mut().exceptions.push(exception.clone());
        })
        .on_list_range_change(move |range| {
            ranges.borrow_mut().range_changes.push(range);
        })
        .on_repositioning_index(move |index| {
            repositions.borrow_mut().repositions.push(index);
        })
        .on_scroll_settled(move |position| {
            settled.borrow_mut().settled.push(position);
        })
        .on_cache_change(move |change| {
            cache_changes.borrow_mut().cache_changes.push(*change);
        })
}

/// Runs `f` against a fresh rule with `i64` content equal to the index.
pub fn run_scroller_test<R>(
    config: ScrollerConfig,
    range: Option<(i64, i64)>,
    viewport: ViewportGeometry,
    f: impl FnOnce(&mut ScrollerTestRule<i64>) -> R,
) -> R {
    let mut rule = ScrollerTestRule::new(config, range, viewport, |index| index);
    f(&mut rule)
}

#[cfg(test)]
#[path = "tests/scroller_tests.rs"]
mod scroller_tests;

#[cfg(test)]
#[path = "tests/list_mutation_tests.rs"]
mod list_mutation_tests;
