use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

use crate::axis::{AxisAnchor, ScrollDirection};
use crate::error::EngineError;
use crate::fetch::ready;
use crate::prelude::*;
use crate::session::ItemException;
use crate::state_machine::CradlePhase;
use crate::Clock;

pub(crate) struct TestClock {
    now: Cell<Instant>,
}

impl TestClock {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            now: Cell::new(Instant::now()),
        })
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// 50px square cells in a 500x250 viewport: 5 per row, 10 visible rows,
/// 2 runway rows on each side.
pub(crate) fn grid_config() -> ScrollerConfig {
    ScrollerConfig::new(50.0, 50.0).with_runway_rows(2)
}

pub(crate) fn fixed_probe(length: f64, cross_length: f64) -> impl Fn() -> ViewportGeometry {
    move || ViewportGeometry {
        length,
        cross_length,
        scroll_position: 0.0,
    }
}

pub(crate) fn index_fetcher(request: FetchRequest) -> FetchFuture<i64> {
    ready(Fetched::Content(request.index * 10))
}

pub(crate) fn started_session(config: ScrollerConfig, size: i64) -> ScrollerSession<i64> {
    let mut session: ScrollerSession<i64> = ScrollerSession::new(
        config,
        Some((0, size - 1)),
        index_fetcher,
        fixed_probe(500.0, 250.0),
    );
    session.start(0);
    session.pump();
    session
}

#[test]
fn test_start_builds_initial_window() {
    let session = started_session(grid_config(), 1000);
    let window = session.current_window();

    assert_eq!(session.phase(), CradlePhase::Ready);
    assert_eq!(window.cross_count, 5);
    assert_eq!(window.first_index(), Some(0));
    assert_eq!(window.len(), 70);
    assert!(window.head.is_empty());
    assert_eq!(window.axis_reference_index, Some(0));
    assert_eq!(window.total_scrollable_length, 200.0 * 50.0);
    assert_eq!(session.cache().len(), 70);
    assert_eq!(session.cache().pending_count(), 0);
    assert_eq!(session.cache().content(12), Some(&120));
    assert_eq!(session.cradle_index_map().len(), 70);
}

#[test]
fn test_sub_row_scroll_only_updates_offset() {
    let mut session = started_session(grid_config(), 1000);
    let before = session.current_window();

    session.push_signal(ViewportSignal::Scroll { position: 20.0 });
    session.pump();

    let after = session.current_window();
    assert_eq!(after.indices(), before.indices());
    assert_eq!(after.axis_reference_index, Some(0));
    assert_eq!(after.axis_pixel_offset, -20.0);
    assert_eq!(after.scroll_position, 20.0);
}

#[test]
fn test_scroll_shifts_window_and_evicts() {
    let mut session = started_session(grid_config(), 1000);

    session.push_signal(ViewportSignal::Scroll { position: 400.0 });
    session.pump();

    let window = session.current_window();
    assert_eq!(window.axis_reference_index, Some(40));
    assert_eq!(window.first_index(), Some(30));
    assert_eq!(window.last_index(), Some(99));
    assert_eq!(window.head.len(), 10);
    assert_eq!(session.phase(), CradlePhase::Ready);
    // Cradle mode keeps the cache equal to the window.
    let cached: Vec<i64> = session.cache_index_map().keys().copied().collect();
    assert_eq!(cached, (30..=99).collect::<Vec<_>>());
    session.cache().verify_bijection().unwrap();
}

#[test]
fn test_large_scroll_repositions() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);
    let mut session: ScrollerSession<i64> = ScrollerSession::new(
        grid_config(),
        Some((0, 999)),
        index_fetcher,
        fixed_probe(500.0, 250.0),
    )
    .with_callbacks(HostCallbacks::default().on_repositioning_index(move |index| {
        record.borrow_mut().push(index);
    }));
    session.start(0);
    session.pump();

    session.push_signal(ViewportSignal::Scroll { position: 5010.0 });
    session.pump();

    assert_eq!(*seen.borrow(), vec![500]);
    let window = session.current_window();
    assert_eq!(window.axis_reference_index, Some(500));
    assert_eq!(window.axis_pixel_offset, -10.0);
    assert_eq!(window.first_index(), Some(490));
    assert_eq!(window.len(), 70);
}

#[test]
fn test_end_of_list_shrinks_only_trailing_items() {
    let ranges = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&ranges);
    let fetcher = |request: FetchRequest| {
        if request.index >= 999 {
            ready(Fetched::EndOfList)
        } else {
            ready(Fetched::Content(request.index))
        }
    };
    let mut session: ScrollerSession<i64> = ScrollerSession::new(
        grid_config(),
        Some((0, 999)),
        fetcher,
        fixed_probe(500.0, 250.0),
    )
    .with_callbacks(HostCallbacks::default().on_list_range_change(move |range| {
        record.borrow_mut().push(range);
    }));
    session.start(999);
    let before = session.current_window();
    assert_eq!(before.last_index(), Some(999));
    assert_eq!(before.len(), 70);

    session.pump();

    let after = session.current_window();
    assert_eq!(session.list().high_index(), 998);
    assert_eq!(after.first_index(), before.first_index());
    assert_eq!(after.last_index(), Some(998));
    assert_eq!(after.len(), 69);
    assert_eq!(*ranges.borrow(), vec![Some((0, 998))]);
    assert!(!session.cache().contains_index(999));
}

#[test]
fn test_fetch_failure_is_localized() {
    let exceptions: Rc<RefCell<Vec<ItemException>>> = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&exceptions);
    let fetcher = |request: FetchRequest| {
        if request.index == 3 {
            ready(Fetched::Failed(FetchError::new("boom")))
        } else {
            ready(Fetched::Content(request.index))
        }
    };
    let mut session: ScrollerSession<i64> = ScrollerSession::new(
        grid_config(),
        Some((0, 99)),
        fetcher,
        fixed_probe(500.0, 250.0),
    )
    .with_session_id(7)
    .with_callbacks(HostCallbacks::default().on_item_exception(move |exception| {
        record.borrow_mut().push(exception.clone());
    }));
    session.start(0);
    session.pump();

    let exceptions = exceptions.borrow();
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].index, 3);
    assert_eq!(exceptions[0].session_id, 7);
    assert_eq!(exceptions[0].error.message(), "boom");

    let window = session.current_window();
    let slot = window.slots().find(|slot| slot.index == 3).unwrap();
    assert_eq!(slot.item_id, None);
    assert!(!session.cache().contains_index(3));
    assert_eq!(session.properties_snapshot().failed_indices, vec![3]);
    assert_eq!(session.phase(), CradlePhase::Ready);
    assert_eq!(session.cache().len(), 69);
}

#[test]
fn test_empty_list_has_no_axis() {
    let mut session: ScrollerSession<i64> =
        ScrollerSession::new(grid_config(), None, index_fetcher, fixed_probe(500.0, 250.0));
    session.start(0);
    session.pump();

    let window = session.current_window();
    assert!(window.is_empty());
    assert_eq!(window.axis_reference_index, None);
    assert_eq!(window.cross_count, 0);
    assert_eq!(session.phase(), CradlePhase::Idle);
}

#[test]
fn test_resize_rebuilds_after_debounce() {
    let clock = TestClock::new();
    let viewport = Rc::new(Cell::new(ViewportGeometry {
        length: 500.0,
        cross_length: 250.0,
        scroll_position: 0.0,
    }));
    let probe_viewport = Rc::clone(&viewport);
    let mut session: ScrollerSession<i64> = ScrollerSession::new(
        grid_config(),
        Some((0, 999)),
        index_fetcher,
        move || probe_viewport.get(),
    )
    .with_clock(clock.clone());
    session.start(0);
    session.pump();

    viewport.set(ViewportGeometry {
        length: 500.0,
        cross_length: 500.0,
        scroll_position: 0.0,
    });
    session.push_signal(ViewportSignal::Resize {
        length: 500.0,
        cross_length: 500.0,
    });
    session.pump();
    assert_eq!(session.current_window().cross_count, 5);

    clock.advance(Duration::from_millis(300));
    session.pump();
    let window = session.current_window();
    assert_eq!(window.cross_count, 10);
    assert_eq!(window.len(), 140);
    assert_eq!(window.axis_reference_index, Some(0));
}

#[test]
fn test_scroll_settled_callback_fires_once() {
    let clock = TestClock::new();
    let settled = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&settled);
    let mut session: ScrollerSession<i64> = ScrollerSession::new(
        grid_config(),
        Some((0, 999)),
        index_fetcher,
        fixed_probe(500.0, 250.0),
    )
    .with_clock(clock.clone())
    .with_callbacks(HostCallbacks::default().on_scroll_settled(move |position| {
        record.borrow_mut().push(position);
    }));
    session.start(0);

    session.push_signal(ViewportSignal::Scroll { position: 60.0 });
    session.pump();
    assert!(settled.borrow().is_empty());
    assert!(session.next_deadline().is_some());

    clock.advance(Duration::from_millis(250));
    session.pump();
    session.pump();
    assert_eq!(*settled.borrow(), vec![60.0]);
}

#[test]
fn test_scroll_direction_follows_deltas() {
    let mut session = started_session(grid_config(), 1000);
    assert_eq!(session.properties_snapshot().scroll_direction, ScrollDirection::None);

    session.push_signal(ViewportSignal::Scroll { position: 400.0 });
    session.pump();
    assert_eq!(session.properties_snapshot().scroll_direction, ScrollDirection::Forward);

    session.push_signal(ViewportSignal::Scroll { position: 400.0 });
    session.pump();
    assert_eq!(session.properties_snapshot().scroll_direction, ScrollDirection::Forward);

    session.push_signal(ViewportSignal::Scroll { position: 120.0 });
    session.pump();
    assert_eq!(session.properties_snapshot().scroll_direction, ScrollDirection::Backward);
    assert_eq!(session.current_window().first_index(), Some(0));
}

#[test]
fn test_engine_error_keeps_last_window() {
    let mut session = started_session(grid_config(), 1000);
    let before = session.current_window();
    let cached = session.cache_index_map();

    // An anchor past the end of the list fails the scroll update.
    let broken = AxisAnchor::new(5_000, -10.0);
    session.state.axis.commit(broken);
    session.push_signal(ViewportSignal::Scroll { position: 400.0 });
    session.pump();

    assert_eq!(session.phase(), CradlePhase::Ready);
    assert_eq!(session.state.axis.anchor(), Some(broken));
    let after = session.current_window();
    assert_eq!(after.head, before.head);
    assert_eq!(after.tail, before.tail);
    assert_eq!(session.cache_index_map(), cached);

    // A failure part way through a shift falls back to the last stable phase.
    session.state.machine.transition(CradlePhase::Shifting).unwrap();
    session.settle(Err(EngineError::NonContiguousWindow {
        expected: 1,
        found: 3,
    }));
    assert_eq!(session.phase(), CradlePhase::Ready);
    assert_eq!(session.current_window().tail, before.tail);

    session.scroll_to_index(400).unwrap();
    session.pump();
    let window = session.current_window();
    assert_eq!(window.axis_reference_index, Some(400));
    assert_eq!(window.first_index(), Some(390));
}
