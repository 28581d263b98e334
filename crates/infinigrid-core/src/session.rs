//! A scroller session: one list, one viewport, one cache.
//!
//! The session owns an explicit [`EngineState`] and is the only place where
//! window transitions are sequenced. Every transition computes its result
//! first and commits it at the end, so an invariant failure leaves the last
//! good window and anchor in place.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::axis::{AxisAnchor, AxisPositionTracker};
use crate::cache::{CellContent, ItemId, SparseCache};
use crate::collections::map::HashSet;
use crate::config::{CacheMode, ScrollerConfig};
use crate::error::{EngineError, FetchError};
use crate::fetch::{FetchQueue, FetchRequest, Fetched, ItemFetcher, ResolvedFetch};
use crate::list_model::VirtualListRange;
use crate::platform::{Clock, SystemClock};
use crate::signal::{EngineEvent, SignalAdapter, ViewportSignal};
use crate::snapshot::{CellLayout, ScrollerProperties, WindowSnapshot};
use crate::state_machine::{CradlePhase, CradleStateMachine};
use crate::window::{compute_window, update_for_scroll, CradleWindow, ScrollUpdate, WindowMetrics};

/// Upper bound on event/fetch rounds per [`ScrollerSession::pump`].
const MAX_PUMP_ROUNDS: usize = 100;

/// Viewport measurements reported by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportGeometry {
    /// Length along the scroll axis.
    pub length: f64,
    /// Length along the cross axis.
    pub cross_length: f64,
    pub scroll_position: f64,
}

/// Source of viewport geometry, polled once per handled event.
pub trait ViewportProbe {
    fn geometry(&self) -> ViewportGeometry;
}

impl<F> ViewportProbe for F
where
    F: Fn() -> ViewportGeometry,
{
    fn geometry(&self) -> ViewportGeometry {
        self()
    }
}

/// A failed fetch, reported to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemException {
    pub session_id: u64,
    pub index: i64,
    pub item_id: ItemId,
    pub error: FetchError,
}

/// Cache activity caused by one engine step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheChange {
    pub fetched: usize,
    pub evicted: usize,
    pub cached: usize,
}

/// Optional host notifications.
#[derive(Clone, Default)]
pub struct HostCallbacks {
    pub item_exception: Option<Rc<dyn Fn(&ItemException)>>,
    pub list_range_change: Option<Rc<dyn Fn(Option<(i64, i64)>)>>,
    pub repositioning_index: Option<Rc<dyn Fn(i64)>>,
    pub scroll_settled: Option<Rc<dyn Fn(f64)>>,
    pub cache_change: Option<Rc<dyn Fn(&CacheChange)>>,
}

impl HostCallbacks {
    pub fn on_item_exception(mut self, f: impl Fn(&ItemException) + 'static) -> Self {
        self.item_exception = Some(Rc::new(f));
        self
    }

    pub fn on_list_range_change(mut self, f: impl Fn(Option<(i64, i64)>) + 'static) -> Self {
        self.list_range_change = Some(Rc::new(f));
        self
    }

    pub fn on_repositioning_index(mut self, f: impl Fn(i64) + 'static) -> Self {
        self.repositioning_index = Some(Rc::new(f));
        self
    }

    pub fn on_scroll_settled(mut self, f: impl Fn(f64) + 'static) -> Self {
        self.scroll_settled = Some(Rc::new(f));
        self
    }

    pub fn on_cache_change(mut self, f: impl Fn(&CacheChange) + 'static) -> Self {
        self.cache_change = Some(Rc::new(f));
        self
    }
}

impl std::fmt::Debug for HostCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCallbacks")
            .field("item_exception", &self.item_exception.is_some())
            .field("list_range_change", &self.list_range_change.is_some())
            .field("repositioning_index", &self.repositioning_index.is_some())
            .field("scroll_settled", &self.scroll_settled.is_some())
            .field("cache_change", &self.cache_change.is_some())
            .finish()
    }
}

/// Mutable engine state of one session.
#[derive(Debug)]
pub struct EngineState<C> {
    pub(crate) list: VirtualListRange,
    pub(crate) axis: AxisPositionTracker,
    pub(crate) window: CradleWindow,
    pub(crate) cache: SparseCache<C>,
    pub(crate) machine: CradleStateMachine,
    pub(crate) failed_indices: BTreeSet<i64>,
    pub(crate) viewport: ViewportGeometry,
    pub(crate) started: bool,
    pub(crate) preloaded: bool,
}

impl<C> EngineState<C> {
    fn new(list: VirtualListRange) -> Self {
        Self {
            list,
            axis: AxisPositionTracker::new(),
            window: CradleWindow::new(),
            cache: SparseCache::new(),
            machine: CradleStateMachine::new(),
            failed_indices: BTreeSet::new(),
            viewport: ViewportGeometry::default(),
            started: false,
            preloaded: false,
        }
    }
}

/// Virtual-window engine for one scroller.
pub struct ScrollerSession<C> {
    id: u64,
    pub(crate) config: ScrollerConfig,
    pub(crate) state: EngineState<C>,
    fetcher: Box<dyn ItemFetcher<C>>,
    probe: Box<dyn ViewportProbe>,
    clock: Rc<dyn Clock>,
    pub(crate) callbacks: HostCallbacks,
    pub(crate) signals: SignalAdapter,
    pub(crate) fetches: FetchQueue<C>,
}

impl<C> std::fmt::Debug for ScrollerSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollerSession")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("list", &self.state.list)
            .field("phase", &self.state.machine.phase())
            .field("window_len", &self.state.window.len())
            .field("cached", &self.state.cache.len())
            .field("fetches", &self.fetches)
            .finish()
    }
}

impl<C: 'static> ScrollerSession<C> {
    /// Creates a session for the list `range` (`None` for an empty list).
    ///
    /// Nothing is laid out until [`ScrollerSession::start`] runs.
    pub fn new(
        config: ScrollerConfig,
        range: Option<(i64, i64)>,
        fetcher: impl ItemFetcher<C> + 'static,
        probe: impl ViewportProbe + 'static,
    ) -> Self {
        let list = match range {
            Some((low, high)) => VirtualListRange::new(low, high, 1),
            None => VirtualListRange::empty(1),
        };
        Self {
            id: 0,
            signals: SignalAdapter::from_config(&config),
            config,
            state: EngineState::new(list),
            fetcher: Box::new(fetcher),
            probe: Box::new(probe),
            clock: Rc::new(SystemClock),
            callbacks: HostCallbacks::default(),
            fetches: FetchQueue::new(),
        }
    }

    /// Sets the id passed to the fetcher and reported in exceptions.
    pub fn with_session_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn with_callbacks(mut self, callbacks: HostCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &ScrollerConfig {
        &self.config
    }

    pub fn phase(&self) -> CradlePhase {
        self.state.machine.phase()
    }

    pub fn list(&self) -> &VirtualListRange {
        &self.state.list
    }

    pub fn cache(&self) -> &SparseCache<C> {
        &self.state.cache
    }

    pub fn anchor(&self) -> Option<AxisAnchor> {
        self.state.axis.anchor()
    }

    pub fn is_started(&self) -> bool {
        self.state.started
    }

    /// Reads the viewport and builds the first window at `axis_index`.
    pub fn start(&mut self, axis_index: i64) {
        self.refresh_viewport();
        self.state.started = true;
        let result = self.rebuild(axis_index, 0.0);
        self.settle(result);
    }

    /// Queues a host notification; it is processed by the next
    /// [`ScrollerSession::pump`].
    pub fn push_signal(&mut self, signal: ViewportSignal) {
        let now = self.clock.now();
        self.signals.push(signal, now);
    }

    /// Processes due signals and resolved fetches until no more progress is
    /// made. Returns the number of rounds that did work.
    pub fn pump(&mut self) -> usize {
        let mut rounds = 0;
        loop {
            let mut progressed = false;
            let events = self.signals.drain(self.clock.now());
            if !events.is_empty() {
                progressed = true;
                for event in events {
                    self.handle_event(event);
                }
            }
            if self.fetches.needs_poll() {
                let resolved = self.fetches.poll_ready();
                if !resolved.is_empty() {
                    progressed = true;
                    for fetch in resolved {
                        self.apply_fetch(fetch);
                    }
                }
            }
            if !progressed {
                break;
            }
            rounds += 1;
            if rounds >= MAX_PUMP_ROUNDS {
                log::warn!("session {}: pump stopped after {rounds} rounds", self.id);
                break;
            }
        }
        rounds
    }

    /// Instant of the next timed signal, for hosts that schedule wakeups.
    pub fn next_deadline(&self) -> Option<web_time::Instant> {
        self.signals.next_deadline()
    }

    pub fn current_window(&self) -> WindowSnapshot {
        let geometry = self.state.list.row_geometry();
        let metrics = self.metrics();
        let anchor = self.state.axis.anchor();
        let scroll_position = anchor
            .map(|anchor| {
                let row = geometry.row_of(anchor.reference_index);
                metrics.row_position(&geometry, row) - anchor.pixel_offset
            })
            .unwrap_or(0.0);
        WindowSnapshot {
            head: self.state.window.head().to_vec(),
            tail: self.state.window.tail().to_vec(),
            axis_reference_index: anchor.map(|anchor| anchor.reference_index),
            axis_pixel_offset: anchor.map(|anchor| anchor.pixel_offset).unwrap_or(0.0),
            scroll_position,
            total_scrollable_length: metrics.total_scrollable_length(&geometry),
            cross_count: geometry.cross_count().unwrap_or(0),
            orientation: self.config.orientation,
            layout: CellLayout {
                cell_length: self.config.cell_length,
                cell_cross_length: self.config.cell_cross_length,
                gap: self.config.gap,
                cross_gap: self.config.cross_gap,
                padding_start: self.config.padding_start,
                padding_cross: self.config.padding_cross,
                first_row: geometry.first_row,
            },
        }
    }

    pub fn properties_snapshot(&self) -> ScrollerProperties {
        let geometry = self.state.list.row_geometry();
        ScrollerProperties {
            session_id: self.id,
            list_bounds: self.state.list.bounds(),
            list_size: self.state.list.size(),
            cross_count: geometry.cross_count().unwrap_or(0),
            row_count: geometry.row_count,
            orientation: self.config.orientation,
            phase: self.state.machine.phase(),
            cache_state: self.state.cache.state(),
            cached_count: self.state.cache.len(),
            pending_fetches: self.fetches.len(),
            failed_indices: self.state.failed_indices.iter().copied().collect(),
            viewport_length: self.state.viewport.length,
            viewport_cross_length: self.state.viewport.cross_length,
            scroll_position: self.state.viewport.scroll_position,
            scroll_direction: self.state.axis.direction(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Event handling
    // ─────────────────────────────────────────────────────────────────────

    fn handle_event(&mut self, event: EngineEvent) {
        if !self.state.started {
            return;
        }
        match event {
            EngineEvent::Scrolled { position } => {
                self.refresh_viewport();
                self.state.viewport.scroll_position = position;
                let result = self.on_scroll(position);
                self.settle(result);
            }
            EngineEvent::BoundaryCrossed {
                edge,
                crossed_outward,
            } => {
                self.refresh_viewport();
                log::trace!(
                    "session {}: {edge:?} boundary crossed (outward: {crossed_outward})",
                    self.id
                );
                let position = self.state.viewport.scroll_position;
                let result = self.on_scroll(position);
                self.settle(result);
            }
            EngineEvent::ViewportResized { .. } => {
                self.refresh_viewport();
                let result = self.rebuild_at_anchor();
                self.settle(result);
            }
            EngineEvent::ScrollSettled { position } => {
                if let Some(callback) = self.callbacks.scroll_settled.clone() {
                    callback(position);
                }
            }
        }
    }

    /// Polls the probe and applies the cross count it implies.
    pub(crate) fn refresh_viewport(&mut self) {
        let mut geometry = self.probe.geometry();
        if !geometry.length.is_finite() || geometry.length < 0.0 {
            log::warn!(
                "session {}: invalid viewport length {}, treating as 0",
                self.id,
                geometry.length
            );
            geometry.length = 0.0;
        }
        if !geometry.scroll_position.is_finite() {
            geometry.scroll_position = 0.0;
        }
        self.state.viewport = geometry;
        let cross_count = self.config.cross_count_for(geometry.cross_length);
        if cross_count != self.state.list.cross_count() {
            log::debug!("session {}: cross count now {cross_count}", self.id);
            self.state.list.set_cross_count(cross_count);
        }
    }

    pub(crate) fn metrics(&self) -> WindowMetrics {
        WindowMetrics::from_config(&self.config, self.state.viewport.length)
    }

    /// Logs an engine failure and restores the last stable phase.
    pub(crate) fn settle(&mut self, result: Result<(), EngineError>) {
        if let Err(err) = result {
            log::error!("session {}: {err}; keeping last window", self.id);
            self.state.machine.abort();
        }
    }

    fn on_scroll(&mut self, position: f64) -> Result<(), EngineError> {
        let delta = self.state.axis.record_scroll(position);
        log::trace!("session {}: scroll to {position} ({delta:+})", self.id);
        let Some(anchor) = self.state.axis.anchor() else {
            if !self.state.list.is_empty() {
                return self.rebuild(self.state.list.low_index(), 0.0);
            }
            return Ok(());
        };
        if self.state.machine.phase() != CradlePhase::Ready {
            return self.rebuild_at_anchor();
        }

        let geometry = self.state.list.row_geometry();
        let metrics = self.metrics();
        let update = update_for_scroll(position, anchor, &self.state.window, &geometry, &metrics)?;
        match update {
            ScrollUpdate::NoShift { axis_pixel_offset } => {
                self.state.axis.set_pixel_offset(axis_pixel_offset);
                Ok(())
            }
            ScrollUpdate::Shift(spec) => {
                self.state.machine.transition(CradlePhase::Shifting)?;
                let mut window = self.state.window.clone();
                let cache = &self.state.cache;
                let delta = window.apply_shift(
                    spec.new_cradle_reference_index,
                    spec.new_cradle_last_index(),
                    spec.new_axis_reference_index,
                    |index| cache.item_id_at(index),
                );
                window.verify_contiguous()?;
                if window.len() != spec.new_cradle_content_count {
                    return Err(EngineError::NonContiguousWindow {
                        expected: spec.new_cradle_last_index(),
                        found: window.last_index().unwrap_or(spec.new_cradle_reference_index - 1),
                    });
                }
                log::debug!(
                    "session {}: shifted cradle {:?} by {} (axis {} -> {}), +{} -{}",
                    self.id,
                    self.state.axis.direction(),
                    spec.cradle_item_shift,
                    anchor.reference_index,
                    spec.new_axis_reference_index,
                    delta.added.len(),
                    delta.dropped.len()
                );
                self.state.window = window;
                self.state.axis.commit(AxisAnchor::new(
                    spec.new_axis_reference_index,
                    spec.new_axis_pixel_offset,
                ));
                for index in &delta.dropped {
                    self.state.failed_indices.remove(index);
                }
                let fetched = self.request_content(delta.added);
                self.state.machine.transition(CradlePhase::Evicting)?;
                self.sync_cache(fetched);
                self.state.machine.transition(CradlePhase::Ready)
            }
            ScrollUpdate::Reposition {
                axis_index,
                axis_pixel_offset,
            } => {
                log::debug!("session {}: repositioning to {axis_index}", self.id);
                if let Some(callback) = self.callbacks.repositioning_index.clone() {
                    callback(axis_index);
                }
                self.signals.discard_scroll();
                self.rebuild(axis_index, axis_pixel_offset)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Window transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Rebuilds around the committed anchor, or the list start without one.
    pub(crate) fn rebuild_at_anchor(&mut self) -> Result<(), EngineError> {
        match self.state.axis.anchor() {
            Some(anchor) => self.rebuild(anchor.reference_index, anchor.pixel_offset),
            None => self.rebuild(self.state.list.low_index(), 0.0),
        }
    }

    /// Builds the window from scratch for an axis request.
    pub(crate) fn rebuild(&mut self, axis_index: i64, pixel_offset: f64) -> Result<(), EngineError> {
        if !self.state.started {
            return Ok(());
        }
        if self.state.machine.phase().is_busy() {
            self.state.machine.abort();
        }
        self.state.machine.transition(CradlePhase::Rebuilding)?;

        let geometry = self.state.list.row_geometry();
        let metrics = self.metrics();
        let Some(plan) = compute_window(axis_index, pixel_offset, &geometry, &metrics) else {
            log::debug!("session {}: list is empty, clearing window", self.id);
            self.state.window.clear();
            self.state.axis.clear();
            self.fetches.clear();
            let evicted = self.state.cache.evict_to_match(&HashSet::default()).len();
            self.state.failed_indices.clear();
            self.notify_cache_change(0, evicted);
            return self.state.machine.transition(CradlePhase::Idle);
        };

        let cache = &self.state.cache;
        let window = CradleWindow::build(
            plan.cradle_reference_index,
            plan.cradle_item_count,
            plan.axis_reference_index,
            |index| cache.item_id_at(index),
        );
        window.verify_contiguous()?;
        if window.axis_index() != Some(plan.axis_reference_index) {
            return Err(EngineError::AxisOutOfBounds {
                index: plan.axis_reference_index,
                low: plan.cradle_reference_index,
                high: plan.cradle_reference_index + plan.cradle_item_count as i64 - 1,
            });
        }

        log::debug!(
            "session {}: rebuilt cradle [{}, +{}) axis {} offset {}",
            self.id,
            plan.cradle_reference_index,
            plan.cradle_item_count,
            plan.axis_reference_index,
            plan.axis_pixel_offset
        );
        self.state.window = window;
        self.state
            .axis
            .commit(AxisAnchor::new(plan.axis_reference_index, plan.axis_pixel_offset));
        self.state.axis.reset_scroll_position(plan.scroll_position);
        self.state.viewport.scroll_position = plan.scroll_position;

        let indices: Vec<i64> = self.state.window.indices().collect();
        let fetched = self.request_content(indices);
        self.state.machine.transition(CradlePhase::Evicting)?;
        self.sync_cache(fetched);
        self.state.machine.transition(CradlePhase::Ready)
    }

    /// Ensures each index has a cache entry and an in-flight fetch if its
    /// content is pending. Failed indices are skipped.
    pub(crate) fn request_content(&mut self, indices: impl IntoIterator<Item = i64>) -> usize {
        let mut requested = 0;
        for index in indices {
            if self.state.failed_indices.contains(&index) || !self.state.list.contains(index) {
                continue;
            }
            let item_id = self.state.cache.create_entry(index, CellContent::Pending);
            if self.state.cache.is_wanted(item_id) && !self.fetches.contains(item_id) {
                let request = FetchRequest {
                    index,
                    item_id,
                    session_id: self.id,
                };
                self.fetches.push(item_id, index, self.fetcher.fetch(request));
                requested += 1;
            }
            self.state.window.set_item_id(index, Some(item_id));
        }
        requested
    }

    /// Applies the cache mode after the window changed.
    pub(crate) fn sync_cache(&mut self, mut fetched: usize) {
        let mut evicted = 0;
        match self.config.cache_mode {
            CacheMode::Cradle => {
                let required: HashSet<i64> = self.state.window.indices().collect();
                evicted = self.state.cache.evict_to_match(&required).len();
            }
            CacheMode::Keep => {
                if let Some(cache_max) = self.config.cache_max {
                    let required: Vec<i64> = self.state.window.indices().collect();
                    evicted = self.state.cache.evict_to_max(cache_max, &required).len();
                }
            }
            CacheMode::Preload => {
                if !self.state.preloaded {
                    self.state.preloaded = true;
                    if let Some((low, high)) = self.state.list.bounds() {
                        let limit = self.config.cache_max.unwrap_or(usize::MAX);
                        let span = (high - low + 1) as usize;
                        let last = low + span.min(limit) as i64 - 1;
                        log::debug!("session {}: preloading [{low}, {last}]", self.id);
                        fetched += self.request_content(low..=last);
                    }
                }
                if let Some(cache_max) = self.config.cache_max {
                    let required: Vec<i64> = self.state.window.indices().collect();
                    evicted = self.state.cache.evict_to_max(cache_max, &required).len();
                }
            }
        }
        if evicted > 0 {
            let cache = &self.state.cache;
            self.fetches.retain(|item_id| cache.is_wanted(item_id));
        }
        self.state
            .failed_indices
            .retain(|index| self.state.window.contains(*index));
        self.notify_cache_change(fetched, evicted);
    }

    fn notify_cache_change(&self, fetched: usize, evicted: usize) {
        if fetched == 0 && evicted == 0 {
            return;
        }
        if let Some(callback) = self.callbacks.cache_change.clone() {
            callback(&CacheChange {
                fetched,
                evicted,
                cached: self.state.cache.len(),
            });
        }
    }

    pub(crate) fn notify_list_range_change(&self) {
        if let Some(callback) = self.callbacks.list_range_change.clone() {
            callback(self.state.list.bounds());
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Fetch resolution
    // ─────────────────────────────────────────────────────────────────────

    fn apply_fetch(&mut self, fetch: ResolvedFetch<C>) {
        let ResolvedFetch {
            item_id,
            requested_index,
            result,
        } = fetch;
        if !self.state.cache.is_wanted(item_id) {
            log::debug!(
                "session {}: discarding fetch for {item_id} (index {requested_index}), no longer wanted",
                self.id
            );
            return;
        }
        let Some(index) = self
            .state
            .cache
            .get_by_item(item_id)
            .map(|entry| entry.logical_index)
        else {
            return;
        };

        match result {
            Fetched::Content(content) => {
                self.state.cache.fulfill(item_id, content);
            }
            Fetched::Failed(error) => {
                log::warn!("session {}: fetch for index {index} failed: {error}", self.id);
                self.state.cache.remove_item(item_id);
                self.state.failed_indices.insert(index);
                self.state.window.set_item_id(index, None);
                if let Some(callback) = self.callbacks.item_exception.clone() {
                    callback(&ItemException {
                        session_id: self.id,
                        index,
                        item_id,
                        error,
                    });
                }
            }
            Fetched::EndOfList => {
                self.state.cache.remove_item(item_id);
                let result = self.shrink_to(index - 1);
                self.settle(result);
            }
        }
    }

    /// Lowers the list's high index after the fetcher reported the end of
    /// the list, dropping only what lies beyond it.
    fn shrink_to(&mut self, new_high: i64) -> Result<(), EngineError> {
        let Some((low, high)) = self.state.list.bounds() else {
            return Ok(());
        };
        if new_high >= high {
            return Ok(());
        }
        log::warn!(
            "session {}: end of list at {}, high index {high} -> {new_high}",
            self.id,
            new_high + 1
        );
        self.state.list.set_range(low, new_high);
        for index in self.state.cache.cached_indices() {
            if index > new_high {
                self.state.cache.remove_index(index);
            }
        }
        let cache = &self.state.cache;
        self.fetches.retain(|item_id| cache.is_wanted(item_id));
        self.state.failed_indices.retain(|index| *index <= new_high);
        self.notify_list_range_change();

        let axis_beyond = self
            .state
            .axis
            .anchor()
            .is_some_and(|anchor| anchor.reference_index > new_high);
        if self.state.list.is_empty() || axis_beyond {
            return self.rebuild_at_anchor();
        }
        let dropped = self.state.window.truncate_after(new_high);
        log::debug!(
            "session {}: dropped {} cradle slots beyond {new_high}",
            self.id,
            dropped.len()
        );
        self.state.window.verify_contiguous()
    }
}
