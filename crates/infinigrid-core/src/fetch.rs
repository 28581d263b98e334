//! Asynchronous content fetch.
//!
//! The host supplies an [`ItemFetcher`]; every request becomes a boxed future
//! keyed by the [`ItemId`] it is meant to fill. Futures are polled
//! cooperatively by [`FetchQueue::poll_ready`] from the session's event
//! loop, never from another thread.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_task::ArcWake;

use crate::cache::ItemId;
use crate::collections::map::HashMap;
use crate::error::FetchError;

pub type FetchFuture<C> = Pin<Box<dyn Future<Output = Fetched<C>>>>;

/// Arguments passed to the host's fetch function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub index: i64,
    pub item_id: ItemId,
    pub session_id: u64,
}

/// Result of a single fetch.
#[derive(Debug, PartialEq)]
pub enum Fetched<C> {
    Content(C),
    /// The list ends before the requested index.
    EndOfList,
    Failed(FetchError),
}

/// Host contract for producing cell content.
pub trait ItemFetcher<C> {
    fn fetch(&self, request: FetchRequest) -> FetchFuture<C>;
}

impl<C, F> ItemFetcher<C> for F
where
    F: Fn(FetchRequest) -> FetchFuture<C>,
{
    fn fetch(&self, request: FetchRequest) -> FetchFuture<C> {
        self(request)
    }
}

/// A fetch that finished, reported with the index it was issued for.
#[derive(Debug)]
pub struct ResolvedFetch<C> {
    pub item_id: ItemId,
    pub requested_index: i64,
    pub result: Fetched<C>,
}

struct FetchTaskWaker {
    needs_poll: AtomicBool,
    queue_dirty: Arc<AtomicBool>,
}

impl ArcWake for FetchTaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.needs_poll.store(true, Ordering::Release);
        arc_self.queue_dirty.store(true, Ordering::Release);
    }
}

struct FetchTask<C> {
    requested_index: i64,
    future: FetchFuture<C>,
    waker: Arc<FetchTaskWaker>,
}

/// In-flight fetches keyed by item id.
pub struct FetchQueue<C> {
    tasks: HashMap<ItemId, FetchTask<C>>,
    dirty: Arc<AtomicBool>,
}

impl<C> Default for FetchQueue<C> {
    fn default() -> Self {
        Self {
            tasks: HashMap::default(),
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<C> std::fmt::Debug for FetchQueue<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchQueue")
            .field("in_flight", &self.tasks.len())
            .field("dirty", &self.dirty.load(Ordering::Acquire))
            .finish()
    }
}

impl<C> FetchQueue<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fetch. A previous fetch for the same item is dropped.
    pub fn push(&mut self, item_id: ItemId, requested_index: i64, future: FetchFuture<C>) {
        let waker = Arc::new(FetchTaskWaker {
            needs_poll: AtomicBool::new(true),
            queue_dirty: Arc::clone(&self.dirty),
        });
        self.dirty.store(true, Ordering::Release);
        self.tasks.insert(
            item_id,
            FetchTask {
                requested_index,
                future,
                waker,
            },
        );
    }

    pub fn cancel(&mut self, item_id: ItemId) -> bool {
        self.tasks.remove(&item_id).is_some()
    }

    /// Drops every fetch whose item fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(ItemId) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|item_id, _| keep(*item_id));
        before - self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.dirty.store(false, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.tasks.contains_key(&item_id)
    }

    /// True if some future was woken since the last poll.
    pub fn needs_poll(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Polls every woken future once and returns the finished ones in item
    /// id order.
    pub fn poll_ready(&mut self) -> Vec<ResolvedFetch<C>> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Vec::new();
        }
        let mut finished = Vec::new();
        for (&item_id, task) in self.tasks.iter_mut() {
            if !task.waker.needs_poll.swap(false, Ordering::AcqRel) {
                continue;
            }
            let waker = futures_task::waker(Arc::clone(&task.waker));
            let mut cx = Context::from_waker(&waker);
            if let Poll::Ready(result) = task.future.as_mut().poll(&mut cx) {
                finished.push((item_id, task.requested_index, result));
            }
        }
        finished.sort_unstable_by_key(|(item_id, _, _)| *item_id);
        finished
            .into_iter()
            .map(|(item_id, requested_index, result)| {
                self.tasks.remove(&item_id);
                ResolvedFetch {
                    item_id,
                    requested_index,
                    result,
                }
            })
            .collect()
    }
}

/// Wraps an already-known result as a fetch future.
pub fn ready<C: 'static>(result: Fetched<C>) -> FetchFuture<C> {
    Box::pin(std::future::ready(result))
}
