use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use infinigrid_core::cache::ItemId;
use infinigrid_core::error::FetchError;
use infinigrid_core::fetch::{FetchFuture, FetchRequest, Fetched, ItemFetcher};

/// When scripted fetches complete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Every future is ready on its first poll.
    #[default]
    Immediate,
    /// Futures stay pending until [`ScriptedFetcher::resolve`] or
    /// [`ScriptedFetcher::resolve_all`] is called.
    Deferred,
}

struct DeferredSlot<C> {
    result: Option<Fetched<C>>,
    waker: Option<Waker>,
}

struct DeferredFetch<C> {
    slot: Rc<RefCell<DeferredSlot<C>>>,
}

impl<C> Future for DeferredFetch<C> {
    type Output = Fetched<C>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        match slot.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

struct FetcherScript<C> {
    content: Rc<dyn Fn(i64) -> C>,
    mode: FetchMode,
    end_of_list_from: Option<i64>,
    failing: BTreeSet<i64>,
    requests: Vec<FetchRequest>,
    deferred: BTreeMap<ItemId, (i64, Rc<RefCell<DeferredSlot<C>>>)>,
}

impl<C> FetcherScript<C> {
    fn result_for(&self, index: i64) -> Fetched<C> {
        if self.end_of_list_from.is_some_and(|end| index >= end) {
            Fetched::EndOfList
        } else if self.failing.contains(&index) {
            Fetched::Failed(FetchError::new(format!("scripted failure at {index}")))
        } else {
            Fetched::Content((self.content)(index))
        }
    }
}

/// Item fetcher driven by a test script.
///
/// Clones share the script, so the test can keep a handle after handing the
/// fetcher to a session.
pub struct ScriptedFetcher<C> {
    script: Rc<RefCell<FetcherScript<C>>>,
}

impl<C> Clone for ScriptedFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            script: Rc::clone(&self.script),
        }
    }
}

impl<C: 'static> ScriptedFetcher<C> {
    pub fn new(content: impl Fn(i64) -> C + 'static) -> Self {
        Self {
            script: Rc::new(RefCell::new(FetcherScript {
                content: Rc::new(content),
                mode: FetchMode::Immediate,
                end_of_list_from: None,
                failing: BTreeSet::new(),
                requests: Vec::new(),
                deferred: BTreeMap::new(),
            })),
        }
    }

    pub fn set_mode(&self, mode: FetchMode) {
        self.script.borrow_mut().mode = mode;
    }

    /// Reports end-of-list for every index at or beyond `index`.
    pub fn end_list_at(&self, index: i64) {
        self.script.borrow_mut().end_of_list_from = Some(index);
    }

    pub fn fail_index(&self, index: i64) {
        self.script.borrow_mut().failing.insert(index);
    }

    pub fn heal_index(&self, index: i64) {
        self.script.borrow_mut().failing.remove(&index);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.script.borrow().requests.clone()
    }

    pub fn requested_indices(&self) -> Vec<i64> {
        self.script
            .borrow()
            .requests
            .iter()
            .map(|request| request.index)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.script.borrow_mut().requests.clear();
    }

    /// Item ids of deferred fetches not yet resolved.
    pub fn pending(&self) -> Vec<ItemId> {
        self.script.borrow().deferred.keys().copied().collect()
    }

    /// Completes the deferred fetch for `item_id`.
    pub fn resolve(&self, item_id: ItemId) -> bool {
        let mut script = self.script.borrow_mut();
        let Some((index, slot)) = script.deferred.remove(&item_id) else {
            return false;
        };
        let result = script.result_for(index);
        drop(script);
        let waker = {
            let mut slot = slot.borrow_mut();
            slot.result = Some(result);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    /// Completes every deferred fetch. Returns how many were resolved.
    pub fn resolve_all(&self) -> usize {
        let pending = self.pending();
        pending
            .into_iter()
            .filter(|item_id| self.resolve(*item_id))
            .count()
    }
}

impl<C: 'static> ItemFetcher<C> for ScriptedFetcher<C> {
    fn fetch(&self, request: FetchRequest) -> FetchFuture<C> {
        let mut script = self.script.borrow_mut();
        script.requests.push(request);
        match script.mode {
            FetchMode::Immediate => {
                let result = script.result_for(request.index);
                Box::pin(std::future::ready(result))
            }
            FetchMode::Deferred => {
                let slot = Rc::new(RefCell::new(DeferredSlot {
                    result: None,
                    waker: None,
                }));
                script
                    .deferred
                    .insert(request.item_id, (request.index, Rc::clone(&slot)));
                Box::pin(DeferredFetch { slot })
            }
        }
    }
}
