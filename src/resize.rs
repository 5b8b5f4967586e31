//! Resize ownership: `IDLE -> RESIZING(owner) -> IDLE` in one atomic word.

use core::sync::atomic::{AtomicUsize, Ordering};

const IDLE: usize = 0;

static NEXT_OWNER: AtomicUsize = AtomicUsize::new(1);

std::thread_local! {
    static OWNER: usize = NEXT_OWNER.fetch_add(1, Ordering::Relaxed);
}

/// Non-zero token identifying the calling thread.
fn current_owner() -> usize {
    OWNER.with(|o| *o)
}

/// Either IDLE or the token of the thread migrating the table.
#[derive(Debug)]
pub(crate) struct ResizeOwner {
    state: AtomicUsize,
}

impl ResizeOwner {
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicUsize::new(IDLE),
        }
    }

    /// Claims the resize for the calling thread; `None` if another thread
    /// (or this one, re-entrantly) already holds it.
    pub(crate) fn try_claim(&self) -> Option<ResizeClaim<'_>> {
        let me = current_owner();
        self.state
            .compare_exchange(IDLE, me, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ResizeClaim { owner: self, me })
    }

    /// Token of the thread currently resizing, if any.
    pub(crate) fn owner(&self) -> Option<usize> {
        match self.state.load(Ordering::Acquire) {
            IDLE => None,
            o => Some(o),
        }
    }
}

/// RAII proof of resize ownership; returns the state to IDLE on drop,
/// including when the migration unwinds.
pub(crate) struct ResizeClaim<'a> {
    owner: &'a ResizeOwner,
    me: usize,
}

impl Drop for ResizeClaim<'_> {
    fn drop(&mut self) {
        debug_assert_eq!(self.owner.state.load(Ordering::Relaxed), self.me);
        self.owner.state.store(IDLE, Ordering::Release);
    }
}
