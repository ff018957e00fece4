//! Cancellation contexts with optional deadlines.
//!
//! A [`CancelContext`] ends when it is cancelled explicitly, when its deadline
//! passes, or when any ancestor ends. Workers and the dispatcher wait on a
//! context through crossbeam channels: each context owns a channel that never
//! carries a message and disconnects on cancel, so it can sit in a `Select`
//! next to the job queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

struct ContextInner {
    cancelled: AtomicBool,
    /// Dropped on cancel, which disconnects `done`.
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
    /// Effective deadline, already folded with the parent's.
    deadline: Option<Instant>,
    parent: Option<CancelContext>,
}

/// Cloneable handle to a cancellation scope.
#[derive(Clone)]
pub struct CancelContext {
    inner: Arc<ContextInner>,
}

impl CancelContext {
    /// Root context that never expires on its own.
    #[must_use]
    pub fn background() -> Self {
        Self::build(None, None)
    }

    /// Child context that also ends after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now().checked_add(timeout);
        self.with_deadline_opt(deadline)
    }

    /// Child context that also ends at `deadline`.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        self.with_deadline_opt(Some(deadline))
    }

    /// Child context that ends with this one or when cancelled itself.
    #[must_use]
    pub fn child(&self) -> Self {
        self.with_deadline_opt(None)
    }

    fn with_deadline_opt(&self, deadline: Option<Instant>) -> Self {
        let effective = match (self.inner.deadline, deadline) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };
        Self::build(effective, Some(self.clone()))
    }

    fn build(deadline: Option<Instant>, parent: Option<Self>) -> Self {
        let (trigger, done) = bounded(0);
        Self {
            inner: Arc::new(ContextInner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
                deadline,
                parent,
            }),
        }
    }

    /// Cancel this context and every context derived from it.
    ///
    /// Only the first call has an effect.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.trigger.lock().take();
    }

    /// Whether this context or an ancestor was cancelled, or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }
        if self.inner.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        self.inner.parent.as_ref().is_some_and(Self::is_cancelled)
    }

    /// Effective deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Channels that disconnect when this context or an ancestor is cancelled.
    pub(crate) fn done_channels(&self) -> Vec<Receiver<()>> {
        let mut channels = Vec::new();
        let mut current = Some(self);
        while let Some(ctx) = current {
            channels.push(ctx.inner.done.clone());
            current = ctx.inner.parent.as_ref();
        }
        channels
    }

    /// Channel that becomes ready at the deadline, or never.
    pub(crate) fn deadline_channel(&self) -> Receiver<Instant> {
        self.inner
            .deadline
            .map_or_else(crossbeam_channel::never, crossbeam_channel::at)
    }
}

impl Default for CancelContext {
    fn default() -> Self {
        Self::background()
    }
}

impl std::fmt::Debug for CancelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelContext")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.inner.deadline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{RecvTimeoutError, Select};

    #[test]
    fn test_cancel_propagates_to_children() {
        let root = CancelContext::background();
        let child = root.child();
        let grandchild = child.with_timeout(Duration::from_secs(60));
        assert!(!grandchild.is_cancelled());

        root.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
        for rx in grandchild.done_channels() {
            if rx.recv_timeout(Duration::from_millis(1)) == Err(RecvTimeoutError::Disconnected) {
                return;
            }
        }
        panic!("no done channel disconnected after root cancel");
    }

    #[test]
    fn test_cancel_is_idempotent_and_local() {
        let root = CancelContext::background();
        let child = root.child();
        child.cancel();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!root.is_cancelled());
    }

    #[test]
    fn test_deadline_takes_minimum_of_parent() {
        let parent = CancelContext::background().with_timeout(Duration::from_millis(20));
        let child = parent.with_timeout(Duration::from_secs(30));
        assert_eq!(child.deadline(), parent.deadline());
        assert!(child.remaining().unwrap() <= Duration::from_millis(20));
    }

    #[test]
    fn test_deadline_channel_wakes_select() {
        let ctx = CancelContext::background().with_timeout(Duration::from_millis(10));
        let deadline = ctx.deadline_channel();
        let mut sel = Select::new();
        sel.recv(&deadline);
        let start = Instant::now();
        sel.ready();
        assert!(start.elapsed() >= Duration::from_millis(5));
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_background_never_expires() {
        let ctx = CancelContext::default();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_cancelled());
    }
}
