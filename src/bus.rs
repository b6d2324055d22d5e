//! Change notification for interceptor definitions and hit histories
//!
//! A multicast, replay-free topic. Publishing never waits on subscribers: a
//! subscriber that falls more than the channel capacity behind skips the
//! oldest notifications instead of stalling the publisher.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

/// Default number of undelivered notifications kept per subscriber
pub const DEFAULT_CHANGE_BUS_CAPACITY: usize = 1024;

/// What changed about an interceptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Definition created
    Created,
    /// Definition saved, renamed, enabled or disabled
    Updated,
    /// Definition removed (hit history dropped with it)
    Removed,
    /// A hit was recorded
    HitRecorded,
    /// Hit history cleared
    HitsCleared,
}

/// "Interceptor X changed" signal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterceptorChange {
    /// Owning server id
    pub server_id: String,
    /// Interceptor id
    pub interceptor_id: String,
    /// Kind of change
    pub kind: ChangeKind,
}

impl InterceptorChange {
    /// Create a new change signal
    pub fn new(
        server_id: impl Into<String>,
        interceptor_id: impl Into<String>,
        kind: ChangeKind,
    ) -> Self {
        Self {
            server_id: server_id.into(),
            interceptor_id: interceptor_id.into(),
            kind,
        }
    }
}

/// Publish/subscribe hub for [`InterceptorChange`] signals
#[derive(Debug)]
pub struct ChangeBus {
    sender: broadcast::Sender<InterceptorChange>,
    published: AtomicU64,
}

impl ChangeBus {
    /// Create a bus buffering up to `capacity` signals per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// Publish a change; returns how many subscribers were attached
    pub fn publish(&self, change: InterceptorChange) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(change) {
            Ok(receivers) => receivers,
            // No subscribers attached; nothing to deliver
            Err(_) => 0,
        }
    }

    /// Attach a new subscriber; it sees only changes published after this call
    pub fn subscribe(&self) -> ChangeSubscription {
        debug!(subscribers = self.sender.receiver_count() + 1, "Change subscriber attached");
        ChangeSubscription {
            receiver: self.sender.subscribe(),
            skipped: 0,
        }
    }

    /// Currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total signals published since creation
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_BUS_CAPACITY)
    }
}

/// Subscription handle; dropping it detaches the subscriber
#[derive(Debug)]
pub struct ChangeSubscription {
    receiver: broadcast::Receiver<InterceptorChange>,
    skipped: u64,
}

impl ChangeSubscription {
    /// Wait for the next change; `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<InterceptorChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(n)) => self.note_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Blocking variant of [`recv`](Self::recv) for non-async callers
    ///
    /// Must not be called from inside an async runtime.
    pub fn blocking_recv(&mut self) -> Option<InterceptorChange> {
        loop {
            match self.receiver.blocking_recv() {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(n)) => self.note_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-published change, if any
    pub fn try_recv(&mut self) -> Option<InterceptorChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) => return Some(change),
                Err(TryRecvError::Lagged(n)) => self.note_lag(n),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain everything currently pending
    pub fn drain(&mut self) -> Vec<InterceptorChange> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Signals this subscriber missed because it fell behind
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn note_lag(&mut self, n: u64) {
        self.skipped += n;
        warn!(skipped = n, "Change subscriber lagged; oldest notifications dropped");
    }
}
