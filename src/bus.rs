//! In-process broadcast bus for progress events.
//!
//! Many producers (job runners) publish; many consumers (observer
//! connections) subscribe. Built on [`tokio::sync::broadcast`], which gives
//! the required semantics for free: publishing never blocks on a slow or
//! dead observer, each subscriber receives a job's events in publish order,
//! and dropping a receiver removes that observer from the fan-out set — the
//! self-healing membership the gateway relies on when a send fails.
//!
//! There is no replay buffer beyond the channel capacity: an observer that
//! falls behind sees a `Lagged` error and simply misses those snapshots.

use crate::types::ProgressEvent;
use tokio::sync::broadcast;

/// Buffered events per subscriber before a slow observer starts lagging
const CHANNEL_CAPACITY: usize = 1000;

/// Fan-out bus carrying [`ProgressEvent`]s from job runners to observers.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Clone)]
pub struct ProgressBus {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressBus {
    /// Create a new bus with the default capacity.
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Deliver an event to every currently-registered observer.
    ///
    /// Delivery to one observer cannot block or fail delivery to others.
    /// With no observers connected the event is silently dropped, so jobs
    /// keep running whether or not anyone is watching.
    pub fn publish(&self, event: ProgressEvent) {
        // send() errs only when there are no receivers - drop the event
        if self.tx.send(event).is_err() {
            tracing::trace!("progress event dropped: no observers connected");
        }
    }

    /// Register a new observer and return its receiving handle.
    ///
    /// Observers unsubscribe by dropping the receiver; there is no explicit
    /// removal call.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Number of currently-registered observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}
