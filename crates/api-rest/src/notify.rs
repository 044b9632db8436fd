//! Quote-ready push hub.
//!
//! Replaces the legacy fixed-interval client poll with server push while
//! preserving the client-visible contract: a boolean "quote ready" signal
//! plus a full request snapshot (see the watch handler in `lib.rs`).
//!
//! One `tokio::sync::watch` channel per watched request. Quote submission
//! bumps the channel's counter; watchers wake, reload the snapshot, and
//! decide whether the request has reached `quoted`. Channels whose last
//! watcher has disconnected are pruned on the next touch, so the hub's
//! size tracks the number of requests actually being watched.

use std::collections::HashMap;
use std::sync::Mutex;

use psx_uuid::RecordUuid;
use tokio::sync::watch;

/// Per-request notification channels.
#[derive(Debug, Default)]
pub struct QuoteReadyHub {
    channels: Mutex<HashMap<RecordUuid, watch::Sender<u64>>>,
}

impl QuoteReadyHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to bump notifications for one request, creating the
    /// channel on first use.
    pub fn subscribe(&self, request_id: &RecordUuid) -> watch::Receiver<u64> {
        let mut channels = self.lock();
        channels
            .entry(request_id.clone())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }

    /// Signals that something changed on a request (a quote arrived).
    ///
    /// A channel with no remaining watchers is pruned instead of bumped.
    pub fn notify(&self, request_id: &RecordUuid) {
        let mut channels = self.lock();
        if let Some(sender) = channels.get(request_id) {
            if sender.receiver_count() == 0 {
                channels.remove(request_id);
            } else {
                sender.send_modify(|v| *v += 1);
            }
        }
    }

    /// Number of live channels; used by tests and diagnostics.
    pub fn watched_requests(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RecordUuid, watch::Sender<u64>>> {
        // A poisoned lock only means a panicking watcher; the map itself
        // stays usable.
        match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
