//! Click recorder
//!
//! Keeps the redirect path off the durability path: `record` is a plain
//! in-memory push, and a background task drains the buffer into a
//! [`ClickSink`] on an interval or when the buffer grows past a threshold.
//! A failed flush restores the drained events, so nothing is lost short of
//! a process crash (at-least-once).

use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::analytics::{ClickContext, ClickEvent, ClickSink};

/// Buffer of not-yet-durable click events.
struct EventBuffer {
    /// Events keyed by a process-local sequence number
    data: DashMap<u64, ClickEvent>,
    next_seq: AtomicU64,
    /// Buffered event count (threshold checks without iterating the map)
    pending: AtomicUsize,
    /// Serializes flushes
    flush_lock: Mutex<()>,
    /// A threshold-triggered flush task has been spawned and not finished
    flush_pending: AtomicBool,
}

impl EventBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            next_seq: AtomicU64::new(0),
            pending: AtomicUsize::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    fn push(&self, event: ClickEvent) -> usize {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.data.insert(seq, event);
        self.pending.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Drain a snapshot of the buffer. Events pushed while draining stay
    /// behind for the next round.
    fn drain(&self) -> Vec<ClickEvent> {
        let keys: Vec<u64> = self.data.iter().map(|r| *r.key()).collect();

        let mut events = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some((_, event)) = self.data.remove(&key) {
                events.push(event);
            }
        }

        if !events.is_empty() {
            self.pending
                .fetch_update(Ordering::Release, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(events.len()))
                })
                .ok();
        }

        events
    }

    /// Put drained events back after a failed flush.
    fn restore(&self, events: Vec<ClickEvent>) {
        let count = events.len();
        for event in events {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            self.data.insert(seq, event);
        }
        self.pending.fetch_add(count, Ordering::Relaxed);
    }

    fn len(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }
}

/// Buffered, write-behind click recording.
///
/// State is fully encapsulated; clones share the same buffer and sink, so
/// one recorder can serve concurrent callers and a background flush loop.
#[derive(Clone)]
pub struct ClickRecorder {
    buffer: Arc<EventBuffer>,
    sink: Arc<dyn ClickSink>,
    flush_interval: Duration,
    max_events_before_flush: usize,
}

impl ClickRecorder {
    pub fn new(
        sink: Arc<dyn ClickSink>,
        flush_interval: Duration,
        max_events_before_flush: usize,
    ) -> Self {
        Self {
            buffer: Arc::new(EventBuffer::new()),
            sink,
            flush_interval,
            max_events_before_flush,
        }
    }

    /// Build a recorder from the loaded configuration.
    pub fn from_config(sink: Arc<dyn ClickSink>) -> Self {
        let config = crate::config::get_config();
        Self::new(
            sink,
            Duration::from_secs(config.clicks.flush_interval_secs),
            config.clicks.max_buffer_before_flush,
        )
    }

    /// Record one click. Never awaits storage; the caller's redirect
    /// response is already on its way.
    pub fn record(&self, link_id: &str, context: ClickContext) {
        let current_size = self.buffer.push(ClickEvent::new(link_id, context));
        trace!("ClickRecorder: buffer size {}", current_size);

        if current_size >= self.max_events_before_flush {
            // compare_exchange gates the spawn so a burst of records past
            // the threshold produces one flush task, not a storm
            if self
                .buffer
                .flush_pending
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                let buffer = Arc::clone(&self.buffer);
                let sink = Arc::clone(&self.sink);
                tokio::spawn(async move {
                    if let Ok(_guard) = buffer.flush_lock.try_lock() {
                        Self::flush_buffer(&buffer, &sink).await;
                    } else {
                        trace!("ClickRecorder: flush already in progress, skipping");
                    }
                    buffer.flush_pending.store(false, Ordering::Release);
                });
            }
        }
    }

    /// Interval-driven flush loop; run as a background task.
    pub async fn run_flush_loop(&self) {
        loop {
            sleep(self.flush_interval).await;

            debug!("ClickRecorder: scheduled flush");
            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                Self::flush_buffer(&self.buffer, &self.sink).await;
            } else {
                trace!("ClickRecorder: flush already in progress, skipping scheduled flush");
            }
        }
    }

    /// Flush now and wait for the sink (shutdown path, tests).
    pub async fn flush(&self) {
        debug!("ClickRecorder: manual flush");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink).await;
    }

    async fn flush_buffer(buffer: &EventBuffer, sink: &Arc<dyn ClickSink>) {
        let events = buffer.drain();

        if events.is_empty() {
            trace!("ClickRecorder: nothing to flush");
            return;
        }

        let count = events.len();
        match sink.flush_events(events.clone()).await {
            Ok(_) => {
                debug!("ClickRecorder: flushed {} events", count);
            }
            Err(e) => {
                buffer.restore(events);
                warn!(
                    "ClickRecorder: flush_events failed: {}, {} events restored to buffer",
                    e, count
                );
            }
        }
    }

    /// Number of buffered events awaiting durability.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
