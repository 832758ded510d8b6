//! Bounded in-memory [`LogSink`] with FIFO eviction.
//!
//! Keeps the most recent failures a dispatcher logged, for tests and for
//! diagnostics endpoints that show recent server-side failures without a
//! log pipeline. Memory is fixed at construction:
//!
//! - **Bounded entries**: oldest record evicted first once full
//! - **Per-entry size caps**: no single failure can dominate the buffer
//! - **RwLock-based**: concurrent readers, exclusive writers
//!
//! Entries hold `Arc<str>` so reading them back only bumps refcounts.
//!
//! # Example
//!
//! ```rust
//! use envelope_errors::{Dispatcher, Failure, MemorySink};
//!
//! let sink = MemorySink::new(100, 2048);
//! let dispatcher = Dispatcher::with_sink(sink.clone());
//!
//! let failure = Failure::unclassified("pool exhausted").with_operation("register");
//! let response = dispatcher.dispatch(&failure);
//! assert_eq!(response.status().as_u16(), 500);
//!
//! let recent = sink.get_recent(1);
//! assert_eq!(recent[0].code.as_ref(), "SERVER.GENERIC_ERROR");
//! assert_eq!(recent[0].operation.as_deref(), Some("register"));
//! ```

use crate::logging::{FailureLog, LogReason, LogSink};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// One captured failure, size-bounded.
#[derive(Clone, Debug)]
pub struct LoggedFailure {
    /// Unix timestamp (seconds) when the record was captured.
    pub timestamp: u64,
    /// Why the dispatcher logged it.
    pub reason: LogReason,
    /// Category label, e.g. `"unclassified"`.
    pub category: &'static str,
    /// HTTP status that was sent.
    pub status: u16,
    /// Top-level code that was sent.
    pub code: Arc<str>,
    /// Operation name, if the failure carried one.
    pub operation: Option<Arc<str>>,
    /// Internal diagnostic text, if any.
    pub message: Option<Arc<str>>,
    /// Display text of the wrapped source error, if any.
    pub source: Option<Arc<str>>,
    /// Metadata pairs in insertion order.
    pub metadata: Arc<[(Arc<str>, Arc<str>)]>,
    /// Approximate payload size in bytes.
    pub size_bytes: usize,
}

/// Thread-safe bounded sink, oldest entry at the front.
///
/// Clones share the same queue, so a test can hand one clone to the
/// dispatcher and inspect the other.
#[derive(Clone)]
pub struct MemorySink {
    entries: Arc<RwLock<VecDeque<LoggedFailure>>>,
    max_entries: usize,
    max_entry_bytes: usize,
    eviction_count: Arc<AtomicU64>,
}

impl MemorySink {
    /// Create a sink holding at most `max_entries` records of roughly
    /// `max_entry_bytes` each. A zero capacity is raised to one.
    pub fn new(max_entries: usize, max_entry_bytes: usize) -> Self {
        let bounded_entries = max_entries.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(bounded_entries))),
            max_entries: bounded_entries,
            max_entry_bytes,
            eviction_count: Arc::new(AtomicU64::new(0)),
        }
    }

    // Entries are built before the lock is taken, so a poisoned queue is
    // still a valid queue.
    fn entries(&self) -> RwLockReadGuard<'_, VecDeque<LoggedFailure>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, VecDeque<LoggedFailure>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append at the back, returning the front entry if the queue was full.
    fn record(&self, entry: LoggedFailure) -> Option<LoggedFailure> {
        let mut entries = self.entries_mut();
        let evicted = if entries.len() >= self.max_entries {
            entries.pop_front()
        } else {
            None
        };
        entries.push_back(entry);
        evicted
    }

    /// Build a bounded entry from a borrowed record.
    ///
    /// Budget order: operation (256), message (512), source (256), then
    /// metadata values (128 each) until the entry cap is reached.
    fn create_entry(&self, log: &FailureLog<'_>) -> LoggedFailure {
        let mut size = 0usize;
        let mut remaining = self.max_entry_bytes;

        let mut take = |value: Option<&str>, cap: usize| -> Option<Arc<str>> {
            let value = value?;
            let bounded = truncate_to_bytes(value, remaining.min(cap));
            size += bounded.len();
            remaining = remaining.saturating_sub(bounded.len());
            Some(Arc::from(bounded.as_ref()))
        };

        let operation = take(log.operation(), 256);
        let message = take(log.message(), 512);
        let source_text = log.source().map(|s| s.to_string());
        let source = take(source_text.as_deref(), 256);

        let mut metadata: SmallVec<[(Arc<str>, Arc<str>); 8]> = SmallVec::new();
        for (key, value) in log.metadata() {
            let key_len = key.len();
            if key_len >= remaining {
                break;
            }
            let value = truncate_to_bytes(value.as_str(), (remaining - key_len).min(128));
            let used = key_len + value.len();
            size += used;
            remaining = remaining.saturating_sub(used);
            metadata.push((Arc::from(*key), Arc::from(value.as_ref())));
        }

        LoggedFailure {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            reason: log.reason(),
            category: log.category().label(),
            status: log.status().as_u16(),
            code: Arc::from(log.code().as_str()),
            operation,
            message,
            source,
            metadata: metadata.into_vec().into_boxed_slice().into(),
            size_bytes: size,
        }
    }

    /// The `count` most recent entries, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<LoggedFailure> {
        self.entries().iter().rev().take(count).cloned().collect()
    }

    /// All entries, newest first.
    pub fn get_all(&self) -> Vec<LoggedFailure> {
        self.entries().iter().rev().cloned().collect()
    }

    /// Entries matching `predicate`, oldest first.
    pub fn get_filtered<F>(&self, predicate: F) -> Vec<LoggedFailure>
    where
        F: Fn(&LoggedFailure) -> bool,
    {
        self.entries()
            .iter()
            .filter(|entry| predicate(entry))
            .cloned()
            .collect()
    }

    /// Number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether nothing is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evictions since creation.
    #[inline]
    pub fn eviction_count(&self) -> u64 {
        self.eviction_count.load(Ordering::Relaxed)
    }

    /// Drop every entry. The eviction counter is kept.
    pub fn clear(&self) {
        self.entries_mut().clear();
    }

    /// Maximum number of entries kept.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}

impl LogSink for MemorySink {
    fn log_failure(&self, log: &FailureLog<'_>) {
        let entry = self.create_entry(log);
        if self.record(entry).is_some() {
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySink")
            .field("len", &self.len())
            .field("capacity", &self.max_entries)
            .field("max_entry_bytes", &self.max_entry_bytes)
            .field("evictions", &self.eviction_count())
            .finish()
    }
}

const TRUNC_MARK: &str = "...[TRUNC]";

/// Truncate to at most `max_bytes`, cutting on a char boundary and ending
/// with a marker.
fn truncate_to_bytes(s: &str, max_bytes: usize) -> Cow<'_, str> {
    if s.len() <= max_bytes {
        return Cow::Borrowed(s);
    }
    if max_bytes <= TRUNC_MARK.len() {
        return Cow::Borrowed(&TRUNC_MARK[..max_bytes]);
    }

    let budget = max_bytes - TRUNC_MARK.len();
    let cut = s
        .char_indices()
        .map(|(start, c)| start + c.len_utf8())
        .take_while(|&end| end <= budget)
        .last()
        .unwrap_or(0);
    Cow::Owned(format!("{}{}", &s[..cut], TRUNC_MARK))
}
