//! Single-flight memoization map.
//!
//! [`MemoMap::get_or_set`] returns the stored value for a key, or runs the
//! supplied factory exactly once and shares its outcome with every caller
//! that asked for the same key while it was running.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{FutureExt, Shared};
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::observability::metrics;

// Errors are wrapped in `Arc` so the outcome can be cloned out of `Shared`.
type ComputationResult<V, E> = Result<V, Arc<E>>;
type Computation<V, E> = Shared<oneshot::Receiver<ComputationResult<V, E>>>;

enum Slot<V, E> {
    Ready(V),
    Pending(Computation<V, E>),
}

/// Error returned by [`MemoMap::get_or_set`].
#[derive(Debug, thiserror::Error)]
pub enum MemoError<E> {
    /// The factory ran and failed. Nothing was stored.
    #[error("{0}")]
    Failed(Arc<E>),

    /// The computation task went away without producing a result (it panicked
    /// or the runtime shut down).
    #[error("computation for `{0}` ended without a result")]
    Abandoned(String),
}

impl<E> MemoError<E> {
    /// The factory error, if the factory actually ran to completion.
    pub fn failure(&self) -> Option<&E> {
        match self {
            MemoError::Failed(err) => Some(err),
            MemoError::Abandoned(_) => None,
        }
    }
}

/// Point-in-time view of the map counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls to `get_or_set`.
    pub lookups: u64,
    /// Factory invocations started.
    pub computations: u64,
    /// Completed entries currently stored.
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Counters {
    lookups: AtomicU64,
    computations: AtomicU64,
}

/// A concurrent key → value map whose values are produced lazily, at most
/// once per key at a time.
///
/// Cloning is cheap and yields a handle to the same map.
pub struct MemoMap<V, E> {
    slots: Arc<DashMap<String, Slot<V, E>>>,
    counters: Arc<Counters>,
}

impl<V, E> Clone for MemoMap<V, E> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<V, E> Default for MemoMap<V, E> {
    fn default() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }
}

impl<V, E> MemoMap<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value for `key`, computing it with `factory` if needed.
    ///
    /// - A stored value is returned without calling `factory`.
    /// - If another caller is already computing `key`, this call waits for
    ///   that computation instead of starting its own.
    /// - Otherwise `factory` is spawned as a task. On success its value is
    ///   stored permanently; on failure nothing is stored and the error is
    ///   handed to every waiter.
    pub async fn get_or_set<F, Fut>(&self, key: &str, factory: F) -> Result<V, MemoError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);

        // Fast path under a shared shard lock.
        if let Some(slot) = self.slots.get(key) {
            if let Slot::Ready(value) = slot.value() {
                metrics::record_cache_lookup("hit");
                return Ok(value.clone());
            }
        }

        let computation = match self.slots.entry(key.to_owned()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(value) => {
                    metrics::record_cache_lookup("hit");
                    return Ok(value.clone());
                }
                Slot::Pending(computation) => {
                    tracing::trace!(key, "joining in-flight computation");
                    metrics::record_cache_lookup("coalesced");
                    computation.clone()
                }
            },
            Entry::Vacant(entry) => {
                metrics::record_cache_lookup("miss");
                let computation = self.spawn_computation(key.to_owned(), factory);
                entry.insert(Slot::Pending(computation.clone()));
                computation
            }
        };

        match computation.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(MemoError::Failed(err)),
            Err(_) => Err(MemoError::Abandoned(key.to_owned())),
        }
    }

    /// Return the stored value for `key` without computing anything.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.slots.get(key)?.value() {
            Slot::Ready(value) => Some(value.clone()),
            Slot::Pending(_) => None,
        }
    }

    /// Whether a completed value is stored for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys tracked, completed or in flight.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self
            .slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Ready(_)))
            .count();

        CacheStats {
            lookups: self.counters.lookups.load(Ordering::Relaxed),
            computations: self.counters.computations.load(Ordering::Relaxed),
            entries,
        }
    }

    /// Spawn `factory` on the runtime and return a clonable handle to its
    /// outcome.
    ///
    /// The task installs the value (or clears the marker) *before* waking the
    /// waiters, so a caller either receives this result or finds the map in
    /// its final state.
    fn spawn_computation<F, Fut>(&self, key: String, factory: F) -> Computation<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        self.counters.computations.fetch_add(1, Ordering::Relaxed);

        let slots = Arc::clone(&self.slots);
        let span = tracing::debug_span!("memo_computation", key = %key);

        tokio::spawn(
            async move {
                let marker = PendingMarker {
                    slots: Arc::clone(&slots),
                    key: key.clone(),
                };

                let result = factory().await.map_err(Arc::new);
                match &result {
                    Ok(value) => {
                        slots.insert(key, Slot::Ready(value.clone()));
                    }
                    Err(_) => tracing::debug!("computation failed, nothing stored"),
                }

                drop(marker);
                sender.send(result).ok();
            }
            .instrument(span),
        );

        receiver.shared()
    }
}

/// Clears a key's in-flight marker when the computation ends, including when
/// it unwinds. A completed value that replaced the marker is left alone.
struct PendingMarker<V, E> {
    slots: Arc<DashMap<String, Slot<V, E>>>,
    key: String,
}

impl<V, E> Drop for PendingMarker<V, E> {
    fn drop(&mut self) {
        self.slots
            .remove_if(&self.key, |_, slot| matches!(slot, Slot::Pending(_)));
    }
}
