//! Single-flight variant generation.
//!
//! Any number of threads may ask for the same variant at once; exactly one of
//! them (the *owner*) runs the producer and every other caller blocks until
//! the owner publishes the outcome. Success and failure are both fanned out:
//! waiters receive a clone of the very same `Result`.
//!
//! ```text
//! caller ──lock table──▶ entry for key?
//!                         ├─ yes: unlock, wait on entry ─────────────▶ outcome
//!                         └─ no:  insert entry, unlock, run producer
//!                                  └─ remove entry, publish outcome ─▶ outcome
//! ```
//!
//! ## Locking
//!
//! The table lock only guards insert/remove of entries and is never held
//! while a producer runs, so generating one key never blocks another. Each
//! entry has its own mutex + condvar. An entry leaves the table before its
//! outcome is published, so once any caller holds an outcome the key is no
//! longer in flight. A caller that arrives later starts a fresh generation,
//! so callers should consult the durable store first (the engine does, and
//! its producer re-checks it).
//!
//! ## Failure containment
//!
//! - A producer panic is caught and published as
//!   [`EngineError::ProducerAborted`].
//! - With a timeout configured, the producer runs on its own thread; on
//!   expiry the owner publishes [`EngineError::Timeout`] and trips the
//!   producer's [`CancelToken`]. The producer thread is detached and its
//!   eventual result is discarded.
//! - If the owner unwinds for any other reason, a drop guard publishes an
//!   abort so waiters never hang.

use crate::error::{EngineError, panic_message};
use crate::transform::ImageBytes;
use crate::variant::VariantKey;
use crossbeam::channel::{RecvTimeoutError, bounded};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

pub type Outcome = Result<ImageBytes, EngineError>;

/// Best-effort cancellation flag shared with a running producer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Flight {
    outcome: Mutex<Option<Outcome>>,
    ready: Condvar,
}

impl Flight {
    /// First publish wins.
    fn publish(&self, outcome: Outcome) {
        let mut slot = self.outcome.lock();
        if slot.is_none() {
            *slot = Some(outcome);
        }
        self.ready.notify_all();
    }

    fn wait(&self) -> Outcome {
        let mut slot = self.outcome.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            self.ready.wait(&mut slot);
        }
    }
}

/// Generation counters, for logs and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub generated: u64,
    pub joined: u64,
    pub failed: u64,
}

impl fmt::Display for CoordinatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} generated, {} joined, {} failed",
            self.generated, self.joined, self.failed
        )
    }
}

pub struct VariantCoordinator<K = VariantKey> {
    flights: Mutex<HashMap<K, Arc<Flight>>>,
    timeout: Option<Duration>,
    generated: AtomicU64,
    joined: AtomicU64,
    failed: AtomicU64,
}

impl<K> VariantCoordinator<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// `timeout` bounds each producer run; `None` runs it inline on the
    /// owner's thread.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
            timeout,
            generated: AtomicU64::new(0),
            joined: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Number of keys currently being generated.
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            generated: self.generated.load(Ordering::Relaxed),
            joined: self.joined.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Return the bytes for `key`, running `producer` only if no other caller
    /// is already generating it.
    pub fn get_or_generate<F>(&self, key: &K, producer: F) -> Outcome
    where
        F: FnOnce(&CancelToken) -> Outcome + Send + 'static,
    {
        let (flight, owner) = self.join(key);
        if !owner {
            self.joined.fetch_add(1, Ordering::Relaxed);
            debug!(?key, "joining in-flight generation");
            return flight.wait();
        }

        let guard = OwnerGuard {
            coordinator: self,
            key,
            flight: &flight,
        };
        let outcome = self.run(producer);
        self.generated.fetch_add(1, Ordering::Relaxed);
        if outcome.is_err() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.retire(key, &flight);
        flight.publish(outcome.clone());
        drop(guard);
        outcome
    }

    fn join(&self, key: &K) -> (Arc<Flight>, bool) {
        let mut flights = self.flights.lock();
        if let Some(flight) = flights.get(key) {
            return (Arc::clone(flight), false);
        }
        let flight = Arc::new(Flight::default());
        flights.insert(key.clone(), Arc::clone(&flight));
        (flight, true)
    }

    fn retire(&self, key: &K, flight: &Arc<Flight>) {
        let mut flights = self.flights.lock();
        if flights.get(key).is_some_and(|f| Arc::ptr_eq(f, flight)) {
            flights.remove(key);
        }
    }

    fn run<F>(&self, producer: F) -> Outcome
    where
        F: FnOnce(&CancelToken) -> Outcome + Send + 'static,
    {
        let cancel = CancelToken::new();
        let Some(timeout) = self.timeout else {
            return contain(|| producer(&cancel));
        };

        let (tx, rx) = bounded(1);
        let token = cancel.clone();
        let spawned = thread::Builder::new()
            .name("variant-producer".into())
            .spawn(move || {
                let _ = tx.send(contain(|| producer(&token)));
            });
        if let Err(err) = spawned {
            return Err(EngineError::ProducerAborted(format!(
                "could not start producer thread: {err}"
            )));
        }

        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                warn!(timeout_ms = timeout.as_millis() as u64, "variant generation timed out");
                Err(EngineError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::ProducerAborted(
                "producer exited without a result".into(),
            )),
        }
    }
}

impl<K> Default for VariantCoordinator<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new(None)
    }
}

fn contain<F: FnOnce() -> Outcome>(producer: F) -> Outcome {
    panic::catch_unwind(AssertUnwindSafe(producer)).unwrap_or_else(|payload| {
        let message = panic_message(&*payload);
        warn!(panic = %message, "variant producer panicked");
        Err(EngineError::ProducerAborted(message))
    })
}

/// Removes the entry, then publishes an abort in case the owner left without
/// publishing. Both are no-ops after a normal finish.
struct OwnerGuard<'a, K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    coordinator: &'a VariantCoordinator<K>,
    key: &'a K,
    flight: &'a Arc<Flight>,
}

impl<K> Drop for OwnerGuard<'_, K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn drop(&mut self) {
        self.coordinator.retire(self.key, self.flight);
        self.flight.publish(Err(EngineError::ProducerAborted(
            "generation abandoned by its owner".into(),
        )));
    }
}
