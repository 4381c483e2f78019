//! Read-through memoization with single-flight production
//!
//! When many callers miss the same key at once, only the first one (the
//! owner) starts the producer. Every other caller attaches to the pending
//! flight and receives a clone of the same outcome. The producer runs on
//! its own Tokio task, so dropping any caller, owner included, neither
//! cancels the production nor disturbs the remaining waiters.
//!
//! A flight lives from the miss that starts it until its producer settles:
//! on success the value is written to the store with the owner's TTL, on
//! failure nothing is cached and the next miss starts a fresh flight.

use super::{AppCache, Shared};
use crate::error::{CacheError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

/// Settled result of a producer, shared by every caller of a flight
pub(crate) type Outcome<V> = std::result::Result<V, Arc<anyhow::Error>>;

type OutcomeTx<V> = watch::Sender<Option<Outcome<V>>>;
type OutcomeRx<V> = watch::Receiver<Option<Outcome<V>>>;

/// A production in progress for one key
pub(crate) struct Flight<V> {
    outcome: OutcomeRx<V>,

    /// Callers attached so far, owner included
    waiters: usize,
}

impl<V> Flight<V> {
    fn start() -> (Self, OutcomeTx<V>) {
        let (tx, rx) = watch::channel(None);
        let flight = Flight {
            outcome: rx,
            waiters: 1,
        };
        (flight, tx)
    }

    fn join(&mut self) -> OutcomeRx<V> {
        self.waiters += 1;
        self.outcome.clone()
    }

    /// The producer side is gone without the entry being cleaned up
    fn is_abandoned(&self) -> bool {
        self.outcome.has_changed().is_err()
    }
}

/// What a caller does after the lookup
enum Role<V> {
    Owner(OutcomeTx<V>, OutcomeRx<V>),
    Waiter(OutcomeRx<V>),
}

/// Removes the flight entry if the producer task dies before settling
struct FlightGuard<V> {
    shared: Arc<Shared<V>>,
    key: Option<String>,
}

impl<V> FlightGuard<V> {
    fn disarm(mut self) -> String {
        self.key.take().unwrap_or_default()
    }
}

impl<V> Drop for FlightGuard<V> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            warn!("Producer for {} aborted before settling", key);
            self.shared.state.lock().flights.remove(&key);
        }
    }
}

impl<V> Shared<V>
where
    V: Clone,
{
    /// Retire the flight for `key` and cache a successful outcome
    ///
    /// Both happen under the lock, so a caller arriving afterwards either
    /// hits the stored value or starts a new flight.
    fn settle(&self, key: &str, ttl_seconds: i64, outcome: &Outcome<V>) -> usize {
        let mut state = self.state.lock();
        let waiters = state.flights.remove(key).map_or(0, |flight| flight.waiters);

        if let Ok(value) = outcome {
            state.store.set(key, value.clone(), ttl_seconds);
        }
        waiters
    }
}

impl<V> AppCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Return the cached value for `key`, producing it on a miss
    ///
    /// Concurrent misses on the same key share one `producer` invocation;
    /// only the caller that starts the flight has its `producer` and
    /// `ttl_seconds` used. A producer error is returned to every caller of
    /// that flight as [`CacheError::Producer`] and is never cached.
    ///
    /// Each call counts exactly one hit or one miss.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub async fn remember<F, Fut>(
        &self,
        key: impl Into<String>,
        ttl_seconds: i64,
        producer: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let key = key.into();

        let role = {
            let mut state = self.shared.state.lock();

            if let Some(value) = state.store.get(&key) {
                return Ok(value.clone());
            }

            match state.flights.get_mut(&key) {
                Some(flight) if !flight.is_abandoned() => {
                    trace!("Joining flight for {} ({} waiters)", key, flight.waiters + 1);
                    Role::Waiter(flight.join())
                }
                _ => {
                    let (flight, tx) = Flight::start();
                    let rx = flight.outcome.clone();
                    state.flights.insert(key.clone(), flight);
                    debug!("Starting flight for {}", key);
                    Role::Owner(tx, rx)
                }
            }
        };

        let outcome = match role {
            Role::Waiter(rx) => rx,
            Role::Owner(tx, rx) => {
                self.launch(key, ttl_seconds, tx, producer);
                rx
            }
        };

        wait_settled(outcome).await
    }

    /// Number of keys with a production in progress
    pub fn in_flight(&self) -> usize {
        self.shared.state.lock().flights.len()
    }

    fn launch<F, Fut>(&self, key: String, ttl_seconds: i64, tx: OutcomeTx<V>, producer: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        // Created outside the task so an unpolled, dropped task still cleans up
        let guard = FlightGuard {
            shared: Arc::clone(&self.shared),
            key: Some(key),
        };

        tokio::spawn(async move {
            // guard drops before tx, so no waiter can observe a dead flight entry
            let tx = tx;
            let guard = guard;

            let outcome = producer().await.map_err(Arc::new);

            let shared = Arc::clone(&guard.shared);
            let key = guard.disarm();
            let waiters = shared.settle(&key, ttl_seconds, &outcome);

            match &outcome {
                Ok(_) => debug!("Flight for {} settled for {} caller(s)", key, waiters),
                Err(err) => warn!("Producer for {} failed ({} caller(s)): {}", key, waiters, err),
            }

            tx.send_replace(Some(outcome));
        });
    }
}

async fn wait_settled<V: Clone>(mut outcome: OutcomeRx<V>) -> Result<V> {
    let settled = outcome
        .wait_for(Option::is_some)
        .await
        .map_err(|_| CacheError::ProducerAborted)?;

    match &*settled {
        Some(Ok(value)) => Ok(value.clone()),
        Some(Err(err)) => Err(CacheError::Producer(Arc::clone(err))),
        None => Err(CacheError::ProducerAborted),
    }
}
