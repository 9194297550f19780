// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Keyed async query cache with staleness, retries and polling.
//!
//! Each [`QueryKey`] owns one entry. Reading a missing or stale entry starts a
//! fetch on its own task; concurrent readers share that fetch instead of
//! starting another. A failure settles the entry just like a value does: it is
//! not fetched again until `stale_time` has passed since the failure, unless a
//! poll, [`QueryCache::refetch`] or [`QueryCache::invalidate`] forces it. Every fetch carries a ticket, and its result is only
//! written back if the ticket still matches the entry's in-flight fetch, so a
//! forced refetch always wins over the fetch it superseded.
//!
//! Values stay visible while a refetch is running (stale-while-revalidate),
//! and a failed refetch keeps the last good value next to the error.
//!
//! All methods that may start a fetch spawn onto the current Tokio runtime and
//! must be called from within one.
//!
//! # Example
//!
//! ```rust
//! use walletscope::{QueryCache, QueryKey, QueryOptions};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), walletscope::AppError> {
//! let cache: QueryCache<u64> = QueryCache::new();
//! let options = QueryOptions::default().with_stale_time(Duration::from_secs(30));
//!
//! let value = cache
//!     .fetch(&QueryKey::new("answer"), || async { Ok(42) }, &options)
//!     .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

mod types;

pub use types::{QueryKey, QueryOptions, QueryState, QueryStatus};

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, Instrument};

use crate::errors::{self, AppError};
use crate::spans;

type Producer<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, AppError>> + Send + Sync>;

/// A fetch shared by every caller waiting on the same key.
pub type QueryFuture<V> = Shared<BoxFuture<'static, Result<V, AppError>>>;

struct InFlight<V> {
    ticket: u64,
    future: QueryFuture<V>,
}

struct CacheEntry<V> {
    value: Option<V>,
    fetched_at: Option<Instant>,
    error: Option<AppError>,
    failed_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<InFlight<V>>,
    producer: Option<Producer<V>>,
    options: QueryOptions,
    subscribers: usize,
    last_active: Instant,
    notify: watch::Sender<QueryState<V>>,
}

impl<V: Clone> CacheEntry<V> {
    fn new(options: QueryOptions, now: Instant) -> Self {
        let (notify, _) = watch::channel(QueryState::idle());
        Self {
            value: None,
            fetched_at: None,
            error: None,
            failed_at: None,
            invalidated: false,
            in_flight: None,
            producer: None,
            options,
            subscribers: 0,
            last_active: now,
            notify,
        }
    }

    fn within_stale_time(&self, at: Option<Instant>, now: Instant) -> bool {
        !self.invalidated && at.is_some_and(|at| now.duration_since(at) < self.options.stale_time)
    }

    /// The value may be served without fetching.
    fn is_fresh(&self, now: Instant) -> bool {
        self.value.is_some() && self.within_stale_time(self.fetched_at, now)
    }

    /// The last fetch, successful or not, settled less than `stale_time` ago.
    fn is_settled(&self, now: Instant) -> bool {
        self.within_stale_time(self.fetched_at.max(self.failed_at), now)
    }

    fn needs_fetch(&self, now: Instant) -> bool {
        self.in_flight.is_none() && !self.is_settled(now)
    }

    fn snapshot(&self, now: Instant) -> QueryState<V> {
        let status = if self.in_flight.is_some() {
            QueryStatus::Fetching
        } else if self.error.is_some() {
            QueryStatus::Failed
        } else if self.value.is_none() {
            QueryStatus::Idle
        } else if self.is_fresh(now) {
            QueryStatus::Fresh
        } else {
            QueryStatus::Stale
        };

        QueryState {
            value: self.value.clone(),
            error: self.error.clone(),
            status,
            is_fetching: self.in_flight.is_some(),
            updated_at: self.fetched_at,
        }
    }

    fn is_collectable(&self, now: Instant) -> bool {
        self.subscribers == 0
            && self.in_flight.is_none()
            && now.duration_since(self.last_active) >= self.options.gc_time
    }

    fn publish(&self, now: Instant) {
        self.notify.send_replace(self.snapshot(now));
    }
}

struct CacheState<V> {
    entries: HashMap<QueryKey, CacheEntry<V>>,
    next_ticket: u64,
}

struct CacheInner<V> {
    state: Mutex<CacheState<V>>,
}

impl<V> CacheInner<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a fetch for `key`, superseding any fetch already in flight.
    ///
    /// Must be called with the state lock held; the spawned task only takes
    /// the lock after it has been released.
    fn start_fetch(
        self: &Arc<Self>,
        state: &mut CacheState<V>,
        key: &QueryKey,
        now: Instant,
    ) -> Option<QueryFuture<V>> {
        let ticket = state.next_ticket;
        let entry = state.entries.get_mut(key)?;
        let producer = entry.producer.clone()?;
        state.next_ticket += 1;

        let retry = entry.options.retry.clone();
        let label = key.to_string();
        let span = spans::query_fetch(&label, ticket);
        let weak = Arc::downgrade(self);
        let task_key = key.clone();

        if let Some(previous) = &entry.in_flight {
            debug!(key = %key, superseded = previous.ticket, ticket, "Superseding in-flight fetch");
        }

        let handle = tokio::spawn(
            async move {
                let attempt = retry.retry(&label, || producer());
                let result = AssertUnwindSafe(attempt)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err(AppError::unknown("Query producer panicked")));

                if let Some(inner) = weak.upgrade() {
                    inner.complete(&task_key, ticket, &result);
                }
                result
            }
            .instrument(span),
        );

        let future = async move {
            handle.await.unwrap_or_else(|e| {
                Err(AppError::unknown(format!("Query task failed: {e}")))
            })
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight {
            ticket,
            future: future.clone(),
        });
        entry.publish(now);

        Some(future)
    }

    /// Write a finished fetch back, unless it was superseded or evicted.
    fn complete(&self, key: &QueryKey, ticket: u64, result: &Result<V, AppError>) {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            debug!(key = %key, ticket, "Discarding result for evicted query");
            return;
        };

        if entry.in_flight.as_ref().map(|f| f.ticket) != Some(ticket) {
            debug!(key = %key, ticket, "Discarding superseded fetch result");
            return;
        }

        let now = Instant::now();
        entry.in_flight = None;
        entry.last_active = now;
        entry.invalidated = false;
        match result {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.fetched_at = Some(now);
                entry.error = None;
                entry.failed_at = None;
                trace!(key = %key, ticket, "Query fetched");
            }
            Err(error) => {
                errors::report(error, &key.to_string());
                entry.error = Some(error.clone());
                entry.failed_at = Some(now);
            }
        }
        entry.publish(now);
    }

    /// Register `producer` and `options` for `key`, creating the entry if needed.
    fn touch<'a>(
        state: &'a mut CacheState<V>,
        key: &QueryKey,
        producer: Producer<V>,
        options: &QueryOptions,
        now: Instant,
    ) -> &'a mut CacheEntry<V> {
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(options.clone(), now));
        entry.producer = Some(producer);
        entry.options = options.clone();
        entry.last_active = now;
        entry
    }

    /// One polling tick: refetch unless a fetch is already running.
    fn poll(self: &Arc<Self>, key: &QueryKey) {
        let mut state = self.lock();
        let now = Instant::now();
        let idle = state
            .entries
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_none());
        if idle {
            trace!(key = %key, "Polling refetch");
            self.start_fetch(&mut state, key, now);
        }
    }

    fn unsubscribe(&self, key: &QueryKey) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.last_active = Instant::now();
        }
    }
}

/// Generic keyed async cache.
///
/// Cloning is cheap; clones share entries.
pub struct QueryCache<V> {
    inner: Arc<CacheInner<V>>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState {
                    entries: HashMap::new(),
                    next_ticket: 0,
                }),
            }),
        }
    }
}

impl<V> std::fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache").finish_non_exhaustive()
    }
}

fn into_producer<V, F, Fut>(producer: F) -> Producer<V>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, AppError>> + Send + 'static,
{
    Arc::new(move || producer().boxed())
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of `key`, starting a background fetch if the entry is missing
    /// or stale and nothing is in flight.
    ///
    /// A failed entry counts as stale once `stale_time` has passed since the
    /// failure.
    pub fn get<F, Fut>(&self, key: &QueryKey, producer: F, options: &QueryOptions) -> QueryState<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, AppError>> + Send + 'static,
    {
        let mut state = self.inner.lock();
        let now = Instant::now();
        let entry = CacheInner::<V>::touch(&mut state, key, into_producer(producer), options, now);

        if entry.needs_fetch(now) {
            self.inner.start_fetch(&mut state, key, now);
        }

        state
            .entries
            .get(key)
            .map(|entry| entry.snapshot(now))
            .unwrap_or_default()
    }

    /// Resolve `key`: the fresh value if there is one, otherwise the result of
    /// the in-flight fetch, otherwise the error of a failure that settled
    /// within `stale_time`, otherwise the result of a new fetch.
    pub async fn fetch<F, Fut>(
        &self,
        key: &QueryKey,
        producer: F,
        options: &QueryOptions,
    ) -> Result<V, AppError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, AppError>> + Send + 'static,
    {
        let pending = {
            let mut state = self.inner.lock();
            let now = Instant::now();
            let entry = CacheInner::<V>::touch(&mut state, key, into_producer(producer), options, now);

            if entry.is_fresh(now) {
                if let Some(value) = &entry.value {
                    trace!(key = %key, "Serving fresh value");
                    return Ok(value.clone());
                }
            }

            if let Some(in_flight) = &entry.in_flight {
                Some(in_flight.future.clone())
            } else if let Some(error) = entry.error.clone().filter(|_| entry.is_settled(now)) {
                trace!(key = %key, "Serving recent failure");
                return Err(error);
            } else {
                self.inner.start_fetch(&mut state, key, now)
            }
        };

        match pending {
            Some(future) => future.await,
            None => Err(AppError::unknown(format!("Query {key} has no producer"))),
        }
    }

    /// Force a fetch of `key`, superseding any fetch in flight.
    ///
    /// The fetch runs whether or not the returned future is awaited.
    pub fn refetch<F, Fut>(
        &self,
        key: &QueryKey,
        producer: F,
        options: &QueryOptions,
    ) -> QueryFuture<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, AppError>> + Send + 'static,
    {
        let mut state = self.inner.lock();
        let now = Instant::now();
        let producer = into_producer(producer);
        CacheInner::<V>::touch(&mut state, key, Arc::clone(&producer), options, now);

        match self.inner.start_fetch(&mut state, key, now) {
            Some(future) => future,
            // Unreachable: touch always leaves an entry with a producer
            None => async move { producer().await }.boxed().shared(),
        }
    }

    /// Observe `key`: an initial [`get`](Self::get), change notifications, and
    /// polling every `refetch_interval` for as long as the subscription lives.
    pub fn subscribe<F, Fut>(
        &self,
        key: &QueryKey,
        producer: F,
        options: &QueryOptions,
    ) -> QuerySubscription<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, AppError>> + Send + 'static,
    {
        let receiver = {
            let mut state = self.inner.lock();
            let now = Instant::now();
            let entry = CacheInner::<V>::touch(&mut state, key, into_producer(producer), options, now);
            entry.subscribers += 1;
            let receiver = entry.notify.subscribe();

            if entry.needs_fetch(now) {
                self.inner.start_fetch(&mut state, key, now);
            } else {
                entry.publish(now);
            }
            receiver
        };

        let poller = options
            .refetch_interval
            .filter(|interval| !interval.is_zero())
            .map(|interval| spawn_poller(Arc::downgrade(&self.inner), key.clone(), interval));

        QuerySubscription {
            key: key.clone(),
            cache: Arc::clone(&self.inner),
            receiver,
            poller,
        }
    }

    /// Snapshot of `key` without starting a fetch.
    pub fn peek(&self, key: &QueryKey) -> Option<QueryState<V>> {
        let state = self.inner.lock();
        let now = Instant::now();
        state.entries.get(key).map(|entry| entry.snapshot(now))
    }

    /// Mark `key` stale. Observed entries refetch immediately.
    ///
    /// Returns whether the key was cached.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut state = self.inner.lock();
        let now = Instant::now();
        let Some(entry) = state.entries.get_mut(key) else {
            return false;
        };

        entry.invalidated = true;
        let refetch = entry.subscribers > 0 && entry.in_flight.is_none();
        entry.publish(now);

        if refetch {
            self.inner.start_fetch(&mut state, key, now);
        }
        true
    }

    /// Evict every entry that has no subscriber, no fetch in flight, and has
    /// been idle for at least its `gc_time`.
    ///
    /// Returns the number of evicted entries.
    pub fn collect_garbage(&self) -> usize {
        let mut state = self.inner.lock();
        let now = Instant::now();
        let before = state.entries.len();
        state.entries.retain(|key, entry| {
            let collect = entry.is_collectable(now);
            if collect {
                debug!(key = %key, "Evicting idle query");
            }
            !collect
        });
        before - state.entries.len()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn spawn_poller<V>(cache: Weak<CacheInner<V>>, key: QueryKey, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let span = spans::query_poll(&key.to_string(), interval.as_millis() as u64);
    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = cache.upgrade() else {
                    break;
                };
                inner.poll(&key);
            }
        }
        .instrument(span),
    )
}

/// A live view of one query.
///
/// Dropping the subscription stops its polling and lets the entry age toward
/// garbage collection.
pub struct QuerySubscription<V>
where
    V: Clone + Send + Sync + 'static,
{
    key: QueryKey,
    cache: Arc<CacheInner<V>>,
    receiver: watch::Receiver<QueryState<V>>,
    poller: Option<JoinHandle<()>>,
}

impl<V> QuerySubscription<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Key being observed.
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Wait for the next state change.
    ///
    /// The first call returns immediately with the state at subscription time.
    /// Returns `None` once the entry has been evicted.
    pub async fn changed(&mut self) -> Option<QueryState<V>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Current state, with staleness evaluated now.
    pub fn current(&self) -> QueryState<V> {
        let state = self.cache.lock();
        match state.entries.get(&self.key) {
            Some(entry) => entry.snapshot(Instant::now()),
            None => self.receiver.borrow().clone(),
        }
    }

    /// Force a refetch through the producer registered for this key.
    pub fn refetch(&self) -> Option<QueryFuture<V>> {
        let mut state = self.cache.lock();
        self.cache.start_fetch(&mut state, &self.key, Instant::now())
    }
}

impl<V> Drop for QuerySubscription<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        self.cache.unsubscribe(&self.key);
    }
}

impl<V> std::fmt::Debug for QuerySubscription<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySubscription")
            .field("key", &self.key)
            .field("polling", &self.poller.is_some())
            .finish_non_exhaustive()
    }
}
