// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! A cache that serves stale entries immediately while refreshing them in the
//! background: a cold miss resolves synchronously, a fresh hit returns at
//! once, and a stale hit returns the old value while kicking off at most one
//! concurrent upstream refresh per key.
//!
//! [`Cache`] holds the data; [`Resolver`] wraps an upstream lookup function
//! with the above policy. The in-flight set used to cap concurrent refreshes
//! is scoped **per record kind** — the caller picks a `kind` string per
//! distinct upstream query shape (e.g. one kind per resolver method) so that
//! two different queries for the same key, issued under different kinds, can
//! both be in flight without stepping on each other's bookkeeping.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// A TTL-tagged key/value store. Staleness is a property of `resolve`, not of
/// storage: an expired entry is never evicted by `resolve` itself, only
/// overwritten by a subsequent `update`.
pub struct Cache<K, V> {
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Cache {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Looks up `key`. Returns `(value, existed, expired)`; `value` is
    /// meaningless when `existed` is false.
    pub fn resolve(&self, key: &K) -> (Option<V>, bool, bool) {
        match self.entries.get(key) {
            Some(entry) => {
                let expired = entry.inserted_at.elapsed() > self.ttl;
                (Some(entry.value.clone()), true, expired)
            }
            None => (None, false, false),
        }
    }

    /// Inserts or refreshes `key`, resetting its age to zero.
    pub fn update(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }
}

/// A fallible upstream lookup a [`Resolver`] refreshes a [`Cache`] from.
#[async_trait]
pub trait Upstream<K, V>: Send + Sync {
    async fn lookup(&self, key: &K) -> anyhow::Result<V>;
}

/// Counters a [`Resolver`] reports to. Mirrors the upstream's observable
/// outcomes; a caller with no metrics sink can use [`NopMetrics`].
pub trait ResolverMetrics: Send + Sync {
    fn on_cache_hit(&self);
    fn on_cache_miss(&self);
    fn on_cache_invalidated(&self);
}

#[derive(Default)]
pub struct NopMetrics;

impl ResolverMetrics for NopMetrics {
    fn on_cache_hit(&self) {}
    fn on_cache_miss(&self) {}
    fn on_cache_invalidated(&self) {}
}

/// Per-record-kind bookkeeping of in-flight background refreshes.
///
/// Each kind gets its own `HashSet` behind its own lock acquisition so that a
/// key resolving under one kind never blocks, shares, or is confused with the
/// in-flight state of the same key under a different kind.
struct InFlight<K> {
    by_kind: Mutex<HashMap<&'static str, HashSet<K>>>,
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    fn new() -> Self {
        InFlight {
            by_kind: Mutex::new(HashMap::new()),
        }
    }

    /// Claims `key` for `kind` if no refresh is already in flight for it.
    /// Returns `true` if the caller should launch a refresh.
    fn try_claim(&self, kind: &'static str, key: &K) -> bool {
        let mut by_kind = self.by_kind.lock();
        by_kind.entry(kind).or_default().insert(key.clone())
    }

    fn release(&self, kind: &'static str, key: &K) {
        let mut by_kind = self.by_kind.lock();
        if let Some(set) = by_kind.get_mut(kind) {
            set.remove(key);
        }
    }
}

/// Wraps a [`Cache`] and an [`Upstream`] with the stale-while-revalidate
/// policy described at module level.
pub struct Resolver<K, V> {
    cache: Arc<Cache<K, V>>,
    upstream: Arc<dyn Upstream<K, V>>,
    metrics: Arc<dyn ResolverMetrics>,
    in_flight: Arc<InFlight<K>>,
    kind: &'static str,
}

impl<K, V> Clone for Resolver<K, V> {
    fn clone(&self) -> Self {
        Resolver {
            cache: self.cache.clone(),
            upstream: self.upstream.clone(),
            metrics: self.metrics.clone(),
            in_flight: self.in_flight.clone(),
            kind: self.kind,
        }
    }
}

impl<K, V> Resolver<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// `kind` identifies this resolver's record kind for the in-flight set;
    /// two resolvers sharing an `in_flight` handle but different `kind`s never
    /// interfere with each other's refresh accounting.
    pub fn new(
        cache: Arc<Cache<K, V>>,
        upstream: Arc<dyn Upstream<K, V>>,
        metrics: Arc<dyn ResolverMetrics>,
        in_flight: Arc<InFlight<K>>,
        kind: &'static str,
    ) -> Self {
        Resolver {
            cache,
            upstream,
            metrics,
            in_flight,
            kind,
        }
    }

    /// Builds a fresh, independent in-flight set. Use one handle per record
    /// kind family you intend to keep isolated; share a handle only between
    /// resolvers that should coalesce refreshes for the same kind.
    pub fn new_in_flight_set() -> Arc<InFlight<K>> {
        Arc::new(InFlight::new())
    }

    pub async fn resolve(&self, key: K) -> anyhow::Result<V> {
        let (cached, existed, expired) = self.cache.resolve(&key);

        if !existed {
            self.metrics.on_cache_miss();
            return self.resolve_from_upstream(&key).await;
        }

        if expired && self.in_flight.try_claim(self.kind, &key) {
            let resolver = self.clone();
            let key_for_task = key.clone();
            tokio::spawn(async move {
                if let Err(error) = resolver.resolve_from_upstream(&key_for_task).await {
                    tracing::debug!(kind = resolver.kind, %error, "background cache refresh failed");
                    resolver.metrics.on_cache_invalidated();
                }
                resolver.in_flight.release(resolver.kind, &key_for_task);
            });
        }

        self.metrics.on_cache_hit();
        Ok(cached.expect("existed implies a value"))
    }

    async fn resolve_from_upstream(&self, key: &K) -> anyhow::Result<V> {
        let value = self.upstream.lookup(key).await?;
        self.cache.update(key.clone(), value.clone());
        Ok(value)
    }
}
