// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! Prometheus-backed counters and histograms for the ingestion pipeline.
//! One [`IngestionMetrics`] is constructed per engine instance and registered
//! against a caller-supplied [`prometheus::Registry`]; library code never
//! reaches for the global default registry.

use execn_ttl_cache::ResolverMetrics;
use prometheus::{Counter, Histogram, HistogramOpts, IntGauge, Opts, Registry};

pub struct IngestionMetrics {
    pub blocks_executed_total: Counter,
    pub cache_hits_total: Counter,
    pub cache_misses_total: Counter,
    pub cache_invalidations_total: Counter,
    pub scheduler_ready_queue_depth: IntGauge,
    pub receipt_build_latency_seconds: Histogram,
}

impl IngestionMetrics {
    pub fn new(registry: &Registry) -> anyhow::Result<Self> {
        let blocks_executed_total = Counter::with_opts(Opts::new(
            "execn_blocks_executed_total",
            "Total number of blocks successfully executed and persisted",
        ))?;
        let cache_hits_total = Counter::with_opts(Opts::new(
            "execn_cache_hits_total",
            "Total TTL-cache hits (fresh or stale)",
        ))?;
        let cache_misses_total = Counter::with_opts(Opts::new(
            "execn_cache_misses_total",
            "Total TTL-cache cold misses",
        ))?;
        let cache_invalidations_total = Counter::with_opts(Opts::new(
            "execn_cache_invalidations_total",
            "Total background refreshes that failed, leaving a stale entry in place",
        ))?;
        let scheduler_ready_queue_depth = IntGauge::with_opts(Opts::new(
            "execn_scheduler_ready_queue_depth",
            "Current number of executable blocks waiting for a worker",
        ))?;
        let receipt_build_latency_seconds = Histogram::with_opts(HistogramOpts::new(
            "execn_receipt_build_latency_seconds",
            "Latency of SPoCK generation plus receipt signing, per block",
        ))?;

        registry.register(Box::new(blocks_executed_total.clone()))?;
        registry.register(Box::new(cache_hits_total.clone()))?;
        registry.register(Box::new(cache_misses_total.clone()))?;
        registry.register(Box::new(cache_invalidations_total.clone()))?;
        registry.register(Box::new(scheduler_ready_queue_depth.clone()))?;
        registry.register(Box::new(receipt_build_latency_seconds.clone()))?;

        Ok(IngestionMetrics {
            blocks_executed_total,
            cache_hits_total,
            cache_misses_total,
            cache_invalidations_total,
            scheduler_ready_queue_depth,
            receipt_build_latency_seconds,
        })
    }
}

/// Adapts [`IngestionMetrics`]' cache counters to the [`ResolverMetrics`]
/// trait expected by `execn-ttl-cache`. Holds cloned counter handles (cheap:
/// `prometheus::Counter` is itself `Arc`-backed) rather than borrowing, so it
/// satisfies the `'static` bound `Arc<dyn ResolverMetrics>` requires.
pub struct CacheMetricsAdapter {
    pub hits: Counter,
    pub misses: Counter,
    pub invalidations: Counter,
}

impl CacheMetricsAdapter {
    pub fn new(metrics: &IngestionMetrics) -> Self {
        CacheMetricsAdapter {
            hits: metrics.cache_hits_total.clone(),
            misses: metrics.cache_misses_total.clone(),
            invalidations: metrics.cache_invalidations_total.clone(),
        }
    }
}

impl ResolverMetrics for CacheMetricsAdapter {
    fn on_cache_hit(&self) {
        self.hits.inc();
    }

    fn on_cache_miss(&self) {
        self.misses.inc();
    }

    fn on_cache_invalidated(&self) {
        self.invalidations.inc();
    }
}
