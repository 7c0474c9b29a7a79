// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_worker_pool_size() -> usize {
    8
}

fn default_ready_queue_capacity() -> usize {
    1024
}

fn default_state_sync_threshold() -> u64 {
    100
}

fn default_dns_cache_ttl_secs() -> u64 {
    300
}

fn default_retry_base_secs() -> u64 {
    1
}

fn default_retry_max_attempts() -> u32 {
    5
}

/// Tunables for the ingestion engine, deserializable from TOML and
/// overridable by CLI flags at the binary boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Number of concurrent block-execution workers.
    pub worker_pool_size: usize,
    /// Capacity of the bounded ready queue; beyond this, newly-ready blocks
    /// are dropped rather than queued (see [`crate::error::IngestionError::Dropped`]).
    pub ready_queue_capacity: usize,
    /// Height gap between the sealed and executed tip that triggers state sync.
    pub state_sync_threshold: u64,
    /// TTL for the peer-resolution cache used before receipt broadcast.
    pub dns_cache_ttl_secs: u64,
    /// Base delay for exponential-backoff retries of outgoing broadcasts.
    pub retry_base_secs: u64,
    /// Maximum attempts for exponential-backoff retries.
    pub retry_max_attempts: u32,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        IngestionConfig {
            worker_pool_size: default_worker_pool_size(),
            ready_queue_capacity: default_ready_queue_capacity(),
            state_sync_threshold: default_state_sync_threshold(),
            dns_cache_ttl_secs: default_dns_cache_ttl_secs(),
            retry_base_secs: default_retry_base_secs(),
            retry_max_attempts: default_retry_max_attempts(),
        }
    }
}

impl IngestionConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn dns_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.dns_cache_ttl_secs)
    }

    pub fn retry_base(&self) -> Duration {
        Duration::from_secs(self.retry_base_secs)
    }
}
