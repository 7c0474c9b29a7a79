// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use execn_types::{EncodableSnapshot, EpochPhase};
use std::time::{Duration, Instant};

/// Supplies the latest finalized protocol snapshot from a trusted access
/// node. A single call is expected to respect the deadline in its `Context`;
/// [`wait_for_epoch_and_phase`] additionally wraps each call in its own
/// timeout so a hung provider cannot stall the retry loop forever.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn get_snapshot(&self) -> anyhow::Result<EncodableSnapshot>;
}

const PER_ATTEMPT_DEADLINE: Duration = Duration::from_secs(30);

/// Polls `provider` at `retry_interval` until the snapshot it returns reports
/// an epoch counter and phase at or past `(startup_epoch, startup_phase)`,
/// using lexicographic comparison over `(counter, phase)`. Transient provider
/// errors are retried indefinitely; there is no overall deadline, matching a
/// node operator's expectation to wait as long as it takes for the network to
/// reach the target epoch.
pub async fn wait_for_epoch_and_phase(
    startup_epoch: u64,
    startup_phase: EpochPhase,
    retry_interval: Duration,
    provider: &dyn SnapshotProvider,
) -> EncodableSnapshot {
    let start = Instant::now();

    loop {
        tracing::info!(elapsed = ?start.elapsed(), "retrieving snapshot...");

        let attempt = tokio::time::timeout(PER_ATTEMPT_DEADLINE, provider.get_snapshot()).await;

        let snapshot = match attempt {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(error)) => {
                tracing::info!(%error, "failed to get snapshot");
                tokio::time::sleep(retry_interval).await;
                continue;
            }
            Err(_elapsed) => {
                tracing::info!("timed out retrieving snapshot within the per-attempt deadline");
                tokio::time::sleep(retry_interval).await;
                continue;
            }
        };

        let current_counter = snapshot.epochs.current.counter;
        let current_phase = snapshot.phase;

        if (current_counter, current_phase) >= (startup_epoch, startup_phase) {
            tracing::info!(
                elapsed = ?start.elapsed(),
                current_epoch = current_counter,
                current_phase = %current_phase,
                "reached desired epoch and phase in dynamic startup pre-init"
            );
            return snapshot;
        }

        tracing::warn!(
            elapsed = ?start.elapsed(),
            current_epoch = current_counter,
            current_phase = %current_phase,
            target_epoch = startup_epoch,
            target_phase = %startup_phase,
            "waiting for target epoch and phase"
        );
        tokio::time::sleep(retry_interval).await;
    }
}
