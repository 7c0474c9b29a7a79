// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! The execution node's ingestion engine: assembles inbound blocks into
//! executable units once their parent state and transaction collections are
//! known, schedules them onto a bounded worker pool, builds and broadcasts
//! execution receipts, and recovers the unexecuted frontier at startup.

pub mod assembler;
pub mod config;
pub mod contract_store;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod receipt;
pub mod recovery;
pub mod scheduler;
pub mod traits;

#[cfg(test)]
pub mod test_support;

pub use assembler::Assembler;
pub use config::IngestionConfig;
pub use contract_store::{Authorizer, ContractKey, ContractStore, SelfAuthorizer};
pub use engine::Engine;
pub use error::{
    AssemblerError, ContractStoreError, IngestionError, ReceiptError, RecoveryError,
    SchedulerError,
};
pub use metrics::{CacheMetricsAdapter, IngestionMetrics};
pub use receipt::ReceiptBuilder;
pub use scheduler::{RetryPolicy, Scheduler};
pub use traits::{
    CollectionRequester, ComputationManager, ExecutionStateStore, Ledger, Provider, ProtocolState,
    StakingSigner, StateSyncSource,
};
