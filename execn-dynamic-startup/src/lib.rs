// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dynamic-startup pre-initialization.
//!
//! A node with no bootstrap snapshot on disk can instead poll a trusted access
//! node for the latest finalized protocol snapshot until it reports the
//! desired epoch and phase, then write that snapshot to the bootstrap
//! directory and proceed with ordinary startup. Once a snapshot file exists,
//! dynamic startup is skipped entirely on subsequent runs.

mod flags;
mod snapshot_file;
mod wait;

pub use flags::{validate_dynamic_startup_flags, DynamicStartupArgs, DynamicStartupError};
pub use snapshot_file::{root_snapshot_exists, write_root_snapshot_atomically};
pub use wait::{wait_for_epoch_and_phase, SnapshotProvider};
