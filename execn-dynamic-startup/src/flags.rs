// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use execn_types::EpochPhase;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum DynamicStartupError {
    #[error("invalid flag --dynamic-startup-access-publickey: {0}")]
    MalformedPublicKeyHex(String),
    #[error("invalid flag --dynamic-startup-access-publickey: not a valid ECDSA P-256 public key")]
    InvalidPublicKey,
    #[error("invalid flag --dynamic-startup-access-address: must not be empty")]
    EmptyAccessAddress,
    #[error("invalid flag --dynamic-startup-startup-epoch-phase: unknown epoch phase")]
    UndefinedEpochPhase,
}

/// Command-line flags that configure dynamic startup. Validity is checked
/// independently of the flags being parseable by clap: a syntactically valid
/// hex string can still fail to decode as a P-256 point, for instance.
#[derive(Clone, Debug, clap::Parser)]
pub struct DynamicStartupArgs {
    /// Hex-encoded ECDSA P-256 public key of the trusted access node, with an
    /// optional leading "0x".
    #[clap(long = "dynamic-startup-access-publickey")]
    pub access_public_key: String,

    /// Network address of the trusted access node.
    #[clap(long = "dynamic-startup-access-address")]
    pub access_address: String,

    /// Epoch counter to wait for.
    #[clap(long = "dynamic-startup-startup-epoch")]
    pub startup_epoch: u64,

    /// Epoch phase to wait for, within `startup_epoch`.
    #[clap(long = "dynamic-startup-startup-epoch-phase", value_parser = parse_epoch_phase)]
    pub startup_epoch_phase: EpochPhase,

    /// Interval between snapshot polls while waiting.
    #[clap(long = "dynamic-startup-sleep-interval", value_parser = parse_duration_secs, default_value = "30")]
    pub sleep_interval: std::time::Duration,
}

fn parse_duration_secs(s: &str) -> Result<std::time::Duration, String> {
    s.parse::<u64>()
        .map(std::time::Duration::from_secs)
        .map_err(|_| format!("invalid duration (seconds): {s}"))
}

fn parse_epoch_phase(s: &str) -> Result<EpochPhase, String> {
    s.parse::<EpochPhase>().map_err(|e| e.to_string())
}

/// Validates flags necessary for dynamic node startup:
/// - `access_public_key` must decode as hex to a valid ECDSA P-256 public key.
/// - `access_address` must not be empty.
/// - `startup_phase` must be past [`EpochPhase::Undefined`].
pub fn validate_dynamic_startup_flags(
    access_public_key: &str,
    access_address: &str,
    startup_phase: EpochPhase,
) -> Result<(), DynamicStartupError> {
    let hex_str = access_public_key
        .strip_prefix("0x")
        .unwrap_or(access_public_key);
    let bytes = hex::decode(hex_str)
        .map_err(|e| DynamicStartupError::MalformedPublicKeyHex(e.to_string()))?;

    decode_p256_public_key(&bytes).ok_or(DynamicStartupError::InvalidPublicKey)?;

    if access_address.is_empty() {
        return Err(DynamicStartupError::EmptyAccessAddress);
    }

    if startup_phase <= EpochPhase::Undefined {
        return Err(DynamicStartupError::UndefinedEpochPhase);
    }

    Ok(())
}

fn decode_p256_public_key(bytes: &[u8]) -> Option<p256::PublicKey> {
    p256::PublicKey::from_sec1_bytes(bytes).ok()
}
