// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{block::Seal, header::Header, identifier::Identifier, state::StateCommitment};
use serde::{Deserialize, Serialize};

/// Coarse-grained phase of the consensus committee's epoch lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpochPhase {
    Undefined,
    Staking,
    Setup,
    Committed,
}

impl std::fmt::Display for EpochPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EpochPhase::Undefined => "undefined",
            EpochPhase::Staking => "staking",
            EpochPhase::Setup => "setup",
            EpochPhase::Committed => "committed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EpochPhase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "undefined" => Ok(EpochPhase::Undefined),
            "staking" => Ok(EpochPhase::Staking),
            "setup" => Ok(EpochPhase::Setup),
            "committed" => Ok(EpochPhase::Committed),
            other => anyhow::bail!("unknown epoch phase: {other}"),
        }
    }
}

/// A minimal identity record: who a peer is and what role they serve.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub node_id: Identifier,
    pub address: String,
    pub staking_public_key: Vec<u8>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EpochInfo {
    pub counter: u64,
}

/// The wire form of a protocol-state snapshot, as downloaded from an access
/// node and written atomically to the bootstrap directory.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EncodableSnapshot {
    pub head: Header,
    pub identities: Vec<Identity>,
    pub seal: Seal,
    pub commit: StateCommitment,
    pub epochs: EpochWindow,
    pub phase: EpochPhase,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EpochWindow {
    pub current: EpochInfo,
    pub next: Option<EpochInfo>,
    pub previous: Option<EpochInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn phase_ordering_matches_lifecycle() {
        assert!(EpochPhase::Undefined < EpochPhase::Staking);
        assert!(EpochPhase::Staking < EpochPhase::Setup);
        assert!(EpochPhase::Setup < EpochPhase::Committed);
    }

    #[test]
    fn phase_round_trips_through_str() {
        for phase in [
            EpochPhase::Undefined,
            EpochPhase::Staking,
            EpochPhase::Setup,
            EpochPhase::Committed,
        ] {
            assert_eq!(EpochPhase::from_str(&phase.to_string()).unwrap(), phase);
        }
    }
}
