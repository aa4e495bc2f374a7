use crate::types::{AssetKind, Chain};
use alloy_primitives::{B256, U256};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a cross-domain message, in causal order.
///
/// Deposits only ever visit `Submitted`, `Unconfirmed` and `Relayed`; the
/// derived ordering still lets a waiter compare them against any target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Status {
    Submitted,
    Unconfirmed,
    ReadyToProve,
    InChallengePeriod,
    ReadyForRelay,
    Relayed,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Submitted => "submitted",
            Status::Unconfirmed => "unconfirmed",
            Status::ReadyToProve => "ready-to-prove",
            Status::InChallengePeriod => "in-challenge-period",
            Status::ReadyForRelay => "ready-for-relay",
            Status::Relayed => "relayed",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Status::Relayed
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "submitted" => Ok(Status::Submitted),
            "unconfirmed" => Ok(Status::Unconfirmed),
            "ready-to-prove" => Ok(Status::ReadyToProve),
            "in-challenge-period" => Ok(Status::InChallengePeriod),
            "ready-for-relay" => Ok(Status::ReadyForRelay),
            "relayed" => Ok(Status::Relayed),
            _ => anyhow::bail!("unknown status {value}"),
        }
    }
}

/// Reference to the proof attached to a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRef {
    /// `None` when the withdrawal was proven by another account.
    pub tx_hash: Option<B256>,
    pub l2_output_index: U256,
    /// L1 timestamp the portal recorded, once it has been read back.
    pub proven_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeMessage {
    source_chain: Chain,
    source_tx_hash: B256,
    pub amount: U256,
    pub asset: AssetKind,
    status: Status,
    pub proof: Option<ProofRef>,
    pub finalize_tx_hash: Option<B256>,
}

impl BridgeMessage {
    /// A message whose source transaction was just accepted by the node.
    pub fn submitted(source_chain: Chain, source_tx_hash: B256, amount: U256, asset: AssetKind) -> Self {
        Self {
            source_chain,
            source_tx_hash,
            amount,
            asset,
            status: Status::Submitted,
            proof: None,
            finalize_tx_hash: None,
        }
    }

    pub fn source_chain(&self) -> Chain {
        self.source_chain
    }

    pub fn source_tx_hash(&self) -> B256 {
        self.source_tx_hash
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_deposit(&self) -> bool {
        self.source_chain == Chain::L1
    }

    /// Destination chain of the message.
    pub fn destination(&self) -> Chain {
        self.source_chain.other()
    }

    /// Records a freshly resolved status.
    ///
    /// Status only moves forward under normal operation. A regression means the
    /// chain reorganized under us; it is accepted so later steps work from what
    /// the chain actually says, and it is logged. `Relayed` is terminal: once
    /// delivered, a lower reading is ignored.
    pub fn observe(&mut self, status: Status) {
        if status < self.status {
            if self.status.is_terminal() {
                tracing::warn!(
                    tx = %self.source_tx_hash,
                    reported = %status,
                    "ignoring lower status for a relayed message"
                );
                return;
            }
            tracing::warn!(
                tx = %self.source_tx_hash,
                from = %self.status,
                to = %status,
                "message status regressed, source chain may have reorganized"
            );
        } else if status > self.status {
            tracing::info!(
                tx = %self.source_tx_hash,
                from = %self.status,
                to = %status,
                "message status advanced"
            );
        }
        self.status = status;
    }
}
