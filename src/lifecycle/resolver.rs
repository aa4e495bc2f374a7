use super::{BridgeMessage, Status};
use crate::abi::{sent_message_from_logs, withdrawal_from_logs};
use crate::chain::{RollupChain, SettlementChain};
use crate::config::ContractAddresses;
use crate::error::BridgeError;
use crate::types::Chain;
use serde::Serialize;
use std::sync::Arc;

/// Read-only snapshot of the finality data withdrawals are classified against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainState {
    pub l1_timestamp: u64,
    pub committed_height: u64,
    pub challenge_period_seconds: u64,
}

/// Classifies a message from what both chains currently report.
///
/// Holds no state of its own; clones share the same clients.
#[derive(Clone)]
pub struct MessageStatusResolver {
    l1: Arc<dyn SettlementChain>,
    l2: Arc<dyn RollupChain>,
    contracts: ContractAddresses,
}

impl MessageStatusResolver {
    pub fn new(
        l1: Arc<dyn SettlementChain>,
        l2: Arc<dyn RollupChain>,
        contracts: ContractAddresses,
    ) -> Self {
        Self { l1, l2, contracts }
    }

    pub async fn resolve(&self, message: &BridgeMessage) -> Result<Status, BridgeError> {
        match message.source_chain() {
            Chain::L1 => self.resolve_deposit(message).await,
            Chain::L2 => self.resolve_withdrawal(message).await,
        }
    }

    pub async fn chain_state(&self) -> Result<ChainState, BridgeError> {
        let unavailable = BridgeError::unavailable(Chain::L1);
        Ok(ChainState {
            l1_timestamp: self.l1.get_timestamp().await.map_err(unavailable)?,
            committed_height: self.l1.get_committed_height().await.map_err(unavailable)?,
            challenge_period_seconds: self
                .l1
                .get_challenge_period_seconds()
                .await
                .map_err(unavailable)?,
        })
    }

    async fn resolve_deposit(&self, message: &BridgeMessage) -> Result<Status, BridgeError> {
        let receipt = self
            .l1
            .get_receipt(message.source_tx_hash())
            .await
            .map_err(BridgeError::unavailable(Chain::L1))?;
        let Some(receipt) = receipt else {
            return Ok(Status::Submitted);
        };
        if !receipt.success {
            return Ok(Status::Unconfirmed);
        }
        let Some(sent) = sent_message_from_logs(&receipt.logs, self.contracts.l1_cross_domain_messenger)
        else {
            tracing::warn!(
                tx = %message.source_tx_hash(),
                "deposit receipt has no SentMessage event from the L1 messenger"
            );
            return Ok(Status::Unconfirmed);
        };
        let relayed = self
            .l2
            .is_message_relayed(sent.hash())
            .await
            .map_err(BridgeError::unavailable(Chain::L2))?;
        Ok(if relayed {
            Status::Relayed
        } else {
            Status::Unconfirmed
        })
    }

    async fn resolve_withdrawal(&self, message: &BridgeMessage) -> Result<Status, BridgeError> {
        let receipt = self
            .l2
            .get_receipt(message.source_tx_hash())
            .await
            .map_err(BridgeError::unavailable(Chain::L2))?;
        let Some(receipt) = receipt else {
            return Ok(Status::Submitted);
        };
        if !receipt.success {
            return Ok(Status::Unconfirmed);
        }
        let Some(withdrawal) = withdrawal_from_logs(&receipt.logs, self.contracts.l2_to_l1_message_passer)
        else {
            tracing::warn!(
                tx = %message.source_tx_hash(),
                "withdrawal receipt has no MessagePassed event"
            );
            return Ok(Status::Unconfirmed);
        };

        let unavailable = BridgeError::unavailable(Chain::L1);
        let hash = withdrawal.withdrawal_hash;
        if self.l1.is_withdrawal_finalized(hash).await.map_err(unavailable)? {
            return Ok(Status::Relayed);
        }

        match self.l1.get_proven_withdrawal(hash).await.map_err(unavailable)? {
            Some(proven) if !proven.invalidated => {
                let now = self.l1.get_timestamp().await.map_err(unavailable)?;
                let period = self
                    .l1
                    .get_challenge_period_seconds()
                    .await
                    .map_err(unavailable)?;
                let elapsed = now.saturating_sub(proven.timestamp);
                return Ok(if elapsed >= period {
                    Status::ReadyForRelay
                } else {
                    Status::InChallengePeriod
                });
            }
            Some(_) => {
                tracing::warn!(
                    withdrawal = %hash,
                    "output root behind the proof was invalidated, withdrawal must be proven again"
                );
            }
            None => {}
        }

        let committed = self.l1.get_committed_height().await.map_err(unavailable)?;
        Ok(if committed >= receipt.block_number {
            Status::ReadyToProve
        } else {
            Status::Unconfirmed
        })
    }
}
