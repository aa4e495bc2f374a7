//! Per-chain capabilities the lifecycle controller depends on.
//!
//! [`ChainClient`] covers what both sides of the pair can do. The settlement
//! and rollup traits add the reads that only make sense on one side.

use crate::error::ChainError;
use crate::types::Chain;
use alloy_primitives::{Address, Bytes, Log, B256, U256};
use async_trait::async_trait;

/// An unsigned transaction for the client's signer to fill, sign and send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl TxRequest {
    pub fn call(to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// A mined transaction receipt, already decoded from the node's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub success: bool,
    pub logs: Vec<Log>,
}

/// An L2 output root published on L1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputProposal {
    pub index: U256,
    pub output_root: B256,
    pub l2_block_number: u64,
    pub timestamp: u64,
}

/// The portal's record of a proven withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvenWithdrawal {
    pub timestamp: u64,
    pub l2_output_index: U256,
    /// The output root the proof was checked against was deleted or replaced.
    pub invalidated: bool,
}

/// Everything `proveWithdrawalTransaction` needs from the L2 side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalProof {
    pub state_root: B256,
    pub message_passer_storage_root: B256,
    pub block_hash: B256,
    pub storage_proof: Vec<Bytes>,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain(&self) -> Chain;

    /// Sends the request signed by the client's account; returns the tx hash.
    async fn submit(&self, request: TxRequest) -> Result<B256, ChainError>;

    /// `Ok(None)` while the transaction is pending or unknown.
    async fn get_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError>;

    async fn get_balance(&self, address: Address) -> Result<U256, ChainError>;

    async fn get_token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    /// Timestamp of the latest block; the chain's notion of "now".
    async fn get_timestamp(&self) -> Result<u64, ChainError>;

    /// Address transactions are sent from, when a signer is configured.
    fn account(&self) -> Option<Address>;
}

#[async_trait]
pub trait SettlementChain: ChainClient {
    /// Highest L2 block covered by a published output root.
    async fn get_committed_height(&self) -> Result<u64, ChainError>;

    async fn get_challenge_period_seconds(&self) -> Result<u64, ChainError>;

    /// First output proposal covering `l2_block`, if one has been published.
    async fn get_output_after(&self, l2_block: u64) -> Result<Option<OutputProposal>, ChainError>;

    async fn get_proven_withdrawal(
        &self,
        withdrawal_hash: B256,
    ) -> Result<Option<ProvenWithdrawal>, ChainError>;

    async fn is_withdrawal_finalized(&self, withdrawal_hash: B256) -> Result<bool, ChainError>;
}

#[async_trait]
pub trait RollupChain: ChainClient {
    /// Whether the L2 messenger has successfully relayed the deposit message.
    async fn is_message_relayed(&self, message_hash: B256) -> Result<bool, ChainError>;

    async fn get_withdrawal_proof(
        &self,
        withdrawal_hash: B256,
        l2_block: u64,
    ) -> Result<WithdrawalProof, ChainError>;
}
