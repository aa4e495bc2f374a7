use crate::lifecycle::Status;
use crate::types::Chain;
use alloy_primitives::B256;
use thiserror::Error;

/// Errors raised by a [`ChainClient`](crate::chain::ChainClient) implementation.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The node could not be reached or answered with a transport/RPC error.
    #[error("rpc request failed: {0}")]
    Rpc(String),

    /// The node refused the transaction or the call reverted.
    #[error("transaction rejected: {reason}")]
    Rejected { reason: String },

    /// A submission was attempted on a chain without a configured signer.
    #[error("no signer configured for {0}")]
    NoSigner(Chain),

    /// A contract response could not be decoded.
    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

impl ChainError {
    pub fn rpc(err: impl std::fmt::Display) -> Self {
        ChainError::Rpc(err.to_string())
    }

    pub fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        ChainError::Decode {
            what,
            reason: err.to_string(),
        }
    }
}

/// Errors surfaced by the message lifecycle controller.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Signing or the node rejected a transaction; never retried internally.
    #[error("submission failed on {chain} (tx {tx_hash:?}, last status {last_status:?}): {source}")]
    SubmissionFailed {
        chain: Chain,
        tx_hash: Option<B256>,
        last_status: Option<Status>,
        #[source]
        source: ChainError,
    },

    /// The source transaction was mined but reverted, so no message exists.
    #[error("source transaction {tx_hash:#x} reverted on {chain}")]
    SourceReverted { chain: Chain, tx_hash: B256 },

    /// A transient RPC failure while reading chain state.
    #[error("{chain} unavailable: {source}")]
    ChainUnavailable {
        chain: Chain,
        #[source]
        source: ChainError,
    },

    /// A step's precondition was already satisfied, e.g. by a concurrent actor.
    #[error("{step} already done")]
    AlreadyProgressed { step: &'static str },

    /// The source receipt does not carry the event a follow-up step needs.
    #[error("no {event} event in receipt {tx_hash:#x} on {chain}")]
    MissingBridgeEvent {
        chain: Chain,
        tx_hash: B256,
        event: &'static str,
    },

    /// No output proposal covers the withdrawal's L2 block yet.
    #[error("no output root published for L2 block {l2_block}")]
    OutputNotPublished { l2_block: u64 },

    /// A step was requested before the message reached its precondition.
    #[error("cannot {step} yet, message is {status}")]
    NotReady { step: &'static str, status: Status },

    /// A prove or finalize transaction was mined but reverted.
    #[error("{step} transaction {tx_hash:#x} reverted on {chain}")]
    FollowUpReverted {
        step: &'static str,
        chain: Chain,
        tx_hash: B256,
    },

    /// A message was handed to the orchestrator for the other direction.
    #[error("message originates on {found}, expected {expected}")]
    WrongDirection { expected: Chain, found: Chain },

    /// The token approval preceding a deposit was not confirmed.
    #[error("approval {tx_hash:#x} not confirmed ({reason}); deposit not submitted")]
    ApprovalIncomplete { tx_hash: B256, reason: &'static str },
}

impl BridgeError {
    pub fn unavailable(chain: Chain) -> impl Fn(ChainError) -> BridgeError + Copy {
        move |source| BridgeError::ChainUnavailable { chain, source }
    }

    pub fn is_already_progressed(&self) -> bool {
        matches!(self, BridgeError::AlreadyProgressed { .. })
    }
}
