//! Cross-domain message lifecycle: classification, waiting and the two
//! orchestrated flows built on top of them.

mod deposit;
mod message;
mod resolver;
mod waiter;
mod withdrawal;

pub use deposit::DepositOrchestrator;
pub use message::{BridgeMessage, ProofRef, Status};
pub use resolver::{ChainState, MessageStatusResolver};
pub use waiter::{StatusWaiter, WaitOutcome, DEFAULT_MAX_CONSECUTIVE_FAILURES};
pub use withdrawal::WithdrawalOrchestrator;

use crate::chain::ChainClient;
use crate::error::{BridgeError, ChainError};
use crate::types::Chain;
use alloy_primitives::B256;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-stage wait budgets. The challenge wait is orders of magnitude longer
/// than the others, so each stage gets its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    /// Source receipts and follow-up (prove/finalize) receipts.
    pub confirmation_timeout: Duration,
    /// Deposit relay on L2.
    pub relay_timeout: Duration,
    /// Output root publication covering a withdrawal.
    pub prove_timeout: Duration,
    /// Challenge period after proving.
    pub challenge_timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            confirmation_timeout: Duration::from_secs(5 * 60),
            relay_timeout: Duration::from_secs(30 * 60),
            prove_timeout: Duration::from_secs(4 * 60 * 60),
            challenge_timeout: Duration::from_secs(8 * 24 * 60 * 60),
        }
    }
}

/// Where a flow stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Complete(BridgeMessage),
    /// Recoverable: resume with the same message, nothing is resubmitted.
    TimedOut {
        message: BridgeMessage,
        waiting_for: Status,
    },
    Cancelled(BridgeMessage),
}

impl Progress {
    pub fn message(&self) -> &BridgeMessage {
        match self {
            Progress::Complete(message)
            | Progress::Cancelled(message)
            | Progress::TimedOut { message, .. } => message,
        }
    }
}

/// Why a stage did not reach its target.
enum Halt {
    TimedOut(Status),
    Cancelled,
}

impl Halt {
    fn into_progress(self, message: BridgeMessage) -> Progress {
        match self {
            Halt::TimedOut(waiting_for) => Progress::TimedOut {
                message,
                waiting_for,
            },
            Halt::Cancelled => Progress::Cancelled(message),
        }
    }
}

/// Waits for one stage and records what was observed on the message.
async fn stage(
    waiter: &StatusWaiter,
    message: &mut BridgeMessage,
    target: Status,
    poll_interval: Duration,
    timeout: Duration,
    started: Instant,
    cancel: &CancellationToken,
) -> Option<Halt> {
    if message.status() >= target {
        return None;
    }
    tracing::info!(
        tx = %message.source_tx_hash(),
        %target,
        elapsed_secs = started.elapsed().as_secs(),
        "waiting for status"
    );
    let outcome = waiter
        .wait_for(message, target, poll_interval, timeout, cancel)
        .await;
    if let Some(status) = outcome.last_status() {
        message.observe(status);
    }
    match outcome {
        WaitOutcome::Reached(_) => None,
        WaitOutcome::TimedOut {
            consecutive_failures,
            ..
        } => {
            tracing::warn!(
                tx = %message.source_tx_hash(),
                %target,
                consecutive_failures,
                "gave up waiting, resume later with the same transaction hash"
            );
            Some(Halt::TimedOut(target))
        }
        WaitOutcome::Cancelled { .. } => {
            tracing::info!(tx = %message.source_tx_hash(), status = %message.status(), "wait cancelled");
            Some(Halt::Cancelled)
        }
    }
}

/// Fails the flow if the source transaction was mined but reverted.
async fn ensure_source_succeeded<C: ChainClient + ?Sized>(
    client: &C,
    message: &BridgeMessage,
) -> Result<(), BridgeError> {
    let receipt = client
        .get_receipt(message.source_tx_hash())
        .await
        .map_err(BridgeError::unavailable(client.chain()))?;
    match receipt {
        Some(receipt) if !receipt.success => Err(BridgeError::SourceReverted {
            chain: client.chain(),
            tx_hash: message.source_tx_hash(),
        }),
        _ => Ok(()),
    }
}

/// How a prove/finalize transaction ended.
enum FollowUp {
    Confirmed,
    /// Our transaction reverted because another account advanced the message first.
    Superseded,
    Halted(Halt),
}

/// Waits for a prove/finalize transaction's own receipt.
///
/// A reverted receipt is only an error when the message has not reached
/// `advanced` since; otherwise someone else's transaction won the race.
#[allow(clippy::too_many_arguments)]
async fn confirm_follow_up<C: ChainClient + ?Sized>(
    waiter: &StatusWaiter,
    client: &C,
    step: &'static str,
    tx_hash: B256,
    message: &mut BridgeMessage,
    advanced: Status,
    policy: &WaitPolicy,
    cancel: &CancellationToken,
) -> Result<FollowUp, BridgeError> {
    match waiter
        .wait_for_receipt(
            client,
            tx_hash,
            policy.poll_interval,
            policy.confirmation_timeout,
            cancel,
        )
        .await
    {
        WaitOutcome::Reached(receipt) if receipt.success => Ok(FollowUp::Confirmed),
        WaitOutcome::Reached(_) => match waiter.resolver().resolve(message).await {
            Ok(status) if status >= advanced => {
                message.observe(status);
                tracing::info!(
                    tx = %tx_hash,
                    step,
                    %status,
                    "follow-up reverted, message was already advanced by another account"
                );
                Ok(FollowUp::Superseded)
            }
            Ok(status) => {
                message.observe(status);
                Err(BridgeError::FollowUpReverted {
                    step,
                    chain: client.chain(),
                    tx_hash,
                })
            }
            Err(err) => {
                tracing::warn!(tx = %tx_hash, step, %err, "follow-up reverted and status is unreadable");
                Ok(FollowUp::Halted(Halt::TimedOut(advanced)))
            }
        },
        WaitOutcome::TimedOut { .. } => Ok(FollowUp::Halted(Halt::TimedOut(advanced))),
        WaitOutcome::Cancelled { .. } => Ok(FollowUp::Halted(Halt::Cancelled)),
    }
}

/// Consecutive-failure budget for one-shot reads between stages.
///
/// Shares the waiter's limit so a flaky endpoint ends a flow the same way
/// whether it fails during a wait or between two of them.
struct RetryBudget {
    failures: u32,
    max: u32,
}

impl RetryBudget {
    fn new(waiter: &StatusWaiter) -> Self {
        Self {
            failures: 0,
            max: waiter.max_consecutive_failures(),
        }
    }

    /// Absorbs a `ChainUnavailable` and naps before the next attempt.
    /// Any other error is passed back; `Some(halt)` ends the flow resumably.
    async fn absorb(
        &mut self,
        err: BridgeError,
        message: &BridgeMessage,
        waiting_for: Status,
        poll_interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<Option<Halt>, BridgeError> {
        let BridgeError::ChainUnavailable { .. } = err else {
            return Err(err);
        };
        self.failures += 1;
        tracing::warn!(
            tx = %message.source_tx_hash(),
            %err,
            failures = self.failures,
            max = self.max,
            "chain read failed, retrying"
        );
        if self.failures >= self.max {
            return Ok(Some(Halt::TimedOut(waiting_for)));
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(Some(Halt::Cancelled)),
            _ = tokio::time::sleep(poll_interval) => Ok(None),
        }
    }
}

/// `ensure_source_succeeded` with transient read failures retried.
async fn check_source<C: ChainClient + ?Sized>(
    waiter: &StatusWaiter,
    client: &C,
    message: &BridgeMessage,
    waiting_for: Status,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<Option<Halt>, BridgeError> {
    let mut budget = RetryBudget::new(waiter);
    loop {
        match ensure_source_succeeded(client, message).await {
            Ok(()) => return Ok(None),
            Err(err) => {
                if let Some(halt) = budget
                    .absorb(err, message, waiting_for, poll_interval, cancel)
                    .await?
                {
                    return Ok(Some(halt));
                }
            }
        }
    }
}

/// Maps a submission error, treating known "already done" reverts as progress.
fn classify_submission(
    step: &'static str,
    already_done: &[&str],
    message: &BridgeMessage,
    chain: Chain,
    err: ChainError,
) -> BridgeError {
    if let ChainError::Rejected { reason } = &err {
        let reason = reason.to_ascii_lowercase();
        if already_done.iter().any(|marker| reason.contains(marker)) {
            return BridgeError::AlreadyProgressed { step };
        }
    }
    BridgeError::SubmissionFailed {
        chain,
        tx_hash: Some(message.source_tx_hash()),
        last_status: Some(message.status()),
        source: err,
    }
}
