use super::{BridgeMessage, MessageStatusResolver, Status};
use crate::chain::{ChainClient, Receipt};
use crate::error::BridgeError;
use alloy_primitives::B256;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome<T = Status> {
    /// The target (or something past it) was observed.
    Reached(T),
    /// The budget ran out, either in time or in consecutive failed polls.
    TimedOut {
        last_status: Option<Status>,
        consecutive_failures: u32,
    },
    /// The caller's token fired; polling stopped at once.
    Cancelled { last_status: Option<Status> },
}

impl<T> WaitOutcome<T> {
    pub fn last_status(&self) -> Option<Status>
    where
        T: Into<Option<Status>> + Copy,
    {
        match self {
            WaitOutcome::Reached(value) => (*value).into(),
            WaitOutcome::TimedOut { last_status, .. } | WaitOutcome::Cancelled { last_status } => {
                *last_status
            }
        }
    }
}

/// Repeatedly resolves a message until it reaches a target status.
///
/// The only suspension point is the sleep between polls. Transient RPC errors
/// are retried on the next tick; `max_consecutive_failures` bounds how many in
/// a row are tolerated before the wait gives up as timed out.
#[derive(Clone)]
pub struct StatusWaiter {
    resolver: MessageStatusResolver,
    max_consecutive_failures: u32,
}

impl StatusWaiter {
    pub fn new(resolver: MessageStatusResolver) -> Self {
        Self {
            resolver,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }

    pub fn with_max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = max.max(1);
        self
    }

    pub fn max_consecutive_failures(&self) -> u32 {
        self.max_consecutive_failures
    }

    pub fn resolver(&self) -> &MessageStatusResolver {
        &self.resolver
    }

    /// Waits until `message` resolves to `target` or any later status.
    ///
    /// The message itself is never touched; callers record the outcome's
    /// status if they want to keep it.
    pub async fn wait_for(
        &self,
        message: &BridgeMessage,
        target: Status,
        poll_interval: Duration,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let mut last_status = None;
        let mut failures = 0u32;

        loop {
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled { last_status };
            }

            match self.resolver.resolve(message).await {
                Ok(status) => {
                    failures = 0;
                    if last_status != Some(status) {
                        tracing::debug!(tx = %message.source_tx_hash(), %status, %target, "polled message status");
                    }
                    last_status = Some(status);
                    if status >= target {
                        return WaitOutcome::Reached(status);
                    }
                }
                Err(err @ BridgeError::ChainUnavailable { .. }) => {
                    failures += 1;
                    tracing::warn!(
                        tx = %message.source_tx_hash(),
                        %err,
                        failures,
                        max = self.max_consecutive_failures,
                        "status poll failed, retrying"
                    );
                    if failures >= self.max_consecutive_failures {
                        return WaitOutcome::TimedOut {
                            last_status,
                            consecutive_failures: failures,
                        };
                    }
                }
                Err(err) => {
                    // resolve only reports chain availability problems today
                    tracing::error!(tx = %message.source_tx_hash(), %err, "unexpected resolver error");
                    failures += 1;
                    if failures >= self.max_consecutive_failures {
                        return WaitOutcome::TimedOut {
                            last_status,
                            consecutive_failures: failures,
                        };
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut {
                    last_status,
                    consecutive_failures: failures,
                };
            }
            let nap = poll_interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return WaitOutcome::Cancelled { last_status },
                _ = tokio::time::sleep(nap) => {}
            }
        }
    }

    /// Waits for an auxiliary transaction (e.g. a token approval) to be mined.
    pub async fn wait_for_receipt<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        tx_hash: B256,
        poll_interval: Duration,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> WaitOutcome<Receipt> {
        let deadline = Instant::now() + timeout;
        let mut failures = 0u32;

        loop {
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled { last_status: None };
            }

            match client.get_receipt(tx_hash).await {
                Ok(Some(receipt)) => return WaitOutcome::Reached(receipt),
                Ok(None) => failures = 0,
                Err(err) => {
                    failures += 1;
                    tracing::warn!(chain = %client.chain(), tx = %tx_hash, %err, failures, "receipt poll failed");
                    if failures >= self.max_consecutive_failures {
                        return WaitOutcome::TimedOut {
                            last_status: None,
                            consecutive_failures: failures,
                        };
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut {
                    last_status: None,
                    consecutive_failures: failures,
                };
            }
            let nap = poll_interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return WaitOutcome::Cancelled { last_status: None },
                _ = tokio::time::sleep(nap) => {}
            }
        }
    }
}
