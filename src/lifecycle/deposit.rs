use super::{
    check_source, stage, BridgeMessage, Progress, Status, StatusWaiter, WaitOutcome,
    WaitPolicy,
};
use crate::abi::{encode_approve_call, encode_deposit_erc20_call, encode_deposit_eth_call};
use crate::chain::{SettlementChain, TxRequest};
use crate::error::{BridgeError, ChainError};
use crate::types::{AssetKind, Chain};
use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Drives an L1 → L2 transfer from submission to relay on L2.
pub struct DepositOrchestrator {
    l1: Arc<dyn SettlementChain>,
    waiter: StatusWaiter,
    l1_standard_bridge: Address,
    min_gas_limit: u32,
    policy: WaitPolicy,
}

impl DepositOrchestrator {
    pub fn new(
        l1: Arc<dyn SettlementChain>,
        waiter: StatusWaiter,
        l1_standard_bridge: Address,
        min_gas_limit: u32,
        policy: WaitPolicy,
    ) -> Self {
        Self {
            l1,
            waiter,
            l1_standard_bridge,
            min_gas_limit,
            policy,
        }
    }

    pub async fn deposit(
        &self,
        amount: U256,
        asset: AssetKind,
        recipient: Address,
        cancel: &CancellationToken,
    ) -> Result<Progress, BridgeError> {
        let started = Instant::now();
        let request = match asset {
            AssetKind::Native => TxRequest::call(
                self.l1_standard_bridge,
                encode_deposit_eth_call(recipient, self.min_gas_limit),
            )
            .with_value(amount),
            AssetKind::Token {
                l1_address,
                l2_address,
            } => {
                self.approve(l1_address, amount, cancel).await?;
                TxRequest::call(
                    self.l1_standard_bridge,
                    encode_deposit_erc20_call(
                        l1_address,
                        l2_address,
                        recipient,
                        amount,
                        self.min_gas_limit,
                    ),
                )
            }
        };

        let tx_hash = self
            .l1
            .submit(request)
            .await
            .map_err(|source| BridgeError::SubmissionFailed {
                chain: Chain::L1,
                tx_hash: None,
                last_status: None,
                source,
            })?;
        tracing::info!(tx = %tx_hash, %amount, %asset, to = %recipient, "deposit submitted on L1");

        let message = BridgeMessage::submitted(Chain::L1, tx_hash, amount, asset);
        self.drive(message, started, cancel).await
    }

    /// Continues tracking a deposit that was submitted earlier.
    pub async fn resume(
        &self,
        message: BridgeMessage,
        cancel: &CancellationToken,
    ) -> Result<Progress, BridgeError> {
        if !message.is_deposit() {
            return Err(BridgeError::WrongDirection {
                expected: Chain::L1,
                found: message.source_chain(),
            });
        }
        self.drive(message, Instant::now(), cancel).await
    }

    async fn drive(
        &self,
        mut message: BridgeMessage,
        started: Instant,
        cancel: &CancellationToken,
    ) -> Result<Progress, BridgeError> {
        let policy = self.policy;

        if let Some(halt) = stage(
            &self.waiter,
            &mut message,
            Status::Unconfirmed,
            policy.poll_interval,
            policy.confirmation_timeout,
            started,
            cancel,
        )
        .await
        {
            return Ok(halt.into_progress(message));
        }
        if let Some(halt) = check_source(
            &self.waiter,
            self.l1.as_ref(),
            &message,
            Status::Relayed,
            policy.poll_interval,
            cancel,
        )
        .await?
        {
            return Ok(halt.into_progress(message));
        }
        tracing::info!(
            tx = %message.source_tx_hash(),
            elapsed_secs = started.elapsed().as_secs(),
            "deposit confirmed on L1"
        );

        if let Some(halt) = stage(
            &self.waiter,
            &mut message,
            Status::Relayed,
            policy.poll_interval,
            policy.relay_timeout,
            started,
            cancel,
        )
        .await
        {
            return Ok(halt.into_progress(message));
        }
        tracing::info!(
            tx = %message.source_tx_hash(),
            elapsed_secs = started.elapsed().as_secs(),
            "deposit relayed on L2"
        );
        Ok(Progress::Complete(message))
    }

    async fn approve(
        &self,
        token: Address,
        amount: U256,
        cancel: &CancellationToken,
    ) -> Result<(), BridgeError> {
        let tx_hash = self
            .l1
            .submit(TxRequest::call(
                token,
                encode_approve_call(self.l1_standard_bridge, amount),
            ))
            .await
            .map_err(|source| BridgeError::SubmissionFailed {
                chain: Chain::L1,
                tx_hash: None,
                last_status: None,
                source,
            })?;
        tracing::info!(tx = %tx_hash, %token, %amount, "approval submitted");

        match self
            .waiter
            .wait_for_receipt(
                self.l1.as_ref(),
                tx_hash,
                self.policy.poll_interval,
                self.policy.confirmation_timeout,
                cancel,
            )
            .await
        {
            WaitOutcome::Reached(receipt) if receipt.success => Ok(()),
            WaitOutcome::Reached(_) => Err(BridgeError::SubmissionFailed {
                chain: Chain::L1,
                tx_hash: Some(tx_hash),
                last_status: None,
                source: ChainError::Rejected {
                    reason: "approve reverted".to_string(),
                },
            }),
            WaitOutcome::TimedOut { .. } => Err(BridgeError::ApprovalIncomplete {
                tx_hash,
                reason: "timed out",
            }),
            WaitOutcome::Cancelled { .. } => Err(BridgeError::ApprovalIncomplete {
                tx_hash,
                reason: "cancelled",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_policy, SimChains, CONTRACTS, TOKEN_L1, TOKEN_L2, USER};
    use std::time::Duration;

    const ONE_GWEI: u64 = 1_000_000_000;

    fn orchestrator(sim: &SimChains) -> DepositOrchestrator {
        DepositOrchestrator::new(
            sim.l1(),
            StatusWaiter::new(sim.resolver()),
            CONTRACTS.l1_standard_bridge,
            200_000,
            test_policy(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn native_deposit_credits_exact_amount() {
        let sim = SimChains::new();
        let deposits = orchestrator(&sim);
        let before = sim.balance(Chain::L2, USER);
        let driver = sim.spawn_driver(Duration::from_secs(2));

        let progress = deposits
            .deposit(U256::from(ONE_GWEI), AssetKind::Native, USER, &CancellationToken::new())
            .await
            .unwrap();
        driver.abort();

        let Progress::Complete(message) = progress else {
            panic!("deposit did not complete: {progress:?}");
        };
        assert_eq!(message.status(), Status::Relayed);
        assert_eq!(sim.balance(Chain::L2, USER), before + U256::from(ONE_GWEI));
    }

    #[tokio::test(start_paused = true)]
    async fn token_deposit_approves_first() {
        let sim = SimChains::new();
        let deposits = orchestrator(&sim);
        let amount = U256::from(250u64);
        let l1_before = sim.token_balance(Chain::L1, TOKEN_L1, USER);
        let driver = sim.spawn_driver(Duration::from_secs(2));

        let asset = AssetKind::Token {
            l1_address: TOKEN_L1,
            l2_address: TOKEN_L2,
        };
        let progress = deposits
            .deposit(amount, asset, USER, &CancellationToken::new())
            .await
            .unwrap();
        driver.abort();

        assert!(matches!(progress, Progress::Complete(_)));
        assert_eq!(sim.submission_count(Chain::L1), 2);
        assert_eq!(sim.token_balance(Chain::L1, TOKEN_L1, USER), l1_before - amount);
        assert_eq!(sim.token_balance(Chain::L2, TOKEN_L2, USER), amount);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_submission_is_fatal() {
        let sim = SimChains::new();
        let deposits = orchestrator(&sim);
        sim.reject_next_submission(Chain::L1, "insufficient funds for gas * price + value");

        let err = deposits
            .deposit(U256::from(ONE_GWEI), AssetKind::Native, USER, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::SubmissionFailed {
                chain: Chain::L1,
                tx_hash: None,
                source: ChainError::Rejected { .. },
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn reverted_source_is_fatal() {
        let sim = SimChains::new();
        let deposits = orchestrator(&sim);
        sim.revert_next_submission(Chain::L1);
        let driver = sim.spawn_driver(Duration::from_secs(2));

        let err = deposits
            .deposit(U256::from(ONE_GWEI), AssetKind::Native, USER, &CancellationToken::new())
            .await
            .unwrap_err();
        driver.abort();
        assert!(matches!(err, BridgeError::SourceReverted { chain: Chain::L1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_resumable_without_resubmitting() {
        let sim = SimChains::new();
        let deposits = orchestrator(&sim);

        let progress = deposits
            .deposit(U256::from(ONE_GWEI), AssetKind::Native, USER, &CancellationToken::new())
            .await
            .unwrap();
        let Progress::TimedOut {
            message,
            waiting_for,
        } = progress
        else {
            panic!("expected a timeout: {progress:?}");
        };
        assert_eq!(waiting_for, Status::Unconfirmed);
        assert_eq!(message.status(), Status::Submitted);

        sim.mine_l1();
        sim.relay_deposits();
        let resumed = deposits.resume(message, &CancellationToken::new()).await.unwrap();
        assert_eq!(resumed.message().status(), Status::Relayed);
        assert_eq!(sim.submission_count(Chain::L1), 1);
    }

    /// A deposit mined on L1 but not yet relayed, as left by a timed out run.
    async fn mined_deposit(sim: &SimChains) -> BridgeMessage {
        let progress = orchestrator(sim)
            .deposit(U256::from(ONE_GWEI), AssetKind::Native, USER, &CancellationToken::new())
            .await
            .unwrap();
        sim.mine_l1();
        progress.message().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn source_check_survives_a_brief_outage() {
        let sim = SimChains::new();
        let message = mined_deposit(&sim).await;
        // the first read classifies the receipt, the next two hit the source check
        sim.fail_reads_after(Chain::L1, 1, 2);
        let driver = sim.spawn_driver(Duration::from_secs(2));

        let progress = orchestrator(&sim)
            .resume(message, &CancellationToken::new())
            .await
            .unwrap();
        driver.abort();

        let Progress::Complete(message) = progress else {
            panic!("deposit did not complete: {progress:?}");
        };
        assert_eq!(message.status(), Status::Relayed);
        assert_eq!(sim.submission_count(Chain::L1), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_outage_after_submission_is_resumable() {
        let sim = SimChains::new();
        let message = mined_deposit(&sim).await;
        let source_tx = message.source_tx_hash();
        sim.fail_reads_after(Chain::L1, 1, u32::MAX);
        let deposits = DepositOrchestrator::new(
            sim.l1(),
            StatusWaiter::new(sim.resolver()).with_max_consecutive_failures(3),
            CONTRACTS.l1_standard_bridge,
            200_000,
            test_policy(),
        );

        let progress = deposits
            .resume(message, &CancellationToken::new())
            .await
            .unwrap();
        let Progress::TimedOut {
            message,
            waiting_for,
        } = progress
        else {
            panic!("expected a resumable timeout: {progress:?}");
        };
        assert_eq!(waiting_for, Status::Relayed);
        assert_eq!(message.source_tx_hash(), source_tx);
        assert_eq!(message.status(), Status::Unconfirmed);
        assert_eq!(sim.submission_count(Chain::L1), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_keeps_last_status() {
        let sim = SimChains::new();
        let deposits = orchestrator(&sim);
        let cancel = CancellationToken::new();
        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                cancel.cancel();
            })
        };

        let progress = deposits
            .deposit(U256::from(ONE_GWEI), AssetKind::Native, USER, &cancel)
            .await
            .unwrap();
        canceller.await.unwrap();
        let Progress::Cancelled(message) = progress else {
            panic!("expected cancellation: {progress:?}");
        };
        assert_eq!(message.status(), Status::Submitted);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_deposits_progress_independently() {
        let sim = SimChains::new();
        let deposits = orchestrator(&sim);
        let before = sim.balance(Chain::L2, USER);
        let driver = sim.spawn_driver(Duration::from_secs(2));
        let cancel = CancellationToken::new();

        let (first, second) = tokio::join!(
            deposits.deposit(U256::from(ONE_GWEI), AssetKind::Native, USER, &cancel),
            deposits.deposit(U256::from(2 * ONE_GWEI), AssetKind::Native, USER, &cancel),
        );
        driver.abort();

        let first = first.unwrap().message().clone();
        let second = second.unwrap().message().clone();
        assert_ne!(first.source_tx_hash(), second.source_tx_hash());
        assert_eq!(first.status(), Status::Relayed);
        assert_eq!(second.status(), Status::Relayed);
        assert_eq!(sim.balance(Chain::L2, USER), before + U256::from(3 * ONE_GWEI));
    }

    #[tokio::test]
    async fn resume_rejects_withdrawals() {
        let sim = SimChains::new();
        let deposits = orchestrator(&sim);
        let message = BridgeMessage::submitted(
            Chain::L2,
            alloy_primitives::B256::repeat_byte(9),
            U256::from(1u64),
            AssetKind::Native,
        );
        let err = deposits.resume(message, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, BridgeError::WrongDirection { expected: Chain::L1, .. }));
    }
}
