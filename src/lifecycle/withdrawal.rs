use super::{
    check_source, classify_submission, confirm_follow_up, stage, BridgeMessage, FollowUp, Halt,
    Progress, ProofRef, RetryBudget, Status, StatusWaiter, WaitPolicy,
};
use crate::abi::{
    encode_finalize_call, encode_prove_call, encode_withdraw_call, withdrawal_from_logs,
    OutputRootProof, PassedWithdrawal,
};
use crate::chain::{RollupChain, SettlementChain, TxRequest};
use crate::config::ContractAddresses;
use crate::error::BridgeError;
use crate::types::{AssetKind, Chain, LEGACY_ERC20_ETH};
use alloy_primitives::{Address, B256, U256};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const ALREADY_PROVEN: &[&str] = &["already been proven", "already proven"];
const ALREADY_FINALIZED: &[&str] = &["already been finalized", "already finalized"];

/// Drives an L2 → L1 transfer: initiation, proof, challenge period and
/// finalization.
///
/// `prove` and `finalize` are usable on their own; both re-resolve the message
/// first and refuse to act out of order.
pub struct WithdrawalOrchestrator {
    l1: Arc<dyn SettlementChain>,
    l2: Arc<dyn RollupChain>,
    waiter: StatusWaiter,
    contracts: ContractAddresses,
    min_gas_limit: u32,
    policy: WaitPolicy,
}

impl WithdrawalOrchestrator {
    pub fn new(
        l1: Arc<dyn SettlementChain>,
        l2: Arc<dyn RollupChain>,
        waiter: StatusWaiter,
        contracts: ContractAddresses,
        min_gas_limit: u32,
        policy: WaitPolicy,
    ) -> Self {
        Self {
            l1,
            l2,
            waiter,
            contracts,
            min_gas_limit,
            policy,
        }
    }

    pub async fn withdraw(
        &self,
        amount: U256,
        asset: AssetKind,
        recipient: Address,
        cancel: &CancellationToken,
    ) -> Result<Progress, BridgeError> {
        let started = Instant::now();
        let (l2_token, value) = match asset.token_on(Chain::L2) {
            Some(token) => (token, U256::ZERO),
            None => (LEGACY_ERC20_ETH, amount),
        };
        let request = TxRequest::call(
            self.contracts.l2_standard_bridge,
            encode_withdraw_call(l2_token, recipient, amount, self.min_gas_limit),
        )
        .with_value(value);

        let tx_hash = self
            .l2
            .submit(request)
            .await
            .map_err(|source| BridgeError::SubmissionFailed {
                chain: Chain::L2,
                tx_hash: None,
                last_status: None,
                source,
            })?;
        tracing::info!(tx = %tx_hash, %amount, %asset, to = %recipient, "withdrawal submitted on L2");

        let message = BridgeMessage::submitted(Chain::L2, tx_hash, amount, asset);
        self.drive(message, started, cancel).await
    }

    /// Continues a withdrawal from whatever status the chains report now.
    pub async fn resume(
        &self,
        message: BridgeMessage,
        cancel: &CancellationToken,
    ) -> Result<Progress, BridgeError> {
        self.check_direction(&message)?;
        self.drive(message, Instant::now(), cancel).await
    }

    /// Submits the withdrawal proof on L1 and returns its transaction hash.
    ///
    /// Returns `AlreadyProgressed` when the withdrawal is proven already,
    /// whether observed before submitting or reported by the portal's revert.
    pub async fn prove(&self, message: &mut BridgeMessage) -> Result<B256, BridgeError> {
        const STEP: &str = "prove";
        self.check_direction(message)?;

        let status = self.waiter.resolver().resolve(message).await?;
        message.observe(status);
        if status < Status::ReadyToProve {
            return Err(BridgeError::NotReady { step: STEP, status });
        }
        let (withdrawal, l2_block) = self.load_withdrawal(message).await?;
        if status > Status::ReadyToProve {
            self.adopt_existing_proof(message, withdrawal.withdrawal_hash)
                .await?;
            return Err(BridgeError::AlreadyProgressed { step: STEP });
        }

        let output = self
            .l1
            .get_output_after(l2_block)
            .await
            .map_err(BridgeError::unavailable(Chain::L1))?
            .ok_or(BridgeError::OutputNotPublished { l2_block })?;
        let proof = self
            .l2
            .get_withdrawal_proof(withdrawal.withdrawal_hash, output.l2_block_number)
            .await
            .map_err(BridgeError::unavailable(Chain::L2))?;
        tracing::debug!(
            withdrawal = %withdrawal.withdrawal_hash,
            output_index = %output.index,
            output_block = output.l2_block_number,
            proof_nodes = proof.storage_proof.len(),
            "built withdrawal proof"
        );

        let data = encode_prove_call(
            withdrawal.transaction,
            output.index,
            OutputRootProof {
                version: B256::ZERO,
                stateRoot: proof.state_root,
                messagePasserStorageRoot: proof.message_passer_storage_root,
                latestBlockhash: proof.block_hash,
            },
            proof.storage_proof,
        );
        let tx_hash = match self
            .l1
            .submit(TxRequest::call(self.contracts.optimism_portal, data))
            .await
        {
            Ok(tx_hash) => tx_hash,
            Err(err) => {
                let err = classify_submission(STEP, ALREADY_PROVEN, message, Chain::L1, err);
                if err.is_already_progressed() {
                    self.adopt_existing_proof(message, withdrawal.withdrawal_hash)
                        .await?;
                }
                return Err(err);
            }
        };

        message.proof = Some(ProofRef {
            tx_hash: Some(tx_hash),
            l2_output_index: output.index,
            proven_at: None,
        });
        tracing::info!(tx = %tx_hash, withdrawal = %withdrawal.withdrawal_hash, "proof submitted on L1");
        Ok(tx_hash)
    }

    /// Submits the finalization on L1 and returns its transaction hash.
    ///
    /// Only submits once the message resolves to `ReadyForRelay`.
    pub async fn finalize(&self, message: &mut BridgeMessage) -> Result<B256, BridgeError> {
        const STEP: &str = "finalize";
        self.check_direction(message)?;

        let status = self.waiter.resolver().resolve(message).await?;
        message.observe(status);
        if status == Status::Relayed {
            return Err(BridgeError::AlreadyProgressed { step: STEP });
        }
        if status < Status::ReadyForRelay {
            return Err(BridgeError::NotReady { step: STEP, status });
        }

        let (withdrawal, _) = self.load_withdrawal(message).await?;
        let tx_hash = self
            .l1
            .submit(TxRequest::call(
                self.contracts.optimism_portal,
                encode_finalize_call(withdrawal.transaction),
            ))
            .await
            .map_err(|err| classify_submission(STEP, ALREADY_FINALIZED, message, Chain::L1, err))?;

        message.finalize_tx_hash = Some(tx_hash);
        tracing::info!(tx = %tx_hash, withdrawal = %withdrawal.withdrawal_hash, "finalization submitted on L1");
        Ok(tx_hash)
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
            self.l2.as_ref(),
            &message,
            Status::ReadyToProve,
            policy.poll_interval,
            cancel,
        )
        .await?
        {
            return Ok(halt.into_progress(message));
        }

        if let Some(halt) = stage(
            &self.waiter,
            &mut message,
            Status::ReadyToProve,
            policy.poll_interval,
            policy.prove_timeout,
            started,
            cancel,
        )
        .await
        {
            return Ok(halt.into_progress(message));
        }

        if message.status() < Status::InChallengePeriod {
            if let Some(halt) = self.prove_and_confirm(&mut message, cancel).await? {
                return Ok(halt.into_progress(message));
            }
        }

        if let Some(halt) = stage(
            &self.waiter,
            &mut message,
            Status::InChallengePeriod,
            policy.poll_interval,
            policy.confirmation_timeout,
            started,
            cancel,
        )
        .await
        {
            return Ok(halt.into_progress(message));
        }
        if let Some(halt) = stage(
            &self.waiter,
            &mut message,
            Status::ReadyForRelay,
            policy.poll_interval,
            policy.challenge_timeout,
            started,
            cancel,
        )
        .await
        {
            return Ok(halt.into_progress(message));
        }

        if message.status() < Status::Relayed {
            if let Some(halt) = self.finalize_and_confirm(&mut message, cancel).await? {
                return Ok(halt.into_progress(message));
            }
        }

        if let Some(halt) = stage(
            &self.waiter,
            &mut message,
            Status::Relayed,
            policy.poll_interval,
            policy.confirmation_timeout,
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
            "withdrawal finalized on L1"
        );
        Ok(Progress::Complete(message))
    }

    /// Proves within a flow. Read failures before submission are retried,
    /// and losing the race to another prover adopts their proof.
    async fn prove_and_confirm(
        &self,
        message: &mut BridgeMessage,
        cancel: &CancellationToken,
    ) -> Result<Option<Halt>, BridgeError> {
        let policy = self.policy;
        let mut budget = RetryBudget::new(&self.waiter);
        let tx_hash = loop {
            match self.prove(message).await {
                Ok(tx_hash) => break tx_hash,
                Err(err) if err.is_already_progressed() => {
                    tracing::info!(tx = %message.source_tx_hash(), "withdrawal already proven, skipping proof");
                    return Ok(None);
                }
                Err(err) => {
                    if let Some(halt) = budget
                        .absorb(err, message, Status::InChallengePeriod, policy.poll_interval, cancel)
                        .await?
                    {
                        return Ok(Some(halt));
                    }
                }
            }
        };

        match confirm_follow_up(
            &self.waiter,
            self.l1.as_ref(),
            "prove",
            tx_hash,
            message,
            Status::InChallengePeriod,
            &policy,
            cancel,
        )
        .await?
        {
            FollowUp::Confirmed => Ok(None),
            FollowUp::Halted(halt) => Ok(Some(halt)),
            FollowUp::Superseded => {
                // our proof never landed
                message.proof = None;
                let mut budget = RetryBudget::new(&self.waiter);
                loop {
                    let adopted = match self.load_withdrawal(message).await {
                        Ok((withdrawal, _)) => {
                            self.adopt_existing_proof(message, withdrawal.withdrawal_hash)
                                .await
                        }
                        Err(err) => Err(err),
                    };
                    match adopted {
                        Ok(()) => return Ok(None),
                        Err(err) => {
                            if let Some(halt) = budget
                                .absorb(err, message, Status::InChallengePeriod, policy.poll_interval, cancel)
                                .await?
                            {
                                return Ok(Some(halt));
                            }
                        }
                    }
                }
            }
        }
    }

    /// Finalizes within a flow, retrying read failures before submission.
    async fn finalize_and_confirm(
        &self,
        message: &mut BridgeMessage,
        cancel: &CancellationToken,
    ) -> Result<Option<Halt>, BridgeError> {
        let policy = self.policy;
        let mut budget = RetryBudget::new(&self.waiter);
        let tx_hash = loop {
            match self.finalize(message).await {
                Ok(tx_hash) => break tx_hash,
                Err(err) if err.is_already_progressed() => {
                    tracing::info!(tx = %message.source_tx_hash(), "withdrawal already finalized, skipping finalization");
                    return Ok(None);
                }
                Err(err) => {
                    if let Some(halt) = budget
                        .absorb(err, message, Status::Relayed, policy.poll_interval, cancel)
                        .await?
                    {
                        return Ok(Some(halt));
                    }
                }
            }
        };

        match confirm_follow_up(
            &self.waiter,
            self.l1.as_ref(),
            "finalize",
            tx_hash,
            message,
            Status::Relayed,
            &policy,
            cancel,
        )
        .await?
        {
            FollowUp::Confirmed => Ok(None),
            FollowUp::Halted(halt) => Ok(Some(halt)),
            FollowUp::Superseded => {
                message.finalize_tx_hash = None;
                Ok(None)
            }
        }
    }

    fn check_direction(&self, message: &BridgeMessage) -> Result<(), BridgeError> {
        if message.is_deposit() {
            return Err(BridgeError::WrongDirection {
                expected: Chain::L2,
                found: message.source_chain(),
            });
        }
        Ok(())
    }

    /// Reads the initiated withdrawal back from its L2 receipt, with the
    /// block it was included in.
    async fn load_withdrawal(
        &self,
        message: &BridgeMessage,
    ) -> Result<(PassedWithdrawal, u64), BridgeError> {
        let tx_hash = message.source_tx_hash();
        let receipt = self
            .l2
            .get_receipt(tx_hash)
            .await
            .map_err(BridgeError::unavailable(Chain::L2))?
            .ok_or(BridgeError::NotReady {
                step: "read withdrawal",
                status: Status::Submitted,
            })?;
        let withdrawal = withdrawal_from_logs(&receipt.logs, self.contracts.l2_to_l1_message_passer)
            .ok_or(BridgeError::MissingBridgeEvent {
                chain: Chain::L2,
                tx_hash,
                event: "MessagePassed",
            })?;
        Ok((withdrawal, receipt.block_number))
    }

    /// Records a proof submitted by someone else so later steps can refer to it.
    async fn adopt_existing_proof(
        &self,
        message: &mut BridgeMessage,
        withdrawal_hash: B256,
    ) -> Result<(), BridgeError> {
        if message.proof.is_some() {
            return Ok(());
        }
        let proven = self
            .l1
            .get_proven_withdrawal(withdrawal_hash)
            .await
            .map_err(BridgeError::unavailable(Chain::L1))?;
        if let Some(proven) = proven {
            message.proof = Some(ProofRef {
                tx_hash: None,
                l2_output_index: proven.l2_output_index,
                proven_at: Some(proven.timestamp),
            });
        }
        Ok(())
    }
}
