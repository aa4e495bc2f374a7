use super::{cancel_on_ctrl_c, print_tx, Bridge};
use crate::cli::{GlobalArgs, StepArgs};
use crate::config::Config;
use crate::error::BridgeError;
use crate::lifecycle::{BridgeMessage, Status, WaitOutcome};
use crate::types::{parse_b256, AssetKind, Chain};
use alloy_primitives::{B256, U256};
use anyhow::Result;

/// Submit the proof for a single withdrawal without driving the rest of it.
pub async fn run(args: StepArgs, config: Config, global: GlobalArgs) -> Result<()> {
    let tx_hash = parse_b256(&args.tx)?;
    let bridge = Bridge::connect(&config, &global).await?;
    bridge.account("prove")?;

    let mut message = BridgeMessage::submitted(Chain::L2, tx_hash, U256::ZERO, AssetKind::Native);
    let proof_tx = match bridge.withdrawals().prove(&mut message).await {
        Ok(hash) => hash,
        Err(BridgeError::AlreadyProgressed { .. }) => {
            println!("withdrawal already proven, status {}", message.status());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    print_tx(&bridge, "prove", Chain::L1, proof_tx);
    if args.no_wait {
        return Ok(());
    }
    confirm(&bridge, "prove", proof_tx, &message, Status::InChallengePeriod).await
}

/// Waits for a follow-up transaction on L1. A revert fails unless the
/// message has since reached `advanced` through someone else's transaction.
pub(super) async fn confirm(
    bridge: &Bridge,
    step: &'static str,
    tx_hash: B256,
    message: &BridgeMessage,
    advanced: Status,
) -> Result<()> {
    let policy = bridge.pair.wait;
    let cancel = cancel_on_ctrl_c();
    let outcome = bridge
        .waiter()
        .wait_for_receipt(
            bridge.l1.as_ref(),
            tx_hash,
            policy.poll_interval,
            policy.confirmation_timeout,
            &cancel,
        )
        .await;
    match outcome {
        WaitOutcome::Reached(receipt) if receipt.success => {
            println!("{step} confirmed in L1 block {}", receipt.block_number);
            Ok(())
        }
        WaitOutcome::Reached(_) => {
            let status = bridge.resolver().resolve(message).await?;
            if status >= advanced {
                println!("{step} reverted, but the withdrawal is already {status}");
                return Ok(());
            }
            Err(BridgeError::FollowUpReverted {
                step,
                chain: Chain::L1,
                tx_hash,
            }
            .into())
        }
        WaitOutcome::TimedOut { .. } => {
            anyhow::bail!("{step} transaction {tx_hash:#x} not mined yet, check later with `status`")
        }
        WaitOutcome::Cancelled { .. } => Ok(()),
    }
}
