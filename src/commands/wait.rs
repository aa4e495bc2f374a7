use super::{cancel_on_ctrl_c, Bridge};
use crate::cli::{GlobalArgs, WaitArgs};
use crate::config::Config;
use crate::lifecycle::{BridgeMessage, Status, WaitOutcome};
use crate::types::{parse_b256, AssetKind};
use alloy_primitives::U256;
use anyhow::Result;
use std::time::Duration;
use tokio::time::Instant;

/// Block until a message reaches `--until` or a later status. Submits nothing.
pub async fn run(args: WaitArgs, config: Config, global: GlobalArgs) -> Result<()> {
    let tx_hash = parse_b256(&args.tx)?;
    let target: Status = args.until.parse()?;
    let bridge = Bridge::connect(&config, &global).await?;

    let policy = bridge.pair.wait;
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(policy.challenge_timeout);
    let message = BridgeMessage::submitted(args.from, tx_hash, U256::ZERO, AssetKind::Native);
    let cancel = cancel_on_ctrl_c();
    let started = Instant::now();

    let outcome = bridge
        .waiter()
        .wait_for(&message, target, policy.poll_interval, timeout, &cancel)
        .await;
    let elapsed = started.elapsed().as_secs();
    match outcome {
        WaitOutcome::Reached(status) => {
            println!("reached {status} after {elapsed}s");
            Ok(())
        }
        WaitOutcome::Cancelled { last_status } => {
            println!("cancelled after {elapsed}s, last status {}", describe(last_status));
            Ok(())
        }
        WaitOutcome::TimedOut {
            last_status,
            consecutive_failures,
        } => anyhow::bail!(
            "timed out after {elapsed}s waiting for {target} (last status {}, {consecutive_failures} consecutive rpc failures)",
            describe(last_status)
        ),
    }
}

fn describe(status: Option<Status>) -> String {
    status
        .map(|status| status.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
