use super::prove::confirm;
use super::{print_tx, Bridge};
use crate::cli::{GlobalArgs, StepArgs};
use crate::config::Config;
use crate::error::BridgeError;
use crate::lifecycle::{BridgeMessage, Status};
use crate::types::{parse_b256, AssetKind, Chain};
use alloy_primitives::U256;
use anyhow::Result;

/// Finalize a proven withdrawal once its challenge period has passed.
pub async fn run(args: StepArgs, config: Config, global: GlobalArgs) -> Result<()> {
    let tx_hash = parse_b256(&args.tx)?;
    let bridge = Bridge::connect(&config, &global).await?;
    bridge.account("finalize")?;

    let mut message = BridgeMessage::submitted(Chain::L2, tx_hash, U256::ZERO, AssetKind::Native);
    let finalize_tx = match bridge.withdrawals().finalize(&mut message).await {
        Ok(hash) => hash,
        Err(BridgeError::AlreadyProgressed { .. }) => {
            println!("withdrawal already finalized");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    print_tx(&bridge, "finalize", Chain::L1, finalize_tx);
    if args.no_wait {
        return Ok(());
    }
    confirm(&bridge, "finalize", finalize_tx, &message, Status::Relayed).await
}
