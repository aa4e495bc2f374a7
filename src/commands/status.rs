use super::Bridge;
use crate::cli::{GlobalArgs, StatusArgs};
use crate::config::Config;
use crate::lifecycle::BridgeMessage;
use crate::types::{parse_b256, AssetKind, Chain, StatusOutput};
use alloy_primitives::U256;
use anyhow::Result;

/// One-shot classification of a message from its source transaction.
pub async fn run(args: StatusArgs, config: Config, global: GlobalArgs) -> Result<()> {
    let tx_hash = parse_b256(&args.tx)?;
    let bridge = Bridge::connect(&config, &global).await?;
    let resolver = bridge.resolver();

    let message = BridgeMessage::submitted(args.from, tx_hash, U256::ZERO, AssetKind::Native);
    let status = resolver.resolve(&message).await?;
    // finality data only matters for withdrawals
    let state = match args.from {
        Chain::L1 => None,
        Chain::L2 => Some(resolver.chain_state().await?),
    };

    let output = StatusOutput {
        source_chain: args.from,
        source_tx_hash: format!("{tx_hash:#x}"),
        status: status.to_string(),
        l1_timestamp: state.map(|state| state.l1_timestamp),
        committed_height: state.map(|state| state.committed_height),
        challenge_period_seconds: state.map(|state| state.challenge_period_seconds),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("source: {} {}", output.source_chain, output.source_tx_hash);
    println!("status: {}", output.status);
    if status.is_terminal() {
        println!("delivered on {}", message.destination());
    }
    if let Some(state) = state {
        println!("l1 timestamp: {}", state.l1_timestamp);
        println!("committed L2 height: {}", state.committed_height);
        println!("challenge period: {}s", state.challenge_period_seconds);
    }
    if let Some(link) = bridge.explorer_link(args.from, tx_hash) {
        println!("explorer: {link}");
    }
    Ok(())
}
