use super::{cancel_on_ctrl_c, print_progress, Bridge};
use crate::cli::{GlobalArgs, ResumeArgs};
use crate::config::Config;
use crate::lifecycle::BridgeMessage;
use crate::types::{parse_b256, parse_u256, Chain};
use anyhow::Result;
use tokio::time::Instant;

/// Continue a flow from its source transaction hash. Nothing already on
/// chain is submitted again; the current status is read back first.
pub async fn run(args: ResumeArgs, config: Config, global: GlobalArgs) -> Result<()> {
    let tx_hash = parse_b256(&args.tx)?;
    let amount = parse_u256(&args.amount)?;
    let asset = args.token.asset()?;
    let bridge = Bridge::connect(&config, &global).await?;
    if args.from == Chain::L2 {
        // proving and finalizing sign on L1
        bridge.account("resume withdrawal")?;
    }

    let message = BridgeMessage::submitted(args.from, tx_hash, amount, asset);
    let cancel = cancel_on_ctrl_c();
    let started = Instant::now();
    let progress = match args.from {
        Chain::L1 => bridge.deposits().resume(message, &cancel).await?,
        Chain::L2 => bridge.withdrawals().resume(message, &cancel).await?,
    };
    print_progress(&bridge, &progress, started.elapsed(), args.json)
}
