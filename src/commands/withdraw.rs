use super::{cancel_on_ctrl_c, print_progress, Bridge};
use crate::cli::{GlobalArgs, TransferArgs};
use crate::config::Config;
use crate::report::ConsoleReporter;
use crate::types::{parse_address, parse_u256};
use anyhow::Result;
use tokio::time::Instant;

/// Bridge from L2 to L1: initiate, prove, wait out the challenge period and
/// finalize, in one run.
pub async fn run(args: TransferArgs, config: Config, global: GlobalArgs) -> Result<()> {
    let amount = parse_u256(&args.amount)?;
    let asset = args.token.asset()?;
    let bridge = Bridge::connect(&config, &global).await?;
    let account = bridge.account("withdraw")?;
    let recipient = match args.to.as_deref() {
        Some(to) => parse_address(to)?,
        None => account,
    };

    let mut reporter = ConsoleReporter::new(args.json);
    bridge
        .report_balances(&mut reporter, "before", recipient, asset)
        .await?;

    let cancel = cancel_on_ctrl_c();
    let started = Instant::now();
    let progress = bridge
        .withdrawals()
        .withdraw(amount, asset, recipient, &cancel)
        .await?;

    bridge
        .report_balances(&mut reporter, "after", recipient, asset)
        .await?;
    print_progress(&bridge, &progress, started.elapsed(), args.json)
}
