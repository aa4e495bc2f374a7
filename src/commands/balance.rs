use super::Bridge;
use crate::cli::{BalanceArgs, GlobalArgs};
use crate::config::Config;
use crate::report::ConsoleReporter;
use crate::types::parse_address;
use anyhow::Result;

pub async fn run(args: BalanceArgs, config: Config, global: GlobalArgs) -> Result<()> {
    let asset = args.token.asset()?;
    let bridge = Bridge::connect(&config, &global).await?;
    let owner = match args.address.as_deref() {
        Some(address) => parse_address(address)?,
        None => bridge.account("balance without --address")?,
    };

    let mut reporter = ConsoleReporter::new(args.json);
    bridge
        .report_balances(&mut reporter, "balance", owner, asset)
        .await?;
    Ok(())
}
