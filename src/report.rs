use crate::chain::ChainClient;
use crate::error::ChainError;
use crate::types::{format_units, AssetKind, Chain};
use alloy_primitives::{Address, U256};
use anyhow::Result;
use serde::Serialize;

const NATIVE_DECIMALS: u32 = 18;

/// One balance observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceEntry {
    pub chain: Chain,
    pub address: Address,
    pub asset: AssetKind,
    pub balance: U256,
}

/// Sink for balance snapshots taken around a transfer.
pub trait BalanceReporter {
    fn report(&mut self, label: &str, entry: &BalanceEntry) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceLine<'a> {
    label: &'a str,
    chain: Chain,
    address: String,
    asset: AssetKind,
    /// Smallest unit, decimal.
    balance: String,
    formatted: Option<String>,
}

/// Prints balances to stdout, either as text or as JSON lines.
pub struct ConsoleReporter {
    json: bool,
}

impl ConsoleReporter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn render(&self, label: &str, entry: &BalanceEntry) -> Result<String> {
        // token decimals are not known here, so only the native asset is scaled
        let formatted = match entry.asset {
            AssetKind::Native => Some(format_units(entry.balance, NATIVE_DECIMALS)),
            AssetKind::Token { .. } => None,
        };
        if self.json {
            let line = BalanceLine {
                label,
                chain: entry.chain,
                address: format!("{:#x}", entry.address),
                asset: entry.asset,
                balance: entry.balance.to_string(),
                formatted,
            };
            return Ok(serde_json::to_string(&line)?);
        }
        let amount = match formatted {
            Some(formatted) => format!("{formatted} ({} wei)", entry.balance),
            None => format!("{} units", entry.balance),
        };
        Ok(format!(
            "{label:<7} {chain} {address:#x} {asset}: {amount}",
            chain = entry.chain,
            address = entry.address,
            asset = entry.asset,
        ))
    }
}

impl BalanceReporter for ConsoleReporter {
    fn report(&mut self, label: &str, entry: &BalanceEntry) -> Result<()> {
        println!("{}", self.render(label, entry)?);
        Ok(())
    }
}

/// Reads `owner`'s balance of `asset` on one chain.
pub async fn read_balance(
    client: &dyn ChainClient,
    owner: Address,
    asset: AssetKind,
) -> Result<BalanceEntry, ChainError> {
    let chain = client.chain();
    let balance = match asset.token_on(chain) {
        None => client.get_balance(owner).await?,
        Some(token) => client.get_token_balance(token, owner).await?,
    };
    Ok(BalanceEntry {
        chain,
        address: owner,
        asset,
        balance,
    })
}

/// Reads and reports the balance on both chains under one label.
pub async fn report_pair(
    reporter: &mut dyn BalanceReporter,
    label: &str,
    clients: [&dyn ChainClient; 2],
    owner: Address,
    asset: AssetKind,
) -> Result<Vec<BalanceEntry>> {
    let mut entries = Vec::with_capacity(clients.len());
    for client in clients {
        let entry = read_balance(client, owner, asset).await?;
        reporter.report(label, &entry)?;
        entries.push(entry);
    }
    Ok(entries)
}
