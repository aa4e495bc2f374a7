use alloy_primitives::{address, Address, B256, U256};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token address the L2 standard bridge uses to stand for the native asset.
pub const LEGACY_ERC20_ETH: Address = address!("DeadDeAddeAddEAddeadDEaDDEAdDeaDDeAD0000");

pub const DEFAULT_L2_STANDARD_BRIDGE: Address = address!("4200000000000000000000000000000000000010");
pub const DEFAULT_L2_CROSS_DOMAIN_MESSENGER: Address =
    address!("4200000000000000000000000000000000000007");
pub const DEFAULT_L2_TO_L1_MESSAGE_PASSER: Address =
    address!("4200000000000000000000000000000000000016");

/// Which side of the bridge pair a transaction lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    L1,
    L2,
}

impl Chain {
    pub fn other(self) -> Chain {
        match self {
            Chain::L1 => Chain::L2,
            Chain::L2 => Chain::L1,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::L1 => f.write_str("L1"),
            Chain::L2 => f.write_str("L2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AssetKind {
    Native,
    #[serde(rename_all = "camelCase")]
    Token {
        l1_address: Address,
        l2_address: Address,
    },
}

impl AssetKind {
    /// Builds the asset from optional CLI token flags; both or neither must be set.
    pub fn from_flags(l1: Option<&str>, l2: Option<&str>) -> Result<Self> {
        match (l1, l2) {
            (None, None) => Ok(AssetKind::Native),
            (Some(l1), Some(l2)) => Ok(AssetKind::Token {
                l1_address: parse_address(l1)?,
                l2_address: parse_address(l2)?,
            }),
            _ => anyhow::bail!("--token-l1 and --token-l2 must be set together"),
        }
    }

    /// Token contract on the given chain, `None` for the native asset.
    pub fn token_on(&self, chain: Chain) -> Option<Address> {
        match (self, chain) {
            (AssetKind::Native, _) => None,
            (AssetKind::Token { l1_address, .. }, Chain::L1) => Some(*l1_address),
            (AssetKind::Token { l2_address, .. }, Chain::L2) => Some(*l2_address),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Native => f.write_str("native"),
            AssetKind::Token { l1_address, .. } => write!(f, "token {l1_address:#x}"),
        }
    }
}

pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value).map_err(|err| anyhow!("invalid address {value}: {err}"))
}

pub fn parse_b256(value: &str) -> Result<B256> {
    B256::from_str(value).map_err(|err| anyhow!("invalid bytes32 {value}: {err}"))
}

pub fn parse_u256(value: &str) -> Result<U256> {
    U256::from_str(value).map_err(|err| anyhow!("invalid uint256 {value}: {err}"))
}

pub fn require_signer(account: Option<Address>, cmd: &str) -> Result<Address> {
    account.ok_or_else(|| {
        anyhow!("{cmd} requires a signer (set --private-key or the configured env var)")
    })
}

/// Renders a smallest-unit amount with a decimal point.
pub fn format_units(value: U256, decimals: u32) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let mut digits = value.to_string();
    if digits.len() <= decimals as usize {
        let zeros = "0".repeat(decimals as usize + 1 - digits.len());
        digits = format!("{zeros}{digits}");
    }
    let split = digits.len() - decimals as usize;
    let mut out = format!("{}.{}", &digits[..split], &digits[split..]);
    while out.ends_with('0') {
        out.pop();
    }
    if out.ends_with('.') {
        out.pop();
    }
    out
}

pub fn explorer_tx_url(explorer: Option<&str>, tx_hash: B256) -> Option<String> {
    explorer.map(|base| format!("{}/tx/{tx_hash:#x}", base.trim_end_matches('/')))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    pub source_chain: Chain,
    pub source_tx_hash: String,
    pub status: String,
    pub l1_timestamp: Option<u64>,
    pub committed_height: Option<u64>,
    pub challenge_period_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub source_chain: Chain,
    pub source_tx_hash: String,
    pub amount: String,
    pub asset: AssetKind,
    pub status: String,
    pub proof_tx_hash: Option<String>,
    pub finalize_tx_hash: Option<String>,
    pub elapsed_seconds: u64,
}
