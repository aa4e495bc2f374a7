use crate::lifecycle::{WaitPolicy, DEFAULT_MAX_CONSECUTIVE_FAILURES};
use crate::networks::{self, NetworkPreset, PresetChain};
use crate::types::{
    parse_address, Chain, DEFAULT_L2_CROSS_DOMAIN_MESSENGER, DEFAULT_L2_STANDARD_BRIDGE,
    DEFAULT_L2_TO_L1_MESSAGE_PASSER,
};
use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DEPOSIT_MIN_GAS_LIMIT: u32 = 200_000;
pub const DEFAULT_WITHDRAW_MIN_GAS_LIMIT: u32 = 200_000;

/// On-disk configuration. Every field is optional; gaps are filled from the
/// selected network preset.
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    pub network: Option<String>,
    pub l1: Option<ChainConfig>,
    pub l2: Option<ChainConfig>,
    pub contracts: Option<ContractConfig>,
    pub signer: Option<SignerConfig>,
    pub wait: Option<WaitConfig>,
    pub gas: Option<GasConfig>,
    pub challenge_period_seconds: Option<u64>,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ChainConfig {
    pub rpc: Option<String>,
    #[serde(rename = "chainId")]
    pub chain_id: Option<u64>,
    pub explorer: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ContractConfig {
    pub l1_standard_bridge: Option<String>,
    pub l1_cross_domain_messenger: Option<String>,
    pub optimism_portal: Option<String>,
    pub l2_output_oracle: Option<String>,
    pub l2_standard_bridge: Option<String>,
    pub l2_cross_domain_messenger: Option<String>,
    pub l2_to_l1_message_passer: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct SignerConfig {
    pub private_key_env: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct WaitConfig {
    pub poll_ms: Option<u64>,
    pub confirm_timeout_ms: Option<u64>,
    pub relay_timeout_ms: Option<u64>,
    pub prove_timeout_ms: Option<u64>,
    pub challenge_timeout_ms: Option<u64>,
    pub max_consecutive_failures: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct GasConfig {
    pub deposit_min_gas_limit: Option<u32>,
    pub withdraw_min_gas_limit: Option<u32>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub network: Option<String>,
    pub l1_rpc: Option<String>,
    pub l2_rpc: Option<String>,
    pub poll_ms: Option<u64>,
}

/// Addresses of the bridge contracts on both chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub l1_standard_bridge: Address,
    pub l1_cross_domain_messenger: Address,
    pub optimism_portal: Address,
    pub l2_output_oracle: Address,
    pub l2_standard_bridge: Address,
    pub l2_cross_domain_messenger: Address,
    pub l2_to_l1_message_passer: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEndpoint {
    pub rpc: String,
    pub chain_id: Option<u64>,
    pub explorer: Option<String>,
}

/// Fully resolved settings for one L1/L2 pair.
#[derive(Debug, Clone)]
pub struct BridgePairConfig {
    pub network: Option<String>,
    pub l1: ChainEndpoint,
    pub l2: ChainEndpoint,
    pub contracts: ContractAddresses,
    /// Overrides the oracle's `FINALIZATION_PERIOD_SECONDS` when set.
    pub challenge_period_seconds: Option<u64>,
    pub deposit_min_gas_limit: u32,
    pub withdraw_min_gas_limit: u32,
    pub wait: WaitPolicy,
    pub max_consecutive_failures: u32,
}

impl BridgePairConfig {
    pub fn endpoint(&self, chain: Chain) -> &ChainEndpoint {
        match chain {
            Chain::L1 => &self.l1,
            Chain::L2 => &self.l2,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using presets and flags");
            return Ok(Self {
                path,
                ..Self::default()
            });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::parse(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.path = path;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn signer_env(&self) -> String {
        self.signer
            .as_ref()
            .and_then(|cfg| cfg.private_key_env.clone())
            .unwrap_or_else(|| "PRIVATE_KEY".to_string())
    }

    /// Merges flags, file and preset, in that order of precedence.
    pub fn resolve(&self, overrides: &Overrides) -> Result<BridgePairConfig> {
        let network = overrides.network.clone().or_else(|| self.network.clone());
        let preset = match network.as_deref() {
            Some(name) => Some(networks::find(name).ok_or_else(|| {
                anyhow!("unknown network {name} (see `op-bridge networks`)")
            })?),
            None => None,
        };

        let l1 = resolve_endpoint(
            Chain::L1,
            overrides.l1_rpc.as_deref(),
            self.l1.as_ref(),
            preset.map(|preset| &preset.l1),
        )?;
        let l2 = resolve_endpoint(
            Chain::L2,
            overrides.l2_rpc.as_deref(),
            self.l2.as_ref(),
            preset.map(|preset| &preset.l2),
        )?;
        let contracts = resolve_contracts(self.contracts.as_ref(), preset)?;

        let wait = self.wait.clone().unwrap_or_default();
        let defaults = WaitPolicy::default();
        let millis = |value: Option<u64>, default: Duration| {
            value.map(Duration::from_millis).unwrap_or(default)
        };
        let policy = WaitPolicy {
            poll_interval: millis(overrides.poll_ms.or(wait.poll_ms), defaults.poll_interval),
            confirmation_timeout: millis(wait.confirm_timeout_ms, defaults.confirmation_timeout),
            relay_timeout: millis(wait.relay_timeout_ms, defaults.relay_timeout),
            prove_timeout: millis(wait.prove_timeout_ms, defaults.prove_timeout),
            challenge_timeout: millis(wait.challenge_timeout_ms, defaults.challenge_timeout),
        };
        if policy.poll_interval.is_zero() {
            anyhow::bail!("poll interval must be greater than zero");
        }

        let gas = self.gas.clone().unwrap_or_default();
        Ok(BridgePairConfig {
            network,
            l1,
            l2,
            contracts,
            challenge_period_seconds: self.challenge_period_seconds,
            deposit_min_gas_limit: gas
                .deposit_min_gas_limit
                .unwrap_or(DEFAULT_DEPOSIT_MIN_GAS_LIMIT),
            withdraw_min_gas_limit: gas
                .withdraw_min_gas_limit
                .unwrap_or(DEFAULT_WITHDRAW_MIN_GAS_LIMIT),
            wait: policy,
            max_consecutive_failures: wait
                .max_consecutive_failures
                .unwrap_or(DEFAULT_MAX_CONSECUTIVE_FAILURES),
        })
    }
}

fn resolve_endpoint(
    chain: Chain,
    flag: Option<&str>,
    file: Option<&ChainConfig>,
    preset: Option<&PresetChain>,
) -> Result<ChainEndpoint> {
    let rpc = flag
        .map(str::to_string)
        .or_else(|| file.and_then(|cfg| cfg.rpc.clone()))
        .or_else(|| preset.map(|preset| preset.rpc.to_string()))
        .ok_or_else(|| {
            let flag = match chain {
                Chain::L1 => "--l1-rpc",
                Chain::L2 => "--l2-rpc",
            };
            anyhow!("no {chain} rpc configured (set {flag} or --network, or configure one)")
        })?;
    Ok(ChainEndpoint {
        rpc,
        chain_id: file
            .and_then(|cfg| cfg.chain_id)
            .or_else(|| preset.map(|preset| preset.chain_id)),
        explorer: file
            .and_then(|cfg| cfg.explorer.clone())
            .or_else(|| preset.and_then(|preset| preset.explorer.map(str::to_string))),
    })
}

fn resolve_contracts(
    file: Option<&ContractConfig>,
    preset: Option<&NetworkPreset>,
) -> Result<ContractAddresses> {
    let empty = ContractConfig::default();
    let file = file.unwrap_or(&empty);
    let presets = preset.map(|preset| preset.contracts);

    let pick = |name: &str,
                value: &Option<String>,
                from_preset: Option<Address>,
                fallback: Option<Address>|
     -> Result<Address> {
        if let Some(value) = value {
            return parse_address(value).with_context(|| format!("contracts.{name}"));
        }
        from_preset
            .or(fallback)
            .ok_or_else(|| anyhow!("missing contract address contracts.{name} (or pick a --network)"))
    };

    Ok(ContractAddresses {
        l1_standard_bridge: pick(
            "l1_standard_bridge",
            &file.l1_standard_bridge,
            presets.map(|c| c.l1_standard_bridge),
            None,
        )?,
        l1_cross_domain_messenger: pick(
            "l1_cross_domain_messenger",
            &file.l1_cross_domain_messenger,
            presets.map(|c| c.l1_cross_domain_messenger),
            None,
        )?,
        optimism_portal: pick(
            "optimism_portal",
            &file.optimism_portal,
            presets.map(|c| c.optimism_portal),
            None,
        )?,
        l2_output_oracle: pick(
            "l2_output_oracle",
            &file.l2_output_oracle,
            presets.map(|c| c.l2_output_oracle),
            None,
        )?,
        l2_standard_bridge: pick(
            "l2_standard_bridge",
            &file.l2_standard_bridge,
            presets.map(|c| c.l2_standard_bridge),
            Some(DEFAULT_L2_STANDARD_BRIDGE),
        )?,
        l2_cross_domain_messenger: pick(
            "l2_cross_domain_messenger",
            &file.l2_cross_domain_messenger,
            presets.map(|c| c.l2_cross_domain_messenger),
            Some(DEFAULT_L2_CROSS_DOMAIN_MESSENGER),
        )?,
        l2_to_l1_message_passer: pick(
            "l2_to_l1_message_passer",
            &file.l2_to_l1_message_passer,
            presets.map(|c| c.l2_to_l1_message_passer),
            Some(DEFAULT_L2_TO_L1_MESSAGE_PASSER),
        )?,
    })
}

fn default_config_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join("op-bridge").join("config.toml");
    }
    PathBuf::from("./config.toml")
}
