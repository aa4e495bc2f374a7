use crate::config::ContractAddresses;
use crate::types::{
    DEFAULT_L2_CROSS_DOMAIN_MESSENGER, DEFAULT_L2_STANDARD_BRIDGE, DEFAULT_L2_TO_L1_MESSAGE_PASSER,
};
use alloy_primitives::address;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetChain {
    pub rpc: &'static str,
    pub chain_id: u64,
    pub explorer: Option<&'static str>,
}

/// A settlement/rollup pair with its deployed bridge contracts.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NetworkPreset {
    pub name: &'static str,
    pub l1: PresetChain,
    pub l2: PresetChain,
    pub contracts: ContractAddresses,
}

const SEPOLIA: PresetChain = PresetChain {
    rpc: "https://rpc.ankr.com/eth_sepolia",
    chain_id: 11155111,
    explorer: None,
};

pub const PRESETS: &[NetworkPreset] = &[
    NetworkPreset {
        name: "jibchain-testnet",
        l1: PresetChain {
            rpc: "https://rpc.testnet.jibchain.net",
            chain_id: 88991,
            explorer: Some("https://exp.testnet.jibchain.net"),
        },
        l2: PresetChain {
            rpc: "https://rpc.hera.jbcha.in",
            chain_id: 7001,
            explorer: Some("https://exp.hera.jbcha.in"),
        },
        contracts: ContractAddresses {
            l1_standard_bridge: address!("3C91efB30c55FbD5782be4BbA3D9628C1074a18D"),
            l1_cross_domain_messenger: address!("4250A8AF9ceDa0bDdF5Fd3568330b6ce6310bE58"),
            optimism_portal: address!("EcA3B962eC275d4bA8BbE0500aC6d4086c6CE039"),
            l2_output_oracle: address!("74Ad6E0FB793eB5e6c1ff1225B03F5C5fFB7EF0c"),
            l2_standard_bridge: DEFAULT_L2_STANDARD_BRIDGE,
            l2_cross_domain_messenger: DEFAULT_L2_CROSS_DOMAIN_MESSENGER,
            l2_to_l1_message_passer: DEFAULT_L2_TO_L1_MESSAGE_PASSER,
        },
    },
    NetworkPreset {
        name: "zora-sepolia",
        l1: SEPOLIA,
        l2: PresetChain {
            rpc: "https://sepolia.rpc.zora.energy",
            chain_id: 999999999,
            explorer: None,
        },
        contracts: ContractAddresses {
            l1_standard_bridge: address!("5376f1D543dcbB5BD416c56C189e4cB7399fCcCB"),
            l1_cross_domain_messenger: address!("1bDBC0ae22bEc0c2f08B4dd836944b3E28fe9b7A"),
            optimism_portal: address!("effE2C6cA9Ab797D418f0D91eA60807713f3536f"),
            l2_output_oracle: address!("2615B481Bd3E5A1C0C7Ca3Da1bdc663E8615Ade9"),
            l2_standard_bridge: DEFAULT_L2_STANDARD_BRIDGE,
            l2_cross_domain_messenger: DEFAULT_L2_CROSS_DOMAIN_MESSENGER,
            l2_to_l1_message_passer: DEFAULT_L2_TO_L1_MESSAGE_PASSER,
        },
    },
    NetworkPreset {
        name: "mode-sepolia",
        l1: SEPOLIA,
        l2: PresetChain {
            rpc: "https://sepolia.mode.network",
            chain_id: 919,
            explorer: None,
        },
        contracts: ContractAddresses {
            l1_standard_bridge: address!("bC5C679879B2965296756CD959C3C739769995E2"),
            l1_cross_domain_messenger: address!("c19a60d9E8C27B9A43527c3283B4dd8eDC8bE15C"),
            optimism_portal: address!("320e1580effF37E008F1C92700d1eBa47c1B23fD"),
            l2_output_oracle: address!("2634BD65ba27AB63811c74A63118ACb312701Bfa"),
            l2_standard_bridge: DEFAULT_L2_STANDARD_BRIDGE,
            l2_cross_domain_messenger: DEFAULT_L2_CROSS_DOMAIN_MESSENGER,
            l2_to_l1_message_passer: DEFAULT_L2_TO_L1_MESSAGE_PASSER,
        },
    },
];

pub fn find(name: &str) -> Option<&'static NetworkPreset> {
    PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}
