use super::Bridge;
use crate::chain::{ChainClient, SettlementChain};
use crate::cli::{GlobalArgs, PingArgs};
use crate::config::Config;
use crate::rpc::RpcClient;
use crate::types::Chain;
use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PingOutput {
    chain: Chain,
    rpc: String,
    chain_id: Option<u64>,
    expected_chain_id: Option<u64>,
    latest_block: Option<u64>,
    client_version: Option<String>,
    /// L1 only: highest L2 block with a published output root.
    committed_l2_height: Option<u64>,
}

/// Check RPC connectivity for both chains.
///
/// Reports chain ID, latest block and client version; on L1 also the
/// output oracle's committed height, which proves the contracts are wired.
pub async fn run(args: PingArgs, config: Config, global: GlobalArgs) -> Result<()> {
    let bridge = Bridge::connect(&config, &global).await?;

    let mut outputs = Vec::with_capacity(2);
    for client in [bridge.l1.as_ref(), bridge.l2.as_ref()] {
        outputs.push(ping(&bridge, client).await);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    for output in &outputs {
        println!("[{}] {}", output.chain, output.rpc);
        println!("  chainId: {}", show(output.chain_id));
        if let (Some(actual), Some(expected)) = (output.chain_id, output.expected_chain_id) {
            if actual != expected {
                println!("  warning: expected chainId {expected}");
            }
        }
        println!("  latest block: {}", show(output.latest_block));
        println!(
            "  client version: {}",
            output.client_version.as_deref().unwrap_or("n/a")
        );
        if output.chain == Chain::L1 {
            println!("  committed L2 height: {}", show(output.committed_l2_height));
        }
    }
    Ok(())
}

async fn ping(bridge: &Bridge, client: &RpcClient) -> PingOutput {
    let chain = client.chain();
    let committed_l2_height = match chain {
        Chain::L1 => client.get_committed_height().await.ok(),
        Chain::L2 => None,
    };
    PingOutput {
        chain,
        rpc: client.url().to_string(),
        chain_id: client.chain_id().await.ok(),
        expected_chain_id: bridge.pair.endpoint(chain).chain_id,
        latest_block: client.latest_block().await.ok(),
        client_version: client.client_version().await.ok(),
        committed_l2_height,
    }
}

fn show(value: Option<u64>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
