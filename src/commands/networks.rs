use crate::cli::NetworksArgs;
use crate::networks::PRESETS;
use anyhow::Result;

pub fn run(args: NetworksArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(PRESETS)?);
        return Ok(());
    }

    for preset in PRESETS {
        println!("{}", preset.name);
        println!("  L1 {} (chainId {})", preset.l1.rpc, preset.l1.chain_id);
        println!("  L2 {} (chainId {})", preset.l2.rpc, preset.l2.chain_id);
        println!("  portal {:#x}", preset.contracts.optimism_portal);
        println!("  output oracle {:#x}", preset.contracts.l2_output_oracle);
        println!("  L1 standard bridge {:#x}", preset.contracts.l1_standard_bridge);
    }
    Ok(())
}
