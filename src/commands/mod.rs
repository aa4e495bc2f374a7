pub mod balance;
pub mod deposit;
pub mod finalize;
pub mod networks;
pub mod ping;
pub mod prove;
pub mod resume;
pub mod status;
pub mod wait;
pub mod withdraw;

use crate::chain::{ChainClient, RollupChain, SettlementChain};
use crate::cli::{GlobalArgs, TokenArgs};
use crate::config::{BridgePairConfig, Config};
use crate::lifecycle::{
    BridgeMessage, DepositOrchestrator, MessageStatusResolver, Progress, StatusWaiter,
    WithdrawalOrchestrator,
};
use crate::report::{report_pair, BalanceEntry, ConsoleReporter};
use crate::rpc::RpcClient;
use crate::signer::{load_signer, SignerOptions};
use crate::types::{explorer_tx_url, require_signer, AssetKind, Chain, FlowSummary};
use alloy_primitives::{Address, B256};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Connected L1/L2 pair plus the settings every command shares.
pub struct Bridge {
    pub pair: BridgePairConfig,
    pub l1: Arc<RpcClient>,
    pub l2: Arc<RpcClient>,
}

impl Bridge {
    pub async fn connect(config: &Config, global: &GlobalArgs) -> Result<Self> {
        let pair = config.resolve(&global.overrides())?;
        let signer = load_signer(
            SignerOptions {
                private_key: global.private_key.as_deref(),
                private_key_env: global.private_key_env.as_deref(),
            },
            config,
        )?;
        let l1 = RpcClient::connect(Chain::L1, &pair, signer.clone()).await?;
        let l2 = RpcClient::connect(Chain::L2, &pair, signer).await?;
        tracing::info!(
            network = pair.network.as_deref().unwrap_or("custom"),
            l1 = %l1.url(),
            l2 = %l2.url(),
            "connected"
        );
        Ok(Self {
            pair,
            l1: Arc::new(l1),
            l2: Arc::new(l2),
        })
    }

    pub fn client(&self, chain: Chain) -> &dyn ChainClient {
        match chain {
            Chain::L1 => self.l1.as_ref(),
            Chain::L2 => self.l2.as_ref(),
        }
    }

    /// Signing account; the same key is used on both chains.
    pub fn account(&self, command: &str) -> Result<Address> {
        require_signer(self.l1.account(), command)
    }

    pub fn resolver(&self) -> MessageStatusResolver {
        let (l1, l2) = self.chains();
        MessageStatusResolver::new(l1, l2, self.pair.contracts)
    }

    pub fn waiter(&self) -> StatusWaiter {
        StatusWaiter::new(self.resolver())
            .with_max_consecutive_failures(self.pair.max_consecutive_failures)
    }

    pub fn deposits(&self) -> DepositOrchestrator {
        let (l1, _) = self.chains();
        DepositOrchestrator::new(
            l1,
            self.waiter(),
            self.pair.contracts.l1_standard_bridge,
            self.pair.deposit_min_gas_limit,
            self.pair.wait,
        )
    }

    pub fn withdrawals(&self) -> WithdrawalOrchestrator {
        let (l1, l2) = self.chains();
        WithdrawalOrchestrator::new(
            l1,
            l2,
            self.waiter(),
            self.pair.contracts,
            self.pair.withdraw_min_gas_limit,
            self.pair.wait,
        )
    }

    pub fn explorer_link(&self, chain: Chain, tx_hash: B256) -> Option<String> {
        explorer_tx_url(self.pair.endpoint(chain).explorer.as_deref(), tx_hash)
    }

    pub async fn report_balances(
        &self,
        reporter: &mut ConsoleReporter,
        label: &str,
        owner: Address,
        asset: AssetKind,
    ) -> Result<Vec<BalanceEntry>> {
        report_pair(
            reporter,
            label,
            [self.client(Chain::L1), self.client(Chain::L2)],
            owner,
            asset,
        )
        .await
    }

    fn chains(&self) -> (Arc<dyn SettlementChain>, Arc<dyn RollupChain>) {
        let l1: Arc<dyn SettlementChain> = self.l1.clone();
        let l2: Arc<dyn RollupChain> = self.l2.clone();
        (l1, l2)
    }
}

impl TokenArgs {
    pub fn asset(&self) -> Result<AssetKind> {
        AssetKind::from_flags(self.token_l1.as_deref(), self.token_l2.as_deref())
    }
}

/// Token cancelled on the first Ctrl-C; waits stop at their next poll.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            child.cancel();
        }
    });
    token
}

pub fn summarize(message: &BridgeMessage, elapsed: Duration) -> FlowSummary {
    FlowSummary {
        source_chain: message.source_chain(),
        source_tx_hash: format!("{:#x}", message.source_tx_hash()),
        amount: message.amount.to_string(),
        asset: message.asset,
        status: message.status().to_string(),
        proof_tx_hash: message
            .proof
            .and_then(|proof| proof.tx_hash)
            .map(|hash| format!("{hash:#x}")),
        finalize_tx_hash: message.finalize_tx_hash.map(|hash| format!("{hash:#x}")),
        elapsed_seconds: elapsed.as_secs(),
    }
}

pub fn resume_hint(message: &BridgeMessage) -> String {
    let from = match message.source_chain() {
        Chain::L1 => "l1",
        Chain::L2 => "l2",
    };
    format!(
        "op-bridge resume --from {from} --tx {:#x}",
        message.source_tx_hash()
    )
}

/// Prints where a flow ended. A timeout is reported as an error so the exit
/// code reflects it; the message can still be resumed.
pub fn print_progress(
    bridge: &Bridge,
    progress: &Progress,
    elapsed: Duration,
    json: bool,
) -> Result<()> {
    let message = progress.message();
    let summary = summarize(message, elapsed);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} {} from {}: {}",
            summary.asset, summary.amount, summary.source_chain, summary.status
        );
        print_tx(bridge, "source", message.source_chain(), message.source_tx_hash());
        if let Some(hash) = message.proof.and_then(|proof| proof.tx_hash) {
            print_tx(bridge, "prove", Chain::L1, hash);
        }
        if let Some(hash) = message.finalize_tx_hash {
            print_tx(bridge, "finalize", Chain::L1, hash);
        }
        println!("elapsed: {}s", summary.elapsed_seconds);
    }

    match progress {
        Progress::Complete(_) => Ok(()),
        Progress::Cancelled(_) => {
            eprintln!("cancelled, continue with: {}", resume_hint(message));
            Ok(())
        }
        Progress::TimedOut { waiting_for, .. } => anyhow::bail!(
            "timed out waiting for {waiting_for}, continue with: {}",
            resume_hint(message)
        ),
    }
}

pub fn print_tx(bridge: &Bridge, label: &str, chain: Chain, tx_hash: B256) {
    match bridge.explorer_link(chain, tx_hash) {
        Some(link) => println!("{label} tx ({chain}): {tx_hash:#x} {link}"),
        None => println!("{label} tx ({chain}): {tx_hash:#x}"),
    }
}
