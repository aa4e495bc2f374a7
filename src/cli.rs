use crate::commands;
use crate::config::{Config, Overrides};
use crate::types::Chain;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "op-bridge",
    version,
    about = "Move assets between an OP-stack L1 and L2 and track each message to completion"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Built-in network preset (see `networks`).
    #[arg(long, global = true)]
    pub network: Option<String>,

    #[arg(long, global = true)]
    pub l1_rpc: Option<String>,

    #[arg(long, global = true)]
    pub l2_rpc: Option<String>,

    #[arg(long, global = true)]
    pub private_key: Option<String>,

    #[arg(long, global = true)]
    pub private_key_env: Option<String>,

    #[arg(long, global = true)]
    pub poll_ms: Option<u64>,
}

impl GlobalArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            network: self.network.clone(),
            l1_rpc: self.l1_rpc.clone(),
            l2_rpc: self.l2_rpc.clone(),
            poll_ms: self.poll_ms,
        }
    }
}

impl Cli {
    pub async fn run(self, config: Config) -> Result<()> {
        let global = self.global;
        match self.command {
            Command::Deposit(args) => commands::deposit::run(args, config, global).await,
            Command::Withdraw(args) => commands::withdraw::run(args, config, global).await,
            Command::Resume(args) => commands::resume::run(args, config, global).await,
            Command::Status(args) => commands::status::run(args, config, global).await,
            Command::Wait(args) => commands::wait::run(args, config, global).await,
            Command::Prove(args) => commands::prove::run(args, config, global).await,
            Command::Finalize(args) => commands::finalize::run(args, config, global).await,
            Command::Balance(args) => commands::balance::run(args, config, global).await,
            Command::Ping(args) => commands::ping::run(args, config, global).await,
            Command::Networks(args) => commands::networks::run(args),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bridge from L1 to L2 and wait until the message is relayed.
    Deposit(TransferArgs),
    /// Bridge from L2 to L1: initiate, prove, wait out the challenge period, finalize.
    Withdraw(TransferArgs),
    /// Pick up a deposit or withdrawal from its source transaction hash.
    Resume(ResumeArgs),
    Status(StatusArgs),
    /// Block until a message reaches a status.
    Wait(WaitArgs),
    /// Submit the withdrawal proof for an L2 withdrawal.
    Prove(StepArgs),
    /// Finalize a proven withdrawal whose challenge period has elapsed.
    Finalize(StepArgs),
    Balance(BalanceArgs),
    /// Check RPC connectivity for both chains.
    Ping(PingArgs),
    /// List built-in network presets.
    Networks(NetworksArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct TokenArgs {
    /// ERC-20 address on L1; requires --token-l2.
    #[arg(long)]
    pub token_l1: Option<String>,

    #[arg(long)]
    pub token_l2: Option<String>,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Amount in the smallest unit.
    #[arg(long)]
    pub amount: String,

    #[command(flatten)]
    pub token: TokenArgs,

    /// Recipient on the destination chain; defaults to the signer.
    #[arg(long)]
    pub to: Option<String>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    #[arg(long, value_enum)]
    pub from: Chain,

    #[arg(long)]
    pub tx: String,

    /// Only used for reporting.
    #[arg(long, default_value = "0")]
    pub amount: String,

    #[command(flatten)]
    pub token: TokenArgs,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[arg(long, value_enum)]
    pub from: Chain,

    #[arg(long)]
    pub tx: String,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct WaitArgs {
    #[arg(long, value_enum)]
    pub from: Chain,

    #[arg(long)]
    pub tx: String,

    /// Target status, e.g. ready-to-prove or relayed.
    #[arg(long)]
    pub until: String,

    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct StepArgs {
    /// Hash of the L2 withdrawal transaction.
    #[arg(long)]
    pub tx: String,

    /// Return once submitted instead of waiting for the receipt.
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Defaults to the signer.
    #[arg(long)]
    pub address: Option<String>,

    #[command(flatten)]
    pub token: TokenArgs,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct NetworksArgs {
    #[arg(long)]
    pub json: bool,
}
