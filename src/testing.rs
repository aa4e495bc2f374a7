//! In-memory L1/L2 pair implementing the chain traits, for tests.
//!
//! Submitted transactions sit in a pending pool until the test (or a driver
//! task) mines them; mining applies the bridge contracts' effects and emits
//! the same events the real contracts do, so the resolver sees realistic
//! receipts.

use crate::abi::{
    self, encode_deposit_eth_call, encode_finalize_call, encode_withdraw_call, hash_withdrawal,
    withdrawal_from_logs, SentCrossDomainMessage, WithdrawalTransaction,
};
use crate::chain::{
    ChainClient, OutputProposal, ProvenWithdrawal, Receipt, RollupChain, SettlementChain,
    TxRequest, WithdrawalProof,
};
use crate::config::ContractAddresses;
use crate::error::ChainError;
use crate::lifecycle::{MessageStatusResolver, WaitPolicy};
use crate::types::{
    Chain, DEFAULT_L2_CROSS_DOMAIN_MESSENGER, DEFAULT_L2_STANDARD_BRIDGE,
    DEFAULT_L2_TO_L1_MESSAGE_PASSER, LEGACY_ERC20_ETH,
};
use alloy_primitives::{address, keccak256, Address, Bytes, Log, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const CHALLENGE_PERIOD: u64 = 3600;
pub const USER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const TOKEN_L1: Address = address!("39BE211eAb65e05ba98af949d3e16F7A1683d94E");
pub const TOKEN_L2: Address = address!("7c6b91D9Be155A6Db01f749217d76fF02A7227F2");

pub const CONTRACTS: ContractAddresses = ContractAddresses {
    l1_standard_bridge: address!("3C91efB30c55FbD5782be4BbA3D9628C1074a18D"),
    l1_cross_domain_messenger: address!("4250A8AF9ceDa0bDdF5Fd3568330b6ce6310bE58"),
    optimism_portal: address!("EcA3B962eC275d4bA8BbE0500aC6d4086c6CE039"),
    l2_output_oracle: address!("74Ad6E0FB793eB5e6c1ff1225B03F5C5fFB7EF0c"),
    l2_standard_bridge: DEFAULT_L2_STANDARD_BRIDGE,
    l2_cross_domain_messenger: DEFAULT_L2_CROSS_DOMAIN_MESSENGER,
    l2_to_l1_message_passer: DEFAULT_L2_TO_L1_MESSAGE_PASSER,
};

const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
const L1_BLOCK_TIME: u64 = 12;
const L2_BLOCK_TIME: u64 = 2;
const MIN_GAS_LIMIT: u32 = 200_000;

/// Short budgets so paused-clock tests stay quick.
pub fn test_policy() -> WaitPolicy {
    WaitPolicy {
        poll_interval: Duration::from_secs(1),
        confirmation_timeout: Duration::from_secs(60),
        relay_timeout: Duration::from_secs(120),
        prove_timeout: Duration::from_secs(120),
        challenge_timeout: Duration::from_secs(2 * 60 * 60),
    }
}

struct PendingTx {
    hash: B256,
    request: TxRequest,
    revert: bool,
}

#[derive(Default)]
struct ChainSim {
    block_number: u64,
    timestamp: u64,
    pending: Vec<PendingTx>,
    receipts: HashMap<B256, Receipt>,
    balances: HashMap<Address, U256>,
    /// `(token, owner)`
    tokens: HashMap<(Address, Address), U256>,
    /// `(token, spender)`, always granted by [`USER`]
    allowances: HashMap<(Address, Address), U256>,
    reads: u32,
    /// Reads that still succeed before `failing_reads` kicks in.
    healthy_reads: u32,
    failing_reads: u32,
    submissions: u32,
    revert_next: bool,
    reject_next: Option<String>,
}

impl ChainSim {
    fn new(block_number: u64) -> Self {
        Self {
            block_number,
            timestamp: GENESIS_TIMESTAMP,
            ..Self::default()
        }
    }

    fn debit(&mut self, owner: Address, amount: U256) -> bool {
        let balance = self.balances.entry(owner).or_default();
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        true
    }

    fn debit_token(&mut self, token: Address, owner: Address, amount: U256) -> bool {
        let balance = self.tokens.entry((token, owner)).or_default();
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        true
    }
}

struct Relay {
    message_hash: B256,
    recipient: Address,
    amount: U256,
    l2_token: Option<Address>,
}

struct Withdrawal {
    recipient: Address,
    amount: U256,
    l1_token: Option<Address>,
}

struct Proven {
    timestamp: u64,
    output_index: U256,
    invalidated: bool,
}

struct World {
    l1: ChainSim,
    l2: ChainSim,
    tx_counter: u64,
    message_nonce: U256,
    withdrawal_nonce: U256,
    relays: Vec<Relay>,
    relayed: HashSet<B256>,
    committed_height: u64,
    /// `(l2 block, l1 timestamp)` per published output, by index.
    outputs: Vec<(u64, u64)>,
    proven: HashMap<B256, Proven>,
    finalized: HashSet<B256>,
    withdrawals: HashMap<B256, Withdrawal>,
}

impl World {
    fn new() -> Self {
        let starting = U256::from(10u64).pow(U256::from(19u64));
        let mut l1 = ChainSim::new(1_000);
        let mut l2 = ChainSim::new(5_000);
        l1.balances.insert(USER, starting);
        l2.balances.insert(USER, starting);
        l1.tokens.insert((TOKEN_L1, USER), U256::from(1_000_000u64));
        Self {
            l1,
            l2,
            tx_counter: 0,
            message_nonce: U256::ZERO,
            withdrawal_nonce: U256::ZERO,
            relays: Vec::new(),
            relayed: HashSet::new(),
            committed_height: 0,
            outputs: Vec::new(),
            proven: HashMap::new(),
            finalized: HashSet::new(),
            withdrawals: HashMap::new(),
        }
    }

    fn chain(&mut self, chain: Chain) -> &mut ChainSim {
        match chain {
            Chain::L1 => &mut self.l1,
            Chain::L2 => &mut self.l2,
        }
    }

    fn submit(&mut self, chain: Chain, request: TxRequest) -> Result<B256, ChainError> {
        if let Some(reason) = self.chain(chain).reject_next.take() {
            return Err(ChainError::Rejected { reason });
        }
        if chain == Chain::L1 && request.to == CONTRACTS.optimism_portal {
            self.check_portal_call(&request.data)
                .map_err(|reason| ChainError::Rejected {
                    reason: format!("execution reverted: {reason}"),
                })?;
        }
        self.tx_counter += 1;
        let hash = keccak256(format!("{chain}:{}", self.tx_counter));
        let sim = self.chain(chain);
        let revert = std::mem::take(&mut sim.revert_next);
        sim.pending.push(PendingTx {
            hash,
            request,
            revert,
        });
        sim.submissions += 1;
        Ok(hash)
    }

    /// What `eth_estimateGas` would refuse on the portal.
    fn check_portal_call(&self, data: &[u8]) -> Result<(), &'static str> {
        let selector = data.get(..4).unwrap_or_default();
        if selector == abi::proveWithdrawalTransactionCall::SELECTOR {
            let call = abi::proveWithdrawalTransactionCall::abi_decode(data)
                .map_err(|_| "malformed prove call")?;
            let hash = hash_withdrawal(&call._tx);
            if self.proven.get(&hash).is_some_and(|proven| !proven.invalidated) {
                return Err("OptimismPortal: withdrawal hash has already been proven");
            }
        } else if selector == abi::finalizeWithdrawalTransactionCall::SELECTOR {
            let call = abi::finalizeWithdrawalTransactionCall::abi_decode(data)
                .map_err(|_| "malformed finalize call")?;
            self.check_finalizable(&hash_withdrawal(&call._tx))?;
        }
        Ok(())
    }

    fn check_finalizable(&self, hash: &B256) -> Result<(), &'static str> {
        if self.finalized.contains(hash) {
            return Err("OptimismPortal: withdrawal has already been finalized");
        }
        match self.proven.get(hash) {
            Some(proven) if !proven.invalidated => {
                if self.l1.timestamp.saturating_sub(proven.timestamp) < CHALLENGE_PERIOD {
                    return Err("OptimismPortal: proven withdrawal finalization period has not elapsed");
                }
                Ok(())
            }
            _ => Err("OptimismPortal: withdrawal has not been proven yet"),
        }
    }

    fn mine(&mut self, chain: Chain) -> u64 {
        let block_time = match chain {
            Chain::L1 => L1_BLOCK_TIME,
            Chain::L2 => L2_BLOCK_TIME,
        };
        let sim = self.chain(chain);
        sim.block_number += 1;
        sim.timestamp += block_time;
        let block = sim.block_number;
        let pending = std::mem::take(&mut sim.pending);

        for tx in pending {
            let logs = if tx.revert {
                None
            } else {
                match chain {
                    Chain::L1 => self.execute_l1(&tx.request),
                    Chain::L2 => self.execute_l2(&tx.request),
                }
            };
            let receipt = Receipt {
                tx_hash: tx.hash,
                block_number: block,
                success: logs.is_some(),
                logs: logs.unwrap_or_default(),
            };
            self.chain(chain).receipts.insert(tx.hash, receipt);
        }
        block
    }

    /// Applies an L1 transaction; `None` means it reverted.
    fn execute_l1(&mut self, request: &TxRequest) -> Option<Vec<Log>> {
        let data = &request.data;
        let selector = data.get(..4)?;

        if request.to == CONTRACTS.l1_standard_bridge {
            if selector == abi::depositETHToCall::SELECTOR {
                let call = abi::depositETHToCall::abi_decode(data).ok()?;
                if !self.l1.debit(USER, request.value) {
                    return None;
                }
                return Some(self.send_message(call._to, request.value, None, call._minGasLimit));
            }
            if selector == abi::depositERC20ToCall::SELECTOR {
                let call = abi::depositERC20ToCall::abi_decode(data).ok()?;
                let allowance = self
                    .l1
                    .allowances
                    .entry((call._l1Token, CONTRACTS.l1_standard_bridge))
                    .or_default();
                if *allowance < call._amount {
                    return None;
                }
                *allowance -= call._amount;
                if !self.l1.debit_token(call._l1Token, USER, call._amount) {
                    return None;
                }
                return Some(self.send_message(
                    call._to,
                    call._amount,
                    Some(call._l2Token),
                    call._minGasLimit,
                ));
            }
            return None;
        }

        if request.to == CONTRACTS.optimism_portal {
            if selector == abi::proveWithdrawalTransactionCall::SELECTOR {
                let call = abi::proveWithdrawalTransactionCall::abi_decode(data).ok()?;
                let hash = hash_withdrawal(&call._tx);
                if self.proven.get(&hash).is_some_and(|proven| !proven.invalidated) {
                    return None;
                }
                self.proven.insert(
                    hash,
                    Proven {
                        timestamp: self.l1.timestamp,
                        output_index: call._l2OutputIndex,
                        invalidated: false,
                    },
                );
                return Some(Vec::new());
            }
            if selector == abi::finalizeWithdrawalTransactionCall::SELECTOR {
                let call = abi::finalizeWithdrawalTransactionCall::abi_decode(data).ok()?;
                let hash = hash_withdrawal(&call._tx);
                self.check_finalizable(&hash).ok()?;
                self.complete_withdrawal(hash);
                return Some(Vec::new());
            }
            return None;
        }

        if selector == abi::approveCall::SELECTOR {
            let call = abi::approveCall::abi_decode(data).ok()?;
            self.l1
                .allowances
                .insert((request.to, call.spender), call.value);
            return Some(Vec::new());
        }
        Some(Vec::new())
    }

    fn execute_l2(&mut self, request: &TxRequest) -> Option<Vec<Log>> {
        if request.to != CONTRACTS.l2_standard_bridge {
            return Some(Vec::new());
        }
        let call = abi::withdrawToCall::abi_decode(&request.data).ok()?;
        let (value, l1_token) = if call._l2Token == LEGACY_ERC20_ETH {
            if request.value != call._amount || !self.l2.debit(USER, call._amount) {
                return None;
            }
            (call._amount, None)
        } else {
            if !request.value.is_zero() || !self.l2.debit_token(call._l2Token, USER, call._amount) {
                return None;
            }
            (U256::ZERO, Some(TOKEN_L1))
        };

        let transaction = WithdrawalTransaction {
            nonce: self.withdrawal_nonce,
            sender: CONTRACTS.l2_cross_domain_messenger,
            target: CONTRACTS.l1_cross_domain_messenger,
            value,
            gasLimit: U256::from(call._minGasLimit),
            data: Bytes::from((USER, call._to, call._amount).abi_encode()),
        };
        self.withdrawal_nonce += U256::from(1u64);
        let withdrawal_hash = hash_withdrawal(&transaction);
        self.withdrawals.insert(
            withdrawal_hash,
            Withdrawal {
                recipient: call._to,
                amount: call._amount,
                l1_token,
            },
        );

        let event = abi::MessagePassed {
            nonce: transaction.nonce,
            sender: transaction.sender,
            target: transaction.target,
            value: transaction.value,
            gasLimit: transaction.gasLimit,
            data: transaction.data,
            withdrawalHash: withdrawal_hash,
        };
        Some(vec![Log {
            address: CONTRACTS.l2_to_l1_message_passer,
            data: event.encode_log_data(),
        }])
    }

    /// Emits the messenger events for a deposit and queues its relay.
    fn send_message(
        &mut self,
        recipient: Address,
        amount: U256,
        l2_token: Option<Address>,
        min_gas_limit: u32,
    ) -> Vec<Log> {
        let value = if l2_token.is_some() { U256::ZERO } else { amount };
        let message = SentCrossDomainMessage {
            target: CONTRACTS.l2_standard_bridge,
            sender: CONTRACTS.l1_standard_bridge,
            message: Bytes::from((USER, recipient, amount).abi_encode()),
            nonce: self.message_nonce,
            gas_limit: U256::from(min_gas_limit),
            value,
        };
        self.message_nonce += U256::from(1u64);
        self.relays.push(Relay {
            message_hash: message.hash(),
            recipient,
            amount,
            l2_token,
        });

        let sent = abi::SentMessage {
            target: message.target,
            sender: message.sender,
            message: message.message.clone(),
            messageNonce: message.nonce,
            gasLimit: message.gas_limit,
        };
        let extension = abi::SentMessageExtension1 {
            sender: message.sender,
            value,
        };
        vec![
            Log {
                address: CONTRACTS.l1_cross_domain_messenger,
                data: sent.encode_log_data(),
            },
            Log {
                address: CONTRACTS.l1_cross_domain_messenger,
                data: extension.encode_log_data(),
            },
        ]
    }

    fn complete_withdrawal(&mut self, hash: B256) {
        if !self.finalized.insert(hash) {
            return;
        }
        if let Some(withdrawal) = self.withdrawals.get(&hash) {
            match withdrawal.l1_token {
                None => {
                    *self.l1.balances.entry(withdrawal.recipient).or_default() += withdrawal.amount
                }
                Some(token) => {
                    *self
                        .l1
                        .tokens
                        .entry((token, withdrawal.recipient))
                        .or_default() += withdrawal.amount
                }
            }
        }
    }

    /// The withdrawal initiated by an L2 transaction, with its inclusion block.
    fn withdrawal_of(&self, source_tx: B256) -> (abi::PassedWithdrawal, u64) {
        let receipt = self
            .l2
            .receipts
            .get(&source_tx)
            .expect("withdrawal transaction not mined");
        let withdrawal = withdrawal_from_logs(&receipt.logs, CONTRACTS.l2_to_l1_message_passer)
            .expect("receipt carries MessagePassed");
        (withdrawal, receipt.block_number)
    }

    fn output_index_for(&self, l2_block: u64) -> Option<usize> {
        self.outputs.iter().position(|(block, _)| *block >= l2_block)
    }
}

/// Handle to the simulated pair; clones share state.
#[derive(Clone)]
pub struct SimChains {
    world: Arc<Mutex<World>>,
}

impl SimChains {
    pub fn new() -> Self {
        Self {
            world: Arc::new(Mutex::new(World::new())),
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap()
    }

    pub fn l1(&self) -> Arc<SimClient> {
        Arc::new(SimClient {
            chain: Chain::L1,
            world: self.world.clone(),
        })
    }

    pub fn l2(&self) -> Arc<SimClient> {
        Arc::new(SimClient {
            chain: Chain::L2,
            world: self.world.clone(),
        })
    }

    pub fn resolver(&self) -> MessageStatusResolver {
        MessageStatusResolver::new(self.l1(), self.l2(), CONTRACTS)
    }

    /// Submits a native deposit to [`USER`] without going through an orchestrator.
    pub fn send_deposit(&self, amount: U256) -> B256 {
        let request = TxRequest::call(
            CONTRACTS.l1_standard_bridge,
            encode_deposit_eth_call(USER, MIN_GAS_LIMIT),
        )
        .with_value(amount);
        self.world().submit(Chain::L1, request).unwrap()
    }

    pub fn send_withdrawal(&self, amount: U256) -> B256 {
        let request = TxRequest::call(
            CONTRACTS.l2_standard_bridge,
            encode_withdraw_call(LEGACY_ERC20_ETH, USER, amount, MIN_GAS_LIMIT),
        )
        .with_value(amount);
        self.world().submit(Chain::L2, request).unwrap()
    }

    /// Submits a finalization for the withdrawal initiated by `source_tx`.
    pub fn submit_finalize(&self, source_tx: B256) -> B256 {
        let mut world = self.world();
        let (withdrawal, _) = world.withdrawal_of(source_tx);
        let request = TxRequest::call(
            CONTRACTS.optimism_portal,
            encode_finalize_call(withdrawal.transaction),
        );
        world.submit(Chain::L1, request).unwrap()
    }

    /// Mines every pending L1 transaction into one block; returns its number.
    pub fn mine_l1(&self) -> u64 {
        self.world().mine(Chain::L1)
    }

    pub fn mine_l2(&self) -> u64 {
        self.world().mine(Chain::L2)
    }

    pub fn relay_deposits(&self) {
        let mut world = self.world();
        for relay in std::mem::take(&mut world.relays) {
            match relay.l2_token {
                None => *world.l2.balances.entry(relay.recipient).or_default() += relay.amount,
                Some(token) => {
                    *world.l2.tokens.entry((token, relay.recipient)).or_default() += relay.amount
                }
            }
            world.relayed.insert(relay.message_hash);
        }
    }

    /// Publishes an output root covering L2 blocks up to `height`.
    pub fn commit_l2_height(&self, height: u64) {
        let mut world = self.world();
        world.committed_height = height;
        if world.outputs.last().map_or(true, |(block, _)| *block < height) {
            let timestamp = world.l1.timestamp;
            world.outputs.push((height, timestamp));
        }
    }

    pub fn l1_timestamp(&self) -> u64 {
        self.world().l1.timestamp
    }

    pub fn set_l1_timestamp(&self, timestamp: u64) {
        self.world().l1.timestamp = timestamp;
    }

    pub fn advance_l1_time(&self, seconds: u64) {
        self.world().l1.timestamp += seconds;
    }

    /// Records a proof for the withdrawal as if another account had proven it.
    pub fn mark_proven(&self, source_tx: B256) {
        let mut world = self.world();
        let (withdrawal, l2_block) = world.withdrawal_of(source_tx);
        let output_index = world.output_index_for(l2_block).unwrap_or_default();
        let timestamp = world.l1.timestamp;
        world.proven.insert(
            withdrawal.withdrawal_hash,
            Proven {
                timestamp,
                output_index: U256::from(output_index),
                invalidated: false,
            },
        );
    }

    /// Simulates the output root behind a proof being deleted.
    pub fn invalidate_proof(&self, source_tx: B256) {
        let mut world = self.world();
        let (withdrawal, _) = world.withdrawal_of(source_tx);
        if let Some(proven) = world.proven.get_mut(&withdrawal.withdrawal_hash) {
            proven.invalidated = true;
        }
    }

    pub fn mark_finalized(&self, source_tx: B256) {
        let mut world = self.world();
        let (withdrawal, _) = world.withdrawal_of(source_tx);
        world.complete_withdrawal(withdrawal.withdrawal_hash);
    }

    pub fn reject_next_submission(&self, chain: Chain, reason: &str) {
        self.world().chain(chain).reject_next = Some(reason.to_string());
    }

    /// The next accepted transaction on `chain` is mined with a failed status.
    pub fn revert_next_submission(&self, chain: Chain) {
        self.world().chain(chain).revert_next = true;
    }

    pub fn fail_next_reads(&self, chain: Chain, count: u32) {
        self.fail_reads_after(chain, 0, count);
    }

    /// Lets `healthy` reads through, then fails the following `count`.
    pub fn fail_reads_after(&self, chain: Chain, healthy: u32, count: u32) {
        let mut world = self.world();
        let sim = world.chain(chain);
        sim.healthy_reads = healthy;
        sim.failing_reads = count;
    }

    /// Credits bridged token balance on L2 without going through a deposit.
    pub fn mint_l2_token(&self, owner: Address, amount: U256) {
        *self
            .world()
            .l2
            .tokens
            .entry((TOKEN_L2, owner))
            .or_default() += amount;
    }

    pub fn read_count(&self, chain: Chain) -> u32 {
        self.world().chain(chain).reads
    }

    pub fn submission_count(&self, chain: Chain) -> u32 {
        self.world().chain(chain).submissions
    }

    pub fn receipt(&self, chain: Chain, tx_hash: B256) -> Option<Receipt> {
        self.world().chain(chain).receipts.get(&tx_hash).cloned()
    }

    pub fn balance(&self, chain: Chain, owner: Address) -> U256 {
        self.world()
            .chain(chain)
            .balances
            .get(&owner)
            .copied()
            .unwrap_or_default()
    }

    pub fn token_balance(&self, chain: Chain, token: Address, owner: Address) -> U256 {
        self.world()
            .chain(chain)
            .tokens
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    /// Advances both chains every `period`: mines, relays deposits and
    /// publishes an output for the new L2 head.
    pub fn spawn_driver(&self, period: Duration) -> JoinHandle<()> {
        let sim = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                sim.mine_l1();
                let head = sim.mine_l2();
                sim.relay_deposits();
                sim.commit_l2_height(head);
            }
        })
    }
}

/// One side of the simulated pair.
pub struct SimClient {
    chain: Chain,
    world: Arc<Mutex<World>>,
}

impl SimClient {
    fn read(&self) -> Result<MutexGuard<'_, World>, ChainError> {
        let mut world = self.world.lock().unwrap();
        let sim = world.chain(self.chain);
        sim.reads += 1;
        if sim.healthy_reads > 0 {
            sim.healthy_reads -= 1;
        } else if sim.failing_reads > 0 {
            sim.failing_reads -= 1;
            return Err(ChainError::Rpc("simulated outage".to_string()));
        }
        Ok(world)
    }
}

#[async_trait]
impl ChainClient for SimClient {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn submit(&self, request: TxRequest) -> Result<B256, ChainError> {
        self.world.lock().unwrap().submit(self.chain, request)
    }

    async fn get_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError> {
        Ok(self.read()?.chain(self.chain).receipts.get(&tx_hash).cloned())
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
        Ok(self
            .read()?
            .chain(self.chain)
            .balances
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn get_token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        Ok(self
            .read()?
            .chain(self.chain)
            .tokens
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn get_timestamp(&self) -> Result<u64, ChainError> {
        Ok(self.read()?.chain(self.chain).timestamp)
    }

    fn account(&self) -> Option<Address> {
        Some(USER)
    }
}

#[async_trait]
impl SettlementChain for SimClient {
    async fn get_committed_height(&self) -> Result<u64, ChainError> {
        Ok(self.read()?.committed_height)
    }

    async fn get_challenge_period_seconds(&self) -> Result<u64, ChainError> {
        self.read()?;
        Ok(CHALLENGE_PERIOD)
    }

    async fn get_output_after(&self, l2_block: u64) -> Result<Option<OutputProposal>, ChainError> {
        let world = self.read()?;
        Ok(world.output_index_for(l2_block).map(|index| {
            let (l2_block_number, timestamp) = world.outputs[index];
            OutputProposal {
                index: U256::from(index),
                output_root: keccak256(l2_block_number.to_be_bytes()),
                l2_block_number,
                timestamp,
            }
        }))
    }

    async fn get_proven_withdrawal(
        &self,
        withdrawal_hash: B256,
    ) -> Result<Option<ProvenWithdrawal>, ChainError> {
        Ok(self
            .read()?
            .proven
            .get(&withdrawal_hash)
            .map(|proven| ProvenWithdrawal {
                timestamp: proven.timestamp,
                l2_output_index: proven.output_index,
                invalidated: proven.invalidated,
            }))
    }

    async fn is_withdrawal_finalized(&self, withdrawal_hash: B256) -> Result<bool, ChainError> {
        Ok(self.read()?.finalized.contains(&withdrawal_hash))
    }
}

#[async_trait]
impl RollupChain for SimClient {
    async fn is_message_relayed(&self, message_hash: B256) -> Result<bool, ChainError> {
        Ok(self.read()?.relayed.contains(&message_hash))
    }

    async fn get_withdrawal_proof(
        &self,
        withdrawal_hash: B256,
        l2_block: u64,
    ) -> Result<WithdrawalProof, ChainError> {
        self.read()?;
        Ok(WithdrawalProof {
            state_root: keccak256(l2_block.to_be_bytes()),
            message_passer_storage_root: keccak256(withdrawal_hash),
            block_hash: keccak256((l2_block, withdrawal_hash).abi_encode()),
            storage_proof: vec![Bytes::copy_from_slice(withdrawal_hash.as_slice())],
        })
    }
}
