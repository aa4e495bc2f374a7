use crate::abi::{
    decode_bool, decode_output_proposal, decode_proven_withdrawal, decode_revert_reason,
    decode_u256, encode_balance_of_call, encode_finalization_period_call,
    encode_finalized_withdrawals_call, encode_get_output_call, encode_latest_block_number_call,
    encode_output_index_after_call, encode_proven_withdrawals_call,
    encode_successful_messages_call, withdrawal_storage_slot,
};
use crate::chain::{
    ChainClient, OutputProposal, ProvenWithdrawal, Receipt, RollupChain, SettlementChain,
    TxRequest, WithdrawalProof,
};
use crate::config::{BridgePairConfig, ContractAddresses};
use crate::error::ChainError;
use crate::types::Chain;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::{BlockNumberOrTag, TransactionInput, TransactionRequest};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use url::Url;

/// JSON-RPC backed client for one side of the bridge pair.
pub struct RpcClient {
    chain: Chain,
    url: Url,
    provider: DynProvider,
    /// Same endpoint with the signer attached; absent for read-only use.
    wallet: Option<DynProvider>,
    account: Option<Address>,
    http: Client,
    contracts: ContractAddresses,
    challenge_period: OnceCell<u64>,
}

impl RpcClient {
    pub async fn connect(
        chain: Chain,
        pair: &BridgePairConfig,
        signer: Option<PrivateKeySigner>,
    ) -> Result<Self> {
        let endpoint = pair.endpoint(chain);
        let url: Url = endpoint
            .rpc
            .parse()
            .with_context(|| format!("invalid {chain} rpc url {}", endpoint.rpc))?;
        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();

        let (wallet, account) = match signer {
            Some(signer) => {
                let node_chain_id = provider
                    .get_chain_id()
                    .await
                    .with_context(|| format!("failed to reach {chain} rpc {url}"))?;
                if let Some(expected) = endpoint.chain_id {
                    if expected != node_chain_id {
                        anyhow::bail!(
                            "{chain} rpc {url} reports chainId {node_chain_id}, expected {expected}"
                        );
                    }
                }
                let account = signer.address();
                let wallet = ProviderBuilder::new()
                    .wallet(signer)
                    .with_chain_id(node_chain_id)
                    .connect_http(url.clone())
                    .erased();
                (Some(wallet), Some(account))
            }
            None => (None, None),
        };

        let challenge_period = OnceCell::new();
        if let (Chain::L1, Some(seconds)) = (chain, pair.challenge_period_seconds) {
            let _ = challenge_period.set(seconds);
        }

        tracing::debug!(%chain, %url, signer = ?account, "rpc client ready");
        Ok(Self {
            chain,
            url,
            provider,
            wallet,
            account,
            http: Client::new(),
            contracts: pair.contracts,
            challenge_period,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider.get_chain_id().await.map_err(ChainError::rpc)
    }

    pub async fn latest_block(&self) -> Result<u64, ChainError> {
        self.provider.get_block_number().await.map_err(ChainError::rpc)
    }

    pub async fn client_version(&self) -> Result<String, ChainError> {
        self.raw_rpc("web3_clientVersion", json!([])).await
    }

    async fn raw_rpc<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .http
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(ChainError::rpc)?;
        let status = response.status();
        let value: serde_json::Value = response.json().await.map_err(ChainError::rpc)?;
        if !status.is_success() {
            return Err(ChainError::Rpc(format!("rpc error status {status}: {value}")));
        }
        if let Some(error) = value.get("error") {
            return Err(ChainError::Rpc(format!("rpc error: {error}")));
        }
        serde_json::from_value(value.get("result").cloned().unwrap_or_default())
            .map_err(|err| ChainError::decode("rpc result", err))
    }

    async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let request = TransactionRequest {
            to: Some(TxKind::Call(to)),
            input: TransactionInput::new(data),
            ..Default::default()
        };
        self.provider.call(request).await.map_err(classify_rpc_error)
    }

    async fn output_at(&self, index: U256) -> Result<OutputProposal, ChainError> {
        let data = self
            .eth_call(self.contracts.l2_output_oracle, encode_get_output_call(index))
            .await?;
        let (output_root, timestamp, l2_block_number) =
            decode_output_proposal(&data).map_err(|err| ChainError::decode("getL2Output", err))?;
        Ok(OutputProposal {
            index,
            output_root,
            l2_block_number,
            timestamp,
        })
    }
}

/// Reverts become `Rejected` with the decoded reason; everything else is
/// treated as a transport problem.
fn classify_rpc_error(err: impl std::fmt::Display) -> ChainError {
    let text = err.to_string();
    match decode_revert_reason(&text) {
        Some(reason) => ChainError::Rejected { reason },
        None => ChainError::Rpc(text),
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn submit(&self, request: TxRequest) -> Result<B256, ChainError> {
        let wallet = self.wallet.as_ref().ok_or(ChainError::NoSigner(self.chain))?;
        let tx = TransactionRequest {
            to: Some(TxKind::Call(request.to)),
            input: TransactionInput::new(request.data),
            value: Some(request.value),
            ..Default::default()
        };
        let pending = wallet.send_transaction(tx).await.map_err(classify_rpc_error)?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!(chain = %self.chain, tx = %tx_hash, to = %request.to, "transaction sent");
        Ok(tx_hash)
    }

    async fn get_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(ChainError::rpc)?;
        Ok(receipt.map(|receipt| Receipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            success: receipt.status(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }))
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(ChainError::rpc)
    }

    async fn get_token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        let data = self.eth_call(token, encode_balance_of_call(owner)).await?;
        decode_u256(&data).map_err(|err| ChainError::decode("balanceOf", err))
    }

    async fn get_timestamp(&self) -> Result<u64, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(ChainError::rpc)?
            .ok_or_else(|| ChainError::Rpc("latest block not found".to_string()))?;
        Ok(block.header.timestamp)
    }

    fn account(&self) -> Option<Address> {
        self.account
    }
}

#[async_trait]
impl SettlementChain for RpcClient {
    async fn get_committed_height(&self) -> Result<u64, ChainError> {
        let data = self
            .eth_call(self.contracts.l2_output_oracle, encode_latest_block_number_call())
            .await?;
        let height = decode_u256(&data).map_err(|err| ChainError::decode("latestBlockNumber", err))?;
        Ok(height.saturating_to())
    }

    async fn get_challenge_period_seconds(&self) -> Result<u64, ChainError> {
        self.challenge_period
            .get_or_try_init(|| async {
                let data = self
                    .eth_call(self.contracts.l2_output_oracle, encode_finalization_period_call())
                    .await?;
                let seconds = decode_u256(&data)
                    .map_err(|err| ChainError::decode("FINALIZATION_PERIOD_SECONDS", err))?;
                tracing::debug!(%seconds, "read challenge period from oracle");
                Ok::<u64, ChainError>(seconds.saturating_to())
            })
            .await
            .copied()
    }

    async fn get_output_after(&self, l2_block: u64) -> Result<Option<OutputProposal>, ChainError> {
        if self.get_committed_height().await? < l2_block {
            return Ok(None);
        }
        let data = self
            .eth_call(
                self.contracts.l2_output_oracle,
                encode_output_index_after_call(l2_block),
            )
            .await?;
        let index =
            decode_u256(&data).map_err(|err| ChainError::decode("getL2OutputIndexAfter", err))?;
        self.output_at(index).await.map(Some)
    }

    async fn get_proven_withdrawal(
        &self,
        withdrawal_hash: B256,
    ) -> Result<Option<ProvenWithdrawal>, ChainError> {
        let data = self
            .eth_call(
                self.contracts.optimism_portal,
                encode_proven_withdrawals_call(withdrawal_hash),
            )
            .await?;
        let (output_root, timestamp, l2_output_index) = decode_proven_withdrawal(&data)
            .map_err(|err| ChainError::decode("provenWithdrawals", err))?;
        if timestamp == 0 {
            return Ok(None);
        }

        let invalidated = match self.output_at(l2_output_index).await {
            Ok(output) => output.output_root != output_root,
            // index past the end once outputs were deleted
            Err(ChainError::Rejected { .. }) => true,
            Err(err) => return Err(err),
        };
        Ok(Some(ProvenWithdrawal {
            timestamp,
            l2_output_index,
            invalidated,
        }))
    }

    async fn is_withdrawal_finalized(&self, withdrawal_hash: B256) -> Result<bool, ChainError> {
        let data = self
            .eth_call(
                self.contracts.optimism_portal,
                encode_finalized_withdrawals_call(withdrawal_hash),
            )
            .await?;
        decode_bool(&data).map_err(|err| ChainError::decode("finalizedWithdrawals", err))
    }
}

#[async_trait]
impl RollupChain for RpcClient {
    async fn is_message_relayed(&self, message_hash: B256) -> Result<bool, ChainError> {
        let data = self
            .eth_call(
                self.contracts.l2_cross_domain_messenger,
                encode_successful_messages_call(message_hash),
            )
            .await?;
        decode_bool(&data).map_err(|err| ChainError::decode("successfulMessages", err))
    }

    async fn get_withdrawal_proof(
        &self,
        withdrawal_hash: B256,
        l2_block: u64,
    ) -> Result<WithdrawalProof, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(l2_block))
            .await
            .map_err(ChainError::rpc)?
            .ok_or_else(|| ChainError::Rpc(format!("L2 block {l2_block} not found")))?;
        let proof = self
            .provider
            .get_proof(
                self.contracts.l2_to_l1_message_passer,
                vec![withdrawal_storage_slot(withdrawal_hash)],
            )
            .block_id(l2_block.into())
            .await
            .map_err(ChainError::rpc)?;
        let storage_proof = proof
            .storage_proof
            .into_iter()
            .next()
            .map(|slot| slot.proof)
            .ok_or_else(|| ChainError::decode("eth_getProof", "no storage proof returned"))?;

        Ok(WithdrawalProof {
            state_root: block.header.state_root,
            message_passer_storage_root: proof.storage_hash,
            block_hash: block.header.hash,
            storage_proof,
        })
    }
}
