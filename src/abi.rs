use alloy_primitives::{keccak256, Address, Bytes, Log, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use anyhow::Result;

alloy_sol_types::sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct WithdrawalTransaction {
        uint256 nonce;
        address sender;
        address target;
        uint256 value;
        uint256 gasLimit;
        bytes data;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct OutputRootProof {
        bytes32 version;
        bytes32 stateRoot;
        bytes32 messagePasserStorageRoot;
        bytes32 latestBlockhash;
    }

    struct OutputProposal {
        bytes32 outputRoot;
        uint128 timestamp;
        uint128 l2BlockNumber;
    }

    // L1StandardBridge
    function depositETHTo(address _to, uint32 _minGasLimit, bytes _extraData) payable;
    function depositERC20To(address _l1Token, address _l2Token, address _to, uint256 _amount, uint32 _minGasLimit, bytes _extraData);

    // L2StandardBridge
    function withdrawTo(address _l2Token, address _to, uint256 _amount, uint32 _minGasLimit, bytes _extraData) payable;

    // CrossDomainMessenger
    function relayMessage(uint256 _nonce, address _sender, address _target, uint256 _value, uint256 _minGasLimit, bytes _message);
    function successfulMessages(bytes32 msgHash) view returns (bool);
    event SentMessage(address indexed target, address sender, bytes message, uint256 messageNonce, uint256 gasLimit);
    event SentMessageExtension1(address indexed sender, uint256 value);

    // L2ToL1MessagePasser
    event MessagePassed(uint256 indexed nonce, address indexed sender, address indexed target, uint256 value, uint256 gasLimit, bytes data, bytes32 withdrawalHash);

    // OptimismPortal
    function proveWithdrawalTransaction(WithdrawalTransaction _tx, uint256 _l2OutputIndex, OutputRootProof _outputRootProof, bytes[] _withdrawalProof);
    function finalizeWithdrawalTransaction(WithdrawalTransaction _tx);
    function provenWithdrawals(bytes32 withdrawalHash) view returns (bytes32 outputRoot, uint128 timestamp, uint128 l2OutputIndex);
    function finalizedWithdrawals(bytes32 withdrawalHash) view returns (bool);

    // L2OutputOracle
    function latestBlockNumber() view returns (uint256);
    function getL2OutputIndexAfter(uint256 _l2BlockNumber) view returns (uint256);
    function getL2Output(uint256 _l2OutputIndex) view returns (OutputProposal);
    function FINALIZATION_PERIOD_SECONDS() view returns (uint256);

    // ERC-20
    function balanceOf(address account) view returns (uint256);
    function approve(address spender, uint256 value) returns (bool);
}

/// Cross-domain message emitted by the L1 messenger for a deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCrossDomainMessage {
    pub target: Address,
    pub sender: Address,
    pub message: Bytes,
    pub nonce: U256,
    pub gas_limit: U256,
    pub value: U256,
}

impl SentCrossDomainMessage {
    /// Versioned message hash the L2 messenger records in `successfulMessages`.
    pub fn hash(&self) -> B256 {
        keccak256(encode_relay_message_call(self))
    }
}

pub fn encode_relay_message_call(message: &SentCrossDomainMessage) -> Bytes {
    let call = relayMessageCall {
        _nonce: message.nonce,
        _sender: message.sender,
        _target: message.target,
        _value: message.value,
        _minGasLimit: message.gas_limit,
        _message: message.message.clone(),
    };
    Bytes::from(call.abi_encode())
}

/// Finds the messenger's `SentMessage` and its value extension in a deposit receipt.
pub fn sent_message_from_logs(logs: &[Log], messenger: Address) -> Option<SentCrossDomainMessage> {
    let mut found: Option<SentCrossDomainMessage> = None;
    for log in logs.iter().filter(|log| log.address == messenger) {
        match log.data.topics().first() {
            Some(topic) if *topic == SentMessage::SIGNATURE_HASH && found.is_none() => {
                let Ok(event) = SentMessage::decode_log_data(&log.data) else {
                    continue;
                };
                found = Some(SentCrossDomainMessage {
                    target: event.target,
                    sender: event.sender,
                    message: event.message,
                    nonce: event.messageNonce,
                    gas_limit: event.gasLimit,
                    value: U256::ZERO,
                });
            }
            Some(topic) if *topic == SentMessageExtension1::SIGNATURE_HASH => {
                if let (Some(message), Ok(ext)) = (
                    found.as_mut(),
                    SentMessageExtension1::decode_log_data(&log.data),
                ) {
                    message.value = ext.value;
                    return found;
                }
            }
            _ => {}
        }
    }
    found
}

/// A withdrawal initiated on L2, as recorded by the message passer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassedWithdrawal {
    pub transaction: WithdrawalTransaction,
    pub withdrawal_hash: B256,
}

/// First `MessagePassed` event from the message passer whose declared hash
/// matches the withdrawal it describes.
pub fn withdrawal_from_logs(logs: &[Log], message_passer: Address) -> Option<PassedWithdrawal> {
    logs.iter()
        .filter(|log| log.address == message_passer)
        .filter(|log| log.data.topics().first() == Some(&MessagePassed::SIGNATURE_HASH))
        .filter_map(|log| MessagePassed::decode_log_data(&log.data).ok())
        .find_map(|event| {
            let transaction = WithdrawalTransaction {
                nonce: event.nonce,
                sender: event.sender,
                target: event.target,
                value: event.value,
                gasLimit: event.gasLimit,
                data: event.data,
            };
            let withdrawal_hash = hash_withdrawal(&transaction);
            if withdrawal_hash != event.withdrawalHash {
                tracing::warn!(
                    declared = %event.withdrawalHash,
                    computed = %withdrawal_hash,
                    "skipping MessagePassed event with inconsistent withdrawal hash"
                );
                return None;
            }
            Some(PassedWithdrawal {
                transaction,
                withdrawal_hash,
            })
        })
}

pub fn hash_withdrawal(transaction: &WithdrawalTransaction) -> B256 {
    keccak256(transaction.abi_encode_params())
}

/// Storage slot of `sentMessages[withdrawalHash]` in the L2 message passer.
pub fn withdrawal_storage_slot(withdrawal_hash: B256) -> B256 {
    keccak256((withdrawal_hash, U256::ZERO).abi_encode())
}

pub fn encode_deposit_eth_call(to: Address, min_gas_limit: u32) -> Bytes {
    let call = depositETHToCall {
        _to: to,
        _minGasLimit: min_gas_limit,
        _extraData: Bytes::new(),
    };
    Bytes::from(call.abi_encode())
}

pub fn encode_deposit_erc20_call(
    l1_token: Address,
    l2_token: Address,
    to: Address,
    amount: U256,
    min_gas_limit: u32,
) -> Bytes {
    let call = depositERC20ToCall {
        _l1Token: l1_token,
        _l2Token: l2_token,
        _to: to,
        _amount: amount,
        _minGasLimit: min_gas_limit,
        _extraData: Bytes::new(),
    };
    Bytes::from(call.abi_encode())
}

pub fn encode_withdraw_call(l2_token: Address, to: Address, amount: U256, min_gas_limit: u32) -> Bytes {
    let call = withdrawToCall {
        _l2Token: l2_token,
        _to: to,
        _amount: amount,
        _minGasLimit: min_gas_limit,
        _extraData: Bytes::new(),
    };
    Bytes::from(call.abi_encode())
}

pub fn encode_approve_call(spender: Address, amount: U256) -> Bytes {
    Bytes::from(
        approveCall {
            spender,
            value: amount,
        }
        .abi_encode(),
    )
}

pub fn encode_prove_call(
    transaction: WithdrawalTransaction,
    l2_output_index: U256,
    output_root_proof: OutputRootProof,
    withdrawal_proof: Vec<Bytes>,
) -> Bytes {
    let call = proveWithdrawalTransactionCall {
        _tx: transaction,
        _l2OutputIndex: l2_output_index,
        _outputRootProof: output_root_proof,
        _withdrawalProof: withdrawal_proof,
    };
    Bytes::from(call.abi_encode())
}

pub fn encode_finalize_call(transaction: WithdrawalTransaction) -> Bytes {
    Bytes::from(finalizeWithdrawalTransactionCall { _tx: transaction }.abi_encode())
}

pub fn encode_successful_messages_call(message_hash: B256) -> Bytes {
    Bytes::from(successfulMessagesCall { msgHash: message_hash }.abi_encode())
}

pub fn encode_proven_withdrawals_call(withdrawal_hash: B256) -> Bytes {
    Bytes::from(
        provenWithdrawalsCall {
            withdrawalHash: withdrawal_hash,
        }
        .abi_encode(),
    )
}

pub fn encode_finalized_withdrawals_call(withdrawal_hash: B256) -> Bytes {
    Bytes::from(
        finalizedWithdrawalsCall {
            withdrawalHash: withdrawal_hash,
        }
        .abi_encode(),
    )
}

pub fn encode_latest_block_number_call() -> Bytes {
    Bytes::from(latestBlockNumberCall {}.abi_encode())
}

pub fn encode_output_index_after_call(l2_block: u64) -> Bytes {
    Bytes::from(
        getL2OutputIndexAfterCall {
            _l2BlockNumber: U256::from(l2_block),
        }
        .abi_encode(),
    )
}

pub fn encode_get_output_call(index: U256) -> Bytes {
    Bytes::from(getL2OutputCall { _l2OutputIndex: index }.abi_encode())
}

pub fn encode_finalization_period_call() -> Bytes {
    Bytes::from(FINALIZATION_PERIOD_SECONDSCall {}.abi_encode())
}

pub fn encode_balance_of_call(account: Address) -> Bytes {
    Bytes::from(balanceOfCall { account }.abi_encode())
}

pub fn decode_bool(data: &[u8]) -> Result<bool> {
    Ok(bool::abi_decode(data)?)
}

pub fn decode_u256(data: &[u8]) -> Result<U256> {
    Ok(U256::abi_decode(data)?)
}

/// `(outputRoot, timestamp, l2OutputIndex)` of a proven withdrawal.
pub fn decode_proven_withdrawal(data: &[u8]) -> Result<(B256, u64, U256)> {
    let decoded = provenWithdrawalsCall::abi_decode_returns(data)?;
    Ok((
        decoded.outputRoot,
        u64::try_from(decoded.timestamp)?,
        U256::from(decoded.l2OutputIndex),
    ))
}

pub fn decode_output_proposal(data: &[u8]) -> Result<(B256, u64, u64)> {
    let decoded = getL2OutputCall::abi_decode_returns(data)?;
    Ok((
        decoded.outputRoot,
        u64::try_from(decoded.timestamp)?,
        u64::try_from(decoded.l2BlockNumber)?,
    ))
}

/// Pulls a human-readable reason out of an RPC error that carries revert data.
///
/// Handles `Error(string)` and `Panic(uint256)` payloads; otherwise returns the
/// textual message the node gave, since many nodes already include the reason.
pub fn decode_revert_reason(message: &str) -> Option<String> {
    if let Some(hex_start) = message.find("0x") {
        let hex_data = &message[hex_start..];
        let hex_end = hex_data
            .find(|c: char| !c.is_ascii_hexdigit() && c != 'x')
            .unwrap_or(hex_data.len());
        if let Ok(data) = hex::decode(&hex_data[2..hex_end]) {
            if data.len() >= 4 {
                let selector = &data[..4];
                if selector == [0x08, 0xc3, 0x79, 0xa0] {
                    if let Ok(reason) = String::abi_decode(&data[4..]) {
                        return Some(reason);
                    }
                } else if selector == [0x4e, 0x48, 0x7b, 0x71] && data.len() >= 36 {
                    let code = U256::from_be_slice(&data[4..36]);
                    return Some(format!("panic({code})"));
                }
            }
        }
    }
    message
        .find("execution reverted")
        .map(|start| message[start..].to_string())
}
