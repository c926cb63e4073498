//! Contract RPC boundary
//!
//! [`ContractRpc`] is everything the SDK needs from a node: `eth_call`,
//! raw submission of an already-assembled transaction, receipts, the chain
//! head and its timestamp, nonces, gas price and logs. The SDK owns nonce assignment and
//! confirmation policy; the implementation only moves bytes.
//!
//! [`HttpRpc`] talks to a real node through alloy. `testing::MockChain`
//! simulates both contracts in memory.

pub mod http;

use std::fmt;

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpRpc;

/// A fully assembled transaction, ready to sign and broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingTransaction {
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    /// Legacy gas price in wei
    pub gas_price: u128,
    pub nonce: u64,
}

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// `false` when execution reverted
    pub success: bool,
    pub gas_used: u64,
    pub logs: Vec<Log>,
}

/// Log filter for one contract and, optionally, one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub topic0: Option<B256>,
    pub from_block: u64,
    /// Inclusive upper bound, `None` for the chain head
    pub to_block: Option<u64>,
}

/// Failure reported by the node or the transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcFailure {
    /// Endpoint unreachable or the connection dropped
    #[error("transport failure: {0}")]
    Transport(String),

    /// Node refused the transaction before inclusion (nonce, funds, gas)
    #[error("rejected by node: {0}")]
    Rejected(String),

    /// Execution reverted during `eth_call` or gas estimation
    #[error("execution reverted: {message}")]
    Revert { message: String, data: Bytes },

    /// Node answered with something that cannot be interpreted
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RpcFailure {
    pub fn is_transient(&self) -> bool {
        matches!(self, RpcFailure::Transport(_))
    }
}

/// Node capability consumed by the SDK
#[async_trait]
pub trait ContractRpc: Send + Sync + fmt::Debug {
    /// `eth_call` against the latest block
    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        input: Bytes,
    ) -> Result<Bytes, RpcFailure>;

    /// Sign and broadcast; returns once the node accepted the transaction
    async fn send_transaction(&self, tx: OutgoingTransaction) -> Result<TxHash, RpcFailure>;

    /// `None` while the transaction is not mined
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<Receipt>, RpcFailure>;

    async fn latest_block_number(&self) -> Result<u64, RpcFailure>;

    /// `block.timestamp` of the chain head, in Unix seconds
    async fn latest_block_timestamp(&self) -> Result<u64, RpcFailure>;

    /// Next nonce for `account`, counting pool transactions
    async fn pending_nonce(&self, account: Address) -> Result<u64, RpcFailure>;

    async fn gas_price(&self) -> Result<u128, RpcFailure>;

    async fn logs(&self, query: LogQuery) -> Result<Vec<Log>, RpcFailure>;
}
