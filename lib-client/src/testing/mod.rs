//! In-memory chain for tests and demos
//!
//! [`MockChain`] implements [`ContractRpc`] over a simulated
//! MockUSDT and R2SCampaign pair. It keeps a transaction pool with
//! per-account nonce rules, mines blocks automatically or on demand, and
//! can inject transport failures, node rejections and mined reverts.

mod state;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::{address, keccak256, Address, Bytes, TxHash, U256};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use tracing::debug;

use crate::clock::ChainClock;
use crate::config::{ContractAddresses, SdkConfig};
use crate::error::Result;
use crate::rpc::{ContractRpc, LogQuery, OutgoingTransaction, Receipt, RpcFailure};
use crate::sender::bump_gas_price;
use crate::{ReadOnlyClient, SigningClient};

pub use state::{
    EARLY_WITHDRAW_PENALTY_BPS, MAX_DISCOUNT_BPS, MERCHANT_FEE_BPS, PLATFORM_FEE_BPS, START_DELAY,
    TOKEN_DECIMALS,
};
use state::Contracts;

/// Token owner and fee collector on a fresh chain
pub const DEPLOYER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Block timestamp of a fresh chain
pub const GENESIS_TIME: u64 = 1_700_000_000;

pub const DEFAULT_GAS_PRICE: u128 = 1_000_000_000;

const CHAIN_ID: u64 = 31_337;

#[derive(Debug, Clone)]
struct PooledTx {
    hash: TxHash,
    tx: OutgoingTransaction,
}

#[derive(Debug)]
struct ChainState {
    contracts: Contracts,
    time: u64,
    block_number: u64,
    gas_price: u128,
    auto_mine: bool,
    /// Mined transaction count per account
    nonces: HashMap<Address, u64>,
    pool: Vec<PooledTx>,
    receipts: HashMap<TxHash, Receipt>,
    logs: Vec<Log>,
    calls: usize,
    sends: usize,
    fail_calls: u32,
    reject_sends: u32,
    revert_mined: u32,
}

impl ChainState {
    fn mined_nonce(&self, account: Address) -> u64 {
        self.nonces.get(&account).copied().unwrap_or(0)
    }

    fn pending_nonce(&self, account: Address) -> u64 {
        let pooled = self.pool.iter().filter(|p| p.tx.from == account).count() as u64;
        self.mined_nonce(account) + pooled
    }

    fn accept(&mut self, tx: OutgoingTransaction) -> std::result::Result<TxHash, RpcFailure> {
        let mined = self.mined_nonce(tx.from);
        if tx.nonce < mined {
            return Err(RpcFailure::Rejected(format!(
                "nonce too low: next nonce {}, tx nonce {}",
                mined, tx.nonce
            )));
        }

        let hash = transaction_hash(&tx);
        if let Some(slot) = self
            .pool
            .iter_mut()
            .find(|p| p.tx.from == tx.from && p.tx.nonce == tx.nonce)
        {
            if tx.gas_price < bump_gas_price(slot.tx.gas_price) {
                return Err(RpcFailure::Rejected(
                    "replacement transaction underpriced".to_string(),
                ));
            }
            debug!("Replacing {} with {}", slot.hash, hash);
            *slot = PooledTx { hash, tx };
            return Ok(hash);
        }

        let pending = self.pending_nonce(tx.from);
        if tx.nonce > pending {
            return Err(RpcFailure::Rejected(format!(
                "nonce too high: next nonce {}, tx nonce {}",
                pending, tx.nonce
            )));
        }
        self.pool.push(PooledTx { hash, tx });
        Ok(hash)
    }

    fn mine(&mut self) -> u64 {
        self.block_number += 1;
        let block = self.block_number;
        let mut pool = std::mem::take(&mut self.pool);
        pool.sort_by_key(|p| (p.tx.from, p.tx.nonce));

        for pooled in pool {
            let PooledTx { hash, tx } = pooled;
            *self.nonces.entry(tx.from).or_default() += 1;

            let forced_revert = self.revert_mined > 0;
            if forced_revert {
                self.revert_mined -= 1;
            }
            let outcome = if forced_revert {
                None
            } else {
                self.contracts
                    .execute(tx.from, tx.to, &tx.input, self.time)
                    .ok()
            };

            let mut logs = Vec::new();
            if let Some(execution) = &outcome {
                for (data, emitter) in execution.logs.iter().zip(&execution.emitters) {
                    let log = Log {
                        inner: alloy::primitives::Log {
                            address: *emitter,
                            data: data.clone(),
                        },
                        block_number: Some(block),
                        block_timestamp: Some(self.time),
                        transaction_hash: Some(hash),
                        log_index: Some(self.logs.len() as u64),
                        ..Default::default()
                    };
                    self.logs.push(log.clone());
                    logs.push(log);
                }
            }

            debug!(
                "Mined {} in block {} (success: {})",
                hash,
                block,
                outcome.is_some()
            );
            self.receipts.insert(
                hash,
                Receipt {
                    transaction_hash: hash,
                    block_number: block,
                    success: outcome.is_some(),
                    gas_used: 21_000 + 16 * tx.input.len() as u64,
                    logs,
                },
            );
        }
        block
    }
}

fn transaction_hash(tx: &OutgoingTransaction) -> TxHash {
    let mut preimage = Vec::with_capacity(80 + tx.input.len());
    preimage.extend_from_slice(tx.from.as_slice());
    preimage.extend_from_slice(tx.to.as_slice());
    preimage.extend_from_slice(&tx.nonce.to_be_bytes());
    preimage.extend_from_slice(&tx.gas_price.to_be_bytes());
    preimage.extend_from_slice(&tx.value.to_be_bytes::<32>());
    preimage.extend_from_slice(&tx.input);
    keccak256(preimage)
}

/// Simulated node with both contracts deployed
#[derive(Debug, Clone)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    /// Fresh chain at [`GENESIS_TIME`], contracts at [`ContractAddresses::local`],
    /// auto-mining on.
    pub fn new() -> Self {
        Self::with_addresses(ContractAddresses::local())
    }

    pub fn with_addresses(addresses: ContractAddresses) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState {
                contracts: Contracts::new(addresses, DEPLOYER),
                time: GENESIS_TIME,
                block_number: 0,
                gas_price: DEFAULT_GAS_PRICE,
                auto_mine: true,
                nonces: HashMap::new(),
                pool: Vec::new(),
                receipts: HashMap::new(),
                logs: Vec::new(),
                calls: 0,
                sends: 0,
                fail_calls: 0,
                reject_sends: 0,
                revert_mined: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn addresses(&self) -> ContractAddresses {
        self.lock().contracts.addresses
    }

    pub fn deployer(&self) -> Address {
        DEPLOYER
    }

    pub fn chain_id(&self) -> u64 {
        CHAIN_ID
    }

    /// SDK settings pointing at this chain, with fast polling.
    pub fn config(&self) -> SdkConfig {
        SdkConfig {
            contracts: self.addresses(),
            poll_interval_ms: 10,
            receipt_timeout_secs: 5,
            retry_backoff_ms: 1,
            ..SdkConfig::default()
        }
    }

    pub fn read_only_client(&self) -> Result<ReadOnlyClient> {
        let rpc: Arc<dyn ContractRpc> = Arc::new(self.clone());
        ReadOnlyClient::from_rpc(rpc.clone(), self.config(), Arc::new(ChainClock::new(rpc)))
    }

    pub fn signing_client(&self, account: Address) -> Result<SigningClient> {
        self.signing_client_with(account, self.config())
    }

    pub fn signing_client_with(&self, account: Address, config: SdkConfig) -> Result<SigningClient> {
        let rpc: Arc<dyn ContractRpc> = Arc::new(self.clone());
        SigningClient::from_rpc(rpc.clone(), account, config, Arc::new(ChainClock::new(rpc)))
    }

    /// Mint `amount` to `account` without a transaction.
    pub fn fund(&self, account: Address, amount: U256) {
        self.lock().contracts.mint_unchecked(account, amount);
    }

    /// Set an allowance without a transaction.
    pub fn approve(&self, owner: Address, spender: Address, amount: U256) {
        self.lock().contracts.set_allowance(owner, spender, amount);
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.lock().contracts.balance(account)
    }

    pub fn advance_time(&self, by: Duration) {
        self.lock().time += by.as_secs();
    }

    pub fn timestamp(&self) -> u64 {
        self.lock().time
    }

    pub fn block_number(&self) -> u64 {
        self.lock().block_number
    }

    pub fn set_gas_price(&self, price: u128) {
        self.lock().gas_price = price;
    }

    /// With auto-mining off, transactions wait in the pool until [`mine`](Self::mine).
    pub fn set_auto_mine(&self, enabled: bool) {
        self.lock().auto_mine = enabled;
    }

    /// Mine one block with everything in the pool; returns its number.
    pub fn mine(&self) -> u64 {
        self.lock().mine()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pool.len()
    }

    /// `eth_call` requests seen, failed ones included
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }

    /// Broadcast attempts seen, rejected ones included
    pub fn send_count(&self) -> usize {
        self.lock().sends
    }

    /// The next `n` `eth_call`s or head-timestamp reads fail in transport.
    pub fn fail_next_calls(&self, n: u32) {
        self.lock().fail_calls = n;
    }

    pub fn reject_next_sends(&self, n: u32) {
        self.lock().reject_sends = n;
    }

    /// The next `n` mined transactions revert regardless of their effect.
    pub fn revert_next_mined(&self, n: u32) {
        self.lock().revert_mined = n;
    }
}

#[async_trait]
impl ContractRpc for MockChain {
    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        input: Bytes,
    ) -> std::result::Result<Bytes, RpcFailure> {
        let mut state = self.lock();
        state.calls += 1;
        if state.fail_calls > 0 {
            state.fail_calls -= 1;
            return Err(RpcFailure::Transport("connection reset".to_string()));
        }

        // Execute against a copy; calls never change state
        let mut scratch = state.contracts.clone();
        scratch
            .execute(from.unwrap_or(Address::ZERO), to, &input, state.time)
            .map(|execution| execution.output)
            .map_err(|reason| RpcFailure::Revert {
                message: reason.message.clone(),
                data: reason.data,
            })
    }

    async fn send_transaction(
        &self,
        tx: OutgoingTransaction,
    ) -> std::result::Result<TxHash, RpcFailure> {
        let mut state = self.lock();
        state.sends += 1;
        if state.reject_sends > 0 {
            state.reject_sends -= 1;
            return Err(RpcFailure::Rejected("transaction rejected".to_string()));
        }

        let hash = state.accept(tx)?;
        if state.auto_mine {
            state.mine();
        }
        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> std::result::Result<Option<Receipt>, RpcFailure> {
        Ok(self.lock().receipts.get(&hash).cloned())
    }

    async fn latest_block_number(&self) -> std::result::Result<u64, RpcFailure> {
        Ok(self.block_number())
    }

    async fn latest_block_timestamp(&self) -> std::result::Result<u64, RpcFailure> {
        let mut state = self.lock();
        if state.fail_calls > 0 {
            state.fail_calls -= 1;
            return Err(RpcFailure::Transport("connection reset".to_string()));
        }
        Ok(state.time)
    }

    async fn pending_nonce(&self, account: Address) -> std::result::Result<u64, RpcFailure> {
        Ok(self.lock().pending_nonce(account))
    }

    async fn gas_price(&self) -> std::result::Result<u128, RpcFailure> {
        Ok(self.lock().gas_price)
    }

    async fn logs(&self, query: LogQuery) -> std::result::Result<Vec<Log>, RpcFailure> {
        let state = self.lock();
        let to_block = query.to_block.unwrap_or(state.block_number);
        Ok(state
            .logs
            .iter()
            .filter(|log| log.address() == query.address)
            .filter(|log| {
                let block = log.block_number.unwrap_or_default();
                block >= query.from_block && block <= to_block
            })
            .filter(|log| match query.topic0 {
                Some(topic) => log.topics().first() == Some(&topic),
                None => true,
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(from: Address, nonce: u64, gas_price: u128) -> OutgoingTransaction {
        OutgoingTransaction {
            from,
            to: from,
            input: Bytes::new(),
            value: U256::ZERO,
            gas_limit: 21_000,
            gas_price,
            nonce,
        }
    }

    #[tokio::test]
    async fn test_auto_mine_produces_receipt() {
        let chain = MockChain::new();
        let hash = chain
            .send_transaction(transfer(DEPLOYER, 0, DEFAULT_GAS_PRICE))
            .await
            .unwrap();
        let receipt = chain.transaction_receipt(hash).await.unwrap().unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.block_number, 1);
        assert_eq!(chain.pending_nonce(DEPLOYER).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_nonce_rejected() {
        let chain = MockChain::new();
        chain
            .send_transaction(transfer(DEPLOYER, 0, DEFAULT_GAS_PRICE))
            .await
            .unwrap();
        let err = chain
            .send_transaction(transfer(DEPLOYER, 0, DEFAULT_GAS_PRICE))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcFailure::Rejected(_)));
    }

    #[tokio::test]
    async fn test_replacement_needs_higher_price() {
        let chain = MockChain::new();
        chain.set_auto_mine(false);
        let original = chain
            .send_transaction(transfer(DEPLOYER, 0, 100))
            .await
            .unwrap();

        let err = chain
            .send_transaction(transfer(DEPLOYER, 0, 105))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RpcFailure::Rejected("replacement transaction underpriced".to_string())
        );

        let replacement = chain
            .send_transaction(transfer(DEPLOYER, 0, 113))
            .await
            .unwrap();
        assert_eq!(chain.pending_count(), 1);
        chain.mine();

        assert!(chain.transaction_receipt(original).await.unwrap().is_none());
        assert!(chain.transaction_receipt(replacement).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_calls_do_not_change_state() {
        let chain = MockChain::new();
        let holder = Address::repeat_byte(0x31);
        chain.fund(holder, U256::from(10u64));

        let input = crate::abi::MockUSDT::burnCall {
            value: U256::from(4u64),
        };
        let input = Bytes::from(alloy::sol_types::SolCall::abi_encode(&input));
        chain
            .call(Some(holder), chain.addresses().token, input)
            .await
            .unwrap();
        assert_eq!(chain.balance(holder), U256::from(10u64));
    }

    #[tokio::test]
    async fn test_decimals_return_word() {
        use alloy::sol_types::SolCall;

        let chain = MockChain::new();
        let input = Bytes::from(crate::abi::MockUSDT::decimalsCall {}.abi_encode());
        let output = chain
            .call(None, chain.addresses().token, input)
            .await
            .unwrap();
        assert_eq!(output.len(), 32);
        let decimals = crate::abi::MockUSDT::decimalsCall::abi_decode_returns(&output).unwrap();
        assert_eq!(decimals, TOKEN_DECIMALS);
    }

    #[tokio::test]
    async fn test_forced_revert_leaves_state() {
        let chain = MockChain::new();
        chain.revert_next_mined(1);
        let hash = chain
            .send_transaction(transfer(DEPLOYER, 0, DEFAULT_GAS_PRICE))
            .await
            .unwrap();
        let receipt = chain.transaction_receipt(hash).await.unwrap().unwrap();
        assert!(!receipt.success);
        assert!(receipt.logs.is_empty());
    }
}
