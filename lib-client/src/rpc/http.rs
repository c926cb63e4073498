//! JSON-RPC over HTTP through alloy.

use std::fmt;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::eips::BlockNumberOrTag;
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use tracing::{debug, info};

use super::{ContractRpc, LogQuery, OutgoingTransaction, Receipt, RpcFailure};

/// Node connection over HTTP
///
/// Holds a local signer when built with one; transactions are signed
/// locally and broadcast with `eth_sendRawTransaction`.
#[derive(Clone)]
pub struct HttpRpc {
    provider: DynProvider,
    endpoint: Url,
    chain_id: u64,
    signer: Option<Address>,
}

impl fmt::Debug for HttpRpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRpc")
            .field("endpoint", &self.endpoint.as_str())
            .field("chain_id", &self.chain_id)
            .field("signer", &self.signer)
            .finish()
    }
}

impl HttpRpc {
    /// Connect to `endpoint` and probe the chain id.
    ///
    /// Fails with `Transport` when the endpoint is malformed or unreachable.
    pub async fn connect(
        endpoint: &str,
        signer: Option<PrivateKeySigner>,
    ) -> Result<Self, RpcFailure> {
        let url: Url = endpoint
            .parse()
            .map_err(|e| RpcFailure::Transport(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let signer_address = signer.as_ref().map(|s| s.address());
        let provider = match signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(url.clone())
                .erased(),
            None => ProviderBuilder::new().connect_http(url.clone()).erased(),
        };

        let chain_id = provider.get_chain_id().await.map_err(classify)?;
        info!(
            "Connected to {} (chain id {}, signer {:?})",
            url, chain_id, signer_address
        );

        Ok(Self {
            provider,
            endpoint: url,
            chain_id,
            signer: signer_address,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn signer(&self) -> Option<Address> {
        self.signer
    }
}

/// Sort a transport error into the failure classes the SDK acts on.
fn classify(err: TransportError) -> RpcFailure {
    match &err {
        RpcError::ErrorResp(payload) => {
            if let Some(data) = payload.as_revert_data() {
                RpcFailure::Revert {
                    message: payload.message.to_string(),
                    data,
                }
            } else if payload.message.contains("revert") {
                RpcFailure::Revert {
                    message: payload.message.to_string(),
                    data: Bytes::new(),
                }
            } else {
                RpcFailure::Rejected(payload.message.to_string())
            }
        }
        RpcError::Transport(_) => RpcFailure::Transport(err.to_string()),
        RpcError::NullResp => RpcFailure::Malformed("null response".to_string()),
        _ => RpcFailure::Malformed(err.to_string()),
    }
}

#[async_trait]
impl ContractRpc for HttpRpc {
    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        input: Bytes,
    ) -> Result<Bytes, RpcFailure> {
        let mut request = TransactionRequest::default().with_to(to).with_input(input);
        if let Some(from) = from {
            request = request.with_from(from);
        }
        self.provider.call(request).await.map_err(classify)
    }

    async fn send_transaction(&self, tx: OutgoingTransaction) -> Result<TxHash, RpcFailure> {
        if self.signer != Some(tx.from) {
            return Err(RpcFailure::Rejected(format!(
                "no local key for sender {}",
                tx.from
            )));
        }

        let request = TransactionRequest::default()
            .with_from(tx.from)
            .with_to(tx.to)
            .with_input(tx.input)
            .with_value(tx.value)
            .with_gas_limit(tx.gas_limit)
            .with_gas_price(tx.gas_price)
            .with_nonce(tx.nonce)
            .with_chain_id(self.chain_id);

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(classify)?;
        let hash = *pending.tx_hash();
        debug!("Broadcast {} with nonce {}", hash, tx.nonce);
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<Receipt>, RpcFailure> {
        let Some(receipt) = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(classify)?
        else {
            return Ok(None);
        };

        let block_number = receipt
            .block_number
            .ok_or_else(|| RpcFailure::Malformed(format!("receipt for {} has no block", hash)))?;

        Ok(Some(Receipt {
            transaction_hash: receipt.transaction_hash,
            block_number,
            success: receipt.status(),
            gas_used: receipt.gas_used,
            logs: receipt.inner.logs().to_vec(),
        }))
    }

    async fn latest_block_number(&self) -> Result<u64, RpcFailure> {
        self.provider.get_block_number().await.map_err(classify)
    }

    async fn latest_block_timestamp(&self) -> Result<u64, RpcFailure> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(classify)?
            .ok_or_else(|| RpcFailure::Malformed("node has no latest block".to_string()))?;
        Ok(block.header.timestamp)
    }

    async fn pending_nonce(&self, account: Address) -> Result<u64, RpcFailure> {
        self.provider
            .get_transaction_count(account)
            .pending()
            .await
            .map_err(classify)
    }

    async fn gas_price(&self) -> Result<u128, RpcFailure> {
        self.provider.get_gas_price().await.map_err(classify)
    }

    async fn logs(&self, query: LogQuery) -> Result<Vec<Log>, RpcFailure> {
        let mut filter = Filter::new()
            .address(query.address)
            .from_block(query.from_block);
        if let Some(to_block) = query.to_block {
            filter = filter.to_block(to_block);
        }
        if let Some(topic0) = query.topic0 {
            filter = filter.event_signature(topic0);
        }
        self.provider.get_logs(&filter).await.map_err(classify)
    }
}
