//! Client construction and capabilities
//!
//! A [`ReadOnlyClient`] can only query. A [`SigningClient`] wraps one and
//! adds the state-changing operations; there is no way to reach a mutating
//! method without a signing key having been loaded.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use lib_campaign::Campaign;

use crate::abi::{AbiRegistry, MOCK_USDT, R2S_CAMPAIGN};
use crate::campaign::{CampaignReader, CampaignWriter};
use crate::clock::{ChainClock, Clock};
use crate::config::{ContractAddresses, SdkConfig};
use crate::contract::{ContractHandle, RetryPolicy};
use crate::error::{Result, SdkError};
use crate::pending::PendingTx;
use crate::rpc::{ContractRpc, HttpRpc};
use crate::sender::TransactionSender;
use crate::token::{TokenReader, TokenWriter};

/// Query-only access to both contracts
#[derive(Debug, Clone)]
pub struct ReadOnlyClient {
    config: SdkConfig,
    rpc: Arc<dyn ContractRpc>,
    token: TokenReader,
    campaign: CampaignReader,
}

impl ReadOnlyClient {
    /// Build on an existing connection.
    pub fn from_rpc(
        rpc: Arc<dyn ContractRpc>,
        config: SdkConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let registry = AbiRegistry::r2s()?;
        let retry = RetryPolicy::from_config(&config);

        let token = TokenReader::new(ContractHandle::new(
            registry.get(MOCK_USDT)?,
            config.contracts.token,
            rpc.clone(),
            retry,
        ));
        let campaign = CampaignReader::new(
            ContractHandle::new(
                registry.get(R2S_CAMPAIGN)?,
                config.contracts.campaign,
                rpc.clone(),
                retry,
            ),
            clock,
        );

        Ok(Self {
            config,
            rpc,
            token,
            campaign,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn addresses(&self) -> ContractAddresses {
        self.config.contracts
    }

    pub fn token(&self) -> &TokenReader {
        &self.token
    }

    pub fn campaign(&self) -> &CampaignReader {
        &self.campaign
    }

    pub async fn block_number(&self) -> Result<u64> {
        self.rpc
            .latest_block_number()
            .await
            .map_err(SdkError::from_node)
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        self.token.balance_of(account).await
    }

    pub async fn get_campaign(&self, id: U256) -> Result<Campaign> {
        self.campaign.get_campaign(id).await
    }
}

/// Read and write access for one signer
#[derive(Debug, Clone)]
pub struct SigningClient {
    reader: ReadOnlyClient,
    sender: TransactionSender,
    token: TokenWriter,
    campaign: CampaignWriter,
}

impl SigningClient {
    /// Build on a connection that can sign for `account`.
    ///
    /// `clock` drives the local lifecycle checks. [`ChainClock`] matches the
    /// contract; [`crate::SystemClock`] trusts the host instead.
    pub fn from_rpc(
        rpc: Arc<dyn ContractRpc>,
        account: Address,
        config: SdkConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let sender = TransactionSender::new(account, rpc.clone(), &config);
        let reader = ReadOnlyClient::from_rpc(rpc, config, clock)?;
        Ok(Self::with_reader(reader, sender))
    }

    fn with_reader(reader: ReadOnlyClient, sender: TransactionSender) -> Self {
        let token = TokenWriter::new(reader.token.clone(), sender.clone());
        let campaign = CampaignWriter::new(
            reader.campaign.clone(),
            reader.token.clone(),
            sender.clone(),
        );
        Self {
            reader,
            sender,
            token,
            campaign,
        }
    }

    pub fn account(&self) -> Address {
        self.sender.account()
    }

    pub fn reader(&self) -> &ReadOnlyClient {
        &self.reader
    }

    pub fn token(&self) -> &TokenWriter {
        &self.token
    }

    pub fn campaign(&self) -> &CampaignWriter {
        &self.campaign
    }

    pub fn sender(&self) -> &TransactionSender {
        &self.sender
    }

    /// Attempt to supersede `pending`; see [`TransactionSender::cancel`].
    pub async fn cancel(&self, pending: &PendingTx) -> Result<PendingTx> {
        self.sender.cancel(pending).await
    }
}

/// An SDK instance in one of its two capabilities
#[derive(Debug, Clone)]
pub enum Sdk {
    ReadOnly(ReadOnlyClient),
    Signing(SigningClient),
}

impl Sdk {
    /// Connect to `config.rpc_url`, signing with `signing_key` when given.
    ///
    /// The key is a hex private key, with or without `0x`. It never appears
    /// in errors or logs.
    pub async fn connect(config: SdkConfig, signing_key: Option<&str>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SdkError::Initialization(e.to_string()))?;

        let signer = signing_key
            .map(|key| {
                PrivateKeySigner::from_str(key.trim())
                    .map_err(|_| SdkError::Initialization("malformed signing key".to_string()))
            })
            .transpose()?;
        let account = signer.as_ref().map(|s| s.address());

        let rpc = HttpRpc::connect(&config.rpc_url, signer)
            .await
            .map_err(|e| {
                SdkError::Initialization(format!("cannot connect to {}: {}", config.rpc_url, e))
            })?;
        let rpc: Arc<dyn ContractRpc> = Arc::new(rpc);
        let clock: Arc<dyn Clock> = Arc::new(ChainClock::new(rpc.clone()));

        match account {
            Some(account) => Ok(Sdk::Signing(SigningClient::from_rpc(
                rpc, account, config, clock,
            )?)),
            None => Ok(Sdk::ReadOnly(ReadOnlyClient::from_rpc(rpc, config, clock)?)),
        }
    }

    pub fn reader(&self) -> &ReadOnlyClient {
        match self {
            Sdk::ReadOnly(reader) => reader,
            Sdk::Signing(signer) => signer.reader(),
        }
    }

    pub fn signer(&self) -> Option<&SigningClient> {
        match self {
            Sdk::ReadOnly(_) => None,
            Sdk::Signing(signer) => Some(signer),
        }
    }

    pub fn is_signing(&self) -> bool {
        matches!(self, Sdk::Signing(_))
    }

    pub fn into_signing(self) -> Result<SigningClient> {
        match self {
            Sdk::Signing(signer) => Ok(signer),
            Sdk::ReadOnly(_) => Err(SdkError::Initialization(
                "client was created without a signing key".to_string(),
            )),
        }
    }
}

/// Connect with default settings to `rpc_endpoint`.
pub async fn new_sdk(rpc_endpoint: &str, signing_key: Option<&str>) -> Result<Sdk> {
    Sdk::connect(SdkConfig::with_endpoint(rpc_endpoint), signing_key).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const DEV_KEY: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    #[tokio::test]
    async fn test_malformed_endpoint_fails_initialization() {
        let err = new_sdk("definitely not a url", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
    }

    #[tokio::test]
    async fn test_malformed_key_is_not_echoed() {
        let key = "0xnot-a-key-but-still-secret";
        let err = new_sdk("http://127.0.0.1:9", Some(key)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_unreachable_node_fails_initialization() {
        let err = new_sdk("http://127.0.0.1:9", Some(DEV_KEY)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
        assert!(!err.to_string().contains(&DEV_KEY[2..]));
    }
}
