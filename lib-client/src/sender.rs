//! Transaction submission for one signer.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use tracing::info;

use crate::config::SdkConfig;
use crate::contract::PreparedCall;
use crate::error::{CallContext, Result, SdkError};
use crate::nonce::NonceManager;
use crate::pending::{ConfirmPolicy, PendingTx};
use crate::rpc::{ContractRpc, OutgoingTransaction};

/// Gas for a plain value transfer
pub const TRANSFER_GAS: u64 = 21_000;

/// Smallest gas price bump a node accepts for a replacement, in eighths
const REPLACEMENT_BUMP_DIVISOR: u128 = 8;

/// Submits prepared calls from one account
#[derive(Debug, Clone)]
pub struct TransactionSender {
    account: Address,
    rpc: Arc<dyn ContractRpc>,
    nonces: Arc<NonceManager>,
    gas_limit: u64,
    gas_price: Option<u128>,
    policy: ConfirmPolicy,
}

impl TransactionSender {
    pub fn new(account: Address, rpc: Arc<dyn ContractRpc>, config: &SdkConfig) -> Self {
        Self {
            account,
            rpc,
            nonces: Arc::new(NonceManager::new(account)),
            gas_limit: config.gas_limit,
            gas_price: config.gas_price.map(u128::from),
            policy: ConfirmPolicy::from_config(config),
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn nonces(&self) -> &NonceManager {
        &self.nonces
    }

    pub fn policy(&self) -> ConfirmPolicy {
        self.policy
    }

    async fn current_gas_price(&self) -> Result<u128> {
        match self.gas_price {
            Some(price) => Ok(price),
            None => self.rpc.gas_price().await.map_err(SdkError::from_node),
        }
    }

    /// Simulate, then sign and broadcast `call`.
    ///
    /// A call that reverts in simulation is never broadcast. The returned
    /// [`PendingTx`] only means the node accepted the transaction.
    pub async fn submit(&self, call: PreparedCall) -> Result<PendingTx> {
        let PreparedCall { to, input, context } = call;

        if let Err(failure) = self.rpc.call(Some(self.account), to, input.clone()).await {
            return Err(SdkError::from_submission(failure, context));
        }

        let gas_price = self.current_gas_price().await?;
        let gas_limit = self.gas_limit;
        let from = self.account;

        let (hash, tx) = self
            .nonces
            .submit(self.rpc.as_ref(), move |nonce| OutgoingTransaction {
                from,
                to,
                input,
                value: U256::ZERO,
                gas_limit,
                gas_price,
                nonce,
            })
            .await
            .map_err(|failure| SdkError::from_submission(failure, context.clone()))?;

        info!(
            "Submitted {} as {} (nonce {}, gas price {})",
            context.method, hash, tx.nonce, gas_price
        );
        Ok(PendingTx::new(hash, tx, context, self.policy, self.rpc.clone()))
    }

    /// Try to supersede `pending` with a zero-value self-transfer at the
    /// same nonce.
    ///
    /// A mined transaction cannot be withdrawn; if the original lands first
    /// the replacement is simply dropped by the network.
    pub async fn cancel(&self, pending: &PendingTx) -> Result<PendingTx> {
        let context = CallContext {
            contract: "account".to_string(),
            address: self.account,
            method: "cancel".to_string(),
            args: format!("nonce={}, replaces={}", pending.nonce(), pending.tx_hash()),
        };

        if pending.from() != self.account {
            return Err(SdkError::Submission {
                call: context,
                reason: format!("transaction was sent by {}", pending.from()),
            });
        }

        let bumped = bump_gas_price(pending.gas_price());
        let gas_price = bumped.max(self.current_gas_price().await?);
        let tx = OutgoingTransaction {
            from: self.account,
            to: self.account,
            input: Bytes::new(),
            value: U256::ZERO,
            gas_limit: TRANSFER_GAS,
            gas_price,
            nonce: pending.nonce(),
        };

        let hash = self
            .nonces
            .replace(self.rpc.as_ref(), tx.clone())
            .await
            .map_err(|failure| SdkError::from_submission(failure, context.clone()))?;

        info!(
            "Submitted replacement {} for {} (nonce {}, gas price {} -> {})",
            hash,
            pending.tx_hash(),
            tx.nonce,
            pending.gas_price(),
            gas_price
        );
        Ok(PendingTx::new(hash, tx, context, self.policy, self.rpc.clone()))
    }
}

/// Raise a gas price by at least 12.5%, and by at least one wei.
pub fn bump_gas_price(price: u128) -> u128 {
    price
        .saturating_add(price.div_ceil(REPLACEMENT_BUMP_DIVISOR))
        .max(price.saturating_add(1))
}
