//! Submitted transactions awaiting confirmation.
//!
//! Submission and confirmation are separate stages: a [`PendingTx`] exists
//! as soon as the node accepted the transaction, and nothing waits for it
//! to be mined until [`PendingTx::confirm`] is awaited.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::abi::RevertReason;
use crate::config::SdkConfig;
use crate::error::{CallContext, Result, SdkError};
use crate::rpc::{ContractRpc, OutgoingTransaction, Receipt, RpcFailure};

/// How long and how deep to wait for a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    pub confirmations: u64,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ConfirmPolicy {
    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            confirmations: config.confirmations,
            timeout: config.receipt_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// A transaction the node accepted into its pool
#[derive(Debug, Clone)]
pub struct PendingTx {
    tx_hash: TxHash,
    tx: OutgoingTransaction,
    context: CallContext,
    policy: ConfirmPolicy,
    rpc: Arc<dyn ContractRpc>,
}

impl PendingTx {
    pub(crate) fn new(
        tx_hash: TxHash,
        tx: OutgoingTransaction,
        context: CallContext,
        policy: ConfirmPolicy,
        rpc: Arc<dyn ContractRpc>,
    ) -> Self {
        Self {
            tx_hash,
            tx,
            context,
            policy,
            rpc,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn nonce(&self) -> u64 {
        self.tx.nonce
    }

    pub fn gas_price(&self) -> u128 {
        self.tx.gas_price
    }

    pub fn from(&self) -> Address {
        self.tx.from
    }

    pub fn context(&self) -> &CallContext {
        &self.context
    }

    pub fn transaction(&self) -> &OutgoingTransaction {
        &self.tx
    }

    /// Wait for the configured confirmation depth.
    pub async fn confirm(&self) -> Result<Receipt> {
        self.confirm_with(self.policy.confirmations).await
    }

    /// Wait until the including block has `confirmations - 1` blocks on
    /// top of it, or the policy timeout passes.
    ///
    /// A timeout says nothing about the transaction's fate: re-query
    /// before resubmitting.
    pub async fn confirm_with(&self, confirmations: u64) -> Result<Receipt> {
        let started = Instant::now();
        let depth = confirmations.max(1);

        loop {
            match self.poll(depth).await {
                Ok(Some(receipt)) => {
                    info!(
                        "Confirmed {} ({}) in block {}",
                        self.tx_hash, self.context.method, receipt.block_number
                    );
                    return Ok(receipt);
                }
                Ok(None) => {}
                Err(PollError::Rpc(failure)) if failure.is_transient() => {
                    warn!("Receipt poll for {} failed: {}", self.tx_hash, failure);
                }
                Err(PollError::Rpc(failure)) => return Err(SdkError::from_node(failure)),
                Err(PollError::Reverted(receipt)) => return Err(self.revert_error(&receipt).await),
            }

            let waited = started.elapsed();
            if waited >= self.policy.timeout {
                warn!("Gave up waiting for {} after {:?}", self.tx_hash, waited);
                return Err(SdkError::Timeout {
                    tx_hash: self.tx_hash,
                    waited,
                });
            }
            sleep(self.policy.poll_interval).await;
        }
    }

    async fn poll(&self, depth: u64) -> std::result::Result<Option<Receipt>, PollError> {
        let Some(receipt) = self
            .rpc
            .transaction_receipt(self.tx_hash)
            .await
            .map_err(PollError::Rpc)?
        else {
            return Ok(None);
        };

        if !receipt.success {
            return Err(PollError::Reverted(receipt));
        }

        let head = self.rpc.latest_block_number().await.map_err(PollError::Rpc)?;
        if head + 1 >= receipt.block_number + depth {
            Ok(Some(receipt))
        } else {
            Ok(None)
        }
    }

    /// Replay the call against the latest state to recover the revert reason.
    async fn revert_error(&self, receipt: &Receipt) -> SdkError {
        let reason = match self
            .rpc
            .call(Some(self.tx.from), self.tx.to, self.tx.input.clone())
            .await
        {
            Err(RpcFailure::Revert { message, data }) if data.is_empty() => {
                RevertReason::message(message)
            }
            Err(RpcFailure::Revert { data, .. }) => crate::abi::decode_revert(&data),
            _ => RevertReason::message("execution reverted"),
        };

        warn!(
            "{} reverted in block {}: {}",
            self.tx_hash, receipt.block_number, reason
        );
        SdkError::ContractRevert {
            call: self.context.clone(),
            reason,
            tx_hash: Some(self.tx_hash),
        }
    }
}

enum PollError {
    Rpc(RpcFailure),
    Reverted(Receipt),
}
