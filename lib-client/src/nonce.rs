//! Per-signer nonce serialization.
//!
//! The cached next nonce sits behind a tokio mutex that stays locked from
//! nonce acquisition until the node has answered the submission, so two
//! transactions from one signer can never race for the same nonce. Reads
//! never touch it.

use alloy::primitives::{Address, TxHash};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::rpc::{ContractRpc, OutgoingTransaction, RpcFailure};

#[derive(Debug)]
pub struct NonceManager {
    account: Address,
    next: Mutex<Option<u64>>,
}

impl NonceManager {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            next: Mutex::new(None),
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Assign the next nonce to the transaction built by `build` and submit it.
    ///
    /// The cache advances only when the node accepts the transaction. Any
    /// failure drops the cache so the next submission re-reads the pending
    /// nonce from the node.
    pub async fn submit<F>(
        &self,
        rpc: &dyn ContractRpc,
        build: F,
    ) -> Result<(TxHash, OutgoingTransaction), RpcFailure>
    where
        F: FnOnce(u64) -> OutgoingTransaction + Send,
    {
        let mut next = self.next.lock().await;

        let nonce = match *next {
            Some(nonce) => nonce,
            None => {
                let nonce = rpc.pending_nonce(self.account).await?;
                debug!("Synced nonce for {} at {}", self.account, nonce);
                nonce
            }
        };

        let tx = build(nonce);
        match rpc.send_transaction(tx.clone()).await {
            Ok(hash) => {
                *next = Some(nonce + 1);
                Ok((hash, tx))
            }
            Err(failure) => {
                warn!(
                    "Submission with nonce {} from {} failed ({}), resyncing",
                    nonce, self.account, failure
                );
                *next = None;
                Err(failure)
            }
        }
    }

    /// Submit a replacement for a transaction that already holds its nonce.
    ///
    /// The cache is left alone: the nonce was consumed by the original.
    pub async fn replace(
        &self,
        rpc: &dyn ContractRpc,
        tx: OutgoingTransaction,
    ) -> Result<TxHash, RpcFailure> {
        let _guard = self.next.lock().await;
        rpc.send_transaction(tx).await
    }

    /// Forget the cached nonce.
    pub async fn reset(&self) {
        *self.next.lock().await = None;
    }

    /// Cached next nonce, if synced
    pub async fn peek(&self) -> Option<u64> {
        *self.next.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChain;
    use alloy::primitives::{Bytes, U256};
    use std::sync::Arc;

    fn transfer(from: Address, nonce: u64) -> OutgoingTransaction {
        OutgoingTransaction {
            from,
            to: from,
            input: Bytes::new(),
            value: U256::ZERO,
            gas_limit: 21_000,
            gas_price: 1_000_000_000,
            nonce,
        }
    }

    #[tokio::test]
    async fn test_nonces_advance_on_acceptance() {
        let chain = MockChain::new();
        let account = chain.deployer();
        let nonces = NonceManager::new(account);

        let (_, first) = nonces.submit(&chain, |n| transfer(account, n)).await.unwrap();
        let (_, second) = nonces.submit(&chain, |n| transfer(account, n)).await.unwrap();
        assert_eq!(first.nonce, 0);
        assert_eq!(second.nonce, 1);
        assert_eq!(nonces.peek().await, Some(2));
    }

    #[tokio::test]
    async fn test_rejection_forces_resync() {
        let chain = MockChain::new();
        let account = chain.deployer();
        let nonces = NonceManager::new(account);

        nonces.submit(&chain, |n| transfer(account, n)).await.unwrap();
        chain.reject_next_sends(1);
        assert!(nonces.submit(&chain, |n| transfer(account, n)).await.is_err());
        assert_eq!(nonces.peek().await, None);

        let (_, tx) = nonces.submit(&chain, |n| transfer(account, n)).await.unwrap();
        assert_eq!(tx.nonce, 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_get_distinct_nonces() {
        let chain = MockChain::new();
        let account = chain.deployer();
        let nonces = Arc::new(NonceManager::new(account));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let nonces = nonces.clone();
            let chain = chain.clone();
            tasks.push(tokio::spawn(async move {
                nonces
                    .submit(&chain, |n| transfer(account, n))
                    .await
                    .map(|(_, tx)| tx.nonce)
            }));
        }

        let mut seen = Vec::new();
        for task in tasks {
            seen.push(task.await.unwrap().unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<u64>>());
    }
}
