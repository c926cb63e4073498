//! Transaction lifecycle: nonces, confirmation, mined reverts, replacement

mod common;

use std::time::Duration;

use alloy::primitives::{Address, U256};
use common::*;
use r2s_client::testing::MockChain;
use r2s_client::{ErrorKind, SdkError};

fn funded(chain: &MockChain, account: Address, amount: U256) -> r2s_client::SigningClient {
    chain.fund(account, amount);
    chain.signing_client(account).unwrap()
}

#[tokio::test]
async fn test_concurrent_submissions_use_distinct_nonces() {
    let chain = MockChain::new();
    let client = funded(&chain, user(), usdt(1_000));

    let mut tasks = Vec::new();
    for i in 0..8u8 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client
                .token()
                .transfer(Address::repeat_byte(0x10 + i), usdt(10))
                .await
                .map(|pending| pending.nonce())
        }));
    }

    let mut nonces = Vec::new();
    for task in tasks {
        nonces.push(task.await.unwrap().unwrap());
    }
    nonces.sort_unstable();
    assert_eq!(nonces, (0..8).collect::<Vec<u64>>());
    assert_eq!(chain.balance(user()), usdt(920));
}

#[tokio::test]
async fn test_rejected_submission_resyncs_nonce() {
    let chain = MockChain::new();
    let client = funded(&chain, user(), usdt(100));

    let first = client.token().transfer(stranger(), usdt(1)).await.unwrap();
    assert_eq!(first.nonce(), 0);

    chain.reject_next_sends(1);
    let err = client
        .token()
        .transfer(stranger(), usdt(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
    match err {
        SdkError::Submission { call, .. } => {
            assert_eq!(call.method, "transfer(address,uint256)");
            assert_eq!(call.address, chain.addresses().token);
        }
        other => panic!("unexpected {other:?}"),
    }

    let next = client.token().transfer(stranger(), usdt(1)).await.unwrap();
    assert_eq!(next.nonce(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unmined_transaction_times_out() {
    let chain = MockChain::new();
    let client = funded(&chain, user(), usdt(100));
    chain.set_auto_mine(false);

    let pending = client.token().transfer(stranger(), usdt(1)).await.unwrap();
    let err = pending.confirm().await.unwrap_err();

    match err {
        SdkError::Timeout { tx_hash, waited } => {
            assert_eq!(tx_hash, pending.tx_hash());
            assert!(waited >= chain.config().receipt_timeout());
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    // Still in the pool: the outcome was ambiguous
    assert_eq!(chain.pending_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_waits_for_depth() {
    let chain = MockChain::new();
    let mut config = chain.config();
    config.confirmations = 2;
    chain.fund(user(), usdt(100));
    let client = chain.signing_client_with(user(), config).unwrap();

    let pending = client.token().transfer(stranger(), usdt(1)).await.unwrap();
    let waiter = tokio::spawn({
        let pending = pending.clone();
        async move { pending.confirm().await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished());

    chain.mine();
    let receipt = waiter.await.unwrap().unwrap();
    assert_eq!(receipt.block_number, chain.block_number() - 1);
}

#[tokio::test]
async fn test_mined_revert_carries_reason_and_hash() {
    let chain = MockChain::new();
    let client = funded(&chain, user(), usdt(500));
    chain.set_auto_mine(false);

    // Both pass local checks against the same balance
    let first = client.token().transfer(stranger(), usdt(400)).await.unwrap();
    let second = client.token().transfer(stranger(), usdt(400)).await.unwrap();
    chain.mine();

    first.confirm().await.unwrap();
    let err = second.confirm().await.unwrap_err();
    match &err {
        SdkError::ContractRevert {
            call,
            reason,
            tx_hash,
        } => {
            assert_eq!(*tx_hash, Some(second.tx_hash()));
            assert!(reason.is("ERC20InsufficientBalance"), "{reason}");
            assert!(call.args.contains("value"));
        }
        other => panic!("expected revert, got {other:?}"),
    }
    assert_eq!(chain.balance(user()), usdt(100));
}

#[tokio::test]
async fn test_forced_revert_without_reason_is_still_a_revert() {
    let chain = MockChain::new();
    let client = funded(&chain, user(), usdt(500));
    chain.revert_next_mined(1);

    let pending = client.token().transfer(stranger(), usdt(1)).await.unwrap();
    let err = pending.confirm().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractRevert);
    assert_eq!(chain.balance(user()), usdt(500));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_supersedes_with_same_nonce() {
    let chain = MockChain::new();
    let client = funded(&chain, user(), usdt(500));
    chain.set_auto_mine(false);

    let original = client.token().transfer(stranger(), usdt(100)).await.unwrap();
    let replacement = client.cancel(&original).await.unwrap();

    assert_eq!(replacement.nonce(), original.nonce());
    assert!(replacement.gas_price() > original.gas_price());
    assert_eq!(replacement.transaction().to, user());
    assert_eq!(chain.pending_count(), 1);

    chain.mine();
    replacement.confirm().await.unwrap();
    assert_eq!(original.confirm().await.unwrap_err().kind(), ErrorKind::Timeout);
    assert_eq!(chain.balance(user()), usdt(500));
}

#[tokio::test]
async fn test_cancel_refuses_foreign_transactions() {
    let chain = MockChain::new();
    let client = funded(&chain, user(), usdt(500));
    let other = chain.signing_client(stranger()).unwrap();
    chain.set_auto_mine(false);

    let pending = client.token().transfer(stranger(), usdt(1)).await.unwrap();
    let err = other.cancel(&pending).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Submission);
}

#[tokio::test]
async fn test_reads_retry_transient_failures_only() {
    let chain = MockChain::new();
    let reader = chain.read_only_client().unwrap();
    chain.fund(user(), usdt(3));

    chain.fail_next_calls(2);
    assert_eq!(reader.balance_of(user()).await.unwrap(), usdt(3));

    chain.fail_next_calls(10);
    let err = reader.balance_of(user()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn test_writes_are_never_retried() {
    let chain = MockChain::new();
    let client = funded(&chain, user(), usdt(10));

    let sends = chain.send_count();
    chain.reject_next_sends(1);
    assert!(client.token().transfer(stranger(), usdt(1)).await.is_err());
    assert_eq!(chain.send_count(), sends + 1);
    assert_eq!(chain.balance(user()), usdt(10));
}
