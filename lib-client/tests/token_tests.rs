//! MockUSDT operations against the in-memory chain

mod common;

use alloy::primitives::{Address, U256};
use common::*;
use r2s_client::testing::MockChain;
use r2s_client::{ErrorKind, SdkError, ValidationError};

#[tokio::test]
async fn test_never_funded_address_has_zero_balance() {
    let chain = MockChain::new();
    let reader = chain.read_only_client().unwrap();
    let balance = reader
        .balance_of(Address::repeat_byte(0x77))
        .await
        .unwrap();
    assert_eq!(balance, U256::ZERO);
}

#[tokio::test]
async fn test_token_metadata() {
    let chain = MockChain::new();
    chain.fund(user(), usdt(250));
    let info = chain
        .read_only_client()
        .unwrap()
        .token()
        .token_info()
        .await
        .unwrap();

    assert_eq!(info.name, "Mock USDT");
    assert_eq!(info.symbol, "USDT");
    assert_eq!(info.decimals, 6);
    assert_eq!(info.total_supply, usdt(250));
}

#[tokio::test]
async fn test_transfer_and_approve() {
    let chain = MockChain::new();
    chain.fund(user(), usdt(100));
    let client = chain.signing_client(user()).unwrap();

    client
        .token()
        .transfer(stranger(), usdt(30))
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();
    client
        .token()
        .approve(stranger(), usdt(5))
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();

    let reader = client.reader().token();
    assert_eq!(reader.balance_of(user()).await.unwrap(), usdt(70));
    assert_eq!(reader.balance_of(stranger()).await.unwrap(), usdt(30));
    assert_eq!(reader.allowance(user(), stranger()).await.unwrap(), usdt(5));
}

#[tokio::test]
async fn test_overdrawn_transfer_fails_locally() {
    let chain = MockChain::new();
    chain.fund(user(), usdt(1));
    let client = chain.signing_client(user()).unwrap();

    let sends = chain.send_count();
    let err = client
        .token()
        .transfer(stranger(), usdt(2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SdkError::Validation(ValidationError::InsufficientBalance { .. })
    ));
    assert_eq!(chain.send_count(), sends);
}

#[tokio::test]
async fn test_only_the_owner_mints() {
    let chain = MockChain::new();
    let owner = chain.signing_client(chain.deployer()).unwrap();
    let outsider = chain.signing_client(user()).unwrap();

    let err = outsider.token().mint(user(), usdt(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractRevert);
    assert!(err
        .revert_reason()
        .unwrap()
        .is("OwnableUnauthorizedAccount"));

    owner
        .token()
        .mint(user(), usdt(1))
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();
    assert_eq!(chain.balance(user()), usdt(1));
    assert_eq!(owner.reader().token().owner().await.unwrap(), chain.deployer());
}

#[tokio::test]
async fn test_batch_mint_pairs_recipients_and_amounts() {
    let chain = MockChain::new();
    let owner = chain.signing_client(chain.deployer()).unwrap();

    let calls = chain.call_count();
    let err = owner
        .token()
        .batch_mint(vec![user(), stranger()], vec![usdt(1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SdkError::Validation(ValidationError::BatchLengthMismatch {
            recipients: 2,
            amounts: 1,
        })
    ));
    assert_eq!(chain.call_count(), calls);

    owner
        .token()
        .batch_mint(vec![user(), stranger()], vec![usdt(1), usdt(2)])
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();
    assert_eq!(chain.balance(user()), usdt(1));
    assert_eq!(chain.balance(stranger()), usdt(2));
}

#[tokio::test]
async fn test_burn_and_burn_from_reduce_supply() {
    let chain = MockChain::new();
    chain.fund(user(), usdt(10));
    let holder = chain.signing_client(user()).unwrap();
    let spender = chain.signing_client(stranger()).unwrap();

    holder
        .token()
        .burn(usdt(4))
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();

    // No allowance yet
    let err = spender.token().burn_from(user(), usdt(1)).await.unwrap_err();
    assert!(matches!(
        err,
        SdkError::Validation(ValidationError::InsufficientAllowance { .. })
    ));

    holder
        .token()
        .approve(stranger(), usdt(3))
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();
    spender
        .token()
        .burn_from(user(), usdt(3))
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();

    let reader = holder.reader().token();
    assert_eq!(reader.balance_of(user()).await.unwrap(), usdt(3));
    assert_eq!(reader.total_supply().await.unwrap(), usdt(3));
}

#[tokio::test]
async fn test_receipts_carry_transfer_events() {
    let chain = MockChain::new();
    chain.fund(user(), usdt(10));
    let client = chain.signing_client(user()).unwrap();

    let receipt = client
        .token()
        .transfer(stranger(), usdt(6))
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();

    let transfers = client
        .reader()
        .token()
        .handle()
        .decode_events::<r2s_client::abi::MockUSDT::Transfer>(&receipt.logs);
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].from, user());
    assert_eq!(transfers[0].to, stranger());
    assert_eq!(transfers[0].value, usdt(6));
}
