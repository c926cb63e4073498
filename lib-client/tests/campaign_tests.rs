//! Campaign operations against the in-memory chain
//!
//! Local validation must stop bad calls before any submission; calls that
//! pass validation must land on the contract and be readable back.

mod common;

use std::time::Duration;

use std::sync::Arc;

use alloy::primitives::U256;
use common::*;
use r2s_client::testing::MockChain;
use r2s_client::{
    CampaignStatus, ChainClock, ContractRpc, CreateCampaignParams, ErrorKind, SdkError,
    SigningClient, SystemClock, ValidationError,
};

fn validation(err: &SdkError) -> &ValidationError {
    match err {
        SdkError::Validation(inner) => inner,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_is_rejected_locally_exactly_when_a_bound_is_broken() {
    let fx = Fixture::new();
    let mins = [0u64, 100, 1_000, 1_001];
    let rates = [0u64, 5_000, 10_000, 10_001];
    let targets = [0u64, 1, 10_000];

    for min in mins {
        for rate in rates {
            for target in targets {
                let params = CreateCampaignParams::builder("Grid")
                    .target_amount(usdt(target))
                    .deposit_bounds(usdt(min), usdt(1_000))
                    .discount_rate(rate)
                    .duration(DAY)
                    .build();
                let broken = min > 1_000 || rate > 10_000 || target == 0;

                let calls = fx.chain.call_count();
                let sends = fx.chain.send_count();
                let result = fx.merchant.campaign().submit_campaign(params).await;

                if broken {
                    let err = result.unwrap_err();
                    assert_eq!(err.kind(), ErrorKind::Validation, "{min}/{rate}/{target}");
                    assert_eq!(fx.chain.call_count(), calls, "{min}/{rate}/{target}");
                    assert_eq!(fx.chain.send_count(), sends, "{min}/{rate}/{target}");
                } else {
                    // Reaches the network; the contract may still refuse it
                    assert!(fx.chain.call_count() > calls, "{min}/{rate}/{target}");
                    if let Err(err) = result {
                        assert_eq!(err.kind(), ErrorKind::ContractRevert);
                    }
                }
            }
        }
    }
}

#[tokio::test]
async fn test_contract_side_discount_cap_surfaces_as_revert() {
    let fx = Fixture::new();
    let params = CreateCampaignParams::builder("Generous")
        .target_amount(usdt(10_000))
        .deposit_bounds(usdt(100), usdt(1_000))
        .discount_rate(6_000)
        .duration(DAY)
        .build();

    let sends = fx.chain.send_count();
    let err = fx
        .merchant
        .campaign()
        .submit_campaign(params)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ContractRevert);
    let reason = err.revert_reason().unwrap();
    assert_eq!(reason.message, "Discount rate too high");
    assert_eq!(reason.name, None);
    // Caught in simulation, never broadcast
    assert_eq!(fx.chain.send_count(), sends);
}

#[tokio::test]
async fn test_created_campaign_reads_back_with_its_parameters() {
    let fx = Fixture::new();
    let params = campaign_params();
    let id = fx.create_campaign().await;

    let campaign = fx.merchant.reader().get_campaign(id).await.unwrap();
    assert_eq!(campaign.id, id);
    assert_eq!(campaign.title, params.title);
    assert_eq!(campaign.description, params.description);
    assert_eq!(campaign.image_url, params.image_url);
    assert_eq!(campaign.merchant, merchant());
    assert_eq!(campaign.token, fx.chain.addresses().token);
    assert_eq!(campaign.target_amount, params.target_amount);
    assert_eq!(campaign.min_deposit, params.min_deposit);
    assert_eq!(campaign.max_deposit, params.max_deposit);
    assert_eq!(campaign.discount_rate, params.discount_rate);
    assert_eq!(campaign.end_time - campaign.start_time, params.duration);
    assert_eq!(
        campaign.settlement_date - campaign.end_time,
        params.settlement_period
    );
    assert_eq!(campaign.current_amount, U256::ZERO);
    assert_eq!(
        campaign.status_at(fx.chain.timestamp()),
        CampaignStatus::Pending
    );
}

#[tokio::test]
async fn test_campaign_ids_come_from_the_contract() {
    let fx = Fixture::new();
    let first = fx.create_campaign().await;
    let second = fx.create_campaign().await;

    assert_eq!(second, first + U256::from(1u64));
    let reader = fx.merchant.reader().campaign();
    assert_eq!(
        reader.next_campaign_id().await.unwrap(),
        second + U256::from(1u64)
    );
    assert_eq!(
        reader.merchant_campaigns(merchant()).await.unwrap(),
        vec![first, second]
    );
}

#[tokio::test]
async fn test_below_minimum_then_valid_deposit() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.open_window();

    let sends = fx.chain.send_count();
    let err = fx
        .user
        .campaign()
        .participate_with_approval(id, usdt(50))
        .await
        .unwrap_err();
    assert!(matches!(
        validation(&err),
        ValidationError::BelowMinimumDeposit { .. }
    ));
    assert_eq!(fx.chain.send_count(), sends);

    fx.deposit(&fx.user, id, usdt(500)).await;

    let campaign = fx.user.reader().get_campaign(id).await.unwrap();
    assert_eq!(campaign.current_amount, usdt(500));
    assert_eq!(campaign.total_participants, 1);
    assert_eq!(fx.chain.balance(user()), usdt(9_500));
}

#[tokio::test]
async fn test_window_is_judged_by_block_time() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.open_window();

    // The mock chain lives in 2023; the host clock is years past the window
    let rpc: Arc<dyn ContractRpc> = Arc::new(fx.chain.clone());
    let wall = SigningClient::from_rpc(
        rpc.clone(),
        user(),
        fx.chain.config(),
        Arc::new(SystemClock),
    )
    .unwrap();
    let chain = SigningClient::from_rpc(
        rpc.clone(),
        user(),
        fx.chain.config(),
        Arc::new(ChainClock::new(rpc)),
    )
    .unwrap();

    assert_eq!(
        chain.reader().campaign().campaign_status(id).await.unwrap(),
        CampaignStatus::Active
    );
    assert_eq!(
        chain.reader().campaign().now().await.unwrap(),
        fx.chain.timestamp()
    );

    let sends = fx.chain.send_count();
    let err = wall
        .campaign()
        .participate_with_approval(id, usdt(200))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(fx.chain.send_count(), sends);

    chain
        .campaign()
        .participate_with_approval(id, usdt(200))
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();
    let campaign = chain.reader().get_campaign(id).await.unwrap();
    assert_eq!(campaign.current_amount, usdt(200));
}

#[tokio::test]
async fn test_participation_is_rejected_outside_bounds_and_window() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.chain.approve(user(), fx.chain.addresses().campaign, U256::MAX);

    // Before the window opens
    let sends = fx.chain.send_count();
    let err = fx.user.campaign().participate(id, usdt(500)).await.unwrap_err();
    assert!(matches!(
        validation(&err),
        ValidationError::WrongStatus {
            status: CampaignStatus::Pending,
            ..
        }
    ));
    assert_eq!(fx.chain.send_count(), sends);

    fx.open_window();
    for (amount, accepted) in [(99u64, false), (100, true), (1_000, true), (1_001, false)] {
        let sends = fx.chain.send_count();
        let result = fx.user.campaign().participate(id, usdt(amount)).await;
        if accepted {
            result.unwrap().confirm().await.unwrap();
            assert_eq!(fx.chain.send_count(), sends + 1, "{amount}");
        } else {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation, "{amount}");
            assert_eq!(fx.chain.send_count(), sends, "{amount}");
        }
    }

    // After the window closes
    fx.chain.advance_time(Duration::from_secs(30 * DAY));
    let err = fx.user.campaign().participate(id, usdt(500)).await.unwrap_err();
    assert!(matches!(
        validation(&err),
        ValidationError::WrongStatus {
            status: CampaignStatus::Closed,
            ..
        }
    ));
}

#[tokio::test]
async fn test_participation_requires_funding() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.open_window();
    let sends = fx.chain.send_count();

    // Funded but nothing approved
    let err = fx.user.campaign().participate(id, usdt(500)).await.unwrap_err();
    assert!(matches!(
        validation(&err),
        ValidationError::InsufficientAllowance { .. }
    ));

    // Approved but unfunded
    let broke = fx.client(alloy::primitives::Address::repeat_byte(0xdd));
    fx.chain
        .approve(broke.account(), fx.chain.addresses().campaign, U256::MAX);
    let err = broke.campaign().participate(id, usdt(500)).await.unwrap_err();
    assert!(matches!(
        validation(&err),
        ValidationError::InsufficientBalance { .. }
    ));

    assert_eq!(fx.chain.send_count(), sends);
}

#[tokio::test]
async fn test_participate_with_approval_approves_only_when_short() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.open_window();
    let campaign_address = fx.chain.addresses().campaign;

    let sends = fx.chain.send_count();
    fx.deposit(&fx.user, id, usdt(200)).await;
    assert_eq!(fx.chain.send_count(), sends + 2);

    fx.chain.approve(user(), campaign_address, usdt(5_000));
    let sends = fx.chain.send_count();
    fx.deposit(&fx.user, id, usdt(200)).await;
    assert_eq!(fx.chain.send_count(), sends + 1);

    let allowance = fx
        .user
        .reader()
        .token()
        .allowance(user(), campaign_address)
        .await
        .unwrap();
    assert_eq!(allowance, usdt(4_800));
}

#[tokio::test]
async fn test_settle_is_validated_and_never_repeated() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.open_window();
    fx.deposit(&fx.user, id, usdt(500)).await;

    // Still active
    let sends = fx.chain.send_count();
    let err = fx.merchant.campaign().settle_campaign(id).await.unwrap_err();
    assert!(matches!(
        validation(&err),
        ValidationError::WrongStatus {
            status: CampaignStatus::Active,
            expected: CampaignStatus::Closed,
        }
    ));

    // Closed but before the settlement date
    fx.chain.advance_time(Duration::from_secs(30 * DAY));
    let err = fx.merchant.campaign().settle_campaign(id).await.unwrap_err();
    assert!(matches!(
        validation(&err),
        ValidationError::SettlementNotReached { .. }
    ));
    assert_eq!(fx.chain.send_count(), sends);

    fx.chain.advance_time(Duration::from_secs(7 * DAY));
    fx.merchant
        .campaign()
        .settle_campaign(id)
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();
    let sends = fx.chain.send_count();

    let err = fx.merchant.campaign().settle_campaign(id).await.unwrap_err();
    assert_eq!(validation(&err), &ValidationError::AlreadySettled);
    assert_eq!(fx.chain.send_count(), sends);

    let campaign = fx.merchant.reader().get_campaign(id).await.unwrap();
    assert_eq!(
        campaign.status_at(fx.chain.timestamp()),
        CampaignStatus::Settled
    );
    assert_eq!(campaign.total_settled, usdt(500));
}

#[tokio::test]
async fn test_settlement_pays_discount_fees_and_merchant() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.open_window();
    fx.deposit(&fx.user, id, usdt(500)).await;
    fx.reach_settlement();

    fx.merchant
        .campaign()
        .settle_campaign(id)
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();

    // 10% discount back to the depositor
    assert_eq!(fx.chain.balance(user()), usdt(9_550));
    // 500 - 50 discount - 2.5% platform - 1% merchant fee
    assert_eq!(fx.chain.balance(merchant()), U256::from(432_500_000u64));

    let pid = fx.user.reader().campaign().user_participations(user()).await.unwrap()[0];
    let participation = fx.user.reader().campaign().get_participation(pid).await.unwrap();
    assert!(participation.is_settled);
    assert_eq!(participation.actual_discount, usdt(50));
    assert_eq!(participation.settlement_amount, usdt(450));
}

#[tokio::test]
async fn test_refund_returns_deposit_minus_penalty_once() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.open_window();
    fx.deposit(&fx.user, id, usdt(1_000)).await;

    let reader = fx.user.reader().campaign();
    let pids = reader.campaign_participations(id).await.unwrap();
    assert_eq!(pids.len(), 1);
    let pid = pids[0];

    fx.user
        .campaign()
        .refund(pid)
        .await
        .unwrap()
        .confirm()
        .await
        .unwrap();
    // 5% early-withdraw penalty
    assert_eq!(fx.chain.balance(user()), usdt(9_950));
    assert!(reader.get_participation(pid).await.unwrap().is_refunded);

    let sends = fx.chain.send_count();
    let err = fx.user.campaign().refund(pid).await.unwrap_err();
    assert_eq!(validation(&err), &ValidationError::AlreadyRefunded(pid));
    assert_eq!(fx.chain.send_count(), sends);
}

#[tokio::test]
async fn test_refund_by_someone_else_reverts() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.open_window();
    fx.deposit(&fx.user, id, usdt(1_000)).await;
    let pid = fx.user.reader().campaign().user_participations(user()).await.unwrap()[0];

    let thief = fx.client(stranger());
    let err = thief.campaign().refund(pid).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractRevert);
    assert_eq!(err.revert_reason().unwrap().message, "Not participant");
}

#[tokio::test]
async fn test_stats_aggregate_every_participant() {
    let fx = Fixture::new();
    let id = fx.create_campaign().await;
    fx.open_window();
    let other = fx.client(stranger());
    fx.deposit(&fx.user, id, usdt(400)).await;
    fx.deposit(&fx.user, id, usdt(200)).await;
    fx.deposit(&other, id, usdt(600)).await;

    let reader = fx.user.reader().campaign();
    let stats = reader.campaign_stats(id).await.unwrap();
    assert_eq!(stats.total_participants, U256::from(2u64));
    assert_eq!(stats.total_deposited, usdt(1_200));
    assert_eq!(stats.average_deposit, usdt(600));
    // 1,200 of 10,000 in basis points
    assert_eq!(stats.completion_rate, U256::from(1_200u64));

    assert!(reader.is_campaign_active(id).await.unwrap());
    assert_eq!(reader.user_participations(user()).await.unwrap().len(), 2);
    assert_eq!(reader.campaign_participations(id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let chain = MockChain::new();
    let reader = chain.read_only_client().unwrap();

    let err = reader.get_campaign(U256::from(42u64)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = reader
        .campaign()
        .get_participation(U256::from(7u64))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_fee_schedule_is_read_from_the_contract() {
    let chain = MockChain::new();
    let reader = chain.read_only_client().unwrap();
    let fees = reader.campaign().fees().await.unwrap();
    assert_eq!(fees.platform_fee, 250);
    assert_eq!(fees.merchant_fee, 100);
    assert_eq!(fees.early_withdraw_penalty, 500);
}
