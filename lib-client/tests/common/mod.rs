//! Shared fixtures for the SDK integration tests

#![allow(dead_code)]

use std::time::Duration;

use alloy::primitives::{Address, U256};
use r2s_client::testing::{MockChain, START_DELAY};
use r2s_client::{CreateCampaignParams, SigningClient};

pub const DAY: u64 = 24 * 60 * 60;

/// Whole tokens to base units at 6 decimals
pub fn usdt(amount: u64) -> U256 {
    U256::from(amount) * U256::from(1_000_000u64)
}

pub fn merchant() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn user() -> Address {
    Address::repeat_byte(0xbb)
}

pub fn stranger() -> Address {
    Address::repeat_byte(0xcc)
}

/// 10,000 USDT target, 100..=1,000 deposits, 10% discount, 30 day window,
/// 7 day settlement delay
pub fn campaign_params() -> CreateCampaignParams {
    CreateCampaignParams::builder("Test Campaign")
        .description("Test Description")
        .image_url("https://example.com/image.jpg")
        .target_amount(usdt(10_000))
        .deposit_bounds(usdt(100), usdt(1_000))
        .discount_rate(1_000)
        .duration(30 * DAY)
        .settlement_period(7 * DAY)
        .build()
}

/// A chain with funded merchant and user clients
pub struct Fixture {
    pub chain: MockChain,
    pub merchant: SigningClient,
    pub user: SigningClient,
}

impl Fixture {
    pub fn new() -> Self {
        let chain = MockChain::new();
        chain.fund(user(), usdt(10_000));
        chain.fund(stranger(), usdt(10_000));
        let merchant = chain.signing_client(merchant()).unwrap();
        let user = chain.signing_client(user()).unwrap();
        Self {
            chain,
            merchant,
            user,
        }
    }

    pub fn client(&self, account: Address) -> SigningClient {
        self.chain.signing_client(account).unwrap()
    }

    pub async fn create_campaign(&self) -> U256 {
        self.merchant
            .campaign()
            .create_campaign(campaign_params())
            .await
            .unwrap()
    }

    /// Move the clock into the participation window of a fresh campaign.
    pub fn open_window(&self) {
        self.chain.advance_time(Duration::from_secs(START_DELAY));
    }

    /// Move the clock past the settlement date of a campaign created now.
    pub fn reach_settlement(&self) {
        self.chain
            .advance_time(Duration::from_secs(START_DELAY + 37 * DAY + 1));
    }

    /// Approve and deposit `amount` as `client`, waiting for confirmation.
    pub async fn deposit(&self, client: &SigningClient, id: U256, amount: U256) {
        client
            .campaign()
            .participate_with_approval(id, amount)
            .await
            .unwrap()
            .confirm()
            .await
            .unwrap();
    }
}
