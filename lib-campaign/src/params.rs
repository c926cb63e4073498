//! Campaign creation payload.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Input for `createCampaign`.
///
/// Same meaning as the immutable fields of [`crate::Campaign`], expressed
/// before the contract assigns an id. `start_time` is chosen by the
/// contract; `duration` and `settlement_period` are relative to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCampaignParams {
    pub title: String,
    pub description: String,
    pub image_url: String,
    /// Deposit token; `None` uses the token from the SDK configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Address>,
    pub target_amount: U256,
    pub min_deposit: U256,
    pub max_deposit: U256,
    /// Basis points
    pub discount_rate: u64,
    /// Participation window length in seconds
    pub duration: u64,
    /// Seconds between the end of the window and settlement
    pub settlement_period: u64,
}

impl CreateCampaignParams {
    pub fn builder(title: impl Into<String>) -> CreateCampaignParamsBuilder {
        CreateCampaignParamsBuilder::new(title)
    }
}

/// Builder for [`CreateCampaignParams`]. Validation happens at submission.
#[derive(Debug, Clone)]
pub struct CreateCampaignParamsBuilder {
    params: CreateCampaignParams,
}

impl CreateCampaignParamsBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            params: CreateCampaignParams {
                title: title.into(),
                description: String::new(),
                image_url: String::new(),
                token: None,
                target_amount: U256::ZERO,
                min_deposit: U256::ZERO,
                max_deposit: U256::ZERO,
                discount_rate: 0,
                duration: 0,
                settlement_period: 0,
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.params.description = description.into();
        self
    }

    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.params.image_url = image_url.into();
        self
    }

    pub fn token(mut self, token: Address) -> Self {
        self.params.token = Some(token);
        self
    }

    pub fn target_amount(mut self, amount: U256) -> Self {
        self.params.target_amount = amount;
        self
    }

    pub fn deposit_bounds(mut self, min: U256, max: U256) -> Self {
        self.params.min_deposit = min;
        self.params.max_deposit = max;
        self
    }

    pub fn discount_rate(mut self, bps: u64) -> Self {
        self.params.discount_rate = bps;
        self
    }

    pub fn duration(mut self, seconds: u64) -> Self {
        self.params.duration = seconds;
        self
    }

    pub fn settlement_period(mut self, seconds: u64) -> Self {
        self.params.settlement_period = seconds;
        self
    }

    pub fn build(self) -> CreateCampaignParams {
        self.params
    }
}
