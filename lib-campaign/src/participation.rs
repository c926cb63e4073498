//! Participation records returned by `getParticipation`.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// One deposit into a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub id: U256,
    pub participant: Address,
    pub campaign_id: U256,
    pub deposit_amount: U256,
    pub deposit_time: u64,
    pub expected_discount: U256,
    pub actual_discount: U256,
    pub settlement_amount: U256,
    pub is_settled: bool,
    pub is_refunded: bool,
    /// Raw contract status code; its meaning is owned by the contract
    pub status: u8,
}

impl Participation {
    /// Still holding a deposit that can be refunded or settled.
    pub fn is_open(&self) -> bool {
        !self.is_settled && !self.is_refunded
    }
}
