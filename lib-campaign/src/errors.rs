//! Campaign Validation Errors

use alloy_primitives::U256;
use thiserror::Error;

use crate::campaign::CampaignStatus;

/// A local precondition that failed before anything was sent to the network.
///
/// Every variant is recoverable by the caller fixing its input or waiting
/// for the campaign to reach the right lifecycle state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Minimum deposit {min} exceeds maximum deposit {max}")]
    DepositBoundsInverted { min: U256, max: U256 },

    #[error("Discount rate {rate} bps exceeds {max} bps")]
    DiscountRateTooHigh { rate: u64, max: u64 },

    #[error("Target amount must be greater than zero")]
    ZeroTargetAmount,

    #[error("Campaign duration must be greater than zero")]
    ZeroDuration,

    #[error("Deposit {amount} is below the campaign minimum {min}")]
    BelowMinimumDeposit { amount: U256, min: U256 },

    #[error("Deposit {amount} is above the campaign maximum {max}")]
    AboveMaximumDeposit { amount: U256, max: U256 },

    #[error("Deposit would overflow the campaign total")]
    DepositOverflow,

    #[error("Campaign is {status}, expected {expected}")]
    WrongStatus {
        status: CampaignStatus,
        expected: CampaignStatus,
    },

    #[error("Campaign is already settled")]
    AlreadySettled,

    #[error("Settlement opens at {settlement_date}, current time is {now}")]
    SettlementNotReached { settlement_date: u64, now: u64 },

    #[error("Insufficient token balance: have {have}, need {need}")]
    InsufficientBalance { have: U256, need: U256 },

    #[error("Insufficient token allowance: have {have}, need {need}")]
    InsufficientAllowance { have: U256, need: U256 },

    #[error("Participation {0} was already refunded")]
    AlreadyRefunded(U256),

    #[error("Participation {0} was already settled")]
    ParticipationSettled(U256),

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: CampaignStatus,
        to: CampaignStatus,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Batch length mismatch: {recipients} recipients, {amounts} amounts")]
    BatchLengthMismatch { recipients: usize, amounts: usize },

    #[error("Unknown on-chain campaign status {0}")]
    UnknownStatus(u8),
}

/// Result type for lifecycle checks
pub type ValidationResult<T> = Result<T, ValidationError>;
