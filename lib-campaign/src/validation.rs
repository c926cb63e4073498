//! Local precondition checks.
//!
//! Each check mirrors a `require` the campaign contract would hit, so a
//! call that is certain to revert is rejected before it costs gas.
//!
//! # Checks Performed
//!
//! 1. **Creation**: deposit bounds ordered, discount within 100%, non-zero
//!    target and duration
//! 2. **Participation**: campaign `Active`, deposit within bounds, no
//!    overflow of the running total
//! 3. **Settlement**: campaign `Closed` and settlement date reached
//! 4. **Refund**: participation still open

use alloy_primitives::U256;

use crate::amount::BASIS_POINTS;
use crate::campaign::{Campaign, CampaignStatus};
use crate::errors::{ValidationError, ValidationResult};
use crate::params::CreateCampaignParams;
use crate::participation::Participation;

/// Validate a creation payload.
pub fn validate_create(params: &CreateCampaignParams) -> ValidationResult<()> {
    if params.min_deposit > params.max_deposit {
        return Err(ValidationError::DepositBoundsInverted {
            min: params.min_deposit,
            max: params.max_deposit,
        });
    }

    if params.discount_rate > BASIS_POINTS {
        return Err(ValidationError::DiscountRateTooHigh {
            rate: params.discount_rate,
            max: BASIS_POINTS,
        });
    }

    if params.target_amount.is_zero() {
        return Err(ValidationError::ZeroTargetAmount);
    }

    if params.duration == 0 {
        return Err(ValidationError::ZeroDuration);
    }

    Ok(())
}

/// Validate a deposit of `amount` into `campaign` at time `now`.
///
/// Returns the campaign total after the deposit.
pub fn validate_participation(
    campaign: &Campaign,
    amount: U256,
    now: u64,
) -> ValidationResult<U256> {
    let status = campaign.status_at(now);
    if status != CampaignStatus::Active {
        return Err(ValidationError::WrongStatus {
            status,
            expected: CampaignStatus::Active,
        });
    }

    if amount < campaign.min_deposit {
        return Err(ValidationError::BelowMinimumDeposit {
            amount,
            min: campaign.min_deposit,
        });
    }

    if amount > campaign.max_deposit {
        return Err(ValidationError::AboveMaximumDeposit {
            amount,
            max: campaign.max_deposit,
        });
    }

    campaign
        .current_amount
        .checked_add(amount)
        .ok_or(ValidationError::DepositOverflow)
}

/// Validate that `campaign` can be settled at time `now`.
pub fn validate_settlement(campaign: &Campaign, now: u64) -> ValidationResult<()> {
    let status = campaign.status_at(now);
    match status {
        CampaignStatus::Settled => return Err(ValidationError::AlreadySettled),
        CampaignStatus::Closed => {}
        other => {
            return Err(ValidationError::WrongStatus {
                status: other,
                expected: CampaignStatus::Closed,
            })
        }
    }

    if now < campaign.settlement_date {
        return Err(ValidationError::SettlementNotReached {
            settlement_date: campaign.settlement_date,
            now,
        });
    }

    Ok(())
}

/// Validate that `participation` can still be refunded.
pub fn validate_refund(participation: &Participation) -> ValidationResult<()> {
    if participation.is_refunded {
        return Err(ValidationError::AlreadyRefunded(participation.id));
    }
    if participation.is_settled {
        return Err(ValidationError::ParticipationSettled(participation.id));
    }
    Ok(())
}

/// Validate that a holder can cover `need` with `balance` and `allowance`.
pub fn validate_funding(balance: U256, allowance: U256, need: U256) -> ValidationResult<()> {
    if balance < need {
        return Err(ValidationError::InsufficientBalance { have: balance, need });
    }
    if allowance < need {
        return Err(ValidationError::InsufficientAllowance { have: allowance, need });
    }
    Ok(())
}
