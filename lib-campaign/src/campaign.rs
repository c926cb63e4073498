//! Campaign records and the lifecycle state machine.
//!
//! A [`Campaign`] is a projection of the campaign contract's storage at the
//! moment it was read. The SDK never creates or mutates one locally; it
//! re-reads the campaign before every decision that depends on its state.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::{apply_bps, BASIS_POINTS};
use crate::errors::{ValidationError, ValidationResult};

// =============================================================================
// STATUS
// =============================================================================

/// Raw `uint8` status stored by the campaign contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OnChainStatus {
    Draft = 0,
    Pending = 1,
    Active = 2,
    Completed = 3,
    Settling = 4,
    Settled = 5,
    Cancelled = 6,
}

impl TryFrom<u8> for OnChainStatus {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OnChainStatus::Draft),
            1 => Ok(OnChainStatus::Pending),
            2 => Ok(OnChainStatus::Active),
            3 => Ok(OnChainStatus::Completed),
            4 => Ok(OnChainStatus::Settling),
            5 => Ok(OnChainStatus::Settled),
            6 => Ok(OnChainStatus::Cancelled),
            other => Err(ValidationError::UnknownStatus(other)),
        }
    }
}

impl From<OnChainStatus> for u8 {
    fn from(status: OnChainStatus) -> Self {
        status as u8
    }
}

/// Lifecycle state of a campaign as seen by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Created, participation window not open yet
    Pending,
    /// `start_time <= now < end_time`
    Active,
    /// Window closed, funds locked until settlement
    Closed,
    /// Terminal: settlement confirmed
    Settled,
    /// Terminal: cancelled before settlement
    Cancelled,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignStatus::Pending => write!(f, "pending"),
            CampaignStatus::Active => write!(f, "active"),
            CampaignStatus::Closed => write!(f, "closed"),
            CampaignStatus::Settled => write!(f, "settled"),
            CampaignStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl CampaignStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Settled | CampaignStatus::Cancelled)
    }

    /// Whether `next` is a single legal step from `self`.
    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, next),
            (Pending, Active)
                | (Active, Closed)
                | (Closed, Settled)
                | (Pending, Cancelled)
                | (Active, Cancelled)
                | (Closed, Cancelled)
        )
    }

    /// Whether `next` can be observed after `self` through zero or more
    /// legal steps. Two reads may straddle several transitions.
    pub fn can_reach(&self, next: CampaignStatus) -> bool {
        if *self == next {
            return true;
        }
        let mut frontier = vec![*self];
        while let Some(current) = frontier.pop() {
            for candidate in ALL_STATUSES {
                if current.can_transition_to(candidate) {
                    if candidate == next {
                        return true;
                    }
                    frontier.push(candidate);
                }
            }
        }
        false
    }
}

const ALL_STATUSES: [CampaignStatus; 5] = [
    CampaignStatus::Pending,
    CampaignStatus::Active,
    CampaignStatus::Closed,
    CampaignStatus::Settled,
    CampaignStatus::Cancelled,
];

/// Tracks the last observed status of one campaign across fresh reads.
///
/// Used to catch a node serving stale state (a status that moved backwards).
#[derive(Debug, Clone, Default)]
pub struct StatusObservation {
    last: Option<CampaignStatus>,
}

impl StatusObservation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<CampaignStatus> {
        self.last
    }

    /// Record a newly read status, rejecting regressions.
    pub fn observe(&mut self, next: CampaignStatus) -> ValidationResult<()> {
        if let Some(prev) = self.last {
            if !prev.can_reach(next) {
                return Err(ValidationError::IllegalTransition { from: prev, to: next });
            }
        }
        self.last = Some(next);
        Ok(())
    }
}

// =============================================================================
// CAMPAIGN
// =============================================================================

/// One campaign as returned by `getCampaign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: U256,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub merchant: Address,
    pub token: Address,
    pub target_amount: U256,
    pub current_amount: U256,
    pub min_deposit: U256,
    pub max_deposit: U256,
    /// Basis points, 0..=10_000
    pub discount_rate: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub settlement_date: u64,
    pub total_participants: u64,
    pub total_settled: U256,
    pub onchain_status: OnChainStatus,
    pub is_verified: bool,
}

impl Campaign {
    /// Derive the lifecycle state at `now` (Unix seconds).
    pub fn status_at(&self, now: u64) -> CampaignStatus {
        match self.onchain_status {
            OnChainStatus::Cancelled => CampaignStatus::Cancelled,
            OnChainStatus::Settled => CampaignStatus::Settled,
            OnChainStatus::Completed | OnChainStatus::Settling => CampaignStatus::Closed,
            OnChainStatus::Draft => CampaignStatus::Pending,
            OnChainStatus::Pending | OnChainStatus::Active => {
                if now < self.start_time {
                    CampaignStatus::Pending
                } else if now < self.end_time {
                    CampaignStatus::Active
                } else {
                    CampaignStatus::Closed
                }
            }
        }
    }

    pub fn accepts_deposits_at(&self, now: u64) -> bool {
        self.status_at(now) == CampaignStatus::Active
    }

    /// Discount a participant earns on `amount`.
    pub fn expected_discount(&self, amount: U256) -> U256 {
        apply_bps(amount, self.discount_rate)
    }

    /// Progress towards the target in basis points, capped at 100%.
    pub fn progress_bps(&self) -> u64 {
        if self.target_amount.is_zero() {
            return 0;
        }
        let bps = self.current_amount.saturating_mul(U256::from(BASIS_POINTS)) / self.target_amount;
        u64::try_from(bps).unwrap_or(u64::MAX).min(BASIS_POINTS)
    }

    pub fn target_reached(&self) -> bool {
        self.current_amount >= self.target_amount
    }
}

/// Aggregates returned by `getCampaignStats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub total_participants: U256,
    pub total_deposited: U256,
    pub average_deposit: U256,
    pub completion_rate: U256,
}


#[cfg(test)]
mod tests {
    use super::fixtures::campaign;
    use super::*;

    #[test]
    fn test_status_follows_the_clock() {
        let c = campaign();
        assert_eq!(c.status_at(999), CampaignStatus::Pending);
        assert_eq!(c.status_at(1_000), CampaignStatus::Active);
        assert_eq!(c.status_at(1_999), CampaignStatus::Active);
        assert_eq!(c.status_at(2_000), CampaignStatus::Closed);
        assert_eq!(c.status_at(9_999), CampaignStatus::Closed);
    }

    #[test]
    fn test_raw_status_overrides_clock() {
        let mut c = campaign();
        c.onchain_status = OnChainStatus::Settled;
        assert_eq!(c.status_at(1_500), CampaignStatus::Settled);

        c.onchain_status = OnChainStatus::Cancelled;
        assert_eq!(c.status_at(1_500), CampaignStatus::Cancelled);

        c.onchain_status = OnChainStatus::Settling;
        assert_eq!(c.status_at(1_500), CampaignStatus::Closed);

        c.onchain_status = OnChainStatus::Draft;
        assert_eq!(c.status_at(1_500), CampaignStatus::Pending);
    }

    #[test]
    fn test_onchain_status_codes() {
        assert_eq!(OnChainStatus::try_from(5).unwrap(), OnChainStatus::Settled);
        assert_eq!(u8::from(OnChainStatus::Cancelled), 6);
        assert_eq!(
            OnChainStatus::try_from(7),
            Err(ValidationError::UnknownStatus(7))
        );
    }

    #[test]
    fn test_transitions_never_regress() {
        use CampaignStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Active.can_transition_to(Closed));
        assert!(Closed.can_transition_to(Settled));
        assert!(Active.can_transition_to(Cancelled));

        assert!(!Active.can_transition_to(Pending));
        assert!(!Closed.can_transition_to(Active));
        assert!(!Settled.can_transition_to(Closed));
        assert!(!Settled.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Active));
        // Skipping a state is not a single step
        assert!(!Pending.can_transition_to(Closed));
    }

    #[test]
    fn test_reachability_spans_several_steps() {
        use CampaignStatus::*;
        assert!(Pending.can_reach(Settled));
        assert!(Active.can_reach(Settled));
        assert!(Pending.can_reach(Pending));
        assert!(!Settled.can_reach(Active));
        assert!(!Cancelled.can_reach(Settled));
        assert!(!Closed.can_reach(Pending));
    }

    #[test]
    fn test_observation_rejects_stale_reads() {
        let mut seen = StatusObservation::new();
        seen.observe(CampaignStatus::Active).unwrap();
        seen.observe(CampaignStatus::Closed).unwrap();
        let err = seen.observe(CampaignStatus::Active).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IllegalTransition {
                from: CampaignStatus::Closed,
                to: CampaignStatus::Active,
            }
        );
        assert_eq!(seen.last(), Some(CampaignStatus::Closed));
    }

    #[test]
    fn test_discount_and_progress() {
        let mut c = campaign();
        assert_eq!(c.expected_discount(U256::from(500u64)), U256::from(50u64));

        c.current_amount = U256::from(2_500u64);
        assert_eq!(c.progress_bps(), 2_500);
        assert!(!c.target_reached());

        c.current_amount = U256::from(20_000u64);
        assert_eq!(c.progress_bps(), BASIS_POINTS);
        assert!(c.target_reached());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&CampaignStatus::Closed).unwrap();
        assert_eq!(json, "\"closed\"");
    }
}
