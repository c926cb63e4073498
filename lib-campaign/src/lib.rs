//! R2S Campaign Lifecycle Model
//!
//! Data shapes mirroring the campaign contract's storage, and the local
//! checks the SDK runs before submitting a transaction.
//!
//! # Key Types
//!
//! - [`Campaign`]: a read-through projection of one campaign
//! - [`CampaignStatus`]: lifecycle state derived from the raw status and the clock
//! - [`CreateCampaignParams`]: creation payload
//! - [`Participation`]: one deposit into a campaign
//!
//! # Lifecycle
//!
//! ```text
//! Pending -> Active -> Closed -> Settled
//!    \         |         /
//!     `---> Cancelled <-'
//! ```
//!
//! Campaign ids are assigned by the contract; this crate never invents one.

pub mod amount;
pub mod campaign;
pub mod errors;
pub mod params;
pub mod participation;
pub mod validation;

pub use amount::{apply_bps, from_base_units, to_base_units, BASIS_POINTS, TOKEN_DECIMALS};
pub use campaign::{Campaign, CampaignStats, CampaignStatus, OnChainStatus, StatusObservation};
pub use errors::{ValidationError, ValidationResult};
pub use params::{CreateCampaignParams, CreateCampaignParamsBuilder};
pub use participation::Participation;
pub use validation::{
    validate_create, validate_funding, validate_participation, validate_refund,
    validate_settlement,
};
