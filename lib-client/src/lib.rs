//! R2S Client SDK
//!
//! Typed access to the R2S campaign contract and its MockUSDT deposit token
//! on any Ethereum JSON-RPC node.
//!
//! # Features
//!
//! - **Read/Write split**: [`ReadOnlyClient`] queries; [`SigningClient`] also submits
//! - **Local validation**: campaign parameters, deposit bounds and funding are
//!   checked before anything is broadcast
//! - **Transaction lifecycle**: serialized nonces, confirmation depth, timeouts,
//!   replacement-based cancellation
//! - **Decoded reverts**: custom errors and revert strings become [`RevertReason`]
//! - **Events**: typed campaign events, one-shot or polled
//!
//! # Example
//!
//! ```ignore
//! use r2s_client::{new_sdk, CreateCampaignParams};
//!
//! let sdk = new_sdk("http://localhost:8545", Some(&key)).await?;
//! let client = sdk.into_signing()?;
//!
//! let id = client.campaign().create_campaign(params).await?;
//! client
//!     .campaign()
//!     .participate_with_approval(id, amount)
//!     .await?
//!     .confirm()
//!     .await?;
//! ```

pub mod abi;
pub mod campaign;
pub mod client;
pub mod clock;
pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod logging;
pub mod nonce;
pub mod pending;
pub mod rpc;
pub mod sender;
pub mod testing;
pub mod token;

// Re-exports for convenience
pub use abi::{decode_revert, AbiError, AbiRegistry, ContractAbi, Mutability, RevertReason};
pub use campaign::{CampaignReader, CampaignWriter, FeeSchedule};
pub use client::{new_sdk, ReadOnlyClient, Sdk, SigningClient};
pub use clock::{ChainClock, Clock, SystemClock};
pub use config::{ConfigError, ContractAddresses, SdkConfig};
pub use contract::{ContractHandle, PreparedCall, RetryPolicy};
pub use error::{CallContext, ErrorKind, Result, SdkError};
pub use events::{EventRecord, EventStream};
pub use pending::{ConfirmPolicy, PendingTx};
pub use rpc::{ContractRpc, HttpRpc, LogQuery, OutgoingTransaction, Receipt, RpcFailure};
pub use sender::TransactionSender;
pub use token::{TokenInfo, TokenReader, TokenWriter};

pub use lib_campaign::{
    from_base_units, to_base_units, Campaign, CampaignStats, CampaignStatus,
    CreateCampaignParams, CreateCampaignParamsBuilder, Participation, ValidationError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
