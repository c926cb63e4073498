//! Contract ABI System
//!
//! Two views of the same interfaces:
//!
//! - `bindings.rs` - typed `sol!` call, event and error types used for encoding
//! - `schema.rs` - runtime method/event tables (`{name, inputs, outputs, mutability}`)
//! - `tables.rs` - the human-readable signatures the tables are built from
//! - `registry.rs` - contract ABI registry and lookup
//! - `revert.rs` - revert payload decoding
//!
//! The typed handle checks every call against the table before it touches
//! the network, so a view method can never be sent as a transaction and a
//! state-changing method can never be answered by `eth_call` alone.

pub mod bindings;
pub mod registry;
pub mod revert;
pub mod schema;
pub mod tables;

pub use bindings::{MockUSDT, R2SCampaign};
pub use registry::{AbiError, AbiRegistry};
pub use revert::{decode_revert, RevertReason};
pub use schema::{ContractAbi, EventField, EventSchema, MethodSchema, Mutability};
pub use tables::{mock_usdt_abi, r2s_campaign_abi, MOCK_USDT, R2S_CAMPAIGN};
