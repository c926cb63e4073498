//! Error types for the R2S client library
//!
//! Every failure surfaces as one [`SdkError`]. [`SdkError::kind`] collapses
//! it to the coarse [`ErrorKind`] a caller branches on.

use std::fmt;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use lib_campaign::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::abi::{AbiError, RevertReason};
use crate::config::ConfigError;
use crate::rpc::RpcFailure;

/// The call an error refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Contract name (e.g., "R2SCampaign")
    pub contract: String,
    pub address: Address,
    /// Canonical method signature
    pub method: String,
    /// Rendered call arguments
    pub args: String,
}

impl fmt::Display for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{} with {}",
            self.contract, self.address, self.method, self.args
        )
    }
}

/// Client library error type
#[derive(Error, Debug, Clone)]
pub enum SdkError {
    /// Local precondition failed; nothing was sent
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Call does not match the contract's ABI table
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    /// Node unreachable or connection lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Client could not be constructed (bad endpoint, bad key)
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Node refused the transaction before inclusion
    #[error("Submission of {call} rejected: {reason}")]
    Submission { call: CallContext, reason: String },

    /// Execution reverted, either during simulation or after mining
    #[error("{call} reverted: {reason}")]
    ContractRevert {
        call: CallContext,
        reason: RevertReason,
        /// Set when the revert was mined
        tx_hash: Option<TxHash>,
    },

    /// Confirmation not observed in time; the transaction may still land
    #[error("Transaction {tx_hash} not confirmed after {waited:?}")]
    Timeout { tx_hash: TxHash, waited: Duration },

    /// Read referenced an entity the contract does not know
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Node returned data that does not match the ABI
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Connection,
    Initialization,
    Submission,
    ContractRevert,
    Timeout,
    NotFound,
    Decode,
    Config,
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::Validation(_) | SdkError::Abi(_) => ErrorKind::Validation,
            SdkError::Connection(_) => ErrorKind::Connection,
            SdkError::Initialization(_) => ErrorKind::Initialization,
            SdkError::Submission { .. } => ErrorKind::Submission,
            SdkError::ContractRevert { .. } => ErrorKind::ContractRevert,
            SdkError::Timeout { .. } => ErrorKind::Timeout,
            SdkError::NotFound { .. } => ErrorKind::NotFound,
            SdkError::Decode(_) => ErrorKind::Decode,
            SdkError::Config(_) => ErrorKind::Config,
        }
    }

    /// Revert reason, if this is a revert
    pub fn revert_reason(&self) -> Option<&RevertReason> {
        match self {
            SdkError::ContractRevert { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Map a failed read to an SDK error.
    pub(crate) fn from_read(failure: RpcFailure, call: CallContext) -> Self {
        match failure {
            RpcFailure::Transport(msg) => SdkError::Connection(format!("{}: {}", call, msg)),
            RpcFailure::Revert { message, data } => SdkError::ContractRevert {
                call,
                reason: revert_from_parts(message, &data),
                tx_hash: None,
            },
            RpcFailure::Rejected(msg) | RpcFailure::Malformed(msg) => {
                SdkError::Decode(format!("{}: {}", call, msg))
            }
        }
    }

    /// Map a failed submission to an SDK error.
    pub(crate) fn from_submission(failure: RpcFailure, call: CallContext) -> Self {
        match failure {
            RpcFailure::Transport(msg) => {
                SdkError::Connection(format!("submitting {}: {}", call, msg))
            }
            RpcFailure::Revert { message, data } => SdkError::ContractRevert {
                call,
                reason: revert_from_parts(message, &data),
                tx_hash: None,
            },
            RpcFailure::Rejected(reason) | RpcFailure::Malformed(reason) => {
                SdkError::Submission { call, reason }
            }
        }
    }

    /// Map a failure of a node query that is not tied to a contract call.
    pub(crate) fn from_node(failure: RpcFailure) -> Self {
        match failure {
            RpcFailure::Transport(msg) => SdkError::Connection(msg),
            other => SdkError::Decode(other.to_string()),
        }
    }
}

fn revert_from_parts(message: String, data: &[u8]) -> RevertReason {
    if data.is_empty() {
        RevertReason::message(message)
    } else {
        crate::abi::decode_revert(data)
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
