//! Revert payload decoding.
//!
//! Revert data is tried against the custom errors both contracts declare,
//! then against `Error(string)` and `Panic(uint256)`.

use std::fmt;

use alloy::primitives::{hex, Bytes};
use alloy::sol_types::{Panic, Revert, SolError, SolInterface};
use serde::{Deserialize, Serialize};

use super::bindings::{MockUSDT::MockUSDTErrors, R2SCampaign::R2SCampaignErrors};

/// A decoded revert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertReason {
    /// Custom error name, `None` for string reasons and panics
    pub name: Option<String>,
    pub message: String,
    /// Raw revert payload
    pub data: Bytes,
}

impl RevertReason {
    /// A revert known only by its message (e.g. from a node error string)
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            name: None,
            message: message.into(),
            data: Bytes::new(),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Decode a revert payload into a readable reason.
pub fn decode_revert(data: &[u8]) -> RevertReason {
    let raw = Bytes::copy_from_slice(data);

    if data.is_empty() {
        return RevertReason {
            name: None,
            message: "execution reverted".to_string(),
            data: raw,
        };
    }

    if let Ok(err) = MockUSDTErrors::abi_decode(data) {
        let (name, message) = describe_token_error(&err);
        return RevertReason {
            name: Some(name.to_string()),
            message,
            data: raw,
        };
    }

    if let Ok(err) = R2SCampaignErrors::abi_decode(data) {
        let (name, message) = describe_campaign_error(&err);
        return RevertReason {
            name: Some(name.to_string()),
            message,
            data: raw,
        };
    }

    let message = if let Ok(revert) = Revert::abi_decode(data) {
        revert.reason
    } else if let Ok(panic) = Panic::abi_decode(data) {
        match panic.kind() {
            Some(kind) => format!("panic: {kind}"),
            None => format!("panic: code {}", panic.code),
        }
    } else {
        format!("unrecognized revert data 0x{}", hex::encode(data))
    };
    RevertReason {
        name: None,
        message,
        data: raw,
    }
}

fn describe_token_error(err: &MockUSDTErrors) -> (&'static str, String) {
    match err {
        MockUSDTErrors::ERC20InsufficientAllowance(e) => (
            "ERC20InsufficientAllowance",
            format!(
                "ERC20InsufficientAllowance(spender={}, allowance={}, needed={})",
                e.spender, e.allowance, e.needed
            ),
        ),
        MockUSDTErrors::ERC20InsufficientBalance(e) => (
            "ERC20InsufficientBalance",
            format!(
                "ERC20InsufficientBalance(sender={}, balance={}, needed={})",
                e.sender, e.balance, e.needed
            ),
        ),
        MockUSDTErrors::ERC20InvalidApprover(e) => (
            "ERC20InvalidApprover",
            format!("ERC20InvalidApprover(approver={})", e.approver),
        ),
        MockUSDTErrors::ERC20InvalidReceiver(e) => (
            "ERC20InvalidReceiver",
            format!("ERC20InvalidReceiver(receiver={})", e.receiver),
        ),
        MockUSDTErrors::ERC20InvalidSender(e) => (
            "ERC20InvalidSender",
            format!("ERC20InvalidSender(sender={})", e.sender),
        ),
        MockUSDTErrors::ERC20InvalidSpender(e) => (
            "ERC20InvalidSpender",
            format!("ERC20InvalidSpender(spender={})", e.spender),
        ),
        MockUSDTErrors::OwnableInvalidOwner(e) => (
            "OwnableInvalidOwner",
            format!("OwnableInvalidOwner(owner={})", e.owner),
        ),
        MockUSDTErrors::OwnableUnauthorizedAccount(e) => (
            "OwnableUnauthorizedAccount",
            format!("OwnableUnauthorizedAccount(account={})", e.account),
        ),
    }
}

fn describe_campaign_error(err: &R2SCampaignErrors) -> (&'static str, String) {
    match err {
        R2SCampaignErrors::AccessControlUnauthorizedAccount(e) => (
            "AccessControlUnauthorizedAccount",
            format!(
                "AccessControlUnauthorizedAccount(account={}, neededRole={})",
                e.account, e.neededRole
            ),
        ),
        R2SCampaignErrors::EnforcedPause(_) => ("EnforcedPause", "EnforcedPause()".to_string()),
        R2SCampaignErrors::ExpectedPause(_) => ("ExpectedPause", "ExpectedPause()".to_string()),
        R2SCampaignErrors::FailedCall(_) => ("FailedCall", "FailedCall()".to_string()),
        R2SCampaignErrors::ReentrancyGuardReentrantCall(_) => (
            "ReentrancyGuardReentrantCall",
            "ReentrancyGuardReentrantCall()".to_string(),
        ),
        R2SCampaignErrors::SafeERC20FailedOperation(e) => (
            "SafeERC20FailedOperation",
            format!("SafeERC20FailedOperation(token={})", e.token),
        ),
    }
}
