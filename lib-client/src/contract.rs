//! Typed contract handle
//!
//! One generic handle per deployed contract, driven by its ABI table: the
//! typed `sol!` call supplies the encoding, the table decides whether the
//! call is a read or a write.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, Selector};
use alloy::rpc::types::Log;
use alloy::sol_types::{SolCall, SolEvent};
use tracing::{debug, warn};

use crate::abi::{AbiError, ContractAbi, MethodSchema};
use crate::config::SdkConfig;
use crate::error::{CallContext, Result, SdkError};
use crate::rpc::ContractRpc;

/// Retry policy for reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            retries: config.read_retries,
            backoff: config.retry_backoff(),
        }
    }
}

/// An encoded state-changing call, ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub to: Address,
    pub input: Bytes,
    pub context: CallContext,
}

/// Handle on one deployed contract
#[derive(Clone)]
pub struct ContractHandle {
    abi: Arc<ContractAbi>,
    address: Address,
    rpc: Arc<dyn ContractRpc>,
    retry: RetryPolicy,
}

impl fmt::Debug for ContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractHandle")
            .field("contract", &self.abi.contract)
            .field("address", &self.address)
            .finish()
    }
}

impl ContractHandle {
    pub fn new(
        abi: Arc<ContractAbi>,
        address: Address,
        rpc: Arc<dyn ContractRpc>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            abi,
            address,
            rpc,
            retry,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Same ABI and connection, another deployment
    pub fn at(&self, address: Address) -> Self {
        Self {
            address,
            ..self.clone()
        }
    }

    pub fn abi(&self) -> &ContractAbi {
        &self.abi
    }

    pub fn rpc(&self) -> &Arc<dyn ContractRpc> {
        &self.rpc
    }

    /// Describe `call` for error reports.
    pub fn context<C: SolCall + fmt::Debug>(&self, call: &C) -> CallContext {
        CallContext {
            contract: self.abi.contract.clone(),
            address: self.address,
            method: C::SIGNATURE.to_string(),
            args: format!("{:?}", call),
        }
    }

    fn method<C: SolCall>(&self) -> std::result::Result<&MethodSchema, AbiError> {
        self.abi
            .method_by_selector(Selector::from(C::SELECTOR))
            .ok_or_else(|| AbiError::UnknownMethod {
                contract: self.abi.contract.clone(),
                signature: C::SIGNATURE.to_string(),
            })
    }

    /// Execute a read-only call.
    pub async fn read<C>(&self, call: C) -> Result<C::Return>
    where
        C: SolCall + fmt::Debug + Send + Sync,
    {
        self.read_as(None, call).await
    }

    /// Execute a read-only call with `from` as `msg.sender`.
    ///
    /// Transport failures are retried with a fixed backoff; reverts and
    /// decode failures are not.
    pub async fn read_as<C>(&self, from: Option<Address>, call: C) -> Result<C::Return>
    where
        C: SolCall + fmt::Debug + Send + Sync,
    {
        let method = self.method::<C>()?;
        if !method.mutability.is_read_only() {
            return Err(AbiError::WrongMutability {
                contract: self.abi.contract.clone(),
                method: method.name.clone(),
                actual: "state-changing",
                wanted: "a read",
            }
            .into());
        }

        let context = self.context(&call);
        let input = Bytes::from(call.abi_encode());
        debug!("eth_call {} ({} bytes)", context, input.len());

        let mut attempt = 0;
        let output = loop {
            match self.rpc.call(from, self.address, input.clone()).await {
                Ok(output) => break output,
                Err(failure) if failure.is_transient() && attempt < self.retry.retries => {
                    attempt += 1;
                    warn!(
                        "Read {} failed ({}), retry {}/{}",
                        context.method, failure, attempt, self.retry.retries
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                }
                Err(failure) => return Err(SdkError::from_read(failure, context)),
            }
        };

        C::abi_decode_returns(&output)
            .map_err(|e| SdkError::Decode(format!("{} returned undecodable data: {}", context, e)))
    }

    /// Encode a state-changing call for submission.
    pub fn prepare<C: SolCall + fmt::Debug>(&self, call: &C) -> Result<PreparedCall> {
        let method = self.method::<C>()?;
        if method.mutability.is_read_only() {
            return Err(AbiError::WrongMutability {
                contract: self.abi.contract.clone(),
                method: method.name.clone(),
                actual: "read-only",
                wanted: "a transaction",
            }
            .into());
        }

        let context = self.context(call);
        let input = Bytes::from(call.abi_encode());
        debug!("Encoded {} ({} bytes)", context, input.len());
        Ok(PreparedCall {
            to: self.address,
            input,
            context,
        })
    }

    /// Decode every log in `logs` emitted by this contract as `E`.
    pub fn decode_events<E: SolEvent>(&self, logs: &[Log]) -> Vec<E> {
        logs.iter()
            .filter(|log| log.address() == self.address)
            .filter_map(|log| E::decode_log(&log.inner).ok())
            .map(|decoded| decoded.data)
            .collect()
    }
}
