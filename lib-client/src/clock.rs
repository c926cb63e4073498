//! Time source for lifecycle checks.
//!
//! The contract judges deposit windows and settlement dates by
//! `block.timestamp`, so the default source is the chain itself.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::error::{Result, SdkError};
use crate::rpc::ContractRpc;

/// Current Unix time in seconds
#[async_trait]
pub trait Clock: Send + Sync + fmt::Debug {
    async fn now(&self) -> Result<u64>;
}

/// Timestamp of the latest block
#[derive(Debug, Clone)]
pub struct ChainClock {
    rpc: Arc<dyn ContractRpc>,
}

impl ChainClock {
    pub fn new(rpc: Arc<dyn ContractRpc>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl Clock for ChainClock {
    async fn now(&self) -> Result<u64> {
        self.rpc
            .latest_block_timestamp()
            .await
            .map_err(SdkError::from_node)
    }
}

/// Wall clock of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn now(&self) -> Result<u64> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0))
    }
}
