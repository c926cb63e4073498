//! ABI registry for contract lookups
//!
//! Provides a central registry to manage and query contract ABIs.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::schema::ContractAbi;
use super::tables::{mock_usdt_abi, r2s_campaign_abi};

/// ABI table errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Cannot parse ABI line '{line}': {reason}")]
    Parse { line: String, reason: String },

    #[error("Duplicate selector for {signature} in {contract}")]
    DuplicateSelector { contract: String, signature: String },

    #[error("Contract ABI for '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("No ABI registered for contract '{0}'")]
    UnknownContract(String),

    #[error("{contract} has no method {signature}")]
    UnknownMethod { contract: String, signature: String },

    #[error("{contract}.{method} is {actual}, cannot be used as {wanted}")]
    WrongMutability {
        contract: String,
        method: String,
        actual: &'static str,
        wanted: &'static str,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Registry of contract ABIs
///
/// Manages the mapping from contract names to their ABI tables. Tables are
/// shared with every handle built from them.
#[derive(Debug, Clone)]
pub struct AbiRegistry {
    abis: HashMap<String, Arc<ContractAbi>>,
}

impl AbiRegistry {
    /// Create an empty ABI registry
    pub fn new() -> Self {
        Self {
            abis: HashMap::new(),
        }
    }

    /// Registry holding the MockUSDT and R2SCampaign tables
    pub fn r2s() -> Result<Self, AbiError> {
        let mut registry = Self::new();
        registry.register(mock_usdt_abi()?)?;
        registry.register(r2s_campaign_abi()?)?;
        Ok(registry)
    }

    /// Register a contract ABI
    ///
    /// Returns an error if a contract with this name already exists.
    pub fn register(&mut self, abi: ContractAbi) -> Result<(), AbiError> {
        if self.abis.contains_key(&abi.contract) {
            return Err(AbiError::AlreadyRegistered(abi.contract));
        }
        self.abis.insert(abi.contract.clone(), Arc::new(abi));
        Ok(())
    }

    /// Look up a contract ABI by name
    pub fn get(&self, contract: &str) -> Result<Arc<ContractAbi>, AbiError> {
        self.abis
            .get(contract)
            .cloned()
            .ok_or_else(|| AbiError::UnknownContract(contract.to_string()))
    }

    /// List all registered contracts
    pub fn list(&self) -> Vec<&str> {
        self.abis.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.abis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abis.is_empty()
    }
}

impl Default for AbiRegistry {
    fn default() -> Self {
        Self::new()
    }
}
