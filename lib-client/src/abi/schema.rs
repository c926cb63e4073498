//! Method and event tables for a contract ABI
//!
//! A [`ContractAbi`] is built from human-readable Solidity signatures and
//! answers the questions the typed handle needs at runtime: does this
//! selector exist, what does it take and return, and may it change state.

use alloy::json_abi::{Event, Function, StateMutability};
use alloy::primitives::{Selector, B256};
use serde::{Deserialize, Serialize};

use super::registry::AbiError;

/// Complete contract ABI table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractAbi {
    /// Contract name (e.g., "MockUSDT", "R2SCampaign")
    pub contract: String,

    /// All methods the SDK may call, in declaration order
    pub methods: Vec<MethodSchema>,

    /// All events the SDK decodes
    pub events: Vec<EventSchema>,
}

/// One callable method
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodSchema {
    /// Method name (e.g., "transfer")
    pub name: String,

    /// Canonical signature, `name(type,...)`
    pub signature: String,

    /// First four bytes of the signature hash
    pub selector: Selector,

    /// Canonical input types in order
    pub inputs: Vec<String>,

    /// Canonical output types in order
    pub outputs: Vec<String>,

    pub mutability: Mutability,
}

/// One event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventSchema {
    pub name: String,

    /// Canonical signature, `Name(type,...)`
    pub signature: String,

    /// Topic zero of every log this event emits
    pub topic0: B256,

    pub fields: Vec<EventField>,
}

/// Event field definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventField {
    pub name: String,

    pub r#type: String,

    /// Whether the field is carried in a topic instead of the data
    #[serde(default)]
    pub indexed: bool,
}

/// State mutability of a method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl Mutability {
    /// Whether the method can be answered by `eth_call` alone.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Mutability::Pure | Mutability::View)
    }
}

impl From<StateMutability> for Mutability {
    fn from(value: StateMutability) -> Self {
        match value {
            StateMutability::Pure => Mutability::Pure,
            StateMutability::View => Mutability::View,
            StateMutability::NonPayable => Mutability::NonPayable,
            StateMutability::Payable => Mutability::Payable,
        }
    }
}

impl MethodSchema {
    fn from_function(function: &Function) -> Self {
        Self {
            name: function.name.clone(),
            signature: function.signature(),
            selector: function.selector(),
            inputs: function.inputs.iter().map(|p| p.selector_type().into_owned()).collect(),
            outputs: function.outputs.iter().map(|p| p.selector_type().into_owned()).collect(),
            mutability: function.state_mutability.into(),
        }
    }
}

impl EventSchema {
    fn from_event(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            signature: event.signature(),
            topic0: event.selector(),
            fields: event
                .inputs
                .iter()
                .map(|p| EventField {
                    name: p.name.clone(),
                    r#type: p.selector_type().into_owned(),
                    indexed: p.indexed,
                })
                .collect(),
        }
    }
}

impl ContractAbi {
    /// Create an empty ABI table
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            methods: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Build a table from human-readable signatures such as
    /// `function balanceOf(address account) view returns (uint256)`.
    pub fn from_human_readable(
        contract: impl Into<String>,
        functions: &[&str],
        events: &[&str],
    ) -> Result<Self, AbiError> {
        let mut abi = Self::new(contract);

        for line in functions {
            let function = Function::parse(line).map_err(|e| AbiError::Parse {
                line: line.to_string(),
                reason: e.to_string(),
            })?;
            abi.push_method(MethodSchema::from_function(&function))?;
        }

        for line in events {
            let event = Event::parse(line).map_err(|e| AbiError::Parse {
                line: line.to_string(),
                reason: e.to_string(),
            })?;
            abi.events.push(EventSchema::from_event(&event));
        }

        Ok(abi)
    }

    fn push_method(&mut self, method: MethodSchema) -> Result<(), AbiError> {
        if self.method_by_selector(method.selector).is_some() {
            return Err(AbiError::DuplicateSelector {
                contract: self.contract.clone(),
                signature: method.signature,
            });
        }
        self.methods.push(method);
        Ok(())
    }

    /// Look up a method by name. Overloads resolve to the first declaration.
    pub fn method(&self, name: &str) -> Option<&MethodSchema> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn method_by_selector(&self, selector: Selector) -> Option<&MethodSchema> {
        self.methods.iter().find(|m| m.selector == selector)
    }

    pub fn method_by_signature(&self, signature: &str) -> Option<&MethodSchema> {
        self.methods.iter().find(|m| m.signature == signature)
    }

    pub fn event(&self, name: &str) -> Option<&EventSchema> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn event_by_topic(&self, topic0: B256) -> Option<&EventSchema> {
        self.events.iter().find(|e| e.topic0 == topic0)
    }

    /// Names of the read-only methods
    pub fn read_methods(&self) -> impl Iterator<Item = &str> {
        self.methods
            .iter()
            .filter(|m| m.mutability.is_read_only())
            .map(|m| m.name.as_str())
    }

    /// Serialize to canonical JSON
    pub fn to_json(&self) -> Result<String, AbiError> {
        serde_json::to_string_pretty(self).map_err(|e| AbiError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        serde_json::from_str(json).map_err(|e| AbiError::Serialization(e.to_string()))
    }
}
