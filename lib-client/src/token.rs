//! MockUSDT operations
//!
//! [`TokenReader`] answers queries; [`TokenWriter`] adds the state-changing
//! calls and exists only inside a signing client.

use alloy::primitives::{Address, U256};
use lib_campaign::{validate_funding, ValidationError};
use serde::{Deserialize, Serialize};

use crate::abi::MockUSDT;
use crate::contract::ContractHandle;
use crate::error::Result;
use crate::pending::PendingTx;
use crate::sender::TransactionSender;

/// Static token metadata plus current supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

/// Read access to the token contract
#[derive(Debug, Clone)]
pub struct TokenReader {
    handle: ContractHandle,
}

impl TokenReader {
    pub fn new(handle: ContractHandle) -> Self {
        Self { handle }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    pub fn handle(&self) -> &ContractHandle {
        &self.handle
    }

    /// Balance in base units. An address that never held tokens has `0`.
    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        self.handle.read(MockUSDT::balanceOfCall { account }).await
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.handle
            .read(MockUSDT::allowanceCall { owner, spender })
            .await
    }

    pub async fn total_supply(&self) -> Result<U256> {
        self.handle.read(MockUSDT::totalSupplyCall {}).await
    }

    pub async fn decimals(&self) -> Result<u8> {
        self.handle.read(MockUSDT::decimalsCall {}).await
    }

    pub async fn name(&self) -> Result<String> {
        self.handle.read(MockUSDT::nameCall {}).await
    }

    pub async fn symbol(&self) -> Result<String> {
        self.handle.read(MockUSDT::symbolCall {}).await
    }

    pub async fn owner(&self) -> Result<Address> {
        self.handle.read(MockUSDT::ownerCall {}).await
    }

    pub async fn token_info(&self) -> Result<TokenInfo> {
        let (name, symbol, decimals, total_supply) = tokio::try_join!(
            self.name(),
            self.symbol(),
            self.decimals(),
            self.total_supply()
        )?;
        Ok(TokenInfo {
            name,
            symbol,
            decimals,
            total_supply,
        })
    }

    /// Check that `owner` holds `amount` and has approved `spender` for it.
    pub(crate) async fn check_funding(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()> {
        let (balance, allowance) =
            tokio::try_join!(self.balance_of(owner), self.allowance(owner, spender))?;
        validate_funding(balance, allowance, amount)?;
        Ok(())
    }

    async fn check_balance(&self, owner: Address, amount: U256) -> Result<()> {
        let balance = self.balance_of(owner).await?;
        if balance < amount {
            return Err(ValidationError::InsufficientBalance {
                have: balance,
                need: amount,
            }
            .into());
        }
        Ok(())
    }
}

/// Token operations that need a signer
#[derive(Debug, Clone)]
pub struct TokenWriter {
    reader: TokenReader,
    sender: TransactionSender,
}

impl TokenWriter {
    pub fn new(reader: TokenReader, sender: TransactionSender) -> Self {
        Self { reader, sender }
    }

    pub fn reader(&self) -> &TokenReader {
        &self.reader
    }

    pub async fn transfer(&self, to: Address, value: U256) -> Result<PendingTx> {
        self.reader.check_balance(self.sender.account(), value).await?;
        let call = self
            .reader
            .handle
            .prepare(&MockUSDT::transferCall { to, value })?;
        self.sender.submit(call).await
    }

    pub async fn approve(&self, spender: Address, value: U256) -> Result<PendingTx> {
        let call = self
            .reader
            .handle
            .prepare(&MockUSDT::approveCall { spender, value })?;
        self.sender.submit(call).await
    }

    /// Owner only; anyone else gets the contract's `OwnableUnauthorizedAccount`.
    pub async fn mint(&self, to: Address, amount: U256) -> Result<PendingTx> {
        let call = self
            .reader
            .handle
            .prepare(&MockUSDT::mintCall { to, amount })?;
        self.sender.submit(call).await
    }

    /// Owner only. `recipients` and `amounts` pair up by position.
    pub async fn batch_mint(&self, recipients: Vec<Address>, amounts: Vec<U256>) -> Result<PendingTx> {
        if recipients.len() != amounts.len() {
            return Err(ValidationError::BatchLengthMismatch {
                recipients: recipients.len(),
                amounts: amounts.len(),
            }
            .into());
        }
        let call = self
            .reader
            .handle
            .prepare(&MockUSDT::batchMintCall { recipients, amounts })?;
        self.sender.submit(call).await
    }

    pub async fn burn(&self, value: U256) -> Result<PendingTx> {
        self.reader.check_balance(self.sender.account(), value).await?;
        let call = self.reader.handle.prepare(&MockUSDT::burnCall { value })?;
        self.sender.submit(call).await
    }

    /// Burn from `account` using the signer's allowance.
    pub async fn burn_from(&self, account: Address, value: U256) -> Result<PendingTx> {
        self.reader
            .check_funding(account, self.sender.account(), value)
            .await?;
        let call = self
            .reader
            .handle
            .prepare(&MockUSDT::burnFromCall { account, value })?;
        self.sender.submit(call).await
    }
}
