//! Contract state and execution for the in-memory chain.
//!
//! Follows the deployed contracts closely enough for SDK tests: the same
//! revert strings and custom errors, the same events, the same fee and
//! penalty arithmetic.

use std::collections::HashMap;

use alloy::primitives::{Address, Bytes, LogData, U256};
use alloy::sol_types::{Revert, SolError, SolEvent, SolInterface, SolValue};

use crate::abi::decode_revert;
use crate::abi::MockUSDT::{self, MockUSDTCalls};
use crate::abi::R2SCampaign::{self, R2SCampaignCalls};
use crate::abi::RevertReason;
use crate::config::ContractAddresses;

/// Seconds between creation and the start of the participation window
pub const START_DELAY: u64 = 60;

pub const TOKEN_DECIMALS: u8 = 6;

pub const PLATFORM_FEE_BPS: u64 = 250;
pub const MERCHANT_FEE_BPS: u64 = 100;
pub const EARLY_WITHDRAW_PENALTY_BPS: u64 = 500;
/// The contract caps discounts tighter than the SDK's 100% bound
pub const MAX_DISCOUNT_BPS: u64 = 5_000;

const STATUS_PENDING: u8 = 1;
const STATUS_ACTIVE: u8 = 2;
const STATUS_SETTLED: u8 = 5;
const STATUS_CANCELLED: u8 = 6;

/// Result of executing one call
pub(crate) struct Execution {
    pub output: Bytes,
    pub logs: Vec<LogData>,
    /// Emitting contract of each log, same order
    pub emitters: Vec<Address>,
}

pub(crate) type ExecResult<T> = Result<T, RevertReason>;

fn revert<T>(reason: &str) -> ExecResult<T> {
    Err(decode_revert(
        &Revert {
            reason: reason.to_string(),
        }
        .abi_encode(),
    ))
}

fn custom<T, E: SolError>(error: E) -> ExecResult<T> {
    Err(decode_revert(&error.abi_encode()))
}

fn bps(amount: U256, rate: u64) -> U256 {
    amount.saturating_mul(U256::from(rate)) / U256::from(10_000u64)
}

#[derive(Debug, Clone)]
pub(crate) struct TokenState {
    pub owner: Address,
    pub total_supply: U256,
    pub balances: HashMap<Address, U256>,
    pub allowances: HashMap<(Address, Address), U256>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CampaignState {
    pub campaigns: Vec<R2SCampaign::Campaign>,
    pub participations: Vec<R2SCampaign::Participation>,
    pub by_campaign: HashMap<U256, Vec<U256>>,
    pub by_user: HashMap<Address, Vec<U256>>,
    pub by_merchant: HashMap<Address, Vec<U256>>,
}

/// Both contracts plus the collector that receives fees and penalties
#[derive(Debug, Clone)]
pub(crate) struct Contracts {
    pub addresses: ContractAddresses,
    pub fee_collector: Address,
    pub token: TokenState,
    pub campaign: CampaignState,
}

/// Execution context shared by every call in one transaction
struct Frame {
    sender: Address,
    now: u64,
    logs: Vec<LogData>,
    emitters: Vec<Address>,
}

impl Frame {
    fn emit<E: SolEvent>(&mut self, emitter: Address, event: &E) {
        self.logs.push(event.encode_log_data());
        self.emitters.push(emitter);
    }
}

impl Contracts {
    pub fn new(addresses: ContractAddresses, owner: Address) -> Self {
        Self {
            addresses,
            fee_collector: owner,
            token: TokenState {
                owner,
                total_supply: U256::ZERO,
                balances: HashMap::new(),
                allowances: HashMap::new(),
            },
            campaign: CampaignState::default(),
        }
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.token.balances.get(&account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Credit `to` out of thin air, as `mint` would.
    pub fn mint_unchecked(&mut self, to: Address, amount: U256) {
        *self.token.balances.entry(to).or_default() += amount;
        self.token.total_supply += amount;
    }

    pub fn set_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        self.token.allowances.insert((owner, spender), amount);
    }

    /// Execute `input` sent by `sender` to `to` at time `now`.
    ///
    /// State is only modified when the call succeeds.
    pub fn execute(
        &mut self,
        sender: Address,
        to: Address,
        input: &[u8],
        now: u64,
    ) -> ExecResult<Execution> {
        let mut scratch = self.clone();
        let mut frame = Frame {
            sender,
            now,
            logs: Vec::new(),
            emitters: Vec::new(),
        };

        let output = if to == self.addresses.token {
            let call = MockUSDTCalls::abi_decode(input)
                .map_err(|_| RevertReason::message("unknown MockUSDT selector"))?;
            scratch.token_call(&mut frame, call)?
        } else if to == self.addresses.campaign {
            let call = R2SCampaignCalls::abi_decode(input)
                .map_err(|_| RevertReason::message("unknown R2SCampaign selector"))?;
            scratch.campaign_call(&mut frame, call)?
        } else {
            // Plain transfer to an account
            Bytes::new()
        };

        *self = scratch;
        Ok(Execution {
            output,
            logs: frame.logs,
            emitters: frame.emitters,
        })
    }

    // -------------------------------------------------------------------------
    // MockUSDT
    // -------------------------------------------------------------------------

    fn token_call(&mut self, frame: &mut Frame, call: MockUSDTCalls) -> ExecResult<Bytes> {
        let sender = frame.sender;
        let encoded = match call {
            MockUSDTCalls::name(_) => "Mock USDT".to_string().abi_encode(),
            MockUSDTCalls::symbol(_) => "USDT".to_string().abi_encode(),
            MockUSDTCalls::decimals(_) => U256::from(TOKEN_DECIMALS).abi_encode(),
            MockUSDTCalls::totalSupply(_) => self.token.total_supply.abi_encode(),
            MockUSDTCalls::owner(_) => self.token.owner.abi_encode(),
            MockUSDTCalls::balanceOf(c) => self.balance(c.account).abi_encode(),
            MockUSDTCalls::allowance(c) => self.allowance(c.owner, c.spender).abi_encode(),
            MockUSDTCalls::transfer(c) => {
                self.move_tokens(frame, sender, c.to, c.value)?;
                true.abi_encode()
            }
            MockUSDTCalls::approve(c) => {
                if c.spender == Address::ZERO {
                    return custom(MockUSDT::ERC20InvalidSpender { spender: c.spender });
                }
                self.set_allowance(sender, c.spender, c.value);
                frame.emit(
                    self.addresses.token,
                    &MockUSDT::Approval {
                        owner: sender,
                        spender: c.spender,
                        value: c.value,
                    },
                );
                true.abi_encode()
            }
            MockUSDTCalls::transferFrom(c) => {
                self.spend_allowance(c.from, sender, c.value)?;
                self.move_tokens(frame, c.from, c.to, c.value)?;
                true.abi_encode()
            }
            MockUSDTCalls::mint(c) => {
                self.only_owner(sender)?;
                self.mint(frame, c.to, c.amount)?;
                Vec::new()
            }
            MockUSDTCalls::batchMint(c) => {
                self.only_owner(sender)?;
                if c.recipients.len() != c.amounts.len() {
                    return revert("Arrays length mismatch");
                }
                for (to, amount) in c.recipients.into_iter().zip(c.amounts) {
                    self.mint(frame, to, amount)?;
                }
                Vec::new()
            }
            MockUSDTCalls::burn(c) => {
                self.burn(frame, sender, c.value)?;
                Vec::new()
            }
            MockUSDTCalls::burnFrom(c) => {
                self.spend_allowance(c.account, sender, c.value)?;
                self.burn(frame, c.account, c.value)?;
                Vec::new()
            }
        };
        Ok(Bytes::from(encoded))
    }

    fn only_owner(&self, sender: Address) -> ExecResult<()> {
        if sender != self.token.owner {
            return custom(MockUSDT::OwnableUnauthorizedAccount { account: sender });
        }
        Ok(())
    }

    fn spend_allowance(&mut self, owner: Address, spender: Address, value: U256) -> ExecResult<()> {
        let allowance = self.allowance(owner, spender);
        if allowance == U256::MAX {
            return Ok(());
        }
        if allowance < value {
            return custom(MockUSDT::ERC20InsufficientAllowance {
                spender,
                allowance,
                needed: value,
            });
        }
        self.set_allowance(owner, spender, allowance - value);
        Ok(())
    }

    fn move_tokens(
        &mut self,
        frame: &mut Frame,
        from: Address,
        to: Address,
        value: U256,
    ) -> ExecResult<()> {
        if to == Address::ZERO {
            return custom(MockUSDT::ERC20InvalidReceiver { receiver: to });
        }
        let balance = self.balance(from);
        if balance < value {
            return custom(MockUSDT::ERC20InsufficientBalance {
                sender: from,
                balance,
                needed: value,
            });
        }
        self.token.balances.insert(from, balance - value);
        *self.token.balances.entry(to).or_default() += value;
        frame.emit(
            self.addresses.token,
            &MockUSDT::Transfer {
                from,
                to,
                value,
            },
        );
        Ok(())
    }

    fn mint(&mut self, frame: &mut Frame, to: Address, amount: U256) -> ExecResult<()> {
        if to == Address::ZERO {
            return custom(MockUSDT::ERC20InvalidReceiver { receiver: to });
        }
        self.mint_unchecked(to, amount);
        frame.emit(
            self.addresses.token,
            &MockUSDT::Transfer {
                from: Address::ZERO,
                to,
                value: amount,
            },
        );
        Ok(())
    }

    fn burn(&mut self, frame: &mut Frame, from: Address, value: U256) -> ExecResult<()> {
        let balance = self.balance(from);
        if balance < value {
            return custom(MockUSDT::ERC20InsufficientBalance {
                sender: from,
                balance,
                needed: value,
            });
        }
        self.token.balances.insert(from, balance - value);
        self.token.total_supply -= value;
        frame.emit(
            self.addresses.token,
            &MockUSDT::Transfer {
                from,
                to: Address::ZERO,
                value,
            },
        );
        Ok(())
    }

    // -------------------------------------------------------------------------
    // R2SCampaign
    // -------------------------------------------------------------------------

    fn campaign_call(&mut self, frame: &mut Frame, call: R2SCampaignCalls) -> ExecResult<Bytes> {
        let encoded = match call {
            R2SCampaignCalls::createCampaign(c) => self.create_campaign(frame, c)?.abi_encode(),
            R2SCampaignCalls::participate(c) => {
                self.participate(frame, c._campaignId, c._amount)?;
                Vec::new()
            }
            R2SCampaignCalls::settleCampaign(c) => {
                self.settle(frame, c._campaignId)?;
                Vec::new()
            }
            R2SCampaignCalls::refund(c) => {
                self.refund(frame, c._participationId)?;
                Vec::new()
            }
            R2SCampaignCalls::getCampaign(c) => {
                // Unknown ids read as the zero struct, like a Solidity mapping
                let campaign = self
                    .campaign_at(c._campaignId)
                    .cloned()
                    .unwrap_or_else(empty_campaign);
                campaign.abi_encode()
            }
            R2SCampaignCalls::getParticipation(c) => match self.participation_at(c._participationId) {
                Some(p) => p.clone().abi_encode(),
                None => return revert("Participation not found"),
            },
            R2SCampaignCalls::getCampaignParticipations(c) => self
                .campaign
                .by_campaign
                .get(&c._campaignId)
                .cloned()
                .unwrap_or_default()
                .abi_encode(),
            R2SCampaignCalls::getUserParticipations(c) => self
                .campaign
                .by_user
                .get(&c._user)
                .cloned()
                .unwrap_or_default()
                .abi_encode(),
            R2SCampaignCalls::getMerchantCampaigns(c) => self
                .campaign
                .by_merchant
                .get(&c._merchant)
                .cloned()
                .unwrap_or_default()
                .abi_encode(),
            R2SCampaignCalls::getCampaignStats(c) => {
                let Some(campaign) = self.campaign_at(c._campaignId) else {
                    return revert("Campaign not found");
                };
                let participants = campaign.totalParticipants;
                let average = if participants.is_zero() {
                    U256::ZERO
                } else {
                    campaign.currentAmount / participants
                };
                let completion = if campaign.targetAmount.is_zero() {
                    U256::ZERO
                } else {
                    campaign.currentAmount * U256::from(10_000u64) / campaign.targetAmount
                };
                (participants, campaign.currentAmount, average, completion).abi_encode_params()
            }
            R2SCampaignCalls::isCampaignActive(c) => self
                .campaign_at(c._campaignId)
                .map(|campaign| accepts_deposits(campaign, frame.now))
                .unwrap_or(false)
                .abi_encode(),
            R2SCampaignCalls::nextCampaignId(_) => {
                U256::from(self.campaign.campaigns.len()).abi_encode()
            }
            R2SCampaignCalls::earlyWithdrawPenalty(_) => {
                U256::from(EARLY_WITHDRAW_PENALTY_BPS).abi_encode()
            }
            R2SCampaignCalls::platformFee(_) => U256::from(PLATFORM_FEE_BPS).abi_encode(),
            R2SCampaignCalls::merchantFee(_) => U256::from(MERCHANT_FEE_BPS).abi_encode(),
        };
        Ok(Bytes::from(encoded))
    }

    fn campaign_at(&self, id: U256) -> Option<&R2SCampaign::Campaign> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.campaign.campaigns.get(index))
    }

    fn campaign_mut(&mut self, id: U256) -> ExecResult<&mut R2SCampaign::Campaign> {
        match usize::try_from(id)
            .ok()
            .and_then(|index| self.campaign.campaigns.get_mut(index))
        {
            Some(campaign) => Ok(campaign),
            None => revert("Campaign not found"),
        }
    }

    fn participation_at(&self, id: U256) -> Option<&R2SCampaign::Participation> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.campaign.participations.get(index))
    }

    fn create_campaign(
        &mut self,
        frame: &mut Frame,
        c: R2SCampaign::createCampaignCall,
    ) -> ExecResult<U256> {
        if c._token != self.addresses.token {
            return revert("Token not whitelisted");
        }
        if c._minDeposit > c._maxDeposit {
            return revert("Invalid deposit limits");
        }
        if c._discountRate > U256::from(MAX_DISCOUNT_BPS) {
            return revert("Discount rate too high");
        }
        if c._targetAmount.is_zero() {
            return revert("Invalid target amount");
        }
        if c._duration.is_zero() {
            return revert("Invalid duration");
        }

        let start = U256::from(frame.now + START_DELAY);
        let end = start.saturating_add(c._duration);
        let settlement = end.saturating_add(c._settlementPeriod);
        let id = U256::from(self.campaign.campaigns.len());

        frame.emit(
            self.addresses.campaign,
            &R2SCampaign::CampaignCreated {
                campaignId: id,
                merchant: frame.sender,
                title: c._title.clone(),
                targetAmount: c._targetAmount,
                discountRate: c._discountRate,
                startTime: start,
                endTime: end,
            },
        );

        self.campaign.campaigns.push(R2SCampaign::Campaign {
            id,
            title: c._title,
            description: c._description,
            imageUrl: c._imageUrl,
            merchant: frame.sender,
            token: c._token,
            targetAmount: c._targetAmount,
            currentAmount: U256::ZERO,
            minDeposit: c._minDeposit,
            maxDeposit: c._maxDeposit,
            discountRate: c._discountRate,
            startTime: start,
            endTime: end,
            settlementDate: settlement,
            totalParticipants: U256::ZERO,
            totalSettled: U256::ZERO,
            status: STATUS_PENDING,
            isVerified: false,
        });
        self.campaign
            .by_merchant
            .entry(frame.sender)
            .or_default()
            .push(id);
        Ok(id)
    }

    fn participate(&mut self, frame: &mut Frame, id: U256, amount: U256) -> ExecResult<()> {
        let campaign = self.campaign_mut(id)?.clone();
        if !accepts_deposits(&campaign, frame.now) {
            return revert("Campaign not active");
        }
        if amount < campaign.minDeposit {
            return revert("Below minimum deposit");
        }
        if amount > campaign.maxDeposit {
            return revert("Above maximum deposit");
        }

        let vault = self.addresses.campaign;
        self.spend_allowance(frame.sender, vault, amount)?;
        self.move_tokens(frame, frame.sender, vault, amount)?;

        let first_time = !self
            .campaign
            .by_user
            .get(&frame.sender)
            .map(|ids| {
                ids.iter().any(|pid| {
                    self.participation_at(*pid)
                        .map(|p| p.campaignId == id)
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);

        let expected = campaign.discountRate.saturating_mul(amount) / U256::from(10_000u64);
        let pid = U256::from(self.campaign.participations.len());
        self.campaign.participations.push(R2SCampaign::Participation {
            participant: frame.sender,
            campaignId: id,
            depositAmount: amount,
            depositTime: U256::from(frame.now),
            expectedDiscount: expected,
            actualDiscount: U256::ZERO,
            settlementAmount: U256::ZERO,
            isSettled: false,
            isRefunded: false,
            status: 0,
        });
        self.campaign.by_campaign.entry(id).or_default().push(pid);
        self.campaign.by_user.entry(frame.sender).or_default().push(pid);

        let stored = self.campaign_mut(id)?;
        stored.currentAmount += amount;
        if first_time {
            stored.totalParticipants += U256::from(1u64);
        }
        stored.status = STATUS_ACTIVE;

        frame.emit(
            self.addresses.campaign,
            &R2SCampaign::ParticipationCreated {
                participationId: pid,
                campaignId: id,
                participant: frame.sender,
                amount,
                expectedDiscount: expected,
            },
        );
        Ok(())
    }

    fn settle(&mut self, frame: &mut Frame, id: U256) -> ExecResult<()> {
        let campaign = self.campaign_mut(id)?.clone();
        if campaign.status == STATUS_SETTLED {
            return revert("Campaign already settled");
        }
        if campaign.status == STATUS_CANCELLED {
            return revert("Campaign cancelled");
        }
        if frame.sender != campaign.merchant && frame.sender != self.token.owner {
            return revert("Not authorized");
        }
        let now = U256::from(frame.now);
        if now < campaign.endTime {
            return revert("Campaign not ended");
        }
        if now < campaign.settlementDate {
            return revert("Settlement period not reached");
        }

        let vault = self.addresses.campaign;
        let pids = self.campaign.by_campaign.get(&id).cloned().unwrap_or_default();
        let mut total_deposits = U256::ZERO;
        let mut total_discounts = U256::ZERO;

        for pid in pids {
            let Some(p) = self.participation_at(pid).cloned() else {
                continue;
            };
            if p.isSettled || p.isRefunded {
                continue;
            }
            let discount = p.expectedDiscount;
            self.move_tokens(frame, vault, p.participant, discount)?;
            total_deposits += p.depositAmount;
            total_discounts += discount;

            if let Some(stored) = usize::try_from(pid)
                .ok()
                .and_then(|index| self.campaign.participations.get_mut(index))
            {
                stored.isSettled = true;
                stored.actualDiscount = discount;
                stored.settlementAmount = p.depositAmount - discount;
            }
            frame.emit(
                vault,
                &R2SCampaign::ParticipationSettled {
                    participationId: pid,
                    campaignId: id,
                    participant: p.participant,
                    settlementAmount: p.depositAmount - discount,
                    discount,
                },
            );
        }

        let platform_fee = bps(total_deposits, PLATFORM_FEE_BPS);
        let merchant_fee = bps(total_deposits, MERCHANT_FEE_BPS);
        let fees = platform_fee + merchant_fee;
        let payout = total_deposits
            .saturating_sub(total_discounts)
            .saturating_sub(fees);
        if !fees.is_zero() {
            self.move_tokens(frame, vault, self.fee_collector, fees)?;
        }
        if !payout.is_zero() {
            self.move_tokens(frame, vault, campaign.merchant, payout)?;
        }

        let stored = self.campaign_mut(id)?;
        stored.totalSettled = total_deposits;
        stored.status = STATUS_SETTLED;

        frame.emit(
            vault,
            &R2SCampaign::FeeCollected {
                campaignId: id,
                platformFee: platform_fee,
                merchantFee: merchant_fee,
            },
        );
        frame.emit(
            vault,
            &R2SCampaign::CampaignUpdated {
                campaignId: id,
                status: STATUS_SETTLED,
            },
        );
        Ok(())
    }

    fn refund(&mut self, frame: &mut Frame, pid: U256) -> ExecResult<()> {
        let Some(p) = self.participation_at(pid).cloned() else {
            return revert("Participation not found");
        };
        if p.participant != frame.sender {
            return revert("Not participant");
        }
        if p.isRefunded {
            return revert("Already refunded");
        }
        if p.isSettled {
            return revert("Already settled");
        }

        let penalty = bps(p.depositAmount, EARLY_WITHDRAW_PENALTY_BPS);
        let refund = p.depositAmount - penalty;
        let vault = self.addresses.campaign;
        self.move_tokens(frame, vault, p.participant, refund)?;
        if !penalty.is_zero() {
            self.move_tokens(frame, vault, self.fee_collector, penalty)?;
        }

        if let Some(stored) = usize::try_from(pid)
            .ok()
            .and_then(|index| self.campaign.participations.get_mut(index))
        {
            stored.isRefunded = true;
        }

        frame.emit(
            vault,
            &R2SCampaign::RefundProcessed {
                participationId: pid,
                campaignId: p.campaignId,
                participant: p.participant,
                amount: refund,
            },
        );
        Ok(())
    }
}

fn empty_campaign() -> R2SCampaign::Campaign {
    R2SCampaign::Campaign {
        id: U256::ZERO,
        title: String::new(),
        description: String::new(),
        imageUrl: String::new(),
        merchant: Address::ZERO,
        token: Address::ZERO,
        targetAmount: U256::ZERO,
        currentAmount: U256::ZERO,
        minDeposit: U256::ZERO,
        maxDeposit: U256::ZERO,
        discountRate: U256::ZERO,
        startTime: U256::ZERO,
        endTime: U256::ZERO,
        settlementDate: U256::ZERO,
        totalParticipants: U256::ZERO,
        totalSettled: U256::ZERO,
        status: 0,
        isVerified: false,
    }
}

fn accepts_deposits(campaign: &R2SCampaign::Campaign, now: u64) -> bool {
    let now = U256::from(now);
    (campaign.status == STATUS_PENDING || campaign.status == STATUS_ACTIVE)
        && campaign.startTime <= now
        && now < campaign.endTime
}
