//! R2SCampaign operations
//!
//! Every state-changing operation re-reads the campaign, runs the lifecycle
//! check from `lib_campaign` against the client's clock (chain time unless
//! configured otherwise), and only then
//! encodes and submits. Nothing about a campaign is cached between calls.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use lib_campaign::{
    validate_create, validate_participation, validate_refund, validate_settlement, Campaign,
    CampaignStats, CampaignStatus, CreateCampaignParams, OnChainStatus, Participation,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::abi::R2SCampaign;
use crate::clock::Clock;
use crate::contract::ContractHandle;
use crate::error::{Result, SdkError};
use crate::events::{self, EventRecord, EventStream};
use crate::pending::PendingTx;
use crate::rpc::Receipt;
use crate::sender::TransactionSender;
use crate::token::TokenReader;

/// Contract-wide fee settings, in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub platform_fee: u64,
    pub merchant_fee: u64,
    pub early_withdraw_penalty: u64,
}

fn to_u64(field: &str, value: U256) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| SdkError::Decode(format!("{} {} does not fit in u64", field, value)))
}

fn campaign_from_abi(raw: R2SCampaign::Campaign) -> Result<Campaign> {
    let onchain_status = OnChainStatus::try_from(raw.status)
        .map_err(|e| SdkError::Decode(format!("campaign {}: {}", raw.id, e)))?;

    Ok(Campaign {
        id: raw.id,
        title: raw.title,
        description: raw.description,
        image_url: raw.imageUrl,
        merchant: raw.merchant,
        token: raw.token,
        target_amount: raw.targetAmount,
        current_amount: raw.currentAmount,
        min_deposit: raw.minDeposit,
        max_deposit: raw.maxDeposit,
        discount_rate: to_u64("discountRate", raw.discountRate)?,
        start_time: to_u64("startTime", raw.startTime)?,
        end_time: to_u64("endTime", raw.endTime)?,
        settlement_date: to_u64("settlementDate", raw.settlementDate)?,
        total_participants: to_u64("totalParticipants", raw.totalParticipants)?,
        total_settled: raw.totalSettled,
        onchain_status,
        is_verified: raw.isVerified,
    })
}

fn participation_from_abi(id: U256, raw: R2SCampaign::Participation) -> Result<Participation> {
    Ok(Participation {
        id,
        participant: raw.participant,
        campaign_id: raw.campaignId,
        deposit_amount: raw.depositAmount,
        deposit_time: to_u64("depositTime", raw.depositTime)?,
        expected_discount: raw.expectedDiscount,
        actual_discount: raw.actualDiscount,
        settlement_amount: raw.settlementAmount,
        is_settled: raw.isSettled,
        is_refunded: raw.isRefunded,
        status: raw.status,
    })
}

/// Id of the campaign created in `receipt`, from its `CampaignCreated` log.
pub fn created_campaign_id(receipt: &Receipt, campaign: &ContractHandle) -> Option<U256> {
    campaign
        .decode_events::<R2SCampaign::CampaignCreated>(&receipt.logs)
        .first()
        .map(|event| event.campaignId)
}

/// Read access to the campaign contract
#[derive(Debug, Clone)]
pub struct CampaignReader {
    handle: ContractHandle,
    clock: Arc<dyn Clock>,
}

impl CampaignReader {
    pub fn new(handle: ContractHandle, clock: Arc<dyn Clock>) -> Self {
        Self { handle, clock }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    pub fn handle(&self) -> &ContractHandle {
        &self.handle
    }

    /// Current time as the contract sees it
    pub async fn now(&self) -> Result<u64> {
        self.clock.now().await
    }

    /// Fresh read of one campaign.
    ///
    /// An id the contract never assigned is `NotFound`, whether the contract
    /// reverts or returns an empty struct.
    pub async fn get_campaign(&self, id: U256) -> Result<Campaign> {
        let not_found = || SdkError::NotFound {
            entity: "campaign",
            id: id.to_string(),
        };

        let raw = match self
            .handle
            .read(R2SCampaign::getCampaignCall { _campaignId: id })
            .await
        {
            Ok(raw) => raw,
            Err(SdkError::ContractRevert { .. }) => return Err(not_found()),
            Err(other) => return Err(other),
        };

        if raw.merchant == Address::ZERO {
            return Err(not_found());
        }
        campaign_from_abi(raw)
    }

    /// Lifecycle state of `id` right now
    pub async fn campaign_status(&self, id: U256) -> Result<CampaignStatus> {
        let campaign = self.get_campaign(id).await?;
        Ok(campaign.status_at(self.now().await?))
    }

    pub async fn get_participation(&self, id: U256) -> Result<Participation> {
        let not_found = || SdkError::NotFound {
            entity: "participation",
            id: id.to_string(),
        };

        let raw = match self
            .handle
            .read(R2SCampaign::getParticipationCall {
                _participationId: id,
            })
            .await
        {
            Ok(raw) => raw,
            Err(SdkError::ContractRevert { .. }) => return Err(not_found()),
            Err(other) => return Err(other),
        };

        if raw.participant == Address::ZERO {
            return Err(not_found());
        }
        participation_from_abi(id, raw)
    }

    pub async fn campaign_participations(&self, id: U256) -> Result<Vec<U256>> {
        self.handle
            .read(R2SCampaign::getCampaignParticipationsCall { _campaignId: id })
            .await
    }

    pub async fn user_participations(&self, user: Address) -> Result<Vec<U256>> {
        self.handle
            .read(R2SCampaign::getUserParticipationsCall { _user: user })
            .await
    }

    pub async fn merchant_campaigns(&self, merchant: Address) -> Result<Vec<U256>> {
        self.handle
            .read(R2SCampaign::getMerchantCampaignsCall {
                _merchant: merchant,
            })
            .await
    }

    pub async fn campaign_stats(&self, id: U256) -> Result<CampaignStats> {
        let stats = self
            .handle
            .read(R2SCampaign::getCampaignStatsCall { _campaignId: id })
            .await?;
        Ok(CampaignStats {
            total_participants: stats.totalParticipants,
            total_deposited: stats.totalDeposited,
            average_deposit: stats.averageDeposit,
            completion_rate: stats.completionRate,
        })
    }

    /// Id the next created campaign will receive
    pub async fn next_campaign_id(&self) -> Result<U256> {
        self.handle
            .read(R2SCampaign::nextCampaignIdCall {})
            .await
    }

    /// The contract's own view of whether `id` accepts deposits
    pub async fn is_campaign_active(&self, id: U256) -> Result<bool> {
        self.handle
            .read(R2SCampaign::isCampaignActiveCall { _campaignId: id })
            .await
    }

    pub async fn fees(&self) -> Result<FeeSchedule> {
        let (platform_fee, merchant_fee, penalty) = tokio::try_join!(
            self.handle.read(R2SCampaign::platformFeeCall {}),
            self.handle.read(R2SCampaign::merchantFeeCall {}),
            self.handle.read(R2SCampaign::earlyWithdrawPenaltyCall {}),
        )?;
        Ok(FeeSchedule {
            platform_fee: to_u64("platformFee", platform_fee)?,
            merchant_fee: to_u64("merchantFee", merchant_fee)?,
            early_withdraw_penalty: to_u64("earlyWithdrawPenalty", penalty)?,
        })
    }

    /// Every campaign event from `from_block` to the chain head
    pub async fn campaign_events(&self, from_block: u64) -> Result<Vec<EventRecord>> {
        events::fetch_events(&self.handle, from_block, None).await
    }

    /// Stream campaign events from `from_block` onwards, polling every
    /// `poll_interval`.
    pub fn watch_campaign_events(&self, from_block: u64, poll_interval: Duration) -> EventStream {
        events::watch_events(self.handle.clone(), from_block, poll_interval)
    }
}

/// Campaign operations that need a signer
#[derive(Debug, Clone)]
pub struct CampaignWriter {
    reader: CampaignReader,
    token: TokenReader,
    sender: TransactionSender,
}

impl CampaignWriter {
    /// `token` is the configured deposit token, used when creation
    /// parameters leave the token unset.
    pub fn new(reader: CampaignReader, token: TokenReader, sender: TransactionSender) -> Self {
        Self {
            reader,
            token,
            sender,
        }
    }

    pub fn reader(&self) -> &CampaignReader {
        &self.reader
    }

    /// Token reader for the campaign's deposit token
    fn deposit_token(&self, campaign: &Campaign) -> TokenReader {
        if campaign.token == self.token.address() {
            self.token.clone()
        } else {
            TokenReader::new(self.token.handle().at(campaign.token))
        }
    }

    /// Validate and submit `createCampaign`, without waiting for it.
    pub async fn submit_campaign(&self, params: CreateCampaignParams) -> Result<PendingTx> {
        validate_create(&params)?;

        let token = params.token.unwrap_or_else(|| self.token.address());
        let call = self.reader.handle.prepare(&R2SCampaign::createCampaignCall {
            _title: params.title,
            _description: params.description,
            _imageUrl: params.image_url,
            _token: token,
            _targetAmount: params.target_amount,
            _minDeposit: params.min_deposit,
            _maxDeposit: params.max_deposit,
            _discountRate: U256::from(params.discount_rate),
            _duration: U256::from(params.duration),
            _settlementPeriod: U256::from(params.settlement_period),
        })?;
        self.sender.submit(call).await
    }

    /// Create a campaign and wait for its id.
    ///
    /// The id is read from the `CampaignCreated` event in the receipt, never
    /// predicted.
    pub async fn create_campaign(&self, params: CreateCampaignParams) -> Result<U256> {
        let pending = self.submit_campaign(params).await?;
        let id = self.created_campaign_id(&pending).await?;
        info!("Created campaign {} in {}", id, pending.tx_hash());
        Ok(id)
    }

    /// Confirm a pending `createCampaign` and extract the new campaign id.
    pub async fn created_campaign_id(&self, pending: &PendingTx) -> Result<U256> {
        let receipt = pending.confirm().await?;
        created_campaign_id(&receipt, &self.reader.handle).ok_or_else(|| {
            SdkError::Decode(format!(
                "receipt of {} has no CampaignCreated event",
                pending.tx_hash()
            ))
        })
    }

    /// Check everything `participate` depends on; returns the campaign.
    async fn check_participation(&self, id: U256, amount: U256) -> Result<Campaign> {
        let campaign = self.reader.get_campaign(id).await?;
        let now = self.reader.now().await?;
        validate_participation(&campaign, amount, now)?;
        Ok(campaign)
    }

    /// Deposit `amount` into campaign `id`.
    ///
    /// The signer must already hold `amount` and have approved the campaign
    /// contract for it; both are checked before submission.
    pub async fn participate(&self, id: U256, amount: U256) -> Result<PendingTx> {
        let campaign = self.check_participation(id, amount).await?;
        self.deposit_token(&campaign)
            .check_funding(self.sender.account(), self.reader.address(), amount)
            .await?;

        let call = self.reader.handle.prepare(&R2SCampaign::participateCall {
            _campaignId: id,
            _amount: amount,
        })?;
        self.sender.submit(call).await
    }

    /// Like [`Self::participate`], first approving the campaign contract for
    /// `amount` and waiting for that approval when the allowance is short.
    pub async fn participate_with_approval(&self, id: U256, amount: U256) -> Result<PendingTx> {
        let campaign = self.check_participation(id, amount).await?;
        let token = self.deposit_token(&campaign);
        let account = self.sender.account();
        let spender = self.reader.address();

        let allowance = token.allowance(account, spender).await?;
        if allowance < amount {
            let approve = token.handle().prepare(&crate::abi::MockUSDT::approveCall {
                spender,
                value: amount,
            })?;
            let pending = self.sender.submit(approve).await?;
            pending.confirm().await?;
        }

        self.participate(id, amount).await
    }

    /// Settle campaign `id`.
    ///
    /// A campaign that is already settled fails locally, so a repeated call
    /// never reaches the network.
    pub async fn settle_campaign(&self, id: U256) -> Result<PendingTx> {
        let campaign = self.reader.get_campaign(id).await?;
        let now = self.reader.now().await?;
        validate_settlement(&campaign, now)?;

        let call = self
            .reader
            .handle
            .prepare(&R2SCampaign::settleCampaignCall { _campaignId: id })?;
        self.sender.submit(call).await
    }

    /// Withdraw an open participation, minus the early-withdraw penalty.
    pub async fn refund(&self, participation_id: U256) -> Result<PendingTx> {
        let participation = self.reader.get_participation(participation_id).await?;
        validate_refund(&participation)?;

        let call = self.reader.handle.prepare(&R2SCampaign::refundCall {
            _participationId: participation_id,
        })?;
        self.sender.submit(call).await
    }
}
