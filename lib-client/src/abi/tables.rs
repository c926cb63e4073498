//! Human-readable ABI tables for the deployed contracts.
//!
//! Every call bound in [`super::bindings`] has a line here with the same
//! canonical signature. Struct returns are written as tuples.

use super::registry::AbiError;
use super::schema::ContractAbi;

pub const MOCK_USDT: &str = "MockUSDT";
pub const R2S_CAMPAIGN: &str = "R2SCampaign";

const MOCK_USDT_FUNCTIONS: &[&str] = &[
    "function name() view returns (string)",
    "function symbol() view returns (string)",
    "function decimals() pure returns (uint8)",
    "function totalSupply() view returns (uint256)",
    "function owner() view returns (address)",
    "function balanceOf(address account) view returns (uint256)",
    "function allowance(address owner, address spender) view returns (uint256)",
    "function transfer(address to, uint256 value) returns (bool)",
    "function approve(address spender, uint256 value) returns (bool)",
    "function transferFrom(address from, address to, uint256 value) returns (bool)",
    "function mint(address to, uint256 amount)",
    "function batchMint(address[] recipients, uint256[] amounts)",
    "function burn(uint256 value)",
    "function burnFrom(address account, uint256 value)",
];

const MOCK_USDT_EVENTS: &[&str] = &[
    "event Approval(address indexed owner, address indexed spender, uint256 value)",
    "event Transfer(address indexed from, address indexed to, uint256 value)",
];

const R2S_CAMPAIGN_FUNCTIONS: &[&str] = &[
    "function createCampaign(string _title, string _description, string _imageUrl, address _token, uint256 _targetAmount, uint256 _minDeposit, uint256 _maxDeposit, uint256 _discountRate, uint256 _duration, uint256 _settlementPeriod) returns (uint256)",
    "function participate(uint256 _campaignId, uint256 _amount)",
    "function settleCampaign(uint256 _campaignId)",
    "function refund(uint256 _participationId)",
    "function getCampaign(uint256 _campaignId) view returns ((uint256,string,string,string,address,address,uint256,uint256,uint256,uint256,uint256,uint256,uint256,uint256,uint256,uint256,uint8,bool))",
    "function getParticipation(uint256 _participationId) view returns ((address,uint256,uint256,uint256,uint256,uint256,uint256,bool,bool,uint8))",
    "function getCampaignParticipations(uint256 _campaignId) view returns (uint256[])",
    "function getUserParticipations(address _user) view returns (uint256[])",
    "function getMerchantCampaigns(address _merchant) view returns (uint256[])",
    "function getCampaignStats(uint256 _campaignId) view returns (uint256, uint256, uint256, uint256)",
    "function isCampaignActive(uint256 _campaignId) view returns (bool)",
    "function nextCampaignId() view returns (uint256)",
    "function earlyWithdrawPenalty() view returns (uint256)",
    "function platformFee() view returns (uint256)",
    "function merchantFee() view returns (uint256)",
];

const R2S_CAMPAIGN_EVENTS: &[&str] = &[
    "event CampaignCreated(uint256 indexed campaignId, address indexed merchant, string title, uint256 targetAmount, uint256 discountRate, uint256 startTime, uint256 endTime)",
    "event CampaignUpdated(uint256 indexed campaignId, uint8 status)",
    "event FeeCollected(uint256 indexed campaignId, uint256 platformFee, uint256 merchantFee)",
    "event ParticipationCreated(uint256 indexed participationId, uint256 indexed campaignId, address indexed participant, uint256 amount, uint256 expectedDiscount)",
    "event ParticipationSettled(uint256 indexed participationId, uint256 indexed campaignId, address indexed participant, uint256 settlementAmount, uint256 discount)",
    "event RefundProcessed(uint256 indexed participationId, uint256 indexed campaignId, address indexed participant, uint256 amount)",
];

pub fn mock_usdt_abi() -> Result<ContractAbi, AbiError> {
    ContractAbi::from_human_readable(MOCK_USDT, MOCK_USDT_FUNCTIONS, MOCK_USDT_EVENTS)
}

pub fn r2s_campaign_abi() -> Result<ContractAbi, AbiError> {
    ContractAbi::from_human_readable(R2S_CAMPAIGN, R2S_CAMPAIGN_FUNCTIONS, R2S_CAMPAIGN_EVENTS)
}
