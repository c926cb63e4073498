//! Typed bindings for the two R2S contracts.
//!
//! The `sol!` interfaces provide call/return/event/error types and their
//! ABI encoding. Only the methods the SDK calls are declared; the method
//! table in [`super::tables`] lists the same signatures for runtime lookup.

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface MockUSDT {
        error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
        error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
        error ERC20InvalidApprover(address approver);
        error ERC20InvalidReceiver(address receiver);
        error ERC20InvalidSender(address sender);
        error ERC20InvalidSpender(address spender);
        error OwnableInvalidOwner(address owner);
        error OwnableUnauthorizedAccount(address account);

        event Approval(address indexed owner, address indexed spender, uint256 value);
        event Transfer(address indexed from, address indexed to, uint256 value);

        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external pure returns (uint8);
        function totalSupply() external view returns (uint256);
        function owner() external view returns (address);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);

        function transfer(address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
        function mint(address to, uint256 amount) external;
        function batchMint(address[] calldata recipients, uint256[] calldata amounts) external;
        function burn(uint256 value) external;
        function burnFrom(address account, uint256 value) external;
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface R2SCampaign {
        struct Campaign {
            uint256 id;
            string title;
            string description;
            string imageUrl;
            address merchant;
            address token;
            uint256 targetAmount;
            uint256 currentAmount;
            uint256 minDeposit;
            uint256 maxDeposit;
            uint256 discountRate;
            uint256 startTime;
            uint256 endTime;
            uint256 settlementDate;
            uint256 totalParticipants;
            uint256 totalSettled;
            uint8 status;
            bool isVerified;
        }

        struct Participation {
            address participant;
            uint256 campaignId;
            uint256 depositAmount;
            uint256 depositTime;
            uint256 expectedDiscount;
            uint256 actualDiscount;
            uint256 settlementAmount;
            bool isSettled;
            bool isRefunded;
            uint8 status;
        }

        error AccessControlUnauthorizedAccount(address account, bytes32 neededRole);
        error EnforcedPause();
        error ExpectedPause();
        error FailedCall();
        error ReentrancyGuardReentrantCall();
        error SafeERC20FailedOperation(address token);

        event CampaignCreated(uint256 indexed campaignId, address indexed merchant, string title, uint256 targetAmount, uint256 discountRate, uint256 startTime, uint256 endTime);
        event CampaignUpdated(uint256 indexed campaignId, uint8 status);
        event FeeCollected(uint256 indexed campaignId, uint256 platformFee, uint256 merchantFee);
        event ParticipationCreated(uint256 indexed participationId, uint256 indexed campaignId, address indexed participant, uint256 amount, uint256 expectedDiscount);
        event ParticipationSettled(uint256 indexed participationId, uint256 indexed campaignId, address indexed participant, uint256 settlementAmount, uint256 discount);
        event RefundProcessed(uint256 indexed participationId, uint256 indexed campaignId, address indexed participant, uint256 amount);

        function createCampaign(string calldata _title, string calldata _description, string calldata _imageUrl, address _token, uint256 _targetAmount, uint256 _minDeposit, uint256 _maxDeposit, uint256 _discountRate, uint256 _duration, uint256 _settlementPeriod) external returns (uint256);
        function participate(uint256 _campaignId, uint256 _amount) external;
        function settleCampaign(uint256 _campaignId) external;
        function refund(uint256 _participationId) external;

        function getCampaign(uint256 _campaignId) external view returns (Campaign memory);
        function getParticipation(uint256 _participationId) external view returns (Participation memory);
        function getCampaignParticipations(uint256 _campaignId) external view returns (uint256[] memory);
        function getUserParticipations(address _user) external view returns (uint256[] memory);
        function getMerchantCampaigns(address _merchant) external view returns (uint256[] memory);
        function getCampaignStats(uint256 _campaignId) external view returns (uint256 totalParticipants, uint256 totalDeposited, uint256 averageDeposit, uint256 completionRate);
        function isCampaignActive(uint256 _campaignId) external view returns (bool);
        function nextCampaignId() external view returns (uint256);
        function earlyWithdrawPenalty() external view returns (uint256);
        function platformFee() external view returns (uint256);
        function merchantFee() external view returns (uint256);
    }
}
