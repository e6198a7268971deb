//! Bridge contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the L1/L2
//! bridge contract pair and the ERC-20 surface the orchestrator touches.
//! These signatures are wire-compatible with the deployed contracts and
//! must not drift.

use alloy::sol;

sol! {
    /// L1 side: lock on deposit, timelocked release on claim.
    #[sol(rpc)]
    contract BridgeL1 {
        /// Deposit the native asset; the amount is the attached value.
        function depositNative() external payable;

        /// Deposit any ERC-20, the designated bridged asset included.
        function depositErc20(address token, uint256 amount) external;

        /// Release a timelocked native withdrawal.
        ///
        /// `originTxHash` is the keccak256-derived reference of the
        /// origin-chain transaction hash string, not the raw hash.
        function releaseNative(
            uint256 withdrawId,
            address recipient,
            uint256 amount,
            bytes32 originTxHash
        ) external;

        /// Release a timelocked ERC-20 withdrawal.
        function releaseErc20(
            uint256 withdrawId,
            address recipient,
            address token,
            uint256 amount,
            bytes32 originTxHash
        ) external;

        /// Challenge-period duration in seconds.
        function timelockDuration() external view returns (uint256);

        /// Whether a withdrawal id has already been released.
        function processedWithdrawals(uint256 withdrawId) external view returns (bool);

        event NativeDeposited(uint256 indexed depositId, address indexed user, uint256 amount);

        event Erc20Deposited(
            uint256 indexed depositId,
            address indexed user,
            address indexed token,
            uint256 amount
        );

        event WithdrawalReleased(
            uint256 indexed withdrawId,
            address indexed recipient,
            address token,
            uint256 amount
        );
    }

    /// L2 side: burn on withdrawal, mint handled by the operator.
    #[sol(rpc)]
    contract BridgeL2 {
        /// Burn the native asset by payment; amount is both the argument
        /// and the attached value.
        function withdrawNative(uint256 amount) external payable;

        /// Burn the wrapped representation of the L1 native asset.
        function withdrawWrapped(uint256 amount) external;

        /// Burn any other bridged ERC-20.
        function withdrawErc20(address token, uint256 amount) external;

        /// Address of the wrapped-native ERC-20 this bridge manages.
        function wrappedNative() external view returns (address);

        event WithdrawalRequested(
            uint256 indexed withdrawId,
            address indexed user,
            address token,
            uint256 amount
        );
    }

    /// Minimal ERC-20 surface: balances, allowances, approval, metadata.
    #[sol(rpc)]
    contract ERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}
