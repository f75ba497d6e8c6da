//! Bridge contract ABI definitions
//!
//! Uses alloy's sol! macro to generate type-safe bindings for the parent and
//! child chain contracts of the token bridge: the inbox that mints retryable
//! tickets, the rollup and outbox that drive withdrawals, the gateway router
//! and its gateway variants, and the child-chain system contracts.

#![allow(clippy::too_many_arguments)]

use alloy::primitives::{address, Address};
use alloy::sol;

/// Retryable-ticket bookkeeping precompile on the child chain.
pub const RETRYABLE_TX_ADDRESS: Address = address!("000000000000000000000000000000000000006E");

/// Child-chain system contract that emits outgoing (child-to-parent) messages.
pub const CHILD_SYSTEM_ADDRESS: Address = address!("0000000000000000000000000000000000000064");

/// Estimation-only pseudo-contract on the child chain. Not deployed code;
/// the node intercepts calls to this address.
pub const NODE_INTERFACE_ADDRESS: Address = address!("00000000000000000000000000000000000000C8");

sol! {
    // ========================================================================
    // Parent chain: Inbox
    // ========================================================================

    /// Parent-chain inbox. Accepts prepaid cross-domain calls and assigns
    /// each one an auto-incrementing message number.
    #[sol(rpc)]
    contract Inbox {
        /// Create a prepaid retryable ticket targeting the child chain.
        /// The attached value must cover maxSubmissionCost plus the
        /// redemption gas budget (native-fee chains).
        function createRetryableTicket(
            address to,
            uint256 childCallValue,
            uint256 maxSubmissionCost,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            bytes calldata data
        ) external payable returns (uint256 messageNumber);

        /// Fund the child chain with the custom fee token (fee-token chains).
        function depositERC20(uint256 amount) external;

        /// The escrow bridge this inbox writes into.
        function bridge() external view returns (address);

        /// Emitted once per submitted ticket.
        event TicketCreated(
            bytes32 indexed ticketId,
            address indexed sender,
            address destination,
            uint256 messageNumber,
            uint256 childCallValue,
            uint256 maxSubmissionCost,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            uint256 depositValue,
            bytes data
        );
    }

    // ========================================================================
    // Child chain: retryable ticket precompile
    // ========================================================================

    /// Child-chain precompile tracking retryable tickets between creation
    /// and their terminal state.
    #[sol(rpc)]
    contract RetryableTx {
        /// Manually attempt redemption of a created ticket.
        function redeem(bytes32 ticketId) external returns (bytes32 retryTxHash);

        /// Retention window applied to new tickets, in child blocks.
        function getLifetime() external view returns (uint256);

        /// Expiry block for a ticket. Zero when the child chain has not
        /// (yet) materialized the ticket; records stay queryable after
        /// redemption and expiry.
        function ticketExpiry(bytes32 ticketId) external view returns (uint256);

        /// Address credited when the ticket expires unredeemed.
        function getBeneficiary(bytes32 ticketId) external view returns (address);

        /// Redemption succeeded; the ticket is terminal.
        event TicketRedeemed(bytes32 indexed ticketId, address indexed redeemer);

        /// A redemption attempt was scheduled (auto-redeem or manual).
        /// Attempts may fail and recur; only TicketRedeemed advances state.
        event RedeemScheduled(bytes32 indexed ticketId, bytes32 retryTxHash, uint64 sequenceNum);
    }

    // ========================================================================
    // Parent chain: rollup and outbox
    // ========================================================================

    /// Rollup assertion chain. Node lifecycle events gate withdrawal
    /// confirmation.
    #[sol(rpc)]
    contract Rollup {
        function latestConfirmed() external view returns (uint64);

        /// A new assertion covering child blocks up to childBlockEnd.
        event NodeCreated(
            uint64 indexed nodeNum,
            bytes32 indexed parentNodeHash,
            bytes32 nodeHash,
            uint256 childBlockEnd
        );

        /// The assertion survived its dispute window.
        event NodeConfirmed(uint64 indexed nodeNum, bytes32 blockHash, bytes32 sendRoot);
    }

    /// Parent-chain outbox. Executes confirmed child-to-parent messages
    /// exactly once.
    #[sol(rpc)]
    contract Outbox {
        function executeTransaction(
            uint256 position,
            address sender,
            address destination,
            uint256 childBlock,
            bytes calldata data
        ) external;

        /// Whether the message at this position has already been executed.
        function isSpent(uint256 position) external view returns (bool);

        event WithdrawalExecuted(
            address indexed destination,
            address indexed childSender,
            uint256 indexed position
        );
    }

    // ========================================================================
    // Child chain: outgoing message system contract
    // ========================================================================

    /// Child-chain system contract through which withdrawals leave the
    /// child chain.
    #[sol(rpc)]
    contract ChildSystem {
        function sendParentMessage(address destination, bytes calldata data)
            external
            payable
            returns (uint256 position);

        event ParentMessageSent(
            bytes32 indexed messageId,
            address indexed sender,
            address indexed destination,
            uint256 position,
            uint256 batchNumber,
            uint256 childBlock,
            bytes data
        );
    }

    // ========================================================================
    // Gateway router and gateways
    // ========================================================================

    /// Entry point resolving which gateway handles a given token and
    /// forwarding deposits to it.
    #[sol(rpc)]
    contract GatewayRouter {
        /// Registered gateway for a token; the zero address when the token
        /// has no custom registration.
        function getGateway(address token) external view returns (address);

        function defaultGateway() external view returns (address);

        /// Deterministic (salted create2) child-token address derivation.
        function calculateChildTokenAddress(address token) external view returns (address);

        function outboundTransfer(
            address token,
            address to,
            uint256 amount,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            bytes calldata data
        ) external payable returns (bytes memory);

        function outboundTransferCustomRefund(
            address token,
            address refundTo,
            address to,
            uint256 amount,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            bytes calldata data
        ) external payable returns (bytes memory);

        /// Register a custom gateway for the caller token (privileged).
        /// Issues a retryable ticket updating the child-side router.
        function setGateway(
            address gateway,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            uint256 maxSubmissionCost,
            address creditBackAddress
        ) external payable returns (uint256);

        /// Owner-only batch registration.
        function setGateways(
            address[] calldata tokens,
            address[] calldata gateways,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            uint256 maxSubmissionCost
        ) external payable returns (uint256);

        event GatewaySet(address indexed token, address indexed gateway);

        event TransferRouted(
            address indexed token,
            address indexed sender,
            address indexed to,
            address gateway
        );
    }

    /// Shared gateway surface implemented by the standard, custom and
    /// fee-token gateway variants.
    #[sol(rpc)]
    contract TokenGateway {
        /// The calldata the gateway would forward to its child counterpart
        /// for this deposit.
        function getOutboundCalldata(
            address token,
            address from,
            address to,
            uint256 amount,
            bytes calldata data
        ) external view returns (bytes memory);

        function calculateChildTokenAddress(address token) external view returns (address);

        event DepositInitiated(
            address indexed token,
            address indexed from,
            address indexed to,
            uint256 sequenceNumber,
            uint256 amount
        );

        event WithdrawalInitiated(
            address token,
            address indexed from,
            address indexed to,
            uint256 indexed exitNum,
            uint256 amount
        );
    }

    /// Parent-side custom gateway holding per-token registrations.
    #[sol(rpc)]
    contract CustomGateway {
        /// Register the caller token's child counterpart (privileged).
        /// Issues a retryable ticket updating the child-side gateway.
        function registerTokenToChild(
            address childToken,
            uint256 gasLimit,
            uint256 maxFeePerGas,
            uint256 maxSubmissionCost,
            address creditBackAddress
        ) external payable returns (uint256);

        function parentToChildToken(address token) external view returns (address);

        event TokenRegistered(address indexed parentToken, address indexed childToken);
    }

    // ========================================================================
    // USDC migration surface
    // ========================================================================

    /// Gateway variant for a bridged stablecoin that can be migrated to a
    /// natively-issued one.
    #[sol(rpc)]
    contract UsdcGateway {
        function pauseDeposits() external;
        function unpauseDeposits() external;
        function depositsPaused() external view returns (bool);

        function pauseWithdrawals() external;
        function unpauseWithdrawals() external;
        function withdrawalsPaused() external view returns (bool);

        function setOwner(address newOwner) external;
        function owner() external view returns (address);

        /// Burn the escrowed supply backing the bridged representation.
        /// Requires minter rights on the token.
        function burnLockedUSDC() external;

        event DepositsPaused();
        event WithdrawalsPaused();
        event LockedSupplyBurned(uint256 amount);
    }

    /// Minimal fiat-token surface needed by the migration flow.
    #[sol(rpc)]
    contract FiatToken {
        function isMinter(address account) external view returns (bool);
        function addMinter(address minter) external;
        function setOwner(address newOwner) external;
        function owner() external view returns (address);
        function balanceOf(address account) external view returns (uint256);
    }

    // ========================================================================
    // Auxiliary surfaces
    // ========================================================================

    /// Access-control list consulted by parent-chain entry points.
    #[sol(rpc)]
    contract Whitelist {
        function isAllowed(address account) external view returns (bool);
    }

    /// Estimation entry point; called via eth_estimateGas only.
    #[sol(rpc)]
    contract NodeInterface {
        function estimateRetryableTicket(
            address sender,
            uint256 deposit,
            address to,
            uint256 childCallValue,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            bytes calldata data
        ) external;
    }

    /// Escrow bridge probe. Fee-token chains expose their custom fee token
    /// here; native chains revert or return zero.
    #[sol(rpc)]
    contract FeeTokenBridge {
        function nativeToken() external view returns (address);
    }

    /// Standard ERC20 interface
    #[sol(rpc)]
    contract ERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);

        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}
