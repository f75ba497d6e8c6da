//! Bridge error taxonomy
//!
//! Errors carry enough context (ticket or withdrawal id, action, unmet
//! precondition) to diagnose a failure without re-deriving chain state.
//! Transport and contract-call failures pass through unchanged so callers
//! can tell a transient RPC hiccup from a protocol-level outcome.

use alloy::primitives::{Address, FixedBytes};
use thiserror::Error;

use crate::retryable::TicketStatus;

/// Crate-wide result alias.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Errors surfaced by the bridge core.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The execution simulation behind a gas estimate reverted. A ticket
    /// created with these parameters would be guaranteed to fail
    /// redemption, so no default gas value is substituted.
    #[error("gas estimation reverted for call to {to}: {reason}")]
    EstimationFailed { to: Address, reason: String },

    /// The ticket's retention window elapsed without a redemption. A new
    /// ticket must be submitted; this one cannot be retried.
    #[error("retryable ticket {ticket_id} has expired and can no longer be redeemed")]
    TicketExpired { ticket_id: FixedBytes<32> },

    /// A withdrawal execution was attempted after the message had already
    /// been executed on the parent chain.
    #[error("withdrawal {message_id} (outbox position {position}) was already executed")]
    AlreadyExecuted {
        message_id: FixedBytes<32>,
        position: String,
    },

    /// One half of a two-ticket custom-token registration did not redeem.
    /// Requires operator intervention; never retried automatically.
    #[error(
        "custom token registration incomplete for {token}: \
         gateway ticket {gateway_status}, router ticket {router_status}"
    )]
    RegistrationIncomplete {
        token: Address,
        gateway_status: TicketStatus,
        router_status: TicketStatus,
    },

    /// A ticket wait ran out of time before reaching a terminal state.
    /// Nothing was mutated; a later call can still observe the outcome.
    #[error(
        "timed out after {timeout_ms} ms waiting on ticket {ticket_id} \
         (last observed status: {last_status})"
    )]
    TicketWaitTimeout {
        ticket_id: FixedBytes<32>,
        last_status: TicketStatus,
        timeout_ms: u64,
    },

    /// A USDC migration call was attempted out of order.
    #[error("cannot {action}: {unmet}")]
    MigrationOrdering {
        action: &'static str,
        unmet: &'static str,
    },

    /// A submitted transaction was mined but reverted.
    #[error("{action} transaction {tx_hash} reverted")]
    TransactionReverted {
        action: &'static str,
        tx_hash: FixedBytes<32>,
    },

    /// A transaction that should create a retryable ticket emitted no
    /// ticket-creation event.
    #[error("{action} transaction {tx_hash} produced no ticket-creation event")]
    NoTicketCreated {
        action: &'static str,
        tx_hash: FixedBytes<32>,
    },

    /// Invalid caller-supplied configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transport-level RPC failure, propagated unchanged.
    #[error(transparent)]
    Rpc(#[from] alloy::transports::TransportError),

    /// Contract call failure, propagated unchanged.
    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),

    /// Failure while waiting for a submitted transaction's receipt.
    #[error(transparent)]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),
}

impl BridgeError {
    /// Whether this error is worth retrying with backoff (transient
    /// transport failures only; protocol outcomes are never retried).
    pub fn is_transient(&self) -> bool {
        match self {
            BridgeError::Rpc(e) => crate::retry::is_transient(&e.to_string()),
            BridgeError::Contract(e) => crate::retry::is_transient(&e.to_string()),
            _ => false,
        }
    }
}
