//! Tokenbridge-RS: Cross-Domain Messaging and Token Gateway Library
//!
//! This crate moves value and ERC-20 tokens between a parent chain and a
//! child rollup chain through prepaid retryable tickets and a pluggable
//! token-gateway registry:
//!
//! - **Address Aliasing** - Offset transform distinguishing cross-domain
//!   contract callers from same-address local accounts
//! - **Event Fetching** - Chunked, ordered log queries plus a restartable
//!   event cursor
//! - **Gas Estimation** - Simulation-backed fee parameters that make a
//!   ticket redeem on the first attempt
//! - **Retryable Tickets** - Parent-to-child message lifecycle from
//!   submission to redemption or expiry
//! - **Withdrawals** - Child-to-parent message lifecycle through the
//!   dispute window to execution
//! - **Gateway Routing** - Token-to-gateway resolution, deposits, custom
//!   token registration, USDC migration control
//! - **Network State** - Rollup node lifecycle and point queries consumed
//!   by the trackers
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! tokenbridge-rs = { path = "../tokenbridge-rs" }
//! ```
//!
//! ## Feature Flags
//!
//! - `testing` - Enable assertion helpers for E2E tests

pub mod aliasing;
pub mod config;
pub mod error;
pub mod estimator;
pub mod evm;
pub mod fetcher;
pub mod network;
pub mod retry;
pub mod retryable;
pub mod router;
pub mod usdc;
pub mod withdrawal;

// Testing utilities (feature-gated)
#[cfg(feature = "testing")]
pub mod testing;

// Re-export commonly used items at the crate root
pub use aliasing::{apply_alias, undo_alias, ADDRESS_ALIAS_OFFSET};
pub use config::{BridgeConfig, BridgeContracts, ChainConfig};
pub use error::{BridgeError, Result};
pub use estimator::{CrossChainCall, FeeEstimate, GasEstimateOptions, GasFeeEstimator};
pub use fetcher::{EventFetcher, EventStream, FetchConfig, TypedEvent};
pub use network::NetworkState;
pub use retry::RetryPolicy;
pub use retryable::{
    derive_ticket_id, tickets_from_receipt, RetryableMessageTracker, RetryableTicket, TicketId,
    TicketStatus,
};
pub use router::{
    CustomTokenRegistration, DepositParams, DepositSubmission, FeeDenomination,
    GatewayRouterClient,
};
pub use usdc::{MigrationStage, UsdcMigration, UsdcMigrationConfig};
pub use withdrawal::{
    withdrawals_from_receipt, WithdrawalMessage, WithdrawalMessageTracker, WithdrawalStatus,
};
