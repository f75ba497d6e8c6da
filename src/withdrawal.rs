//! Child-to-parent withdrawal lifecycle
//!
//! A withdrawal leaves the child chain as an outgoing message and becomes
//! executable on the parent chain only after the rollup assertion covering
//! its child block survives the dispute window. Lifecycle:
//! `Unconfirmed → Confirmed → Executed`. A message may stay `Confirmed`
//! forever if nobody executes it; that is not an error.

use std::fmt;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, FixedBytes, U256};
use alloy::rpc::types::TransactionReceipt;
use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use crate::evm::contracts::Outbox;
use crate::evm::events::parse_parent_message_sent_log;
use crate::evm::{http_provider, HttpProvider};
use crate::network::NetworkState;
use crate::retry::{with_retry, RetryPolicy};

/// Lifecycle status of a withdrawal message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalStatus {
    /// The covering rollup assertion has not been confirmed yet
    Unconfirmed,
    /// The dispute window passed; the message is executable
    Confirmed,
    /// The message was executed on the parent chain (terminal)
    Executed,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Unconfirmed => "unconfirmed",
            WithdrawalStatus::Confirmed => "confirmed",
            WithdrawalStatus::Executed => "executed",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An outgoing child-to-parent message, as recorded by its emission event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalMessage {
    pub message_id: FixedBytes<32>,
    /// Child-chain sender
    pub sender: Address,
    /// Parent-chain call target
    pub destination: Address,
    /// Calldata executed at the destination
    pub data: Bytes,
    /// Outbox slot the message occupies on the parent chain
    pub position: U256,
    pub batch_number: U256,
    /// Child block the message was emitted in
    pub child_block: u64,
}

/// Extract every withdrawal message emitted by a child-chain transaction.
pub fn withdrawals_from_receipt(receipt: &TransactionReceipt) -> Vec<WithdrawalMessage> {
    receipt
        .inner
        .logs()
        .iter()
        .filter_map(parse_parent_message_sent_log)
        .map(|event| WithdrawalMessage {
            message_id: event.message_id,
            sender: event.sender,
            destination: event.destination,
            data: event.data,
            position: event.position,
            batch_number: event.batch_number,
            child_block: event.child_block,
        })
        .collect()
}

/// Pure confirmation rule: a message is covered once some confirmed
/// assertion's child-block bound reaches its block.
pub fn is_covered(message_child_block: u64, confirmed_child_block_end: Option<u64>) -> bool {
    match confirmed_child_block_end {
        Some(end) => end >= message_child_block,
        None => false,
    }
}

/// Observes and executes withdrawal messages on the parent chain.
///
/// Stateless: safe to share and to call concurrently for distinct messages.
pub struct WithdrawalMessageTracker {
    parent_rpc_url: String,
    parent_provider: HttpProvider,
    network: NetworkState,
    rollup: Address,
    outbox: Address,
    /// Parent block to search rollup events from (rollup deployment block)
    search_from_block: u64,
    retry: RetryPolicy,
}

impl WithdrawalMessageTracker {
    /// Create a tracker over the parent chain endpoint.
    pub fn new(parent_rpc_url: &str, rollup: Address, outbox: Address) -> Result<Self> {
        let provider = http_provider(parent_rpc_url)?;
        Ok(Self {
            parent_rpc_url: parent_rpc_url.to_string(),
            network: NetworkState::from_provider(provider.clone()),
            parent_provider: provider,
            rollup,
            outbox,
            search_from_block: 0,
            retry: RetryPolicy::default(),
        })
    }

    /// Restrict rollup event searches to blocks at or after `block`.
    pub fn with_search_from_block(mut self, block: u64) -> Self {
        self.search_from_block = block;
        self
    }

    /// Highest child block covered by a confirmed assertion, if any.
    async fn confirmed_child_block_end(&self) -> Result<Option<u64>> {
        let head = self.network.current_block().await?;
        let confirmed = self
            .network
            .get_node_confirmed_events(self.rollup, None, self.search_from_block, head)
            .await?;

        let Some(latest) = confirmed.iter().map(|e| e.node_num).max() else {
            return Ok(None);
        };

        let created = self
            .network
            .get_node_created_events(self.rollup, Some(latest), self.search_from_block, head)
            .await?;

        Ok(created.first().map(|e| e.child_block_end))
    }

    /// Non-blocking point query. Idempotent; always reflects the latest
    /// ledger state.
    pub async fn get_status(&self, message: &WithdrawalMessage) -> Result<WithdrawalStatus> {
        let outbox = Outbox::new(self.outbox, &self.parent_provider);
        if outbox.isSpent(message.position).call().await?._0 {
            return Ok(WithdrawalStatus::Executed);
        }

        let covered = is_covered(message.child_block, self.confirmed_child_block_end().await?);
        let status = if covered {
            WithdrawalStatus::Confirmed
        } else {
            WithdrawalStatus::Unconfirmed
        };

        debug!(
            message_id = %message.message_id,
            child_block = message.child_block,
            status = %status,
            "Withdrawal status"
        );
        Ok(status)
    }

    /// Poll until the message is executable (or already executed).
    ///
    /// Blocks indefinitely through the dispute window; wrap in
    /// `tokio::time::timeout` to bound the wait. Abandoning the wait has no
    /// effect on the underlying message.
    pub async fn wait_until_ready_to_execute(
        &self,
        message: &WithdrawalMessage,
        poll_interval: Duration,
    ) -> Result<WithdrawalStatus> {
        loop {
            let status = with_retry(&self.retry, "withdrawal status poll", || {
                self.get_status(message)
            })
            .await?;

            if status != WithdrawalStatus::Unconfirmed {
                info!(message_id = %message.message_id, status = %status, "Withdrawal ready");
                return Ok(status);
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Execute a confirmed message on the parent chain.
    ///
    /// The ledger enforces exactly-once execution; a second attempt is
    /// surfaced as [`BridgeError::AlreadyExecuted`] rather than a generic
    /// revert.
    pub async fn execute(
        &self,
        message: &WithdrawalMessage,
        signer: &PrivateKeySigner,
    ) -> Result<TransactionReceipt> {
        let outbox_view = Outbox::new(self.outbox, &self.parent_provider);
        if outbox_view.isSpent(message.position).call().await?._0 {
            return Err(BridgeError::AlreadyExecuted {
                message_id: message.message_id,
                position: message.position.to_string(),
            });
        }

        let wallet = alloy::network::EthereumWallet::from(signer.clone());
        let url = self
            .parent_rpc_url
            .parse()
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid RPC URL: {e}")))?;
        let provider = alloy::providers::ProviderBuilder::new()
            .wallet(wallet)
            .on_http(url);

        let outbox = Outbox::new(self.outbox, &provider);
        let call = outbox.executeTransaction(
            message.position,
            message.sender,
            message.destination,
            U256::from(message.child_block),
            message.data.clone(),
        );

        let pending = match call.send().await {
            Ok(pending) => pending,
            Err(e) => {
                let text = e.to_string().to_lowercase();
                if text.contains("already spent") || text.contains("already executed") {
                    return Err(BridgeError::AlreadyExecuted {
                        message_id: message.message_id,
                        position: message.position.to_string(),
                    });
                }
                return Err(e.into());
            }
        };

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            // Another executor may have won the race between the pre-flight
            // check and inclusion.
            if outbox_view.isSpent(message.position).call().await?._0 {
                return Err(BridgeError::AlreadyExecuted {
                    message_id: message.message_id,
                    position: message.position.to_string(),
                });
            }
            return Err(BridgeError::TransactionReverted {
                action: "execute withdrawal",
                tx_hash: receipt.transaction_hash,
            });
        }

        info!(
            message_id = %message.message_id,
            tx_hash = %receipt.transaction_hash,
            "Withdrawal executed"
        );
        Ok(receipt)
    }
}
