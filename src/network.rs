//! Read-only network state queries
//!
//! A thin facade over the parent chain: rollup node lifecycle events,
//! whitelist membership, and contract-existence checks. Point queries carry
//! no retry logic; RPC errors surface unchanged.

use alloy::primitives::Address;
use alloy::providers::Provider;

use crate::error::Result;
use crate::evm::contracts::{Rollup, Whitelist};
use crate::evm::events::{NodeConfirmedEvent, NodeCreatedEvent};
use crate::evm::{http_provider, HttpProvider};
use crate::fetcher::EventFetcher;

/// General information about the current network state.
pub struct NetworkState {
    provider: HttpProvider,
}

impl NetworkState {
    /// Create over a parent-chain RPC URL.
    pub fn new(parent_rpc_url: &str) -> Result<Self> {
        Ok(Self {
            provider: http_provider(parent_rpc_url)?,
        })
    }

    /// Create over an existing provider.
    pub fn from_provider(provider: HttpProvider) -> Self {
        Self { provider }
    }

    /// Current parent-chain block number.
    pub async fn current_block(&self) -> Result<u64> {
        let block = self.provider.get_block_number().await?;
        Ok(block)
    }

    /// Rollup `NodeCreated` events in the block range, optionally filtered
    /// by node number.
    pub async fn get_node_created_events(
        &self,
        rollup: Address,
        node_num: Option<u64>,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<NodeCreatedEvent>> {
        let fetcher = EventFetcher::new(self.provider.clone());
        let mut events = fetcher
            .get_events::<NodeCreatedEvent>(rollup, from_block, to_block)
            .await?;

        if let Some(num) = node_num {
            events.retain(|e| e.node_num == num);
        }
        Ok(events)
    }

    /// Rollup `NodeConfirmed` events in the block range, optionally
    /// filtered by node number.
    pub async fn get_node_confirmed_events(
        &self,
        rollup: Address,
        node_num: Option<u64>,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<NodeConfirmedEvent>> {
        let fetcher = EventFetcher::new(self.provider.clone());
        let mut events = fetcher
            .get_events::<NodeConfirmedEvent>(rollup, from_block, to_block)
            .await?;

        if let Some(num) = node_num {
            events.retain(|e| e.node_num == num);
        }
        Ok(events)
    }

    /// Node number of the latest confirmed rollup assertion, straight from
    /// the rollup contract.
    pub async fn latest_confirmed_node(&self, rollup: Address) -> Result<u64> {
        let rollup = Rollup::new(rollup, &self.provider);
        Ok(rollup.latestConfirmed().call().await?._0)
    }

    /// Check membership in a whitelist contract.
    pub async fn is_whitelisted(&self, account: Address, whitelist: Address) -> Result<bool> {
        let list = Whitelist::new(whitelist, &self.provider);
        Ok(list.isAllowed(account).call().await?._0)
    }

    /// Whether deployed code exists at the address.
    pub async fn contract_exists(&self, address: Address) -> Result<bool> {
        let code = self.provider.get_code_at(address).await?;
        Ok(!code.is_empty())
    }
}
