//! Bridge configuration
//!
//! Every component takes its endpoints and contract addresses explicitly
//! through these structs. Nothing in the crate reads ambient process state;
//! two bridges against different chain pairs can coexist in one process.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// One chain endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// RPC URL (e.g., "http://localhost:8547")
    pub rpc_url: String,
    /// Native chain ID
    pub chain_id: u64,
}

impl ChainConfig {
    pub fn new(rpc_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id,
        }
    }

    /// Validate the RPC URL.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.rpc_url)
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid RPC URL {}: {e}", self.rpc_url)))?;
        Ok(())
    }
}

/// Deployed contract addresses for one bridge
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BridgeContracts {
    /// Parent-chain inbox (ticket submission)
    pub inbox: Address,
    /// Parent-chain rollup (node lifecycle)
    pub rollup: Address,
    /// Parent-chain outbox (withdrawal execution)
    pub outbox: Address,
    /// Parent-chain gateway router
    pub gateway_router: Address,
    /// Parent-chain default (standard ERC20) gateway
    pub default_gateway: Address,
    /// Child-chain gateway router
    pub child_gateway_router: Address,
}

/// Full bridge configuration: two chains plus the deployed contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub parent: ChainConfig,
    pub child: ChainConfig,
    pub contracts: BridgeContracts,
}

impl BridgeConfig {
    /// Validate both endpoints.
    pub fn validate(&self) -> Result<()> {
        self.parent.validate()?;
        self.child.validate()?;
        if self.parent.chain_id == self.child.chain_id {
            return Err(BridgeError::InvalidConfig(
                "parent and child chain IDs must differ".to_string(),
            ));
        }
        Ok(())
    }
}
