//! EVM RPC client plumbing
//!
//! Thin wrappers over alloy providers shared by the trackers, the estimator
//! and the router: a read-only HTTP provider constructor, a signer parser,
//! and a read-only client with the handful of chain queries the bridge core
//! needs.

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::{Client, Http};
use tracing::info;

use crate::error::{BridgeError, Result};

/// HTTP provider type used throughout the crate.
pub type HttpProvider = RootProvider<Http<Client>>;

/// Build a read-only HTTP provider from an RPC URL.
pub fn http_provider(rpc_url: &str) -> Result<HttpProvider> {
    let url = rpc_url
        .parse()
        .map_err(|e| BridgeError::InvalidConfig(format!("invalid RPC URL {rpc_url}: {e}")))?;
    Ok(ProviderBuilder::new().on_http(url))
}

/// Parse a hex private key into a signer.
pub fn parse_signer(private_key: &str) -> Result<PrivateKeySigner> {
    private_key
        .parse()
        .map_err(|e| BridgeError::InvalidConfig(format!("invalid private key: {e}")))
}

/// Base fee of the latest block, falling back to the node's gas price when
/// the chain predates EIP-1559 fee headers.
pub async fn get_base_fee(provider: &HttpProvider) -> Result<U256> {
    let block = provider
        .get_block_by_number(alloy::eips::BlockNumberOrTag::Latest, false.into())
        .await?;

    if let Some(base_fee) = block.and_then(|b| b.header.base_fee_per_gas) {
        return Ok(U256::from(base_fee));
    }

    let gas_price = provider.get_gas_price().await?;
    Ok(U256::from(gas_price))
}

/// Read-only EVM client
pub struct EvmClient {
    /// The alloy provider
    provider: HttpProvider,
}

impl EvmClient {
    /// Create a new read-only EVM client
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = http_provider(rpc_url)?;

        info!(rpc_url = %rpc_url, "Created read-only EVM client");

        Ok(Self { provider })
    }

    /// Get the underlying provider
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }

    /// Get the current block number
    pub async fn get_block_number(&self) -> Result<u64> {
        let block = self.provider.get_block_number().await?;
        Ok(block)
    }

    /// Get the native balance of an address
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        let balance = self.provider.get_balance(address).await?;
        Ok(balance)
    }

    /// Get the chain ID from the RPC
    pub async fn get_chain_id(&self) -> Result<u64> {
        let chain_id = self.provider.get_chain_id().await?;
        Ok(chain_id)
    }

    /// Get the current base fee
    pub async fn get_base_fee(&self) -> Result<U256> {
        get_base_fee(&self.provider).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rpc_url_rejected() {
        let result = http_provider("not a url");
        assert!(matches!(result, Err(BridgeError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_private_key_rejected() {
        let result = parse_signer("0xzz");
        assert!(matches!(result, Err(BridgeError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_well_known_dev_key() {
        // First Anvil dev key
        let signer =
            parse_signer("0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
                .expect("valid key");
        assert_eq!(
            signer.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }
}
