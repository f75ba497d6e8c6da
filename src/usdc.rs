//! Bridged-to-native USDC migration control
//!
//! Replacing a bridged, synthetic stablecoin with a natively-issued one is
//! a narrow state machine layered over the gateway registry:
//!
//! `deposits-active → deposits-paused → ownership-transferred →
//! locked-supply-burned`
//!
//! Each transition is a distinct privileged call. Deposits must be paused
//! on the parent gateway AND withdrawals paused on the child gateway before
//! an ownership transfer is meaningful, and the gateway must hold minter
//! rights before the locked supply can be burned. These orderings are
//! enforced here as explicit preconditions instead of relying on the
//! ledger to reject out-of-order calls gracefully.

use std::fmt;

use alloy::primitives::Address;
use alloy::rpc::types::TransactionReceipt;
use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BridgeError, Result};
use crate::evm::contracts::{FiatToken, UsdcGateway};
use crate::evm::{http_provider, HttpProvider};

/// Where the migration currently stands, recomputed from chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MigrationStage {
    DepositsActive,
    DepositsPaused,
    OwnershipTransferred,
    LockedSupplyBurned,
}

impl MigrationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStage::DepositsActive => "deposits-active",
            MigrationStage::DepositsPaused => "deposits-paused",
            MigrationStage::OwnershipTransferred => "ownership-transferred",
            MigrationStage::LockedSupplyBurned => "locked-supply-burned",
        }
    }
}

impl fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One snapshot of the migration-relevant chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationObservation {
    pub deposits_paused: bool,
    pub withdrawals_paused: bool,
    /// Gateway ownership has reached the configured issuer address
    pub ownership_transferred: bool,
    /// The gateway holds minter rights on the token
    pub gateway_is_minter: bool,
    /// The gateway's escrowed token balance is exactly zero
    pub locked_balance_zero: bool,
}

/// Pure stage projection over one observation.
pub fn evaluate_stage(obs: &MigrationObservation) -> MigrationStage {
    if obs.ownership_transferred {
        if obs.locked_balance_zero {
            return MigrationStage::LockedSupplyBurned;
        }
        return MigrationStage::OwnershipTransferred;
    }

    if obs.deposits_paused && obs.withdrawals_paused {
        return MigrationStage::DepositsPaused;
    }
    MigrationStage::DepositsActive
}

/// Precondition check for the ownership transfer.
pub fn check_transfer_preconditions(obs: &MigrationObservation) -> Result<()> {
    if !obs.deposits_paused {
        return Err(BridgeError::MigrationOrdering {
            action: "transfer ownership",
            unmet: "deposits must be paused on the parent gateway first",
        });
    }
    if !obs.withdrawals_paused {
        return Err(BridgeError::MigrationOrdering {
            action: "transfer ownership",
            unmet: "withdrawals must be paused on the child gateway first",
        });
    }
    Ok(())
}

/// Precondition check for the locked-supply burn.
pub fn check_burn_preconditions(obs: &MigrationObservation) -> Result<()> {
    check_transfer_preconditions(obs)?;
    if !obs.ownership_transferred {
        return Err(BridgeError::MigrationOrdering {
            action: "burn locked supply",
            unmet: "gateway ownership must be transferred to the issuer first",
        });
    }
    if !obs.gateway_is_minter {
        return Err(BridgeError::MigrationOrdering {
            action: "burn locked supply",
            unmet: "the issuer must grant the gateway minter rights first",
        });
    }
    Ok(())
}

/// Addresses involved in one USDC migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsdcMigrationConfig {
    pub parent_rpc_url: String,
    pub child_rpc_url: String,
    /// Parent-chain USDC gateway (escrows the locked supply)
    pub parent_gateway: Address,
    /// Child-chain USDC gateway
    pub child_gateway: Address,
    /// Parent-chain USDC token
    pub parent_usdc: Address,
    /// Issuer address that takes over token and gateway ownership
    pub issuer: Address,
}

/// Drives a bridged-to-native USDC migration.
pub struct UsdcMigration {
    config: UsdcMigrationConfig,
    parent_provider: HttpProvider,
    child_provider: HttpProvider,
}

impl UsdcMigration {
    pub fn new(config: UsdcMigrationConfig) -> Result<Self> {
        Ok(Self {
            parent_provider: http_provider(&config.parent_rpc_url)?,
            child_provider: http_provider(&config.child_rpc_url)?,
            config,
        })
    }

    /// Take one snapshot of the migration-relevant chain state.
    pub async fn observe(&self) -> Result<MigrationObservation> {
        let parent_gateway = UsdcGateway::new(self.config.parent_gateway, &self.parent_provider);
        let child_gateway = UsdcGateway::new(self.config.child_gateway, &self.child_provider);
        let usdc = FiatToken::new(self.config.parent_usdc, &self.parent_provider);

        let deposits_paused = parent_gateway.depositsPaused().call().await?._0;
        let withdrawals_paused = child_gateway.withdrawalsPaused().call().await?._0;
        let owner = parent_gateway.owner().call().await?._0;
        let gateway_is_minter = usdc
            .isMinter(self.config.parent_gateway)
            .call()
            .await?
            ._0;
        let locked = usdc
            .balanceOf(self.config.parent_gateway)
            .call()
            .await?
            ._0;

        Ok(MigrationObservation {
            deposits_paused,
            withdrawals_paused,
            ownership_transferred: owner == self.config.issuer,
            gateway_is_minter,
            locked_balance_zero: locked.is_zero(),
        })
    }

    /// Current migration stage, recomputed from chain state on every call.
    pub async fn stage(&self) -> Result<MigrationStage> {
        Ok(evaluate_stage(&self.observe().await?))
    }

    /// Pause deposits on the parent gateway. Subsequent deposit attempts
    /// against the gateway fail.
    pub async fn pause_deposits(&self, signer: &PrivateKeySigner) -> Result<TransactionReceipt> {
        let provider = wallet_provider(&self.config.parent_rpc_url, signer)?;
        let gateway = UsdcGateway::new(self.config.parent_gateway, &provider);

        let receipt = gateway.pauseDeposits().send().await?.get_receipt().await?;
        checked(receipt, "pause deposits")
    }

    /// Pause withdrawals on the child gateway.
    pub async fn pause_withdrawals(&self, signer: &PrivateKeySigner) -> Result<TransactionReceipt> {
        let provider = wallet_provider(&self.config.child_rpc_url, signer)?;
        let gateway = UsdcGateway::new(self.config.child_gateway, &provider);

        let receipt = gateway.pauseWithdrawals().send().await?.get_receipt().await?;
        checked(receipt, "pause withdrawals")
    }

    /// Transfer token and gateway ownership to the issuer.
    ///
    /// Requires deposits paused on the parent gateway and withdrawals
    /// paused on the child gateway.
    pub async fn set_owner(&self, signer: &PrivateKeySigner) -> Result<TransactionReceipt> {
        check_transfer_preconditions(&self.observe().await?)?;

        let provider = wallet_provider(&self.config.parent_rpc_url, signer)?;

        let usdc = FiatToken::new(self.config.parent_usdc, &provider);
        let receipt = usdc
            .setOwner(self.config.issuer)
            .send()
            .await?
            .get_receipt()
            .await?;
        checked(receipt, "transfer token ownership")?;

        let gateway = UsdcGateway::new(self.config.parent_gateway, &provider);
        let receipt = gateway
            .setOwner(self.config.issuer)
            .send()
            .await?
            .get_receipt()
            .await?;
        let receipt = checked(receipt, "transfer gateway ownership")?;

        info!(issuer = %self.config.issuer, "USDC ownership transferred");
        Ok(receipt)
    }

    /// Grant the parent gateway minter rights on the token. Signed by the
    /// issuer after taking ownership; the burn entry point needs these
    /// rights to retire the escrowed supply.
    pub async fn add_minter(&self, signer: &PrivateKeySigner) -> Result<TransactionReceipt> {
        let obs = self.observe().await?;
        check_transfer_preconditions(&obs)?;
        if !obs.ownership_transferred {
            return Err(BridgeError::MigrationOrdering {
                action: "grant minter rights",
                unmet: "gateway ownership must be transferred to the issuer first",
            });
        }

        let provider = wallet_provider(&self.config.parent_rpc_url, signer)?;
        let usdc = FiatToken::new(self.config.parent_usdc, &provider);

        let receipt = usdc
            .addMinter(self.config.parent_gateway)
            .send()
            .await?
            .get_receipt()
            .await?;
        let receipt = checked(receipt, "grant minter rights")?;

        info!(gateway = %self.config.parent_gateway, "Gateway granted minter rights");
        Ok(receipt)
    }

    /// Burn the locked supply escrowed in the parent gateway.
    ///
    /// Requires the full pause + ownership sequence, plus minter rights
    /// granted to the gateway. Previously bridged balances on the child
    /// chain are unaffected.
    pub async fn burn_locked_usdc(&self, signer: &PrivateKeySigner) -> Result<TransactionReceipt> {
        check_burn_preconditions(&self.observe().await?)?;

        let provider = wallet_provider(&self.config.parent_rpc_url, signer)?;
        let gateway = UsdcGateway::new(self.config.parent_gateway, &provider);

        let receipt = gateway.burnLockedUSDC().send().await?.get_receipt().await?;
        let receipt = checked(receipt, "burn locked supply")?;

        info!(gateway = %self.config.parent_gateway, "Locked USDC supply burned");
        Ok(receipt)
    }
}

fn wallet_provider(
    rpc_url: &str,
    signer: &PrivateKeySigner,
) -> Result<
    impl alloy::providers::Provider<alloy::transports::http::Http<alloy::transports::http::Client>>,
> {
    let wallet = alloy::network::EthereumWallet::from(signer.clone());
    let url = rpc_url
        .parse()
        .map_err(|e| BridgeError::InvalidConfig(format!("invalid RPC URL: {e}")))?;
    Ok(alloy::providers::ProviderBuilder::new()
        .wallet(wallet)
        .on_http(url))
}

fn checked(receipt: TransactionReceipt, action: &'static str) -> Result<TransactionReceipt> {
    if !receipt.status() {
        return Err(BridgeError::TransactionReverted {
            action,
            tx_hash: receipt.transaction_hash,
        });
    }
    Ok(receipt)
}
