//! Live Bridge Integration Test
//!
//! Exercises the deposit path, custom-token registration and the USDC
//! migration sequence against a running parent/child chain pair with a
//! deployed token bridge. Set these environment variables:
//!
//! - `PARENT_RPC_URL` - Parent chain RPC (e.g., http://localhost:8547)
//! - `CHILD_RPC_URL` - Child chain RPC (e.g., http://localhost:3347)
//! - `ROUTER_ADDRESS` - Parent-chain gateway router
//! - `INBOX_ADDRESS` - Parent-chain inbox
//! - `TOKEN_ADDRESS` - A mintable test ERC20 held by the test key
//! - `TEST_PRIVATE_KEY` - Funded parent-chain key
//!
//! ## Running
//!
//! ```bash
//! PARENT_RPC_URL=http://localhost:8547 \
//! CHILD_RPC_URL=http://localhost:3347 \
//! ROUTER_ADDRESS=0x... INBOX_ADDRESS=0x... TOKEN_ADDRESS=0x... \
//! TEST_PRIVATE_KEY=0x... \
//! cargo test --features testing --test bridge_live -- --ignored --nocapture
//! ```

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, FixedBytes, U256};
use eyre::{eyre, Result, WrapErr};

use tokenbridge_rs::evm::contracts::ERC20;
use tokenbridge_rs::evm::{get_base_fee, http_provider, parse_signer, EvmClient};
use tokenbridge_rs::testing::{
    assert_balance_decreased_by, assert_balance_increased_by, assert_balance_unchanged,
};
use tokenbridge_rs::{
    BridgeError, CrossChainCall, CustomTokenRegistration, DepositParams, FeeDenomination,
    FeeEstimate, GasFeeEstimator, GatewayRouterClient, MigrationStage, RetryableMessageTracker,
    TicketStatus, UsdcMigration, UsdcMigrationConfig,
};

struct LiveEnv {
    parent_rpc_url: String,
    child_rpc_url: String,
    router: Address,
    inbox: Address,
    token: Address,
    private_key: String,
}

fn load_env() -> Result<LiveEnv> {
    let var = |name: &str| {
        std::env::var(name).map_err(|_| {
            eyre!(
                "{name} not set. Required: PARENT_RPC_URL, CHILD_RPC_URL, \
                 ROUTER_ADDRESS, INBOX_ADDRESS, TOKEN_ADDRESS, TEST_PRIVATE_KEY"
            )
        })
    };

    Ok(LiveEnv {
        parent_rpc_url: var("PARENT_RPC_URL")?,
        child_rpc_url: var("CHILD_RPC_URL")?,
        router: Address::from_str(&var("ROUTER_ADDRESS")?).wrap_err("Invalid ROUTER_ADDRESS")?,
        inbox: Address::from_str(&var("INBOX_ADDRESS")?).wrap_err("Invalid INBOX_ADDRESS")?,
        token: Address::from_str(&var("TOKEN_ADDRESS")?).wrap_err("Invalid TOKEN_ADDRESS")?,
        private_key: var("TEST_PRIVATE_KEY")?,
    })
}

fn addr_var(name: &str) -> Result<Address> {
    let value = std::env::var(name).map_err(|_| eyre!("{name} not set"))?;
    Address::from_str(&value).wrap_err_with(|| format!("Invalid {name}"))
}

/// Flat, generous fee budget for administrative tickets; the surplus is
/// credited back, so overshooting only ties up funds briefly.
fn flat_fees() -> FeeEstimate {
    let gas_limit = U256::from(2_000_000u64);
    let max_fee_per_gas = U256::from(1_000_000_000u64);
    let max_submission_cost = U256::from(1_000_000_000_000_000u64);
    FeeEstimate {
        gas_limit,
        max_fee_per_gas,
        max_submission_cost,
        deposit: max_submission_cost + gas_limit * max_fee_per_gas,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

#[tokio::test]
#[ignore = "requires a running chain pair with a deployed bridge"]
async fn deposit_via_default_gateway_moves_exact_amounts() -> Result<()> {
    init_tracing();
    let env = load_env()?;

    let parent_provider = http_provider(&env.parent_rpc_url)?;
    let child_provider = http_provider(&env.child_rpc_url)?;
    let signer = parse_signer(&env.private_key)?;
    let sender = signer.address();

    // Sanity-check that the endpoints point at two different chains
    let parent_chain_id = EvmClient::new(&env.parent_rpc_url)?.get_chain_id().await?;
    let child_chain_id = EvmClient::new(&env.child_rpc_url)?.get_chain_id().await?;
    eyre::ensure!(
        parent_chain_id != child_chain_id,
        "parent and child endpoints must point at different chains"
    );

    let fee = FeeDenomination::detect(&parent_provider, env.inbox).await?;
    let router = GatewayRouterClient::new(&env.parent_rpc_url, env.router, fee)?;
    let gateway = router.get_gateway(env.token).await?;

    // Snapshot state before
    let token = ERC20::new(env.token, &parent_provider);
    let user_before = token.balanceOf(sender).call().await?._0;
    let gateway_before = token.balanceOf(gateway).call().await?._0;

    // Approve the deposit amount to the gateway
    let deposit_amount = U256::from(350u64);
    {
        let wallet = alloy::network::EthereumWallet::from(signer.clone());
        let provider = alloy::providers::ProviderBuilder::new()
            .wallet(wallet)
            .on_http(env.parent_rpc_url.parse().map_err(|e| eyre!("invalid RPC URL: {e}"))?);
        let token = ERC20::new(env.token, &provider);
        let receipt = token
            .approve(gateway, deposit_amount)
            .send()
            .await?
            .get_receipt()
            .await?;
        assert!(receipt.status(), "approve reverted");
    }

    // Price the ticket against the calldata the gateway will forward
    let outbound_calldata = router
        .get_outbound_calldata(env.token, sender, sender, deposit_amount, &Bytes::new())
        .await?;

    let estimator = GasFeeEstimator::new(child_provider.clone(), fee);
    let parent_base_fee = get_base_fee(&parent_provider).await?;
    let fees = estimator
        .estimate_all(
            &CrossChainCall {
                from: sender,
                to: sender,
                child_call_value: U256::ZERO,
                data: outbound_calldata,
                excess_fee_refund_address: sender,
                call_value_refund_address: sender,
            },
            parent_base_fee,
        )
        .await?;

    // Bridge it
    let submission = router
        .outbound_transfer(
            &signer,
            &DepositParams {
                token: env.token,
                to: sender,
                amount: deposit_amount,
                refund_to: Some(sender),
                fees,
                call_hook_data: Bytes::new(),
            },
        )
        .await?;
    assert_eq!(submission.tickets.len(), 1, "expected exactly one ticket");
    let ticket = &submission.tickets[0];

    // Wait for the child-chain effect
    let tracker = RetryableMessageTracker::new(&env.child_rpc_url)?;
    let status = tracker
        .wait_for_status(
            ticket.ticket_id,
            Duration::from_secs(1),
            Duration::from_secs(180),
        )
        .await?;
    assert_eq!(status, TicketStatus::Redeemed);

    // Exact bookkeeping on the parent chain
    let user_after = token.balanceOf(sender).call().await?._0;
    let gateway_after = token.balanceOf(gateway).call().await?._0;
    assert_balance_decreased_by(user_before, user_after, deposit_amount)?;
    assert_balance_increased_by(gateway_before, gateway_after, deposit_amount)?;

    // Exact credit on the child chain
    let child_token_address = router.calculate_child_token_address(env.token).await?;
    let child_token = ERC20::new(child_token_address, &child_provider);
    let child_balance = child_token.balanceOf(sender).call().await?._0;
    assert_balance_increased_by(U256::ZERO, child_balance, deposit_amount)?;

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running chain pair with a deployed bridge"]
async fn unregistered_token_resolves_to_default_gateway() -> Result<()> {
    init_tracing();
    let env = load_env()?;

    let router = GatewayRouterClient::new(
        &env.parent_rpc_url,
        env.router,
        FeeDenomination::Native,
    )?;

    // A fresh address has no registration entry
    let unregistered = Address::repeat_byte(0xfe);
    let resolved = router.get_gateway(unregistered).await?;
    let default = router.default_gateway().await?;
    assert_eq!(resolved, default);

    Ok(())
}

/// Additional environment: `CUSTOM_TOKEN_ADDRESS`, `CUSTOM_GATEWAY_ADDRESS`,
/// `CHILD_CUSTOM_TOKEN_ADDRESS`.
#[tokio::test]
#[ignore = "requires a running chain pair with a deployed bridge"]
async fn registering_a_custom_token_redeems_both_tickets() -> Result<()> {
    init_tracing();
    let env = load_env()?;
    let custom_token = addr_var("CUSTOM_TOKEN_ADDRESS")?;
    let custom_gateway = addr_var("CUSTOM_GATEWAY_ADDRESS")?;
    let child_token = addr_var("CHILD_CUSTOM_TOKEN_ADDRESS")?;

    let signer = parse_signer(&env.private_key)?;
    let parent_provider = http_provider(&env.parent_rpc_url)?;
    let fee = FeeDenomination::detect(&parent_provider, env.inbox).await?;
    let router = GatewayRouterClient::new(&env.parent_rpc_url, env.router, fee)?;
    let tracker = RetryableMessageTracker::new(&env.child_rpc_url)?;

    router
        .register_custom_token(
            &signer,
            &CustomTokenRegistration {
                token: custom_token,
                custom_gateway,
                child_token,
                gateway_fees: flat_fees(),
                router_fees: flat_fees(),
                credit_back_address: signer.address(),
            },
            &tracker,
            Duration::from_secs(1),
            Duration::from_secs(300),
        )
        .await?;

    // Only a fully redeemed pair flips the registry entry
    let resolved = router.get_gateway(custom_token).await?;
    assert_eq!(resolved, custom_gateway);
    assert_ne!(resolved, router.default_gateway().await?);

    Ok(())
}

/// Additional environment: `USDC_PARENT_GATEWAY`, `USDC_CHILD_GATEWAY`,
/// `USDC_PARENT_TOKEN`, `USDC_CHILD_TOKEN`, `ISSUER_PRIVATE_KEY`.
#[tokio::test]
#[ignore = "requires a running chain pair with a deployed bridge"]
async fn usdc_migration_enforces_stage_order_and_burns_to_zero() -> Result<()> {
    init_tracing();
    let env = load_env()?;
    let parent_gateway = addr_var("USDC_PARENT_GATEWAY")?;
    let child_gateway = addr_var("USDC_CHILD_GATEWAY")?;
    let parent_usdc = addr_var("USDC_PARENT_TOKEN")?;
    let child_usdc_address = addr_var("USDC_CHILD_TOKEN")?;
    let issuer_key = std::env::var("ISSUER_PRIVATE_KEY").map_err(|_| eyre!("ISSUER_PRIVATE_KEY not set"))?;

    let owner = parse_signer(&env.private_key)?;
    let issuer = parse_signer(&issuer_key)?;

    let migration = UsdcMigration::new(UsdcMigrationConfig {
        parent_rpc_url: env.parent_rpc_url.clone(),
        child_rpc_url: env.child_rpc_url.clone(),
        parent_gateway,
        child_gateway,
        parent_usdc,
        issuer: issuer.address(),
    })?;

    // Transferring ownership before anything is paused is rejected
    assert_eq!(migration.stage().await?, MigrationStage::DepositsActive);
    match migration.set_owner(&owner).await {
        Err(BridgeError::MigrationOrdering { .. }) => {}
        other => return Err(eyre!("expected an ordering error, got {other:?}")),
    }

    migration.pause_deposits(&owner).await?;
    migration.pause_withdrawals(&owner).await?;
    assert_eq!(migration.stage().await?, MigrationStage::DepositsPaused);

    // Deposits against the paused gateway are refused
    let parent_provider = http_provider(&env.parent_rpc_url)?;
    let fee = FeeDenomination::detect(&parent_provider, env.inbox).await?;
    let router = GatewayRouterClient::new(&env.parent_rpc_url, env.router, fee)?;
    let paused_deposit = router
        .outbound_transfer(
            &owner,
            &DepositParams {
                token: parent_usdc,
                to: owner.address(),
                amount: U256::from(1u64),
                refund_to: None,
                fees: flat_fees(),
                call_hook_data: Bytes::new(),
            },
        )
        .await;
    assert!(
        paused_deposit.is_err(),
        "deposit against a paused gateway must fail"
    );

    // Burning before the ownership transfer is rejected
    match migration.burn_locked_usdc(&owner).await {
        Err(BridgeError::MigrationOrdering { .. }) => {}
        other => return Err(eyre!("expected an ordering error, got {other:?}")),
    }

    migration.set_owner(&owner).await?;
    migration.add_minter(&issuer).await?;
    assert_eq!(migration.stage().await?, MigrationStage::OwnershipTransferred);

    // Bridged balances on the child chain must survive the burn
    let child_provider = http_provider(&env.child_rpc_url)?;
    let child_usdc = ERC20::new(child_usdc_address, &child_provider);
    let child_before = child_usdc.balanceOf(owner.address()).call().await?._0;

    migration.burn_locked_usdc(&issuer).await?;
    assert_eq!(migration.stage().await?, MigrationStage::LockedSupplyBurned);

    let token = ERC20::new(parent_usdc, &parent_provider);
    let locked = token.balanceOf(parent_gateway).call().await?._0;
    assert_eq!(locked, U256::ZERO, "locked supply must burn to exactly zero");

    let child_after = child_usdc.balanceOf(owner.address()).call().await?._0;
    assert_balance_unchanged(child_before, child_after)?;

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running chain pair with a deployed bridge"]
async fn short_wait_times_out_without_side_effects() -> Result<()> {
    init_tracing();
    let env = load_env()?;

    let tracker = RetryableMessageTracker::new(&env.child_rpc_url)?;
    let nonexistent = FixedBytes::repeat_byte(0x77);

    let result = tracker
        .wait_for_status(
            nonexistent,
            Duration::from_millis(100),
            Duration::from_millis(300),
        )
        .await;

    match result {
        Err(BridgeError::TicketWaitTimeout { last_status, .. }) => {
            assert_eq!(last_status, TicketStatus::NotYetCreated);
        }
        other => return Err(eyre!("expected a wait timeout, got {other:?}")),
    }

    // A later query still works and still sees the same ledger state
    let status = tracker.get_status(nonexistent).await?;
    assert_eq!(status, TicketStatus::NotYetCreated);

    Ok(())
}
