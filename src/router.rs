//! Gateway routing and deposits
//!
//! The router maps each token to the gateway responsible for it (custom
//! registration wins, default gateway otherwise) and forwards deposit
//! requests. Chains differ in how ticket fees are paid: native-asset chains
//! attach value to the deposit transaction, fee-token chains pre-encode the
//! fee amount into the deposit payload and rely on a prior token approval.
//! That choice is fixed once per chain as a [`FeeDenomination`] variant.

use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionReceipt;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use crate::estimator::FeeEstimate;
use crate::evm::contracts::{CustomGateway, FeeTokenBridge, GatewayRouter, Inbox, TokenGateway};
use crate::evm::{http_provider, HttpProvider};
use crate::retryable::{tickets_from_receipt, RetryableMessageTracker, RetryableTicket, TicketStatus};

/// How ticket fees are denominated on the child chain. Selected once per
/// chain configuration; every deposit through the router uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeDenomination {
    /// Fees paid in the chain's native asset, attached as call value
    Native,
    /// Fees paid in a custom ERC-20, drawn from a prior approval
    FeeToken(Address),
}

impl FeeDenomination {
    pub fn is_fee_token(&self) -> bool {
        matches!(self, FeeDenomination::FeeToken(_))
    }

    /// Probe a deployed bridge for its fee token.
    ///
    /// Native chains either revert on the probe or report the zero
    /// address; both mean [`FeeDenomination::Native`].
    pub async fn detect(provider: &HttpProvider, inbox: Address) -> Result<Self> {
        let bridge = Inbox::new(inbox, provider).bridge().call().await?._0;

        match FeeTokenBridge::new(bridge, provider).nativeToken().call().await {
            Ok(result) if result._0 != Address::ZERO => Ok(FeeDenomination::FeeToken(result._0)),
            _ => Ok(FeeDenomination::Native),
        }
    }

    /// ABI-encode the extra data passed to a gateway's deposit entry point.
    ///
    /// Native chains encode `(maxSubmissionCost, callHookData)`; fee-token
    /// chains append the fee amount: `(maxSubmissionCost, callHookData,
    /// maxFeeTokenAmount)`.
    pub fn encode_deposit_data(
        &self,
        max_submission_cost: U256,
        call_hook_data: &Bytes,
        max_fee_token_amount: U256,
    ) -> Bytes {
        let encoded = match self {
            FeeDenomination::Native => {
                (max_submission_cost, call_hook_data.clone()).abi_encode_params()
            }
            FeeDenomination::FeeToken(_) => {
                (max_submission_cost, call_hook_data.clone(), max_fee_token_amount)
                    .abi_encode_params()
            }
        };
        Bytes::from(encoded)
    }
}

/// One deposit request through the router.
#[derive(Debug, Clone)]
pub struct DepositParams {
    /// Parent-chain token being deposited
    pub token: Address,
    /// Child-chain recipient
    pub to: Address,
    pub amount: U256,
    /// Refund target for excess fees; `None` refunds the sender
    pub refund_to: Option<Address>,
    /// Ticket fee parameters, usually from the estimator
    pub fees: FeeEstimate,
    /// Opaque hook data forwarded to the child-side gateway
    pub call_hook_data: Bytes,
}

/// A submitted deposit and the tickets it created.
#[derive(Debug)]
pub struct DepositSubmission {
    pub receipt: TransactionReceipt,
    pub tickets: Vec<RetryableTicket>,
}

/// Parameters for registering a custom token with its gateway and the
/// router. Both halves must redeem for the registration to take effect.
#[derive(Debug, Clone)]
pub struct CustomTokenRegistration {
    /// Parent-chain token being registered
    pub token: Address,
    /// Custom gateway that will own the token's deposits
    pub custom_gateway: Address,
    /// Child-chain counterpart token
    pub child_token: Address,
    /// Fees for the gateway-registration ticket
    pub gateway_fees: FeeEstimate,
    /// Fees for the router-registration ticket
    pub router_fees: FeeEstimate,
    /// Receives surplus fees from both tickets
    pub credit_back_address: Address,
}

/// Client for the parent-chain gateway router.
///
/// Stateless facade; the router contract's registry is the source of truth.
pub struct GatewayRouterClient {
    parent_rpc_url: String,
    parent_provider: HttpProvider,
    router: Address,
    fee: FeeDenomination,
}

impl GatewayRouterClient {
    /// Create a client for a deployed router.
    pub fn new(parent_rpc_url: &str, router: Address, fee: FeeDenomination) -> Result<Self> {
        Ok(Self {
            parent_rpc_url: parent_rpc_url.to_string(),
            parent_provider: http_provider(parent_rpc_url)?,
            router,
            fee,
        })
    }

    pub fn fee_denomination(&self) -> FeeDenomination {
        self.fee
    }

    /// Gateway responsible for a token: its custom registration when one
    /// exists, the default gateway otherwise.
    pub async fn get_gateway(&self, token: Address) -> Result<Address> {
        let router = GatewayRouter::new(self.router, &self.parent_provider);
        let gateway = router.getGateway(token).call().await?._0;

        if gateway == Address::ZERO {
            return self.default_gateway().await;
        }
        Ok(gateway)
    }

    pub async fn default_gateway(&self) -> Result<Address> {
        let router = GatewayRouter::new(self.router, &self.parent_provider);
        Ok(router.defaultGateway().call().await?._0)
    }

    /// Deterministic child-chain address of a token's bridged counterpart,
    /// computable before any deposit has happened.
    pub async fn calculate_child_token_address(&self, token: Address) -> Result<Address> {
        let router = GatewayRouter::new(self.router, &self.parent_provider);
        Ok(router.calculateChildTokenAddress(token).call().await?._0)
    }

    /// Calldata the resolved gateway would forward to its child
    /// counterpart for this deposit. Feed this to the estimator to price
    /// the deposit ticket.
    pub async fn get_outbound_calldata(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
        call_hook_data: &Bytes,
    ) -> Result<Bytes> {
        let gateway_addr = self.get_gateway(token).await?;
        let gateway = TokenGateway::new(gateway_addr, &self.parent_provider);
        let result = gateway
            .getOutboundCalldata(token, from, to, amount, call_hook_data.clone())
            .call()
            .await?;
        Ok(result._0)
    }

    /// Encode and submit a deposit through the resolved gateway.
    ///
    /// Requires a prior token approval to the gateway for `amount`, and on
    /// fee-token chains an additional approval covering the fee amount.
    pub async fn outbound_transfer(
        &self,
        signer: &PrivateKeySigner,
        params: &DepositParams,
    ) -> Result<DepositSubmission> {
        let fee_amount =
            params.fees.max_submission_cost + params.fees.gas_limit * params.fees.max_fee_per_gas;
        let data =
            self.fee
                .encode_deposit_data(params.fees.max_submission_cost, &params.call_hook_data, fee_amount);
        let value = match self.fee {
            FeeDenomination::Native => fee_amount,
            FeeDenomination::FeeToken(_) => U256::ZERO,
        };

        debug!(
            token = %params.token,
            to = %params.to,
            amount = %params.amount,
            value = %value,
            fee_token = self.fee.is_fee_token(),
            "Submitting outbound transfer"
        );

        let provider = self.wallet_provider(signer)?;
        let router = GatewayRouter::new(self.router, &provider);

        let pending = match params.refund_to {
            Some(refund_to) => {
                router
                    .outboundTransferCustomRefund(
                        params.token,
                        refund_to,
                        params.to,
                        params.amount,
                        params.fees.gas_limit,
                        params.fees.max_fee_per_gas,
                        data,
                    )
                    .value(value)
                    .send()
                    .await?
            }
            None => {
                router
                    .outboundTransfer(
                        params.token,
                        params.to,
                        params.amount,
                        params.fees.gas_limit,
                        params.fees.max_fee_per_gas,
                        data,
                    )
                    .value(value)
                    .send()
                    .await?
            }
        };

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(BridgeError::TransactionReverted {
                action: "outbound transfer",
                tx_hash: receipt.transaction_hash,
            });
        }

        let tickets = tickets_from_receipt(&receipt);
        info!(
            token = %params.token,
            tx_hash = %receipt.transaction_hash,
            tickets = tickets.len(),
            "Outbound transfer submitted"
        );

        Ok(DepositSubmission { receipt, tickets })
    }

    /// Register a custom token: one ticket registers the child token with
    /// the custom gateway, a second registers the gateway with the router.
    ///
    /// Both tickets must independently redeem. A single failure leaves the
    /// registration incomplete and is surfaced for operator remediation;
    /// it is never retried automatically.
    pub async fn register_custom_token(
        &self,
        signer: &PrivateKeySigner,
        registration: &CustomTokenRegistration,
        tracker: &RetryableMessageTracker,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<()> {
        let provider = self.wallet_provider(signer)?;

        // Gateway half
        let gateway = CustomGateway::new(registration.custom_gateway, &provider);
        let gateway_value = match self.fee {
            FeeDenomination::Native => registration.gateway_fees.deposit,
            FeeDenomination::FeeToken(_) => U256::ZERO,
        };
        let pending = gateway
            .registerTokenToChild(
                registration.child_token,
                registration.gateway_fees.gas_limit,
                registration.gateway_fees.max_fee_per_gas,
                registration.gateway_fees.max_submission_cost,
                registration.credit_back_address,
            )
            .value(gateway_value)
            .send()
            .await?;
        let gateway_receipt = pending.get_receipt().await?;
        if !gateway_receipt.status() {
            return Err(BridgeError::TransactionReverted {
                action: "register token with gateway",
                tx_hash: gateway_receipt.transaction_hash,
            });
        }
        let gateway_ticket = tickets_from_receipt(&gateway_receipt)
            .into_iter()
            .next()
            .ok_or(BridgeError::NoTicketCreated {
                action: "register token with gateway",
                tx_hash: gateway_receipt.transaction_hash,
            })?;

        // Router half
        let router = GatewayRouter::new(self.router, &provider);
        let router_value = match self.fee {
            FeeDenomination::Native => registration.router_fees.deposit,
            FeeDenomination::FeeToken(_) => U256::ZERO,
        };
        let pending = router
            .setGateway(
                registration.custom_gateway,
                registration.router_fees.gas_limit,
                registration.router_fees.max_fee_per_gas,
                registration.router_fees.max_submission_cost,
                registration.credit_back_address,
            )
            .value(router_value)
            .send()
            .await?;
        let router_receipt = pending.get_receipt().await?;
        if !router_receipt.status() {
            return Err(BridgeError::TransactionReverted {
                action: "register gateway with router",
                tx_hash: router_receipt.transaction_hash,
            });
        }
        let router_ticket = tickets_from_receipt(&router_receipt)
            .into_iter()
            .next()
            .ok_or(BridgeError::NoTicketCreated {
                action: "register gateway with router",
                tx_hash: router_receipt.transaction_hash,
            })?;

        info!(
            token = %registration.token,
            gateway_ticket = %gateway_ticket.ticket_id,
            router_ticket = %router_ticket.ticket_id,
            "Registration tickets submitted, awaiting redemption"
        );

        // Both halves must reach a terminal state before judging the pair.
        let gateway_status = tracker
            .wait_for_status(gateway_ticket.ticket_id, poll_interval, timeout)
            .await?;
        let router_status = tracker
            .wait_for_status(router_ticket.ticket_id, poll_interval, timeout)
            .await?;

        if gateway_status == TicketStatus::Redeemed && router_status == TicketStatus::Redeemed {
            info!(token = %registration.token, "Custom token registration complete");
            return Ok(());
        }

        Err(BridgeError::RegistrationIncomplete {
            token: registration.token,
            gateway_status,
            router_status,
        })
    }

    fn wallet_provider(
        &self,
        signer: &PrivateKeySigner,
    ) -> Result<impl alloy::providers::Provider<alloy::transports::http::Http<alloy::transports::http::Client>>>
    {
        let wallet = alloy::network::EthereumWallet::from(signer.clone());
        let url = self
            .parent_rpc_url
            .parse()
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid RPC URL: {e}")))?;
        Ok(alloy::providers::ProviderBuilder::new()
            .wallet(wallet)
            .on_http(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_deposit_data_layout() {
        let fee = FeeDenomination::Native;
        let submission = U256::from(584_000_000_000u64);
        let hook = Bytes::new();

        let data = fee.encode_deposit_data(submission, &hook, U256::from(1u64));

        // (uint256, bytes): value word, offset word, length word
        assert_eq!(data.len(), 96);
        assert_eq!(U256::from_be_slice(&data[0..32]), submission);
        assert_eq!(U256::from_be_slice(&data[32..64]), U256::from(64u64)); // offset
        assert_eq!(U256::from_be_slice(&data[64..96]), U256::ZERO); // empty hook
    }

    #[test]
    fn test_fee_token_deposit_data_layout() {
        let fee = FeeDenomination::FeeToken(Address::repeat_byte(0x42));
        let submission = U256::ZERO;
        let fee_amount = U256::from(600_000_000u64);
        let hook = Bytes::new();

        let data = fee.encode_deposit_data(submission, &hook, fee_amount);

        // (uint256, bytes, uint256): value, offset, fee amount, length
        assert_eq!(data.len(), 128);
        assert_eq!(U256::from_be_slice(&data[0..32]), submission);
        assert_eq!(U256::from_be_slice(&data[32..64]), U256::from(96u64)); // offset
        assert_eq!(U256::from_be_slice(&data[64..96]), fee_amount);
        assert_eq!(U256::from_be_slice(&data[96..128]), U256::ZERO); // empty hook
    }

    #[test]
    fn test_deposit_data_with_hook_payload() {
        let fee = FeeDenomination::Native;
        let hook = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]);

        let data = fee.encode_deposit_data(U256::from(1u64), &hook, U256::ZERO);

        // Head + length word + one padded payload word
        assert_eq!(data.len(), 128);
        assert_eq!(U256::from_be_slice(&data[64..96]), U256::from(4u64));
        assert_eq!(&data[96..100], &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_fee_denomination_variants() {
        assert!(!FeeDenomination::Native.is_fee_token());
        assert!(FeeDenomination::FeeToken(Address::ZERO).is_fee_token());
    }
}
