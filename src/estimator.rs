//! Cross-domain gas and fee estimation
//!
//! Computes the parameters that make a retryable ticket redeem on the first
//! attempt with high probability: a simulated gas limit, a max fee per gas,
//! the submission cost of writing the payload to the child chain, and the
//! total deposit covering all three.
//!
//! All safety margins are caller policy, exposed through
//! [`GasEstimateOptions`]. If the underlying simulation reverts the
//! estimator fails loudly; a ticket created from a reverted estimate would
//! be guaranteed to fail redemption.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use alloy::transports::RpcError;
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::evm::contracts::NodeInterface;
use crate::evm::{HttpProvider, NODE_INTERFACE_ADDRESS};
use crate::router::FeeDenomination;

/// Funding assumed by the simulation so the simulated ticket is solvent.
const ESTIMATION_FUNDING: u64 = 1_000_000_000_000_000_000; // 1 native unit

/// A prospective parent-to-child call to be priced.
#[derive(Debug, Clone)]
pub struct CrossChainCall {
    /// Parent-chain sender
    pub from: Address,
    /// Child-chain call target
    pub to: Address,
    /// Value forwarded to the target on the child chain
    pub child_call_value: U256,
    /// Calldata executed at the target
    pub data: Bytes,
    /// Receives unspent redemption gas funds
    pub excess_fee_refund_address: Address,
    /// Receives the call value if the ticket expires
    pub call_value_refund_address: Address,
}

/// Caller-tunable estimation policy.
///
/// The percent increases absorb state drift between estimation and
/// execution. Defaults are modest; callers bridging through congested or
/// fast-moving chains routinely apply much larger gas-limit margins.
#[derive(Debug, Clone)]
pub struct GasEstimateOptions {
    /// Percent added to the simulated gas limit
    pub gas_limit_percent_increase: u64,
    /// Floor applied after the percent increase
    pub min_gas_limit: u64,
    /// Percent added to the current child gas price
    pub max_fee_per_gas_percent_increase: u64,
    /// Percent added to the computed submission cost
    pub submission_fee_percent_increase: u64,
}

impl Default for GasEstimateOptions {
    fn default() -> Self {
        Self {
            gas_limit_percent_increase: 0,
            min_gas_limit: 5_000,
            max_fee_per_gas_percent_increase: 500,
            submission_fee_percent_increase: 300,
        }
    }
}

/// Add `percent` percent to `value`.
pub fn apply_percent_increase(value: U256, percent: u64) -> U256 {
    value + value * U256::from(percent) / U256::from(100u64)
}

/// Fee parameters sufficient for guaranteed execution. Ephemeral; recompute
/// per call rather than caching across submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    /// Gas budget for redemption on the child chain
    pub gas_limit: U256,
    /// Price ceiling for redemption gas
    pub max_fee_per_gas: U256,
    /// Cost of writing the ticket payload to the child chain
    pub max_submission_cost: U256,
    /// Total prepayment: `max_submission_cost + gas_limit * max_fee_per_gas`
    pub deposit: U256,
}

/// Estimates ticket parameters against the current state of both chains.
pub struct GasFeeEstimator {
    child_provider: HttpProvider,
    fee: FeeDenomination,
    options: GasEstimateOptions,
}

impl GasFeeEstimator {
    /// Create an estimator with default options.
    pub fn new(child_provider: HttpProvider, fee: FeeDenomination) -> Self {
        Self {
            child_provider,
            fee,
            options: GasEstimateOptions::default(),
        }
    }

    /// Create with custom estimation policy.
    pub fn with_options(
        child_provider: HttpProvider,
        fee: FeeDenomination,
        options: GasEstimateOptions,
    ) -> Self {
        Self {
            child_provider,
            fee,
            options,
        }
    }

    /// Cost of writing `calldata_len` bytes of ticket payload to the child
    /// chain, at the given parent-chain base fee.
    ///
    /// Fee-token chains decouple submission cost from data cost: the cost
    /// is zero there.
    pub fn estimate_submission_fee(&self, parent_base_fee: U256, calldata_len: usize) -> U256 {
        if self.fee.is_fee_token() {
            return U256::ZERO;
        }

        let raw = parent_base_fee * U256::from(1400 + 6 * calldata_len as u64);
        apply_percent_increase(raw, self.options.submission_fee_percent_increase)
    }

    /// Simulated redemption gas for the call, inflated per the options.
    ///
    /// Errors with [`BridgeError::EstimationFailed`] when the simulation
    /// reverts; the caller must not substitute a default.
    pub async fn estimate_gas_limit(&self, call: &CrossChainCall) -> Result<U256> {
        let calldata = NodeInterface::estimateRetryableTicketCall {
            sender: call.from,
            deposit: call.child_call_value + U256::from(ESTIMATION_FUNDING),
            to: call.to,
            childCallValue: call.child_call_value,
            excessFeeRefundAddress: call.excess_fee_refund_address,
            callValueRefundAddress: call.call_value_refund_address,
            data: call.data.clone(),
        }
        .abi_encode();

        let tx = TransactionRequest::default()
            .to(NODE_INTERFACE_ADDRESS)
            .input(Bytes::from(calldata).into());

        let gas = match self.child_provider.estimate_gas(&tx).await {
            Ok(gas) => gas,
            Err(RpcError::ErrorResp(payload)) => {
                return Err(BridgeError::EstimationFailed {
                    to: call.to,
                    reason: payload.message.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let inflated = apply_percent_increase(
            U256::from(gas),
            self.options.gas_limit_percent_increase,
        );
        Ok(inflated.max(U256::from(self.options.min_gas_limit)))
    }

    /// Gas price ceiling for redemption, from the child chain's current
    /// price plus the configured margin.
    pub async fn estimate_max_fee_per_gas(&self) -> Result<U256> {
        let gas_price = self.child_provider.get_gas_price().await?;
        Ok(apply_percent_increase(
            U256::from(gas_price),
            self.options.max_fee_per_gas_percent_increase,
        ))
    }

    /// Estimate everything a ticket submission needs.
    pub async fn estimate_all(
        &self,
        call: &CrossChainCall,
        parent_base_fee: U256,
    ) -> Result<FeeEstimate> {
        let max_submission_cost = self.estimate_submission_fee(parent_base_fee, call.data.len());
        let gas_limit = self.estimate_gas_limit(call).await?;
        let max_fee_per_gas = self.estimate_max_fee_per_gas().await?;

        let deposit = max_submission_cost + gas_limit * max_fee_per_gas;

        debug!(
            to = %call.to,
            gas_limit = %gas_limit,
            max_fee_per_gas = %max_fee_per_gas,
            max_submission_cost = %max_submission_cost,
            deposit = %deposit,
            "Estimated retryable ticket parameters"
        );

        Ok(FeeEstimate {
            gas_limit,
            max_fee_per_gas,
            max_submission_cost,
            deposit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native_estimator() -> GasFeeEstimator {
        let provider = crate::evm::http_provider("http://localhost:8547").unwrap();
        GasFeeEstimator::new(provider, FeeDenomination::Native)
    }

    fn fee_token_estimator() -> GasFeeEstimator {
        let provider = crate::evm::http_provider("http://localhost:8547").unwrap();
        GasFeeEstimator::new(
            provider,
            FeeDenomination::FeeToken(Address::repeat_byte(0x42)),
        )
    }

    #[test]
    fn test_submission_fee_scales_with_calldata() {
        let estimator = GasFeeEstimator::with_options(
            crate::evm::http_provider("http://localhost:8547").unwrap(),
            FeeDenomination::Native,
            GasEstimateOptions {
                submission_fee_percent_increase: 0,
                ..Default::default()
            },
        );

        let base_fee = U256::from(100u64);
        let empty = estimator.estimate_submission_fee(base_fee, 0);
        let sized = estimator.estimate_submission_fee(base_fee, 100);

        assert_eq!(empty, U256::from(140_000u64)); // 100 * 1400
        assert_eq!(sized, U256::from(200_000u64)); // 100 * (1400 + 600)
    }

    #[test]
    fn test_submission_fee_percent_increase() {
        let estimator = native_estimator();

        // Default policy adds 300%
        let fee = estimator.estimate_submission_fee(U256::from(100u64), 0);
        assert_eq!(fee, U256::from(560_000u64)); // 140_000 * 4
    }

    #[test]
    fn test_fee_token_submission_cost_is_zero() {
        let estimator = fee_token_estimator();
        let fee = estimator.estimate_submission_fee(U256::from(1_000_000u64), 512);
        assert_eq!(fee, U256::ZERO);
    }

    #[test]
    fn test_apply_percent_increase() {
        assert_eq!(
            apply_percent_increase(U256::from(100u64), 0),
            U256::from(100u64)
        );
        assert_eq!(
            apply_percent_increase(U256::from(100u64), 50),
            U256::from(150u64)
        );
        assert_eq!(
            apply_percent_increase(U256::from(100u64), 500),
            U256::from(600u64)
        );
    }

    #[test]
    fn test_deposit_formula() {
        // deposit = maxSubmissionCost + gasLimit * maxFeePerGas
        let estimate = FeeEstimate {
            gas_limit: U256::from(1_000_000u64),
            max_fee_per_gas: U256::from(3u64),
            max_submission_cost: U256::from(584u64),
            deposit: U256::from(584u64) + U256::from(1_000_000u64) * U256::from(3u64),
        };
        assert_eq!(estimate.deposit, U256::from(3_000_584u64));
    }

    #[test]
    fn test_default_options() {
        let options = GasEstimateOptions::default();
        assert_eq!(options.gas_limit_percent_increase, 0);
        assert_eq!(options.min_gas_limit, 5_000);
        assert_eq!(options.max_fee_per_gas_percent_increase, 500);
        assert_eq!(options.submission_fee_percent_increase, 300);
    }
}
