//! Common test assertions
//!
//! Balance bookkeeping helpers for E2E tests: deposits must move exactly
//! the deposited amount out of the depositor, into the gateway escrow, and
//! onto the child-chain recipient.

use alloy::primitives::U256;
use eyre::{eyre, Result};

/// Assert that a balance decreased by exactly `expected`.
pub fn assert_balance_decreased_by(before: U256, after: U256, expected: U256) -> Result<()> {
    let actual = before.checked_sub(after).ok_or_else(|| {
        eyre!(
            "Balance increased when a decrease was expected (before: {}, after: {})",
            before,
            after
        )
    })?;

    if actual != expected {
        return Err(eyre!(
            "Balance decrease mismatch: expected {}, got {} (before: {}, after: {})",
            expected,
            actual,
            before,
            after
        ));
    }
    Ok(())
}

/// Assert that a balance increased by exactly `expected`.
pub fn assert_balance_increased_by(before: U256, after: U256, expected: U256) -> Result<()> {
    let actual = after.checked_sub(before).ok_or_else(|| {
        eyre!(
            "Balance decreased when an increase was expected (before: {}, after: {})",
            before,
            after
        )
    })?;

    if actual != expected {
        return Err(eyre!(
            "Balance increase mismatch: expected {}, got {} (before: {}, after: {})",
            expected,
            actual,
            before,
            after
        ));
    }
    Ok(())
}

/// Assert that a balance did not move.
pub fn assert_balance_unchanged(before: U256, after: U256) -> Result<()> {
    if before != after {
        return Err(eyre!(
            "Balance changed unexpectedly (before: {}, after: {})",
            before,
            after
        ));
    }
    Ok(())
}

/// Wait for a condition to be true, with timeout and polling
pub async fn wait_for_condition<F, Fut>(
    condition_name: &str,
    check_fn: F,
    timeout_secs: u64,
    poll_interval_ms: u64,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<bool>>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(timeout_secs);
    let poll_interval = std::time::Duration::from_millis(poll_interval_ms);

    loop {
        match check_fn().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Error checking condition {}", condition_name);
            }
        }

        if start.elapsed() >= timeout {
            return Err(eyre!(
                "Timeout waiting for condition '{}' after {}s",
                condition_name,
                timeout_secs
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}
