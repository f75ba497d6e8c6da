//! Testing utilities (feature-gated)
//!
//! Helpers for end-to-end tests against a running chain pair. Enable with
//! the `testing` feature:
//!
//! ```toml
//! [dev-dependencies]
//! tokenbridge-rs = { path = "../tokenbridge-rs", features = ["testing"] }
//! ```

pub mod assertions;

pub use assertions::{
    assert_balance_decreased_by, assert_balance_increased_by, assert_balance_unchanged,
    wait_for_condition,
};
