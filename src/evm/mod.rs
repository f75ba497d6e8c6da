//! EVM chain plumbing: RPC clients, contract bindings, typed events.

pub mod client;
pub mod contracts;
pub mod events;

pub use client::{get_base_fee, http_provider, parse_signer, EvmClient, HttpProvider};
pub use contracts::{CHILD_SYSTEM_ADDRESS, NODE_INTERFACE_ADDRESS, RETRYABLE_TX_ADDRESS};
