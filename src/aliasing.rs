//! Address aliasing
//!
//! A parent-chain contract calling into the child chain is observed there
//! under a shifted address, so it can never be confused with (or forge) a
//! child-chain account at the same address. The transform is a fixed offset
//! added modulo 2^160; both directions are total functions over the address
//! space and wrap silently.

use alloy::primitives::{address, Address, U256};

/// Offset applied to a parent-chain sender when it appears on the child chain.
pub const ADDRESS_ALIAS_OFFSET: Address = address!("1111000000000000000000000000000000001111");

/// Low 160 bits of a 256-bit word.
const ADDRESS_MASK: U256 = U256::from_limbs([u64::MAX, u64::MAX, u32::MAX as u64, 0]);

fn to_u256(addr: Address) -> U256 {
    U256::from_be_slice(addr.as_slice())
}

fn to_address(value: U256) -> Address {
    let masked = value & ADDRESS_MASK;
    let bytes = masked.to_be_bytes::<32>();
    Address::from_slice(&bytes[12..])
}

/// Child-chain alias of a parent-chain address.
pub fn apply_alias(parent: Address) -> Address {
    to_address(to_u256(parent).wrapping_add(to_u256(ADDRESS_ALIAS_OFFSET)))
}

/// Parent-chain address behind a child-chain alias.
pub fn undo_alias(child: Address) -> Address {
    to_address(to_u256(child).wrapping_sub(to_u256(ADDRESS_ALIAS_OFFSET)))
}
