//! Typed bridge events
//!
//! Provides typed structures and raw-log parsers for every event the bridge
//! core consumes: ticket creation and redemption, rollup node lifecycle,
//! gateway deposits and withdrawals, and outgoing child-to-parent messages.
//!
//! Parsers are total over malformed logs: anything that does not match the
//! expected topic/data layout yields `None` rather than an error.

use alloy::primitives::{Address, Bytes, FixedBytes, U256};
use alloy::rpc::types::Log;
use serde::{Deserialize, Serialize};

use crate::fetcher::TypedEvent;

/// Provenance shared by every parsed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Block number where the event was emitted
    pub block_number: u64,
    /// Transaction hash
    pub tx_hash: FixedBytes<32>,
    /// Log index within the block
    pub log_index: u64,
}

impl EventMeta {
    fn from_log(log: &Log) -> Option<Self> {
        Some(Self {
            block_number: log.block_number?,
            tx_hash: log.transaction_hash?,
            log_index: log.log_index?,
        })
    }
}

fn address_at(data: &[u8], word: usize) -> Option<Address> {
    let start = word * 32;
    let bytes: [u8; 20] = data.get(start + 12..start + 32)?.try_into().ok()?;
    Some(Address::from(bytes))
}

fn u256_at(data: &[u8], word: usize) -> Option<U256> {
    let start = word * 32;
    Some(U256::from_be_slice(data.get(start..start + 32)?))
}

fn u64_at(data: &[u8], word: usize) -> Option<u64> {
    let start = word * 32;
    Some(u64::from_be_bytes(
        data.get(start + 24..start + 32)?.try_into().ok()?,
    ))
}

/// Trailing dynamic `bytes` field: length word at `len_word`, payload after.
fn bytes_at(data: &[u8], len_word: usize) -> Option<Bytes> {
    let len: usize = u256_at(data, len_word)?.try_into().ok()?;
    let start = (len_word + 1) * 32;
    Some(Bytes::copy_from_slice(data.get(start..start + len)?))
}

// ============================================================================
// Ticket lifecycle events
// ============================================================================

/// Inbox `TicketCreated` event.
///
/// Event: TicketCreated(bytes32 indexed ticketId, address indexed sender,
///                      address destination, uint256 messageNumber,
///                      uint256 childCallValue, uint256 maxSubmissionCost,
///                      uint256 gasLimit, uint256 maxFeePerGas,
///                      address excessFeeRefundAddress,
///                      address callValueRefundAddress,
///                      uint256 depositValue, bytes data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCreatedEvent {
    /// Ticket identifier, also derivable from the message number
    pub ticket_id: FixedBytes<32>,
    /// Parent-chain sender (unaliased)
    pub sender: Address,
    /// Child-chain call target
    pub destination: Address,
    /// Auto-incrementing inbox message number
    pub message_number: U256,
    /// Value forwarded to the destination on the child chain
    pub child_call_value: U256,
    /// Prepaid cost of writing the payload to the child chain
    pub max_submission_cost: U256,
    /// Gas budget for redemption
    pub gas_limit: U256,
    /// Price ceiling for redemption gas
    pub max_fee_per_gas: U256,
    /// Receives unspent redemption gas funds
    pub excess_fee_refund_address: Address,
    /// Receives the call value if the ticket expires
    pub call_value_refund_address: Address,
    /// Total value escrowed with the ticket
    pub deposit_value: U256,
    /// Calldata executed at the destination
    pub data: Bytes,
    pub meta: EventMeta,
}

pub fn parse_ticket_created_log(log: &Log) -> Option<TicketCreatedEvent> {
    let topics = log.topics();
    if topics.len() < 3 {
        return None;
    }

    let data = log.data().data.as_ref();
    if data.len() < 352 {
        return None;
    }

    Some(TicketCreatedEvent {
        ticket_id: topics[1],
        sender: Address::from_slice(&topics[2][12..]),
        destination: address_at(data, 0)?,
        message_number: u256_at(data, 1)?,
        child_call_value: u256_at(data, 2)?,
        max_submission_cost: u256_at(data, 3)?,
        gas_limit: u256_at(data, 4)?,
        max_fee_per_gas: u256_at(data, 5)?,
        excess_fee_refund_address: address_at(data, 6)?,
        call_value_refund_address: address_at(data, 7)?,
        deposit_value: u256_at(data, 8)?,
        data: bytes_at(data, 10)?,
        meta: EventMeta::from_log(log)?,
    })
}

/// RetryableTx `TicketRedeemed` event.
///
/// Event: TicketRedeemed(bytes32 indexed ticketId, address indexed redeemer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRedeemedEvent {
    pub ticket_id: FixedBytes<32>,
    pub redeemer: Address,
    pub meta: EventMeta,
}

pub fn parse_ticket_redeemed_log(log: &Log) -> Option<TicketRedeemedEvent> {
    let topics = log.topics();
    if topics.len() < 3 {
        return None;
    }

    Some(TicketRedeemedEvent {
        ticket_id: topics[1],
        redeemer: Address::from_slice(&topics[2][12..]),
        meta: EventMeta::from_log(log)?,
    })
}

// ============================================================================
// Rollup node lifecycle events
// ============================================================================

/// Rollup `NodeCreated` event.
///
/// Event: NodeCreated(uint64 indexed nodeNum, bytes32 indexed parentNodeHash,
///                    bytes32 nodeHash, uint256 childBlockEnd)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCreatedEvent {
    pub node_num: u64,
    pub parent_node_hash: FixedBytes<32>,
    pub node_hash: FixedBytes<32>,
    /// Highest child block covered by this assertion
    pub child_block_end: u64,
    pub meta: EventMeta,
}

pub fn parse_node_created_log(log: &Log) -> Option<NodeCreatedEvent> {
    let topics = log.topics();
    if topics.len() < 3 {
        return None;
    }

    let data = log.data().data.as_ref();
    if data.len() < 64 {
        return None;
    }

    let node_num = u64::from_be_bytes(topics[1][24..32].try_into().ok()?);
    let node_hash = FixedBytes::<32>::from_slice(data.get(0..32)?);

    Some(NodeCreatedEvent {
        node_num,
        parent_node_hash: topics[2],
        node_hash,
        child_block_end: u64_at(data, 1)?,
        meta: EventMeta::from_log(log)?,
    })
}

/// Rollup `NodeConfirmed` event.
///
/// Event: NodeConfirmed(uint64 indexed nodeNum, bytes32 blockHash, bytes32 sendRoot)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfirmedEvent {
    pub node_num: u64,
    pub block_hash: FixedBytes<32>,
    pub send_root: FixedBytes<32>,
    pub meta: EventMeta,
}

pub fn parse_node_confirmed_log(log: &Log) -> Option<NodeConfirmedEvent> {
    let topics = log.topics();
    if topics.len() < 2 {
        return None;
    }

    let data = log.data().data.as_ref();
    if data.len() < 64 {
        return None;
    }

    Some(NodeConfirmedEvent {
        node_num: u64::from_be_bytes(topics[1][24..32].try_into().ok()?),
        block_hash: FixedBytes::<32>::from_slice(data.get(0..32)?),
        send_root: FixedBytes::<32>::from_slice(data.get(32..64)?),
        meta: EventMeta::from_log(log)?,
    })
}

// ============================================================================
// Gateway events
// ============================================================================

/// TokenGateway `DepositInitiated` event.
///
/// Event: DepositInitiated(address indexed token, address indexed from,
///                         address indexed to, uint256 sequenceNumber,
///                         uint256 amount)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositInitiatedEvent {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub sequence_number: U256,
    pub amount: U256,
    pub meta: EventMeta,
}

pub fn parse_deposit_initiated_log(log: &Log) -> Option<DepositInitiatedEvent> {
    let topics = log.topics();
    if topics.len() < 4 {
        return None;
    }

    let data = log.data().data.as_ref();
    if data.len() < 64 {
        return None;
    }

    Some(DepositInitiatedEvent {
        token: Address::from_slice(&topics[1][12..]),
        from: Address::from_slice(&topics[2][12..]),
        to: Address::from_slice(&topics[3][12..]),
        sequence_number: u256_at(data, 0)?,
        amount: u256_at(data, 1)?,
        meta: EventMeta::from_log(log)?,
    })
}

/// TokenGateway `WithdrawalInitiated` event.
///
/// Event: WithdrawalInitiated(address token, address indexed from,
///                            address indexed to, uint256 indexed exitNum,
///                            uint256 amount)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalInitiatedEvent {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub exit_num: U256,
    pub amount: U256,
    pub meta: EventMeta,
}

pub fn parse_withdrawal_initiated_log(log: &Log) -> Option<WithdrawalInitiatedEvent> {
    let topics = log.topics();
    if topics.len() < 4 {
        return None;
    }

    let data = log.data().data.as_ref();
    if data.len() < 64 {
        return None;
    }

    Some(WithdrawalInitiatedEvent {
        token: address_at(data, 0)?,
        from: Address::from_slice(&topics[1][12..]),
        to: Address::from_slice(&topics[2][12..]),
        exit_num: U256::from_be_slice(topics[3].as_slice()),
        amount: u256_at(data, 1)?,
        meta: EventMeta::from_log(log)?,
    })
}

/// GatewayRouter `GatewaySet` event.
///
/// Event: GatewaySet(address indexed token, address indexed gateway)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySetEvent {
    pub token: Address,
    pub gateway: Address,
    pub meta: EventMeta,
}

pub fn parse_gateway_set_log(log: &Log) -> Option<GatewaySetEvent> {
    let topics = log.topics();
    if topics.len() < 3 {
        return None;
    }

    Some(GatewaySetEvent {
        token: Address::from_slice(&topics[1][12..]),
        gateway: Address::from_slice(&topics[2][12..]),
        meta: EventMeta::from_log(log)?,
    })
}

// ============================================================================
// Outgoing message events
// ============================================================================

/// ChildSystem `ParentMessageSent` event.
///
/// Event: ParentMessageSent(bytes32 indexed messageId, address indexed sender,
///                          address indexed destination, uint256 position,
///                          uint256 batchNumber, uint256 childBlock, bytes data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentMessageSentEvent {
    pub message_id: FixedBytes<32>,
    pub sender: Address,
    pub destination: Address,
    /// Outbox slot the message will occupy on the parent chain
    pub position: U256,
    pub batch_number: U256,
    /// Child block in which the message was emitted
    pub child_block: u64,
    pub data: Bytes,
    pub meta: EventMeta,
}

pub fn parse_parent_message_sent_log(log: &Log) -> Option<ParentMessageSentEvent> {
    let topics = log.topics();
    if topics.len() < 4 {
        return None;
    }

    let data = log.data().data.as_ref();
    if data.len() < 160 {
        return None;
    }

    Some(ParentMessageSentEvent {
        message_id: topics[1],
        sender: Address::from_slice(&topics[2][12..]),
        destination: Address::from_slice(&topics[3][12..]),
        position: u256_at(data, 0)?,
        batch_number: u256_at(data, 1)?,
        child_block: u64_at(data, 2)?,
        data: bytes_at(data, 4)?,
        meta: EventMeta::from_log(log)?,
    })
}

// ============================================================================
// TypedEvent wiring for the fetcher
// ============================================================================

macro_rules! impl_typed_event {
    ($event:ty, $signature:literal, $parser:path) => {
        impl TypedEvent for $event {
            const SIGNATURE: &'static str = $signature;

            fn from_log(log: &Log) -> Option<Self> {
                $parser(log)
            }

            fn block_number(&self) -> u64 {
                self.meta.block_number
            }

            fn log_index(&self) -> u64 {
                self.meta.log_index
            }
        }
    };
}

impl_typed_event!(
    TicketCreatedEvent,
    "TicketCreated(bytes32,address,address,uint256,uint256,uint256,uint256,uint256,address,address,uint256,bytes)",
    parse_ticket_created_log
);
impl_typed_event!(
    TicketRedeemedEvent,
    "TicketRedeemed(bytes32,address)",
    parse_ticket_redeemed_log
);
impl_typed_event!(
    NodeCreatedEvent,
    "NodeCreated(uint64,bytes32,bytes32,uint256)",
    parse_node_created_log
);
impl_typed_event!(
    NodeConfirmedEvent,
    "NodeConfirmed(uint64,bytes32,bytes32)",
    parse_node_confirmed_log
);
impl_typed_event!(
    DepositInitiatedEvent,
    "DepositInitiated(address,address,address,uint256,uint256)",
    parse_deposit_initiated_log
);
impl_typed_event!(
    WithdrawalInitiatedEvent,
    "WithdrawalInitiated(address,address,address,uint256,uint256)",
    parse_withdrawal_initiated_log
);
impl_typed_event!(
    GatewaySetEvent,
    "GatewaySet(address,address)",
    parse_gateway_set_log
);
impl_typed_event!(
    ParentMessageSentEvent,
    "ParentMessageSent(bytes32,address,address,uint256,uint256,uint256,bytes)",
    parse_parent_message_sent_log
);
