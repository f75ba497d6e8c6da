//! Generic event fetching
//!
//! A parameterized log-query utility over a chain RPC endpoint. Queries are
//! chunked to respect RPC block-range limits and results come back in the
//! chain's canonical block/log order. `EventStream` layers a restartable
//! poll-and-diff cursor on top for consumers that follow a contract's events
//! over time.

use std::marker::PhantomData;
use std::time::Duration;

use alloy::primitives::{keccak256, Address};
use alloy::providers::Provider;
use alloy::rpc::types::{Filter, Log};
use tracing::debug;

use crate::error::Result;
use crate::evm::HttpProvider;

/// An event type that can be filtered by signature and decoded from a raw log.
pub trait TypedEvent: Sized {
    /// Solidity event signature, e.g. `"GatewaySet(address,address)"`.
    const SIGNATURE: &'static str;

    /// Decode from a raw log; `None` for logs that do not match.
    fn from_log(log: &Log) -> Option<Self>;

    /// Block the event was emitted in.
    fn block_number(&self) -> u64;

    /// Log index within the block.
    fn log_index(&self) -> u64;
}

/// Fetcher configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum block range per query (to avoid RPC limits)
    pub max_block_range: u64,
    /// Poll interval used by [`EventStream::poll_next_batch`]
    pub poll_interval: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_block_range: 10_000,
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Generic chunked log fetcher over one chain endpoint.
pub struct EventFetcher {
    provider: HttpProvider,
    config: FetchConfig,
}

impl EventFetcher {
    /// Create a fetcher with default configuration
    pub fn new(provider: HttpProvider) -> Self {
        Self {
            provider,
            config: FetchConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(provider: HttpProvider, config: FetchConfig) -> Self {
        Self { provider, config }
    }

    /// Get the current block number
    pub async fn current_block(&self) -> Result<u64> {
        let block = self.provider.get_block_number().await?;
        Ok(block)
    }

    /// Fetch all events of type `E` emitted by `address` in the block range,
    /// in canonical block/log-index order.
    pub async fn get_events<E: TypedEvent>(
        &self,
        address: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<E>> {
        let signature = keccak256(E::SIGNATURE.as_bytes());
        let mut events = Vec::new();
        let mut current_from = from_block;

        // Chunk into manageable ranges
        while current_from <= to_block {
            let current_to =
                std::cmp::min(current_from.saturating_add(self.config.max_block_range - 1), to_block);

            let filter = Filter::new()
                .address(address)
                .event_signature(signature)
                .from_block(current_from)
                .to_block(current_to);

            let logs = self.provider.get_logs(&filter).await?;
            events.extend(logs.iter().filter_map(E::from_log));

            if current_to == to_block {
                break;
            }
            current_from = current_to + 1;
        }

        events.sort_by_key(|e| (e.block_number(), e.log_index()));

        if !events.is_empty() {
            debug!(
                signature = E::SIGNATURE,
                count = events.len(),
                from = from_block,
                to = to_block,
                "Fetched events"
            );
        }

        Ok(events)
    }
}

/// Block range a cursor at `cursor` should scan against chain head `head`,
/// or `None` while the head has not reached the cursor.
pub fn batch_range(cursor: u64, head: u64) -> Option<(u64, u64)> {
    (head >= cursor).then_some((cursor, head))
}

/// Restartable lazy sequence of typed events.
///
/// Tracks a block-height cursor; each call to [`next_batch`] returns events
/// that appeared since the previous call and advances the cursor. The cursor
/// can be saved and a new stream resumed from it without losing events.
///
/// [`next_batch`]: EventStream::next_batch
pub struct EventStream<E: TypedEvent> {
    fetcher: EventFetcher,
    address: Address,
    cursor: u64,
    _marker: PhantomData<E>,
}

impl<E: TypedEvent> EventStream<E> {
    /// Start a stream at `start_block` (inclusive).
    pub fn new(provider: HttpProvider, address: Address, start_block: u64) -> Self {
        Self {
            fetcher: EventFetcher::new(provider),
            address,
            cursor: start_block,
            _marker: PhantomData,
        }
    }

    /// Next block the stream will inspect. Persist this to resume later.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Return the events emitted between the cursor and the chain head,
    /// advancing the cursor past them. Empty when no new blocks exist.
    pub async fn next_batch(&mut self) -> Result<Vec<E>> {
        let head = self.fetcher.current_block().await?;
        let Some((from, to)) = batch_range(self.cursor, head) else {
            return Ok(Vec::new());
        };

        let events = self.fetcher.get_events::<E>(self.address, from, to).await?;
        self.cursor = to + 1;
        Ok(events)
    }

    /// Like [`next_batch`](Self::next_batch), but sleeps the configured poll
    /// interval first when the chain head has not advanced.
    pub async fn poll_next_batch(&mut self) -> Result<Vec<E>> {
        let head = self.fetcher.current_block().await?;
        if head < self.cursor {
            tokio::time::sleep(self.fetcher.config.poll_interval).await;
        }
        self.next_batch().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.max_block_range, 10_000);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_chunk_bounds_cover_range_exactly() {
        // Mirror of the chunking arithmetic in get_events
        let max_range = 100u64;
        let (from, to) = (0u64, 250u64);

        let mut covered = Vec::new();
        let mut current_from = from;
        while current_from <= to {
            let current_to = std::cmp::min(current_from + max_range - 1, to);
            covered.push((current_from, current_to));
            current_from = current_to + 1;
        }

        assert_eq!(covered, vec![(0, 99), (100, 199), (200, 250)]);
    }

    #[test]
    fn test_batch_range_waits_for_the_head() {
        assert_eq!(batch_range(10, 9), None);
        assert_eq!(batch_range(10, 10), Some((10, 10)));
        assert_eq!(batch_range(10, 25), Some((10, 25)));
    }

    #[test]
    fn test_cursor_ranges_never_overlap_or_skip() {
        // Advance a cursor through a sequence of observed heads; every block
        // from the start must be scanned exactly once.
        let mut cursor = 5u64;
        let mut scanned = Vec::new();

        for head in [4, 5, 5, 9, 20] {
            if let Some((from, to)) = batch_range(cursor, head) {
                scanned.push((from, to));
                cursor = to + 1;
            }
        }

        assert_eq!(scanned, vec![(5, 5), (6, 9), (10, 20)]);
    }
}
