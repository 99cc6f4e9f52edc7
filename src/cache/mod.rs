// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register cache gateway
//!
//! The web service never talks to the field bus. A separate Modbus process
//! mirrors every holding register into a key-value store, executes the
//! writes staged there and posts a confirmation key for each of them. This
//! module wraps that store:
//!
//! - [`RegisterStore`]: the raw key-value operations a backend provides
//!   ([`RedisStore`] in production, [`InMemoryStore`] for tests and demos)
//! - [`CacheGateway`]: register-level operations built on top of it (read
//!   by address, stage a write, list pending writes, drain confirmations)
//!
//! Store failures never escape the read path: an unreachable store reads as
//! an absent register, which callers treat as "no device".

pub mod keys;
pub mod memory;
pub mod redis;
pub mod retry;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::registers::RegisterAddress;

pub use self::memory::InMemoryStore;
pub use self::redis::RedisStore;
pub use self::retry::{PollSchedule, Poller};

/// Key written by the liveness probe.
pub const DEFAULT_HEALTH_CHECK_KEY: &str = "health_check_key";
/// Budget of a confirmation drain.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(15);
/// Delay between two confirmation scans.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// URL scheme selecting the in-process store.
const MEMORY_SCHEME: &str = "memory://";

/// Raw key-value operations of a register store backend.
#[async_trait]
pub trait RegisterStore: Send + Sync {
    /// Value stored at `key`, `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Create or overwrite `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Every key matching a glob `pattern`.
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// Remove `key`, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Round trip to the store.
    async fn ping(&self) -> Result<(), CacheError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Register-level access to the cache shared with the Modbus process.
#[derive(Clone)]
pub struct CacheGateway {
    store: Arc<dyn RegisterStore>,
    health_check_key: String,
    confirmation: PollSchedule,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn RegisterStore>) -> Self {
        Self {
            store,
            health_check_key: DEFAULT_HEALTH_CHECK_KEY.to_string(),
            confirmation: PollSchedule::new(DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_POLL_INTERVAL),
        }
    }

    /// Build the gateway described by the `cache` configuration section.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let store: Arc<dyn RegisterStore> = if config.url.starts_with(MEMORY_SCHEME) {
            info!("Using in-memory register store");
            Arc::new(InMemoryStore::new())
        } else {
            info!("Using Redis register store at {}", config.url);
            Arc::new(RedisStore::new(
                config.url.clone(),
                Duration::from_millis(config.timeout_ms),
            )?)
        };

        Ok(Self::new(store)
            .with_health_check_key(config.health_check_key.clone())
            .with_confirmation_schedule(PollSchedule::new(
                Duration::from_millis(config.confirmation_timeout_ms),
                Duration::from_millis(config.poll_interval_ms),
            )))
    }

    pub fn with_health_check_key(mut self, key: impl Into<String>) -> Self {
        self.health_check_key = key.into();
        self
    }

    pub fn with_confirmation_schedule(mut self, schedule: PollSchedule) -> Self {
        self.confirmation = schedule;
        self
    }

    pub fn confirmation_schedule(&self) -> PollSchedule {
        self.confirmation
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Raw value of a register, `None` when absent or when the store is
    /// unreachable.
    pub async fn read_register(&self, address: RegisterAddress) -> Option<String> {
        self.read_key(&keys::read_key(address.device_id, address.offset))
            .await
    }

    /// Raw value of an arbitrary key, `None` when absent or unreachable.
    pub async fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                debug!("Reading {} failed: {}", key, e);
                None
            }
        }
    }

    /// Liveness probe: writes the health check key. Never fails.
    pub async fn is_alive(&self) -> bool {
        match self.store.set(&self.health_check_key, "1").await {
            Ok(()) => true,
            Err(e) => {
                warn!("Register cache ({}) is unreachable: {}", self.backend(), e);
                false
            }
        }
    }

    /// Read-only round trip, used by the health endpoint.
    pub async fn ping(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    /// Stage `value` for the bus writer. Re-staging overwrites.
    pub async fn stage_write(&self, address: RegisterAddress, value: i64) -> Result<(), CacheError> {
        let key = keys::write_key(address);
        debug!("Staging {} = {}", key, value);
        self.store.set(&key, &value.to_string()).await
    }

    /// Registers with a staged write the bus writer has not consumed yet.
    pub async fn list_pending_writes(&self) -> Result<BTreeSet<RegisterAddress>, CacheError> {
        let staged = self.store.scan(keys::WRITE_PATTERN).await?;
        Ok(staged
            .iter()
            .filter_map(|key| {
                let address = keys::parse_write_key(key);
                if address.is_none() {
                    warn!("Ignoring malformed staged write key {}", key);
                }
                address
            })
            .collect())
    }

    /// Consume confirmations until one has been seen for every write pending
    /// at call time, or `max_wait` elapses. Returns the number consumed.
    pub async fn drain_confirmations(&self, max_wait: Duration) -> usize {
        let expected = match self.list_pending_writes().await {
            Ok(pending) => pending.len(),
            Err(e) => {
                warn!("Cannot list pending writes: {}", e);
                return 0;
            }
        };
        let schedule = PollSchedule::new(max_wait, self.confirmation.interval);
        self.drain_confirmations_up_to(expected, schedule).await
    }

    /// Consume confirmations until `expected` have been seen or the schedule
    /// is exhausted. Returns the number consumed.
    pub async fn drain_confirmations_up_to(&self, expected: usize, schedule: PollSchedule) -> usize {
        let mut consumed = 0;
        let mut poller = Poller::start(schedule);
        while poller.next_pass().await {
            match self.consume_confirmations().await {
                Ok(count) => consumed += count,
                Err(e) => {
                    warn!("Confirmation scan aborted: {}", e);
                    break;
                }
            }
            if consumed >= expected {
                break;
            }
        }
        debug!(
            "Drained {}/{} confirmation(s) in {} pass(es), {:?}",
            consumed,
            expected,
            poller.passes(),
            poller.elapsed()
        );
        consumed
    }

    /// One scan pass: delete every confirmation currently present.
    async fn consume_confirmations(&self) -> Result<usize, CacheError> {
        let mut count = 0;
        for key in self.store.scan(keys::RESULT_PATTERN).await? {
            if self.store.delete(&key).await? {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> (Arc<InMemoryStore>, CacheGateway) {
        let store = Arc::new(InMemoryStore::new());
        let gateway = CacheGateway::new(store.clone());
        (store, gateway)
    }

    #[tokio::test]
    async fn test_read_register_distinguishes_absent_from_zero() {
        let (store, gateway) = gateway();
        let address = RegisterAddress::new(5, 23);
        assert_eq!(gateway.read_register(address).await, None);

        store.set_register(address, 0);
        assert_eq!(gateway.read_register(address).await.as_deref(), Some("0"));

        store.set_offline(true);
        assert_eq!(gateway.read_register(address).await, None);
    }

    #[tokio::test]
    async fn test_is_alive_writes_health_key() {
        let (store, gateway) = gateway();
        assert!(gateway.is_alive().await);
        assert_eq!(store.value(DEFAULT_HEALTH_CHECK_KEY).as_deref(), Some("1"));

        store.set_offline(true);
        assert!(!gateway.is_alive().await);
        assert!(!gateway.ping().await);
    }

    #[tokio::test]
    async fn test_stage_write_is_idempotent_upsert() {
        let (store, gateway) = gateway();
        let address = RegisterAddress::new(6, 4);
        gateway.stage_write(address, 5000).await.unwrap();
        gateway.stage_write(address, 5000).await.unwrap();
        gateway.stage_write(address, 4000).await.unwrap();

        assert_eq!(store.value("modbus:write:6:4").as_deref(), Some("4000"));
        let pending = gateway.list_pending_writes().await.unwrap();
        assert_eq!(pending.into_iter().collect::<Vec<_>>(), vec![address]);
    }

    #[tokio::test]
    async fn test_list_pending_writes_skips_malformed_keys() {
        let (store, gateway) = gateway();
        store.insert("modbus:write:5:2", "1");
        store.insert("modbus:write:5:SLAVEID", "1");
        let pending = gateway.list_pending_writes().await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_stops_once_every_write_is_confirmed() {
        let (store, gateway) = gateway();
        gateway.stage_write(RegisterAddress::new(5, 2), 125).await.unwrap();
        gateway.stage_write(RegisterAddress::new(5, 3), 400).await.unwrap();
        store.complete_pending_writes();
        store.insert("modbus:write:5:4", "5000");

        // Two confirmations present, one write still pending at call time
        let consumed = gateway
            .drain_confirmations_up_to(2, PollSchedule::new(Duration::from_secs(15), DEFAULT_POLL_INTERVAL))
            .await;
        assert_eq!(consumed, 2);
        assert!(store.keys_matching(keys::RESULT_PATTERN).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_gives_up_after_max_wait() {
        let (store, gateway) = gateway();
        store.insert("modbus:write:5:2", "125");
        store.insert("modbus:write:5:3", "400");
        store.insert("modbus:result:5:2", "OK");

        let started = tokio::time::Instant::now();
        let consumed = gateway.drain_confirmations(Duration::from_secs(2)).await;
        assert_eq!(consumed, 1);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_drain_with_offline_store_returns_zero() {
        let (store, gateway) = gateway();
        store.set_offline(true);
        assert_eq!(gateway.drain_confirmations(Duration::from_secs(1)).await, 0);
    }
}
