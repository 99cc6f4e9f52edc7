// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Redis register store
//!
//! The bus reader publishes register values into Redis and drains staged
//! writes from it; this backend is the web service's side of that exchange.
//! The multiplexed connection is opened lazily and dropped after any failed
//! command so the next call reconnects.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, Cmd, FromRedisValue, RedisResult};
use tokio::sync::RwLock;
use tokio::time::error::Elapsed;
use tokio::time::timeout;

use super::RegisterStore;
use crate::error::CacheError;

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 100;

/// Redis backed [`RegisterStore`].
pub struct RedisStore {
    url: String,
    client: Client,
    connection: RwLock<Option<MultiplexedConnection>>,
    timeout: Duration,
}

impl RedisStore {
    /// Create a store for `url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// No connection is attempted until the first command.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CacheError> {
        let url = url.into();
        let client = Client::open(url.as_str())?;
        Ok(Self {
            url,
            client,
            connection: RwLock::new(None),
            timeout,
        })
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let mut guard = self.connection.write().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = match timeout(self.timeout, self.client.get_multiplexed_async_connection()).await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                warn!("Redis connection to {} failed: {}", self.url, e);
                return Err(CacheError::Connection(e.to_string()));
            }
            Err(_) => {
                warn!("Redis connection to {} timed out", self.url);
                return Err(CacheError::Timeout(self.timeout_ms()));
            }
        };
        info!("Connected to Redis at {}", self.url);
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn reset(&self) {
        *self.connection.write().await = None;
    }

    /// Map the outcome of one command, dropping the connection on failure.
    async fn settle<T>(
        &self,
        outcome: Result<RedisResult<T>, Elapsed>,
    ) -> Result<T, CacheError> {
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                debug!("Redis command failed, dropping connection: {}", e);
                self.reset().await;
                Err(CacheError::Command(e))
            }
            Err(_) => {
                self.reset().await;
                Err(CacheError::Timeout(self.timeout_ms()))
            }
        }
    }

    async fn run<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, CacheError> {
        let mut conn = self.connection().await?;
        let outcome = timeout(self.timeout, cmd.query_async(&mut conn)).await;
        self.settle(outcome).await
    }
}

#[async_trait]
impl RegisterStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let outcome = timeout(self.timeout, conn.get::<_, Option<String>>(key)).await;
        self.settle(outcome).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let outcome = timeout(self.timeout, conn.set::<_, _, ()>(key, value)).await;
        self.settle(outcome).await
    }

    /// Cursor driven `SCAN MATCH`, each round trip under the command timeout.
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let mut cmd = redis::cmd("SCAN");
            cmd.arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH);
            let (next, batch): (u64, Vec<String>) = self.run(&cmd).await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let outcome = timeout(self.timeout, conn.del::<_, i64>(key)).await;
        let removed = self.settle(outcome).await?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let pong: String = self.run(&redis::cmd("PING")).await?;
        debug!("Redis answered {}", pong);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(RedisStore::new("not a url", Duration::from_millis(100)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_errors() {
        // Nothing listens on port 1
        let store = RedisStore::new("redis://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        assert!(store.ping().await.is_err());
        assert!(store.get("modbus:5:reg2").await.is_err());
        assert!(store.set("modbus:write:5:2", "125").await.is_err());
        assert!(store.delete("modbus:result:5:2").await.is_err());
        assert!(store.scan("modbus:result:*").await.is_err());
        assert!(store.connection.read().await.is_none());
    }
}
