// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-tanklevel project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! In-process register store
//!
//! Mirrors the Redis key semantics with a `HashMap`. Used by the test suite
//! and selectable at runtime with a `memory://` cache URL to run the web
//! interface without a Redis server or field bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use log::debug;

use super::{keys, RegisterStore};
use crate::error::CacheError;
use crate::registers::RegisterAddress;

/// `HashMap` backed [`RegisterStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CacheError::Connection("in-memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    /// Simulate a store outage: every operation fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Store a raw value under an arbitrary key.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries().insert(key.into(), value.into());
    }

    /// Publish a register value the way the bus reader does.
    pub fn set_register(&self, address: RegisterAddress, value: impl ToString) {
        self.insert(keys::read_key(address.device_id, address.offset), value.to_string());
    }

    /// Current raw value of a key, ignoring the offline flag.
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    /// Keys matching a glob pattern, sorted.
    pub fn keys_matching(&self, pattern: &str) -> Vec<String> {
        let mut matched: Vec<String> = self
            .entries()
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        matched.sort();
        matched
    }

    /// Play the external bus writer: apply every staged write to its read
    /// key, remove the staged entry and post a confirmation.
    ///
    /// Returns the number of writes applied.
    pub fn complete_pending_writes(&self) -> usize {
        let mut entries = self.entries();
        let staged: Vec<(String, String)> = entries
            .iter()
            .filter(|(key, _)| glob_match(keys::WRITE_PATTERN, key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut applied = 0;
        for (key, value) in staged {
            entries.remove(&key);
            let Some(address) = keys::parse_write_key(&key) else {
                continue;
            };
            entries.insert(keys::read_key(address.device_id, address.offset), value);
            entries.insert(keys::result_key(address), "OK".to_string());
            applied += 1;
        }
        debug!("In-memory bus writer applied {} staged write(s)", applied);
        applied
    }
}

#[async_trait]
impl RegisterStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_online()?;
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.check_online()?;
        self.insert(key, value);
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        self.check_online()?;
        Ok(self.keys_matching(pattern))
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.check_online()?;
        Ok(self.entries().remove(key).is_some())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.check_online()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Redis-style glob match supporting `*` and `?`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}
