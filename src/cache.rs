use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{DurableStore, best_effort};

pub const CACHE_PREFIX: &str = "nfl-game-";
pub const DEFAULT_TTL: Duration = Duration::from_secs(12 * 60 * 60);

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn starting_at(millis: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(millis)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
}

pub struct TtlCache {
    memory: Mutex<HashMap<String, CacheEntry<Value>>>,
    durable: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self::with_clock(durable, Arc::new(SystemClock))
    }

    pub fn with_clock(durable: Arc<dyn DurableStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            durable,
            clock,
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = namespaced(key);
        let now = self.clock.now_millis();

        if let Ok(mut memory) = self.memory.lock() {
            match memory.get(&full_key) {
                Some(entry) if entry.expires_at > now => {
                    return serde_json::from_value(entry.data.clone()).ok();
                }
                Some(_) => {
                    memory.remove(&full_key);
                }
                None => {}
            }
        }

        let raw = best_effort("cache durable read", self.durable.get(&full_key)).flatten()?;
        let entry = match serde_json::from_str::<CacheEntry<Value>>(&raw) {
            Ok(entry) if entry.expires_at > now => entry,
            Ok(_) => {
                log::debug!("cache entry {full_key} expired");
                best_effort("cache expired removal", self.durable.remove(&full_key));
                return None;
            }
            Err(err) => {
                log::warn!("cache entry {full_key} is corrupt: {err}");
                best_effort("cache corrupt removal", self.durable.remove(&full_key));
                return None;
            }
        };

        let data = serde_json::from_value::<T>(entry.data.clone()).ok()?;
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(full_key, entry);
        }
        Some(data)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, DEFAULT_TTL);
    }

    pub fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let full_key = namespaced(key);
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(err) => {
                log::warn!("cache value for {full_key} not serializable: {err}");
                return;
            }
        };
        let entry = CacheEntry {
            data,
            expires_at: self.clock.now_millis().saturating_add(duration_millis(ttl)),
        };

        if let Ok(json) = serde_json::to_string(&entry) {
            best_effort("cache durable write", self.durable.set(&full_key, &json));
        }
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(full_key, entry);
        }
    }
}

fn namespaced(key: &str) -> String {
    format!("{CACHE_PREFIX}{key}")
}

fn duration_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
