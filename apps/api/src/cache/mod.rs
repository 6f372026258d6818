//! Best-effort JSON cache on Redis. Every failure is logged and treated as
//! a miss so callers never fail because the cache is down.

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

pub async fn get_json<T: DeserializeOwned>(client: &redis::Client, key: &str) -> Option<T> {
    let mut conn = match client.get_multiplexed_async_connection().await {
        Ok(c) => c,
        Err(e) => {
            warn!("Redis unavailable, skipping cache read for {key}: {e}");
            return None;
        }
    };
    let raw: Option<String> = match conn.get(key).await {
        Ok(v) => v,
        Err(e) => {
            warn!("Redis GET {key} failed: {e}");
            return None;
        }
    };
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(value) => {
            debug!("cache hit {key}");
            Some(value)
        }
        Err(e) => {
            warn!("Discarding undecodable cache entry {key}: {e}");
            None
        }
    }
}

pub async fn set_json<T: Serialize>(client: &redis::Client, key: &str, value: &T, ttl_secs: u64) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Could not serialize cache entry {key}: {e}");
            return;
        }
    };
    let mut conn = match client.get_multiplexed_async_connection().await {
        Ok(c) => c,
        Err(e) => {
            warn!("Redis unavailable, skipping cache write for {key}: {e}");
            return;
        }
    };
    if let Err(e) = conn.set_ex::<_, _, ()>(key, raw, ttl_secs).await {
        warn!("Redis SETEX {key} failed: {e}");
    }
}
