// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value store abstraction backing the distributed lock (C2), the
//! per-user slot limiter (C3), the sandbox state store (C4) and the run
//! event log (C11). One trait, one real adapter (`RedisKvStore`), one fake
//! for tests — the same split the teacher uses for its agent adapters.

use async_trait::async_trait;
use edw_core::Error;
use std::time::Duration;

/// Primitive operations every component in this crate composes into its
/// own protocol. None of these are spec-level operations by themselves;
/// `lock.rs`, `limiter.rs`, `sandbox_store.rs` and `run_log.rs` build the
/// spec's atomicity guarantees out of them.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// `SET key value EX ttl NX` — true if the key was previously absent.
    async fn set_if_not_exists(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, Error>;

    /// `SET key value EX ttl` unconditionally.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error>;

    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Deletes `key` only if its current value equals `value`. Used to
    /// release a lock without clobbering a later holder's key (§4.1).
    async fn delete_if_value_matches(&self, key: &str, value: &str) -> Result<bool, Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// Re-applies `ttl` to `key` without touching its value. No-op if the
    /// key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), Error>;

    /// `INCR key`; if this increment created the key, also sets `ttl`.
    /// Atomic w.r.t. concurrent callers (§4.2).
    async fn incr_with_ttl_on_create(&self, key: &str, ttl: Duration) -> Result<i64, Error>;

    /// `DECR key`; deletes the key if the result is `<= 0`.
    async fn decr_and_reap(&self, key: &str) -> Result<i64, Error>;

    /// Plain, non-expiring counter increment, used for the run event log's
    /// `nextEventSeq` (§4.10).
    async fn incr(&self, key: &str) -> Result<i64, Error>;

    /// Appends to an ordered list (`RPUSH`-equivalent).
    async fn list_append(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Returns list elements from index `start_index` (0-based) to the end.
    async fn list_range_from(&self, key: &str, start_index: usize) -> Result<Vec<String>, Error>;

    /// Pops and returns the front element (`LPOP`-equivalent), or `None` if
    /// the list is empty. Used by the job queue (C12) to dequeue pending
    /// work without a second round trip to find what to remove.
    async fn list_pop_front(&self, key: &str) -> Result<Option<String>, Error>;
}

/// In-memory fake, grounded on the teacher's `FakeClock` (`edw_core::clock`)
/// and `FakeAgentAdapter` idiom: exercises the exact same trait real callers
/// use, no network.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Instant;

    #[derive(Default)]
    struct Entry {
        value: String,
        expires_at: Option<Instant>,
    }

    #[derive(Default)]
    pub struct FakeKvStore {
        scalars: Mutex<HashMap<String, Entry>>,
        lists: Mutex<HashMap<String, Vec<String>>>,
    }

    impl FakeKvStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn is_live(entry: &Entry) -> bool {
            entry.expires_at.map(|t| Instant::now() < t).unwrap_or(true)
        }
    }

    #[async_trait]
    impl KvStore for FakeKvStore {
        async fn set_if_not_exists(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, Error> {
            let mut scalars = self.scalars.lock();
            if let Some(existing) = scalars.get(key) {
                if Self::is_live(existing) {
                    return Ok(false);
                }
            }
            scalars.insert(
                key.to_string(),
                Entry { value: value.to_string(), expires_at: Some(Instant::now() + ttl) },
            );
            Ok(true)
        }

        async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
            self.scalars.lock().insert(
                key.to_string(),
                Entry { value: value.to_string(), expires_at: Some(Instant::now() + ttl) },
            );
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<String>, Error> {
            let mut scalars = self.scalars.lock();
            match scalars.get(key) {
                Some(entry) if Self::is_live(entry) => Ok(Some(entry.value.clone())),
                Some(_) => {
                    scalars.remove(key);
                    Ok(None)
                }
                None => Ok(None),
            }
        }

        async fn delete_if_value_matches(&self, key: &str, value: &str) -> Result<bool, Error> {
            let mut scalars = self.scalars.lock();
            match scalars.get(key) {
                Some(entry) if Self::is_live(entry) && entry.value == value => {
                    scalars.remove(key);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn delete(&self, key: &str) -> Result<(), Error> {
            self.scalars.lock().remove(key);
            Ok(())
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<(), Error> {
            if let Some(entry) = self.scalars.lock().get_mut(key) {
                entry.expires_at = Some(Instant::now() + ttl);
            }
            Ok(())
        }

        async fn incr_with_ttl_on_create(&self, key: &str, ttl: Duration) -> Result<i64, Error> {
            let mut scalars = self.scalars.lock();
            let created = !scalars.get(key).map(Self::is_live).unwrap_or(false);
            let entry = scalars.entry(key.to_string()).or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: None,
            });
            if created {
                entry.value = "0".to_string();
                entry.expires_at = Some(Instant::now() + ttl);
            }
            let next: i64 = entry.value.parse().unwrap_or(0) + 1;
            entry.value = next.to_string();
            Ok(next)
        }

        async fn decr_and_reap(&self, key: &str) -> Result<i64, Error> {
            let mut scalars = self.scalars.lock();
            let next = match scalars.get(key) {
                Some(entry) => entry.value.parse::<i64>().unwrap_or(0) - 1,
                None => -1,
            };
            if next <= 0 {
                scalars.remove(key);
            } else if let Some(entry) = scalars.get_mut(key) {
                entry.value = next.to_string();
            }
            Ok(next)
        }

        async fn incr(&self, key: &str) -> Result<i64, Error> {
            let mut scalars = self.scalars.lock();
            let entry = scalars.entry(key.to_string()).or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: None,
            });
            let next: i64 = entry.value.parse().unwrap_or(0) + 1;
            entry.value = next.to_string();
            Ok(next)
        }

        async fn list_append(&self, key: &str, value: &str) -> Result<(), Error> {
            self.lists.lock().entry(key.to_string()).or_default().push(value.to_string());
            Ok(())
        }

        async fn list_range_from(&self, key: &str, start_index: usize) -> Result<Vec<String>, Error> {
            let lists = self.lists.lock();
            Ok(lists.get(key).map(|items| items.iter().skip(start_index).cloned().collect()).unwrap_or_default())
        }

        async fn list_pop_front(&self, key: &str) -> Result<Option<String>, Error> {
            let mut lists = self.lists.lock();
            match lists.get_mut(key) {
                Some(items) if !items.is_empty() => Ok(Some(items.remove(0))),
                _ => Ok(None),
            }
        }
    }
}

/// Redis-backed adapter. Atomicity for the set-if-absent / compare-delete /
/// incr-with-ttl-on-create operations is implemented with `EVAL` scripts so
/// a check-then-act race can't slip in between the client's round trips —
/// the same property the teacher gets from in-process mutexes on its
/// materialized state, pushed down into Lua since this store is shared
/// across daemon processes.
pub struct RedisKvStore {
    client: redis::Client,
}

impl RedisKvStore {
    pub fn new(redis_url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, Error> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }
}

const RELEASE_IF_MATCH_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
  return redis.call("DEL", KEYS[1])
else
  return 0
end
"#;

const INCR_WITH_TTL_ON_CREATE_SCRIPT: &str = r#"
local exists = redis.call("EXISTS", KEYS[1])
local next = redis.call("INCR", KEYS[1])
if exists == 0 then
  redis.call("EXPIRE", KEYS[1], ARGV[1])
end
return next
"#;

const DECR_AND_REAP_SCRIPT: &str = r#"
local next = redis.call("DECR", KEYS[1])
if next <= 0 then
  redis.call("DEL", KEYS[1])
end
return next
"#;

#[async_trait]
impl KvStore for RedisKvStore {
    async fn set_if_not_exists(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, Error> {
        let mut conn = self.connection().await?;
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        Ok(result.is_some())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.connection().await?;
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    async fn delete_if_value_matches(&self, key: &str, value: &str) -> Result<bool, Error> {
        let mut conn = self.connection().await?;
        let deleted: i64 = redis::Script::new(RELEASE_IF_MATCH_SCRIPT)
            .key(key)
            .arg(value)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        Ok(deleted == 1)
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    async fn incr_with_ttl_on_create(&self, key: &str, ttl: Duration) -> Result<i64, Error> {
        let mut conn = self.connection().await?;
        redis::Script::new(INCR_WITH_TTL_ON_CREATE_SCRIPT)
            .key(key)
            .arg(ttl.as_secs())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    async fn decr_and_reap(&self, key: &str) -> Result<i64, Error> {
        let mut conn = self.connection().await?;
        redis::Script::new(DECR_AND_REAP_SCRIPT)
            .key(key)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    async fn incr(&self, key: &str) -> Result<i64, Error> {
        let mut conn = self.connection().await?;
        redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    async fn list_append(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        redis::cmd("RPUSH")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    async fn list_range_from(&self, key: &str, start_index: usize) -> Result<Vec<String>, Error> {
        let mut conn = self.connection().await?;
        redis::cmd("LRANGE")
            .arg(key)
            .arg(start_index as i64)
            .arg(-1i64)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }

    async fn list_pop_front(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.connection().await?;
        redis::cmd("LPOP")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
