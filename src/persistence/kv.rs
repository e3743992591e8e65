//! Key-value persistence backing the suppression caches.
//!
//! [`KvStore`] is an enum over the two backends: a Postgres `kv_store`
//! table when persistence is enabled, and an in-memory map otherwise
//! (and in tests). Read/write failures are reduced to warnings — a
//! missing value just means "no suppression history".

use std::collections::HashMap;

use sqlx::PgPool;
use tokio::sync::Mutex;

/// Key-value storage with Postgres and in-memory backends.
#[derive(Debug)]
pub enum KvStore {
    /// Process-local map; contents are lost on restart.
    Memory(Mutex<HashMap<String, String>>),
    /// Durable `kv_store` table.
    Postgres(PgPool),
}

impl KvStore {
    /// Creates an in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Mutex::new(HashMap::new()))
    }

    /// Creates a Postgres-backed store.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(pool)
    }

    /// Reads a value. Backend failures log a warning and read as absent.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Memory(map) => map.lock().await.get(key).cloned(),
            Self::Postgres(pool) => {
                let result = sqlx::query_scalar::<_, String>(
                    "SELECT value FROM kv_store WHERE key = $1",
                )
                .bind(key)
                .fetch_optional(pool)
                .await;
                match result {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!(key, error = %e, "kv read failed");
                        None
                    }
                }
            }
        }
    }

    /// Writes a value. Backend failures log a warning and are dropped.
    pub async fn put(&self, key: &str, value: &str) {
        match self {
            Self::Memory(map) => {
                map.lock().await.insert(key.to_string(), value.to_string());
            }
            Self::Postgres(pool) => {
                let result = sqlx::query(
                    "INSERT INTO kv_store (key, value) VALUES ($1, $2) \
                     ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
                )
                .bind(key)
                .bind(value)
                .execute(pool)
                .await;
                if let Err(e) = result {
                    tracing::warn!(key, error = %e, "kv write failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = KvStore::memory();
        assert!(store.get("missing").await.is_none());
        store.put("k", "v1").await;
        assert_eq!(store.get("k").await.as_deref(), Some("v1"));
        store.put("k", "v2").await;
        assert_eq!(store.get("k").await.as_deref(), Some("v2"));
    }
}
