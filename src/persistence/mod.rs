//! Persistence layer: PostgreSQL visit log, business documents, and
//! key-value storage.
//!
//! Three tables back the gateway when persistence is enabled:
//! `visits` (append-only visit log), `business_documents` (mirror of
//! the remote business collection, used for point-read fallbacks), and
//! `kv_store` (suppression caches and the device-user-id mirror). The
//! concrete implementation uses `sqlx::PgPool` for async PostgreSQL
//! access; [`kv::KvStore`] additionally offers an in-memory backend
//! for persistence-disabled runs and tests.

pub mod kv;
pub mod models;
pub mod postgres;

pub use kv::KvStore;
pub use postgres::PostgresPersistence;
