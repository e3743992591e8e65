//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::{StoredBusinessDocument, VisitRecord};
use crate::error::GatewayError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Appends a visit to the visit log.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Persistence`] on database failure.
    pub async fn save_visit(
        &self,
        business_id: &str,
        user_id: &str,
        distance_m: f64,
        location: Option<&str>,
        location_encrypted: bool,
    ) -> Result<i64, GatewayError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO visits (business_id, user_id, distance_m, location, location_encrypted) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(business_id)
        .bind(user_id)
        .bind(distance_m)
        .bind(location)
        .bind(location_encrypted)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(row)
    }

    /// Loads visits for a business, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Persistence`] on database failure.
    pub async fn load_visits(
        &self,
        business_id: &str,
        limit: i64,
    ) -> Result<Vec<VisitRecord>, GatewayError> {
        let rows = sqlx::query_as::<_, (i64, String, String, f64, Option<String>, bool, DateTime<Utc>)>(
            "SELECT id, business_id, user_id, distance_m, location, location_encrypted, visited_at \
             FROM visits WHERE business_id = $1 ORDER BY visited_at DESC LIMIT $2",
        )
        .bind(business_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, business_id, user_id, distance_m, location, location_encrypted, visited_at)| {
                    VisitRecord {
                        id,
                        business_id,
                        user_id,
                        distance_m,
                        location,
                        location_encrypted,
                        visited_at,
                    }
                },
            )
            .collect())
    }

    /// Mirrors a raw business document (insert-or-replace by id).
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Persistence`] on database failure.
    pub async fn upsert_business_document(
        &self,
        id: &str,
        payload: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO business_documents (id, payload, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (id) DO UPDATE SET payload = EXCLUDED.payload, updated_at = NOW()",
        )
        .bind(id)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(())
    }

    /// Deletes mirrored documents whose ids are absent from the current
    /// snapshot, so the mirror replaces wholesale like the registry.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Persistence`] on database failure.
    pub async fn prune_business_documents(&self, keep_ids: &[String]) -> Result<u64, GatewayError> {
        let result = sqlx::query("DELETE FROM business_documents WHERE id <> ALL($1)")
            .bind(keep_ids)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Point-reads a mirrored business document by id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Persistence`] on database failure.
    pub async fn fetch_business_document(
        &self,
        id: &str,
    ) -> Result<Option<StoredBusinessDocument>, GatewayError> {
        let row = sqlx::query_as::<_, (String, serde_json::Value, DateTime<Utc>)>(
            "SELECT id, payload, updated_at FROM business_documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(row.map(|(id, payload, updated_at)| StoredBusinessDocument {
            id,
            payload,
            updated_at,
        }))
    }

    /// Loads all mirrored business documents (startup snapshot source).
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Persistence`] on database failure.
    pub async fn load_business_documents(
        &self,
    ) -> Result<Vec<StoredBusinessDocument>, GatewayError> {
        let rows = sqlx::query_as::<_, (String, serde_json::Value, DateTime<Utc>)>(
            "SELECT id, payload, updated_at FROM business_documents ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::Persistence(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, payload, updated_at)| StoredBusinessDocument {
                id,
                payload,
                updated_at,
            })
            .collect())
    }
}
