//! # Offline Queue Repository
//!
//! Durable storage for product submissions made while the device was offline.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  offline_store                                                         │
//! │  ┌──────────────────┬──────────────────────────────────┬────────────┐  │
//! │  │ key              │ value                            │ updated_at │  │
//! │  ├──────────────────┼──────────────────────────────────┼────────────┤  │
//! │  │ pending_products │ [{"id":…,"product_name":"Pen",…},│ RFC 3339   │  │
//! │  │                  │  {"id":…,"product_name":"Mug",…}]│            │  │
//! │  └──────────────────┴──────────────────────────────────┴────────────┘  │
//! │                                                                         │
//! │  One JSON array, insertion order. Image bytes are never stored.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write is a read-modify-write inside one transaction, so a crash
//! leaves either the old list or the new one.
//!
//! ## Corruption
//! A value that no longer parses is treated as an empty queue and logged.
//! The next `append` overwrites it with a fresh list.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::DbResult;
use catalog_core::PendingSubmission;

/// Key of the pending list in `offline_store`.
pub const PENDING_PRODUCTS_KEY: &str = "pending_products";

/// Repository for pending product submissions.
#[derive(Debug, Clone)]
pub struct OfflineQueueRepository {
    pool: SqlitePool,
}

impl OfflineQueueRepository {
    /// Creates a new OfflineQueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OfflineQueueRepository { pool }
    }

    /// Appends one submission to the end of the queue.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let pending = PendingSubmission::new(&product, None);
    /// repo.append(&pending).await?;
    /// ```
    pub async fn append(&self, submission: &PendingSubmission) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let mut pending = load_list(&mut tx).await?;
        pending.push(submission.clone());
        store_list(&mut tx, &pending).await?;

        tx.commit().await?;

        debug!(
            id = %submission.id,
            queue_len = pending.len(),
            "Queued product submission"
        );
        Ok(())
    }

    /// Returns every queued submission in insertion order.
    ///
    /// Empty when nothing is queued or the stored list is unreadable.
    pub async fn read_all(&self) -> DbResult<Vec<PendingSubmission>> {
        let mut conn = self.pool.acquire().await?;
        let raw = fetch_raw(&mut *conn).await?;
        Ok(parse_list(raw.as_deref()))
    }

    /// Removes every queued submission.
    pub async fn clear(&self) -> DbResult<()> {
        sqlx::query("DELETE FROM offline_store WHERE key = ?1")
            .bind(PENDING_PRODUCTS_KEY)
            .execute(&self.pool)
            .await?;

        debug!("Offline queue cleared");
        Ok(())
    }

    /// Removes the submissions with the given ids and keeps the rest in order.
    ///
    /// ## Returns
    /// Number of entries actually removed.
    pub async fn remove(&self, ids: &[String]) -> DbResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let mut tx = self.pool.begin().await?;

        let pending = load_list(&mut tx).await?;
        let before = pending.len();
        let remaining: Vec<PendingSubmission> = pending
            .into_iter()
            .filter(|p| !doomed.contains(p.id.as_str()))
            .collect();
        let removed = before - remaining.len();

        if removed > 0 {
            store_list(&mut tx, &remaining).await?;
        }

        tx.commit().await?;

        debug!(removed, remaining = remaining.len(), "Removed confirmed submissions");
        Ok(removed)
    }

    /// Returns the number of queued submissions.
    pub async fn count(&self) -> DbResult<usize> {
        Ok(self.read_all().await?.len())
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn fetch_raw(conn: &mut sqlx::SqliteConnection) -> DbResult<Option<String>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM offline_store WHERE key = ?1")
        .bind(PENDING_PRODUCTS_KEY)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(raw)
}

async fn load_list(tx: &mut Transaction<'_, Sqlite>) -> DbResult<Vec<PendingSubmission>> {
    let raw = fetch_raw(&mut *tx).await?;
    Ok(parse_list(raw.as_deref()))
}

async fn store_list(
    tx: &mut Transaction<'_, Sqlite>,
    pending: &[PendingSubmission],
) -> DbResult<()> {
    let value = serde_json::to_string(pending)?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO offline_store (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(PENDING_PRODUCTS_KEY)
    .bind(value)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn parse_list(raw: Option<&str>) -> Vec<PendingSubmission> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_str(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "Stored offline queue is unreadable, treating as empty");
            Vec::new()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use catalog_core::{NewProduct, Product};

    async fn repo() -> (Database, OfflineQueueRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.offline_queue();
        (db, repo)
    }

    fn pending(name: &str) -> PendingSubmission {
        let product = Product::user_added(NewProduct::new(name, "Stationery", 10.0, 5.0));
        PendingSubmission::new(&product, Some(vec![0xFF, 0xD8, 0xFF]))
    }

    async fn write_raw(db: &Database, value: &str) {
        sqlx::query("INSERT OR REPLACE INTO offline_store (key, value, updated_at) VALUES (?1, ?2, ?3)")
            .bind(PENDING_PRODUCTS_KEY)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let (_db, repo) = repo().await;
        assert!(repo.read_all().await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_round_trips_all_fields_but_image_bytes() {
        let (_db, repo) = repo().await;
        let entry = pending("Pen");

        repo.append(&entry).await.unwrap();

        let all = repo.read_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, entry.id);
        assert_eq!(all[0].record, entry.record);
        assert_eq!(all[0].queued_at, entry.queued_at);
        assert!(all[0].image_bytes.is_none());
    }

    #[tokio::test]
    async fn test_read_all_keeps_insertion_order() {
        let (_db, repo) = repo().await;
        for name in ["Pen", "Mug", "Lamp"] {
            repo.append(&pending(name)).await.unwrap();
        }

        let names: Vec<_> = repo
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.record.product_name)
            .collect();
        assert_eq!(names, vec!["Pen", "Mug", "Lamp"]);
    }

    #[tokio::test]
    async fn test_clear() {
        let (_db, repo) = repo().await;
        repo.append(&pending("Pen")).await.unwrap();
        repo.append(&pending("Mug")).await.unwrap();

        repo.clear().await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_keeps_unlisted_entries() {
        let (_db, repo) = repo().await;
        let a = pending("Pen");
        let b = pending("Mug");
        let c = pending("Lamp");
        for entry in [&a, &b, &c] {
            repo.append(entry).await.unwrap();
        }

        let removed = repo
            .remove(&[a.id.clone(), c.id.clone(), "unknown".to_string()])
            .await
            .unwrap();

        assert_eq!(removed, 2);
        let left = repo.read_all().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b.id);
    }

    #[tokio::test]
    async fn test_remove_nothing() {
        let (_db, repo) = repo().await;
        repo.append(&pending("Pen")).await.unwrap();
        assert_eq!(repo.remove(&[]).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_list_reads_as_empty() {
        let (db, repo) = repo().await;
        write_raw(&db, "{not json").await;

        assert!(repo.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_over_corrupt_list_starts_fresh() {
        let (db, repo) = repo().await;
        write_raw(&db, "[{\"product_name\": 3}]").await;

        repo.append(&pending("Pen")).await.unwrap();

        let all = repo.read_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record.product_name, "Pen");
    }

    #[tokio::test]
    async fn test_queue_survives_new_repository_handle() {
        let (db, repo) = repo().await;
        repo.append(&pending("Pen")).await.unwrap();
        drop(repo);

        assert_eq!(db.offline_queue().count().await.unwrap(), 1);
    }
}
