//! SQLite storage backend

use crate::storage::schema::initialize_schema;
use crate::storage::{ResultRow, ScanRow, ScanStore, StatusUpdate, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;

/// Scan store backed by a SQLite database
///
/// Writes are short and serialized behind a mutex; the connection is shared
/// by all worker tasks.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl ScanStore for SqliteStore {
    async fn save_result(
        &self,
        job_id: &str,
        result_type: &str,
        data: &Value,
        page_url: Option<&str>,
    ) -> StoreResult<()> {
        let body = serde_json::to_string(data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO scan_results (job_id, result_type, page_url, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![job_id, result_type, page_url, body, now],
        )?;
        Ok(())
    }

    async fn update_status(&self, job_id: &str, update: &StatusUpdate) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO scans (job_id, status, progress, error_message, pages_crawled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(job_id) DO UPDATE SET
                 status = excluded.status,
                 progress = excluded.progress,
                 error_message = COALESCE(excluded.error_message, error_message),
                 pages_crawled = COALESCE(excluded.pages_crawled, pages_crawled),
                 updated_at = excluded.updated_at",
            params![
                job_id,
                update.status,
                update.progress,
                update.error_message,
                update.pages_crawled,
                now
            ],
        )?;
        Ok(())
    }

    async fn get_scan(&self, job_id: &str) -> StoreResult<Option<ScanRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT job_id, status, progress, error_message, pages_crawled, updated_at
             FROM scans WHERE job_id = ?1",
        )?;

        let mut rows = stmt.query_map(params![job_id], |row| {
            Ok(ScanRow {
                job_id: row.get(0)?,
                status: row.get(1)?,
                progress: row.get(2)?,
                error_message: row.get(3)?,
                pages_crawled: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn list_results(&self, job_id: &str) -> StoreResult<Vec<ResultRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT result_type, page_url, data FROM scan_results
             WHERE job_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![job_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (result_type, page_url, body) = row?;
            let data = serde_json::from_str(&body)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            results.push(ResultRow {
                result_type,
                page_url,
                data,
            });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_status_upserts() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .update_status(
                "scan-1",
                &StatusUpdate {
                    status: "crawling".to_string(),
                    progress: 9,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        store
            .update_status(
                "scan-1",
                &StatusUpdate {
                    status: "analyzing".to_string(),
                    progress: 55,
                    pages_crawled: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let row = store.get_scan("scan-1").await.unwrap().unwrap();
        assert_eq!(row.status, "analyzing");
        assert_eq!(row.progress, 55);
        assert_eq!(row.pages_crawled, Some(3));
    }

    #[tokio::test]
    async fn test_status_keeps_last_error_and_page_count() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .update_status(
                "scan-1",
                &StatusUpdate {
                    status: "failed".to_string(),
                    progress: 0,
                    error_message: Some("network timeout".to_string()),
                    pages_crawled: Some(2),
                },
            )
            .await
            .unwrap();

        // A later update without a message or count keeps the stored values
        store
            .update_status(
                "scan-1",
                &StatusUpdate {
                    status: "crawling".to_string(),
                    progress: 9,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let row = store.get_scan("scan-1").await.unwrap().unwrap();
        assert_eq!(row.status, "crawling");
        assert_eq!(row.error_message.as_deref(), Some("network timeout"));
        assert_eq!(row.pages_crawled, Some(2));
    }

    #[tokio::test]
    async fn test_save_and_list_results() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .save_result(
                "scan-1",
                "fonts",
                &json!({"totalFonts": 2}),
                Some("https://example.com/"),
            )
            .await
            .unwrap();
        store
            .save_result("scan-1", "aggregate", &json!({"scanId": "scan-1"}), None)
            .await
            .unwrap();
        store
            .save_result("scan-2", "fonts", &json!({"totalFonts": 0}), None)
            .await
            .unwrap();

        let results = store.list_results("scan-1").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].result_type, "fonts");
        assert_eq!(results[0].page_url.as_deref(), Some("https://example.com/"));
        assert_eq!(results[0].data["totalFonts"], 2);
        assert_eq!(results[1].result_type, "aggregate");
        assert!(results[1].page_url.is_none());
    }

    #[tokio::test]
    async fn test_get_scan_missing() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_scan("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scans.db");

        let store = SqliteStore::new(&path).unwrap();
        store
            .update_status(
                "scan-1",
                &StatusUpdate {
                    status: "completed".to_string(),
                    progress: 100,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        drop(store);

        // Rows survive reopening the database
        let store = SqliteStore::new(&path).unwrap();
        let row = store.get_scan("scan-1").await.unwrap().unwrap();
        assert_eq!(row.status, "completed");
    }
}
