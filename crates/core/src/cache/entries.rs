//! Cache entry CRUD operations.
//!
//! A cache entry is a stored response snapshot keyed by (generation, key).
//! Writes use UPSERT semantics, so repopulating a key is last-writer-wins.

use super::connection::CacheStore;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response snapshot.
///
/// Holds everything needed to replay a response to the intercepted client:
/// status, headers (as JSON pairs), and body bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub generation: String,
    pub key: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CacheStore {
    /// Insert or update a cache entry.
    ///
    /// Uses UPSERT semantics: inserts if the (generation, key) pair doesn't
    /// exist, overwrites the snapshot if it does.
    pub async fn put_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        generation, key, url, status, content_type, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(generation, key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &entry.generation,
                        &entry.key,
                        &entry.url,
                        entry.status as i64,
                        &entry.content_type,
                        &entry.headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by generation and key.
    ///
    /// Returns None if the pair doesn't exist in the store.
    pub async fn get_entry(&self, generation: &str, key: &str) -> Result<Option<CacheEntry>, Error> {
        let generation = generation.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT generation, key, url, status, content_type, headers_json, body, stored_at
                     FROM entries WHERE generation = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![generation, key], |row| {
                    Ok(CacheEntry {
                        generation: row.get(0)?,
                        key: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get::<_, i64>(3)? as u16,
                        content_type: row.get(4)?,
                        headers_json: row.get(5)?,
                        body: row.get(6)?,
                        stored_at: row.get(7)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a key across generations in the given order; first hit wins.
    pub async fn lookup(&self, generations: &[String], key: &str) -> Result<Option<CacheEntry>, Error> {
        for generation in generations {
            if let Some(entry) = self.get_entry(generation, key).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::compute_cache_key;

    fn make_entry(generation: &str, url: &str, body: &str) -> CacheEntry {
        CacheEntry {
            generation: generation.to_string(),
            key: compute_cache_key("GET", url),
            url: url.to_string(),
            status: 200,
            content_type: Some("text/html".to_string()),
            headers_json: None,
            body: body.as_bytes().to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let entry = make_entry("app-static-v1", "https://example.com/index.html", "<html>");

        store.put_entry(&entry).await.unwrap();

        let retrieved = store.get_entry(&entry.generation, &entry.key).await.unwrap().unwrap();
        assert_eq!(retrieved.url, entry.url);
        assert_eq!(retrieved.status, 200);
        assert_eq!(retrieved.body, entry.body);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let result = store.get_entry("app-static-v1", "nonexistent").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let first = make_entry("app-dynamic-v1", "https://example.com/api/items", "[1]");
        let second = make_entry("app-dynamic-v1", "https://example.com/api/items", "[1,2]");

        store.put_entry(&first).await.unwrap();
        store.put_entry(&second).await.unwrap();

        let retrieved = store.get_entry(&first.generation, &first.key).await.unwrap().unwrap();
        assert_eq!(retrieved.body, b"[1,2]");
    }

    #[tokio::test]
    async fn test_lookup_prefers_earlier_generation() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let in_static = make_entry("app-static-v1", "https://example.com/page", "static copy");
        let in_dynamic = make_entry("app-dynamic-v1", "https://example.com/page", "dynamic copy");

        store.put_entry(&in_static).await.unwrap();
        store.put_entry(&in_dynamic).await.unwrap();

        let order = vec!["app-static-v1".to_string(), "app-dynamic-v1".to_string()];
        let hit = store.lookup(&order, &in_static.key).await.unwrap().unwrap();
        assert_eq!(hit.body, b"static copy");
    }

    #[tokio::test]
    async fn test_lookup_falls_through_generations() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let in_dynamic = make_entry("app-dynamic-v1", "https://example.com/api/feed", "feed");

        store.put_entry(&in_dynamic).await.unwrap();

        let order = vec!["app-static-v1".to_string(), "app-dynamic-v1".to_string()];
        let hit = store.lookup(&order, &in_dynamic.key).await.unwrap().unwrap();
        assert_eq!(hit.generation, "app-dynamic-v1");
    }
}
