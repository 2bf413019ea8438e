//! Generation enumeration and sweep.
//!
//! Generations are destroyed wholesale: the activation sweep deletes every
//! entry whose generation name is not in the keep set. The sweep runs once
//! at startup, before traffic is served, so it races with no writers.

use super::connection::CacheStore;
use crate::Error;
use serde::Serialize;
use tokio_rusqlite::params;

/// Entry count for one generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationStats {
    pub generation: String,
    pub entries: u64,
}

impl CacheStore {
    /// List the distinct generation names currently present.
    pub async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT generation FROM entries ORDER BY generation")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every generation whose name is not in `keep`.
    ///
    /// Returns the names of the generations removed, sorted.
    pub async fn sweep_generations(&self, keep: &[String]) -> Result<Vec<String>, Error> {
        let keep = keep.to_vec();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let names: Vec<String> = {
                    let mut stmt = conn.prepare("SELECT DISTINCT generation FROM entries")?;
                    stmt.query_map([], |row| row.get(0))?
                        .filter_map(|r| r.ok())
                        .collect()
                };

                let mut removed = Vec::new();
                for name in names {
                    if keep.contains(&name) {
                        continue;
                    }
                    conn.execute("DELETE FROM entries WHERE generation = ?1", params![name])?;
                    removed.push(name);
                }
                removed.sort();
                Ok(removed)
            })
            .await
            .map_err(Error::from)
    }

    /// Per-generation entry counts.
    pub async fn generation_stats(&self) -> Result<Vec<GenerationStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<GenerationStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT generation, COUNT(*) FROM entries GROUP BY generation ORDER BY generation",
                )?;
                let stats = stmt
                    .query_map([], |row| {
                        Ok(GenerationStats { generation: row.get(0)?, entries: row.get::<_, i64>(1)? as u64 })
                    })?
                    .filter_map(|r| r.ok())
                    .collect();
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entries::CacheEntry;
    use crate::cache::key::compute_cache_key;

    fn make_entry(generation: &str, url: &str) -> CacheEntry {
        CacheEntry {
            generation: generation.to_string(),
            key: compute_cache_key("GET", url),
            url: url.to_string(),
            status: 200,
            content_type: None,
            headers_json: None,
            body: b"body".to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_sweep_removes_stale_generations() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.put_entry(&make_entry("lantern-v1", "https://example.com/old")).await.unwrap();
        store
            .put_entry(&make_entry("lantern-static-v1", "https://example.com/app.css"))
            .await
            .unwrap();
        store
            .put_entry(&make_entry("lantern-dynamic-v1", "https://example.com/api/items"))
            .await
            .unwrap();

        let keep = vec!["lantern-static-v1".to_string(), "lantern-dynamic-v1".to_string()];
        let removed = store.sweep_generations(&keep).await.unwrap();
        assert_eq!(removed, vec!["lantern-v1".to_string()]);

        let remaining = store.list_generations().await.unwrap();
        assert_eq!(remaining, vec!["lantern-dynamic-v1".to_string(), "lantern-static-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_sweep_empty_store() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let keep = vec!["lantern-static-v1".to_string()];
        let removed = store.sweep_generations(&keep).await.unwrap();
        assert!(removed.is_empty());
    }

    #[tokio::test]
    async fn test_generation_stats() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store
            .put_entry(&make_entry("lantern-static-v1", "https://example.com/a.css"))
            .await
            .unwrap();
        store
            .put_entry(&make_entry("lantern-static-v1", "https://example.com/b.js"))
            .await
            .unwrap();
        store
            .put_entry(&make_entry("lantern-dynamic-v1", "https://example.com/api/feed"))
            .await
            .unwrap();

        let stats = store.generation_stats().await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].generation, "lantern-dynamic-v1");
        assert_eq!(stats[0].entries, 1);
        assert_eq!(stats[1].generation, "lantern-static-v1");
        assert_eq!(stats[1].entries, 2);
    }
}
