//! [`CacheStorage`] over SQLite.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use super::{CacheStorage, EntrySummary};
use crate::Error;
use crate::request::ResourceId;
use crate::response::ResponseSnapshot;

/// Column values for one entry, prepared outside the connection thread.
struct EntryRow {
    key_hash: String,
    url: String,
    status: i64,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(id: &ResourceId, response: &ResponseSnapshot) -> Result<Self, Error> {
        Ok(Self {
            key_hash: id.key(),
            url: id.url().to_string(),
            status: i64::from(response.status),
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }
}

fn ensure_generation(conn: &rusqlite::Connection, generation: &str, now: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO generations (tag, created_at) VALUES (?1, ?2)",
        params![generation, now],
    )?;
    Ok(())
}

fn upsert_entry(
    conn: &rusqlite::Connection, generation: &str, row: &EntryRow, now: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO entries (generation, key_hash, url, status, status_text, headers_json, body, stored_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(generation, key_hash) DO UPDATE SET
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![generation, row.key_hash, row.url, row.status, row.status_text, row.headers_json, row.body, now],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_generation(conn, &generation, &now)?;
                Ok(())
            })
            .await
            .map_err(|e| Error::CacheOpen(Error::from(e).to_string()))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT tag FROM generations ORDER BY rowid ASC")?;
                let tags = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(tags)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE tag = ?1", params![generation])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, generation: &str, id: &ResourceId, response: &ResponseSnapshot) -> Result<(), Error> {
        let generation = generation.to_string();
        let row = EntryRow::new(id, response)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &generation, &now)?;
                upsert_entry(&tx, &generation, &row, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|e| Error::CacheWrite(Error::from(e).to_string()))
    }

    async fn put_all(&self, generation: &str, entries: &[(ResourceId, ResponseSnapshot)]) -> Result<(), Error> {
        let generation = generation.to_string();
        let rows = entries
            .iter()
            .map(|(id, response)| EntryRow::new(id, response))
            .collect::<Result<Vec<_>, _>>()?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &generation, &now)?;
                for row in &rows {
                    upsert_entry(&tx, &generation, row, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|e| Error::CacheWrite(Error::from(e).to_string()))
    }

    async fn lookup(&self, generation: &str, id: &ResourceId) -> Result<Option<ResponseSnapshot>, Error> {
        let generation = generation.to_string();
        let key_hash = id.key();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, status_text, headers_json, body
                    FROM entries WHERE generation = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![generation, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                    ))
                });

                match result {
                    Ok((url, status, status_text, headers_json, body)) => {
                        let headers = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::CorruptEntry(format!("headers for {url}: {e}")))?;
                        Ok(Some(ResponseSnapshot {
                            url: Some(url),
                            status: u16::try_from(status).unwrap_or(500),
                            status_text,
                            headers,
                            body: Bytes::from(body),
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, generation: &str) -> Result<Vec<EntrySummary>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntrySummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, length(body), stored_at
                    FROM entries WHERE generation = ?1 ORDER BY url ASC",
                )?;
                let rows = stmt
                    .query_map(params![generation], |row| {
                        Ok(EntrySummary {
                            url: row.get(0)?,
                            status: u16::try_from(row.get::<_, i64>(1)?).unwrap_or(500),
                            size: u64::try_from(row.get::<_, i64>(2)?).unwrap_or(0),
                            stored_at: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(url: &str) -> ResourceId {
        ResourceId::parse(url).unwrap()
    }

    fn page(body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(200, body.to_string())
            .with_status_text("OK")
            .with_header("content-type", "text/html")
    }

    #[tokio::test]
    async fn test_put_and_lookup() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("v1").await.unwrap();
        db.put("v1", &id("https://example.com/"), &page("root")).await.unwrap();

        let found = db.lookup("v1", &id("https://example.com/")).await.unwrap().unwrap();
        assert_eq!(found.text(), "root");
        assert_eq!(found.status, 200);
        assert_eq!(found.status_text, "OK");
        assert_eq!(found.content_type(), Some("text/html"));
        assert_eq!(found.url.as_deref(), Some("https://example.com/"));
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("v1", &id("https://example.com/app.js"), &page("old")).await.unwrap();

        assert!(db.lookup("v2", &id("https://example.com/app.js")).await.unwrap().is_none());
        assert!(db.lookup("v1", &id("https://example.com/missing.js")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = id("https://example.com/app.js");
        db.put("v1", &key, &page("first")).await.unwrap();
        db.put("v1", &key, &page("second")).await.unwrap();

        assert_eq!(db.lookup("v1", &key).await.unwrap().unwrap().text(), "second");
        assert_eq!(db.entries("v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("v2").await.unwrap();
        db.open("v1").await.unwrap();
        db.open("v2").await.unwrap();

        assert_eq!(db.keys().await.unwrap(), vec!["v2".to_string(), "v1".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("v0", &id("https://example.com/"), &page("stale")).await.unwrap();

        assert!(db.delete("v0").await.unwrap());
        assert!(!db.delete("v0").await.unwrap());
        assert!(db.keys().await.unwrap().is_empty());

        let orphans: i64 = db
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_put_all_and_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let batch = vec![
            (id("https://example.com/offline.html"), page("offline")),
            (id("https://example.com/"), page("root")),
        ];
        db.put_all("v1", &batch).await.unwrap();

        let entries = db.entries("v1").await.unwrap();
        let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/", "https://example.com/offline.html"]);
        assert_eq!(entries[0].size, 4);
        assert_eq!(db.keys().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_lookup_corrupt_headers_is_cache_error() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = id("https://example.com/app.js");
        db.put("v1", &key, &page("js")).await.unwrap();
        db.conn
            .call(|conn| conn.execute("UPDATE entries SET headers_json = 'not json'", []))
            .await
            .unwrap();

        let err = db.lookup("v1", &key).await.unwrap_err();
        assert!(matches!(err, Error::CorruptEntry(_)));
        assert!(err.to_string().starts_with("CACHE_ERROR"));
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.sqlite");
        let key = id("https://example.com/");

        let db = CacheDb::open(&path).await.unwrap();
        db.put("v0", &key, &page("old")).await.unwrap();
        drop(db);

        let reopened = CacheDb::open(&path).await.unwrap();
        assert_eq!(reopened.keys().await.unwrap(), vec!["v0".to_string()]);
        let found = reopened.lookup("v0", &key).await.unwrap().unwrap();
        assert_eq!(found.text(), "old");
        assert_eq!(found.content_type(), Some("text/html"));
    }
}
