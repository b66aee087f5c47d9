//! Response snapshots stored inside a cache store.

use super::hash::{body_digest, entry_key};
use super::stores::CacheStore;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// An immutable response snapshot.
///
/// Captures everything needed to replay a response to the page without
/// touching the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Absolute request URL the snapshot is keyed by.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Response headers in wire order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Hex SHA-256 of `body`.
    pub body_sha256: String,
    /// RFC 3339 timestamp of when the snapshot was written.
    pub stored_at: String,
}

impl CachedResponse {
    /// Build a snapshot for `url`, computing the digest and timestamp.
    pub fn new(
        url: &str, status: u16, content_type: Option<String>, headers: Vec<(String, String)>, body: Vec<u8>,
    ) -> Self {
        Self {
            url: entry_key(url).to_string(),
            status,
            content_type,
            headers,
            body_sha256: body_digest(&body),
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether the snapshot records a 2xx response.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn insert(conn: &rusqlite::Connection, store: &str, entry: &CachedResponse) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&entry.headers)?;
    conn.execute(
        "INSERT INTO entries (
            cache_name, url, status, content_type, headers_json, body, body_sha256, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(cache_name, url) DO UPDATE SET
            status = excluded.status,
            content_type = excluded.content_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            body_sha256 = excluded.body_sha256,
            stored_at = excluded.stored_at",
        params![
            store,
            &entry.url,
            entry.status,
            &entry.content_type,
            headers_json,
            &entry.body,
            &entry.body_sha256,
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

fn ensure_store(conn: &rusqlite::Connection, store: &str) -> Result<(), Error> {
    let exists: bool =
        conn.query_row("SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)", params![store], |row| row.get(0))?;
    if exists { Ok(()) } else { Err(Error::StoreNotFound(store.to_string())) }
}

impl CacheStore {
    /// Insert or overwrite the entry for `entry.url`.
    pub async fn put(&self, entry: &CachedResponse) -> Result<(), Error> {
        let store = self.name.clone();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_store(conn, &store)?;
                insert(conn, &store, &entry)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert every entry in one transaction.
    ///
    /// Either all entries are written or none are.
    pub async fn put_all(&self, entries: Vec<CachedResponse>) -> Result<usize, Error> {
        let store = self.name.clone();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &store)?;
                for entry in &entries {
                    insert(&tx, &store, entry)?;
                }
                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry stored for `url`.
    ///
    /// Returns None if the store has no entry for that key.
    pub async fn match_url(&self, url: &str) -> Result<Option<CachedResponse>, Error> {
        let store = self.name.clone();
        let key = entry_key(url).to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT url, status, content_type, headers_json, body, body_sha256, stored_at
                         FROM entries WHERE cache_name = ?1 AND url = ?2",
                        params![store, key],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, u16>(1)?,
                                row.get::<_, Option<String>>(2)?,
                                row.get::<_, String>(3)?,
                                row.get::<_, Vec<u8>>(4)?,
                                row.get::<_, String>(5)?,
                                row.get::<_, String>(6)?,
                            ))
                        },
                    )
                    .optional()?;

                let Some((url, status, content_type, headers_json, body, body_sha256, stored_at)) = row else {
                    return Ok(None);
                };

                Ok(Some(CachedResponse {
                    url,
                    status,
                    content_type,
                    headers: serde_json::from_str(&headers_json)?,
                    body,
                    body_sha256,
                    stored_at,
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for `url`. Returns false if there was none.
    pub async fn delete(&self, url: &str) -> Result<bool, Error> {
        let store = self.name.clone();
        let key = entry_key(url).to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted =
                    conn.execute("DELETE FROM entries WHERE cache_name = ?1 AND url = ?2", params![store, key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// All keys in the store, in insertion order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let store = self.name.clone();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE cache_name = ?1 ORDER BY rowid ASC")?;
                let keys = stmt
                    .query_map(params![store], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in the store.
    pub async fn len(&self) -> Result<usize, Error> {
        let store = self.name.clone();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE cache_name = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}
