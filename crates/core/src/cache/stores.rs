//! Named cache stores.
//!
//! A store is a namespace of entries identified by the worker version that
//! owns it. Store-level operations (open, enumerate, delete) live on
//! [`CacheStorage`]; entry-level operations live on [`CacheStore`].

use super::connection::CacheStorage;
use crate::Error;
use tokio_rusqlite::{Connection, params};

/// Handle to a single named store.
///
/// Holding a handle does not keep the store alive: if the store is deleted,
/// later writes through the handle fail instead of recreating it.
#[derive(Clone, Debug)]
pub struct CacheStore {
    pub(crate) conn: Connection,
    pub(crate) name: String,
}

impl CacheStore {
    /// The store name (the owning worker's version identifier).
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CacheStorage {
    /// Handle to the store with the given name, without creating it.
    ///
    /// Reads through the handle see an empty store if it does not exist;
    /// writes fail with `Error::StoreNotFound`.
    pub fn store(&self, name: &str) -> CacheStore {
        CacheStore { conn: self.conn.clone(), name: name.to_string() }
    }

    /// Open the store with the given name, creating it if absent.
    pub async fn open_store(&self, name: &str) -> Result<CacheStore, Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("cache store name cannot be empty".into()));
        }

        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO caches (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(CacheStore { conn: self.conn.clone(), name: name.to_string() })
    }

    /// Check whether a store exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List every store name in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns false if no store had that name.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
