//! Persisted registration state.
//!
//! Records which worker version is active for a scope so a restarted host can
//! resume serving without re-running install.

use super::connection::CacheStorage;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

impl CacheStorage {
    /// Record `version` as the active worker for `scope`.
    pub async fn record_active(&self, scope: &str, version: &str) -> Result<(), Error> {
        let scope = scope.to_string();
        let version = version.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO registrations (scope, active_version, activated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(scope) DO UPDATE SET
                        active_version = excluded.active_version,
                        activated_at = excluded.activated_at",
                    params![scope, version, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// The version last recorded as active for `scope`, if any.
    pub async fn active_version(&self, scope: &str) -> Result<Option<String>, Error> {
        let scope = scope.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let version = conn
                    .query_row("SELECT active_version FROM registrations WHERE scope = ?1", params![scope], |row| {
                        row.get(0)
                    })
                    .optional()?;
                Ok(version)
            })
            .await
            .map_err(Error::from)
    }

    /// Forget the registration for `scope`. Returns false if none existed.
    pub async fn clear_registration(&self, scope: &str) -> Result<bool, Error> {
        let scope = scope.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM registrations WHERE scope = ?1", params![scope])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
