//! Persistence of the signed-in identity.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use spektr_shared::constants::SESSION_NAMESPACE;
use spektr_shared::Identity;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Save `identity` as the last authenticated user, replacing any
    /// previous record.
    pub fn save_identity(&self, identity: &Identity) -> Result<()> {
        let json = serde_json::to_string(identity)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO local_state (namespace, json, updated_at)
             VALUES (?1, ?2, ?3)",
            params![SESSION_NAMESPACE, json, Utc::now().to_rfc3339()],
        )?;
        tracing::debug!(user_id = %identity.id, "identity saved");
        Ok(())
    }

    /// Load the saved identity.
    ///
    /// Returns `Ok(None)` when nothing is saved and [`StoreError::Corrupt`]
    /// when a record exists but does not decode.
    pub fn load_identity(&self) -> Result<Option<Identity>> {
        let json: Option<String> = self
            .conn()
            .query_row(
                "SELECT json FROM local_state WHERE namespace = ?1",
                params![SESSION_NAMESPACE],
                |row| row.get(0),
            )
            .optional()?;

        let Some(json) = json else {
            return Ok(None);
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                namespace: SESSION_NAMESPACE.to_string(),
                reason: e.to_string(),
            })
    }

    /// Remove the saved identity. Returns whether a record existed.
    pub fn clear_identity(&self) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM local_state WHERE namespace = ?1",
            params![SESSION_NAMESPACE],
        )?;
        Ok(affected > 0)
    }
}
