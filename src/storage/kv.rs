use serde::de::DeserializeOwned;
use serde::Serialize;

use super::schema::Database;
use super::types::DatabaseError;

impl Database {
    // ========================================================================
    // Key-Value Operations
    // ========================================================================

    /// Raw string value for `key`, or `None` if never set.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Insert or overwrite `key`.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove `key`. Returns whether a row was deleted.
    pub async fn delete_value(&self, key: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Decode the JSON stored under `key`.
    ///
    /// A value that no longer decodes is reported as `DatabaseError::Json`
    /// rather than silently dropped, so callers can decide to reset it.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        let Some(raw) = self.get_value(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| DatabaseError::Json {
                key: key.to_string(),
                source,
            })
    }

    /// Encode `value` as JSON and store it under `key`.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(value).map_err(|source| DatabaseError::Json {
            key: key.to_string(),
            source,
        })?;
        self.set_value(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, DatabaseError};
    use pretty_assertions::assert_eq;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = test_db().await;
        assert_eq!(db.get_value("loggedIn").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let db = test_db().await;
        db.set_value("loggedIn", "true").await.unwrap();
        assert_eq!(db.get_value("loggedIn").await.unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_set_is_upsert() {
        let db = test_db().await;
        db.set_value("loggedIn", "true").await.unwrap();
        db.set_value("loggedIn", "false").await.unwrap();
        assert_eq!(db.get_value("loggedIn").await.unwrap().as_deref(), Some("false"));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kv_store")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        db.set_value("user", "{}").await.unwrap();
        assert!(db.delete_value("user").await.unwrap());
        assert!(!db.delete_value("user").await.unwrap());
        assert_eq!(db.get_value("user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let db = test_db().await;
        let value = serde_json::json!({"token": "t", "user": {"user_nicename": "asha"}});
        db.set_json("user", &value).await.unwrap();
        let back: Option<serde_json::Value> = db.get_json("user").await.unwrap();
        assert_eq!(back, Some(value));
    }

    #[tokio::test]
    async fn test_corrupt_json_is_reported() {
        let db = test_db().await;
        db.set_value("user", "{not json").await.unwrap();
        let result: Result<Option<serde_json::Value>, _> = db.get_json("user").await;
        assert!(matches!(result, Err(DatabaseError::Json { ref key, .. }) if key == "user"));
    }
}
