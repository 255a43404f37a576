//! SQLite-Implementierung des KeyRepository

use chrono::{SecondsFormat, Utc};
use clipvault_core::VideoId;

use crate::error::DbError;
use crate::models::KeyRecord;
use crate::repository::{DbResult, KeyRepository};
use crate::sqlite::pool::SqliteDb;

const UPSERT_SQL: &str = "INSERT INTO video_keys (video_id, key_data, iv, metadata, stored_at)
     VALUES (?, ?, ?, ?, ?)
     ON CONFLICT(video_id) DO UPDATE SET
        key_data = excluded.key_data,
        iv = excluded.iv,
        metadata = excluded.metadata,
        stored_at = excluded.stored_at";

impl KeyRepository for SqliteDb {
    async fn upsert(&self, record: &KeyRecord) -> DbResult<()> {
        let metadata = serde_json::to_string(&record.metadata)?;

        sqlx::query(UPSERT_SQL)
            .bind(record.video_id.as_str())
            .bind(&record.key_bytes)
            .bind(&record.iv_bytes)
            .bind(&metadata)
            .bind(zeit_zu_text(&record.stored_at))
            .execute(&self.pool)
            .await?;

        tracing::debug!(video_id = %record.video_id, "Schluessel gespeichert");
        Ok(())
    }

    async fn get(&self, video_id: &VideoId) -> DbResult<Option<KeyRecord>> {
        let row = sqlx::query(
            "SELECT video_id, key_data, iv, metadata, stored_at
             FROM video_keys WHERE video_id = ?",
        )
        .bind(video_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_key(&r)).transpose()
    }

    async fn delete(&self, video_id: &VideoId) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM video_keys WHERE video_id = ?")
            .bind(video_id.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn list_ids(&self) -> DbResult<Vec<VideoId>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT video_id FROM video_keys ORDER BY stored_at, video_id")
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().map(VideoId::from).collect())
    }

    async fn list_all(&self) -> DbResult<Vec<KeyRecord>> {
        let rows = sqlx::query(
            "SELECT video_id, key_data, iv, metadata, stored_at
             FROM video_keys ORDER BY stored_at, video_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_key).collect()
    }

    async fn upsert_many(&self, records: &[KeyRecord]) -> DbResult<usize> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            let metadata = serde_json::to_string(&record.metadata)?;
            sqlx::query(UPSERT_SQL)
                .bind(record.video_id.as_str())
                .bind(&record.key_bytes)
                .bind(&record.iv_bytes)
                .bind(&metadata)
                .bind(zeit_zu_text(&record.stored_at))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(anzahl = records.len(), "Schluessel-Stapel gespeichert");
        Ok(records.len())
    }

    async fn clear(&self) -> DbResult<u64> {
        let affected = sqlx::query("DELETE FROM video_keys")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(anzahl = affected, "Alle Schluessel geloescht");
        Ok(affected)
    }

    async fn count(&self) -> DbResult<u64> {
        let anzahl: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_keys")
            .fetch_one(&self.pool)
            .await?;

        Ok(anzahl.max(0) as u64)
    }
}

fn zeit_zu_text(zeit: &chrono::DateTime<Utc>) -> String {
    zeit.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn row_to_key(row: &sqlx::sqlite::SqliteRow) -> DbResult<KeyRecord> {
    use sqlx::Row as _;

    let video_id: String = row.try_get("video_id")?;
    let metadata_str: String = row.try_get("metadata")?;
    let metadata = serde_json::from_str(&metadata_str).map_err(|e| {
        DbError::UngueltigeDaten(format!("Metadaten fuer '{video_id}' beschaedigt: {e}"))
    })?;
    let stored_at = parse_db_timestamp(row.try_get("stored_at")?)?;

    Ok(KeyRecord {
        video_id: VideoId::from(video_id),
        key_bytes: row.try_get("key_data")?,
        iv_bytes: row.try_get("iv")?,
        metadata,
        stored_at,
    })
}

fn parse_db_timestamp(s: String) -> DbResult<chrono::DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc().fixed_offset())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige Zeitangabe '{s}': {e}")))
}
