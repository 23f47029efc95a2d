use chrono::{DateTime, Utc};
use tracker_core::model::{Unit, UnitId};

use super::SqliteRepository;
use super::mapping::{map_unit_row, topics_to_json, unit_id_from_i64, unit_id_to_i64};
use crate::repository::{NewUnitRecord, StorageError, UnitRepository};

const UNIT_COLUMNS: &str =
    "id, subject, unit_name, topics, covered, last_reminded, created_at, updated_at";

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn require_row(rows_affected: u64) -> Result<(), StorageError> {
    if rows_affected == 0 {
        Err(StorageError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait::async_trait]
impl UnitRepository for SqliteRepository {
    async fn insert_new_unit(&self, unit: NewUnitRecord) -> Result<UnitId, StorageError> {
        let topics = topics_to_json(&unit.topics)?;

        let res = sqlx::query(
            r"
            INSERT INTO units (subject, unit_name, topics, covered, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(unit.subject)
        .bind(unit.unit_name)
        .bind(topics)
        .bind(i64::from(unit.covered))
        .bind(unit.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        unit_id_from_i64(res.last_insert_rowid())
    }

    async fn upsert_unit(&self, unit: &Unit) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO units (id, subject, unit_name, topics, covered, last_reminded, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                subject = excluded.subject,
                unit_name = excluded.unit_name,
                topics = excluded.topics,
                covered = excluded.covered,
                last_reminded = CASE
                    WHEN units.last_reminded IS NULL
                        OR excluded.last_reminded > units.last_reminded
                    THEN excluded.last_reminded
                    ELSE units.last_reminded
                END,
                updated_at = excluded.updated_at
            ",
        )
        .bind(unit_id_to_i64(unit.id())?)
        .bind(unit.subject())
        .bind(unit.name())
        .bind(topics_to_json(unit.topics())?)
        .bind(i64::from(unit.covered()))
        .bind(unit.last_reminded())
        .bind(unit.created_at())
        .bind(unit.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_unit(&self, id: UnitId) -> Result<Option<Unit>, StorageError> {
        let sql = format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(unit_id_to_i64(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_unit_row).transpose()
    }

    async fn list_units(&self) -> Result<Vec<Unit>, StorageError> {
        let sql = format!("SELECT {UNIT_COLUMNS} FROM units ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut units = Vec::with_capacity(rows.len());
        for row in &rows {
            match map_unit_row(row) {
                Ok(unit) => units.push(unit),
                Err(err) => tracing::warn!(error = %err, "skipping unreadable unit row"),
            }
        }
        Ok(units)
    }

    async fn update_progress(&self, unit: &Unit) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE units SET topics = ?1, covered = ?2 WHERE id = ?3")
            .bind(topics_to_json(unit.topics())?)
            .bind(i64::from(unit.covered()))
            .bind(unit_id_to_i64(unit.id())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        require_row(res.rows_affected())
    }

    async fn update_unit(&self, unit: &Unit) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE units
            SET subject = ?1, unit_name = ?2, topics = ?3, covered = ?4, updated_at = ?5
            WHERE id = ?6
            ",
        )
        .bind(unit.subject())
        .bind(unit.name())
        .bind(topics_to_json(unit.topics())?)
        .bind(i64::from(unit.covered()))
        .bind(unit.updated_at())
        .bind(unit_id_to_i64(unit.id())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        require_row(res.rows_affected())
    }

    async fn delete_unit(&self, id: UnitId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM units WHERE id = ?1")
            .bind(unit_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        require_row(res.rows_affected())
    }

    async fn update_last_reminded(
        &self,
        id: UnitId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let id = unit_id_to_i64(id)?;
        let res = sqlx::query(
            r"
            UPDATE units SET last_reminded = ?1
            WHERE id = ?2 AND (last_reminded IS NULL OR last_reminded < ?1)
            ",
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        if res.rows_affected() > 0 {
            return Ok(());
        }

        // Older timestamp: nothing to write, but the unit must exist.
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM units WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        existing.map(|_| ()).ok_or(StorageError::NotFound)
    }
}
