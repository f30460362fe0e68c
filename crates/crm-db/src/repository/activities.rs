//! Activity operations

use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Activity, NewActivity};
use crate::repository::Database;
use crate::utils::format_timestamp;

const ACTIVITY_COLUMNS: &str =
    "id, interaction_id, type, title, description, created_at, updated_at";

impl Database {
    /// List all activities, newest first
    pub async fn list_activities(&self) -> Result<Vec<Activity>, DbError> {
        let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities ORDER BY created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| Activity::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get an activity by ID
    pub async fn get_activity(&self, id: &str) -> Result<Option<Activity>, DbError> {
        let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?");
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| Activity::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Record an activity against an interaction
    pub async fn insert_activity(&self, activity: NewActivity) -> Result<Activity, DbError> {
        let now = format_timestamp(&Utc::now());
        let sql = format!(
            r#"
            INSERT INTO activities (id, interaction_id, type, title, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {ACTIVITY_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(&activity.interaction_id)
            .bind(&activity.activity_type)
            .bind(&activity.title)
            .bind(&activity.description)
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Interaction does not exist"))?;

        Activity::try_from(&row).map_err(DbError::from)
    }

    /// Replace an activity's fields
    pub async fn update_activity(&self, id: &str, activity: NewActivity) -> Result<Activity, DbError> {
        let sql = format!(
            r#"
            UPDATE activities
            SET interaction_id = ?, type = ?, title = ?, description = ?, updated_at = ?
            WHERE id = ?
            RETURNING {ACTIVITY_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&activity.interaction_id)
            .bind(&activity.activity_type)
            .bind(&activity.title)
            .bind(&activity.description)
            .bind(format_timestamp(&Utc::now()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Interaction does not exist"))?
            .ok_or_else(|| DbError::NotFound("Activity not found".to_string()))?;

        Activity::try_from(&row).map_err(DbError::from)
    }

    /// Delete an activity
    pub async fn delete_activity(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM activities WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("Activity not found".to_string()));
        }
        Ok(())
    }
}
