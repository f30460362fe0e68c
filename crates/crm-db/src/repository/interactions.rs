//! Interaction operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Interaction, InteractionStatus, InteractionType, NewInteraction};
use crate::repository::Database;
use crate::utils::format_timestamp;

const INTERACTION_COLUMNS: &str =
    "id, customer_id, type, description, date, status, created_at, updated_at";

/// Joined projection used by every read query
const JOINED_SELECT: &str = r#"
    SELECT i.id, i.customer_id, i.type, i.description, i.date, i.status, i.created_at, i.updated_at,
           c.name as customer_name, c.email as customer_email
    FROM interactions i
    JOIN customers c ON i.customer_id = c.id
"#;

/// Interaction counts partitioned by status and by type
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionStats {
    pub total: i64,
    pub scheduled: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub calls: i64,
    pub emails: i64,
    pub meetings: i64,
    pub notes: i64,
}

impl Database {
    // ==================== Interaction Operations ====================

    async fn query_interactions(
        &self,
        filter: &str,
        order: &str,
        param: Option<String>,
    ) -> Result<Vec<Interaction>, DbError> {
        let sql = format!("{JOINED_SELECT} {filter} ORDER BY {order}");
        let mut query = sqlx::query(&sql);
        if let Some(param) = param {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| Interaction::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// List all interactions, newest date first
    pub async fn list_interactions(&self) -> Result<Vec<Interaction>, DbError> {
        self.query_interactions("", "i.date DESC", None).await
    }

    /// Get an interaction by ID
    pub async fn get_interaction(&self, id: &str) -> Result<Option<Interaction>, DbError> {
        let sql = format!("{JOINED_SELECT} WHERE i.id = ?");
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| Interaction::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List the interactions of one customer, newest date first
    pub async fn list_interactions_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Interaction>, DbError> {
        self.query_interactions(
            "WHERE i.customer_id = ?",
            "i.date DESC",
            Some(customer_id.to_string()),
        )
        .await
    }

    /// List interactions of one type, newest date first
    pub async fn list_interactions_by_type(
        &self,
        interaction_type: InteractionType,
    ) -> Result<Vec<Interaction>, DbError> {
        self.query_interactions(
            "WHERE i.type = ?",
            "i.date DESC",
            Some(interaction_type.as_str().to_string()),
        )
        .await
    }

    /// List interactions with one status, newest date first
    pub async fn list_interactions_by_status(
        &self,
        status: InteractionStatus,
    ) -> Result<Vec<Interaction>, DbError> {
        self.query_interactions(
            "WHERE i.status = ?",
            "i.date DESC",
            Some(status.as_str().to_string()),
        )
        .await
    }

    /// Scheduled interactions dated now or later, soonest first
    pub async fn list_upcoming_interactions(&self) -> Result<Vec<Interaction>, DbError> {
        self.query_interactions(
            "WHERE i.date >= ? AND i.status = 'scheduled'",
            "i.date ASC",
            Some(format_timestamp(&Utc::now())),
        )
        .await
    }

    /// Insert a new interaction
    ///
    /// Fails with `InvalidReference` when the customer does not exist.
    pub async fn insert_interaction(
        &self,
        interaction: NewInteraction,
    ) -> Result<Interaction, DbError> {
        let now = format_timestamp(&Utc::now());
        let sql = format!(
            r#"
            INSERT INTO interactions (id, customer_id, type, description, date, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {INTERACTION_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(&interaction.customer_id)
            .bind(interaction.interaction_type.as_str())
            .bind(&interaction.description)
            .bind(format_timestamp(&interaction.date))
            .bind(interaction.status.unwrap_or_default().as_str())
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Customer does not exist"))?;

        Interaction::try_from(&row).map_err(DbError::from)
    }

    /// Replace an interaction's fields; a missing status keeps the stored one
    pub async fn update_interaction(
        &self,
        id: &str,
        interaction: NewInteraction,
    ) -> Result<Interaction, DbError> {
        let sql = format!(
            r#"
            UPDATE interactions
            SET customer_id = ?, type = ?, description = ?, date = ?, status = COALESCE(?, status), updated_at = ?
            WHERE id = ?
            RETURNING {INTERACTION_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&interaction.customer_id)
            .bind(interaction.interaction_type.as_str())
            .bind(&interaction.description)
            .bind(format_timestamp(&interaction.date))
            .bind(interaction.status.map(|s| s.as_str()))
            .bind(format_timestamp(&Utc::now()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Customer does not exist"))?
            .ok_or_else(|| DbError::NotFound("Interaction not found".to_string()))?;

        Interaction::try_from(&row).map_err(DbError::from)
    }

    /// Delete an interaction and its activities
    pub async fn delete_interaction(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM interactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("Interaction not found".to_string()));
        }
        Ok(())
    }

    /// Get interaction statistics in a single pass
    pub async fn get_interaction_stats(&self) -> Result<InteractionStats, DbError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                COALESCE(SUM(CASE WHEN status = 'scheduled' THEN 1 ELSE 0 END), 0) as scheduled,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) as completed,
                COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) as cancelled,
                COALESCE(SUM(CASE WHEN type = 'call' THEN 1 ELSE 0 END), 0) as calls,
                COALESCE(SUM(CASE WHEN type = 'email' THEN 1 ELSE 0 END), 0) as emails,
                COALESCE(SUM(CASE WHEN type = 'meeting' THEN 1 ELSE 0 END), 0) as meetings,
                COALESCE(SUM(CASE WHEN type = 'note' THEN 1 ELSE 0 END), 0) as notes
            FROM interactions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(InteractionStats {
            total: row.try_get("total")?,
            scheduled: row.try_get("scheduled")?,
            completed: row.try_get("completed")?,
            cancelled: row.try_get("cancelled")?,
            calls: row.try_get("calls")?,
            emails: row.try_get("emails")?,
            meetings: row.try_get("meetings")?,
            notes: row.try_get("notes")?,
        })
    }
}
