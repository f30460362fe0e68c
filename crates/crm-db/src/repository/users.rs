//! User operations

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewUser, UpdateUser, User};
use crate::repository::Database;
use crate::utils::format_timestamp;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, company, role, avatar, created_at, updated_at";

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = format_timestamp(&Utc::now());

        // Check if user already exists
        if self.email_exists(&user.email, None).await? {
            return Err(DbError::Duplicate(format!("User '{}' already exists", user.email)));
        }

        let sql = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, company, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.company)
            .bind(user.role.as_str())
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Invalid user reference"))?;

        User::try_from(&row).map_err(DbError::from)
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let result = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all users, newest first
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Update the supplied profile fields, leaving the others untouched
    pub async fn update_user_profile(&self, id: &str, update: UpdateUser) -> Result<User, DbError> {
        let mut assignments = Vec::new();
        let mut params: Vec<Option<String>> = Vec::new();

        if let Some(name) = update.name {
            assignments.push("name = ?");
            params.push(Some(name));
        }
        if let Some(email) = update.email {
            assignments.push("email = ?");
            params.push(Some(email));
        }
        if let Some(company) = update.company {
            assignments.push("company = ?");
            params.push(company);
        }

        if assignments.is_empty() {
            return self
                .get_user_by_id(id)
                .await?
                .ok_or_else(|| DbError::NotFound("User not found".to_string()));
        }

        let sql = format!(
            "UPDATE users SET {}, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}",
            assignments.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for param in params {
            query = query.bind(param);
        }
        let row = query
            .bind(format_timestamp(&Utc::now()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Invalid user reference"))?
            .ok_or_else(|| DbError::NotFound("User not found".to_string()))?;

        User::try_from(&row).map_err(DbError::from)
    }

    /// Update user password
    pub async fn update_user_password(&self, id: &str, password_hash: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(format_timestamp(&Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user
    pub async fn delete_user(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    /// Check whether an email is registered, optionally ignoring one user
    pub async fn email_exists(&self, email: &str, exclude_id: Option<&str>) -> Result<bool, DbError> {
        let result = match exclude_id {
            Some(id) => {
                sqlx::query("SELECT COUNT(*) as count FROM users WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT COUNT(*) as count FROM users WHERE email = ?")
                    .bind(email)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        let count: i64 = result.get("count");
        Ok(count > 0)
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}
