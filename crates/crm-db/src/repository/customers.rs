//! Customer operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Customer, CustomerStatus, NewCustomer};
use crate::repository::Database;
use crate::utils::{format_timestamp, like_pattern};

const CUSTOMER_COLUMNS: &str =
    "id, name, email, phone, company, status, notes, created_at, updated_at";

/// Customer counts partitioned by status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerStats {
    pub total: i64,
    pub leads: i64,
    pub customers: i64,
    pub inactive: i64,
}

impl Database {
    // ==================== Customer Operations ====================

    /// List all customers, newest first
    pub async fn list_customers(&self) -> Result<Vec<Customer>, DbError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| Customer::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a customer by ID
    pub async fn get_customer(&self, id: &str) -> Result<Option<Customer>, DbError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?");
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| Customer::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List customers with the given status, newest first
    pub async fn list_customers_by_status(
        &self,
        status: CustomerStatus,
    ) -> Result<Vec<Customer>, DbError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE status = ? ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Customer::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Insert a new customer
    pub async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, DbError> {
        let now = format_timestamp(&Utc::now());
        let sql = format!(
            r#"
            INSERT INTO customers (
                id, name, email, phone, company, status, notes,
                name_lower, email_lower, company_lower, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.phone)
            .bind(&customer.company)
            .bind(customer.status.unwrap_or_default().as_str())
            .bind(&customer.notes)
            .bind(customer.name.to_lowercase())
            .bind(customer.email.to_lowercase())
            .bind(customer.company.as_deref().map(str::to_lowercase))
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Invalid customer reference"))?;

        Customer::try_from(&row).map_err(DbError::from)
    }

    /// Replace a customer's fields
    ///
    /// A missing status keeps the stored one. Writing identical values still
    /// matches the row and is not an error.
    pub async fn update_customer(&self, id: &str, customer: NewCustomer) -> Result<Customer, DbError> {
        let sql = format!(
            r#"
            UPDATE customers
            SET name = ?, email = ?, phone = ?, company = ?, status = COALESCE(?, status), notes = ?,
                name_lower = ?, email_lower = ?, company_lower = ?, updated_at = ?
            WHERE id = ?
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.phone)
            .bind(&customer.company)
            .bind(customer.status.map(|s| s.as_str()))
            .bind(&customer.notes)
            .bind(customer.name.to_lowercase())
            .bind(customer.email.to_lowercase())
            .bind(customer.company.as_deref().map(str::to_lowercase))
            .bind(format_timestamp(&Utc::now()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Invalid customer reference"))?
            .ok_or_else(|| DbError::NotFound("Customer not found".to_string()))?;

        Customer::try_from(&row).map_err(DbError::from)
    }

    /// Delete a customer and, through the foreign keys, its interactions
    pub async fn delete_customer(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("Customer not found".to_string()));
        }
        Ok(())
    }

    /// Case-insensitive substring search across name, email and company
    ///
    /// Matching runs against the lower-cased copies kept alongside each row,
    /// so case folding covers all of Unicode rather than only ASCII.
    pub async fn search_customers(&self, query: &str) -> Result<Vec<Customer>, DbError> {
        let pattern = like_pattern(&query.to_lowercase());
        let sql = format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE name_lower LIKE ? ESCAPE '\'
               OR email_lower LIKE ? ESCAPE '\'
               OR company_lower LIKE ? ESCAPE '\'
            ORDER BY created_at DESC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Customer::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Case-insensitive substring search on name only
    pub async fn search_customers_by_name(&self, name: &str) -> Result<Vec<Customer>, DbError> {
        let sql = format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE name_lower LIKE ? ESCAPE '\'
            ORDER BY created_at DESC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(like_pattern(&name.to_lowercase()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Customer::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get customer statistics in a single pass
    pub async fn get_customer_stats(&self) -> Result<CustomerStats, DbError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                COALESCE(SUM(CASE WHEN status = 'lead' THEN 1 ELSE 0 END), 0) as leads,
                COALESCE(SUM(CASE WHEN status = 'customer' THEN 1 ELSE 0 END), 0) as customers,
                COALESCE(SUM(CASE WHEN status = 'inactive' THEN 1 ELSE 0 END), 0) as inactive
            FROM customers
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CustomerStats {
            total: row.try_get("total")?,
            leads: row.try_get("leads")?,
            customers: row.try_get("customers")?,
            inactive: row.try_get("inactive")?,
        })
    }
}
