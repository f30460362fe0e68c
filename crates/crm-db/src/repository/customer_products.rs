//! Customer-product link operations

use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{CustomerProduct, NewCustomerProduct};
use crate::repository::Database;
use crate::utils::format_timestamp;

const CUSTOMER_PRODUCT_COLUMNS: &str =
    "id, customer_id, product_id, status, created_at, updated_at";

impl Database {
    /// List all customer-product links, newest first
    pub async fn list_customer_products(&self) -> Result<Vec<CustomerProduct>, DbError> {
        let sql = format!(
            "SELECT {CUSTOMER_PRODUCT_COLUMNS} FROM customer_products ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| CustomerProduct::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a customer-product link by ID
    pub async fn get_customer_product(&self, id: &str) -> Result<Option<CustomerProduct>, DbError> {
        let sql = format!("SELECT {CUSTOMER_PRODUCT_COLUMNS} FROM customer_products WHERE id = ?");
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| CustomerProduct::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List a customer's products with the product name and status joined in
    pub async fn list_customer_products_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<CustomerProduct>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT cp.id, cp.customer_id, cp.product_id, cp.status, cp.created_at, cp.updated_at,
                   p.name as product_name, p.status as product_status
            FROM customer_products cp
            JOIN products p ON cp.product_id = p.id
            WHERE cp.customer_id = ?
            ORDER BY cp.created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| CustomerProduct::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Link a customer to a product
    pub async fn insert_customer_product(
        &self,
        link: NewCustomerProduct,
    ) -> Result<CustomerProduct, DbError> {
        let now = format_timestamp(&Utc::now());
        let sql = format!(
            r#"
            INSERT INTO customer_products (id, customer_id, product_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {CUSTOMER_PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(&link.customer_id)
            .bind(&link.product_id)
            .bind(link.status.unwrap_or_default().as_str())
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Customer or product does not exist"))?;

        CustomerProduct::try_from(&row).map_err(DbError::from)
    }

    /// Replace a customer-product link; a missing status keeps the stored one
    pub async fn update_customer_product(
        &self,
        id: &str,
        link: NewCustomerProduct,
    ) -> Result<CustomerProduct, DbError> {
        let sql = format!(
            r#"
            UPDATE customer_products
            SET customer_id = ?, product_id = ?, status = COALESCE(?, status), updated_at = ?
            WHERE id = ?
            RETURNING {CUSTOMER_PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&link.customer_id)
            .bind(&link.product_id)
            .bind(link.status.map(|s| s.as_str()))
            .bind(format_timestamp(&Utc::now()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Customer or product does not exist"))?
            .ok_or_else(|| DbError::NotFound("Customer product not found".to_string()))?;

        CustomerProduct::try_from(&row).map_err(DbError::from)
    }

    /// Delete a customer-product link
    pub async fn delete_customer_product(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM customer_products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("Customer product not found".to_string()));
        }
        Ok(())
    }
}
