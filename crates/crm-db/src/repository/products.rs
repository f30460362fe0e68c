//! Product operations

use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewProduct, Product};
use crate::repository::Database;
use crate::utils::format_timestamp;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category, status, created_at, updated_at";

impl Database {
    /// List all products, newest first
    pub async fn list_products(&self) -> Result<Vec<Product>, DbError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| Product::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a product by ID
    pub async fn get_product(&self, id: &str) -> Result<Option<Product>, DbError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| Product::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Insert a new product
    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, DbError> {
        let now = format_timestamp(&Utc::now());
        let sql = format!(
            r#"
            INSERT INTO products (id, name, description, price, category, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.category)
            .bind(product.status.unwrap_or_default().as_str())
            .bind(&now)
            .bind(&now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Invalid product reference"))?;

        Product::try_from(&row).map_err(DbError::from)
    }

    /// Replace a product's fields; a missing status keeps the stored one
    pub async fn update_product(&self, id: &str, product: NewProduct) -> Result<Product, DbError> {
        let sql = format!(
            r#"
            UPDATE products
            SET name = ?, description = ?, price = ?, category = ?, status = COALESCE(?, status), updated_at = ?
            WHERE id = ?
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.category)
            .bind(product.status.map(|s| s.as_str()))
            .bind(format_timestamp(&Utc::now()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Invalid product reference"))?
            .ok_or_else(|| DbError::NotFound("Product not found".to_string()))?;

        Product::try_from(&row).map_err(DbError::from)
    }

    /// Delete a product and its customer links
    pub async fn delete_product(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound("Product not found".to_string()));
        }
        Ok(())
    }
}
