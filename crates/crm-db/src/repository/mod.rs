//! Database repository implementation

use sqlx::{Row, SqlitePool};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::DbError;

// Submodules
mod activities;
mod customer_products;
mod customers;
mod interactions;
mod products;
mod users;

pub use customers::CustomerStats;
pub use interactions::InteractionStats;

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// At most `max_connections` connections are opened; further callers
    /// wait for a free connection.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, DbError> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create a private in-memory database
    ///
    /// Each SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        // Create tables if they don't exist
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                company TEXT,
                role TEXT NOT NULL DEFAULT 'sales',
                avatar TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                company TEXT,
                status TEXT NOT NULL DEFAULT 'lead',
                notes TEXT,
                name_lower TEXT NOT NULL DEFAULT '',
                email_lower TEXT NOT NULL DEFAULT '',
                company_lower TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        self.ensure_customer_search_columns().await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_customers_status ON customers(status)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS interactions (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
                type TEXT NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'scheduled',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_interactions_customer_id ON interactions(customer_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_interactions_date ON interactions(date)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                price REAL,
                category TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS customer_products (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
                product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                status TEXT NOT NULL DEFAULT 'interested',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                interaction_id TEXT NOT NULL REFERENCES interactions(id) ON DELETE CASCADE,
                type TEXT,
                title TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Add and backfill the lower-cased customer search columns on databases
    /// created before they existed
    async fn ensure_customer_search_columns(&self) -> Result<(), DbError> {
        let present: Option<String> = sqlx::query_scalar(
            "SELECT name FROM pragma_table_info('customers') WHERE name = 'name_lower'",
        )
        .fetch_optional(&self.pool)
        .await?;
        if present.is_some() {
            return Ok(());
        }

        info!("Adding customer search columns");
        for ddl in [
            "ALTER TABLE customers ADD COLUMN name_lower TEXT NOT NULL DEFAULT ''",
            "ALTER TABLE customers ADD COLUMN email_lower TEXT NOT NULL DEFAULT ''",
            "ALTER TABLE customers ADD COLUMN company_lower TEXT",
        ] {
            sqlx::query(ddl).execute(&self.pool).await?;
        }

        let rows = sqlx::query("SELECT id, name, email, company FROM customers")
            .fetch_all(&self.pool)
            .await?;
        for row in rows {
            let id: String = row.try_get("id")?;
            let name: String = row.try_get("name")?;
            let email: String = row.try_get("email")?;
            let company: Option<String> = row.try_get("company")?;
            sqlx::query(
                "UPDATE customers SET name_lower = ?, email_lower = ?, company_lower = ? WHERE id = ?",
            )
            .bind(name.to_lowercase())
            .bind(email.to_lowercase())
            .bind(company.map(|c| c.to_lowercase()))
            .bind(&id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}
