//! Database models

use crate::utils::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidUserRole(String),
    InvalidCustomerStatus(String),
    InvalidInteractionType(String),
    InvalidInteractionStatus(String),
    InvalidProductStatus(String),
    InvalidCustomerProductStatus(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidUserRole(s) => write!(f, "Invalid user role: {}", s),
            ParseError::InvalidCustomerStatus(s) => write!(f, "Invalid customer status: {}", s),
            ParseError::InvalidInteractionType(s) => write!(f, "Invalid interaction type: {}", s),
            ParseError::InvalidInteractionStatus(s) => {
                write!(f, "Invalid interaction status: {}", s)
            }
            ParseError::InvalidProductStatus(s) => write!(f, "Invalid product status: {}", s),
            ParseError::InvalidCustomerProductStatus(s) => {
                write!(f, "Invalid customer product status: {}", s)
            }
        }
    }
}

impl std::error::Error for ParseError {}

// ==================== Enumerations ====================

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Sales,
    Support,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Sales => "sales",
            UserRole::Support => "support",
        }
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "sales" => Ok(UserRole::Sales),
            "support" => Ok(UserRole::Support),
            _ => Err(ParseError::InvalidUserRole(s.to_string())),
        }
    }
}

/// Position of a customer in the sales pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Lead,
    Customer,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Lead => "lead",
            CustomerStatus::Customer => "customer",
            CustomerStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for CustomerStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(CustomerStatus::Lead),
            "customer" => Ok(CustomerStatus::Customer),
            "inactive" => Ok(CustomerStatus::Inactive),
            _ => Err(ParseError::InvalidCustomerStatus(s.to_string())),
        }
    }
}

/// Interaction channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Call,
    Email,
    Meeting,
    Note,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Call => "call",
            InteractionType::Email => "email",
            InteractionType::Meeting => "meeting",
            InteractionType::Note => "note",
        }
    }
}

impl FromStr for InteractionType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(InteractionType::Call),
            "email" => Ok(InteractionType::Email),
            "meeting" => Ok(InteractionType::Meeting),
            "note" => Ok(InteractionType::Note),
            _ => Err(ParseError::InvalidInteractionType(s.to_string())),
        }
    }
}

/// Interaction status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::Scheduled => "scheduled",
            InteractionStatus::Completed => "completed",
            InteractionStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for InteractionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(InteractionStatus::Scheduled),
            "completed" => Ok(InteractionStatus::Completed),
            "cancelled" => Ok(InteractionStatus::Cancelled),
            _ => Err(ParseError::InvalidInteractionStatus(s.to_string())),
        }
    }
}

/// Product availability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            _ => Err(ParseError::InvalidProductStatus(s.to_string())),
        }
    }
}

/// Progress of a customer towards a product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerProductStatus {
    #[default]
    Interested,
    InProgress,
    Purchased,
    Cancelled,
}

impl CustomerProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerProductStatus::Interested => "interested",
            CustomerProductStatus::InProgress => "in_progress",
            CustomerProductStatus::Purchased => "purchased",
            CustomerProductStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for CustomerProductStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interested" => Ok(CustomerProductStatus::Interested),
            "in_progress" => Ok(CustomerProductStatus::InProgress),
            "purchased" => Ok(CustomerProductStatus::Purchased),
            "cancelled" => Ok(CustomerProductStatus::Cancelled),
            _ => Err(ParseError::InvalidCustomerProductStatus(s.to_string())),
        }
    }
}

// ==================== Users ====================

/// User model
///
/// The password hash never leaves the process: it is skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub company: Option<String>,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub company: Option<String>,
    pub role: UserRole,
}

/// Update user (for partial updates)
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `Some(None)` clears the company
    pub company: Option<Option<String>>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.company.is_none()
    }
}

// ==================== Customers ====================

/// Customer model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: CustomerStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer fields supplied by clients, used for both insert and update
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    /// Defaults to `lead` on insert; keeps the stored value on update
    pub status: Option<CustomerStatus>,
    pub notes: Option<String>,
}

// ==================== Interactions ====================

/// Interaction model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub customer_id: String,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    pub description: String,
    pub date: DateTime<Utc>,
    pub status: InteractionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
}

/// Interaction fields supplied by clients, used for both insert and update
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub customer_id: String,
    pub interaction_type: InteractionType,
    pub description: String,
    pub date: DateTime<Utc>,
    /// Defaults to `scheduled` on insert; keeps the stored value on update
    pub status: Option<InteractionStatus>,
}

// ==================== Products ====================

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields supplied by clients
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
}

/// Link between a customer and a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProduct {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub status: CustomerProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_status: Option<ProductStatus>,
}

/// Customer-product fields supplied by clients
#[derive(Debug, Clone)]
pub struct NewCustomerProduct {
    pub customer_id: String,
    pub product_id: String,
    pub status: Option<CustomerProductStatus>,
}

// ==================== Activities ====================

/// Activity recorded against an interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub interaction_id: String,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Activity fields supplied by clients
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub interaction_id: String,
    pub activity_type: Option<String>,
    pub title: String,
    pub description: Option<String>,
}

// ==================== TryFrom Implementations ====================

fn decode_error<E>(column: &str, err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    }
}

/// Read a stored RFC3339 timestamp, rejecting values that do not parse
fn timestamp_column(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    parse_timestamp(&raw).map_err(|e| decode_error(column, e))
}

/// Read a stored enumeration by its wire name
fn enum_column<T>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = ParseError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e| decode_error(column, e))
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            company: row.try_get("company")?,
            role: enum_column(row, "role")?,
            avatar: row.try_get("avatar")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Customer {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            company: row.try_get("company")?,
            status: enum_column(row, "status")?,
            notes: row.try_get("notes")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Interaction {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Interaction {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            interaction_type: enum_column(row, "type")?,
            description: row.try_get("description")?,
            date: timestamp_column(row, "date")?,
            status: enum_column(row, "status")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
            // Only present on joined queries
            customer_name: row.try_get::<Option<String>, _>("customer_name").ok().flatten(),
            customer_email: row.try_get::<Option<String>, _>("customer_email").ok().flatten(),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Product {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            category: row.try_get("category")?,
            status: enum_column(row, "status")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for CustomerProduct {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(CustomerProduct {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            product_id: row.try_get("product_id")?,
            status: enum_column(row, "status")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
            product_name: row.try_get::<Option<String>, _>("product_name").ok().flatten(),
            product_status: row
                .try_get::<Option<String>, _>("product_status")
                .ok()
                .flatten()
                .and_then(|s| ProductStatus::from_str(&s).ok()),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Activity {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Activity {
            id: row.try_get("id")?,
            interaction_id: row.try_get("interaction_id")?,
            activity_type: row.try_get("type")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            created_at: timestamp_column(row, "created_at")?,
            updated_at: timestamp_column(row, "updated_at")?,
        })
    }
}
