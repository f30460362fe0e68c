//! Response envelope and request DTOs

use chrono::{DateTime, Utc};
use crm_core::non_blank;
use crm_db::utils::parse_client_datetime;
use crm_db::{
    CustomerProductStatus, CustomerStatus, InteractionStatus, InteractionType, NewActivity,
    NewCustomer, NewCustomerProduct, NewInteraction, NewProduct, ProductStatus,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ==================== Envelope ====================

/// `{success, data?, message}` wrapper shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: message.into(),
        }
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

// ==================== Query Types ====================

/// `?q=` for customer search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// `?name=` for customer name search
#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

// ==================== Customer Types ====================

/// Customer create/update body
#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: Option<CustomerStatus>,
    pub notes: Option<String>,
}

impl TryFrom<CustomerRequest> for NewCustomer {
    type Error = ApiError;

    fn try_from(req: CustomerRequest) -> Result<Self, Self::Error> {
        let (Some(name), Some(email)) = (owned(req.name.as_deref()), owned(req.email.as_deref()))
        else {
            return Err(ApiError::BadRequest("Name and email are required".to_string()));
        };
        Ok(NewCustomer {
            name,
            email,
            phone: owned(req.phone.as_deref()),
            company: owned(req.company.as_deref()),
            status: req.status,
            notes: req.notes,
        })
    }
}

// ==================== Interaction Types ====================

/// Interaction create/update body
#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub customer_id: Option<String>,
    #[serde(rename = "type")]
    pub interaction_type: Option<InteractionType>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub status: Option<InteractionStatus>,
}

impl TryFrom<InteractionRequest> for NewInteraction {
    type Error = ApiError;

    fn try_from(req: InteractionRequest) -> Result<Self, Self::Error> {
        let (Some(customer_id), Some(interaction_type), Some(description), Some(date)) = (
            owned(req.customer_id.as_deref()),
            req.interaction_type,
            owned(req.description.as_deref()),
            non_blank(req.date.as_deref()),
        ) else {
            return Err(ApiError::BadRequest(
                "Customer ID, type, description, and date are required".to_string(),
            ));
        };
        let date: DateTime<Utc> = parse_client_datetime(date)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid date: {date}")))?;

        Ok(NewInteraction {
            customer_id,
            interaction_type,
            description,
            date,
            status: req.status,
        })
    }
}

// ==================== Product Types ====================

/// Product create/update body
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
}

impl TryFrom<ProductRequest> for NewProduct {
    type Error = ApiError;

    fn try_from(req: ProductRequest) -> Result<Self, Self::Error> {
        let name = owned(req.name.as_deref())
            .ok_or_else(|| ApiError::BadRequest("Product name is required".to_string()))?;
        Ok(NewProduct {
            name,
            description: req.description,
            price: req.price,
            category: owned(req.category.as_deref()),
            status: req.status,
        })
    }
}

// ==================== Customer Product Types ====================

/// Customer-product create/update body
#[derive(Debug, Deserialize)]
pub struct CustomerProductRequest {
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub status: Option<CustomerProductStatus>,
}

impl TryFrom<CustomerProductRequest> for NewCustomerProduct {
    type Error = ApiError;

    fn try_from(req: CustomerProductRequest) -> Result<Self, Self::Error> {
        let (Some(customer_id), Some(product_id)) = (
            owned(req.customer_id.as_deref()),
            owned(req.product_id.as_deref()),
        ) else {
            return Err(ApiError::BadRequest(
                "Customer ID and product ID are required".to_string(),
            ));
        };
        Ok(NewCustomerProduct {
            customer_id,
            product_id,
            status: req.status,
        })
    }
}

// ==================== Activity Types ====================

/// Activity create/update body
#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    pub interaction_id: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TryFrom<ActivityRequest> for NewActivity {
    type Error = ApiError;

    fn try_from(req: ActivityRequest) -> Result<Self, Self::Error> {
        let (Some(interaction_id), Some(title)) = (
            owned(req.interaction_id.as_deref()),
            owned(req.title.as_deref()),
        ) else {
            return Err(ApiError::BadRequest(
                "Interaction ID and title are required".to_string(),
            ));
        };
        Ok(NewActivity {
            interaction_id,
            activity_type: owned(req.activity_type.as_deref()),
            title,
            description: req.description,
        })
    }
}
