use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::sales::SaleLineRequest;

/// The acting employee comes from the session token, never from the body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSaleRequest {
    pub items: Vec<SaleLineRequest>,
    pub payment_method: String,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleSummary {
    pub id: Uuid,
    pub sale_time: DateTime<Utc>,
    pub total_amount: i64,
    pub payment_method: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub employee_id: Option<Uuid>,
    pub employee_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleItemDetail {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleDetail {
    pub sale: SaleSummary,
    pub items: Vec<SaleItemDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleList {
    pub items: Vec<SaleSummary>,
}
