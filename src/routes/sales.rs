use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::sales::{CreateSaleRequest, SaleDetail, SaleList},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::SaleListQuery,
    sales::CommittedSale,
    services::sale_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/{id}", get(get_sale))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale committed", body = ApiResponse<CommittedSale>),
        (status = 400, description = "Empty cart, invalid quantity or payment method"),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product or customer not found"),
        (status = 409, description = "Insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSaleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CommittedSale>>)> {
    let resp = sale_service::create_sale(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/sales",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("payment_method" = Option<String>, Query, description = "CASH, CARD, UPI or WALLET"),
        ("sort_order" = Option<String>, Query, description = "Sort by sale time: asc, desc")
    ),
    responses(
        (status = 200, description = "List sales", body = ApiResponse<SaleList>),
        (status = 400, description = "Invalid payment method filter"),
        (status = 401, description = "Missing or invalid session"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SaleListQuery>,
) -> AppResult<Json<ApiResponse<SaleList>>> {
    let resp = sale_service::list_sales(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    params(
        ("id" = Uuid, Path, description = "Sale ID")
    ),
    responses(
        (status = 200, description = "Sale with line items", body = ApiResponse<SaleDetail>),
        (status = 401, description = "Missing or invalid session"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SaleDetail>>> {
    let resp = sale_service::get_sale(&state, &user, id).await?;
    Ok(Json(resp))
}
