use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::sales::{CreateSaleRequest, SaleDetail, SaleItemDetail, SaleList, SaleSummary},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_can_sell},
    models::PaymentMethod,
    response::{ApiResponse, Meta},
    routes::params::{SaleListQuery, SortOrder},
    sales::{CommittedSale, SaleProcessor},
    services::notification_service,
    state::AppState,
    store::orm::OrmSaleStore,
};

#[derive(FromRow)]
struct SaleRow {
    id: Uuid,
    sale_time: DateTime<Utc>,
    total_amount: i64,
    payment_method: String,
    customer_id: Option<Uuid>,
    customer_name: Option<String>,
    employee_id: Option<Uuid>,
    employee_name: Option<String>,
}

impl From<SaleRow> for SaleSummary {
    fn from(row: SaleRow) -> Self {
        SaleSummary {
            id: row.id,
            sale_time: row.sale_time,
            total_amount: row.total_amount,
            payment_method: row.payment_method,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
        }
    }
}

#[derive(FromRow)]
struct SaleItemRow {
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    unit_price: i64,
    subtotal: i64,
}

const SALE_COLUMNS: &str = r#"
    SELECT s.id, s.sale_time, s.total_amount, s.payment_method,
           s.customer_id, c.name AS customer_name,
           s.employee_id, e.name AS employee_name
    FROM sales s
    LEFT JOIN customers c ON c.id = s.customer_id
    LEFT JOIN employees e ON e.id = s.employee_id
"#;

pub async fn create_sale(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSaleRequest,
) -> AppResult<ApiResponse<CommittedSale>> {
    ensure_can_sell(user)?;

    let processor = SaleProcessor::new(OrmSaleStore::new(state.orm.clone()));
    let cart = processor.build_cart(&payload.items).await?;
    let ready = cart.finalize()?;
    let committed = processor
        .commit(user, ready, &payload.payment_method, payload.customer_id)
        .await?;

    if !committed.low_stock.is_empty() {
        if let Err(err) =
            notification_service::record_low_stock(&state.orm, &committed.low_stock).await
        {
            tracing::warn!(error = %err, sale_id = %committed.sale.id, "low stock notification failed");
        }
    }

    audit::record(
        &state.pool,
        Some(user.employee_id),
        "sale_create",
        "sales",
        serde_json::json!({
            "sale_id": committed.sale.id,
            "total_amount": committed.sale.total_amount,
            "payment_method": committed.sale.payment_method,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Sale completed",
        committed,
        Some(Meta::empty()),
    ))
}

pub async fn list_sales(
    state: &AppState,
    user: &AuthUser,
    query: SaleListQuery,
) -> AppResult<ApiResponse<SaleList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let employee_filter = visible_employee(user);
    let payment_filter = match query.payment_method.as_deref().filter(|m| !m.trim().is_empty()) {
        Some(method) => Some(method.parse::<PaymentMethod>()?.as_str()),
        None => None,
    };
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let sql = format!(
        r#"{SALE_COLUMNS}
        WHERE ($1::uuid IS NULL OR s.employee_id = $1)
          AND ($2::text IS NULL OR s.payment_method = $2)
        ORDER BY s.sale_time {}
        LIMIT $3 OFFSET $4
        "#,
        sort_order.as_sql()
    );

    let rows = sqlx::query_as::<_, SaleRow>(&sql)
        .bind(employee_filter)
        .bind(payment_filter)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM sales s
        WHERE ($1::uuid IS NULL OR s.employee_id = $1)
          AND ($2::text IS NULL OR s.payment_method = $2)
        "#,
    )
    .bind(employee_filter)
    .bind(payment_filter)
    .fetch_one(&state.pool)
    .await?;

    let items = rows.into_iter().map(SaleSummary::from).collect();
    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Sales", SaleList { items }, Some(meta)))
}

pub async fn get_sale(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SaleDetail>> {
    let sql = format!(
        r#"{SALE_COLUMNS}
        WHERE s.id = $1 AND ($2::uuid IS NULL OR s.employee_id = $2)
        "#
    );
    let sale = sqlx::query_as::<_, SaleRow>(&sql)
        .bind(id)
        .bind(visible_employee(user))
        .fetch_optional(&state.pool)
        .await?;
    let sale = match sale {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let items = sqlx::query_as::<_, SaleItemRow>(
        r#"
        SELECT si.product_id, p.name AS product_name, si.quantity, si.unit_price, si.subtotal
        FROM sale_items si
        JOIN products p ON p.id = si.product_id
        WHERE si.sale_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(sale.id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|row| SaleItemDetail {
        product_id: row.product_id,
        product_name: row.product_name,
        quantity: row.quantity,
        unit_price: row.unit_price,
        subtotal: row.subtotal,
    })
    .collect();

    Ok(ApiResponse::success(
        "Sale",
        SaleDetail {
            sale: sale.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Cashiers only see the sales they rang up.
fn visible_employee(user: &AuthUser) -> Option<Uuid> {
    if user.can_view_all_sales() {
        None
    } else {
        Some(user.employee_id)
    }
}
