use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    entity::notifications::ActiveModel as NotificationActive, error::AppResult,
    models::LowStockAlert,
};

pub const LOW_STOCK: &str = "low_stock";
pub const UNREAD: &str = "unread";

/// Stores one unread `low_stock` notification per alert.
pub async fn record_low_stock(
    conn: &DatabaseConnection,
    alerts: &[LowStockAlert],
) -> AppResult<usize> {
    for alert in alerts {
        NotificationActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(Some(alert.product_id)),
            message: Set(alert.message()),
            status: Set(UNREAD.to_string()),
            notification_type: Set(LOW_STOCK.to_string()),
            created_at: NotSet,
            read_at: Set(None),
        }
        .insert(conn)
        .await?;

        tracing::info!(
            product_id = %alert.product_id,
            remaining = alert.remaining,
            threshold = alert.threshold,
            "low stock notification created"
        );
    }
    Ok(alerts.len())
}
