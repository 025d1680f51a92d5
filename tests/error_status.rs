use axum::{http::StatusCode, response::IntoResponse};
use pos_inventory_api::{error::AppError, sales::SaleError, store::StoreError};
use uuid::Uuid;

#[test]
fn sale_errors_map_to_http_statuses() {
    let id = Uuid::new_v4();
    let cases = [
        (SaleError::ProductNotFound(id), StatusCode::NOT_FOUND),
        (SaleError::CustomerNotFound(id), StatusCode::NOT_FOUND),
        (
            SaleError::InsufficientStock {
                product_id: id,
                requested: 3,
                available: 2,
            },
            StatusCode::CONFLICT,
        ),
        (SaleError::EmptyCart, StatusCode::BAD_REQUEST),
        (SaleError::InvalidQuantity(0), StatusCode::BAD_REQUEST),
        (
            SaleError::InvalidPaymentMethod("CHEQUE".into()),
            StatusCode::BAD_REQUEST,
        ),
        (
            SaleError::CommitFailure(StoreError::Unavailable("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            SaleError::Store(StoreError::Unavailable("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, expected) in cases {
        let label = err.to_string();
        assert_eq!(AppError::from(err).status(), expected, "{label}");
    }
}

#[test]
fn app_errors_map_to_http_statuses() {
    assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        AppError::BadRequest("username is required".into()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::Unauthorized("Missing Authorization header".into()).status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        AppError::Internal(anyhow::anyhow!("boom")).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn error_response_carries_the_mapped_status() {
    let response = AppError::from(SaleError::EmptyCart).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
