use std::sync::Once;

use axum::{
    extract::FromRequestParts,
    http::{Request, header},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use pos_inventory_api::{
    dto::auth::Claims,
    error::AppError,
    middleware::auth::{AuthUser, ensure_can_sell},
    models::{Employee, EmployeeRole},
    services::auth_service::issue_token,
};
use uuid::Uuid;

const SECRET: &str = "session-test-secret";

fn init_secret() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // SAFETY: every test in this binary reads the secret only after this call.
        unsafe { std::env::set_var("JWT_SECRET", SECRET) };
    });
}

async fn extract(authorization: Option<&str>) -> Result<AuthUser, AppError> {
    let mut builder = Request::builder().uri("/api/sales");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (mut parts, _) = builder.body(()).expect("request").into_parts();
    AuthUser::from_request_parts(&mut parts, &()).await
}

#[tokio::test]
async fn issued_token_decodes_into_session() {
    init_secret();
    let employee = Employee {
        id: Uuid::new_v4(),
        name: "Carol Davis".into(),
        role: EmployeeRole::Manager,
        username: "carold".into(),
    };
    let token = issue_token(&employee).expect("token");

    let user = extract(Some(&format!("Bearer {token}"))).await.expect("session");
    assert_eq!(user.employee_id, employee.id);
    assert_eq!(user.name, "Carol Davis");
    assert_eq!(user.role, EmployeeRole::Manager);
    assert!(user.can_view_all_sales());
    assert!(ensure_can_sell(&user).is_ok());
}

#[tokio::test]
async fn missing_or_malformed_authorization_is_rejected() {
    init_secret();

    for header_value in [None, Some("Basic YWxpY2VqOmFkbWluMTIz"), Some("Bearer not-a-jwt")] {
        let err = extract(header_value).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)), "{header_value:?}");
    }
}

#[tokio::test]
async fn unknown_role_in_token_is_rejected() {
    init_secret();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        name: "Night Guard".into(),
        role: "JANITOR".into(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token");

    let err = extract(Some(&format!("Bearer {token}"))).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(ref m) if m.contains("role")));
}

#[tokio::test]
async fn cashier_session_sees_only_own_sales() {
    init_secret();
    let employee = Employee {
        id: Uuid::new_v4(),
        name: "Bob Smith".into(),
        role: EmployeeRole::Cashier,
        username: "bobs".into(),
    };
    let token = issue_token(&employee).expect("token");

    let user = extract(Some(&format!("Bearer {token}"))).await.expect("session");
    assert_eq!(user.role, EmployeeRole::Cashier);
    assert!(!user.can_view_all_sales());
}
