use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    audit,
    config::{jwt_secret, jwt_ttl_hours},
    dto::auth::{Claims, LoginRequest, LoginResponse},
    entity::employees::{Column as EmployeeCol, Entity as Employees},
    error::{AppError, AppResult},
    models::{Employee, EmployeeRole},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(employee: &Employee) -> AppResult<String> {
    let secret = jwt_secret()?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(jwt_ttl_hours()))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: employee.id.to_string(),
        name: employee.name.clone(),
        role: employee.role.as_str().to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn login_employee(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("username is required".into()));
    }

    let employee = Employees::find()
        .filter(EmployeeCol::Username.eq(username))
        .one(&state.orm)
        .await?;

    let employee = match employee {
        Some(e) => e,
        None => return Err(AppError::Unauthorized("Invalid username or password".into())),
    };

    if !verify_password(&password, &employee.password_hash)? {
        tracing::info!(username, "login rejected");
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    }

    let role = EmployeeRole::parse(&employee.role).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("employee {} has unknown role", employee.id))
    })?;

    let employee = Employee {
        id: employee.id,
        name: employee.name,
        role,
        username: employee.username,
    };
    let token = issue_token(&employee)?;

    audit::record(
        &state.pool,
        Some(employee.id),
        "employee_login",
        "employees",
        serde_json::json!({ "employee_id": employee.id }),
    )
    .await;

    tracing::info!(employee_id = %employee.id, role = role.as_str(), "employee logged in");

    Ok(ApiResponse::success(
        format!("Welcome {}!", employee.name),
        LoginResponse {
            token: format!("Bearer {}", token),
            employee,
        },
        Some(Meta::empty()),
    ))
}
