use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{config::jwt_secret, dto::auth::Claims, error::AppError, models::EmployeeRole};

/// The acting employee, decoded from the bearer token and handed explicitly
/// to every service call.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: Uuid,
    pub name: String,
    pub role: EmployeeRole,
}

impl AuthUser {
    pub fn can_view_all_sales(&self) -> bool {
        matches!(self.role, EmployeeRole::Admin | EmployeeRole::Manager)
    }
}

pub fn ensure_any_role(user: &AuthUser, allowed: &[EmployeeRole]) -> Result<(), AppError> {
    if !allowed.contains(&user.role) {
        tracing::debug!(employee_id = %user.employee_id, role = user.role.as_str(), "permission denied");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_can_sell(user: &AuthUser) -> Result<(), AppError> {
    ensure_any_role(
        user,
        &[EmployeeRole::Cashier, EmployeeRole::Manager, EmployeeRole::Admin],
    )
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
            .trim();

        let secret = jwt_secret()?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let employee_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid employee id in token".into()))?;
        let role = EmployeeRole::parse(&decoded.claims.role)
            .ok_or_else(|| AppError::Unauthorized("Unknown role in token".into()))?;

        Ok(AuthUser {
            employee_id,
            name: decoded.claims.name,
            role,
        })
    }
}
