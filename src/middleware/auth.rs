use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::{dto::auth::Claims, error::AppError, state::AppState};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Owners may mutate their own rows; admins may mutate anything.
pub fn ensure_owner_or_admin(user: &AuthUser, owner_id: i64) -> Result<(), AppError> {
    if user.user_id != owner_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = decoded
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
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

        decode_token(token, &state.config.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: &str) -> AuthUser {
        AuthUser {
            user_id: id,
            role: role.into(),
        }
    }

    #[test]
    fn owner_and_admin_pass() {
        assert!(ensure_owner_or_admin(&user(1, "user"), 1).is_ok());
        assert!(ensure_owner_or_admin(&user(2, ADMIN_ROLE), 1).is_ok());
        assert!(matches!(
            ensure_owner_or_admin(&user(2, "user"), 1),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        assert!(matches!(
            decode_token("not-a-jwt", "secret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
