use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use validator::Validate;

use crate::{
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult, duplicate_field, on_unique_violation},
    middleware::auth::AuthUser,
    models::UserResource,
    response::{ApiResponse, Meta},
    services::customer_service::hash_password,
    state::AppState,
};

const TOKEN_TTL_HOURS: i64 = 24;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserResource>> {
    payload.validate()?;
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;

    let taken = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::invalid("email", "The email has already been taken."));
    }

    let user = UserActive {
        name: Set(name),
        email: Set(email),
        password_hash: Set(hash_password(&password)?),
        ..Default::default()
    }
    .insert(&state.orm)
    .await
    .map_err(|err| on_unique_violation(err, |msg| duplicate_field(msg, &["email"])))?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(ApiResponse::success(
        "User created",
        UserResource::from(user),
        Some(Meta::empty()),
    ))
}

pub fn issue_token(user_id: i64, role: &str, secret: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        tracing::debug!(user_id = user.id, "login rejected");
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = issue_token(user.id, &user.role, &state.config.jwt_secret)?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {token}"),
        },
        Some(Meta::empty()),
    ))
}

pub async fn current_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserResource>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;
    Ok(ApiResponse::success(
        "Current user",
        UserResource::from(model),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::{ADMIN_ROLE, decode_token};

    #[test]
    fn issued_token_decodes_to_same_user() {
        let token = issue_token(42, ADMIN_ROLE, "test-secret").unwrap();
        let user = decode_token(&token, "test-secret").unwrap();
        assert_eq!(user.user_id, 42);
        assert!(user.is_admin());

        assert!(decode_token(&token, "other-secret").is_err());
    }
}
