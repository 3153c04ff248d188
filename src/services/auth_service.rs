use axum::Extension;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::db::UserStore;
use crate::db::models::User;
use crate::web::error::AppError;
use crate::web::models::{
    AuthenticatedUser, Claims, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest,
};

/// Lifetime of an issued session token.
pub const TOKEN_TTL_HOURS: i64 = 24;

pub async fn login_user(
    store: &UserStore,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            t!("auth.login_fields_required").to_string(),
        ));
    }

    let user = store
        .find_by_email(&req.email)
        .await
        .ok_or(AppError::InvalidCredentials)?;

    // Demo accounts keep their passwords as entered.
    if user.password != req.password {
        return Err(AppError::InvalidCredentials);
    }

    create_session(&user, jwt_secret)
}

pub async fn register_user(
    store: &UserStore,
    req: RegisterRequest,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() || req.name.is_empty() {
        return Err(AppError::InvalidInput(
            t!("auth.register_fields_required").to_string(),
        ));
    }

    let user = store.insert(&req.email, &req.password, &req.name).await?;
    tracing::info!(user_id = user.id, email = %user.email, "Registered new user.");

    create_session(&user, jwt_secret)
}

pub fn create_session(user: &User, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    let token = create_token(user, jwt_secret)?;
    Ok(LoginResponse {
        success: true,
        token,
        user: user.summary(),
    })
}

pub fn create_token(user: &User, jwt_secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )?;
    Ok(token)
}

pub fn decode_token(token: &str, jwt_secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub async fn profile(
    store: &UserStore,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ProfileResponse, AppError> {
    let user = store
        .find_by_id(user.id)
        .await
        .ok_or_else(|| AppError::NotFound(t!("user.not_found").to_string()))?;

    Ok(ProfileResponse {
        success: true,
        user: user.summary_with_created_at(),
    })
}
