use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::{
        AuthResponse, Claims, LoginRequest, OAuthRequest, RegisterRequest, UpdateProfileRequest,
        UserProfile,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
};

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let RegisterRequest {
        email,
        password,
        display_name,
    } = payload;

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();

    let id = Uuid::new_v4();

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, display_name)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(email.as_str())
    .bind(password_hash)
    .bind(display_name)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let token = issue_token(&user)?;
    let resp = AuthResponse {
        token,
        user: user.into(),
    };
    Ok(ApiResponse::success("User created", resp, None))
}

pub async fn login_user(
    pool: &DbPool,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let LoginRequest { email, password } = payload;
    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::BadRequest("Invalid email or password".to_string()))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let token = issue_token(&user)?;
    let resp = AuthResponse {
        token,
        user: user.into(),
    };
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Federated sign-in: the upstream provider already authenticated the
/// subject, so this only finds-or-creates the user record.
pub async fn oauth_user(
    pool: &DbPool,
    payload: OAuthRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let existing: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(pool)
        .await?;

    let user = match existing {
        Some(u) => u,
        None => {
            // Federated accounts carry no local password.
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (id, email, password_hash, display_name, photo_url)
                VALUES ($1, $2, '', $3, $4)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(payload.email.as_str())
            .bind(payload.display_name.as_deref())
            .bind(payload.photo_url.as_deref())
            .fetch_one(pool)
            .await?
        }
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_oauth_login",
        Some("users"),
        Some(serde_json::json!({ "provider": payload.provider })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let token = issue_token(&user)?;
    let resp = AuthResponse {
        token,
        user: user.into(),
    };
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Resolves the identity and its administrator flag from the stored record.
/// A missing record degrades to a non-admin view rather than failing; the
/// record can lag the auth event.
pub async fn me(pool: &DbPool, auth: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(pool)
        .await?;

    let profile = match user {
        Some(u) => u.into(),
        None => UserProfile {
            id: auth.user_id,
            email: String::new(),
            display_name: None,
            photo_url: None,
            is_admin: false,
        },
    };

    Ok(ApiResponse::success("OK", profile, None))
}

pub async fn update_profile(
    pool: &DbPool,
    auth: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let user: Option<User> = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET display_name = COALESCE($2, display_name),
            photo_url = COALESCE($3, photo_url)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.display_name.as_deref())
    .bind(payload.photo_url.as_deref())
    .fetch_optional(pool)
    .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success("Profile updated", user.into(), None))
}

fn issue_token(user: &User) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(format!("Bearer {token}"))
}
