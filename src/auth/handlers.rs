use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::LoginRequest,
        password::{hash_password_blocking, verify_against_dummy, verify_password_blocking},
        session::{removal_cookie, session_cookie, CurrentUser},
    },
    error::AppError,
    extract::{AppJson, CredentialsJson},
    state::AppState,
    users::{
        dto::{PublicUser, SignupRequest},
        model::{NewUser, DEFAULT_PHOTO_URL},
        validation::{
            is_valid_email, normalize_email, validate_first_name, validate_last_name,
            validate_password,
        },
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<(StatusCode, &'static str), AppError> {
    let first_name = validate_first_name(&payload.first_name)?;
    let last_name = validate_last_name(payload.last_name.as_deref())?;
    let email = normalize_email(&payload.email)?;
    validate_password(&payload.password)?;

    // Early check for a friendlier error; the unique index still decides races.
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password_blocking(payload.password).await?;

    let user = state
        .users
        .insert(NewUser {
            first_name,
            last_name,
            email,
            password_hash,
            photo_url: DEFAULT_PHOTO_URL.to_string(),
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, "User created successfully"))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    CredentialsJson(payload): CredentialsJson<LoginRequest>,
) -> Result<(CookieJar, &'static str), AppError> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!("login with malformed email");
        return Err(AppError::InvalidCredentials);
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        // Same Argon2 cost as a real check.
        verify_against_dummy(payload.password).await;
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password_blocking(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.keys.issue_session(user.id)?;
    let jar = jar.add(session_cookie(token, &state.keys, state.config.cookie_secure));

    info!(user_id = %user.id, "user logged in");
    Ok((jar, "Login successful"))
}

/// Drops the cookie client-side. The token itself stays valid until it expires.
#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, &'static str) {
    (jar.remove(removal_cookie()), "Logout successful")
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::{Role, User};
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn public_user_never_carries_password() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Alice".into(),
            last_name: None,
            email: "test@example.com".into(),
            password_hash: "$argon2id$secret-hash".into(),
            age: None,
            gender: None,
            photo_url: DEFAULT_PHOTO_URL.into(),
            about: None,
            skills: vec![],
            role: Role::Member,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };

        let raw = serde_json::to_string(&user).unwrap();
        assert!(!raw.contains("password"));

        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("firstName"));
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
    }
}
