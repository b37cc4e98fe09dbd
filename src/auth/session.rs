//! Session gate: admits a request only when its `token` cookie carries a
//! valid, unexpired JWT whose subject still exists.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, warn};

use super::jwt::JwtKeys;
use crate::{
    error::AppError,
    state::AppState,
    users::{model::User, repo::UserStore},
};

pub const SESSION_COOKIE: &str = "token";

/// Run the gate against a cookie jar. Each rejection maps to one reason.
pub async fn admit(
    jar: &CookieJar,
    keys: &JwtKeys,
    users: &dyn UserStore,
) -> Result<User, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            debug!("session rejected: no token cookie");
            AppError::MissingCredential
        })?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "session rejected: invalid or expired token");
        AppError::InvalidCredential
    })?;

    let user = users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "session rejected: subject not found");
            AppError::UnknownSubject
        })?;

    debug!(user_id = %user.id, "session admitted");
    Ok(user)
}

/// The user admitted by the session gate.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>() {
            return Ok(CurrentUser(user.clone()));
        }
        let jar = CookieJar::from_headers(&parts.headers);
        let user = admit(&jar, &state.keys, state.users.as_ref()).await?;
        parts.extensions.insert(user.clone());
        Ok(CurrentUser(user))
    }
}

pub fn session_cookie(token: String, keys: &JwtKeys, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(keys.session_ttl())
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
