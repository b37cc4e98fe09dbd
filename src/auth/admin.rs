use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::session::CurrentUser;
use crate::{
    config::AuthPolicy,
    error::AppError,
    state::AppState,
    users::model::{Role, User},
};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Proof that the request passed the admin gate. Under the static policy
/// there is no identity to carry.
#[derive(Debug, Clone)]
pub struct AdminAccess(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.config.auth_policy {
            AuthPolicy::Static => {
                let presented = parts
                    .headers
                    .get(ADMIN_TOKEN_HEADER)
                    .ok_or(AppError::MissingCredential)?
                    .as_bytes();
                let is_authorized = state
                    .config
                    .admin_token
                    .as_deref()
                    .is_some_and(|expected| tokens_match(expected.as_bytes(), presented));
                if !is_authorized {
                    warn!("static admin token rejected");
                    return Err(AppError::InvalidCredential);
                }
                warn!("admin access granted by static token; this policy is insecure");
                Ok(AdminAccess(None))
            }
            AuthPolicy::SignedToken => {
                let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
                if user.role != Role::Admin {
                    warn!(user_id = %user.id, "non-admin hit an admin route");
                    return Err(AppError::Forbidden("Admin access required".into()));
                }
                Ok(AdminAccess(Some(user)))
            }
        }
    }
}

/// Constant-time for equal lengths; only the length can leak.
fn tokens_match(expected: &[u8], presented: &[u8]) -> bool {
    bool::from(expected.ct_eq(presented))
}
