use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{DeleteUserRequest, EmailQuery, Pagination, PublicUser},
    validation::{normalize_email, parse_update},
};
use crate::{
    auth::{admin::AdminAccess, session::CurrentUser},
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/feed", get(feed))
        .route("/user", get(find_user).delete(delete_user))
        .route("/user/:id", patch(update_user))
}

#[instrument(skip(state, viewer), fields(viewer_id = %viewer.id))]
pub async fn feed(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    AppQuery(p): AppQuery<Pagination>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let (limit, offset) = p.clamped();
    let users = state.users.list(limit, offset).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, _viewer, q))]
pub async fn find_user(
    State(state): State<AppState>,
    CurrentUser(_viewer): CurrentUser,
    AppQuery(q): AppQuery<EmailQuery>,
) -> Result<Json<PublicUser>, AppError> {
    let email = normalize_email(&q.email)?;
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, editor, body), fields(editor_id = %editor.id))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(editor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<PublicUser>, AppError> {
    if editor.id != id {
        warn!(%id, "attempt to update another user");
        return Err(AppError::Forbidden("You can only update your own profile".into()));
    }

    let patch = parse_update(&body)?;
    let user = state
        .users
        .update(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, "user updated");
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, admin, body))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminAccess(admin): AdminAccess,
    AppJson(body): AppJson<DeleteUserRequest>,
) -> Result<&'static str, AppError> {
    if !state.users.delete(body.user_id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    let admin_id = admin.map(|u| u.id);
    info!(user_id = %body.user_id, admin_id = ?admin_id, "user deleted");
    Ok("User deleted successfully")
}
