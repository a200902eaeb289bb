use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use missive_types::api::Claims;

use crate::auth::AppState;
use crate::store;

/// DELETE /account — removes the caller and everything they own.
/// Their token stays valid until expiry but resolves to a missing user.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let uid = claims.sub.to_string();
    store::run(&state, move |db| db.delete_user(&uid)).await?;

    info!("Account {} deleted", claims.username);
    Ok(StatusCode::NO_CONTENT)
}
