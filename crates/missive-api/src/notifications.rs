use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use missive_types::api::Claims;
use missive_types::models::Notification;

use crate::auth::AppState;
use crate::convert;
use crate::store;

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let uid = claims.sub.to_string();
    let rows = store::run(&state, move |db| db.notifications_for_user(&uid)).await?;

    let notifications: Vec<Notification> = rows.into_iter().map(convert::notification).collect();
    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let nid = notification_id.to_string();
    let uid = claims.sub.to_string();
    let row = store::run(&state, move |db| db.mark_notification_read(&nid, &uid)).await?;

    Ok(Json(convert::notification(row)))
}
