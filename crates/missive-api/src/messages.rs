use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use missive_db::StoreError;
use missive_db::models::{MessageChanges, MessageRow, NewMessage, TimeWindow};
use missive_types::api::{Claims, SendMessageRequest, UpdateMessageRequest};
use missive_types::models::{Message, ThreadReply, UnreadMessage};

use crate::auth::AppState;
use crate::convert;
use crate::store;

/// Optional `since`/`until` bounds (RFC 3339, inclusive) for message listings.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl WindowQuery {
    fn into_window(self) -> TimeWindow {
        let stored = |t: DateTime<Utc>| t.to_rfc3339_opts(SecondsFormat::Micros, true);
        TimeWindow {
            since: self.since.map(stored),
            until: self.until.map(stored),
        }
    }
}

fn is_participant(row: &MessageRow, user: &str) -> bool {
    row.sender_id == user || row.receiver_id == user
}

fn require_participant(row: &MessageRow, user: &str) -> missive_db::Result<()> {
    if is_participant(row, user) {
        Ok(())
    } else {
        Err(StoreError::Permission(format!("not a participant of message {}", row.id)))
    }
}

fn require_sender(row: &MessageRow, user: &str) -> missive_db::Result<()> {
    if row.sender_id == user {
        Ok(())
    } else {
        Err(StoreError::Permission(format!("only the sender can change message {}", row.id)))
    }
}

/// GET /messages — everything the caller sent or received, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let uid = claims.sub.to_string();
    let window = query.into_window();
    let rows = store::run(&state, move |db| db.messages_for_user(&uid, &window)).await?;

    let messages: Vec<Message> = rows.into_iter().map(convert::message).collect();
    Ok(Json(messages))
}

/// GET /conversations/{user_id} — messages between the caller and one other
/// user, both directions, oldest first.
pub async fn conversation(
    State(state): State<AppState>,
    Path(other_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let uid = claims.sub.to_string();
    let other = other_id.to_string();
    let window = query.into_window();
    let rows = store::run(&state, move |db| db.conversation_with(&uid, &other, &window)).await?;

    let messages: Vec<Message> = rows.into_iter().map(convert::message).collect();
    Ok(Json(messages))
}

/// POST /messages — sender is always the caller. Replies must be to a
/// message the caller is part of.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if !state.message_limiter.try_acquire(claims.sub) {
        warn!("Rate limit exceeded for {}", claims.username);
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    let sender = claims.sub.to_string();
    let receiver = req.receiver_id.to_string();
    let parent = req.parent_message_id.map(|p| p.to_string());

    let row = store::run(&state, move |db| {
        if let Some(parent_id) = &parent {
            let parent_row = db
                .get_message(parent_id)?
                .ok_or_else(|| StoreError::reference("message", parent_id))?;
            require_participant(&parent_row, &sender)?;
        }

        db.create_message(&NewMessage {
            sender_id: &sender,
            receiver_id: &receiver,
            content: &req.content,
            parent_message_id: parent.as_deref(),
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(convert::message(row))))
}

/// GET /messages/unread
pub async fn unread_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let uid = claims.sub.to_string();
    let rows = store::run(&state, move |db| db.unread_for_user(&uid)).await?;

    let unread: Vec<UnreadMessage> = rows.into_iter().map(convert::unread_message).collect();
    Ok(Json(unread))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let mid = message_id.to_string();
    let uid = claims.sub.to_string();

    let row = store::run(&state, move |db| {
        let row = db
            .get_message(&mid)?
            .ok_or_else(|| StoreError::not_found("message", &mid))?;
        require_participant(&row, &uid)?;
        Ok(row)
    })
    .await?;

    Ok(Json(convert::message(row)))
}

/// PATCH /messages/{id} — the caller is recorded as the editor in history.
pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let mid = message_id.to_string();
    let editor = claims.sub.to_string();

    let row = store::run(&state, move |db| {
        let current = db
            .get_message(&mid)?
            .ok_or_else(|| StoreError::not_found("message", &mid))?;
        require_sender(&current, &editor)?;

        let changes = MessageChanges {
            content: Some(req.content),
            read: None,
        };
        db.update_message(&mid, &changes, Some(&editor))
    })
    .await?;

    debug!("Message {} updated (edited={})", row.id, row.edited);
    Ok(Json(convert::message(row)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let mid = message_id.to_string();
    let uid = claims.sub.to_string();

    store::run(&state, move |db| {
        let current = db
            .get_message(&mid)?
            .ok_or_else(|| StoreError::not_found("message", &mid))?;
        require_sender(&current, &uid)?;
        db.delete_message(&mid)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /messages/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let mid = message_id.to_string();
    let uid = claims.sub.to_string();
    let row = store::run(&state, move |db| db.mark_message_read(&mid, &uid)).await?;

    Ok(Json(convert::message(row)))
}

/// GET /messages/{id}/replies — direct replies only; follow `reply_ids` for the next level.
pub async fn get_replies(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let mid = message_id.to_string();
    let uid = claims.sub.to_string();

    let rows = store::run(&state, move |db| {
        let root = db
            .get_message(&mid)?
            .ok_or_else(|| StoreError::not_found("message", &mid))?;
        require_participant(&root, &uid)?;
        db.replies_of(&root.id)
    })
    .await?;

    let replies: Vec<ThreadReply> = rows.into_iter().map(convert::thread_reply).collect();
    Ok(Json(replies))
}

/// GET /messages/{id}/history — prior versions, newest first.
pub async fn get_history(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let mid = message_id.to_string();
    let uid = claims.sub.to_string();
    let rows = store::run(&state, move |db| db.history_for_message(&mid, &uid)).await?;

    let history: Vec<_> = rows.into_iter().map(convert::history_entry).collect();
    Ok(Json(history))
}
