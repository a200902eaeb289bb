use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::account;
use crate::auth::{self, AppState};
use crate::messages;
use crate::middleware::require_auth;
use crate::notifications;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/messages", get(messages::list_messages).post(messages::send_message))
        .route("/messages/unread", get(messages::unread_messages))
        .route(
            "/messages/{message_id}",
            get(messages::get_message)
                .patch(messages::update_message)
                .delete(messages::delete_message),
        )
        .route("/messages/{message_id}/read", post(messages::mark_read))
        .route("/messages/{message_id}/replies", get(messages::get_replies))
        .route("/messages/{message_id}/history", get(messages::get_history))
        .route("/conversations/{user_id}", get(messages::conversation))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/{notification_id}/read",
            post(notifications::mark_notification_read),
        )
        .route("/account", axum::routing::delete(account::delete_account))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
