use axum::http::StatusCode;
use tracing::error;

use missive_db::{Database, StoreError};

use crate::auth::AppState;

/// Run a blocking store call off the async runtime and map its error to a status.
pub async fn run<F, T>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&Database) -> missive_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(status_for)
}

pub fn status_for(err: StoreError) -> StatusCode {
    match err {
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::Reference { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::Permission(_) => StatusCode::FORBIDDEN,
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        other => {
            error!("Store error: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(status_for(StoreError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(StoreError::reference("user", "u1")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(StoreError::Permission("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_for(StoreError::not_found("message", "m1")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(StoreError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_for(StoreError::LockPoisoned), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
