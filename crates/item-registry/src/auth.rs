//! Bearer-token gate for staff routes

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::handlers::{ApiError, AppState};

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    if given.len() != expected.len() {
        return false;
    }

    given
        .iter()
        .zip(expected)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Reject staff requests that lack the configured admin token.
///
/// Passes everything through when no token is configured.
pub async fn require_staff(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        return next.run(request).await;
    };

    let rejection = match bearer_token(&request) {
        Some(token) if tokens_match(token, expected) => None,
        Some(_) => Some("Invalid admin token"),
        None => Some("Admin token required"),
    };

    match rejection {
        None => next.run(request).await,
        Some(message) => {
            warn!("Rejected staff request to {}: {}", request.uri(), message);
            ApiError::new(StatusCode::UNAUTHORIZED, message).into_response()
        }
    }
}
