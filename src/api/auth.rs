//! Identification of the acting user.
//!
//! Identity is established upstream; requests name the acting user in the
//! `X-User-Id` header and the account is loaded with its permissions.

use std::ops::Deref;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use tracing::warn;

use crate::access::CurrentUser;
use crate::error::AppError;

use super::response::ApiErrorResponse;
use super::state::AppState;

/// Header carrying the acting user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user of a request.
#[derive(Debug, Clone)]
pub struct Actor(pub CurrentUser);

impl Deref for Actor {
    type Target = CurrentUser;

    fn deref(&self) -> &CurrentUser {
        &self.0
    }
}

fn user_id(parts: &Parts) -> Result<i64, AppError> {
    let value = parts
        .headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized {
            message: "missing X-User-Id header".to_string(),
        })?;
    value
        .to_str()
        .ok()
        .and_then(|text| text.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "X-User-Id must be a numeric user id".to_string(),
        })
}

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = user_id(parts).map_err(|err| {
            warn!(path = %parts.uri.path(), error = %err, "Rejected request without identity");
            ApiErrorResponse::from(err)
        })?;
        let current = state
            .run(move |conn| CurrentUser::load(conn, id))
            .await
            .map_err(|err| {
                warn!(user_id = id, error = %err, "Rejected request identity");
                ApiErrorResponse::from(err)
            })?;
        Ok(Actor(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/me");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_header_is_required() {
        assert!(matches!(user_id(&parts(None)), Err(AppError::Unauthorized { .. })));
    }

    #[test]
    fn test_header_must_be_numeric() {
        assert!(matches!(user_id(&parts(Some("admin"))), Err(AppError::Unauthorized { .. })));
        assert_eq!(user_id(&parts(Some(" 12 "))).unwrap(), 12);
    }
}
