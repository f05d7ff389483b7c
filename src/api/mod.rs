//! HTTP API module for PMMIS.
//!
//! This module provides the REST API: generic CRUD endpoints for every
//! entity set, the work progress approval actions, notifications, reports
//! and the current user's permission matrix. Every route except `/health`
//! requires the `X-User-Id` header.

mod auth;
mod crud;
mod handlers;
mod response;
mod state;

pub use auth::{Actor, USER_ID_HEADER};
pub use handlers::{create_router, ActionRequest, ReportQuery};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
