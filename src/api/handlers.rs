//! HTTP request handlers for the PMMIS API.
//!
//! This module assembles the router and contains the handlers that are not
//! plain CRUD: workflow actions, the current user, notifications, reports
//! and the health check.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::access::CurrentUser;
use crate::db::{queries, repo};
use crate::error::AppResult;
use crate::models::{
    ApprovalAction, Component, Contract, ContractIndicator, ContractIndicatorProgress,
    ContractIndicatorVillage, Contractor, District, Document, HealthFacility, Indicator,
    IndicatorProgressItem, IndicatorValue, Jamoat, Language, MenuKey, MenuPermission, Payment,
    PermissionAction, ProcurementPlan, Project, ProjectTask, Role, School, SubComponent,
    TaskChecklistItem, TaskComment, User, Village, WorkProgress,
};
use crate::{reports, workflow};

use super::auth::Actor;
use super::crud;
use super::response::{failure, json_rejection, respond};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    let work_progress = crud::routes::<WorkProgress>()
        .route("/:id/submit", post(submit_handler))
        .route("/:id/manager-approve", post(manager_approve_handler))
        .route("/:id/director-approve", post(director_approve_handler))
        .route("/:id/reject", post(reject_handler))
        .route("/:id/revise", post(revise_handler))
        .route("/:id/history", get(history_handler));
    let users = crud::routes::<User>().route("/:id/subordinates", get(subordinates_handler));

    let api = Router::new()
        .nest("/projects", crud::routes::<Project>())
        .nest("/components", crud::routes::<Component>())
        .nest("/sub-components", crud::routes::<SubComponent>())
        .nest("/contractors", crud::routes::<Contractor>())
        .nest("/contracts", crud::routes::<Contract>())
        .nest("/payments", crud::routes::<Payment>())
        .nest("/procurement-plans", crud::routes::<ProcurementPlan>())
        .nest("/work-progress", work_progress)
        .nest("/districts", crud::routes::<District>())
        .nest("/jamoats", crud::routes::<Jamoat>())
        .nest("/villages", crud::routes::<Village>())
        .nest("/schools", crud::routes::<School>())
        .nest("/health-facilities", crud::routes::<HealthFacility>())
        .nest("/indicators", crud::routes::<Indicator>())
        .nest("/indicator-values", crud::routes::<IndicatorValue>())
        .nest("/contract-indicators", crud::routes::<ContractIndicator>())
        .nest(
            "/contract-indicator-villages",
            crud::routes::<ContractIndicatorVillage>(),
        )
        .nest(
            "/contract-indicator-progress",
            crud::routes::<ContractIndicatorProgress>(),
        )
        .nest(
            "/indicator-progress-items",
            crud::routes::<IndicatorProgressItem>(),
        )
        .nest("/documents", crud::routes::<Document>())
        .nest("/tasks", crud::routes::<ProjectTask>())
        .nest("/task-comments", crud::routes::<TaskComment>())
        .nest("/task-checklist-items", crud::routes::<TaskChecklistItem>())
        .nest("/users", users)
        .nest("/roles", crud::routes::<Role>())
        .nest("/menu-permissions", crud::routes::<MenuPermission>())
        .route("/me", get(me_handler))
        .route("/notifications", get(notifications_handler))
        .route("/notifications/read-all", post(read_all_handler))
        .route("/notifications/:id/read", post(read_notification_handler))
        .route("/reports/contracts/:id", get(contract_report_handler))
        .route("/reports/projects/:id", get(project_report_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .with_state(state)
}

/// Body of a workflow action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Note stored with the transition; the reason when rejecting.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Report query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    /// Language of localized names; defaults to the configured one.
    pub lang: Option<Language>,
    /// Reference date for remaining days; defaults to today.
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct MarkedRead {
    updated: usize,
}

/// Handler for GET /health.
async fn health_handler(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = state
        .run(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(Health {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
            })
        })
        .await;
    respond(correlation_id, "health", StatusCode::OK, result)
}

async fn run_transition(
    state: AppState,
    actor: Actor,
    id: i64,
    payload: Result<Json<ActionRequest>, JsonRejection>,
    action: ApprovalAction,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        work_progress_id = id,
        action = action.label(),
        user_id = actor.id(),
        "Processing workflow action"
    );
    let request = match payload {
        Ok(Json(request)) => request,
        // A bodiless action carries no comment.
        Err(JsonRejection::MissingJsonContentType(_)) => ActionRequest::default(),
        Err(rejection) => return json_rejection(correlation_id, rejection).into_response(),
    };
    let notify = state.config().notifications_enabled();
    let Actor(current) = actor;
    let result = state
        .run(move |conn| {
            workflow::apply(
                conn,
                &current,
                id,
                action,
                request.comment,
                notify,
                Utc::now(),
            )
        })
        .await;
    respond(correlation_id, action.label(), StatusCode::OK, result)
}

/// Handler for POST /api/work-progress/:id/submit.
async fn submit_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Response {
    run_transition(state, actor, id, payload, ApprovalAction::Submit).await
}

/// Handler for POST /api/work-progress/:id/manager-approve.
async fn manager_approve_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Response {
    run_transition(state, actor, id, payload, ApprovalAction::ManagerApprove).await
}

/// Handler for POST /api/work-progress/:id/director-approve.
async fn director_approve_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Response {
    run_transition(state, actor, id, payload, ApprovalAction::DirectorApprove).await
}

/// Handler for POST /api/work-progress/:id/reject.
async fn reject_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Response {
    run_transition(state, actor, id, payload, ApprovalAction::Reject).await
}

/// Handler for POST /api/work-progress/:id/revise.
async fn revise_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Response {
    run_transition(state, actor, id, payload, ApprovalAction::Revise).await
}

/// Handler for GET /api/work-progress/:id/history.
async fn history_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    if let Err(err) = actor.authorize(MenuKey::WorkProgress, PermissionAction::View) {
        return failure(correlation_id, "history", err);
    }
    let result = state
        .run(move |conn| {
            repo::get::<WorkProgress>(conn, id)?;
            queries::history_for(conn, id)
        })
        .await;
    respond(correlation_id, "history", StatusCode::OK, result)
}

/// Handler for GET /api/me.
async fn me_handler(Actor(current): Actor) -> Response {
    let correlation_id = Uuid::new_v4();
    respond::<CurrentUser>(correlation_id, "me", StatusCode::OK, Ok(current))
}

/// Handler for GET /api/users/:id/subordinates.
///
/// Users may list their own subordinates; other chains need `View` on users.
async fn subordinates_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    if id != actor.id() {
        if let Err(err) = actor.authorize(MenuKey::Users, PermissionAction::View) {
            return failure(correlation_id, "subordinates", err);
        }
    }
    let result = state
        .run(move |conn| {
            repo::get::<User>(conn, id)?;
            queries::subordinates(conn, id)
        })
        .await;
    respond(correlation_id, "subordinates", StatusCode::OK, result)
}

/// Handler for GET /api/notifications.
async fn notifications_handler(State(state): State<AppState>, actor: Actor) -> Response {
    let correlation_id = Uuid::new_v4();
    let user_id = actor.id();
    let result = state
        .run(move |conn| queries::visible_notifications(conn, user_id, Utc::now()))
        .await;
    respond(correlation_id, "notifications", StatusCode::OK, result)
}

/// Handler for POST /api/notifications/:id/read.
async fn read_notification_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let user_id = actor.id();
    let result = state
        .run(move |conn| queries::mark_notification_read(conn, user_id, id, Utc::now()))
        .await;
    respond(correlation_id, "read notification", StatusCode::OK, result)
}

/// Handler for POST /api/notifications/read-all.
async fn read_all_handler(State(state): State<AppState>, actor: Actor) -> Response {
    let correlation_id = Uuid::new_v4();
    let user_id = actor.id();
    let result: AppResult<MarkedRead> = state
        .run(move |conn| {
            let updated = queries::mark_all_notifications_read(conn, user_id, Utc::now())?;
            Ok(MarkedRead { updated })
        })
        .await;
    respond(correlation_id, "read all notifications", StatusCode::OK, result)
}

fn report_settings(state: &AppState, query: &ReportQuery) -> (NaiveDate, Language) {
    let language = query
        .lang
        .unwrap_or(state.config().config().reports.default_language);
    let today = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    (today, language)
}

/// Handler for GET /api/reports/contracts/:id.
async fn contract_report_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    if let Err(err) = actor.authorize(MenuKey::Contracts, PermissionAction::View) {
        return failure(correlation_id, "contract report", err);
    }
    let (today, language) = report_settings(&state, &query);
    let result = state
        .run(move |conn| reports::contract_report(conn, id, today, language))
        .await;
    respond(correlation_id, "contract report", StatusCode::OK, result)
}

/// Handler for GET /api/reports/projects/:id.
async fn project_report_handler(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    if let Err(err) = actor.authorize(MenuKey::Projects, PermissionAction::View) {
        return failure(correlation_id, "project report", err);
    }
    let (today, language) = report_settings(&state, &query);
    let result = state
        .run(move |conn| reports::project_report(conn, id, today, language))
        .await;
    respond(correlation_id, "project report", StatusCode::OK, result)
}
