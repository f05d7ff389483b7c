//! Generic list/create/read/update/delete endpoints.
//!
//! Every entity set is served by the same five handlers, gated by the menu
//! permission of the entity. The permission is checked before the body is
//! parsed.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::db::{repo, Record, WriteContext};
use crate::models::PermissionAction;

use super::auth::Actor;
use super::response::{failure, json_rejection, respond};
use super::state::AppState;

/// A record that can be served over the CRUD endpoints.
pub trait Resource: Record + Serialize + DeserializeOwned {}

impl<T: Record + Serialize + DeserializeOwned> Resource for T {}

/// Routes `GET /`, `POST /`, `GET /:id`, `PUT /:id` and `DELETE /:id` for `T`.
pub fn routes<T: Resource>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route("/:id", get(read::<T>).put(update::<T>).delete(remove::<T>))
}

async fn list<T: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    Query(filters): Query<Vec<(String, String)>>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let operation = format!("list {}", T::ENTITY);
    if let Err(err) = actor.authorize(T::MENU, PermissionAction::View) {
        return failure(correlation_id, &operation, err);
    }
    let result = state.run(move |conn| repo::list::<T>(conn, &filters)).await;
    respond(correlation_id, &operation, StatusCode::OK, result)
}

async fn read<T: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let operation = format!("read {}", T::ENTITY);
    if let Err(err) = actor.authorize(T::MENU, PermissionAction::View) {
        return failure(correlation_id, &operation, err);
    }
    let result = state.run(move |conn| repo::get::<T>(conn, id)).await;
    respond(correlation_id, &operation, StatusCode::OK, result)
}

async fn create<T: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<T>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let operation = format!("create {}", T::ENTITY);
    if let Err(err) = actor.authorize(T::MENU, PermissionAction::Create) {
        return failure(correlation_id, &operation, err);
    }
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => return json_rejection(correlation_id, rejection).into_response(),
    };
    let ctx = WriteContext::now(actor.id());
    let result = state
        .run(move |conn| repo::insert(conn, record, &ctx))
        .await;
    if let Ok(created) = &result {
        info!(
            correlation_id = %correlation_id,
            entity = T::ENTITY,
            id = created.id(),
            user_id = actor.id(),
            "Record created"
        );
    }
    respond(correlation_id, &operation, StatusCode::CREATED, result)
}

async fn update<T: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    payload: Result<Json<T>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let operation = format!("update {}", T::ENTITY);
    if let Err(err) = actor.authorize(T::MENU, PermissionAction::Edit) {
        return failure(correlation_id, &operation, err);
    }
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => return json_rejection(correlation_id, rejection).into_response(),
    };
    let ctx = WriteContext::now(actor.id());
    let result = state
        .run(move |conn| repo::update(conn, id, record, &ctx))
        .await;
    respond(correlation_id, &operation, StatusCode::OK, result)
}

async fn remove<T: Resource>(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let operation = format!("delete {}", T::ENTITY);
    if let Err(err) = actor.authorize(T::MENU, PermissionAction::Delete) {
        return failure(correlation_id, &operation, err);
    }
    match state.run(move |conn| repo::delete::<T>(conn, id)).await {
        Ok(_) => {
            info!(
                correlation_id = %correlation_id,
                entity = T::ENTITY,
                id,
                user_id = actor.id(),
                "Record deleted"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => failure(correlation_id, &operation, err),
    }
}
