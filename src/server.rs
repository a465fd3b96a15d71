use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::error::GrantbookError;
use crate::reconcile::{ApiDecision, Applied, ItemDecision};
use crate::schema::{Database, Item, ItemNode, Role, RoleItem, RoleItemApi};
use crate::table::Id;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub status: String,
    pub deleted: bool,
}

#[derive(Serialize)]
pub struct ModifyResponse {
    pub status: String,
    pub deleted: usize,
    pub inserted: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superhash: Option<String>,
}

type Rejection = (StatusCode, Json<ErrorResponse>);

pub fn router(database: Arc<Database>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    Router::new()
        .route("/v1/health", get(health))
        .route(
            "/v1/items",
            get(all_items).post(create_item).put(update_item),
        )
        .route("/v1/items/:id", delete(delete_item))
        .route("/v1/items/tree", get(item_tree))
        .route(
            "/v1/roles",
            get(all_roles).post(create_role).put(update_role),
        )
        .route("/v1/roles/:id", delete(delete_role))
        .route(
            "/v1/roles/:id/items",
            get(role_items).post(modify_role_items),
        )
        .route(
            "/v1/roles/:id/apis",
            get(role_item_apis).post(modify_role_item_apis),
        )
        .route("/v1/roles/:id/visible", get(visible_tree))
        .layer(cors)
        .with_state(database)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn internal(e: GrantbookError) -> Rejection {
    warn!(error = %e, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            status: "error".into(),
            error: e.to_string(),
        }),
    )
}

fn join_failure(e: tokio::task::JoinError) -> Rejection {
    warn!(error = %e, "join error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            status: "error".into(),
            error: "join error".into(),
        }),
    )
}

fn not_found(what: &str, id: Id) -> Rejection {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            status: "error".into(),
            error: format!("no {what} with id {id}"),
        }),
    )
}

// ------------- Items -------------
async fn all_items(State(database): State<Arc<Database>>) -> Result<Json<Vec<Item>>, Rejection> {
    // The store is synchronous and its lock is held across slot writes, so
    // every handler runs it on a blocking thread.
    let items = tokio::task::spawn_blocking(move || database.all_items())
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    Ok(Json(items))
}

async fn create_item(
    State(database): State<Arc<Database>>,
    Json(item): Json<Item>,
) -> Result<Json<Item>, Rejection> {
    let started = Instant::now();
    let stored = tokio::task::spawn_blocking(move || database.insert_item(item))
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    info!(ms = elapsed_ms(started), id = stored.id, "item inserted");
    Ok(Json(stored))
}

async fn update_item(
    State(database): State<Arc<Database>>,
    Json(item): Json<Item>,
) -> Result<Json<Item>, Rejection> {
    let started = Instant::now();
    let id = item.id;
    let updated = tokio::task::spawn_blocking(move || database.update_item(item))
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    match updated {
        Some(item) => {
            info!(ms = elapsed_ms(started), id, "item updated");
            Ok(Json(item))
        }
        None => Err(not_found("item", id)),
    }
}

async fn delete_item(
    State(database): State<Arc<Database>>,
    Path(id): Path<Id>,
) -> Result<Json<DeleteResponse>, Rejection> {
    let started = Instant::now();
    let deleted = tokio::task::spawn_blocking(move || database.delete_item(id))
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    info!(ms = elapsed_ms(started), id, deleted, "item delete");
    Ok(Json(DeleteResponse {
        status: "ok".into(),
        deleted,
    }))
}

async fn item_tree(
    State(database): State<Arc<Database>>,
) -> Result<Json<Vec<ItemNode>>, Rejection> {
    let trees = tokio::task::spawn_blocking(move || database.item_forest())
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    Ok(Json(trees))
}

// ------------- Roles -------------
async fn all_roles(State(database): State<Arc<Database>>) -> Result<Json<Vec<Role>>, Rejection> {
    let roles = tokio::task::spawn_blocking(move || database.all_roles())
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    Ok(Json(roles))
}

async fn create_role(
    State(database): State<Arc<Database>>,
    Json(role): Json<Role>,
) -> Result<Json<Role>, Rejection> {
    let started = Instant::now();
    let stored = tokio::task::spawn_blocking(move || database.insert_role(role))
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    info!(ms = elapsed_ms(started), id = stored.id, "role inserted");
    Ok(Json(stored))
}

async fn update_role(
    State(database): State<Arc<Database>>,
    Json(role): Json<Role>,
) -> Result<Json<Role>, Rejection> {
    let started = Instant::now();
    let id = role.id;
    let updated = tokio::task::spawn_blocking(move || database.update_role(role))
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    match updated {
        Some(role) => {
            info!(ms = elapsed_ms(started), id, "role updated");
            Ok(Json(role))
        }
        None => Err(not_found("role", id)),
    }
}

async fn delete_role(
    State(database): State<Arc<Database>>,
    Path(id): Path<Id>,
) -> Result<Json<DeleteResponse>, Rejection> {
    let started = Instant::now();
    let deleted = tokio::task::spawn_blocking(move || database.delete_role(id))
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    info!(ms = elapsed_ms(started), id, deleted, "role delete");
    Ok(Json(DeleteResponse {
        status: "ok".into(),
        deleted,
    }))
}

// ------------- Grants -------------
async fn role_items(
    State(database): State<Arc<Database>>,
    Path(role_id): Path<Id>,
) -> Result<Json<Vec<RoleItem>>, Rejection> {
    let rows = tokio::task::spawn_blocking(move || database.role_items_for(role_id))
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    Ok(Json(rows))
}

async fn modify_role_items(
    State(database): State<Arc<Database>>,
    Path(role_id): Path<Id>,
    Json(decisions): Json<Vec<ItemDecision>>,
) -> Result<Json<ModifyResponse>, Rejection> {
    let started = Instant::now();
    let applied: Applied =
        tokio::task::spawn_blocking(move || database.modify_role_items(role_id, &decisions))
            .await
            .map_err(join_failure)?
            .map_err(internal)?;
    info!(
        ms = elapsed_ms(started),
        role_id,
        deleted = applied.deleted,
        inserted = applied.inserted,
        "item grants modified"
    );
    Ok(Json(ModifyResponse {
        status: "ok".into(),
        deleted: applied.deleted,
        inserted: applied.inserted,
    }))
}

async fn role_item_apis(
    State(database): State<Arc<Database>>,
    Path(role_id): Path<Id>,
) -> Result<Json<Vec<RoleItemApi>>, Rejection> {
    let rows = tokio::task::spawn_blocking(move || database.role_item_apis_for(role_id))
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    Ok(Json(rows))
}

async fn modify_role_item_apis(
    State(database): State<Arc<Database>>,
    Path(role_id): Path<Id>,
    Json(decisions): Json<Vec<ApiDecision>>,
) -> Result<Json<ModifyResponse>, Rejection> {
    let started = Instant::now();
    let applied: Applied =
        tokio::task::spawn_blocking(move || database.modify_role_item_apis(role_id, &decisions))
            .await
            .map_err(join_failure)?
            .map_err(internal)?;
    info!(
        ms = elapsed_ms(started),
        role_id,
        deleted = applied.deleted,
        inserted = applied.inserted,
        "api grants modified"
    );
    Ok(Json(ModifyResponse {
        status: "ok".into(),
        deleted: applied.deleted,
        inserted: applied.inserted,
    }))
}

async fn visible_tree(
    State(database): State<Arc<Database>>,
    Path(role_id): Path<Id>,
) -> Result<Json<Vec<ItemNode>>, Rejection> {
    let trees = tokio::task::spawn_blocking(move || database.visible_forest(role_id))
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    Ok(Json(trees))
}

// ------------- Health -------------
async fn health(State(database): State<Arc<Database>>) -> Result<Json<HealthResponse>, Rejection> {
    let superhash = tokio::task::spawn_blocking(move || database.current_superhash())
        .await
        .map_err(join_failure)?
        .map_err(internal)?;
    Ok(Json(HealthResponse {
        status: "ok".into(),
        superhash,
    }))
}
