//! HTTP API used by the app's screens
//!
//! Every endpoint answers with the same JSON envelope:
//! `{ "success": bool, "data"?: ..., "error"?: "..." }`.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

use crate::groq::RecipeClient;
use crate::image_search::ImageSearchClient;
use crate::items::{
    add_item, confirm_all, confirm_item, delete_item, get_item, list_items, update_item_name,
    update_item_quantity, ConfirmAllStats, ConfirmOutcome,
};
use crate::models::{
    normalize_quantity, Item, ItemStatus, RawQuantity, Recipe, RecipeMetadata, RecipeSuggestion,
};
use crate::recipes::{
    delete_recipe_by_id, delete_recipe_by_name, get_recipe, list_recipes, missing_ingredients,
    save_recipe, saved_recipe_names, toggle_saved, update_recipe_metadata,
};
use crate::scan::{prepare_drafts, stage_drafts, PendingDraft};
use crate::vision::VisionClient;

/// Upper bound for an uploaded photo
const MAX_PHOTO_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state (store handle + collaborator clients)
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub vision: VisionClient,
    pub recipes: RecipeClient,
    pub images: ImageSearchClient,
}

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

type Failure = (StatusCode, Json<ApiResponse<()>>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, Failure>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    }))
}

fn fail(status: StatusCode, message: impl Into<String>) -> Failure {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
}

fn db_failure(e: rusqlite::Error) -> Failure {
    log::error!("Database error: {}", e);
    fail(StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {e}"))
}

fn lock_db(state: &AppState) -> Result<MutexGuard<'_, Connection>, Failure> {
    state.db.lock().map_err(|_| {
        log::error!("Database mutex poisoned");
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable")
    })
}

// ── Items ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusParams {
    status: ItemStatus,
}

#[derive(Deserialize)]
struct NewItemBody {
    name: String,
    #[serde(default)]
    quantity: Option<RawQuantity>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Deserialize)]
struct EditItemBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    quantity: Option<RawQuantity>,
}

#[derive(Deserialize)]
struct ConfirmAllParams {
    #[serde(default)]
    merge_by_name: bool,
}

/// GET /api/items?status={draft|confirmed}
async fn list_items_handler(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> ApiResult<Vec<Item>> {
    let conn = lock_db(&state)?;
    ok(list_items(&conn, params.status).map_err(db_failure)?)
}

/// POST /api/items - manual entry, staged as a draft
async fn add_item_handler(
    State(state): State<AppState>,
    Json(body): Json<NewItemBody>,
) -> ApiResult<Item> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "Please enter an item name"));
    }
    let quantity = normalize_quantity(body.quantity.as_ref());
    let image_url = match body.image_url.filter(|u| !u.trim().is_empty()) {
        Some(url) => url,
        None => state.images.search_image(&name).await,
    };

    let conn = lock_db(&state)?;
    let id = add_item(&conn, &name, quantity, Some(image_url.as_str())).map_err(db_failure)?;
    match get_item(&conn, id).map_err(db_failure)? {
        Some(item) => ok(item),
        None => Err(fail(StatusCode::INTERNAL_SERVER_ERROR, "Item vanished after insert")),
    }
}

/// PATCH /api/items/{id} - edit name and/or quantity
async fn edit_item_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<EditItemBody>,
) -> ApiResult<Item> {
    let name = body.name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        return Err(fail(StatusCode::BAD_REQUEST, "Please enter an item name"));
    }

    let mut conn = lock_db(&state)?;
    let tx = conn.transaction().map_err(db_failure)?;
    let current = get_item(&tx, id)
        .map_err(db_failure)?
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, format!("Item {id} not found")))?;

    if let Some(raw) = body.quantity.as_ref() {
        let quantity = normalize_quantity(Some(raw));
        update_item_quantity(&tx, id, quantity).map_err(db_failure)?;
        log::debug!("Item {} ({}) quantity set to {}", id, current.name, quantity);
    }
    if let Some(name) = name {
        update_item_name(&tx, id, &name).map_err(db_failure)?;
    }

    let updated = get_item(&tx, id).map_err(db_failure)?;
    tx.commit().map_err(db_failure)?;
    match updated {
        Some(item) => ok(item),
        None => Err(fail(StatusCode::NOT_FOUND, format!("Item {id} not found"))),
    }
}

/// DELETE /api/items/{id}
async fn delete_item_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<usize> {
    let conn = lock_db(&state)?;
    ok(delete_item(&conn, id).map_err(db_failure)?)
}

/// POST /api/items/{id}/confirm
async fn confirm_item_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ConfirmOutcome> {
    let mut conn = lock_db(&state)?;
    ok(confirm_item(&mut conn, id).map_err(db_failure)?)
}

/// POST /api/items/confirm-all?merge_by_name={bool}
async fn confirm_all_handler(
    State(state): State<AppState>,
    Query(params): Query<ConfirmAllParams>,
) -> ApiResult<ConfirmAllStats> {
    let mut conn = lock_db(&state)?;
    ok(confirm_all(&mut conn, params.merge_by_name).map_err(db_failure)?)
}

// ── Scan ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct StagedScan {
    ids: Vec<i64>,
    drafts: Vec<PendingDraft>,
}

/// POST /api/scan - body is the raw JPEG photo
async fn scan_handler(State(state): State<AppState>, body: Bytes) -> ApiResult<StagedScan> {
    if body.is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "Empty image"));
    }

    let scanned = match state.vision.extract_items(&body).await {
        Ok(items) => items,
        Err(e) => {
            log::error!("Gemini error: {}", e);
            return Err(fail(
                StatusCode::BAD_GATEWAY,
                format!("Error analyzing image: {e}"),
            ));
        }
    };

    let drafts = prepare_drafts(&state.images, &scanned).await;
    let mut conn = lock_db(&state)?;
    let ids = stage_drafts(&mut conn, &drafts).map_err(db_failure)?;
    ok(StagedScan { ids, drafts })
}

// ── Recipes ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NameParams {
    name: String,
}

#[derive(Deserialize)]
struct SuggestParams {
    #[serde(default)]
    count: Option<usize>,
}

#[derive(Deserialize)]
struct MetadataBody {
    name: String,
    #[serde(default)]
    ingredients: Vec<String>,
}

/// A suggestion as shown on the recipe screen
#[derive(Debug, Serialize)]
struct SuggestionView {
    #[serde(flatten)]
    recipe: RecipeSuggestion,
    saved: bool,
    missing_ingredients: Vec<String>,
}

/// GET /api/recipes
async fn list_recipes_handler(State(state): State<AppState>) -> ApiResult<Vec<Recipe>> {
    let conn = lock_db(&state)?;
    ok(list_recipes(&conn).map_err(db_failure)?)
}

/// POST /api/recipes - save a suggestion
async fn save_recipe_handler(
    State(state): State<AppState>,
    Json(recipe): Json<RecipeSuggestion>,
) -> ApiResult<i64> {
    let conn = lock_db(&state)?;
    ok(save_recipe(&conn, &recipe).map_err(db_failure)?)
}

/// POST /api/recipes/toggle - save if unsaved, unsave (by name) if saved
async fn toggle_recipe_handler(
    State(state): State<AppState>,
    Json(recipe): Json<RecipeSuggestion>,
) -> ApiResult<bool> {
    let conn = lock_db(&state)?;
    ok(toggle_saved(&conn, &recipe).map_err(db_failure)?)
}

/// DELETE /api/recipes/{id}
async fn delete_recipe_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<usize> {
    let conn = lock_db(&state)?;
    ok(delete_recipe_by_id(&conn, id).map_err(db_failure)?)
}

/// DELETE /api/recipes?name={name}
async fn delete_recipe_by_name_handler(
    State(state): State<AppState>,
    Query(params): Query<NameParams>,
) -> ApiResult<usize> {
    let conn = lock_db(&state)?;
    ok(delete_recipe_by_name(&conn, &params.name).map_err(db_failure)?)
}

/// POST /api/recipes/{id}/metadata - fill in time/difficulty/servings if missing
async fn backfill_metadata_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Recipe> {
    let recipe = {
        let conn = lock_db(&state)?;
        get_recipe(&conn, id)
            .map_err(db_failure)?
            .ok_or_else(|| fail(StatusCode::NOT_FOUND, format!("Recipe {id} not found")))?
    };
    if recipe.has_metadata() {
        return ok(recipe);
    }

    let Some(metadata) = state
        .recipes
        .generate_metadata(&recipe.name, &recipe.ingredients)
        .await
    else {
        return ok(recipe);
    };

    let conn = lock_db(&state)?;
    if update_recipe_metadata(&conn, id, &metadata).map_err(db_failure)? == 0 {
        log::warn!("Recipe {} was deleted before its metadata arrived", id);
        return Err(fail(StatusCode::NOT_FOUND, format!("Recipe {id} not found")));
    }
    ok(Recipe {
        time: Some(metadata.time),
        difficulty: Some(metadata.difficulty),
        servings: Some(metadata.servings),
        ..recipe
    })
}

/// POST /api/metadata - estimate metadata for an unsaved suggestion
async fn metadata_handler(
    State(state): State<AppState>,
    Json(body): Json<MetadataBody>,
) -> ApiResult<Option<RecipeMetadata>> {
    ok(state
        .recipes
        .generate_metadata(&body.name, &body.ingredients)
        .await)
}

/// GET /api/suggestions?count={n} - recipes from the confirmed inventory
async fn suggestions_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> ApiResult<Vec<SuggestionView>> {
    let (items, saved) = {
        let conn = lock_db(&state)?;
        let items = list_items(&conn, ItemStatus::Confirmed).map_err(db_failure)?;
        let saved = saved_recipe_names(&conn).map_err(db_failure)?;
        (items, saved)
    };

    let names: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
    let suggestions = state.recipes.suggest_recipes(&names, params.count).await;

    let mut views = Vec::with_capacity(suggestions.len());
    for mut recipe in suggestions {
        if recipe.image_url.is_none() {
            recipe.image_url = Some(state.images.search_image(&recipe.name).await);
        }
        let missing = missing_ingredients(&recipe.ingredients, &items)
            .into_iter()
            .map(str::to_string)
            .collect();
        views.push(SuggestionView {
            saved: saved.contains(&recipe.name),
            missing_ingredients: missing,
            recipe,
        });
    }
    ok(views)
}

/// Build the web server router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/items", get(list_items_handler).post(add_item_handler))
        .route("/api/items/confirm-all", post(confirm_all_handler))
        .route(
            "/api/items/{id}",
            axum::routing::patch(edit_item_handler).delete(delete_item_handler),
        )
        .route("/api/items/{id}/confirm", post(confirm_item_handler))
        .route("/api/scan", post(scan_handler))
        .route(
            "/api/recipes",
            get(list_recipes_handler)
                .post(save_recipe_handler)
                .delete(delete_recipe_by_name_handler),
        )
        .route("/api/recipes/toggle", post(toggle_recipe_handler))
        .route(
            "/api/recipes/{id}",
            axum::routing::delete(delete_recipe_handler),
        )
        .route("/api/recipes/{id}/metadata", post(backfill_metadata_handler))
        .route("/api/metadata", post(metadata_handler))
        .route("/api/suggestions", get(suggestions_handler))
        .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server (async)
///
/// Binds to 0.0.0.0 so the phone on the local network can reach it.
pub async fn serve(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
#[path = "web_tests.rs"]
mod tests;
