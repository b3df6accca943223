use crate::api::AppState;
use crate::error::AppResult;
use crate::models::{
    LegacySummary, ListingRow, Menu, MenuDraft, NarrativeSummary, NewListing, SummaryQuery,
    WasteSummary,
};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::StatusCode,
};
use serde::Serialize;
use serde_json::{json, Value};

/// POST /listing 响应体
#[derive(Debug, Serialize)]
pub struct InsertedResponse {
    pub inserted_id: i64,
}

/// 健康检查
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---------- 扫描记录 ----------

pub async fn create_listing(
    State(state): State<AppState>,
    Json(listing): Json<NewListing>,
) -> AppResult<Json<InsertedResponse>> {
    let inserted_id = state.menus.create_listing(listing, (state.clock)()).await?;
    Ok(Json(InsertedResponse { inserted_id }))
}

pub async fn list_listings(State(state): State<AppState>) -> AppResult<Json<Vec<ListingRow>>> {
    Ok(Json(state.menus.list_listings().await?))
}

pub async fn listings_by_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<ListingRow>>> {
    Ok(Json(state.menus.listings_by_item(&name).await?))
}

/// 浪费 + 1 (按行 id)
pub async fn increment_item_waste(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ListingRow>> {
    let Path(id) = path?;
    Ok(Json(state.menus.record_waste(id).await?))
}

/// 浪费 + 1 (按识别出的菜品名)
pub async fn increment_item_waste_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<ListingRow>> {
    Ok(Json(state.menus.record_waste_by_item(&name).await?))
}

// ---------- 汇总 ----------

pub async fn waste_summary(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> AppResult<Json<WasteSummary>> {
    let Query(q) = query?;
    let summary = state
        .summary
        .compute_summary(q.menu_id, q.scope, (state.clock)())
        .await?;
    Ok(Json(summary))
}

pub async fn legacy_waste_summary(State(state): State<AppState>) -> AppResult<Json<LegacySummary>> {
    Ok(Json(state.summary.legacy_summary().await?))
}

/// 文字版汇总
pub async fn narrative_summary(
    State(state): State<AppState>,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> AppResult<Json<NarrativeSummary>> {
    let Query(q) = query?;
    let summary = state
        .summary
        .narrate(q.menu_id, q.scope, (state.clock)())
        .await?;
    Ok(Json(NarrativeSummary { summary }))
}

// ---------- 菜单 ----------

pub async fn create_menu(
    State(state): State<AppState>,
    Json(draft): Json<MenuDraft>,
) -> AppResult<Json<Menu>> {
    Ok(Json(state.menus.create_menu(draft, (state.clock)()).await?))
}

pub async fn list_menus(State(state): State<AppState>) -> AppResult<Json<Vec<Menu>>> {
    Ok(Json(state.menus.list_menus().await?))
}

pub async fn get_menu(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Menu>> {
    let Path(menu_id) = path?;
    Ok(Json(state.menus.get_menu(menu_id).await?))
}

pub async fn update_menu(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    Json(draft): Json<MenuDraft>,
) -> AppResult<Json<Menu>> {
    let Path(menu_id) = path?;
    Ok(Json(
        state.menus.update_menu(menu_id, draft, (state.clock)()).await?,
    ))
}

pub async fn delete_menu(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(menu_id) = path?;
    state.menus.delete_menu(menu_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
