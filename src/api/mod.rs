pub mod handlers;

use crate::service::{MenuService, SummaryService};
use axum::{
    routing::{get, put},
    Router,
};
use chrono::{DateTime, FixedOffset, Local};
use std::sync::Arc;

pub use handlers::*;

/// 当前时间来源, 汇总的时间范围据此计算
pub type Clock = fn() -> DateTime<FixedOffset>;

pub fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub summary: Arc<SummaryService>,
    pub menus: Arc<MenuService>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(summary: Arc<SummaryService>, menus: Arc<MenuService>) -> Self {
        Self {
            summary,
            menus,
            clock: local_now,
        }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // 扫描记录
        .route("/listing", get(list_listings).post(create_listing))
        .route("/listing/:name", get(listings_by_item))
        .route("/items/:id", put(increment_item_waste))
        .route("/items/by-name/:name", put(increment_item_waste_by_name))
        // 汇总
        .route("/api/waste-summary", get(waste_summary))
        .route("/api/waste-summary/legacy", get(legacy_waste_summary))
        .route("/api/summary", get(narrative_summary))
        // 菜单
        .route("/api/menus", get(list_menus).post(create_menu))
        .route(
            "/api/menus/:menu_id",
            get(get_menu).put(update_menu).delete(delete_menu),
        )
        .with_state(state)
}
