//! 记录存储接口及其 Postgres 实现。

use crate::db::queries;
use crate::models::{ListingInsert, ListingRow, WasteRecord};
use crate::service::aggregator::RecordFilter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// 记录存储。汇总只依赖 [`WasteStore::fetch_records`], 其余方法供 CRUD 使用。
#[async_trait]
pub trait WasteStore: Send + Sync {
    /// 取菜单行, 已按 filter 筛选
    async fn fetch_records(&self, filter: &RecordFilter) -> Result<Vec<WasteRecord>, sqlx::Error>;

    /// 全部行 (含扫描记录)
    async fn list_listings(&self) -> Result<Vec<ListingRow>, sqlx::Error>;

    async fn list_listings_by_item(&self, item: &str) -> Result<Vec<ListingRow>, sqlx::Error>;

    async fn count_by_item(&self, item: &str) -> Result<u64, sqlx::Error>;

    async fn insert_listing(&self, row: ListingInsert) -> Result<i64, sqlx::Error>;

    async fn increment_wasted(&self, id: i64) -> Result<Option<ListingRow>, sqlx::Error>;

    /// 给该菜品最近的一行 wasted + 1
    async fn increment_wasted_by_item(&self, item: &str) -> Result<Option<ListingRow>, sqlx::Error>;

    /// menu_num 为 None 时返回所有菜单的行, 按 (menu_num, id) 排序
    async fn menu_rows(&self, menu_num: Option<i64>) -> Result<Vec<ListingRow>, sqlx::Error>;

    /// 原子地分配菜单号并写入; rows 中的 menu_num 会被覆盖
    async fn create_menu(&self, rows: Vec<ListingInsert>) -> Result<(i64, Vec<ListingRow>), sqlx::Error>;

    /// 原子地替换菜单的所有行。
    /// 新行沿用原菜单的 created_at, 原菜单不存在时使用 `fallback_created_at`。
    async fn replace_menu(
        &self,
        menu_num: i64,
        rows: Vec<ListingInsert>,
        fallback_created_at: DateTime<Utc>,
    ) -> Result<Vec<ListingRow>, sqlx::Error>;

    async fn delete_menu(&self, menu_num: i64) -> Result<u64, sqlx::Error>;
}

/// Postgres 存储
#[derive(Clone)]
pub struct PgWasteStore {
    pool: PgPool,
}

impl PgWasteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WasteStore for PgWasteStore {
    async fn fetch_records(&self, filter: &RecordFilter) -> Result<Vec<WasteRecord>, sqlx::Error> {
        let (start, end) = match filter.window {
            Some(w) => (Some(w.start), Some(w.end)),
            None => (None, None),
        };
        let rows = queries::list_menu_records(&self.pool, filter.menu_num, start, end).await?;
        Ok(rows.iter().map(WasteRecord::from).collect())
    }

    async fn list_listings(&self) -> Result<Vec<ListingRow>, sqlx::Error> {
        queries::list_listings(&self.pool).await
    }

    async fn list_listings_by_item(&self, item: &str) -> Result<Vec<ListingRow>, sqlx::Error> {
        queries::list_listings_by_item(&self.pool, item).await
    }

    async fn count_by_item(&self, item: &str) -> Result<u64, sqlx::Error> {
        let cnt = queries::count_by_item(&self.pool, item).await?;
        Ok(u64::try_from(cnt).unwrap_or(0))
    }

    async fn insert_listing(&self, row: ListingInsert) -> Result<i64, sqlx::Error> {
        queries::insert_listing(&self.pool, &row).await
    }

    async fn increment_wasted(&self, id: i64) -> Result<Option<ListingRow>, sqlx::Error> {
        queries::increment_wasted(&self.pool, id).await
    }

    async fn increment_wasted_by_item(&self, item: &str) -> Result<Option<ListingRow>, sqlx::Error> {
        queries::increment_wasted_latest(&self.pool, item).await
    }

    async fn menu_rows(&self, menu_num: Option<i64>) -> Result<Vec<ListingRow>, sqlx::Error> {
        queries::list_menu_rows(&self.pool, menu_num).await
    }

    async fn create_menu(
        &self,
        mut rows: Vec<ListingInsert>,
    ) -> Result<(i64, Vec<ListingRow>), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let menu_num = queries::next_menu_num(&mut tx).await?;
        for row in &mut rows {
            row.menu_num = Some(menu_num);
        }
        let inserted = queries::insert_rows(&mut tx, &rows).await?;

        tx.commit().await?;
        Ok((menu_num, inserted))
    }

    async fn replace_menu(
        &self,
        menu_num: i64,
        mut rows: Vec<ListingInsert>,
        fallback_created_at: DateTime<Utc>,
    ) -> Result<Vec<ListingRow>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let created_at = queries::menu_created_at(&mut tx, menu_num)
            .await?
            .unwrap_or(fallback_created_at);
        let removed = queries::delete_menu_rows(&mut *tx, menu_num).await?;

        for row in &mut rows {
            row.menu_num = Some(menu_num);
            row.created_at = created_at;
        }
        let inserted = queries::insert_rows(&mut tx, &rows).await?;

        tx.commit().await?;
        tracing::debug!(
            "Menu {} replaced: {} rows removed, {} inserted",
            menu_num,
            removed,
            inserted.len()
        );
        Ok(inserted)
    }

    async fn delete_menu(&self, menu_num: i64) -> Result<u64, sqlx::Error> {
        queries::delete_menu_rows(&self.pool, menu_num).await
    }
}
