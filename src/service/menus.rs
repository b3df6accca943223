use crate::db::WasteStore;
use crate::error::{AppError, AppResult};
use crate::models::listing::count_to_column;
use crate::models::{ListingInsert, ListingRow, Menu, MenuDraft, NewListing};
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};
use std::sync::Arc;

/// 菜单与扫描记录的增删改查
pub struct MenuService {
    store: Arc<dyn WasteStore>,
}

/// 由服务端维护, 不接受客户端写入的字段
const RESERVED_FIELDS: &[&str] = &["id", "_id", "day"];

impl MenuService {
    pub fn new(store: Arc<dyn WasteStore>) -> Self {
        Self { store }
    }

    // ---------- 扫描记录 ----------

    /// 写入一条扫描记录, day 取当前星期 (周一 = 1)
    pub async fn create_listing(
        &self,
        listing: NewListing,
        now: DateTime<FixedOffset>,
    ) -> AppResult<i64> {
        if listing.item.trim().is_empty() {
            return Err(AppError::BadRequest("item must not be empty".to_string()));
        }

        let created_at = match listing.created_at {
            Some(secs) => Utc
                .timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| AppError::BadRequest(format!("invalid created_at: {}", secs)))?,
            None => now.with_timezone(&Utc),
        };

        let mut extra = listing.extra;
        for key in RESERVED_FIELDS {
            extra.remove(*key);
        }

        let row = ListingInsert {
            item: listing.item,
            qty: count_to_column(listing.qty),
            taken: count_to_column(listing.taken),
            wasted: count_to_column(listing.wasted),
            meal_period: Some(listing.meal_period),
            day: Some(now.weekday().number_from_monday() as i32),
            menu_num: listing.menu_num,
            menu_name: listing.menu_name,
            created_at,
            extra,
        };

        let id = self.store.insert_listing(row).await?;
        tracing::info!("Listing {} created", id);
        Ok(id)
    }

    pub async fn list_listings(&self) -> AppResult<Vec<ListingRow>> {
        Ok(self.store.list_listings().await?)
    }

    pub async fn listings_by_item(&self, item: &str) -> AppResult<Vec<ListingRow>> {
        Ok(self.store.list_listings_by_item(item).await?)
    }

    /// 按行 id 记录一次浪费
    pub async fn record_waste(&self, id: i64) -> AppResult<ListingRow> {
        let row = self
            .store
            .increment_wasted(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
        tracing::info!("Waste recorded for listing {} ({})", row.id, row.item);
        Ok(row)
    }

    /// 按菜品名记录一次浪费 (识别事件只知道类别名)
    pub async fn record_waste_by_item(&self, item: &str) -> AppResult<ListingRow> {
        let row = self
            .store
            .increment_wasted_by_item(item)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
        tracing::info!("Waste recorded for '{}' on listing {}", item, row.id);
        Ok(row)
    }

    // ---------- 菜单 ----------

    pub async fn create_menu(&self, draft: MenuDraft, now: DateTime<FixedOffset>) -> AppResult<Menu> {
        draft.validate().map_err(AppError::BadRequest)?;
        if draft.items.is_empty() {
            return Err(AppError::BadRequest("menu must have at least one item".to_string()));
        }

        let rows = draft_rows(&draft, now.with_timezone(&Utc));
        let (menu_num, inserted) = self.store.create_menu(rows).await?;
        tracing::info!("Menu {} created with {} items", menu_num, inserted.len());

        Menu::from_rows(menu_num, &inserted)
            .ok_or_else(|| AppError::NotFound("Menu not found".to_string()))
    }

    pub async fn list_menus(&self) -> AppResult<Vec<Menu>> {
        let rows = self.store.menu_rows(None).await?;
        Ok(Menu::group_rows(&rows))
    }

    pub async fn get_menu(&self, menu_num: i64) -> AppResult<Menu> {
        let rows = self.store.menu_rows(Some(menu_num)).await?;
        Menu::from_rows(menu_num, &rows).ok_or_else(|| AppError::NotFound("Menu not found".to_string()))
    }

    /// 整体替换菜单行, 保留原创建时间; 新菜单为空时返回 NotFound
    pub async fn update_menu(
        &self,
        menu_num: i64,
        draft: MenuDraft,
        now: DateTime<FixedOffset>,
    ) -> AppResult<Menu> {
        draft.validate().map_err(AppError::BadRequest)?;

        let now = now.with_timezone(&Utc);
        let rows = draft_rows(&draft, now);
        let inserted = self.store.replace_menu(menu_num, rows, now).await?;
        tracing::info!("Menu {} updated with {} items", menu_num, inserted.len());

        Menu::from_rows(menu_num, &inserted)
            .ok_or_else(|| AppError::NotFound("Menu not found".to_string()))
    }

    pub async fn delete_menu(&self, menu_num: i64) -> AppResult<()> {
        let deleted = self.store.delete_menu(menu_num).await?;
        if deleted == 0 {
            return Err(AppError::NotFound("Menu not found".to_string()));
        }
        tracing::info!("Menu {} deleted ({} rows)", menu_num, deleted);
        Ok(())
    }
}

/// 菜单草稿 -> 待写入行 (menu_num 由存储层分配)
fn draft_rows(draft: &MenuDraft, created_at: DateTime<Utc>) -> Vec<ListingInsert> {
    draft
        .items
        .iter()
        .map(|it| ListingInsert {
            item: it.name.trim().to_string(),
            qty: it.quantity,
            taken: it.taken,
            wasted: it.wasted,
            meal_period: Some(draft.meal_period),
            day: draft.day,
            menu_num: None,
            menu_name: Some(draft.name.clone()),
            created_at,
            extra: Default::default(),
        })
        .collect()
}
