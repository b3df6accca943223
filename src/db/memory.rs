//! 内存存储, 供单元测试与路由测试使用。

use crate::db::store::WasteStore;
use crate::models::{ListingInsert, ListingRow, WasteRecord};
use crate::service::aggregator::RecordFilter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<ListingRow>>,
    next_id: Mutex<i64>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟存储不可用
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<ListingRow> {
        self.rows.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }

    fn materialize(&self, row: ListingInsert) -> ListingRow {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        ListingRow {
            id: *next_id,
            item: row.item,
            qty: Some(row.qty),
            taken: Some(row.taken),
            wasted: Some(row.wasted),
            meal_period: row.meal_period,
            day: row.day,
            menu_num: row.menu_num,
            menu_name: row.menu_name,
            created_at: row.created_at,
            extra: Json(row.extra),
        }
    }

    /// 直接写入行 (测试数据准备)
    pub fn push(&self, row: ListingInsert) -> ListingRow {
        let row = self.materialize(row);
        self.rows.lock().unwrap().push(row.clone());
        row
    }
}

#[async_trait]
impl WasteStore for MemoryStore {
    async fn fetch_records(&self, filter: &RecordFilter) -> Result<Vec<WasteRecord>, sqlx::Error> {
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .map(WasteRecord::from)
            .filter(|r| filter.matches(r))
            .collect())
    }

    async fn list_listings(&self) -> Result<Vec<ListingRow>, sqlx::Error> {
        self.check()?;
        Ok(self.rows())
    }

    async fn list_listings_by_item(&self, item: &str) -> Result<Vec<ListingRow>, sqlx::Error> {
        self.check()?;
        Ok(self.rows().into_iter().filter(|r| r.item == item).collect())
    }

    async fn count_by_item(&self, item: &str) -> Result<u64, sqlx::Error> {
        self.check()?;
        Ok(self.rows().iter().filter(|r| r.item == item).count() as u64)
    }

    async fn insert_listing(&self, row: ListingInsert) -> Result<i64, sqlx::Error> {
        self.check()?;
        Ok(self.push(row).id)
    }

    async fn increment_wasted(&self, id: i64) -> Result<Option<ListingRow>, sqlx::Error> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|r| r.id == id).map(|r| {
            r.wasted = Some(r.wasted.unwrap_or(0) + 1);
            r.clone()
        }))
    }

    async fn increment_wasted_by_item(&self, item: &str) -> Result<Option<ListingRow>, sqlx::Error> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let latest = rows
            .iter_mut()
            .filter(|r| r.item == item)
            .max_by_key(|r| (r.created_at, r.id));
        Ok(latest.map(|r| {
            r.wasted = Some(r.wasted.unwrap_or(0) + 1);
            r.clone()
        }))
    }

    async fn menu_rows(&self, menu_num: Option<i64>) -> Result<Vec<ListingRow>, sqlx::Error> {
        self.check()?;
        let mut rows: Vec<ListingRow> = self
            .rows()
            .into_iter()
            .filter(|r| r.menu_num.is_some() && (menu_num.is_none() || r.menu_num == menu_num))
            .collect();
        rows.sort_by_key(|r| (r.menu_num, r.id));
        Ok(rows)
    }

    async fn create_menu(
        &self,
        rows: Vec<ListingInsert>,
    ) -> Result<(i64, Vec<ListingRow>), sqlx::Error> {
        self.check()?;
        let menu_num = self
            .rows()
            .iter()
            .filter_map(|r| r.menu_num)
            .max()
            .unwrap_or(0)
            + 1;
        let inserted = rows
            .into_iter()
            .map(|mut row| {
                row.menu_num = Some(menu_num);
                self.push(row)
            })
            .collect();
        Ok((menu_num, inserted))
    }

    async fn replace_menu(
        &self,
        menu_num: i64,
        rows: Vec<ListingInsert>,
        fallback_created_at: DateTime<Utc>,
    ) -> Result<Vec<ListingRow>, sqlx::Error> {
        self.check()?;
        let created_at = self
            .rows()
            .iter()
            .filter(|r| r.menu_num == Some(menu_num))
            .min_by_key(|r| r.id)
            .map(|r| r.created_at)
            .unwrap_or(fallback_created_at);
        self.rows
            .lock()
            .unwrap()
            .retain(|r| r.menu_num != Some(menu_num));

        Ok(rows
            .into_iter()
            .map(|mut row| {
                row.menu_num = Some(menu_num);
                row.created_at = created_at;
                self.push(row)
            })
            .collect())
    }

    async fn delete_menu(&self, menu_num: i64) -> Result<u64, sqlx::Error> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.menu_num != Some(menu_num));
        Ok((before - rows.len()) as u64)
    }
}
