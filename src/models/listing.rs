use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

use super::record::{count_from_column, lenient_count, WasteRecord};

/// listings 表行 (扫描记录与菜单行共用一张表)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ListingRow {
    pub id: i64,
    pub item: String,
    pub qty: Option<i64>,
    pub taken: Option<i64>,
    pub wasted: Option<i64>,
    pub meal_period: Option<i32>,
    pub day: Option<i32>,      // 1 = 周一 ... 7 = 周日
    pub menu_num: Option<i64>, // 存在即为菜单行
    pub menu_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub extra: Json<Map<String, Value>>,
}

impl From<&ListingRow> for WasteRecord {
    fn from(row: &ListingRow) -> Self {
        Self {
            item: row.item.clone(),
            qty: count_from_column(row.qty),
            taken: count_from_column(row.taken),
            wasted: count_from_column(row.wasted),
            menu_num: row.menu_num,
            created_at: row.created_at,
        }
    }
}

/// POST /listing 请求体, 未识别的字段保存在 extra 中
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub item: String,
    #[serde(deserialize_with = "lenient_count")]
    pub qty: u64,
    pub meal_period: i32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub taken: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub wasted: u64,
    #[serde(default)]
    pub menu_num: Option<i64>,
    #[serde(default)]
    pub menu_name: Option<String>,
    /// Unix 秒
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 待写入的行 (服务层已补齐 day 与 created_at)
#[derive(Debug, Clone)]
pub struct ListingInsert {
    pub item: String,
    pub qty: i64,
    pub taken: i64,
    pub wasted: i64,
    pub meal_period: Option<i32>,
    pub day: Option<i32>,
    pub menu_num: Option<i64>,
    pub menu_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub extra: Map<String, Value>,
}

/// 计数写入 BIGINT 列
pub(crate) fn count_to_column(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
