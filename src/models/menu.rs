use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::listing::ListingRow;

/// 菜单视图: 由同一 menu_num 的所有行组装
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub meal_period: Option<i32>,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub quantity: i64,
    pub taken: i64,
    pub wasted: i64,
}

impl Menu {
    /// 组装单个菜单, 无行时返回 None
    pub fn from_rows(menu_num: i64, rows: &[ListingRow]) -> Option<Self> {
        let first = rows.first()?;
        Some(Self {
            id: menu_num,
            name: first.menu_name.clone().unwrap_or_default(),
            meal_period: first.meal_period,
            items: rows
                .iter()
                .map(|r| MenuItem {
                    name: r.item.clone(),
                    quantity: r.qty.unwrap_or(0),
                    taken: r.taken.unwrap_or(0),
                    wasted: r.wasted.unwrap_or(0),
                })
                .collect(),
        })
    }

    /// 按 menu_num 分组, 保持行的原有顺序; 非菜单行被忽略
    pub fn group_rows(rows: &[ListingRow]) -> Vec<Self> {
        let mut groups: IndexMap<i64, Vec<ListingRow>> = IndexMap::new();
        for row in rows {
            if let Some(num) = row.menu_num {
                groups.entry(num).or_default().push(row.clone());
            }
        }

        groups
            .iter()
            .filter_map(|(num, rows)| Self::from_rows(*num, rows))
            .collect()
    }
}

/// 创建/更新菜单的请求体
#[derive(Debug, Clone, Deserialize)]
pub struct MenuDraft {
    pub name: String,
    pub meal_period: i32,
    #[serde(default)]
    pub day: Option<i32>,
    pub items: Vec<MenuItemDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuItemDraft {
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub taken: i64,
    #[serde(default)]
    pub wasted: i64,
}

impl MenuDraft {
    /// 校验菜单内容, 返回错误描述
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("menu name must not be empty".to_string());
        }
        for it in &self.items {
            if it.name.trim().is_empty() {
                return Err("item name must not be empty".to_string());
            }
            if it.quantity < 0 || it.taken < 0 || it.wasted < 0 {
                return Err(format!("item '{}' has a negative quantity", it.name));
            }
        }
        Ok(())
    }
}
