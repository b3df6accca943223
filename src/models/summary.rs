use serde::{Deserialize, Serialize};

/// 单个菜品的浪费统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemWaste {
    pub item: String,
    pub leftovers: u64,
    pub wasted: u64,
    pub total_waste: u64, // leftovers + wasted
}

/// 浪费汇总: individual_waste 按 total_waste 降序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteSummary {
    pub individual_waste: Vec<ItemWaste>,
    pub total_waste: u64,
}

/// 旧版汇总条目 (仅统计显式 wasted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyItemWaste {
    pub item: String,
    pub wasted: u64,
}

/// 旧版汇总, ratio_waste 为每次出现的平均浪费量
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySummary {
    pub individual_waste: Vec<LegacyItemWaste>,
    pub ratio_waste: Vec<LegacyItemWaste>,
    pub total_waste: u64,
}

/// 文本生成服务的返回
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeSummary {
    pub summary: String,
}

/// 汇总时间范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    #[default]
    Menu,
    Day,
    Week,
    Month,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Menu => "menu",
            Scope::Day => "day",
            Scope::Week => "week",
            Scope::Month => "month",
        }
    }
}

/// 只识别小写原值, 其余 (包括大小写不同或带空格) 按 menu 处理, 不限制时间
impl From<String> for Scope {
    fn from(value: String) -> Self {
        match value.as_str() {
            "day" => Scope::Day,
            "week" => Scope::Week,
            "month" => Scope::Month,
            _ => Scope::Menu,
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.as_str().to_string()
    }
}

/// GET /api/waste-summary 与 /api/summary 的查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQuery {
    pub menu_id: Option<i64>,
    #[serde(default)]
    pub scope: Scope,
}
