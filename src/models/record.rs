use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 参与汇总的浪费记录 (已在存储边界完成类型校验与缺省值填充)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteRecord {
    pub item: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub qty: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub taken: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub wasted: u64,
    #[serde(default)]
    pub menu_num: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl WasteRecord {
    /// 剩余量: qty - taken, 不足时截断为 0
    pub fn leftovers(&self) -> u64 {
        self.qty.saturating_sub(self.taken)
    }
}

/// 将数据库中可空的计数列转换为非负计数
pub fn count_from_column(value: Option<i64>) -> u64 {
    value.and_then(|n| u64::try_from(n).ok()).unwrap_or(0)
}

/// 宽松地把任意 JSON 值转换为计数。
/// 缺失、null、非数字及负数均视为 0, 浮点数向零截断。
pub fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|_| 0))
            .or_else(|| n.as_f64().map(truncate_float))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(truncate_float))
                .unwrap_or(0)
        }
        Value::Bool(b) => u64::from(*b),
        _ => 0,
    }
}

fn truncate_float(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        f.trunc() as u64
    } else {
        0
    }
}

/// serde 字段反序列化: 见 [`coerce_count`]
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_count).unwrap_or(0))
}
