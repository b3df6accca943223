use crate::db::WasteStore;
use crate::error::AppResult;
use crate::models::{LegacySummary, Scope, WasteRecord, WasteSummary};
use crate::service::aggregator::{RecordFilter, WasteAggregator};
use crate::summarizer::{build_prompt, Summarizer};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexSet;
use std::collections::HashMap;
use std::sync::Arc;

/// 汇总服务: 读取记录 -> 汇总 -> (可选) 生成文字报告
pub struct SummaryService {
    store: Arc<dyn WasteStore>,
    summarizer: Arc<dyn Summarizer>,
}

impl SummaryService {
    pub fn new(store: Arc<dyn WasteStore>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { store, summarizer }
    }

    /// 计算浪费汇总。`now` 决定 scope 的时间区间。
    pub async fn compute_summary(
        &self,
        menu_id: Option<i64>,
        scope: Scope,
        now: DateTime<FixedOffset>,
    ) -> AppResult<WasteSummary> {
        let filter = RecordFilter::new(menu_id, scope, &now);
        let records = self.store.fetch_records(&filter).await?;

        let summary = WasteAggregator::compute(&records, &filter);
        tracing::debug!(
            "Summary menu={:?} scope={}: {} records, {} items, total {}",
            menu_id,
            scope.as_str(),
            records.len(),
            summary.individual_waste.len(),
            summary.total_waste
        );
        Ok(summary)
    }

    /// 汇总后交给文本生成服务, 返回其原文
    pub async fn narrate(
        &self,
        menu_id: Option<i64>,
        scope: Scope,
        now: DateTime<FixedOffset>,
    ) -> AppResult<String> {
        let summary = self.compute_summary(menu_id, scope, now).await?;
        let prompt = build_prompt(&summary);
        let text = self.summarizer.generate(&prompt).await?;
        tracing::info!(
            "Narrative summary generated for menu={:?} scope={} ({} chars)",
            menu_id,
            scope.as_str(),
            text.len()
        );
        Ok(text)
    }

    /// 旧版汇总: 覆盖全部行, 每个菜品再查询一次出现次数
    pub async fn legacy_summary(&self) -> AppResult<LegacySummary> {
        let rows = self.store.list_listings().await?;
        let records: Vec<WasteRecord> = rows.iter().map(WasteRecord::from).collect();

        let items: IndexSet<&str> = records.iter().map(|r| r.item.as_str()).collect();
        let mut occurrences: HashMap<String, u64> = HashMap::with_capacity(items.len());
        for item in items {
            let cnt = self.store.count_by_item(item).await?;
            occurrences.insert(item.to_string(), cnt);
        }

        Ok(WasteAggregator::legacy(&records, &occurrences))
    }
}
