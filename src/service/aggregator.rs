use crate::models::{ItemWaste, LegacyItemWaste, LegacySummary, Scope, WasteRecord, WasteSummary};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;

/// 半开时间区间 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        *at >= self.start && *at < self.end
    }
}

impl Scope {
    /// 计算该范围对应的时间区间, `now` 由调用方注入。
    ///
    /// - day: `now` 所在时区的当日零点到次日零点
    /// - week: 最近 7 天
    /// - month: 最近 30 天
    /// - menu: 不限制
    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<TimeWindow> {
        let end = now.with_timezone(&Utc);
        match self {
            Scope::Menu => None,
            Scope::Day => {
                let tz = now.timezone();
                let today = now.date_naive();
                let tomorrow = today.succ_opt()?;
                Some(TimeWindow {
                    start: local_midnight(&tz, today),
                    end: local_midnight(&tz, tomorrow),
                })
            }
            Scope::Week => Some(TimeWindow {
                start: end - Duration::days(7),
                end,
            }),
            Scope::Month => Some(TimeWindow {
                start: end - Duration::days(30),
                end,
            }),
        }
    }
}

/// 零点落在夏令时跳变中时顺延一小时
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// 记录筛选条件: 仅菜单行, 可选 menu_num 与时间区间, 条件之间为 AND
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub menu_num: Option<i64>,
    pub window: Option<TimeWindow>,
}

impl RecordFilter {
    pub fn new<Tz: TimeZone>(menu_num: Option<i64>, scope: Scope, now: &DateTime<Tz>) -> Self {
        Self {
            menu_num,
            window: scope.window(now),
        }
    }

    pub fn matches(&self, record: &WasteRecord) -> bool {
        let Some(num) = record.menu_num else {
            return false;
        };
        if self.menu_num.is_some_and(|wanted| wanted != num) {
            return false;
        }
        self.window
            .map_or(true, |w| w.contains(&record.created_at))
    }
}

/// 单次汇总内的菜品累计值, 汇总结束即丢弃
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemStat {
    pub leftovers: u64,
    pub wasted: u64,
    pub count: u64,
}

impl ItemStat {
    fn add(&mut self, record: &WasteRecord) {
        self.leftovers = self.leftovers.saturating_add(record.leftovers());
        self.wasted = self.wasted.saturating_add(record.wasted);
        self.count = self.count.saturating_add(1);
    }

    pub fn total_waste(&self) -> u64 {
        self.leftovers.saturating_add(self.wasted)
    }
}

/// 浪费汇总计算 (纯函数, 无共享状态)
pub struct WasteAggregator;

impl WasteAggregator {
    /// 按菜品名单遍历累计, 保留首次出现顺序
    pub fn fold<'a, I>(records: I) -> IndexMap<String, ItemStat>
    where
        I: IntoIterator<Item = &'a WasteRecord>,
    {
        let mut stats: IndexMap<String, ItemStat> = IndexMap::new();
        for record in records {
            match stats.get_mut(record.item.as_str()) {
                Some(stat) => stat.add(record),
                None => {
                    let mut stat = ItemStat::default();
                    stat.add(record);
                    stats.insert(record.item.clone(), stat);
                }
            }
        }
        stats
    }

    /// 先按条件筛选, 再汇总
    pub fn compute(records: &[WasteRecord], filter: &RecordFilter) -> WasteSummary {
        let stats = Self::fold(records.iter().filter(|r| filter.matches(r)));
        Self::summarize(stats)
    }

    /// 生成输出: total_waste 降序, 稳定排序使相同值保持首次出现顺序
    pub fn summarize(stats: IndexMap<String, ItemStat>) -> WasteSummary {
        let mut individual_waste: Vec<ItemWaste> = stats
            .into_iter()
            .map(|(item, s)| ItemWaste {
                item,
                leftovers: s.leftovers,
                wasted: s.wasted,
                total_waste: s.total_waste(),
            })
            .collect();

        let total_waste = individual_waste
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.total_waste));

        individual_waste.sort_by(|a, b| b.total_waste.cmp(&a.total_waste));

        WasteSummary {
            individual_waste,
            total_waste,
        }
    }

    /// 旧版算法: 只累计显式 wasted, 并按出现次数求平均 (向下取整)。
    /// 出现次数为 0 时按 1 计算。
    pub fn legacy(records: &[WasteRecord], occurrences: &HashMap<String, u64>) -> LegacySummary {
        let mut totals: IndexMap<String, u64> = IndexMap::new();
        for record in records {
            let entry = totals.entry(record.item.clone()).or_insert(0);
            *entry = entry.saturating_add(record.wasted);
        }

        let total_waste = totals.values().fold(0u64, |acc, w| acc.saturating_add(*w));

        let ratio_waste = totals
            .iter()
            .map(|(item, wasted)| {
                let divisor = occurrences.get(item).copied().unwrap_or(1).max(1);
                LegacyItemWaste {
                    item: item.clone(),
                    wasted: wasted / divisor,
                }
            })
            .collect();

        let individual_waste = totals
            .into_iter()
            .map(|(item, wasted)| LegacyItemWaste { item, wasted })
            .collect();

        LegacySummary {
            individual_waste,
            ratio_waste,
            total_waste,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn record(item: &str, qty: u64, taken: u64, wasted: u64, menu: Option<i64>) -> WasteRecord {
        record_at(item, qty, taken, wasted, menu, at(2024, 5, 10, 12))
    }

    fn record_at(
        item: &str,
        qty: u64,
        taken: u64,
        wasted: u64,
        menu: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> WasteRecord {
        WasteRecord {
            item: item.to_string(),
            qty,
            taken,
            wasted,
            menu_num: menu,
            created_at,
        }
    }

    fn sample() -> Vec<WasteRecord> {
        vec![
            record("Rice", 10, 6, 1, Some(3)),
            record("Rice", 5, 5, 0, Some(3)),
            record("Beans", 8, 8, 2, Some(3)),
        ]
    }

    fn filter(menu: Option<i64>, scope: Scope) -> RecordFilter {
        RecordFilter::new(menu, scope, &at(2024, 5, 10, 18))
    }

    #[test]
    fn test_menu_example() {
        let summary = WasteAggregator::compute(&sample(), &filter(Some(3), Scope::Menu));

        assert_eq!(
            summary.individual_waste,
            vec![
                ItemWaste {
                    item: "Rice".to_string(),
                    leftovers: 4,
                    wasted: 1,
                    total_waste: 5,
                },
                ItemWaste {
                    item: "Beans".to_string(),
                    leftovers: 0,
                    wasted: 2,
                    total_waste: 2,
                },
            ]
        );
        assert_eq!(summary.total_waste, 7);
    }

    #[test]
    fn test_other_menu_is_empty() {
        let summary = WasteAggregator::compute(&sample(), &filter(Some(4), Scope::Menu));
        assert_eq!(summary, WasteSummary::default());
    }

    #[test]
    fn test_empty_input() {
        let summary = WasteAggregator::compute(&[], &RecordFilter::default());
        assert!(summary.individual_waste.is_empty());
        assert_eq!(summary.total_waste, 0);
    }

    #[test]
    fn test_taken_above_qty_clamps_to_zero() {
        let records = vec![
            record("Soup", 3, 9, 0, Some(1)),
            record("Soup", 4, 1, 0, Some(1)),
        ];
        let summary = WasteAggregator::compute(&records, &RecordFilter::default());
        // 第一行的 -6 不能抵消第二行的 3
        assert_eq!(summary.individual_waste[0].leftovers, 3);
    }

    #[test]
    fn test_scan_rows_excluded() {
        let records = vec![
            record("Apple", 10, 0, 5, None),
            record("Rice", 2, 1, 0, Some(1)),
        ];
        let summary = WasteAggregator::compute(&records, &RecordFilter::default());
        assert_eq!(summary.individual_waste.len(), 1);
        assert_eq!(summary.individual_waste[0].item, "Rice");
        assert_eq!(summary.total_waste, 1);
    }

    #[test]
    fn test_order_independent_totals() {
        let mut records = sample();
        let forward = WasteAggregator::compute(&records, &RecordFilter::default());
        records.reverse();
        let backward = WasteAggregator::compute(&records, &RecordFilter::default());
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_totals_consistent_and_descending() {
        let records = vec![
            record("A", 1, 0, 0, Some(1)),
            record("B", 9, 2, 3, Some(1)),
            record("C", 4, 4, 4, Some(2)),
            record("A", 6, 1, 2, Some(2)),
            record("D", 0, 0, 0, Some(2)),
        ];
        let summary = WasteAggregator::compute(&records, &RecordFilter::default());

        let sum: u64 = summary.individual_waste.iter().map(|i| i.total_waste).sum();
        assert_eq!(summary.total_waste, sum);
        for item in &summary.individual_waste {
            assert_eq!(item.total_waste, item.leftovers + item.wasted);
        }
        for pair in summary.individual_waste.windows(2) {
            assert!(pair[0].total_waste >= pair[1].total_waste);
        }
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let records = vec![
            record("Pasta", 3, 0, 0, Some(1)),
            record("Salad", 0, 0, 3, Some(1)),
            record("Bread", 5, 0, 0, Some(1)),
        ];
        let summary = WasteAggregator::compute(&records, &RecordFilter::default());
        let names: Vec<_> = summary.individual_waste.iter().map(|i| i.item.as_str()).collect();
        assert_eq!(names, vec!["Bread", "Pasta", "Salad"]);
    }

    #[test]
    fn test_fold_counts_records() {
        let stats = WasteAggregator::fold(&sample());
        assert_eq!(stats["Rice"].count, 2);
        assert_eq!(stats["Beans"].count, 1);
    }

    #[test]
    fn test_day_window_uses_local_midnight() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        // 本地 2024-05-10 01:30 == UTC 2024-05-09 23:30
        let now = tz.with_ymd_and_hms(2024, 5, 10, 1, 30, 0).unwrap();
        let window = Scope::Day.window(&now).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 5, 9, 22, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 5, 10, 22, 0, 0).unwrap());
        assert!(window.contains(&window.start));
        assert!(!window.contains(&window.end));
    }

    #[test]
    fn test_trailing_windows() {
        let now = at(2024, 5, 31, 12);
        let week = Scope::Week.window(&now).unwrap();
        assert_eq!(week.start, at(2024, 5, 24, 12));
        assert_eq!(week.end, now);

        let month = Scope::Month.window(&now).unwrap();
        assert_eq!(month.start, at(2024, 5, 1, 12));
        assert!(Scope::Menu.window(&now).is_none());
    }

    #[test]
    fn test_scope_excludes_records_outside_window() {
        let now = at(2024, 5, 10, 18);
        let records = vec![
            record_at("Rice", 10, 0, 0, Some(3), at(2024, 5, 10, 8)),
            record_at("Rice", 10, 0, 0, Some(3), at(2024, 5, 9, 23)),
            record_at("Beans", 10, 0, 0, Some(3), at(2024, 5, 1, 8)),
            record_at("Corn", 10, 0, 0, Some(3), at(2024, 5, 11, 1)),
        ];

        let day = WasteAggregator::compute(&records, &RecordFilter::new(Some(3), Scope::Day, &now));
        assert_eq!(day.total_waste, 10);

        let week = WasteAggregator::compute(&records, &RecordFilter::new(Some(3), Scope::Week, &now));
        assert_eq!(week.total_waste, 20);

        let month = WasteAggregator::compute(&records, &RecordFilter::new(None, Scope::Month, &now));
        assert_eq!(month.total_waste, 30);
    }

    #[test]
    fn test_scope_variants_are_unrestricted() {
        let now = at(2024, 5, 10, 18);
        let records = vec![record_at("Rice", 10, 0, 0, Some(3), at(2024, 1, 1, 12))];

        for raw in ["DAY", "Week", " month ", "year"] {
            let scope = Scope::from(raw.to_string());
            assert_eq!(scope, Scope::Menu, "scope {raw:?}");
            let summary = WasteAggregator::compute(&records, &RecordFilter::new(Some(3), scope, &now));
            assert_eq!(summary.total_waste, 10, "scope {raw:?}");
        }
    }

    #[test]
    fn test_trailing_window_boundaries() {
        let now = at(2024, 5, 31, 12);
        let week_records = vec![
            record_at("Rice", 4, 0, 0, Some(1), now - Duration::days(7)),
            record_at("Beans", 6, 0, 0, Some(1), now),
        ];
        let week = WasteAggregator::compute(&week_records, &RecordFilter::new(None, Scope::Week, &now));
        // 起点包含, 终点 (now) 不包含
        assert_eq!(week.total_waste, 4);
        assert_eq!(week.individual_waste.len(), 1);
        assert_eq!(week.individual_waste[0].item, "Rice");

        let month_records = vec![
            record_at("Rice", 4, 0, 0, Some(1), now - Duration::days(30)),
            record_at("Corn", 2, 0, 0, Some(1), now - Duration::days(30) - Duration::seconds(1)),
            record_at("Beans", 6, 0, 0, Some(1), now),
        ];
        let month = WasteAggregator::compute(&month_records, &RecordFilter::new(None, Scope::Month, &now));
        assert_eq!(month.total_waste, 4);
        assert_eq!(month.individual_waste.len(), 1);
        assert_eq!(month.individual_waste[0].item, "Rice");
    }

    #[test]
    fn test_legacy_ratio_floors_and_guards_zero() {
        let records = vec![
            record("Rice", 0, 0, 3, Some(1)),
            record("Rice", 0, 0, 4, None),
            record("Beans", 0, 0, 5, Some(1)),
        ];
        let mut occurrences = HashMap::new();
        occurrences.insert("Rice".to_string(), 2);
        occurrences.insert("Beans".to_string(), 0);

        let legacy = WasteAggregator::legacy(&records, &occurrences);

        assert_eq!(legacy.total_waste, 12);
        assert_eq!(
            legacy.individual_waste,
            vec![
                LegacyItemWaste { item: "Rice".to_string(), wasted: 7 },
                LegacyItemWaste { item: "Beans".to_string(), wasted: 5 },
            ]
        );
        assert_eq!(legacy.ratio_waste[0].wasted, 3);
        assert_eq!(legacy.ratio_waste[1].wasted, 5);
    }
}
