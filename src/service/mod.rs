pub mod aggregator;
pub mod menus;
pub mod summary;

pub use aggregator::{ItemStat, RecordFilter, TimeWindow, WasteAggregator};
pub use menus::MenuService;
pub use summary::SummaryService;
