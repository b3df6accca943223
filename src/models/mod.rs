pub mod listing;
pub mod menu;
pub mod record;
pub mod summary;

pub use listing::{ListingInsert, ListingRow, NewListing};
pub use menu::{Menu, MenuDraft, MenuItem, MenuItemDraft};
pub use record::{coerce_count, count_from_column, lenient_count, WasteRecord};
pub use summary::{
    ItemWaste, LegacyItemWaste, LegacySummary, NarrativeSummary, Scope, SummaryQuery,
    WasteSummary,
};
