pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod summarizer;

pub use config::AppConfig;
pub use db::{create_pool, ensure_schema, PgWasteStore, WasteStore};
pub use error::{AppError, AppResult};
pub use service::{MenuService, SummaryService, WasteAggregator};
pub use summarizer::{GeminiClient, Summarizer};
