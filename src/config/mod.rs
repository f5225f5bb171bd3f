mod app;
pub mod messages;

pub use app::{ApiConfig, AppConfig, AppSection, StorageConfig, UiConfig};
