pub mod entity;
pub mod error;
pub mod record;
pub mod store;

pub use entity::EntityStore;
pub use error::StoreError;
pub use record::{ActivityRecord, HistoryPage, HistoryQuery, RecordStatus};
pub use store::RecordStore;
