mod memory;
mod sqlite;
mod state;
mod storage;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use state::{
    AppState, AuthStatus, FavoriteSet, Session, SharedState, ToggleOutcome, ToggleTicket,
};
pub use storage::Storage;
