pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod event;
pub mod fighters;
pub mod model;
pub mod session;
pub mod utils;

pub use api::{ApiRequest, ApiResponse, ApiService, HttpTransport, Method, Transport, TransportError};
pub use app::{Arena, ArenaBuilder};
pub use auth::AuthManager;
pub use config::AppConfig;
pub use error::SelectError;
pub use event::{AuthForm, CardView, EventSender, MessageKind, UiEvent};
pub use fighters::FighterManager;
pub use model::{FighterDetails, FighterId, FighterRecord, UserRecord};
pub use session::{
    AppState, AuthStatus, FavoriteSet, MemoryStorage, SharedState, SqliteStorage, Storage,
};
