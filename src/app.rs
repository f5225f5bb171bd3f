use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ApiService, HttpTransport, Transport};
use crate::auth::AuthManager;
use crate::config::AppConfig;
use crate::error::{Result, SelectError};
use crate::event::{EventSender, UiEvent};
use crate::fighters::FighterManager;
use crate::model::UserRecord;
use crate::session::{AppState, AuthStatus, MemoryStorage, SharedState, SqliteStorage, Storage};

/// The assembled client: one state container shared by the API client and
/// both managers.
///
/// # Example
///
/// ```no_run
/// # use fighter_select::Arena;
/// # async fn example() -> Result<(), fighter_select::SelectError> {
/// let arena = Arena::builder().sqlite_storage()?.build()?;
/// arena.init().await?;
/// arena.login("jin@mishima.jp", "secret").await?;
/// for card in arena.fighters().render_cards().await {
///     println!("{} {}", card.id, card.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Arena {
    config: Arc<AppConfig>,
    state: SharedState,
    api: ApiService,
    auth: AuthManager,
    fighters: FighterManager,
}

impl Arena {
    pub fn builder() -> ArenaBuilder {
        ArenaBuilder::new()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn api(&self) -> &ApiService {
        &self.api
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn fighters(&self) -> &FighterManager {
        &self.fighters
    }

    pub async fn init(&self) -> Result<AuthStatus> {
        self.auth.init().await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserRecord> {
        self.auth.login(email, password).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<UserRecord> {
        self.auth
            .register(name, email, password, password_confirmation)
            .await
    }

    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await
    }

    pub async fn status(&self) -> AuthStatus {
        self.auth.status().await
    }
}

/// Builder for constructing an [`Arena`].
///
/// Defaults: configuration from [`AppConfig::default`], the `reqwest`
/// transport, and SQLite storage at the configured location.
pub struct ArenaBuilder {
    config: AppConfig,
    transport: Option<Arc<dyn Transport>>,
    storage: Option<Arc<dyn Storage>>,
    events: Option<mpsc::Sender<UiEvent>>,
}

impl Default for ArenaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            transport: None,
            storage: None,
            events: None,
        }
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    /// Set a custom transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set a custom storage backend.
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Use SQLite at `storage.db_path`, or the default location when unset.
    pub fn sqlite_storage(mut self) -> Result<Self> {
        let storage = open_sqlite(&self.config)?;
        self.storage = Some(Arc::new(storage));
        Ok(self)
    }

    /// Keep the session in memory only.
    pub fn memory_storage(mut self) -> Self {
        self.storage = Some(Arc::new(MemoryStorage::new()));
        self
    }

    /// Deliver UI events to `sender`.
    pub fn events(mut self, sender: mpsc::Sender<UiEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn build(self) -> Result<Arena> {
        if self.config.api.base_url.trim().is_empty() {
            return Err(SelectError::Config("API base URL is empty".to_string()));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.config.api.timeout())?),
        };
        let storage: Arc<dyn Storage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(open_sqlite(&self.config)?),
        };
        let events = match self.events {
            Some(sender) => EventSender::new(sender, self.config.ui.message_timeout()),
            None => EventSender::noop(),
        };

        let state = AppState::shared();
        let api = ApiService::new(transport, self.config.api.base_url.clone(), state.clone())
            .with_debug_mode(self.config.app.debug_mode);
        let fighters = FighterManager::new(api.clone(), state.clone(), events.clone());
        let auth = AuthManager::new(
            api.clone(),
            storage,
            state.clone(),
            fighters.clone(),
            events,
            self.config.storage.clone(),
        );

        debug!(base_url = %api.base_url(), "built arena");

        Ok(Arena {
            config: Arc::new(self.config),
            state,
            api,
            auth,
            fighters,
        })
    }
}

fn open_sqlite(config: &AppConfig) -> Result<SqliteStorage> {
    match config.storage.db_path {
        Some(ref path) => SqliteStorage::new(path),
        None => SqliteStorage::default_location(),
    }
    .map_err(|e| SelectError::Storage(format!("{:#}", e)))
}
