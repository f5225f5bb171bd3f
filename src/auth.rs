use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::api::ApiService;
use crate::config::{StorageConfig, messages};
use crate::error::{Result, SelectError};
use crate::event::{AuthForm, EventSender, UiEvent};
use crate::fighters::FighterManager;
use crate::model::{AuthResponse, LoginRequest, RegisterRequest, UserRecord};
use crate::session::{AuthStatus, SharedState, Storage};
use crate::utils::{check_password_strength, is_valid_email};

/// Session lifecycle: restore, register, login, logout.
///
/// Durable storage is written before in-memory state, and state before any
/// dependent load, so storage is never behind what the process believes.
#[derive(Clone)]
pub struct AuthManager {
    api: ApiService,
    storage: Arc<dyn Storage>,
    state: SharedState,
    fighters: FighterManager,
    events: EventSender,
    keys: StorageConfig,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("token_key", &self.keys.token_key)
            .field("user_key", &self.keys.user_key)
            .finish()
    }
}

impl AuthManager {
    pub fn new(
        api: ApiService,
        storage: Arc<dyn Storage>,
        state: SharedState,
        fighters: FighterManager,
        events: EventSender,
        keys: StorageConfig,
    ) -> Self {
        Self {
            api,
            storage,
            state,
            fighters,
            events,
            keys,
        }
    }

    /// Restore a stored session, trusting it without asking the server.
    ///
    /// Both keys must be present; a lone token or user is removed so storage
    /// never keeps half a session.
    pub async fn init(&self) -> Result<AuthStatus> {
        let token = self.read_key(&self.keys.token_key).await?;
        let user = self.read_key(&self.keys.user_key).await?;

        match (token, user) {
            (Some(token), Some(raw_user)) => match serde_json::from_str::<UserRecord>(&raw_user) {
                Ok(user) => {
                    debug!(user = %user.display_name(), "found existing session");
                    self.state.lock().await.sign_in(user, token);
                    self.enter_main(None).await;
                    return Ok(AuthStatus::Authenticated);
                }
                Err(e) => {
                    warn!(error = %e, "stored user record is unreadable, discarding session");
                    self.remove_keys().await?;
                }
            },
            (None, None) => debug!("no existing session found"),
            (token, user) => {
                warn!(
                    has_token = token.is_some(),
                    has_user = user.is_some(),
                    "incomplete stored session, discarding"
                );
                self.remove_keys().await?;
            }
        }

        self.events.emit(UiEvent::ShowAuth);
        Ok(AuthStatus::Unauthenticated)
    }

    /// Whether storage currently holds a complete session.
    pub async fn has_stored_session(&self) -> Result<bool> {
        Ok(self.read_key(&self.keys.token_key).await?.is_some()
            && self.read_key(&self.keys.user_key).await?.is_some())
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<UserRecord> {
        if password != password_confirmation {
            self.events.error(messages::PASSWORDS_MISMATCH);
            return Err(SelectError::Validation(
                messages::PASSWORDS_MISMATCH.to_string(),
            ));
        }
        if !is_valid_email(email) {
            self.events.error(messages::INVALID_EMAIL);
            return Err(SelectError::Validation(messages::INVALID_EMAIL.to_string()));
        }

        let strength = check_password_strength(password);
        info!(name = %name, email = %email, password_strength = %strength.level, "starting registration");

        let payload = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirmation: password_confirmation.to_string(),
        };

        self.set_loading(AuthForm::Register, true);
        let result = self.api.register(&payload).await;
        let outcome = self
            .complete_auth(result, messages::REGISTRATION_SUCCESS)
            .await;
        self.set_loading(AuthForm::Register, false);
        outcome
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserRecord> {
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        info!(email = %email, "logging in");
        self.set_loading(AuthForm::Login, true);
        let result = self.api.login(&payload).await;
        let outcome = self.complete_auth(result, messages::LOGIN_SUCCESS).await;
        self.set_loading(AuthForm::Login, false);
        outcome
    }

    /// End the session locally no matter what the server says.
    ///
    /// A failed server-side logout is logged only. Storage errors are returned
    /// after the in-memory session and the UI have already been reset.
    pub async fn logout(&self) -> Result<()> {
        let signed_in = self.state.lock().await.status() == AuthStatus::Authenticated;
        if signed_in {
            if let Err(e) = self.api.logout().await {
                error!(error = %e, "server logout failed, clearing local session anyway");
            }
        }

        let cleared = self.clear_session().await;

        self.events.emit(UiEvent::ShowAuth);
        self.events.success(messages::LOGOUT_SUCCESS);
        info!("logged out");
        cleared
    }

    pub async fn status(&self) -> AuthStatus {
        self.state.lock().await.status()
    }

    pub async fn current_user(&self) -> Option<UserRecord> {
        self.state.lock().await.user().cloned()
    }

    async fn complete_auth(
        &self,
        result: Result<AuthResponse>,
        success_message: &str,
    ) -> Result<UserRecord> {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let message = e.user_message();
                warn!(error = %message, "authentication failed");
                self.events.error(&message);
                return Err(SelectError::Auth(message));
            }
        };

        let user = response.user.clone();
        if let Err(e) = self.handle_auth_success(response).await {
            self.events.error(e.user_message());
            return Err(e);
        }

        self.enter_main(Some(success_message)).await;
        Ok(user)
    }

    /// Persist the credentials, then adopt them as the session.
    async fn handle_auth_success(&self, response: AuthResponse) -> Result<()> {
        if response.token.is_empty() {
            return Err(SelectError::Auth(messages::AUTH_FAILED.to_string()));
        }

        let user_json = serde_json::to_string(&response.user)
            .map_err(|e| SelectError::Internal(anyhow::anyhow!("failed to encode user: {}", e)))?;

        self.storage
            .set(&self.keys.token_key, &response.token)
            .await
            .map_err(storage_error)?;
        if let Err(e) = self.storage.set(&self.keys.user_key, &user_json).await {
            if let Err(undo) = self.storage.remove(&self.keys.token_key).await {
                error!(error = %undo, "failed to remove token after user write failed");
            }
            return Err(storage_error(e));
        }

        self.state
            .lock()
            .await
            .sign_in(response.user, response.token);
        Ok(())
    }

    async fn enter_main(&self, success_message: Option<&str>) {
        let user_name = self
            .state
            .lock()
            .await
            .user()
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| "Fighter".to_string());

        self.events.emit(UiEvent::ShowMain { user_name });
        if let Some(message) = success_message {
            self.events.success(message);
        }

        // already surfaced by the fighter manager
        let _ = self.fighters.load_fighters().await;
        self.fighters.load_favorites().await;
    }

    async fn clear_session(&self) -> Result<()> {
        self.state.lock().await.sign_out();
        self.remove_keys().await
    }

    /// Remove both keys, attempting the second even if the first fails.
    async fn remove_keys(&self) -> Result<()> {
        let token = self.storage.remove(&self.keys.token_key).await;
        let user = self.storage.remove(&self.keys.user_key).await;
        token.and(user).map_err(storage_error)
    }

    /// Empty values count as absent.
    async fn read_key(&self, key: &str) -> Result<Option<String>> {
        let value = self.storage.get(key).await.map_err(storage_error)?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    fn set_loading(&self, form: AuthForm, active: bool) {
        self.events.emit(UiEvent::Loading { form, active });
    }
}

fn storage_error(e: anyhow::Error) -> SelectError {
    SelectError::Storage(format!("{:#}", e))
}
