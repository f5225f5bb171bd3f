use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::errors::normalize_error;
use super::transport::{ApiRequest, Method, Transport};
use crate::config::messages;
use crate::error::{Result, SelectError};
use crate::model::{
    AuthResponse, FighterId, FighterRecord, LoginRequest, RegisterRequest, parse_favorites,
};
use crate::session::SharedState;
use crate::utils::generate_id;

/// Method and body of one call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            body: None,
        }
    }

    pub fn post() -> Self {
        Self {
            method: Method::Post,
            body: None,
        }
    }

    pub fn post_json(body: &impl Serialize) -> Result<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| SelectError::Internal(anyhow::anyhow!("failed to encode body: {}", e)))?;
        Ok(Self {
            method: Method::Post,
            body: Some(body),
        })
    }
}

/// Client for the fighter REST API.
///
/// Reads the bearer token from session state on every call but never writes
/// to it; callers own all state transitions.
#[derive(Clone)]
pub struct ApiService {
    transport: Arc<dyn Transport>,
    base_url: String,
    state: SharedState,
    debug_mode: bool,
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("base_url", &self.base_url)
            .field("debug_mode", &self.debug_mode)
            .finish()
    }
}

impl ApiService {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        state: SharedState,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state,
            debug_mode: false,
        }
    }

    /// Log request and response bodies.
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and return the decoded JSON body.
    ///
    /// Fails with `Network` when the transport fails or the body is not JSON,
    /// and with `Request` when the status is outside 2xx. No retries.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];

        let token = self.state.lock().await.token().map(str::to_owned);
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let request_id = generate_id();
        debug!(request_id = %request_id, method = %options.method, url = %url, "sending API request");
        if self.debug_mode {
            if let Some(ref body) = options.body {
                debug!(request_id = %request_id, body = %redact(body), "request body");
            }
        }

        let request = ApiRequest {
            method: options.method,
            url,
            headers,
            body: options.body,
        };

        let response = self.transport.send(request).await.map_err(|e| {
            error!(request_id = %request_id, error = %e, "API request failed");
            SelectError::Network(messages::NETWORK_ERROR.to_string())
        })?;

        let data: Value = serde_json::from_str(&response.body).map_err(|e| {
            error!(request_id = %request_id, status = response.status, error = %e, "failed to parse JSON response");
            SelectError::Network(messages::NETWORK_ERROR.to_string())
        })?;

        if self.debug_mode {
            debug!(request_id = %request_id, status = response.status, body = %data, "API response");
        }

        if !(200..300).contains(&response.status) {
            let message = normalize_error(response.status, &data);
            warn!(request_id = %request_id, status = response.status, message = %message, "API returned an error");
            return Err(SelectError::Request {
                status: response.status,
                message,
            });
        }

        Ok(data)
    }

    pub async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse> {
        let data = self
            .request("/register", RequestOptions::post_json(payload)?)
            .await?;
        decode(data)
    }

    pub async fn login(&self, payload: &LoginRequest) -> Result<AuthResponse> {
        let data = self
            .request("/login", RequestOptions::post_json(payload)?)
            .await?;
        decode(data)
    }

    pub async fn logout(&self) -> Result<Value> {
        self.request("/logout", RequestOptions::post()).await
    }

    pub async fn list_characters(&self) -> Result<Vec<FighterRecord>> {
        let data = self.request("/characters", RequestOptions::get()).await?;
        decode(data)
    }

    pub async fn get_character(&self, id: FighterId) -> Result<FighterRecord> {
        let data = self
            .request(&format!("/characters/{}", id), RequestOptions::get())
            .await?;
        decode(data)
    }

    pub async fn toggle_favorite(&self, id: FighterId) -> Result<Value> {
        self.request(&format!("/favorites/toggle/{}", id), RequestOptions::post())
            .await
    }

    pub async fn list_favorites(&self) -> Result<Vec<FighterId>> {
        let data = self.request("/favorites", RequestOptions::get()).await?;
        Ok(parse_favorites(&data))
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| {
        error!(error = %e, "unexpected response shape");
        SelectError::Network(messages::INVALID_RESPONSE.to_string())
    })
}

/// Copy of a request body with password fields masked, for logging.
fn redact(body: &Value) -> Value {
    let mut body = body.clone();
    if let Value::Object(ref mut fields) = body {
        for (key, value) in fields.iter_mut() {
            if key.contains("password") {
                *value = Value::String("***".to_string());
            }
        }
    }
    body
}
