#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};

use fighter_select::{
    ApiRequest, ApiResponse, Arena, MemoryStorage, MessageKind, Method, Transport, TransportError,
    UiEvent,
};

pub const BASE_URL: &str = "http://arena.test/api";
pub const TOKEN_KEY: &str = "tekken_token";
pub const USER_KEY: &str = "tekken_user";

enum Reply {
    Respond(ApiResponse),
    Fail(String),
}

struct Hold {
    reached: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Handle for a request parked by `MockTransport::hold`.
pub struct Gate {
    reached: oneshot::Receiver<()>,
    release: oneshot::Sender<()>,
}

impl Gate {
    /// Wait until the held request has been sent.
    pub async fn reached(&mut self) {
        (&mut self.reached).await.expect("held request was never sent");
    }

    /// Let the held request receive its reply.
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

/// A transport that replays scripted replies per route, in order, and
/// records every request it sees.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    holds: Mutex<HashMap<String, Hold>>,
    requests: Mutex<Vec<ApiRequest>>,
}

fn route(method: Method, path: &str) -> String {
    format!("{} {}", method, path)
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON reply for `method path`.
    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, Reply::Respond(ApiResponse::json(status, &body)))
    }

    /// Queue a raw (possibly non-JSON) reply.
    pub fn on_raw(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.push(method, path, Reply::Respond(ApiResponse::new(status, body)))
    }

    /// Queue a failure that never produces a response.
    pub fn fail(&self, method: Method, path: &str) -> &Self {
        self.push(method, path, Reply::Fail("connection refused".to_string()))
    }

    fn push(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(route(method, path))
            .or_default()
            .push_back(reply);
        self
    }

    /// Park the next request to `method path` until the gate is released.
    pub fn hold(&self, method: Method, path: &str) -> Gate {
        let (reached_tx, reached_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.holds.lock().unwrap().insert(
            route(method, path),
            Hold {
                reached: reached_tx,
                release: release_rx,
            },
        );
        Gate {
            reached: reached_rx,
            release: release_tx,
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests sent to `method path`.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        let url = format!("{}{}", BASE_URL, path);
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url == url)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        let key = route(request.method, &path);
        self.requests.lock().unwrap().push(request);

        let hold = self.holds.lock().unwrap().remove(&key);
        if let Some(hold) = hold {
            let _ = hold.reached.send(());
            let _ = hold.release.await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(TransportError(message)),
            None => Err(TransportError(format!("no scripted reply for {}", key))),
        }
    }
}

/// An arena wired to a mock transport and in-memory storage.
pub struct Harness {
    pub arena: Arena,
    pub transport: Arc<MockTransport>,
    pub storage: Arc<MemoryStorage>,
    pub events: mpsc::Receiver<UiEvent>,
}

impl Harness {
    pub fn new(storage: MemoryStorage) -> Self {
        Self::with_transport(MockTransport::new(), storage)
    }

    pub fn with_transport(transport: Arc<MockTransport>, storage: MemoryStorage) -> Self {
        let storage = Arc::new(storage);
        let (tx, events) = mpsc::channel(256);
        let arena = Arena::builder()
            .base_url(BASE_URL)
            .transport(transport.clone())
            .storage(storage.clone())
            .events(tx)
            .build()
            .expect("build arena");
        Self {
            arena,
            transport,
            storage,
            events,
        }
    }

    /// Events emitted since the last drain.
    pub fn drain(&mut self) -> Vec<UiEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Message texts of `kind` emitted since the last drain.
    pub fn messages(&mut self, kind: MessageKind) -> Vec<String> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Message { kind: k, text, .. } if k == kind => Some(text),
                _ => None,
            })
            .collect()
    }
}

pub fn user_json(name: &str) -> Value {
    json!({"id": 1, "name": name, "email": format!("{}@mishima.jp", name.to_lowercase())})
}

pub fn auth_body(name: &str, token: &str) -> Value {
    json!({"user": user_json(name), "token": token})
}

pub fn roster() -> Value {
    json!([
        {"id": 1, "name": "A", "country": "Japan", "fighting_style": "Karate"},
        {"id": 2, "name": "B", "country": "Korea", "fighting_style": "Taekwondo"},
    ])
}

/// Storage holding a complete session from a previous run.
pub fn stored_session(name: &str, token: &str) -> MemoryStorage {
    MemoryStorage::with_entries([
        (TOKEN_KEY.to_string(), token.to_string()),
        (USER_KEY.to_string(), user_json(name).to_string()),
    ])
}

/// Restore a stored session whose catalog is `roster()` and whose
/// favorites are `favorites`.
pub async fn signed_in(favorites: Value) -> Harness {
    let transport = MockTransport::new();
    transport
        .on(Method::Get, "/characters", 200, roster())
        .on(Method::Get, "/favorites", 200, favorites);

    let mut harness = Harness::with_transport(transport, stored_session("Jin", "tok-1"));
    harness.arena.init().await.expect("restore session");
    harness.drain();
    harness
}
