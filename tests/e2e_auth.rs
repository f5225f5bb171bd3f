mod common;

use serde_json::json;

use common::{
    Harness, MockTransport, TOKEN_KEY, USER_KEY, auth_body, roster, signed_in, stored_session,
};
use fighter_select::config::messages;
use fighter_select::{
    AuthForm, AuthStatus, FighterId, MemoryStorage, MessageKind, Method, SelectError, Storage,
    UiEvent, UserRecord,
};

#[tokio::test]
async fn test_init_restores_complete_session() {
    let transport = MockTransport::new();
    transport
        .on(Method::Get, "/characters", 200, roster())
        .on(Method::Get, "/favorites", 200, json!([{"character_id": 2}]));
    let mut h = Harness::with_transport(transport, stored_session("Jin", "tok-1"));

    let status = h.arena.init().await.expect("init");

    assert_eq!(status, AuthStatus::Authenticated);
    assert_eq!(h.arena.status().await, AuthStatus::Authenticated);
    assert_eq!(
        h.arena.auth().current_user().await.unwrap().display_name(),
        "Jin"
    );

    let events = h.drain();
    assert!(events.contains(&UiEvent::ShowMain {
        user_name: "Jin".to_string()
    }));

    let catalog = h.transport.requests_to(Method::Get, "/characters");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].header("authorization"), Some("Bearer tok-1"));

    let cards = h.arena.fighters().render_cards().await;
    assert_eq!(cards.len(), 2);
    assert!(!cards[0].favorited);
    assert!(cards[1].favorited);
}

#[tokio::test]
async fn test_init_discards_half_session() {
    let storage = MemoryStorage::with_entries([(TOKEN_KEY, "tok-1")]);
    let mut h = Harness::new(storage);

    let status = h.arena.init().await.expect("init");

    assert_eq!(status, AuthStatus::Unauthenticated);
    assert_eq!(h.storage.get(TOKEN_KEY).await.unwrap(), None);
    assert_eq!(h.storage.get(USER_KEY).await.unwrap(), None);
    assert!(h.transport.requests().is_empty());
    assert_eq!(h.drain(), vec![UiEvent::ShowAuth]);
}

#[tokio::test]
async fn test_init_discards_unreadable_user() {
    let storage = MemoryStorage::with_entries([(TOKEN_KEY, "tok-1"), (USER_KEY, "{not json")]);
    let h = Harness::new(storage);

    assert_eq!(h.arena.init().await.unwrap(), AuthStatus::Unauthenticated);
    assert!(!h.arena.auth().has_stored_session().await.unwrap());
}

#[tokio::test]
async fn test_init_without_session_shows_auth() {
    let mut h = Harness::new(MemoryStorage::new());

    assert_eq!(h.arena.init().await.unwrap(), AuthStatus::Unauthenticated);
    assert_eq!(h.drain(), vec![UiEvent::ShowAuth]);
}

#[tokio::test]
async fn test_register_rejects_mismatched_confirmation() {
    let mut h = Harness::new(MemoryStorage::new());

    let err = h
        .arena
        .register("Jin", "jin@mishima.jp", "secret123", "secret124")
        .await
        .unwrap_err();

    assert!(matches!(err, SelectError::Validation(ref m) if m == messages::PASSWORDS_MISMATCH));
    assert!(h.transport.requests().is_empty());
    assert_eq!(
        h.messages(MessageKind::Error),
        vec!["Passwords do not match".to_string()]
    );
    assert_eq!(h.arena.status().await, AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let h = Harness::new(MemoryStorage::new());

    let err = h
        .arena
        .register("Jin", "not-an-email", "secret123", "secret123")
        .await
        .unwrap_err();

    assert!(matches!(err, SelectError::Validation(_)));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn test_register_surfaces_field_errors() {
    let transport = MockTransport::new();
    transport.on(
        Method::Post,
        "/register",
        422,
        json!({
            "message": "The given data was invalid.",
            "errors": {
                "email": ["The email has already been taken."],
                "password": ["The password must be at least 8 characters."]
            }
        }),
    );
    let mut h = Harness::with_transport(transport, MemoryStorage::new());

    let err = h
        .arena
        .register("Jin", "jin@mishima.jp", "short", "short")
        .await
        .unwrap_err();

    let expected = "The email has already been taken., The password must be at least 8 characters.";
    assert_eq!(err.to_string(), expected);
    assert_eq!(h.messages(MessageKind::Error), vec![expected.to_string()]);
}

#[tokio::test]
async fn test_register_signs_in() {
    let transport = MockTransport::new();
    transport
        .on(Method::Post, "/register", 201, auth_body("Hwoarang", "tok-r"))
        .on(Method::Get, "/characters", 200, roster())
        .on(Method::Get, "/favorites", 200, json!([]));
    let mut h = Harness::with_transport(transport, MemoryStorage::new());

    let user = h
        .arena
        .register("Hwoarang", "hwoarang@mishima.jp", "secret123", "secret123")
        .await
        .expect("register");

    assert_eq!(user.display_name(), "Hwoarang");
    assert_eq!(h.storage.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok-r"));

    let body = h.transport.requests_to(Method::Post, "/register")[0]
        .body
        .clone()
        .unwrap();
    assert_eq!(body["password_confirmation"], "secret123");

    assert_eq!(
        h.messages(MessageKind::Success),
        vec![messages::REGISTRATION_SUCCESS.to_string()]
    );
}

#[tokio::test]
async fn test_login_persists_session() {
    let transport = MockTransport::new();
    transport
        .on(Method::Post, "/login", 200, auth_body("Jin", "tok-9"))
        .on(Method::Get, "/characters", 200, roster())
        .on(Method::Get, "/favorites", 200, json!({"data": [{"character_id": "1"}]}));
    let mut h = Harness::with_transport(transport, MemoryStorage::new());

    let user = h.arena.login("jin@mishima.jp", "secret123").await.expect("login");

    assert_eq!(user.display_name(), "Jin");
    assert_eq!(h.arena.status().await, AuthStatus::Authenticated);
    assert_eq!(h.storage.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok-9"));

    let stored: UserRecord =
        serde_json::from_str(&h.storage.get(USER_KEY).await.unwrap().unwrap()).unwrap();
    assert_eq!(stored, user);

    let login = &h.transport.requests_to(Method::Post, "/login")[0];
    assert_eq!(login.header("authorization"), None);
    assert_eq!(login.header("accept"), Some("application/json"));
    assert_eq!(
        login.body,
        Some(json!({"email": "jin@mishima.jp", "password": "secret123"}))
    );

    // requests after sign-in carry the new token
    let favorites = &h.transport.requests_to(Method::Get, "/favorites")[0];
    assert_eq!(favorites.header("Authorization"), Some("Bearer tok-9"));
    assert!(h.arena.fighters().is_favorite(FighterId::new(1)).await);

    let events = h.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        UiEvent::Message { kind: MessageKind::Success, text, .. } if text == messages::LOGIN_SUCCESS
    )));
    assert_eq!(
        events.first(),
        Some(&UiEvent::Loading {
            form: AuthForm::Login,
            active: true
        })
    );
    assert_eq!(
        events.last(),
        Some(&UiEvent::Loading {
            form: AuthForm::Login,
            active: false
        })
    );
}

#[tokio::test]
async fn test_login_failure_leaves_state_untouched() {
    let transport = MockTransport::new();
    transport.on(
        Method::Post,
        "/login",
        401,
        json!({"message": "Invalid credentials"}),
    );
    let mut h = Harness::with_transport(transport, MemoryStorage::new());

    let err = h.arena.login("jin@mishima.jp", "wrong").await.unwrap_err();

    assert!(matches!(err, SelectError::Auth(ref m) if m == "Invalid credentials"));
    assert_eq!(h.arena.status().await, AuthStatus::Unauthenticated);
    assert_eq!(h.storage.get(TOKEN_KEY).await.unwrap(), None);
    assert_eq!(h.storage.get(USER_KEY).await.unwrap(), None);
    assert_eq!(
        h.messages(MessageKind::Error),
        vec!["Invalid credentials".to_string()]
    );
}

#[tokio::test]
async fn test_login_network_failure() {
    let transport = MockTransport::new();
    transport.fail(Method::Post, "/login");
    let mut h = Harness::with_transport(transport, MemoryStorage::new());

    let err = h.arena.login("jin@mishima.jp", "secret123").await.unwrap_err();

    assert_eq!(err.to_string(), messages::NETWORK_ERROR);
    assert_eq!(
        h.messages(MessageKind::Error),
        vec![messages::NETWORK_ERROR.to_string()]
    );
}

#[tokio::test]
async fn test_login_rejects_non_json_success() {
    let transport = MockTransport::new();
    transport.on_raw(Method::Post, "/login", 200, "<html>ok</html>");
    let h = Harness::with_transport(transport, MemoryStorage::new());

    let err = h.arena.login("jin@mishima.jp", "secret123").await.unwrap_err();

    assert_eq!(err.to_string(), messages::NETWORK_ERROR);
    assert_eq!(h.arena.status().await, AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn test_login_rejects_empty_token() {
    let transport = MockTransport::new();
    transport.on(Method::Post, "/login", 200, auth_body("Jin", ""));
    let h = Harness::with_transport(transport, MemoryStorage::new());

    let err = h.arena.login("jin@mishima.jp", "secret123").await.unwrap_err();

    assert!(matches!(err, SelectError::Auth(_)));
    assert_eq!(h.storage.get(TOKEN_KEY).await.unwrap(), None);
    assert_eq!(h.arena.status().await, AuthStatus::Unauthenticated);
}

#[tokio::test]
async fn test_logout_returns_to_signed_out_state() {
    let mut h = signed_in(json!([{"character_id": 1}])).await;
    h.transport.on(Method::Post, "/logout", 200, json!({"message": "bye"}));

    h.arena.logout().await.expect("logout");

    assert_eq!(h.arena.status().await, AuthStatus::Unauthenticated);
    assert!(h.arena.auth().current_user().await.is_none());
    assert!(!h.arena.auth().has_stored_session().await.unwrap());
    assert!(h.arena.fighters().favorite_ids().await.is_empty());

    let logout = &h.transport.requests_to(Method::Post, "/logout")[0];
    assert_eq!(logout.header("authorization"), Some("Bearer tok-1"));

    let events = h.drain();
    assert!(events.contains(&UiEvent::ShowAuth));
    assert!(events.iter().any(|e| matches!(
        e,
        UiEvent::Message { kind: MessageKind::Success, text, .. } if text == messages::LOGOUT_SUCCESS
    )));
}

#[tokio::test]
async fn test_logout_clears_even_when_server_fails() {
    let mut h = signed_in(json!([])).await;
    h.transport.fail(Method::Post, "/logout");

    h.arena.logout().await.expect("logout");

    assert_eq!(h.arena.status().await, AuthStatus::Unauthenticated);
    assert!(!h.arena.auth().has_stored_session().await.unwrap());
    assert!(h.messages(MessageKind::Error).is_empty());
}

#[tokio::test]
async fn test_logout_when_signed_out_skips_server() {
    let h = Harness::new(MemoryStorage::new());

    h.arena.logout().await.expect("logout");

    assert!(h.transport.requests().is_empty());
}
