use std::time::Duration;

use tokio::sync::mpsc;

use crate::model::{FighterDetails, FighterId};

/// Presentation events.
///
/// The library never draws anything itself; a front-end receives these and
/// renders them however it likes.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Switch to the login/registration view
    ShowAuth,
    /// Switch to the fighter grid
    ShowMain { user_name: String },
    /// An auth form is waiting on the server
    Loading { form: AuthForm, active: bool },
    /// Transient message; `ttl` is how long it should stay up
    Message {
        kind: MessageKind,
        text: String,
        ttl: Duration,
    },
    /// The whole grid was (re)drawn
    CardsRendered { cards: Vec<CardView> },
    /// One card's favorite marker changed
    CardUpdated { id: FighterId, favorited: bool },
    ModalOpened { details: FighterDetails },
    ModalClosed,
    /// Favorite button state inside the modal
    FavoriteButton {
        id: FighterId,
        favorited: bool,
        label: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

/// One card in the selection grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    /// Position in the catalog; what `show_details` takes
    pub index: usize,
    pub id: FighterId,
    pub name: String,
    pub image: Option<String>,
    pub favorited: bool,
}

/// Sender for UI events.
///
/// If constructed with `noop()`, all sends are silently dropped.
#[derive(Clone)]
pub struct EventSender {
    inner: Option<mpsc::Sender<UiEvent>>,
    message_ttl: Duration,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<UiEvent>, message_ttl: Duration) -> Self {
        Self {
            inner: Some(sender),
            message_ttl,
        }
    }

    pub fn noop() -> Self {
        Self {
            inner: None,
            message_ttl: Duration::ZERO,
        }
    }

    /// Best-effort; drops the event if the consumer is behind.
    pub fn emit(&self, event: UiEvent) {
        if let Some(ref sender) = self.inner {
            let _ = sender.try_send(event);
        }
    }

    pub fn success(&self, text: impl Into<String>) {
        self.message(MessageKind::Success, text.into());
    }

    pub fn error(&self, text: impl Into<String>) {
        self.message(MessageKind::Error, text.into());
    }

    fn message(&self, kind: MessageKind, text: String) {
        self.emit(UiEvent::Message {
            kind,
            text,
            ttl: self.message_ttl,
        });
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("active", &self.is_active())
            .finish()
    }
}
