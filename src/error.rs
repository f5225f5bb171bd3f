use crate::model::FighterId;

#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// Transport failure or a response body that was not JSON.
    #[error("{0}")]
    Network(String),

    /// The server answered with a status outside 2xx.
    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("{0}")]
    Auth(String),

    /// Client-side check failed; no request was sent.
    #[error("{0}")]
    Validation(String),

    #[error("failed to sync favorite {fighter_id}: {message}")]
    FavoriteSync {
        fighter_id: FighterId,
        message: String,
    },

    #[error("a favorite toggle for fighter {0} is already in flight")]
    TogglePending(FighterId),

    #[error("session changed while the request was in flight")]
    SessionChanged,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("no fighter selected")]
    NoSelection,

    #[error("unknown fighter: {0}")]
    UnknownFighter(FighterId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SelectError {
    /// The message to show a user, without any wrapping prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::FavoriteSync { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T, E = SelectError> = std::result::Result<T, E>;
