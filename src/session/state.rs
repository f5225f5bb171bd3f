use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::SelectError;
use crate::model::{FighterId, FighterRecord, UserRecord};

/// Handle to the one state container shared by every manager.
///
/// Locks are taken for short, synchronous critical sections only; nothing
/// holds the guard across a network call.
pub type SharedState = Arc<Mutex<AppState>>;

/// The authenticated actor: user and bearer token always travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    Authenticated,
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Favorite fighter ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteSet(BTreeSet<FighterId>);

impl FavoriteSet {
    pub fn contains(&self, id: FighterId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = FighterId> + '_ {
        self.0.iter().copied()
    }

    fn set(&mut self, id: FighterId, member: bool) {
        if member {
            self.0.insert(id);
        } else {
            self.0.remove(&id);
        }
    }
}

impl FromIterator<FighterId> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = FighterId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Proof that an optimistic flip was applied; hand it back to `finish_toggle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleTicket {
    pub id: FighterId,
    /// Membership before the flip
    pub was_favorite: bool,
    epoch: u64,
}

impl ToggleTicket {
    /// Membership after the flip
    pub fn now_favorite(&self) -> bool {
        !self.was_favorite
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Server acknowledged; the optimistic state stands
    Committed,
    /// Server failed; membership restored to its pre-toggle value
    RolledBack,
    /// The session changed while the request was in flight; nothing touched
    Discarded,
}

/// Session and application state. All mutation goes through the named
/// transitions below.
#[derive(Debug, Default)]
pub struct AppState {
    session: Option<Session>,
    fighters: Vec<FighterRecord>,
    favorites: FavoriteSet,
    current: Option<FighterRecord>,
    pending: HashSet<FighterId>,
    /// Bumped on every sign-in and sign-out
    epoch: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedState {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn status(&self) -> AuthStatus {
        if self.session.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Unauthenticated
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn fighters(&self) -> &[FighterRecord] {
        &self.fighters
    }

    pub fn fighter_at(&self, index: usize) -> Option<&FighterRecord> {
        self.fighters.get(index)
    }

    pub fn fighter_by_id(&self, id: FighterId) -> Option<&FighterRecord> {
        self.fighters.iter().find(|f| f.id == id)
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn is_favorite(&self, id: FighterId) -> bool {
        self.favorites.contains(id)
    }

    pub fn current(&self) -> Option<&FighterRecord> {
        self.current.as_ref()
    }

    /// Changes whenever a session starts or ends.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_toggle_pending(&self, id: FighterId) -> bool {
        self.pending.contains(&id)
    }

    /// Start a session. Favorites belong to the previous session, if any,
    /// and are dropped until reloaded.
    pub fn sign_in(&mut self, user: UserRecord, token: impl Into<String>) {
        self.session = Some(Session {
            user,
            token: token.into(),
        });
        self.favorites = FavoriteSet::default();
        self.pending.clear();
        self.epoch += 1;
        debug!(epoch = self.epoch, "session started");
    }

    /// End the session. The catalog stays loaded.
    pub fn sign_out(&mut self) {
        self.session = None;
        self.favorites = FavoriteSet::default();
        self.pending.clear();
        self.epoch += 1;
        debug!(epoch = self.epoch, "session cleared");
    }

    pub fn replace_fighters(&mut self, fighters: Vec<FighterRecord>) {
        self.fighters = fighters;
    }

    pub fn set_favorites(&mut self, favorites: FavoriteSet) {
        self.favorites = favorites;
    }

    pub fn select_fighter(&mut self, fighter: FighterRecord) {
        self.current = Some(fighter);
    }

    pub fn clear_selection(&mut self) {
        self.current = None;
    }

    /// Apply the optimistic flip for `id` and mark it in flight.
    ///
    /// Fails with `TogglePending` while an earlier toggle for the same id has
    /// not been finished.
    pub fn begin_toggle(&mut self, id: FighterId) -> Result<ToggleTicket, SelectError> {
        if self.session.is_none() {
            return Err(SelectError::NotAuthenticated);
        }
        if !self.pending.insert(id) {
            return Err(SelectError::TogglePending(id));
        }

        let was_favorite = self.favorites.contains(id);
        self.favorites.set(id, !was_favorite);

        Ok(ToggleTicket {
            id,
            was_favorite,
            epoch: self.epoch,
        })
    }

    /// Settle a toggle started with `begin_toggle`.
    ///
    /// Both outcomes write membership explicitly, since a favorites reload
    /// may have replaced the set while the request was in flight.
    pub fn finish_toggle(&mut self, ticket: ToggleTicket, succeeded: bool) -> ToggleOutcome {
        if ticket.epoch != self.epoch {
            return ToggleOutcome::Discarded;
        }

        self.pending.remove(&ticket.id);
        if succeeded {
            self.favorites.set(ticket.id, ticket.now_favorite());
            ToggleOutcome::Committed
        } else {
            self.favorites.set(ticket.id, ticket.was_favorite);
            ToggleOutcome::RolledBack
        }
    }
}
