use tracing::{debug, error, info, warn};

use crate::api::ApiService;
use crate::config::messages;
use crate::error::{Result, SelectError};
use crate::event::{CardView, EventSender, UiEvent};
use crate::model::{FighterDetails, FighterId, FighterRecord};
use crate::session::{AppState, AuthStatus, FavoriteSet, SharedState, ToggleOutcome};

/// Catalog loading, the details modal, and favorite toggling.
#[derive(Clone, Debug)]
pub struct FighterManager {
    api: ApiService,
    state: SharedState,
    events: EventSender,
}

impl FighterManager {
    pub fn new(api: ApiService, state: SharedState, events: EventSender) -> Self {
        Self { api, state, events }
    }

    /// Fetch the catalog and redraw the grid.
    ///
    /// On failure the previously loaded catalog is kept as it was.
    pub async fn load_fighters(&self) -> Result<usize> {
        let fighters = match self.api.list_characters().await {
            Ok(fighters) => fighters,
            Err(e) => {
                error!(error = %e, "failed to load fighters");
                self.events.error(format!(
                    "{}: {}",
                    messages::FIGHTERS_LOAD_FAILED,
                    e.user_message()
                ));
                return Err(e);
            }
        };

        let count = fighters.len();
        let cards = {
            let mut state = self.state.lock().await;
            state.replace_fighters(fighters);
            render(&state)
        };
        info!(count, "loaded fighters");
        self.events.emit(UiEvent::CardsRendered { cards });

        Ok(count)
    }

    /// Replace the favorite set with the server's.
    ///
    /// Failures are logged and leave an empty set; they are not surfaced. A
    /// result that arrives after the session changed is dropped.
    pub async fn load_favorites(&self) -> usize {
        let epoch = {
            let state = self.state.lock().await;
            if state.status() == AuthStatus::Unauthenticated {
                debug!("not signed in, skipping favorites");
                return 0;
            }
            state.epoch()
        };

        let favorites: FavoriteSet = match self.api.list_favorites().await {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!(error = %e, "failed to load favorites");
                FavoriteSet::default()
            }
        };

        let mut state = self.state.lock().await;
        if state.epoch() != epoch {
            debug!("session changed while loading favorites, dropping result");
            return 0;
        }

        let count = favorites.len();
        state.set_favorites(favorites);
        debug!(count, "favorites reconciled");

        if !state.fighters().is_empty() {
            let cards = render(&state);
            drop(state);
            self.events.emit(UiEvent::CardsRendered { cards });
        }

        count
    }

    /// Current grid, one card per catalog entry.
    pub async fn render_cards(&self) -> Vec<CardView> {
        render(&*self.state.lock().await)
    }

    pub async fn is_favorite(&self, id: FighterId) -> bool {
        self.state.lock().await.is_favorite(id)
    }

    pub async fn favorite_ids(&self) -> Vec<FighterId> {
        self.state.lock().await.favorites().iter().collect()
    }

    /// Catalog entries that are favorited, in catalog order.
    pub async fn favorite_fighters(&self) -> Vec<FighterRecord> {
        let state = self.state.lock().await;
        state
            .fighters()
            .iter()
            .filter(|f| state.is_favorite(f.id))
            .cloned()
            .collect()
    }

    /// Open the details modal for the card at `index`. Out-of-range indexes
    /// are ignored.
    pub async fn show_details(&self, index: usize) -> Option<FighterDetails> {
        let mut state = self.state.lock().await;
        let fighter = state.fighter_at(index)?.clone();
        Some(self.open_modal(&mut state, fighter))
    }

    /// Open the details modal by id, fetching the record if it is not in the
    /// loaded catalog.
    pub async fn show_fighter(&self, id: FighterId) -> Result<FighterDetails> {
        let cached = self.state.lock().await.fighter_by_id(id).cloned();
        let fighter = match cached {
            Some(fighter) => fighter,
            None => {
                debug!(fighter_id = %id, "fighter not in catalog, fetching");
                self.api.get_character(id).await.map_err(|e| match e {
                    SelectError::Request { status: 404, .. } => SelectError::UnknownFighter(id),
                    other => other,
                })?
            }
        };

        let mut state = self.state.lock().await;
        Ok(self.open_modal(&mut state, fighter))
    }

    fn open_modal(&self, state: &mut AppState, fighter: FighterRecord) -> FighterDetails {
        let details = FighterDetails::from(&fighter);
        let favorited = state.is_favorite(fighter.id);
        state.select_fighter(fighter);

        self.events.emit(UiEvent::ModalOpened {
            details: details.clone(),
        });
        self.events.emit(favorite_button(details.id, favorited));
        details
    }

    pub async fn hide_modal(&self) {
        self.state.lock().await.clear_selection();
        self.events.emit(UiEvent::ModalClosed);
    }

    /// Toggle the fighter currently shown in the modal.
    pub async fn toggle_favorite(&self) -> Result<bool> {
        let id = self
            .state
            .lock()
            .await
            .current()
            .map(|f| f.id)
            .ok_or(SelectError::NoSelection)?;
        self.toggle_favorite_for(id).await
    }

    /// Optimistically flip membership of `id`, then confirm with the server.
    ///
    /// The flip is visible before the request is sent. On failure the prior
    /// membership is restored and the error surfaced. A second toggle for the
    /// same id is rejected until the first settles. Returns the final
    /// membership.
    pub async fn toggle_favorite_for(&self, id: FighterId) -> Result<bool> {
        let (ticket, in_modal) = {
            let mut state = self.state.lock().await;
            let ticket = state.begin_toggle(id).inspect_err(|e| {
                debug!(fighter_id = %id, error = %e, "toggle rejected");
            })?;
            let in_modal = state.current().map(|f| f.id) == Some(id);
            (ticket, in_modal)
        };

        let optimistic = ticket.now_favorite();
        self.show_membership(id, optimistic, in_modal);
        if in_modal {
            self.events.emit(UiEvent::FavoriteButton {
                id,
                favorited: optimistic,
                label: messages::FAVORITE_UPDATING.to_string(),
            });
        }

        info!(fighter_id = %id, favorited = optimistic, "toggling favorite");
        let result = self.api.toggle_favorite(id).await;

        let outcome = self
            .state
            .lock()
            .await
            .finish_toggle(ticket, result.is_ok());

        if outcome == ToggleOutcome::Discarded {
            warn!(fighter_id = %id, "session changed while toggle was in flight, discarding");
            return Err(SelectError::SessionChanged);
        }

        match result {
            Ok(_) => {
                debug!(fighter_id = %id, "favorite toggle acknowledged");
                if in_modal {
                    self.events.emit(UiEvent::FavoriteButton {
                        id,
                        favorited: optimistic,
                        label: messages::FAVORITE_UPDATED.to_string(),
                    });
                    self.events.emit(favorite_button(id, optimistic));
                }
                Ok(optimistic)
            }
            Err(e) => {
                let message = e.user_message();
                error!(fighter_id = %id, error = %message, "failed to update favorites, rolled back");
                self.show_membership(id, ticket.was_favorite, in_modal);
                self.events.error(format!(
                    "{}: {}",
                    messages::FAVORITES_UPDATE_FAILED,
                    message
                ));
                Err(SelectError::FavoriteSync {
                    fighter_id: id,
                    message,
                })
            }
        }
    }

    fn show_membership(&self, id: FighterId, favorited: bool, in_modal: bool) {
        self.events.emit(UiEvent::CardUpdated { id, favorited });
        if in_modal {
            self.events.emit(favorite_button(id, favorited));
        }
    }
}

fn render(state: &AppState) -> Vec<CardView> {
    state
        .fighters()
        .iter()
        .enumerate()
        .map(|(index, fighter)| CardView {
            index,
            id: fighter.id,
            name: fighter.name.clone(),
            image: fighter.image.clone(),
            favorited: state.is_favorite(fighter.id),
        })
        .collect()
}

fn favorite_button(id: FighterId, favorited: bool) -> UiEvent {
    let label = if favorited {
        messages::REMOVE_FROM_FAVORITES
    } else {
        messages::ADD_TO_FAVORITES
    };
    UiEvent::FavoriteButton {
        id,
        favorited,
        label: label.to_string(),
    }
}
