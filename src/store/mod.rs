//! Application store
//!
//! `RootState` is the serializable aggregate of every slice. `Store` owns it,
//! applies actions one at a time and writes a snapshot after each dispatch.
//!
//! Slices:
//! - `modal` - detail modal visibility, trailer mute
//! - `movie` - movie shown in the modal
//! - `subscription` - plan, start date, plan-change flag
//! - `private_settings` - email/password editors
//! - `profiles` - current profile, profile editor

pub mod modal;
pub mod movie;
pub mod persist;
pub mod private_settings;
pub mod profiles;
pub mod subscription;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use modal::{ModalAction, ModalState};
pub use movie::{MovieAction, MovieState};
pub use persist::{FileStorage, LocalStorage, MemoryStorage, PersistError, Persistor};
pub use private_settings::{PrivateSettingsAction, PrivateSettingsState};
pub use profiles::{ProfilesAction, ProfilesState};
pub use subscription::{SubscriptionAction, SubscriptionState};

/// Every slice, persisted as one document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RootState {
    pub modal: ModalState,
    pub movie: MovieState,
    pub subscription: SubscriptionState,
    pub private_settings: PrivateSettingsState,
    pub profiles: ProfilesState,
}

/// An action addressed to exactly one slice
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Modal(ModalAction),
    Movie(MovieAction),
    Subscription(SubscriptionAction),
    PrivateSettings(PrivateSettingsAction),
    Profiles(ProfilesAction),
}

impl From<ModalAction> for Action {
    fn from(action: ModalAction) -> Self {
        Action::Modal(action)
    }
}

impl From<MovieAction> for Action {
    fn from(action: MovieAction) -> Self {
        Action::Movie(action)
    }
}

impl From<SubscriptionAction> for Action {
    fn from(action: SubscriptionAction) -> Self {
        Action::Subscription(action)
    }
}

impl From<PrivateSettingsAction> for Action {
    fn from(action: PrivateSettingsAction) -> Self {
        Action::PrivateSettings(action)
    }
}

impl From<ProfilesAction> for Action {
    fn from(action: ProfilesAction) -> Self {
        Action::Profiles(action)
    }
}

impl RootState {
    /// Route an action to its slice. Other slices are untouched.
    pub fn reduce(&mut self, action: &Action) {
        match action {
            Action::Modal(a) => self.modal.reduce(a),
            Action::Movie(a) => self.movie.reduce(a),
            Action::Subscription(a) => self.subscription.reduce(a),
            Action::PrivateSettings(a) => self.private_settings.reduce(a),
            Action::Profiles(a) => self.profiles.reduce(a),
        }
    }
}

/// Owner of the live `RootState`
pub struct Store {
    state: RootState,
    persistor: Option<Persistor>,
    rehydrated: bool,
}

impl Store {
    /// Store backed by a persistor; call [`Store::rehydrate`] before use
    pub fn new(persistor: Persistor) -> Self {
        Self {
            state: RootState::default(),
            persistor: Some(persistor),
            rehydrated: false,
        }
    }

    /// Store without persistence, already rehydrated
    pub fn in_memory() -> Self {
        Self {
            state: RootState::default(),
            persistor: None,
            rehydrated: true,
        }
    }

    pub fn state(&self) -> &RootState {
        &self.state
    }

    /// False until the persisted snapshot has been restored
    pub fn is_rehydrated(&self) -> bool {
        self.rehydrated
    }

    /// Restore the persisted snapshot into the live state.
    ///
    /// A storage failure is logged and leaves the default state; the store
    /// counts as rehydrated either way.
    pub fn rehydrate(&mut self) {
        if let Some(persistor) = &self.persistor {
            match persistor.load() {
                Ok(state) => self.state = state,
                Err(e) => warn!(error = %e, "rehydration failed, using defaults"),
            }
        }
        self.rehydrated = true;
    }

    /// Apply an action and persist the result
    pub fn dispatch(&mut self, action: impl Into<Action>) {
        let action = action.into();
        let before = self.state.clone();
        self.state.reduce(&action);

        if self.state == before {
            return;
        }
        debug!(?action, "dispatch");
        self.flush();
    }

    /// Reset every slice and drop the stored snapshot
    pub fn reset(&mut self) {
        self.state = RootState::default();
        if let Some(persistor) = &self.persistor {
            if let Err(e) = persistor.purge() {
                warn!(error = %e, "could not purge snapshot");
            }
        }
    }

    fn flush(&self) {
        if let Some(persistor) = &self.persistor {
            if let Err(e) = persistor.save(&self.state) {
                warn!(error = %e, "could not persist store");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Movie, Profile};
    use std::sync::Arc;

    #[test]
    fn test_actions_only_touch_their_slice() {
        let mut state = RootState::default();
        state.reduce(&Action::PrivateSettings(PrivateSettingsAction::LoginChanging));

        assert!(state.private_settings.is_login_changing);
        assert_eq!(state.modal, ModalState::default());
        assert_eq!(state.subscription, SubscriptionState::default());
        assert_eq!(state.profiles, ProfilesState::default());
    }

    #[test]
    fn test_open_close_modal_round_trip() {
        let mut store = Store::in_memory();
        let original = store.state().modal.clone();

        store.dispatch(ModalAction::OpenModal);
        assert!(store.state().modal.is_opened_modal);
        store.dispatch(ModalAction::CloseModal);
        assert_eq!(store.state().modal, original);
    }

    #[test]
    fn test_dispatch_persists_every_change() {
        let storage = Arc::new(MemoryStorage::new());
        let persistor = Persistor::new(storage.clone());
        let mut store = Store::new(persistor.clone());
        store.rehydrate();

        let movie = Movie {
            id: 7,
            title: Some("Seven".into()),
            ..Movie::default()
        };
        store.dispatch(MovieAction::SetMovie(movie.clone()));
        store.dispatch(ProfilesAction::EditingProfile(Profile::new("Kids", "yellow")));

        let restored = persistor.load().unwrap();
        assert_eq!(restored.movie.movie, Some(movie));
        assert!(restored.profiles.is_editing_profile);
    }

    #[test]
    fn test_rehydrate_flag() {
        let mut store = Store::new(Persistor::new(Arc::new(MemoryStorage::new())));
        assert!(!store.is_rehydrated());
        store.rehydrate();
        assert!(store.is_rehydrated());
    }

    #[test]
    fn test_partial_snapshot_fills_defaults() {
        let state: RootState =
            serde_json::from_str(r#"{"modal": {"is_opened_modal": true, "is_muted_video": false}}"#)
                .unwrap();
        assert!(state.modal.is_opened_modal);
        assert_eq!(state.subscription, SubscriptionState::default());
    }

    #[test]
    fn test_reset_clears_state() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = Store::new(Persistor::new(storage.clone()));
        store.rehydrate();
        store.dispatch(SubscriptionAction::Subscribed);
        store.reset();
        assert_eq!(store.state(), &RootState::default());
        assert!(storage.get_item(persist::PERSIST_KEY).unwrap().is_none());
    }
}
