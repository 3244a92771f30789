//! Profile editor: rename a profile or pick another icon

use tracing::info;

use crate::api::firestore::DocumentStore;
use crate::models::{Profile, User};
use crate::store::{ProfilesAction, Store};
use crate::validation::FieldError;

use super::{FormError, TextInput};

/// Icons a profile can use
pub const PROFILE_ICONS: &[&str] = &["yellow", "blue", "red", "green", "purple"];

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEditor {
    /// Name the profile is stored under
    pub original: Profile,
    pub name: TextInput,
    pub icon: usize,
    pub error: Option<FormError>,
}

impl ProfileEditor {
    pub fn new(profile: Profile) -> Self {
        let icon = PROFILE_ICONS
            .iter()
            .position(|i| *i == profile.profile_icon)
            .unwrap_or(0);
        Self {
            name: TextInput::new().with_value(&profile.name),
            original: profile,
            icon,
            error: None,
        }
    }

    pub fn icon_name(&self) -> &'static str {
        PROFILE_ICONS[self.icon % PROFILE_ICONS.len()]
    }

    pub fn next_icon(&mut self) {
        self.icon = (self.icon + 1) % PROFILE_ICONS.len();
    }

    pub fn prev_icon(&mut self) {
        self.icon = (self.icon + PROFILE_ICONS.len() - 1) % PROFILE_ICONS.len();
    }

    pub fn input_mut(&mut self) -> &mut TextInput {
        self.error = None;
        &mut self.name
    }

    /// Profile as it would be saved
    pub fn edited(&self) -> Profile {
        Profile::new(self.name.value().trim(), self.icon_name())
    }

    /// Write the profile and close the editor
    pub async fn save(
        &mut self,
        docs: &dyn DocumentStore,
        user: &User,
        store: &mut Store,
    ) -> Result<Profile, FormError> {
        let outcome = self.write(docs, user, store).await;
        self.error = outcome.as_ref().err().cloned();
        outcome
    }

    pub fn cancel(&mut self, store: &mut Store) {
        store.dispatch(ProfilesAction::NotEditingProfile);
    }

    async fn write(
        &self,
        docs: &dyn DocumentStore,
        user: &User,
        store: &mut Store,
    ) -> Result<Profile, FormError> {
        let profile = self.edited();
        if profile.name.is_empty() {
            return Err(FieldError::EmptyProfileName.into());
        }

        docs.save_profile(user, &profile)
            .await
            .map_err(|e| FormError::Alert(e.to_string()))?;

        let renamed = profile.name != self.original.name;
        if renamed {
            docs.remove_profile(user, &self.original.name)
                .await
                .map_err(|e| FormError::Alert(e.to_string()))?;
            if store.state().profiles.current_profile == self.original.name {
                store.dispatch(ProfilesAction::SetCurrentProfile(profile.name.clone()));
            }
        }
        info!(profile = %profile.name, renamed, "profile saved");

        store.dispatch(ProfilesAction::NotEditingProfile);
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::firestore::MemoryDocStore;

    fn user() -> User {
        User {
            uid: "u1".into(),
            email: "neo@matrix.io".into(),
            id_token: "t".into(),
            refresh_token: String::new(),
            expires_at: None,
        }
    }

    #[test]
    fn test_icon_cycle() {
        let mut editor = ProfileEditor::new(Profile::new("Kids", "purple"));
        assert_eq!(editor.icon_name(), "purple");
        editor.next_icon();
        assert_eq!(editor.icon_name(), "yellow");
        editor.prev_icon();
        assert_eq!(editor.icon_name(), "purple");
    }

    #[tokio::test]
    async fn test_rename_replaces_document() {
        let docs = MemoryDocStore::new();
        docs.save_profile(&user(), &Profile::new("Kids", "blue")).await.unwrap();

        let mut store = Store::in_memory();
        store.dispatch(ProfilesAction::SetCurrentProfile("Kids".into()));
        store.dispatch(ProfilesAction::EditingProfile(Profile::new("Kids", "blue")));

        let mut editor = ProfileEditor::new(Profile::new("Kids", "blue"));
        editor.name = TextInput::new().with_value("Family");
        editor.save(&docs, &user(), &mut store).await.unwrap();

        let names: Vec<_> = docs
            .list_profiles(&user())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Family".to_string()]);
        assert_eq!(store.state().profiles.current_profile, "Family");
        assert!(!store.state().profiles.is_editing_profile);
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let docs = MemoryDocStore::new();
        let mut store = Store::in_memory();
        let mut editor = ProfileEditor::new(Profile::new("   ", "red"));
        assert_eq!(
            editor.save(&docs, &user(), &mut store).await,
            Err(FormError::Field(FieldError::EmptyProfileName))
        );
    }
}
