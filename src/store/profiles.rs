//! Active profile and the profile being edited

use serde::{Deserialize, Serialize};

use crate::models::Profile;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfilesState {
    pub current_profile: String,
    pub is_editing_profile: bool,
    pub editing: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilesAction {
    SetCurrentProfile(String),
    EditingProfile(Profile),
    NotEditingProfile,
}

impl ProfilesState {
    pub fn reduce(&mut self, action: &ProfilesAction) {
        match action {
            ProfilesAction::SetCurrentProfile(name) => self.current_profile = name.clone(),
            ProfilesAction::EditingProfile(profile) => {
                self.is_editing_profile = true;
                self.editing = Some(profile.clone());
            }
            ProfilesAction::NotEditingProfile => {
                self.is_editing_profile = false;
                self.editing = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_editing_drops_draft() {
        let mut state = ProfilesState::default();
        state.reduce(&ProfilesAction::EditingProfile(Profile::new("Kids", "blue")));
        assert!(state.is_editing_profile);
        assert_eq!(state.editing.as_ref().map(|p| p.name.as_str()), Some("Kids"));

        state.reduce(&ProfilesAction::NotEditingProfile);
        assert_eq!(state, ProfilesState::default());
    }
}
