//! Which account credential editor is open

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrivateSettingsState {
    pub is_login_changing: bool,
    pub is_password_changing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateSettingsAction {
    LoginChanging,
    LoginNotChanging,
    PasswordChanging,
    PasswordNotChanging,
}

impl PrivateSettingsState {
    pub fn reduce(&mut self, action: &PrivateSettingsAction) {
        match action {
            PrivateSettingsAction::LoginChanging => self.is_login_changing = true,
            PrivateSettingsAction::LoginNotChanging => self.is_login_changing = false,
            PrivateSettingsAction::PasswordChanging => self.is_password_changing = true,
            PrivateSettingsAction::PasswordNotChanging => self.is_password_changing = false,
        }
    }
}
