//! Account forms as explicit state machines
//!
//! Each form validates locally first and only then calls the identity
//! provider. Errors land in `error` for the screen to render:
//! `FormError::Field` under the input, `FormError::Alert` as a popup.

pub mod email_change;
pub mod login;
pub mod password_change;
pub mod plans;
pub mod profile;

use thiserror::Error;

use crate::auth::AuthError;
use crate::validation::FieldError;

pub use email_change::EmailChangeFlow;
pub use login::{LoginField, LoginForm, LoginMode};
pub use password_change::PasswordChangeFlow;
pub use plans::PlanSelector;
pub use profile::ProfileEditor;

/// Steps of a re-authenticating settings flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowStep {
    /// Asking for the current password
    #[default]
    CollectingCurrent,
    /// Current password sent to the provider
    Verifying,
    /// Asking for the new value
    CollectingNew,
    Done,
}

/// Why a form submission did not go through
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    /// Shown next to the offending field
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Blocking alert with the provider's message
    #[error("{0}")]
    Alert(String),
}

impl FormError {
    pub fn alert(err: &AuthError) -> Self {
        FormError::Alert(err.to_string())
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, FormError::Alert(_))
    }
}

// =============================================================================
// Text Input
// =============================================================================

/// Single-line text input with a cursor (counted in characters)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInput {
    value: String,
    cursor: usize,
    masked: bool,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input whose contents render as bullets
    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self.cursor = value.chars().count();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// What the screen shows
    pub fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Insert character at cursor
    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_input_editing() {
        let mut input = TextInput::new();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.cursor_left();
        input.backspace();
        assert_eq!(input.value(), "hélo");
        assert_eq!(input.cursor(), 3);

        input.cursor_right();
        input.insert('!');
        assert_eq!(input.value(), "hélo!");
    }

    #[test]
    fn test_masked_display() {
        let input = TextInput::masked().with_value("secret");
        assert_eq!(input.display(), "••••••");
        assert_eq!(input.value(), "secret");
    }

    #[test]
    fn test_form_error_messages() {
        assert_eq!(
            FormError::from(FieldError::PasswordsNotEqual).to_string(),
            "Passwords are not equal."
        );
        let alert = FormError::alert(&AuthError::Provider("QUOTA_EXCEEDED".into()));
        assert!(alert.is_alert());
        assert_eq!(alert.to_string(), "QUOTA_EXCEEDED");
    }
}
