//! Password change: confirm the current password, then enter the new one twice

use crate::auth::{AuthError, AuthSession};
use crate::store::{PrivateSettingsAction, Store};
use crate::validation::{validate_password, validate_repeat, FieldError};

use super::{FlowStep, FormError, TextInput};

#[derive(Debug, Clone, PartialEq)]
pub struct PasswordChangeFlow {
    pub step: FlowStep,
    pub current: TextInput,
    pub new_password: TextInput,
    pub repeat: TextInput,
    /// Whether `repeat` has focus while collecting the new password
    pub on_repeat: bool,
    pub error: Option<FormError>,
}

impl Default for PasswordChangeFlow {
    fn default() -> Self {
        Self {
            step: FlowStep::CollectingCurrent,
            current: TextInput::masked(),
            new_password: TextInput::masked(),
            repeat: TextInput::masked(),
            on_repeat: false,
            error: None,
        }
    }
}

impl PasswordChangeFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &'static str {
        match self.step {
            FlowStep::CollectingCurrent | FlowStep::Verifying => "Enter your password",
            FlowStep::CollectingNew | FlowStep::Done => "Enter your new password",
        }
    }

    pub fn button_label(&self) -> &'static str {
        match self.step {
            FlowStep::CollectingCurrent | FlowStep::Verifying => "Next",
            FlowStep::CollectingNew | FlowStep::Done => "Confirm",
        }
    }

    /// Toggle focus between the new password and its repeat
    pub fn next_field(&mut self) {
        if self.step == FlowStep::CollectingNew {
            self.on_repeat = !self.on_repeat;
        }
    }

    pub fn input_mut(&mut self) -> &mut TextInput {
        self.error = None;
        match self.step {
            FlowStep::CollectingCurrent | FlowStep::Verifying => &mut self.current,
            _ if self.on_repeat => &mut self.repeat,
            _ => &mut self.new_password,
        }
    }

    /// Checks on the new password: required, equal, then long enough
    pub fn validate_new(&self) -> Result<(), FieldError> {
        if self.new_password.is_empty() || self.repeat.is_empty() {
            return Err(FieldError::PasswordLength);
        }
        validate_repeat(self.new_password.value(), self.repeat.value())?;
        validate_password(self.new_password.value())
    }

    pub async fn submit(
        &mut self,
        session: &mut AuthSession,
        store: &mut Store,
    ) -> Result<(), FormError> {
        let outcome = match self.step {
            FlowStep::CollectingCurrent | FlowStep::Verifying => self.verify(session).await,
            FlowStep::CollectingNew => self.apply(session, store).await,
            FlowStep::Done => Ok(()),
        };
        self.error = outcome.clone().err();
        outcome
    }

    pub fn cancel(&mut self, store: &mut Store) {
        *self = Self::default();
        store.dispatch(PrivateSettingsAction::PasswordNotChanging);
    }

    async fn verify(&mut self, session: &mut AuthSession) -> Result<(), FormError> {
        if self.current.is_empty() {
            return Err(FieldError::WeakPassword.into());
        }

        self.step = FlowStep::Verifying;
        match session.reauthenticate(self.current.value()).await {
            Ok(()) => {
                self.step = FlowStep::CollectingNew;
                self.on_repeat = false;
                Ok(())
            }
            Err(err) => {
                self.step = FlowStep::CollectingCurrent;
                Err(match err {
                    AuthError::WrongPassword | AuthError::UserMismatch => {
                        FieldError::WrongCurrentPassword.into()
                    }
                    other => FormError::alert(&other),
                })
            }
        }
    }

    async fn apply(&mut self, session: &mut AuthSession, store: &mut Store) -> Result<(), FormError> {
        self.validate_new()?;

        match session.change_password(self.new_password.value()).await {
            Ok(()) => {
                self.step = FlowStep::Done;
                store.dispatch(PrivateSettingsAction::PasswordNotChanging);
                Ok(())
            }
            Err(AuthError::RequiresRecentLogin) => {
                self.step = FlowStep::CollectingCurrent;
                self.current.clear();
                Err(FormError::alert(&AuthError::RequiresRecentLogin))
            }
            Err(AuthError::WeakPassword) => Err(FieldError::WeakPassword.into()),
            Err(other) => Err(FormError::alert(&other)),
        }
    }
}
