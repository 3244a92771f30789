//! Email change: confirm the current password, then enter the new address

use crate::auth::{AuthError, AuthSession};
use crate::store::{PrivateSettingsAction, Store};
use crate::validation::{is_valid_email, FieldError};

use super::{FlowStep, FormError, TextInput};

#[derive(Debug, Clone, PartialEq)]
pub struct EmailChangeFlow {
    pub step: FlowStep,
    pub current: TextInput,
    pub new_email: TextInput,
    pub error: Option<FormError>,
}

impl Default for EmailChangeFlow {
    fn default() -> Self {
        Self {
            step: FlowStep::CollectingCurrent,
            current: TextInput::masked(),
            new_email: TextInput::new(),
            error: None,
        }
    }
}

impl EmailChangeFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &'static str {
        match self.step {
            FlowStep::CollectingCurrent | FlowStep::Verifying => "Enter your password",
            FlowStep::CollectingNew | FlowStep::Done => "Enter your new email",
        }
    }

    pub fn button_label(&self) -> &'static str {
        match self.step {
            FlowStep::CollectingCurrent | FlowStep::Verifying => "Next",
            FlowStep::CollectingNew | FlowStep::Done => "Confirm",
        }
    }

    /// The single input shown for the current step
    pub fn input(&self) -> &TextInput {
        match self.step {
            FlowStep::CollectingCurrent | FlowStep::Verifying => &self.current,
            FlowStep::CollectingNew | FlowStep::Done => &self.new_email,
        }
    }

    pub fn input_mut(&mut self) -> &mut TextInput {
        self.error = None;
        match self.step {
            FlowStep::CollectingCurrent | FlowStep::Verifying => &mut self.current,
            FlowStep::CollectingNew | FlowStep::Done => &mut self.new_email,
        }
    }

    /// Advance one step: verify the password or apply the new email
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

    /// Leave the flow without changing anything
    pub fn cancel(&mut self, store: &mut Store) {
        *self = Self::default();
        store.dispatch(PrivateSettingsAction::LoginNotChanging);
    }

    async fn verify(&mut self, session: &mut AuthSession) -> Result<(), FormError> {
        if self.current.is_empty() {
            return Err(FieldError::WrongCurrentPassword.into());
        }

        self.step = FlowStep::Verifying;
        match session.reauthenticate(self.current.value()).await {
            Ok(()) => {
                self.step = FlowStep::CollectingNew;
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
        let email = self.new_email.value().trim().to_string();
        if email.is_empty() || !is_valid_email(&email) {
            return Err(FieldError::IncorrectNewEmail.into());
        }

        match session.change_email(&email).await {
            Ok(()) => {
                self.step = FlowStep::Done;
                store.dispatch(PrivateSettingsAction::LoginNotChanging);
                Ok(())
            }
            Err(AuthError::RequiresRecentLogin) => {
                self.step = FlowStep::CollectingCurrent;
                self.current.clear();
                Err(FormError::alert(&AuthError::RequiresRecentLogin))
            }
            Err(AuthError::InvalidEmail) => Err(FieldError::IncorrectNewEmail.into()),
            Err(AuthError::EmailAlreadyInUse) => Err(FieldError::EmailAlreadyInUse.into()),
            Err(other) => Err(FormError::alert(&other)),
        }
    }
}
