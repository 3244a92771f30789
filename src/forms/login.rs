//! Sign-in / sign-up form

use crate::auth::{AuthError, AuthSession};
use crate::store::{Store, SubscriptionAction};
use crate::validation::{validate_email, validate_password, validate_repeat, FieldError};

use super::{FormError, TextInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Email,
    Password,
    Repeat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginForm {
    pub mode: LoginMode,
    pub email: TextInput,
    pub password: TextInput,
    pub repeat: TextInput,
    pub focus: LoginField,
    pub error: Option<FormError>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            mode: LoginMode::SignIn,
            email: TextInput::new(),
            password: TextInput::masked(),
            repeat: TextInput::masked(),
            focus: LoginField::Email,
            error: None,
        }
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            LoginMode::SignIn => "Sign In",
            LoginMode::SignUp => "Sign Up",
        }
    }

    /// Switch between sign-in and sign-up, clearing any error
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            LoginMode::SignIn => LoginMode::SignUp,
            LoginMode::SignUp => LoginMode::SignIn,
        };
        if self.mode == LoginMode::SignIn && self.focus == LoginField::Repeat {
            self.focus = LoginField::Password;
        }
        self.error = None;
    }

    /// Fields visible in the current mode
    pub fn fields(&self) -> &'static [LoginField] {
        match self.mode {
            LoginMode::SignIn => &[LoginField::Email, LoginField::Password],
            LoginMode::SignUp => &[LoginField::Email, LoginField::Password, LoginField::Repeat],
        }
    }

    pub fn next_field(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + 1) % fields.len()];
    }

    /// Input under the cursor; editing clears the previous error
    pub fn focused_mut(&mut self) -> &mut TextInput {
        self.error = None;
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
            LoginField::Repeat => &mut self.repeat,
        }
    }

    /// Local checks: email, then password length, then (sign-up) repeat
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_email(self.email.value())?;
        validate_password(self.password.value())?;
        if self.mode == LoginMode::SignUp {
            validate_repeat(self.password.value(), self.repeat.value())?;
        }
        Ok(())
    }

    /// Validate, then sign in or up.
    ///
    /// Sign-in marks the user subscribed; a fresh sign-up is unsubscribed
    /// until a plan is picked.
    pub async fn submit(
        &mut self,
        session: &mut AuthSession,
        store: &mut Store,
    ) -> Result<(), FormError> {
        let outcome = self.run(session, store).await;
        self.error = outcome.clone().err();
        outcome
    }

    async fn run(&self, session: &mut AuthSession, store: &mut Store) -> Result<(), FormError> {
        self.validate()?;

        let email = self.email.value();
        let password = self.password.value();
        match self.mode {
            LoginMode::SignIn => {
                session
                    .sign_in(email, password)
                    .await
                    .map_err(|err| match err {
                        AuthError::UserNotFound => FormError::Field(FieldError::UserNotFound),
                        AuthError::WrongPassword => FormError::Field(FieldError::WrongPassword),
                        other => FormError::alert(&other),
                    })?;
                store.dispatch(SubscriptionAction::Subscribed);
            }
            LoginMode::SignUp => {
                session
                    .sign_up(email, password)
                    .await
                    .map_err(|err| match err {
                        AuthError::EmailAlreadyInUse => FormError::Field(FieldError::EmailAlreadyInUse),
                        AuthError::WeakPassword => FormError::Field(FieldError::WeakPassword),
                        AuthError::InvalidEmail => FormError::Field(FieldError::InvalidEmail),
                        other => FormError::alert(&other),
                    })?;
                store.dispatch(SubscriptionAction::Unsubscribed);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(mode: LoginMode, email: &str, password: &str, repeat: &str) -> LoginForm {
        LoginForm {
            mode,
            email: TextInput::new().with_value(email),
            password: TextInput::masked().with_value(password),
            repeat: TextInput::masked().with_value(repeat),
            ..LoginForm::default()
        }
    }

    #[test]
    fn test_validation_order() {
        // email first even when everything is wrong
        let form = filled(LoginMode::SignUp, "nope", "123", "456");
        assert_eq!(form.validate(), Err(FieldError::InvalidEmail));

        let form = filled(LoginMode::SignUp, "a@b.io", "123", "456");
        assert_eq!(form.validate(), Err(FieldError::WeakPassword));

        let form = filled(LoginMode::SignUp, "a@b.io", "123456", "654321");
        assert_eq!(form.validate(), Err(FieldError::PasswordsNotEqual));

        // repeat is ignored when signing in
        let form = filled(LoginMode::SignIn, "a@b.io", "123456", "");
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn test_empty_password_asks_for_length() {
        let form = filled(LoginMode::SignIn, "a@b.io", "", "");
        assert_eq!(form.validate(), Err(FieldError::PasswordLength));
    }

    #[test]
    fn test_field_cycle_depends_on_mode() {
        let mut form = LoginForm::new();
        form.next_field();
        form.next_field();
        assert_eq!(form.focus, LoginField::Email);

        form.toggle_mode();
        form.next_field();
        form.next_field();
        assert_eq!(form.focus, LoginField::Repeat);

        form.toggle_mode();
        assert_eq!(form.focus, LoginField::Password);
        assert_eq!(form.title(), "Sign In");
    }
}
