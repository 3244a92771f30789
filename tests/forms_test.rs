//! Account form flows against the in-memory and mocked identity providers

use std::sync::Arc;

use mockito::{Matcher, Server};

use flixtui::auth::{AuthClient, AuthSession, FirebaseAuth, MemoryAuth};
use flixtui::forms::{
    EmailChangeFlow, FlowStep, FormError, LoginForm, LoginMode, PasswordChangeFlow, PlanSelector,
    TextInput,
};
use flixtui::store::{PrivateSettingsAction, Store, SubscriptionAction};
use flixtui::validation::FieldError;

fn memory_session(auth: &MemoryAuth) -> AuthSession {
    AuthSession::new(Arc::new(auth.clone()))
}

fn login(mode: LoginMode, email: &str, password: &str, repeat: &str) -> LoginForm {
    LoginForm {
        mode,
        email: TextInput::new().with_value(email),
        password: TextInput::masked().with_value(password),
        repeat: TextInput::masked().with_value(repeat),
        ..LoginForm::default()
    }
}

// =============================================================================
// Sign In / Sign Up
// =============================================================================

#[tokio::test]
async fn test_invalid_input_never_reaches_provider() {
    let auth = MemoryAuth::new();
    let mut session = memory_session(&auth);
    let mut store = Store::in_memory();

    let cases = [
        (login(LoginMode::SignIn, "not-an-email", "redpill", ""), FieldError::InvalidEmail),
        (login(LoginMode::SignIn, "neo@matrix.io", "", ""), FieldError::PasswordLength),
        (
            login(LoginMode::SignUp, "neo@matrix.io", "redpill", "bluepill"),
            FieldError::PasswordsNotEqual,
        ),
    ];

    for (mut form, expected) in cases {
        let err = form.submit(&mut session, &mut store).await.unwrap_err();
        assert_eq!(err, FormError::Field(expected.clone()));
        assert_eq!(form.error, Some(FormError::Field(expected)));
    }

    assert_eq!(auth.calls(), 0);
    assert!(!session.is_signed_in());
}

#[tokio::test]
async fn test_sign_in_marks_subscribed() {
    let auth = MemoryAuth::new().with_account("neo@matrix.io", "redpill");
    let mut session = memory_session(&auth);
    let mut store = Store::in_memory();

    let mut form = login(LoginMode::SignIn, "neo@matrix.io", "redpill", "");
    form.submit(&mut session, &mut store).await.unwrap();

    assert!(session.is_signed_in());
    assert!(store.state().subscription.is_subscribed);
    assert!(form.error.is_none());
}

#[tokio::test]
async fn test_sign_in_errors_land_on_fields() {
    let auth = MemoryAuth::new().with_account("neo@matrix.io", "redpill");
    let mut session = memory_session(&auth);
    let mut store = Store::in_memory();

    let mut form = login(LoginMode::SignIn, "smith@matrix.io", "redpill", "");
    let err = form.submit(&mut session, &mut store).await.unwrap_err();
    assert_eq!(err, FormError::Field(FieldError::UserNotFound));

    let mut form = login(LoginMode::SignIn, "neo@matrix.io", "bluepill", "");
    let err = form.submit(&mut session, &mut store).await.unwrap_err();
    assert_eq!(err, FormError::Field(FieldError::WrongPassword));

    // failures dispatch nothing
    assert!(!store.state().subscription.is_subscribed);
}

#[tokio::test]
async fn test_sign_up_then_pick_plan() {
    let auth = MemoryAuth::new();
    let mut session = memory_session(&auth);
    let mut store = Store::in_memory();

    let mut form = login(LoginMode::SignUp, "trinity@matrix.io", "redpill", "redpill");
    form.submit(&mut session, &mut store).await.unwrap();
    assert!(session.is_signed_in());
    assert!(!store.state().subscription.is_subscribed);

    let mut plans = PlanSelector::new();
    assert_eq!(
        plans.submit(session.user(), &mut store),
        Err(FormError::Field(FieldError::NoPlanSelected))
    );

    plans.right();
    plans.choose();
    plans.submit(session.user(), &mut store).unwrap();

    let subscription = &store.state().subscription;
    assert!(subscription.is_subscribed);
    assert_eq!(subscription.plan.as_ref().map(|p| p.id.as_str()), Some("standard"));
    assert!(subscription.start_date.is_some());
}

#[tokio::test]
async fn test_sign_up_existing_email() {
    let auth = MemoryAuth::new().with_account("neo@matrix.io", "redpill");
    let mut session = memory_session(&auth);
    let mut store = Store::in_memory();

    let mut form = login(LoginMode::SignUp, "neo@matrix.io", "redpill", "redpill");
    let err = form.submit(&mut session, &mut store).await.unwrap_err();
    assert_eq!(err, FormError::Field(FieldError::EmailAlreadyInUse));
}

// =============================================================================
// Settings Flows
// =============================================================================

async fn signed_in(auth: &MemoryAuth) -> AuthSession {
    let mut session = memory_session(auth);
    session.sign_in("neo@matrix.io", "redpill").await.unwrap();
    session
}

#[tokio::test]
async fn test_email_change_two_steps() {
    let auth = MemoryAuth::new().with_account("neo@matrix.io", "redpill");
    let mut session = signed_in(&auth).await;
    let mut store = Store::in_memory();
    store.dispatch(PrivateSettingsAction::LoginChanging);

    let mut flow = EmailChangeFlow::new();
    flow.current = TextInput::masked().with_value("bluepill");
    let err = flow.submit(&mut session, &mut store).await.unwrap_err();
    assert_eq!(err, FormError::Field(FieldError::WrongCurrentPassword));
    assert_eq!(flow.step, FlowStep::CollectingCurrent);

    flow.current = TextInput::masked().with_value("redpill");
    flow.submit(&mut session, &mut store).await.unwrap();
    assert_eq!(flow.step, FlowStep::CollectingNew);

    flow.new_email = TextInput::new().with_value("the.one@matrix.io");
    flow.submit(&mut session, &mut store).await.unwrap();

    assert_eq!(flow.step, FlowStep::Done);
    assert_eq!(session.user().map(|u| u.email.as_str()), Some("the.one@matrix.io"));
    assert!(!store.state().private_settings.is_login_changing);
}

#[tokio::test]
async fn test_password_change_checks_new_value_locally() {
    let auth = MemoryAuth::new().with_account("neo@matrix.io", "redpill");
    let mut session = signed_in(&auth).await;
    let mut store = Store::in_memory();

    let mut flow = PasswordChangeFlow::new();
    flow.current = TextInput::masked().with_value("redpill");
    flow.submit(&mut session, &mut store).await.unwrap();
    assert_eq!(flow.step, FlowStep::CollectingNew);
    let calls = auth.calls();

    flow.new_password = TextInput::masked().with_value("zion01");
    flow.repeat = TextInput::masked().with_value("zion02");
    let err = flow.submit(&mut session, &mut store).await.unwrap_err();
    assert_eq!(err, FormError::Field(FieldError::PasswordsNotEqual));
    assert_eq!(auth.calls(), calls);

    flow.repeat = TextInput::masked().with_value("zion01");
    flow.submit(&mut session, &mut store).await.unwrap();
    assert_eq!(flow.step, FlowStep::Done);

    // the new password works for the next sign-in
    let mut fresh = memory_session(&auth);
    fresh.sign_in("neo@matrix.io", "zion01").await.unwrap();
}

#[tokio::test]
async fn test_stale_login_restarts_password_flow() {
    let mut server = Server::new_async().await;

    let _sign_in = server
        .mock("POST", "/accounts:signInWithPassword")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"localId": "uid-1", "email": "neo@matrix.io", "idToken": "old", "refreshToken": "r"}"#,
        )
        .create_async()
        .await;
    let update = server
        .mock("POST", "/accounts:update")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error": {"code": 400, "message": "CREDENTIAL_TOO_OLD_LOGIN_AGAIN"}}"#)
        .create_async()
        .await;

    let auth: Arc<dyn AuthClient> = Arc::new(FirebaseAuth::with_base_url("web-key", server.url()));
    let mut session = AuthSession::new(auth);
    session.sign_in("neo@matrix.io", "redpill").await.unwrap();

    let mut store = Store::in_memory();
    store.dispatch(PrivateSettingsAction::PasswordChanging);

    let mut flow = PasswordChangeFlow::new();
    flow.current = TextInput::masked().with_value("redpill");
    flow.submit(&mut session, &mut store).await.unwrap();

    flow.new_password = TextInput::masked().with_value("zion01");
    flow.repeat = TextInput::masked().with_value("zion01");
    let err = flow.submit(&mut session, &mut store).await.unwrap_err();

    update.assert_async().await;
    assert!(err.is_alert());
    assert_eq!(flow.step, FlowStep::CollectingCurrent);
    assert!(flow.current.is_empty());
    // still inside the flow
    assert!(store.state().private_settings.is_password_changing);
}

#[tokio::test]
async fn test_changing_plan_keeps_subscription() {
    let auth = MemoryAuth::new().with_account("neo@matrix.io", "redpill");
    let session = signed_in(&auth).await;
    let mut store = Store::in_memory();
    store.dispatch(SubscriptionAction::Subscribed);
    store.dispatch(SubscriptionAction::ChangingPlan);

    let mut plans = PlanSelector::new();
    plans.right();
    plans.right();
    plans.choose();
    plans.submit(session.user(), &mut store).unwrap();

    let subscription = &store.state().subscription;
    assert!(subscription.is_subscribed);
    assert!(!subscription.is_changing_plan);
    assert_eq!(subscription.plan.as_ref().map(|p| p.id.as_str()), Some("premium"));
}
