//! CLI Command Handlers
//!
//! Each handler drives the same forms and services the TUI uses, prints
//! through `Output`, and returns a semantic `ExitCode`.

use serde::Serialize;
use tracing::info;

use crate::app::Services;
use crate::auth::AuthError;
use crate::cli::{
    ChangeEmailCmd, ChangePasswordCmd, Command, CredentialsCmd, ExitCode, ListCmd, ListEntryCmd,
    MovieCmd, Output, SignupCmd, StateAction, StatusOk, SubscribeCmd,
};
use crate::forms::{
    EmailChangeFlow, FlowStep, FormError, LoginForm, LoginMode, PasswordChangeFlow, PlanSelector,
    TextInput,
};
use crate::lists::toggle_membership;
use crate::models::{find_plan, subs_plans, ListKind, MediaType, Movie, Plan, User};
use crate::store::{PrivateSettingsAction, Store, SubscriptionAction};
use crate::validation::FieldError;

/// Run one subcommand against connected services
pub async fn dispatch(
    command: Command,
    services: &mut Services,
    store: &mut Store,
    output: &Output,
) -> ExitCode {
    let uses_session = matches!(
        command,
        Command::Whoami
            | Command::List(_)
            | Command::Add(_)
            | Command::Remove(_)
            | Command::Subscribe(_)
            | Command::ChangeEmail(_)
            | Command::ChangePassword(_)
    );
    if uses_session {
        if let Err(code) = keep_session_fresh(services, store, output).await {
            return code;
        }
    }

    match command {
        Command::Login(cmd) => login_cmd(cmd, services, store, output).await,
        Command::Signup(cmd) => signup_cmd(cmd, services, store, output).await,
        Command::Logout => logout_cmd(services, store, output).await,
        Command::Whoami => whoami_cmd(services, store, output),
        Command::List(cmd) => list_cmd(cmd, services, output).await,
        Command::Add(cmd) => add_cmd(cmd, services, output).await,
        Command::Remove(cmd) => remove_cmd(cmd, services, output).await,
        Command::Movie(cmd) => movie_cmd(cmd, services, output).await,
        Command::Plans => plans_cmd(store, output),
        Command::Subscribe(cmd) => subscribe_cmd(cmd, services, store, output),
        Command::ChangeEmail(cmd) => change_email_cmd(cmd, services, store, output).await,
        Command::ChangePassword(cmd) => change_password_cmd(cmd, services, store, output).await,
        Command::State(cmd) => state_cmd(cmd.action, store, output),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Exit code for a rejected form
fn form_exit(err: &FormError) -> ExitCode {
    match err {
        FormError::Field(
            FieldError::WrongPassword
            | FieldError::WrongCurrentPassword
            | FieldError::UserNotFound
            | FieldError::EmailAlreadyInUse,
        ) => ExitCode::AuthFailed,
        FormError::Field(_) => ExitCode::InvalidArgs,
        FormError::Alert(_) => ExitCode::Error,
    }
}

/// Signed-in user, or an error exit
fn require_user(services: &Services, output: &Output) -> Result<User, ExitCode> {
    services.session.user().cloned().ok_or_else(|| {
        output.error(
            "Not signed in. Run `flixtui login` first.",
            ExitCode::NotSignedIn,
        )
    })
}

/// Renew a lapsing id token before talking to the backend
async fn keep_session_fresh(
    services: &mut Services,
    store: &mut Store,
    output: &Output,
) -> Result<(), ExitCode> {
    match services.session.refresh_if_expiring().await {
        Ok(_) => Ok(()),
        Err(AuthError::TokenExpired) => {
            store.reset();
            Err(output.error(
                "Session expired. Run `flixtui login` again.",
                ExitCode::NotSignedIn,
            ))
        }
        Err(e) => Err(output.error(e.to_string(), ExitCode::NetworkError)),
    }
}

fn print_or_fail<T: Serialize>(output: &Output, data: T, lines: &[String]) -> ExitCode {
    match output.print_lines(data, lines) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

fn movie_line(movie: &Movie) -> String {
    format!("{:>8}  {}", movie.id, movie)
}

// =============================================================================
// Session Commands
// =============================================================================

#[derive(Debug, Serialize)]
struct WhoAmI<'a> {
    uid: &'a str,
    email: &'a str,
    profile: &'a str,
    subscribed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<&'a Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    member_since: Option<String>,
}

async fn submit_login(
    mut form: LoginForm,
    services: &mut Services,
    store: &mut Store,
    output: &Output,
) -> ExitCode {
    match form.submit(&mut services.session, store).await {
        Ok(()) => {
            let email = services
                .session
                .user()
                .map(|u| u.email.clone())
                .unwrap_or_default();
            info!(%email, "signed in from cli");
            print_or_fail(
                output,
                StatusOk::with_message(format!("Signed in as {}", email)),
                &[format!("Signed in as {}", email)],
            )
        }
        Err(e) => output.error(e.to_string(), form_exit(&e)),
    }
}

pub async fn login_cmd(
    cmd: CredentialsCmd,
    services: &mut Services,
    store: &mut Store,
    output: &Output,
) -> ExitCode {
    let mut form = LoginForm::new();
    form.email = TextInput::new().with_value(&cmd.email);
    form.password = TextInput::masked().with_value(&cmd.password);
    submit_login(form, services, store, output).await
}

pub async fn signup_cmd(
    cmd: SignupCmd,
    services: &mut Services,
    store: &mut Store,
    output: &Output,
) -> ExitCode {
    let mut form = LoginForm::new();
    form.mode = LoginMode::SignUp;
    form.email = TextInput::new().with_value(&cmd.credentials.email);
    form.password = TextInput::masked().with_value(&cmd.credentials.password);
    form.repeat = TextInput::masked().with_value(cmd.repeat());
    submit_login(form, services, store, output).await
}

pub async fn logout_cmd(services: &mut Services, store: &mut Store, output: &Output) -> ExitCode {
    if let Err(e) = services.session.sign_out().await {
        return output.error(e.to_string(), ExitCode::Error);
    }
    store.reset();
    print_or_fail(output, StatusOk::ok(), &["Signed out.".to_string()])
}

pub fn whoami_cmd(services: &Services, store: &Store, output: &Output) -> ExitCode {
    let user = match require_user(services, output) {
        Ok(user) => user,
        Err(code) => return code,
    };
    let state = store.state();
    let who = WhoAmI {
        uid: &user.uid,
        email: &user.email,
        profile: &state.profiles.current_profile,
        subscribed: state.subscription.is_subscribed,
        plan: state.subscription.plan.as_ref(),
        member_since: state.subscription.member_since(),
    };

    let mut lines = vec![user.email.clone()];
    match (&who.plan, &who.member_since) {
        (Some(plan), Some(since)) => lines.push(format!("{} (member since {})", plan, since)),
        (Some(plan), None) => lines.push(plan.to_string()),
        _ => lines.push("No plan".to_string()),
    }
    print_or_fail(output, &who, &lines)
}

// =============================================================================
// List Commands
// =============================================================================

pub async fn list_cmd(cmd: ListCmd, services: &Services, output: &Output) -> ExitCode {
    let user = match require_user(services, output) {
        Ok(user) => user,
        Err(code) => return code,
    };
    let kind = ListKind::from(cmd.list);

    match services.docs.list_movies(&user, kind).await {
        Ok(movies) => {
            let lines = if movies.is_empty() {
                vec![kind.empty_message().to_string()]
            } else {
                movies.iter().map(movie_line).collect()
            };
            print_or_fail(output, &movies, &lines)
        }
        Err(e) => output.error(format!("Could not load {}: {}", kind, e), ExitCode::NetworkError),
    }
}

/// Resolve the movie to store: metadata API first, then `--title`
async fn resolve_movie(cmd: &ListEntryCmd, services: &Services) -> Result<Movie, (String, ExitCode)> {
    let kind = MediaType::from(cmd.media_type);
    if let Some(tmdb) = &services.tmdb {
        return tmdb
            .details(cmd.id, kind)
            .await
            .map_err(|e| (format!("Lookup failed: {}", e), ExitCode::NotFound));
    }
    match &cmd.title {
        Some(title) => Ok(Movie {
            id: cmd.id,
            title: Some(title.clone()),
            media_type: Some(kind),
            ..Movie::default()
        }),
        None => Err((
            "TMDB API key not configured; pass --title to add without metadata".to_string(),
            ExitCode::InvalidArgs,
        )),
    }
}

pub async fn add_cmd(cmd: ListEntryCmd, services: &Services, output: &Output) -> ExitCode {
    let user = match require_user(services, output) {
        Ok(user) => user,
        Err(code) => return code,
    };
    let movie = match resolve_movie(&cmd, services).await {
        Ok(movie) => movie,
        Err((msg, code)) => return output.error(msg, code),
    };

    let kind = ListKind::from(cmd.list);
    match toggle_membership(services.docs.as_ref(), &user, kind, &movie, false).await {
        Ok(message) => print_or_fail(output, StatusOk::with_message(&message), &[message]),
        Err(e) => output.error(e.to_string(), ExitCode::NetworkError),
    }
}

pub async fn remove_cmd(cmd: ListEntryCmd, services: &Services, output: &Output) -> ExitCode {
    let user = match require_user(services, output) {
        Ok(user) => user,
        Err(code) => return code,
    };
    let kind = ListKind::from(cmd.list);

    let movies = match services.docs.list_movies(&user, kind).await {
        Ok(movies) => movies,
        Err(e) => return output.error(e.to_string(), ExitCode::NetworkError),
    };
    let Some(movie) = movies.into_iter().find(|m| m.id == cmd.id) else {
        return output.error(format!("{} is not in {}", cmd.id, kind), ExitCode::NotFound);
    };

    match toggle_membership(services.docs.as_ref(), &user, kind, &movie, true).await {
        Ok(message) => print_or_fail(output, StatusOk::with_message(&message), &[message]),
        Err(e) => output.error(e.to_string(), ExitCode::NetworkError),
    }
}

// =============================================================================
// Movie Command
// =============================================================================

#[derive(Debug, Serialize)]
struct MovieInfo {
    #[serde(flatten)]
    movie: Movie,
    #[serde(rename = "match")]
    match_percent: String,
    genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trailer: Option<String>,
}

pub async fn movie_cmd(cmd: MovieCmd, services: &Services, output: &Output) -> ExitCode {
    let Some(tmdb) = &services.tmdb else {
        return output.error(
            "TMDB API key not configured (set TMDB_API_KEY)",
            ExitCode::InvalidArgs,
        );
    };

    let movie = match tmdb.details(cmd.id, cmd.media_type.into()).await {
        Ok(movie) => movie,
        Err(e) => return output.error(format!("Lookup failed: {}", e), ExitCode::NotFound),
    };
    let extras = match tmdb.movie_extras(&movie).await {
        Ok(extras) => extras,
        Err(e) => return output.error(format!("Lookup failed: {}", e), ExitCode::NetworkError),
    };

    let lines = vec![
        movie.to_string(),
        format!("{}% Match  {}", movie.match_percent(), movie.released().unwrap_or("")),
        movie.overview.clone(),
        format!("Genres: {}", extras.genres_str()),
        format!("Original language: {}", movie.original_language),
        format!("Total votes: {}", movie.vote_count),
        format!(
            "Trailer: {}",
            extras.trailer_url().unwrap_or_else(|| "none".to_string())
        ),
    ];
    let info = MovieInfo {
        match_percent: movie.match_percent(),
        genres: extras.genres.iter().map(|g| g.name.clone()).collect(),
        trailer: extras.trailer_url(),
        movie,
    };
    print_or_fail(output, &info, &lines)
}

// =============================================================================
// Subscription Commands
// =============================================================================

pub fn plans_cmd(store: &Store, output: &Output) -> ExitCode {
    let plans = subs_plans();
    let current = store.state().subscription.plan.as_ref().map(|p| p.id.clone());
    let lines: Vec<String> = plans
        .iter()
        .map(|p| {
            let marker = if current.as_deref() == Some(p.id.as_str()) {
                "*"
            } else {
                " "
            };
            format!("{} {:<9} {}", marker, p.id, p)
        })
        .collect();
    print_or_fail(output, &plans, &lines)
}

pub fn subscribe_cmd(
    cmd: SubscribeCmd,
    services: &Services,
    store: &mut Store,
    output: &Output,
) -> ExitCode {
    let Some(plan) = find_plan(&cmd.plan) else {
        return output.error(format!("Unknown plan: {}", cmd.plan), ExitCode::NotFound);
    };

    let mut selector = PlanSelector::new();
    selector.selected = selector.plans.iter().position(|p| p.id == plan.id);
    if store.state().subscription.is_subscribed {
        store.dispatch(SubscriptionAction::ChangingPlan);
    }

    match selector.submit(services.session.user(), store) {
        Ok(()) => {
            let message = format!("Subscribed to {}", plan);
            print_or_fail(output, StatusOk::with_message(&message), &[message])
        }
        Err(e) => {
            selector.cancel(store);
            match e {
                FormError::Alert(msg) => output.error(msg, ExitCode::NotSignedIn),
                field => output.error(field.to_string(), ExitCode::InvalidArgs),
            }
        }
    }
}

// =============================================================================
// Private Settings Commands
// =============================================================================

pub async fn change_email_cmd(
    cmd: ChangeEmailCmd,
    services: &mut Services,
    store: &mut Store,
    output: &Output,
) -> ExitCode {
    if let Err(code) = require_user(services, output) {
        return code;
    }
    store.dispatch(PrivateSettingsAction::LoginChanging);

    let mut flow = EmailChangeFlow::new();
    flow.current = TextInput::masked().with_value(&cmd.password);
    let mut result = flow.submit(&mut services.session, store).await;
    if result.is_ok() && flow.step == FlowStep::CollectingNew {
        flow.new_email = TextInput::new().with_value(&cmd.new_email);
        result = flow.submit(&mut services.session, store).await;
    }

    match result {
        Ok(()) if flow.step == FlowStep::Done => {
            let message = format!("Your email has been changed to {}.", cmd.new_email);
            print_or_fail(output, StatusOk::with_message(&message), &[message])
        }
        Ok(()) => {
            flow.cancel(store);
            output.error("Email change did not complete", ExitCode::Error)
        }
        Err(e) => {
            flow.cancel(store);
            output.error(e.to_string(), form_exit(&e))
        }
    }
}

pub async fn change_password_cmd(
    cmd: ChangePasswordCmd,
    services: &mut Services,
    store: &mut Store,
    output: &Output,
) -> ExitCode {
    if let Err(code) = require_user(services, output) {
        return code;
    }
    store.dispatch(PrivateSettingsAction::PasswordChanging);

    let mut flow = PasswordChangeFlow::new();
    flow.current = TextInput::masked().with_value(&cmd.password);
    let mut result = flow.submit(&mut services.session, store).await;
    if result.is_ok() && flow.step == FlowStep::CollectingNew {
        flow.new_password = TextInput::masked().with_value(&cmd.new_password);
        flow.repeat = TextInput::masked().with_value(cmd.repeat());
        result = flow.submit(&mut services.session, store).await;
    }

    match result {
        Ok(()) if flow.step == FlowStep::Done => print_or_fail(
            output,
            StatusOk::with_message("Your password has been changed."),
            &["Your password has been changed.".to_string()],
        ),
        Ok(()) => {
            flow.cancel(store);
            output.error("Password change did not complete", ExitCode::Error)
        }
        Err(e) => {
            flow.cancel(store);
            output.error(e.to_string(), form_exit(&e))
        }
    }
}

// =============================================================================
// State Command
// =============================================================================

pub fn state_cmd(action: StateAction, store: &mut Store, output: &Output) -> ExitCode {
    match action {
        StateAction::Show => {
            let pretty = serde_json::to_string_pretty(store.state()).unwrap_or_default();
            print_or_fail(output, store.state(), &[pretty])
        }
        StateAction::Reset => {
            store.reset();
            print_or_fail(output, StatusOk::ok(), &["State reset.".to_string()])
        }
    }
}
