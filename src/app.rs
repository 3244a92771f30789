//! App state and core application logic
//!
//! `App` owns the store and all per-screen view state. Key handling is
//! synchronous: anything that needs a backend comes back as an [`Effect`],
//! which the event loop hands to [`Services::execute`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::firestore::{DocumentStore, FirestoreClient, MemoryDocStore};
use crate::api::tmdb::{Row, TmdbClient};
use crate::auth::{AuthError, AuthSession, FirebaseAuth, MemoryAuth};
use crate::config::Config;
use crate::forms::{
    EmailChangeFlow, FlowStep, FormError, LoginForm, PasswordChangeFlow, PlanSelector,
    ProfileEditor,
};
use crate::lists::{membership, toggle_membership, ListSnapshot, ListSubscription};
use crate::models::{ListKind, Movie, MovieExtras, Profile, User};
use crate::store::{
    FileStorage, LocalStorage, ModalAction, MovieAction, Persistor,
    PrivateSettingsAction, ProfilesAction, RootState, Store, SubscriptionAction,
};

/// Columns in the list page grid
pub const GRID_COLS: usize = 4;

// =============================================================================
// Screens
// =============================================================================

/// Top-level pages reachable from the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    MyList,
    Liked,
    Account,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::MyList, Page::Liked, Page::Account];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::MyList => "My List",
            Page::Liked => "Liked",
            Page::Account => "Account",
        }
    }

    fn next(&self) -> Page {
        let idx = Page::ALL.iter().position(|p| p == self).unwrap_or(0);
        Page::ALL[(idx + 1) % Page::ALL.len()]
    }
}

/// What is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Store not rehydrated yet
    Loading,
    Login,
    Plans,
    EmailChange,
    PasswordChange,
    EditProfile,
    Home,
    MyList,
    Liked,
    Account,
}

impl Screen {
    /// Pages the movie modal can be drawn over
    pub fn is_page(&self) -> bool {
        matches!(
            self,
            Screen::Home | Screen::MyList | Screen::Liked | Screen::Account
        )
    }

    /// Screens where typed characters go into a text input
    pub fn takes_text(&self) -> bool {
        matches!(
            self,
            Screen::Login | Screen::EmailChange | Screen::PasswordChange | Screen::EditProfile
        )
    }
}

/// Pick the screen from session and store state, in priority order
pub fn resolve_screen(rehydrated: bool, signed_in: bool, state: &RootState, page: Page) -> Screen {
    if !rehydrated {
        return Screen::Loading;
    }
    if !signed_in {
        return Screen::Login;
    }
    if !state.subscription.is_subscribed {
        return Screen::Plans;
    }
    if state.private_settings.is_login_changing {
        return Screen::EmailChange;
    }
    if state.private_settings.is_password_changing {
        return Screen::PasswordChange;
    }
    if state.subscription.is_changing_plan {
        return Screen::Plans;
    }
    if state.profiles.is_editing_profile {
        return Screen::EditProfile;
    }
    match page {
        Page::Home => Screen::Home,
        Page::MyList => Screen::MyList,
        Page::Liked => Screen::Liked,
        Page::Account => Screen::Account,
    }
}

// =============================================================================
// Loading State
// =============================================================================

/// Loading state for async operations
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    /// Idle - no loading in progress
    #[default]
    Idle,
    /// Loading with optional message
    Loading(Option<String>),
    /// Error with message
    Error(String),
}

// =============================================================================
// Selection State
// =============================================================================

/// Selection state for list views
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    /// Currently selected index
    pub selected: usize,
    /// Scroll offset for viewport
    pub offset: usize,
    /// Total number of items
    pub len: usize,
}

impl ListState {
    pub fn new(len: usize) -> Self {
        Self {
            selected: 0,
            offset: 0,
            len,
        }
    }

    /// Move selection up
    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.offset {
                self.offset = self.selected;
            }
        }
    }

    /// Move selection down
    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    /// Move back by `step` without wrapping
    pub fn back_by(&mut self, step: usize) {
        if self.selected >= step {
            self.selected -= step;
            if self.selected < self.offset {
                self.offset = self.selected;
            }
        }
    }

    /// Move forward by `step` without running past the end
    pub fn forward_by(&mut self, step: usize) {
        if self.selected + step < self.len {
            self.selected += step;
        }
    }

    /// Update offset to keep selected item visible
    pub fn scroll_into_view(&mut self, visible: usize) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if visible > 0 && self.selected >= self.offset + visible {
            self.offset = self.selected - visible + 1;
        }
    }

    /// Update length (e.g., when a snapshot arrives)
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

// =============================================================================
// View-Specific State
// =============================================================================

/// One browse row on the home page
#[derive(Debug, Clone, PartialEq)]
pub struct HomeRow {
    pub row: Row,
    pub movies: Vec<Movie>,
}

/// Home view state
#[derive(Debug, Clone, Default)]
pub struct HomeState {
    pub rows: Vec<HomeRow>,
    /// Which row has focus
    pub row_list: ListState,
    /// Position inside the focused row
    pub item_list: ListState,
    pub loading: LoadingState,
}

impl HomeState {
    pub fn set_rows(&mut self, rows: Vec<HomeRow>) {
        self.row_list = ListState::new(rows.len());
        self.item_list = ListState::new(rows.first().map(|r| r.movies.len()).unwrap_or(0));
        self.rows = rows;
        self.loading = LoadingState::Idle;
    }

    pub fn selected_movie(&self) -> Option<&Movie> {
        self.rows
            .get(self.row_list.selected)
            .and_then(|r| r.movies.get(self.item_list.selected))
    }

    fn focus_row(&mut self) {
        let len = self
            .rows
            .get(self.row_list.selected)
            .map(|r| r.movies.len())
            .unwrap_or(0);
        self.item_list = ListState::new(len);
    }
}

/// Entries on the account page
#[derive(Debug, Clone, PartialEq)]
pub enum AccountItem {
    ChangeEmail,
    ChangePassword,
    ChangePlan,
    EditProfile(Profile),
    SignOut,
}

impl AccountItem {
    pub fn label(&self) -> String {
        match self {
            AccountItem::ChangeEmail => "Change account email".into(),
            AccountItem::ChangePassword => "Change password".into(),
            AccountItem::ChangePlan => "Change plan".into(),
            AccountItem::EditProfile(p) => format!("Edit profile: {}", p.name),
            AccountItem::SignOut => "Sign out of all devices".into(),
        }
    }
}

// =============================================================================
// Effects
// =============================================================================

/// Backend work requested by a key press
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SubmitLogin,
    SubmitEmailChange,
    SubmitPasswordChange,
    SubmitPlan,
    SaveProfile,
    SignOut,
    LoadHome,
    LoadProfiles,
    LoadExtras(Movie),
    ToggleList(ListKind),
}

// =============================================================================
// Main Application State
// =============================================================================

/// Main application state
pub struct App {
    /// Whether the app is running
    pub running: bool,
    pub store: Store,
    /// Signed-in user, mirrored from the session
    pub user: Option<User>,
    pub page: Page,
    /// Blocking alert (provider errors)
    pub error: Option<String>,
    /// Transient confirmation, cleared on the next key
    pub toast: Option<String>,
    /// An effect is running
    pub busy: bool,

    // Forms
    pub login: LoginForm,
    pub email_change: EmailChangeFlow,
    pub password_change: PasswordChangeFlow,
    pub plans: PlanSelector,
    pub profile_editor: Option<ProfileEditor>,

    // Pages
    pub home: HomeState,
    pub my_list: ListSnapshot,
    pub liked: ListSnapshot,
    pub list_cursor: ListState,
    pub account_list: ListState,
    pub profiles: Vec<Profile>,

    // Modal
    pub extras: Option<MovieExtras>,
    pub extras_loading: LoadingState,

    subscriptions: Vec<ListSubscription>,
}

impl App {
    pub fn new(store: Store) -> Self {
        Self {
            running: true,
            store,
            user: None,
            page: Page::Home,
            error: None,
            toast: None,
            busy: false,

            login: LoginForm::new(),
            email_change: EmailChangeFlow::new(),
            password_change: PasswordChangeFlow::new(),
            plans: PlanSelector::new(),
            profile_editor: None,

            home: HomeState::default(),
            my_list: ListSnapshot::Loading,
            liked: ListSnapshot::Loading,
            list_cursor: ListState::default(),
            account_list: ListState::default(),
            profiles: Vec::new(),

            extras: None,
            extras_loading: LoadingState::Idle,

            subscriptions: Vec::new(),
        }
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Set error message
    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error = Some(msg.into());
    }

    pub fn screen(&self) -> Screen {
        resolve_screen(
            self.store.is_rehydrated(),
            self.user.is_some(),
            self.store.state(),
            self.page,
        )
    }

    /// The movie modal is drawn over the current page
    pub fn modal_visible(&self) -> bool {
        self.store.state().modal.is_opened_modal && self.screen().is_page()
    }

    pub fn snapshot(&self, kind: ListKind) -> &ListSnapshot {
        match kind {
            ListKind::MyList => &self.my_list,
            ListKind::Liked => &self.liked,
        }
    }

    /// List shown by the current page, if it is a list page
    pub fn current_list(&self) -> Option<ListKind> {
        match self.screen() {
            Screen::MyList => Some(ListKind::MyList),
            Screen::Liked => Some(ListKind::Liked),
            _ => None,
        }
    }

    pub fn account_items(&self) -> Vec<AccountItem> {
        let mut items = vec![
            AccountItem::ChangeEmail,
            AccountItem::ChangePassword,
            AccountItem::ChangePlan,
        ];
        items.extend(self.profiles.iter().cloned().map(AccountItem::EditProfile));
        items.push(AccountItem::SignOut);
        items
    }

    /// Start live list subscriptions for the signed-in user
    pub fn watch_lists(&mut self, docs: Arc<dyn DocumentStore>, user: &User, poll: Duration) {
        self.subscriptions = [ListKind::MyList, ListKind::Liked]
            .into_iter()
            .map(|kind| ListSubscription::subscribe(Arc::clone(&docs), user.clone(), kind, poll))
            .collect();
    }

    /// Pull the latest snapshots from the live subscriptions.
    /// Returns true when anything changed.
    pub fn sync_lists(&mut self) -> bool {
        let mut changed = false;
        for sub in &self.subscriptions {
            let snapshot = sub.snapshot();
            let slot = match sub.kind() {
                ListKind::MyList => &mut self.my_list,
                ListKind::Liked => &mut self.liked,
            };
            if *slot != snapshot {
                *slot = snapshot;
                changed = true;
            }
        }
        if changed {
            if let Some(kind) = self.current_list() {
                let len = self.snapshot(kind).movies().len();
                self.list_cursor.set_len(len);
            }
        }
        changed
    }

    /// Reopen the profile editor if its flag survived a restart
    pub fn restore_editors(&mut self) {
        if let Some(profile) = self.store.state().profiles.editing.clone() {
            self.profile_editor = Some(ProfileEditor::new(profile));
        }
    }

    /// Drop everything tied to the signed-in user
    pub fn detach(&mut self) {
        self.subscriptions.clear();
        self.user = None;
        self.my_list = ListSnapshot::Loading;
        self.liked = ListSnapshot::Loading;
        self.profiles.clear();
        self.home = HomeState::default();
        self.extras = None;
        self.page = Page::Home;
        self.login = LoginForm::new();
    }

    fn show_form_error(&mut self, err: &FormError) {
        if let FormError::Alert(msg) = err {
            self.error = Some(msg.clone());
        }
    }

    // -------------------------------------------------------------------------
    // Keyboard Event Handling
    // -------------------------------------------------------------------------

    /// Handle keyboard event, returning backend work if the key needs it
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Effect> {
        self.toast = None;

        // Global quit shortcut
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return None;
        }

        // Alerts swallow one key
        if self.error.take().is_some() {
            return None;
        }

        let screen = self.screen();
        if self.modal_visible() {
            return self.handle_modal_key(key);
        }

        match screen {
            Screen::Loading => {
                if key.code == KeyCode::Char('q') {
                    self.quit();
                }
                None
            }
            Screen::Login => self.handle_login_key(key),
            Screen::Plans => self.handle_plans_key(key),
            Screen::EmailChange => self.handle_email_key(key),
            Screen::PasswordChange => self.handle_password_key(key),
            Screen::EditProfile => self.handle_profile_key(key),
            Screen::Home | Screen::MyList | Screen::Liked | Screen::Account => {
                self.handle_page_key(key, screen)
            }
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Option<Effect> {
        if key.code == KeyCode::Char('t') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.login.toggle_mode();
            return None;
        }
        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Tab | KeyCode::Down => self.login.next_field(),
            KeyCode::Enter => return Some(Effect::SubmitLogin),
            code => edit(self.login.focused_mut(), code),
        }
        None
    }

    fn handle_plans_key(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.plans.left(),
            KeyCode::Right | KeyCode::Char('l') => self.plans.right(),
            KeyCode::Char(' ') => self.plans.choose(),
            KeyCode::Enter => {
                if self.plans.can_submit() {
                    return Some(Effect::SubmitPlan);
                }
                self.plans.choose();
            }
            KeyCode::Esc if self.store.state().subscription.is_changing_plan => {
                self.plans.cancel(&mut self.store);
            }
            KeyCode::Char('o') => return Some(Effect::SignOut),
            KeyCode::Char('q') => self.quit(),
            _ => {}
        }
        None
    }

    fn handle_email_key(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Esc => self.email_change.cancel(&mut self.store),
            KeyCode::Enter => return Some(Effect::SubmitEmailChange),
            code => edit(self.email_change.input_mut(), code),
        }
        None
    }

    fn handle_password_key(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Esc => self.password_change.cancel(&mut self.store),
            KeyCode::Tab => self.password_change.next_field(),
            KeyCode::Enter => return Some(Effect::SubmitPasswordChange),
            code => edit(self.password_change.input_mut(), code),
        }
        None
    }

    fn handle_profile_key(&mut self, key: KeyEvent) -> Option<Effect> {
        if self.profile_editor.is_none() {
            match self.store.state().profiles.editing.clone() {
                Some(profile) => self.profile_editor = Some(ProfileEditor::new(profile)),
                None => {
                    self.store.dispatch(ProfilesAction::NotEditingProfile);
                    return None;
                }
            }
        }
        let editor = self.profile_editor.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                editor.cancel(&mut self.store);
                self.profile_editor = None;
            }
            KeyCode::Up => editor.prev_icon(),
            KeyCode::Down => editor.next_icon(),
            KeyCode::Enter => return Some(Effect::SaveProfile),
            code => edit(editor.input_mut(), code),
        }
        None
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('x') => {
                self.store.dispatch(ModalAction::CloseModal);
                None
            }
            KeyCode::Char('m') => {
                self.store.dispatch(ModalAction::ToggleMuteVideo);
                None
            }
            KeyCode::Char('+') | KeyCode::Char('a') => Some(Effect::ToggleList(ListKind::MyList)),
            KeyCode::Char('L') | KeyCode::Char('f') => Some(Effect::ToggleList(ListKind::Liked)),
            _ => None,
        }
    }

    fn handle_page_key(&mut self, key: KeyEvent, screen: Screen) -> Option<Effect> {
        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return None;
            }
            KeyCode::Char('o') => return Some(Effect::SignOut),
            KeyCode::Tab => {
                self.go_to(self.page.next());
                return None;
            }
            KeyCode::Char(c @ '1'..='4') => {
                let idx = (c as usize) - ('1' as usize);
                self.go_to(Page::ALL[idx]);
                return None;
            }
            _ => {}
        }

        match screen {
            Screen::Home => self.handle_home_key(key),
            Screen::MyList => self.handle_list_key(key, ListKind::MyList),
            Screen::Liked => self.handle_list_key(key, ListKind::Liked),
            Screen::Account => self.handle_account_key(key),
            _ => None,
        }
    }

    fn go_to(&mut self, page: Page) {
        if self.page != page {
            self.page = page;
            self.list_cursor = ListState::default();
            if let Some(kind) = self.current_list() {
                self.list_cursor.set_len(self.snapshot(kind).movies().len());
            }
            if page == Page::Account {
                self.account_list = ListState::new(self.account_items().len());
            }
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.home.row_list.up();
                self.home.focus_row();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.home.row_list.down();
                self.home.focus_row();
            }
            KeyCode::Left | KeyCode::Char('h') => self.home.item_list.up(),
            KeyCode::Right | KeyCode::Char('l') => self.home.item_list.down(),
            KeyCode::Char('r') => return Some(Effect::LoadHome),
            KeyCode::Enter => {
                let movie = self.home.selected_movie().cloned()?;
                return self.open_movie(movie);
            }
            _ => {}
        }
        None
    }

    fn handle_list_key(&mut self, key: KeyEvent, kind: ListKind) -> Option<Effect> {
        self.list_cursor.set_len(self.snapshot(kind).movies().len());
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.list_cursor.up(),
            KeyCode::Right | KeyCode::Char('l') => self.list_cursor.down(),
            KeyCode::Up | KeyCode::Char('k') => self.list_cursor.back_by(GRID_COLS),
            KeyCode::Down | KeyCode::Char('j') => self.list_cursor.forward_by(GRID_COLS),
            KeyCode::Enter => {
                let movie = self
                    .snapshot(kind)
                    .movies()
                    .get(self.list_cursor.selected)
                    .cloned()?;
                return self.open_movie(movie);
            }
            _ => {}
        }
        None
    }

    fn handle_account_key(&mut self, key: KeyEvent) -> Option<Effect> {
        let items = self.account_items();
        self.account_list.set_len(items.len());
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.account_list.up(),
            KeyCode::Down | KeyCode::Char('j') => self.account_list.down(),
            KeyCode::Enter => {
                let item = items.get(self.account_list.selected)?.clone();
                return self.activate(item);
            }
            _ => {}
        }
        None
    }

    fn activate(&mut self, item: AccountItem) -> Option<Effect> {
        match item {
            AccountItem::ChangeEmail => {
                self.email_change = EmailChangeFlow::new();
                self.store.dispatch(PrivateSettingsAction::LoginChanging);
            }
            AccountItem::ChangePassword => {
                self.password_change = PasswordChangeFlow::new();
                self.store.dispatch(PrivateSettingsAction::PasswordChanging);
            }
            AccountItem::ChangePlan => {
                self.plans = PlanSelector::new();
                self.store.dispatch(SubscriptionAction::ChangingPlan);
            }
            AccountItem::EditProfile(profile) => {
                self.profile_editor = Some(ProfileEditor::new(profile.clone()));
                self.store.dispatch(ProfilesAction::EditingProfile(profile));
            }
            AccountItem::SignOut => return Some(Effect::SignOut),
        }
        None
    }

    fn open_movie(&mut self, movie: Movie) -> Option<Effect> {
        self.extras = None;
        self.extras_loading = LoadingState::Loading(Some("Loading trailer...".into()));
        self.store.dispatch(MovieAction::SetMovie(movie.clone()));
        self.store.dispatch(ModalAction::OpenModal);
        Some(Effect::LoadExtras(movie))
    }
}

/// Apply an editing key to a text input
fn edit(input: &mut crate::forms::TextInput, code: KeyCode) {
    match code {
        KeyCode::Char(c) => input.insert(c),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Left => input.cursor_left(),
        KeyCode::Right => input.cursor_right(),
        _ => {}
    }
}

// =============================================================================
// Services
// =============================================================================

/// Backends the event loop runs effects against
pub struct Services {
    pub session: AuthSession,
    pub docs: Arc<dyn DocumentStore>,
    pub tmdb: Option<TmdbClient>,
    pub poll: Duration,
}

impl Services {
    /// Wire backends from configuration.
    ///
    /// Offline mode, or a config without Firebase settings, uses in-process
    /// backends and a session that ends with the run. The store snapshot is
    /// always kept on disk, under `offline/` when not talking to Firebase.
    /// The returned store still needs [`Store::rehydrate`].
    pub fn connect(config: &Config, offline: bool) -> (Self, Store) {
        let tmdb = config.tmdb_api_key.as_deref().map(TmdbClient::new);
        let poll = config.poll_interval();

        let online = !offline && config.has_firebase();
        if !offline && !online {
            warn!("firebase_api_key / firebase_project_id not set, running offline");
        }

        let files = if online {
            FileStorage::new(config.data_dir())
        } else {
            FileStorage::new(config.data_dir().join("offline"))
        };
        info!(data_dir = %files.dir().display(), online, "state directory");
        let storage: Arc<dyn LocalStorage> = Arc::new(files);

        let (session, docs): (AuthSession, Arc<dyn DocumentStore>) =
            match (&config.firebase_api_key, &config.firebase_project_id) {
                (Some(key), Some(project)) if online => {
                    info!(project = %project, "using firebase backends");
                    (
                        AuthSession::with_storage(
                            Arc::new(FirebaseAuth::new(key.clone())),
                            Arc::clone(&storage),
                        ),
                        Arc::new(FirestoreClient::new(project.clone())),
                    )
                }
                // in-process accounts vanish on exit, so the session does too
                _ => (
                    AuthSession::new(Arc::new(MemoryAuth::new())),
                    Arc::new(MemoryDocStore::new()),
                ),
            };

        let store = Store::new(Persistor::new(storage));
        let services = Services {
            session,
            docs,
            tmdb,
            poll,
        };
        (services, store)
    }

    /// Bind a restored session to the app: lists, home rows, profiles
    pub async fn attach(&mut self, app: &mut App) {
        self.keep_alive(app).await;
        for effect in self.start_user(app) {
            self.execute(app, effect).await;
        }
    }

    /// Renew the id token before it lapses.
    ///
    /// Live subscriptions are restarted with the new token. A session the
    /// provider has ended takes the app back to the login screen.
    pub async fn keep_alive(&mut self, app: &mut App) {
        match self.session.refresh_if_expiring().await {
            Ok(true) => {
                let Some(user) = self.session.user().cloned() else {
                    return;
                };
                if app.user.is_some() {
                    app.watch_lists(Arc::clone(&self.docs), &user, self.poll);
                    app.user = Some(user);
                }
            }
            Ok(false) => {}
            Err(AuthError::TokenExpired) => {
                app.detach();
                app.store.reset();
                app.set_error("Your session has expired. Please sign in again.");
            }
            Err(e) => warn!(error = %e, "token refresh failed"),
        }
    }

    /// Run an effect and everything it triggers
    pub async fn execute(&mut self, app: &mut App, effect: Effect) {
        let mut queue = VecDeque::from([effect]);
        app.busy = true;
        while let Some(effect) = queue.pop_front() {
            debug!(?effect, "effect");
            queue.extend(self.run(app, effect).await);
        }
        app.busy = false;
    }

    fn start_user(&self, app: &mut App) -> Vec<Effect> {
        app.user = self.session.user().cloned();
        match &app.user {
            Some(user) => {
                let user = user.clone();
                app.watch_lists(Arc::clone(&self.docs), &user, self.poll);
                vec![Effect::LoadHome, Effect::LoadProfiles]
            }
            None => Vec::new(),
        }
    }

    async fn run(&mut self, app: &mut App, effect: Effect) -> Vec<Effect> {
        match effect {
            Effect::SubmitLogin => match app.login.submit(&mut self.session, &mut app.store).await {
                Ok(()) => {
                    app.login = LoginForm::new();
                    return self.start_user(app);
                }
                Err(e) => app.show_form_error(&e),
            },

            Effect::SubmitEmailChange => {
                let result = app
                    .email_change
                    .submit(&mut self.session, &mut app.store)
                    .await;
                match result {
                    Ok(()) if app.email_change.step == FlowStep::Done => {
                        app.user = self.session.user().cloned();
                        app.email_change = EmailChangeFlow::new();
                        app.toast = Some("Your email has been changed.".into());
                    }
                    Ok(()) => {}
                    Err(e) => app.show_form_error(&e),
                }
            }

            Effect::SubmitPasswordChange => {
                let result = app
                    .password_change
                    .submit(&mut self.session, &mut app.store)
                    .await;
                match result {
                    Ok(()) if app.password_change.step == FlowStep::Done => {
                        app.user = self.session.user().cloned();
                        app.password_change = PasswordChangeFlow::new();
                        app.toast = Some("Your password has been changed.".into());
                    }
                    Ok(()) => {}
                    Err(e) => app.show_form_error(&e),
                }
            }

            Effect::SubmitPlan => {
                if let Err(e) = app.plans.submit(self.session.user(), &mut app.store) {
                    app.show_form_error(&e);
                }
            }

            Effect::SaveProfile => {
                let (Some(editor), Some(user)) = (app.profile_editor.as_mut(), self.session.user())
                else {
                    return Vec::new();
                };
                match editor.save(self.docs.as_ref(), user, &mut app.store).await {
                    Ok(_) => {
                        app.profile_editor = None;
                        return vec![Effect::LoadProfiles];
                    }
                    Err(e) => app.show_form_error(&e),
                }
            }

            Effect::SignOut => {
                if let Err(e) = self.session.sign_out().await {
                    warn!(error = %e, "provider sign-out failed");
                }
                app.detach();
                app.store.reset();
                info!("session closed");
            }

            Effect::LoadHome => self.load_home(app).await,

            Effect::LoadProfiles => {
                let Some(user) = self.session.user() else {
                    return Vec::new();
                };
                match self.docs.list_profiles(user).await {
                    Ok(profiles) if profiles.is_empty() => {
                        let profile = Profile::default_for(user);
                        info!(name = %profile.name, "creating first profile");
                        match self.docs.save_profile(user, &profile).await {
                            Ok(()) => return vec![Effect::LoadProfiles],
                            Err(e) => warn!(error = %e, "could not create profile"),
                        }
                    }
                    Ok(profiles) => {
                        let current = &app.store.state().profiles.current_profile;
                        if current.is_empty() {
                            if let Some(first) = profiles.first() {
                                app.store
                                    .dispatch(ProfilesAction::SetCurrentProfile(first.name.clone()));
                            }
                        }
                        app.profiles = profiles;
                        app.account_list.set_len(app.account_items().len());
                    }
                    Err(e) => warn!(error = %e, "could not load profiles"),
                }
            }

            Effect::LoadExtras(movie) => {
                let Some(tmdb) = &self.tmdb else {
                    app.extras_loading = LoadingState::Error("TMDB API key not configured".into());
                    return Vec::new();
                };
                match tmdb.movie_extras(&movie).await {
                    Ok(extras) => {
                        app.extras = Some(extras);
                        app.extras_loading = LoadingState::Idle;
                    }
                    Err(e) => {
                        warn!(movie = movie.id, error = %e, "could not load movie extras");
                        app.extras_loading = LoadingState::Error(e.to_string());
                    }
                }
            }

            Effect::ToggleList(kind) => {
                let (Some(user), Some(movie)) = (
                    self.session.user(),
                    app.store.state().movie.movie.clone(),
                ) else {
                    return Vec::new();
                };
                let docs = self.docs.as_ref();
                let fresh = membership(docs, user, kind, app.snapshot(kind), movie.id).await;
                let is_added = match fresh {
                    Ok(is_added) => is_added,
                    Err(e) => {
                        app.set_error(e.to_string());
                        return Vec::new();
                    }
                };
                match toggle_membership(docs, user, kind, &movie, is_added).await {
                    Ok(message) => app.toast = Some(message),
                    Err(e) => app.set_error(e.to_string()),
                }
            }
        }
        Vec::new()
    }

    async fn load_home(&self, app: &mut App) {
        let Some(tmdb) = &self.tmdb else {
            app.home.loading =
                LoadingState::Error("TMDB API key not configured (set TMDB_API_KEY)".into());
            return;
        };

        app.home.loading = LoadingState::Loading(Some("Loading titles...".into()));
        let mut rows = Vec::new();
        let mut last_error = None;
        for row in Row::ALL {
            match tmdb.row(row).await {
                Ok(movies) => rows.push(HomeRow { row, movies }),
                Err(e) => {
                    warn!(row = row.title(), error = %e, "row failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        match (rows.is_empty(), last_error) {
            (true, Some(e)) => app.home.loading = LoadingState::Error(e),
            _ => app.home.set_rows(rows),
        }
    }
}
