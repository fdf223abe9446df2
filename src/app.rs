use crate::api::{ApiClient, ApiError, Member, MemberDetail, Post, ProfileUpdate, SessionUser};
use crate::config::Config;
use crate::content::{render_html, RenderedBody};
use crate::feed::{Affordance, CategoryKey, FeedStore, FetchOutcome, FetchRequest, ScrollTracker};
use crate::people::PeopleStore;
use crate::profile::{apply_picture, apply_update, ProfileField, ProfileForm};
use crate::session::auth::{self, AuthError};
use crate::session::{Session, SessionStore};
use crate::theme::{ColorPalette, ThemeVariant};
use crate::util::MAX_SEARCH_QUERY_LENGTH;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::time::Instant;

/// Maximum scroll offset for the detail views (ratatui u16 limit).
pub const MAX_SCROLL: usize = u16::MAX as usize;

/// Height of one feed row in terminal lines; row index times this is the
/// offset sample handed to the scroll tracker.
pub const POST_ROW_HEIGHT: i64 = 2;

/// How long a status message stays up.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Screens and Tabs
// ============================================================================

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    Home,
    /// A single post, opened from the feed by id.
    Detail,
    People,
    /// A single member, opened from the directory by id.
    MemberDetail,
    Profile,
}

impl Screen {
    /// The tab this screen lives under. Sign-in has no tab bar.
    pub fn tab(self) -> Option<Tab> {
        match self {
            Screen::SignIn => None,
            Screen::Home | Screen::Detail => Some(Tab::Home),
            Screen::People | Screen::MemberDetail => Some(Tab::People),
            Screen::Profile => Some(Tab::Profile),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    People,
    Profile,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Home, Tab::People, Tab::Profile];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::People => "People",
            Tab::Profile => "Profile",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Home => Tab::People,
            Tab::People => Tab::Profile,
            Tab::Profile => Tab::Home,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Tab::Home => Tab::Profile,
            Tab::People => Tab::Home,
            Tab::Profile => Tab::People,
        }
    }

    fn screen(self) -> Screen {
        match self {
            Tab::Home => Screen::Home,
            Tab::People => Screen::People,
            Tab::Profile => Screen::Profile,
        }
    }
}

// ============================================================================
// Load State
// ============================================================================

/// Loading state of a record fetched when its screen opens.
#[derive(Debug, Clone, Default)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// A fetched post with its body already converted for the terminal.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub body: RenderedBody,
}

impl PostView {
    fn new(post: Post, palette: &ColorPalette) -> Self {
        let body = render_html(post.content.as_deref().unwrap_or(""), palette);
        Self { post, body }
    }
}

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignInField {
    #[default]
    Username,
    Password,
}

/// Sign-in screen fields. The password is held here as typed, so `Debug`
/// only reports its length.
#[derive(Clone, Default)]
pub struct SignInForm {
    pub username: String,
    pub password: String,
    pub field: SignInField,
    pub submitting: bool,
    pub error: Option<String>,
}

impl std::fmt::Debug for SignInForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInForm")
            .field("username", &self.username)
            .field("password", &format_args!("[REDACTED; {} chars]", self.password.chars().count()))
            .field("field", &self.field)
            .field("submitting", &self.submitting)
            .field("error", &self.error)
            .finish()
    }
}

impl SignInForm {
    /// The field being typed into.
    pub fn input(&mut self) -> &mut String {
        match self.field {
            SignInField::Username => &mut self.username,
            SignInField::Password => &mut self.password,
        }
    }

    pub fn switch_field(&mut self) {
        self.field = match self.field {
            SignInField::Username => SignInField::Password,
            SignInField::Password => SignInField::Username,
        };
    }
}

/// Profile screen state.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub form: ProfileForm,
    pub field: ProfileField,
    pub editing: bool,
    /// Open while the picture prompt is showing.
    pub picture_input: Option<String>,
    pub saving: bool,
}

impl ProfileState {
    fn from_session(session: &Session) -> Self {
        Self {
            form: session.user().map(ProfileForm::from_user).unwrap_or_default(),
            field: ProfileField::Username,
            editing: false,
            picture_input: None,
            saving: false,
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Results coming back from background tasks.
pub enum AppEvent {
    /// A feed request finished. `seq` is the store's request number.
    FeedLoaded {
        seq: u64,
        result: Result<Vec<Post>, ApiError>,
    },
    /// A post detail request finished.
    PostLoaded {
        generation: u64,
        result: Result<Post, ApiError>,
    },
    SignInFinished(Result<SessionUser, AuthError>),
    MembersLoaded {
        seq: u64,
        result: Result<Vec<Member>, ApiError>,
    },
    MemberLoaded {
        generation: u64,
        result: Result<MemberDetail, ApiError>,
    },
    ProfileUpdated(Result<Map<String, Value>, ApiError>),
    PictureUpdated(Result<Option<String>, ApiError>),
    /// A background task panicked. `seq` is the request number (or detail
    /// generation) of fetch tasks, so their loading state can be released.
    TaskPanicked {
        task: &'static str,
        seq: Option<u64>,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub config: Config,
    pub client: ApiClient,
    pub sessions: SessionStore,
    pub session: Session,

    pub theme_variant: ThemeVariant,
    pub palette: ColorPalette,

    pub screen: Screen,
    pub show_help: bool,

    // -- Home --
    pub feed: FeedStore,
    pub scroll: ScrollTracker,
    pub selected_post: usize,
    pub search_editing: bool,
    pub carousel_index: usize,
    /// When the current carousel slide appeared; autoplay counts from here.
    pub carousel_shown_at: Instant,

    // -- Post detail --
    pub detail: LoadState<PostView>,
    pub detail_id: Option<u64>,
    pub detail_scroll: usize,
    /// Bumped on every open so late responses for a previous post are ignored.
    pub detail_generation: u64,
    pub detail_handle: Option<tokio::task::JoinHandle<()>>,

    // -- People --
    pub people: PeopleStore,
    pub selected_member: usize,
    pub people_search_editing: bool,
    pub member: LoadState<MemberDetail>,
    pub member_id: Option<u64>,
    pub member_scroll: usize,
    pub member_generation: u64,
    pub member_handle: Option<tokio::task::JoinHandle<()>>,

    // -- Forms --
    pub sign_in: SignInForm,
    pub profile: ProfileState,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub spinner_frame: usize,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(config: Config, client: ApiClient, sessions: SessionStore, session: Session) -> Self {
        let screen = if session.is_logged_in() {
            Screen::Home
        } else {
            Screen::SignIn
        };
        let profile = ProfileState::from_session(&session);
        let sign_in = SignInForm {
            username: session
                .user()
                .and_then(|u| u.user.user_email.clone())
                .unwrap_or_default(),
            ..SignInForm::default()
        };

        Self {
            feed: FeedStore::new(config.per_page),
            scroll: ScrollTracker::new(config.scroll_jitter_threshold),
            config,
            client,
            sessions,
            session,
            theme_variant: ThemeVariant::Dark,
            palette: ThemeVariant::Dark.palette(),
            screen,
            show_help: false,
            selected_post: 0,
            search_editing: false,
            carousel_index: 0,
            carousel_shown_at: Instant::now(),
            detail: LoadState::Idle,
            detail_id: None,
            detail_scroll: 0,
            detail_generation: 0,
            detail_handle: None,
            people: PeopleStore::new(),
            selected_member: 0,
            people_search_editing: false,
            member: LoadState::Idle,
            member_id: None,
            member_scroll: 0,
            member_generation: 0,
            member_handle: None,
            sign_in,
            profile,
            status_message: None,
            spinner_frame: 0,
            needs_redraw: true,
        }
    }

    /// Switch to a different theme variant at runtime.
    ///
    /// A loaded post body is re-rendered with the new palette.
    pub fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.palette = variant.palette();
        if let LoadState::Loaded(view) = &mut self.detail {
            *view = PostView::new(view.post.clone(), &self.palette);
        }
        self.needs_redraw = true;
    }

    /// Cycle to the next theme variant. Returns its name for the status bar.
    pub fn cycle_theme(&mut self) -> &'static str {
        let next = self.theme_variant.next();
        self.set_theme(next);
        next.name()
    }

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// True while any request the current screen waits on is in flight.
    pub fn is_busy(&self) -> bool {
        match self.screen {
            Screen::SignIn => self.sign_in.submitting,
            Screen::Home => self.feed.is_loading(),
            Screen::Detail => self.detail.is_loading(),
            Screen::People => self.people.is_loading(),
            Screen::MemberDetail => self.member.is_loading(),
            Screen::Profile => self.profile.saving,
        }
    }

    // ------------------------------------------------------------------------
    // Tabs
    // ------------------------------------------------------------------------

    /// Show a tab. Detail screens are left behind.
    pub fn select_tab(&mut self, tab: Tab) {
        if self.screen == Screen::SignIn {
            return;
        }
        self.abort_detail_loads();
        if tab == Tab::Profile && self.screen != Screen::Profile {
            self.profile = ProfileState::from_session(&self.session);
        }
        self.screen = tab.screen();
    }

    pub fn next_tab(&mut self) {
        if let Some(tab) = self.screen.tab() {
            self.select_tab(tab.next());
        }
    }

    pub fn prev_tab(&mut self) {
        if let Some(tab) = self.screen.tab() {
            self.select_tab(tab.prev());
        }
    }

    // ------------------------------------------------------------------------
    // Home: feed list
    // ------------------------------------------------------------------------

    /// Select a feed row and report the new offset to the scroll tracker.
    pub fn select_post(&mut self, index: usize) -> Affordance {
        let len = self.feed.displayed().len();
        if len == 0 {
            self.selected_post = 0;
            return self.scroll.affordance();
        }
        self.selected_post = index.min(len - 1);
        let offset = i64::try_from(self.selected_post)
            .unwrap_or(i64::MAX)
            .saturating_mul(POST_ROW_HEIGHT);
        self.scroll.observe(offset)
    }

    /// Move the feed selection by `delta` rows.
    pub fn nav_posts(&mut self, delta: isize) -> Affordance {
        let target = self.selected_post.saturating_add_signed(delta);
        self.select_post(target)
    }

    pub fn selected_post_id(&self) -> Option<u64> {
        self.feed.displayed().get(self.selected_post).map(|p| p.id)
    }

    /// Toggle the chip at `index` in catalog order.
    pub fn toggle_category_at(&mut self, index: usize) -> Option<FetchRequest> {
        let key = *CategoryKey::ALL.get(index)?;
        Some(self.feed.toggle_category(key))
    }

    /// Fold a feed response into the store and keep selections in range.
    pub fn apply_feed(&mut self, seq: u64, result: Result<Vec<Post>, ApiError>) -> FetchOutcome {
        let outcome = self.feed.complete_fetch(seq, result);
        if outcome == FetchOutcome::Applied {
            self.clamp_post_selection();
            self.carousel_index = 0;
            self.carousel_shown_at = Instant::now();
        }
        outcome
    }

    fn clamp_post_selection(&mut self) {
        let len = self.feed.displayed().len();
        self.selected_post = self.selected_post.min(len.saturating_sub(1));
    }

    // ------------------------------------------------------------------------
    // Home: search
    // ------------------------------------------------------------------------

    /// Show the search bar and start typing into it.
    pub fn begin_search(&mut self) {
        self.scroll.reveal();
        self.search_editing = true;
    }

    pub fn end_search(&mut self) {
        self.search_editing = false;
    }

    pub fn search_push(&mut self, c: char) {
        if self.feed.query().chars().count() >= MAX_SEARCH_QUERY_LENGTH {
            self.set_status(format!(
                "Search query too long (max {} chars)",
                MAX_SEARCH_QUERY_LENGTH
            ));
            return;
        }
        let mut query = self.feed.query().to_string();
        query.push(c);
        self.set_feed_query(query);
    }

    pub fn search_pop(&mut self) {
        let mut query = self.feed.query().to_string();
        if query.pop().is_some() {
            self.set_feed_query(query);
        }
    }

    pub fn clear_search(&mut self) {
        if !self.feed.query().is_empty() {
            self.set_feed_query(String::new());
        }
    }

    fn set_feed_query(&mut self, query: String) {
        self.feed.set_query(query);
        self.select_post(0);
    }

    // ------------------------------------------------------------------------
    // Home: carousel
    // ------------------------------------------------------------------------

    pub fn current_carousel_post(&self) -> Option<&Arc<Post>> {
        self.feed.carousel().get(self.carousel_index)
    }

    /// Step the carousel by `delta` slides (wrapping) and restart autoplay.
    pub fn carousel_step(&mut self, delta: isize) {
        let len = self.feed.carousel().len();
        if len == 0 {
            return;
        }
        let len = len as isize;
        let current = self.carousel_index as isize;
        self.carousel_index = (current + delta).rem_euclid(len) as usize;
        self.carousel_shown_at = Instant::now();
    }

    /// Advance the carousel if the current slide has been up for a full
    /// interval. Returns true when the slide changed.
    pub fn tick_carousel(&mut self, now: Instant) -> bool {
        if self.feed.carousel().len() < 2 {
            return false;
        }
        if now.duration_since(self.carousel_shown_at) < self.config.carousel_interval() {
            return false;
        }
        self.carousel_index = (self.carousel_index + 1) % self.feed.carousel().len();
        self.carousel_shown_at = now;
        true
    }

    // ------------------------------------------------------------------------
    // Post detail
    // ------------------------------------------------------------------------

    /// Switch to the detail screen for `id`. Returns the generation the
    /// load must report back with.
    pub fn open_post(&mut self, id: u64) -> u64 {
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
        }
        self.detail_generation = self.detail_generation.wrapping_add(1);
        self.detail = LoadState::Loading;
        self.detail_id = Some(id);
        self.detail_scroll = 0;
        self.screen = Screen::Detail;
        tracing::debug!(post_id = id, generation = self.detail_generation, "Opening post");
        self.detail_generation
    }

    /// Store a post response. Stale generations are dropped; returns false then.
    pub fn apply_post(&mut self, generation: u64, result: Result<Post, ApiError>) -> bool {
        if generation != self.detail_generation || self.screen != Screen::Detail {
            tracing::debug!(generation, current = self.detail_generation, "Discarding stale post");
            return false;
        }
        self.detail_handle = None;
        self.detail = match result {
            Ok(post) => LoadState::Loaded(PostView::new(post, &self.palette)),
            Err(e) => {
                tracing::warn!(error = %e, post_id = ?self.detail_id, "Post load failed");
                LoadState::Failed(e.to_string())
            }
        };
        true
    }

    /// Fail the post load numbered `generation` when its task died.
    pub fn abandon_post_load(&mut self, generation: u64, reason: String) -> bool {
        if generation != self.detail_generation || self.screen != Screen::Detail {
            return false;
        }
        self.detail_handle = None;
        self.detail = LoadState::Failed(reason);
        true
    }

    pub fn close_detail(&mut self) {
        self.abort_detail_loads();
        self.screen = Screen::Home;
    }

    /// URL of the large featured image of the open post.
    pub fn detail_image_url(&self) -> Option<&str> {
        self.detail.loaded().and_then(|view| view.post.image("large"))
    }

    pub fn scroll_detail(&mut self, delta: isize) {
        self.detail_scroll = self.detail_scroll.saturating_add_signed(delta).min(MAX_SCROLL);
    }

    fn abort_detail_loads(&mut self) {
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
            tracing::debug!("Aborted post load");
        }
        if let Some(handle) = self.member_handle.take() {
            handle.abort();
            tracing::debug!("Aborted member load");
        }
        self.detail = LoadState::Idle;
        self.member = LoadState::Idle;
    }

    // ------------------------------------------------------------------------
    // People
    // ------------------------------------------------------------------------

    fn token_copy(&self) -> Option<SecretString> {
        self.session
            .token()
            .map(|t| SecretString::from(t.expose_secret().to_string()))
    }

    /// True when the directory has never been fetched and nothing is in flight.
    pub fn people_need_fetch(&self) -> bool {
        !self.people.is_loaded() && !self.people.is_loading() && self.people.error().is_none()
    }

    /// Start a directory fetch. `None` when there is no token to send.
    pub fn begin_people_fetch(&mut self) -> Option<(u64, SecretString)> {
        let token = self.token_copy()?;
        Some((self.people.begin_fetch(), token))
    }

    pub fn apply_members(&mut self, seq: u64, result: Result<Vec<Member>, ApiError>) -> FetchOutcome {
        let outcome = self.people.complete_fetch(seq, result);
        let len = self.people.displayed().len();
        self.selected_member = self.selected_member.min(len.saturating_sub(1));
        outcome
    }

    pub fn nav_members(&mut self, delta: isize) {
        let len = self.people.displayed().len();
        self.selected_member = self
            .selected_member
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
    }

    pub fn selected_member_id(&self) -> Option<u64> {
        self.people.displayed().get(self.selected_member).map(|m| m.id)
    }

    pub fn people_search_push(&mut self, c: char) {
        if self.people.query().chars().count() >= MAX_SEARCH_QUERY_LENGTH {
            return;
        }
        let mut query = self.people.query().to_string();
        query.push(c);
        self.people.set_query(query);
        self.selected_member = 0;
    }

    pub fn people_search_pop(&mut self) {
        let mut query = self.people.query().to_string();
        if query.pop().is_some() {
            self.people.set_query(query);
            self.selected_member = 0;
        }
    }

    /// Switch to a member's page. Returns the generation and token for the load.
    pub fn open_member(&mut self, id: u64) -> Option<(u64, SecretString)> {
        let token = self.token_copy()?;
        if let Some(handle) = self.member_handle.take() {
            handle.abort();
        }
        self.member_generation = self.member_generation.wrapping_add(1);
        self.member = LoadState::Loading;
        self.member_id = Some(id);
        self.member_scroll = 0;
        self.screen = Screen::MemberDetail;
        Some((self.member_generation, token))
    }

    pub fn apply_member(&mut self, generation: u64, result: Result<MemberDetail, ApiError>) -> bool {
        if generation != self.member_generation || self.screen != Screen::MemberDetail {
            return false;
        }
        self.member_handle = None;
        self.member = match result {
            Ok(detail) => LoadState::Loaded(detail),
            Err(e) => {
                tracing::warn!(error = %e, member_id = ?self.member_id, "Member load failed");
                LoadState::Failed(crate::people::LOAD_FAILED_MESSAGE.to_string())
            }
        };
        true
    }

    pub fn abandon_member_load(&mut self, generation: u64) -> bool {
        if generation != self.member_generation || self.screen != Screen::MemberDetail {
            return false;
        }
        self.member_handle = None;
        self.member = LoadState::Failed(crate::people::LOAD_FAILED_MESSAGE.to_string());
        true
    }

    pub fn close_member(&mut self) {
        self.abort_detail_loads();
        self.screen = Screen::People;
    }

    // ------------------------------------------------------------------------
    // Sign-in
    // ------------------------------------------------------------------------

    /// Validate the form and mark it submitting. Returns the credentials to
    /// send, or `None` when nothing should be sent.
    pub fn begin_sign_in(&mut self) -> Option<(String, SecretString)> {
        if self.sign_in.submitting {
            return None;
        }
        let username = self.sign_in.username.trim().to_string();
        if username.is_empty() || self.sign_in.password.is_empty() {
            self.sign_in.error = Some(AuthError::MissingFields.to_string());
            return None;
        }
        self.sign_in.error = None;
        self.sign_in.submitting = true;
        Some((username, SecretString::from(self.sign_in.password.clone())))
    }

    /// Apply the login result. Returns true when the user is now signed in.
    pub async fn finish_sign_in(&mut self, result: Result<SessionUser, AuthError>) -> bool {
        self.sign_in.submitting = false;
        let established = match result {
            Ok(user) => auth::establish(&self.sessions, &mut self.session, user).await,
            Err(e) => Err(e),
        };
        match established {
            Ok(()) => {
                self.sign_in.password.clear();
                self.sign_in.error = None;
                self.profile = ProfileState::from_session(&self.session);
                self.people = PeopleStore::new();
                self.screen = Screen::Home;
                self.set_status("Signed in successfully");
                true
            }
            Err(e) => {
                tracing::info!(error = %e, "Sign-in failed");
                self.sign_in.error = Some(e.to_string());
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------------

    pub fn begin_profile_update(&mut self) -> Option<(SecretString, ProfileUpdate)> {
        if self.profile.saving {
            return None;
        }
        let Some(token) = self.token_copy() else {
            self.set_status("Sign in to update your profile");
            return None;
        };
        self.profile.editing = false;
        self.profile.saving = true;
        Some((token, self.profile.form.to_update()))
    }

    pub async fn finish_profile_update(&mut self, result: Result<Map<String, Value>, ApiError>) {
        self.profile.saving = false;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Profile update failed");
                self.set_status(format!("Failed to update profile: {}", e));
                return;
            }
        };
        let Some(current) = self.session.user() else {
            return;
        };
        let updated = apply_update(current, &response);
        match auth::store_profile(&self.sessions, &mut self.session, updated).await {
            Ok(()) => {
                self.profile.form = self
                    .session
                    .user()
                    .map(ProfileForm::from_user)
                    .unwrap_or_default();
                self.set_status("Profile updated successfully");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save updated profile");
                self.set_status(format!("Failed to save profile: {}", e));
            }
        }
    }

    pub fn open_picture_prompt(&mut self) {
        let current = self
            .session
            .user()
            .and_then(|u| u.user.ds_profile_pic.clone())
            .unwrap_or_default();
        self.profile.editing = false;
        self.profile.picture_input = Some(current);
    }

    /// Take the typed picture path/URL for `PUT /me`.
    pub fn begin_picture_update(&mut self) -> Option<(SecretString, String)> {
        if self.profile.saving {
            return None;
        }
        let uri = self.profile.picture_input.take()?.trim().to_string();
        if uri.is_empty() {
            self.set_status("Enter an image path or URL");
            return None;
        }
        let token = self.token_copy()?;
        self.profile.saving = true;
        Some((token, uri))
    }

    pub async fn finish_picture_update(&mut self, result: Result<Option<String>, ApiError>) {
        self.profile.saving = false;
        let picture = match result {
            Ok(picture) => picture,
            Err(e) => {
                tracing::warn!(error = %e, "Profile picture update failed");
                self.set_status(format!("Failed to update picture: {}", e));
                return;
            }
        };
        let Some(current) = self.session.user() else {
            return;
        };
        let updated = apply_picture(current, picture);
        match auth::store_profile(&self.sessions, &mut self.session, updated).await {
            Ok(()) => self.set_status("Profile picture updated"),
            Err(e) => self.set_status(format!("Failed to save profile: {}", e)),
        }
    }

    /// Log out and return to the sign-in screen.
    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        auth::sign_out(&self.sessions, &mut self.session).await?;
        self.abort_detail_loads();
        self.people = PeopleStore::new();
        self.selected_member = 0;
        self.profile = ProfileState::from_session(&self.session);
        self.sign_in = SignInForm {
            username: self.sign_in.username.clone(),
            ..SignInForm::default()
        };
        self.screen = Screen::SignIn;
        self.set_status("Logged out");
        Ok(())
    }
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort in-flight detail loads when the app goes away.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.member_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{UserMeta, UserProfile};
    use crate::storage::Database;
    use pretty_assertions::assert_eq;
    use tokio::time::{self, Duration};

    async fn test_app_with(session_user: Option<SessionUser>) -> App {
        let db = Database::open(":memory:").await.unwrap();
        let sessions = SessionStore::new(db);
        let mut session = Session::anonymous();
        if let Some(user) = session_user {
            auth::establish(&sessions, &mut session, user).await.unwrap();
        }
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        App::new(Config::default(), client, sessions, session)
    }

    async fn test_app() -> App {
        test_app_with(None).await
    }

    fn signed_in_user() -> SessionUser {
        SessionUser {
            token: Some("tok".to_string()),
            user: UserProfile {
                user_nicename: Some("asha".to_string()),
                user_email: Some("asha@example.com".to_string()),
                ..UserProfile::default()
            },
            user_meta: UserMeta {
                first_name: Some("Asha".to_string()),
                ..UserMeta::default()
            },
            ..SessionUser::default()
        }
    }

    fn post(id: u64, title: &str) -> Post {
        Post {
            id,
            title: Some(title.to_string()),
            date: None,
            categories: Vec::new(),
            featured_image: None,
            content: Some("<p>Body</p>".to_string()),
        }
    }

    fn load_posts(app: &mut App, titles: &[&str]) {
        let request = app.feed.begin_fetch();
        let posts = titles
            .iter()
            .enumerate()
            .map(|(i, t)| post(i as u64 + 1, t))
            .collect();
        assert_eq!(app.apply_feed(request.seq, Ok(posts)), FetchOutcome::Applied);
    }

    // Startup and tabs
    #[tokio::test]
    async fn test_anonymous_starts_at_sign_in() {
        let app = test_app().await;
        assert_eq!(app.screen, Screen::SignIn);
        assert_eq!(app.screen.tab(), None);
    }

    #[tokio::test]
    async fn test_signed_in_starts_at_home() {
        let app = test_app_with(Some(signed_in_user())).await;
        assert_eq!(app.screen, Screen::Home);
        assert_eq!(app.profile.form.username, "asha");
        assert_eq!(app.sign_in.username, "asha@example.com");
    }

    #[tokio::test]
    async fn test_tabs_cycle() {
        let mut app = test_app_with(Some(signed_in_user())).await;
        app.next_tab();
        assert_eq!(app.screen, Screen::People);
        app.next_tab();
        assert_eq!(app.screen, Screen::Profile);
        app.next_tab();
        assert_eq!(app.screen, Screen::Home);
        app.prev_tab();
        assert_eq!(app.screen, Screen::Profile);
    }

    #[tokio::test]
    async fn test_tabs_ignored_on_sign_in() {
        let mut app = test_app().await;
        app.next_tab();
        assert_eq!(app.screen, Screen::SignIn);
    }

    // Feed list and scroll tracking
    #[tokio::test]
    async fn test_scrolling_down_hides_search_and_up_shows_it() {
        let mut app = test_app().await;
        load_posts(&mut app, &["a", "b", "c", "d"]);

        assert_eq!(app.select_post(0), Affordance::Visible);
        assert_eq!(app.nav_posts(1), Affordance::Hidden);
        assert_eq!(app.nav_posts(1), Affordance::Hidden);
        assert_eq!(app.nav_posts(-1), Affordance::Visible);
        assert_eq!(app.selected_post, 1);
    }

    #[tokio::test]
    async fn test_holding_still_at_bottom_shows_search() {
        let mut app = test_app().await;
        load_posts(&mut app, &["a", "b"]);
        app.select_post(0);
        assert_eq!(app.nav_posts(1), Affordance::Hidden);
        // Already on the last row: same offset again.
        assert_eq!(app.nav_posts(1), Affordance::Visible);
    }

    #[tokio::test]
    async fn test_begin_search_reveals() {
        let mut app = test_app().await;
        load_posts(&mut app, &["a", "b"]);
        app.select_post(0);
        app.nav_posts(1);
        assert_eq!(app.scroll.affordance(), Affordance::Hidden);
        app.begin_search();
        assert!(app.scroll.affordance().is_visible());
        assert!(app.search_editing);
    }

    #[tokio::test]
    async fn test_search_filters_and_resets_selection() {
        let mut app = test_app().await;
        load_posts(&mut app, &["Reunion 2024", "School news", "REUNION photos"]);
        app.select_post(2);

        for c in "reu".chars() {
            app.search_push(c);
        }
        let ids: Vec<u64> = app.feed.displayed().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(app.selected_post, 0);

        app.search_pop();
        app.search_pop();
        app.search_pop();
        assert_eq!(app.feed.displayed().len(), 3);
    }

    #[tokio::test]
    async fn test_toggle_category_at() {
        let mut app = test_app().await;
        let request = app.toggle_category_at(3).unwrap();
        assert_eq!(request.categories, vec![CategoryKey::Events]);
        assert!(app.feed.is_loading());
        assert!(app.toggle_category_at(7).is_none());
    }

    #[tokio::test]
    async fn test_feed_refresh_clamps_selection() {
        let mut app = test_app().await;
        load_posts(&mut app, &["a", "b", "c", "d"]);
        app.select_post(3);
        load_posts(&mut app, &["x"]);
        assert_eq!(app.selected_post, 0);
        assert_eq!(app.selected_post_id(), Some(1));
    }

    #[tokio::test]
    async fn test_superseded_feed_is_ignored() {
        let mut app = test_app().await;
        let first = app.feed.begin_fetch();
        let second = app.feed.begin_fetch();
        assert_eq!(
            app.apply_feed(first.seq, Ok(vec![post(9, "late")])),
            FetchOutcome::Superseded
        );
        assert!(app.feed.displayed().is_empty());
        assert_eq!(
            app.apply_feed(second.seq, Ok(vec![post(1, "fresh")])),
            FetchOutcome::Applied
        );
        assert_eq!(app.selected_post_id(), Some(1));
    }

    // Carousel
    #[tokio::test]
    async fn test_carousel_autoplay_wraps() {
        let mut app = test_app().await;
        time::pause();
        load_posts(&mut app, &["a", "b", "c", "d", "e"]);
        assert_eq!(app.feed.carousel().len(), 3);
        assert_eq!(app.current_carousel_post().map(|p| p.id), Some(2));

        assert!(!app.tick_carousel(Instant::now()));
        time::advance(Duration::from_millis(2000)).await;
        assert!(app.tick_carousel(Instant::now()));
        assert_eq!(app.carousel_index, 1);

        time::advance(Duration::from_millis(2000)).await;
        app.tick_carousel(Instant::now());
        time::advance(Duration::from_millis(2000)).await;
        app.tick_carousel(Instant::now());
        assert_eq!(app.carousel_index, 0);
    }

    #[tokio::test]
    async fn test_carousel_manual_step_wraps() {
        let mut app = test_app().await;
        load_posts(&mut app, &["a", "b", "c", "d"]);
        app.carousel_step(-1);
        assert_eq!(app.carousel_index, 2);
        app.carousel_step(1);
        assert_eq!(app.carousel_index, 0);
    }

    #[tokio::test]
    async fn test_carousel_single_slide_does_not_advance() {
        let mut app = test_app().await;
        time::pause();
        load_posts(&mut app, &["a", "b"]);
        time::advance(Duration::from_secs(10)).await;
        assert!(!app.tick_carousel(Instant::now()));
        assert_eq!(app.carousel_index, 0);
    }

    // Post detail
    #[tokio::test]
    async fn test_open_post_and_load() {
        let mut app = test_app().await;
        let generation = app.open_post(42);
        assert_eq!(app.screen, Screen::Detail);
        assert!(app.detail.is_loading());

        assert!(app.apply_post(generation, Ok(post(42, "Hello"))));
        let view = app.detail.loaded().unwrap();
        assert_eq!(view.post.id, 42);
        assert!(!view.body.lines.is_empty());
    }

    #[tokio::test]
    async fn test_stale_post_generation_is_dropped() {
        let mut app = test_app().await;
        let old = app.open_post(1);
        let new = app.open_post(2);
        assert!(!app.apply_post(old, Ok(post(1, "old"))));
        assert!(app.detail.is_loading());
        assert!(app.apply_post(new, Err(ApiError::HttpStatus(500))));
        assert!(matches!(app.detail, LoadState::Failed(_)));
    }

    #[tokio::test]
    async fn test_post_arriving_after_close_is_dropped() {
        let mut app = test_app().await;
        let generation = app.open_post(1);
        app.close_detail();
        assert_eq!(app.screen, Screen::Home);
        assert!(!app.apply_post(generation, Ok(post(1, "late"))));
        assert!(matches!(app.detail, LoadState::Idle));
    }

    // People
    #[tokio::test]
    async fn test_people_fetch_requires_token() {
        let mut app = test_app().await;
        assert!(app.begin_people_fetch().is_none());

        let mut app = test_app_with(Some(signed_in_user())).await;
        assert!(app.people_need_fetch());
        let (seq, token) = app.begin_people_fetch().unwrap();
        assert_eq!(token.expose_secret(), "tok");
        assert!(!app.people_need_fetch());
        app.apply_members(seq, Err(ApiError::HttpStatus(401)));
        assert_eq!(app.people.error(), Some(crate::people::LOAD_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_open_member_failure_message() {
        let mut app = test_app_with(Some(signed_in_user())).await;
        app.select_tab(Tab::People);
        let (generation, _) = app.open_member(7).unwrap();
        assert_eq!(app.screen, Screen::MemberDetail);
        assert!(app.apply_member(generation, Err(ApiError::Timeout(30))));
        assert!(matches!(
            &app.member,
            LoadState::Failed(msg) if msg == crate::people::LOAD_FAILED_MESSAGE
        ));
        app.close_member();
        assert_eq!(app.screen, Screen::People);
    }

    // Sign-in
    #[test]
    fn test_sign_in_form_debug_hides_password() {
        let form = SignInForm {
            username: "asha@example.com".to_string(),
            password: "hunter22".to_string(),
            ..SignInForm::default()
        };
        let debug = format!("{:?}", form);
        assert!(debug.contains("asha@example.com"));
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_sign_in_with_empty_fields_sends_nothing() {
        let mut app = test_app().await;
        app.sign_in.username = "asha".to_string();
        assert!(app.begin_sign_in().is_none());
        assert_eq!(app.sign_in.error.as_deref(), Some("Please fill in all fields"));
        assert!(!app.sign_in.submitting);
    }

    #[tokio::test]
    async fn test_sign_in_success_goes_home() {
        let mut app = test_app().await;
        app.sign_in.username = "asha".to_string();
        app.sign_in.password = "pw".to_string();
        let (username, password) = app.begin_sign_in().unwrap();
        assert_eq!(username, "asha");
        assert_eq!(password.expose_secret(), "pw");
        assert!(app.sign_in.submitting);
        assert!(app.begin_sign_in().is_none());

        assert!(app.finish_sign_in(Ok(signed_in_user())).await);
        assert_eq!(app.screen, Screen::Home);
        assert!(app.session.is_logged_in());
        assert!(app.sign_in.password.is_empty());

        let reloaded = app.sessions.load().await.unwrap();
        assert!(reloaded.is_logged_in());
    }

    #[tokio::test]
    async fn test_sign_in_failure_shows_error() {
        let mut app = test_app().await;
        assert!(!app.finish_sign_in(Err(AuthError::InvalidCredentials)).await);
        assert_eq!(app.screen, Screen::SignIn);
        assert_eq!(
            app.sign_in.error.as_deref(),
            Some("Invalid username or password")
        );
    }

    // Profile
    #[tokio::test]
    async fn test_profile_update_persists_merge() {
        let mut app = test_app_with(Some(signed_in_user())).await;
        app.select_tab(Tab::Profile);
        app.profile.form.last_name = "Rao".to_string();
        let (_, update) = app.begin_profile_update().unwrap();
        assert_eq!(update.last_name, "Rao");
        assert!(app.profile.saving);

        let response: Map<String, Value> =
            serde_json::from_value(serde_json::json!({ "last_name": "Rao", "ds_batch": "1999" }))
                .unwrap();
        app.finish_profile_update(Ok(response)).await;

        assert!(!app.profile.saving);
        assert_eq!(app.profile.form.last_name, "Rao");
        assert_eq!(app.profile.form.batch, "1999");
        let stored = app.sessions.load().await.unwrap();
        assert_eq!(
            stored.user().and_then(|u| u.user.ds_batch.as_deref()),
            Some("1999")
        );
    }

    #[tokio::test]
    async fn test_picture_prompt_round() {
        let mut app = test_app_with(Some(signed_in_user())).await;
        app.open_picture_prompt();
        app.profile.picture_input = Some("  /tmp/me.jpg ".to_string());
        let (_, uri) = app.begin_picture_update().unwrap();
        assert_eq!(uri, "/tmp/me.jpg");
        app.finish_picture_update(Ok(Some("https://img/me.jpg".to_string())))
            .await;
        assert_eq!(
            app.session.user().and_then(|u| u.user.ds_profile_pic.as_deref()),
            Some("https://img/me.jpg")
        );
    }

    #[tokio::test]
    async fn test_sign_out_returns_to_sign_in() {
        let mut app = test_app_with(Some(signed_in_user())).await;
        app.select_tab(Tab::People);
        app.sign_out().await.unwrap();
        assert_eq!(app.screen, Screen::SignIn);
        assert!(!app.session.is_logged_in());
        assert!(app.session.user().is_some());
        assert!(app.people_need_fetch());
    }

    // Status and theme
    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        // Create app before pausing time to avoid DB connection timeout
        let mut app = test_app().await;
        time::pause();
        app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_cycle_theme_rerenders_detail() {
        let mut app = test_app().await;
        let generation = app.open_post(1);
        app.apply_post(generation, Ok(post(1, "t")));
        assert_eq!(app.cycle_theme(), "Light");
        assert_eq!(app.palette, ThemeVariant::Light.palette());
        assert!(app.detail.loaded().is_some());
    }
}
