//! Input handling for the TUI.
//!
//! This module processes keyboard and mouse input and dispatches to the
//! appropriate handler based on the current screen and mode.

use crate::app::{App, AppEvent, Screen, SignInField};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers, MouseEventKind};
use tokio::sync::mpsc;

use super::helpers::{
    open_url, spawn_feed_fetch, spawn_member_load, spawn_members_load, spawn_picture_update,
    spawn_post_load, spawn_profile_update, spawn_sign_in,
};
use super::Action;

/// Lines moved by PageUp/PageDown in the detail screens.
const PAGE_LINES: isize = 20;
/// Rows moved by PageUp/PageDown in lists.
const PAGE_ROWS: isize = 10;
/// Lines moved per mouse wheel notch in the detail screens.
const WHEEL_LINES: isize = 3;

/// Main input dispatch function.
///
/// Routes input to the appropriate handler based on current mode and screen.
/// Text fields capture every printable key while they are being edited.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    // Help overlay captures all keys when visible
    if app.show_help {
        if matches!(code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            app.show_help = false;
        }
        return Ok(Action::Continue);
    }

    // Modes that own the keyboard
    match app.screen {
        Screen::SignIn => return Ok(handle_sign_in_input(app, code, event_tx)),
        Screen::Home if app.search_editing => {
            handle_search_input(app, code);
            return Ok(Action::Continue);
        }
        Screen::People if app.people_search_editing => {
            handle_people_search_input(app, code);
            return Ok(Action::Continue);
        }
        Screen::Profile if app.profile.picture_input.is_some() => {
            handle_picture_input(app, code, event_tx);
            return Ok(Action::Continue);
        }
        Screen::Profile if app.profile.editing => {
            handle_field_input(app, code);
            return Ok(Action::Continue);
        }
        _ => {}
    }

    // Global keys
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('?') => {
            app.show_help = true;
            return Ok(Action::Continue);
        }
        KeyCode::Char('t') => {
            let name = app.cycle_theme();
            app.set_status(format!("Theme: {}", name));
            return Ok(Action::Continue);
        }
        KeyCode::Tab => {
            app.next_tab();
            on_screen_entered(app, event_tx);
            return Ok(Action::Continue);
        }
        KeyCode::BackTab => {
            app.prev_tab();
            on_screen_entered(app, event_tx);
            return Ok(Action::Continue);
        }
        _ => {}
    }

    match app.screen {
        Screen::SignIn => {}
        Screen::Home => handle_home_input(app, code, event_tx),
        Screen::Detail => handle_detail_input(app, code, event_tx),
        Screen::People => handle_people_input(app, code, event_tx),
        Screen::MemberDetail => handle_member_input(app, code, event_tx),
        Screen::Profile => handle_profile_input(app, code, event_tx).await?,
    }
    Ok(Action::Continue)
}

/// Load what a freshly shown tab needs.
fn on_screen_entered(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.screen == Screen::People && app.people_need_fetch() {
        spawn_members_load(app, event_tx);
    }
}

/// Mouse wheel scrolls the list or page under it.
pub(super) fn handle_mouse(app: &mut App, kind: MouseEventKind) {
    let delta: isize = match kind {
        MouseEventKind::ScrollDown => 1,
        MouseEventKind::ScrollUp => -1,
        _ => return,
    };
    if app.show_help {
        return;
    }
    match app.screen {
        Screen::Home => {
            app.nav_posts(delta);
        }
        Screen::Detail => app.scroll_detail(delta * WHEEL_LINES),
        Screen::People => app.nav_members(delta),
        Screen::MemberDetail => {
            app.member_scroll = app.member_scroll.saturating_add_signed(delta * WHEEL_LINES);
        }
        Screen::SignIn | Screen::Profile => {}
    }
}

// ============================================================================
// Sign-in
// ============================================================================

fn handle_sign_in_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    match code {
        KeyCode::Esc => return Action::Quit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.sign_in.switch_field();
        }
        KeyCode::Enter => {
            if app.sign_in.field == SignInField::Username && app.sign_in.password.is_empty() {
                app.sign_in.field = SignInField::Password;
            } else {
                spawn_sign_in(app, event_tx);
            }
        }
        _ if app.sign_in.submitting => {}
        KeyCode::Backspace => {
            app.sign_in.input().pop();
            app.sign_in.error = None;
        }
        KeyCode::Char(c) => {
            app.sign_in.input().push(c);
            app.sign_in.error = None;
        }
        _ => {}
    }
    Action::Continue
}

// ============================================================================
// Home
// ============================================================================

fn handle_home_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.nav_posts(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.nav_posts(-1);
        }
        KeyCode::PageDown => {
            app.nav_posts(PAGE_ROWS);
        }
        KeyCode::PageUp => {
            app.nav_posts(-PAGE_ROWS);
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.select_post(0);
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.select_post(usize::MAX);
        }
        KeyCode::Enter => {
            if let Some(id) = app.selected_post_id() {
                spawn_post_load(app, id, event_tx);
            }
        }
        KeyCode::Char('/') => app.begin_search(),
        KeyCode::Esc => app.clear_search(),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            if let Some(request) = app.toggle_category_at(index) {
                spawn_feed_fetch(app, request, event_tx);
            }
        }
        KeyCode::Char('[') | KeyCode::Left => app.carousel_step(-1),
        KeyCode::Char(']') | KeyCode::Right => app.carousel_step(1),
        KeyCode::Char('c') => {
            if let Some(id) = app.current_carousel_post().map(|p| p.id) {
                spawn_post_load(app, id, event_tx);
            }
        }
        KeyCode::Char('r') => {
            let request = app.feed.begin_fetch();
            spawn_feed_fetch(app, request, event_tx);
        }
        _ => {}
    }
}

fn handle_search_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.clear_search();
            app.end_search();
        }
        KeyCode::Enter => app.end_search(),
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Down => {
            app.nav_posts(1);
        }
        KeyCode::Up => {
            app.nav_posts(-1);
        }
        KeyCode::Char(c) => app.search_push(c),
        _ => {}
    }
}

// ============================================================================
// Post detail
// ============================================================================

fn handle_detail_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => app.close_detail(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_detail(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_detail(-1),
        KeyCode::PageDown | KeyCode::Char(' ') => app.scroll_detail(PAGE_LINES),
        KeyCode::PageUp => app.scroll_detail(-PAGE_LINES),
        KeyCode::Char('g') | KeyCode::Home => app.detail_scroll = 0,
        KeyCode::Char('o') => match app.detail_image_url().map(str::to_string) {
            Some(url) => open_url(app, &url),
            None => app.set_status("Image not available"),
        },
        KeyCode::Char('r') => {
            if let Some(id) = app.detail_id {
                spawn_post_load(app, id, event_tx);
            }
        }
        _ => {}
    }
}

// ============================================================================
// People
// ============================================================================

fn handle_people_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.nav_members(1),
        KeyCode::Char('k') | KeyCode::Up => app.nav_members(-1),
        KeyCode::PageDown => app.nav_members(PAGE_ROWS),
        KeyCode::PageUp => app.nav_members(-PAGE_ROWS),
        KeyCode::Char('g') | KeyCode::Home => app.selected_member = 0,
        KeyCode::Enter => {
            if let Some(id) = app.selected_member_id() {
                spawn_member_load(app, id, event_tx);
            }
        }
        KeyCode::Char('/') => app.people_search_editing = true,
        KeyCode::Esc => {
            app.people.set_query(String::new());
            app.selected_member = 0;
        }
        KeyCode::Char('r') => spawn_members_load(app, event_tx),
        _ => {}
    }
}

fn handle_people_search_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.people.set_query(String::new());
            app.selected_member = 0;
            app.people_search_editing = false;
        }
        KeyCode::Enter => app.people_search_editing = false,
        KeyCode::Backspace => app.people_search_pop(),
        KeyCode::Down => app.nav_members(1),
        KeyCode::Up => app.nav_members(-1),
        KeyCode::Char(c) => app.people_search_push(c),
        _ => {}
    }
}

fn handle_member_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => app.close_member(),
        KeyCode::Char('j') | KeyCode::Down => {
            app.member_scroll = app.member_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.member_scroll = app.member_scroll.saturating_sub(1);
        }
        KeyCode::Char('r') => {
            if let Some(id) = app.member_id {
                spawn_member_load(app, id, event_tx);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Profile
// ============================================================================

async fn handle_profile_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<()> {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.profile.field = app.profile.field.next(),
        KeyCode::Char('k') | KeyCode::Up => app.profile.field = app.profile.field.prev(),
        KeyCode::Enter | KeyCode::Char('e') => {
            if app.profile.field.is_submitted() {
                app.profile.editing = true;
            } else {
                app.set_status(format!("{} cannot be changed here", app.profile.field.label()));
            }
        }
        KeyCode::Char('s') => spawn_profile_update(app, event_tx),
        KeyCode::Char('p') => app.open_picture_prompt(),
        KeyCode::Char('x') => {
            if let Err(e) = app.sign_out().await {
                tracing::error!(error = %e, "Logout failed");
                app.set_status(format!("Logout failed: {}", e));
            }
        }
        _ => {}
    }
    Ok(())
}

fn handle_field_input(app: &mut App, code: KeyCode) {
    let field = app.profile.field;
    match code {
        KeyCode::Esc | KeyCode::Enter => app.profile.editing = false,
        KeyCode::Backspace => {
            app.profile.form.field_mut(field).pop();
        }
        KeyCode::Char(c) => app.profile.form.field_mut(field).push(c),
        _ => {}
    }
}

fn handle_picture_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc => app.profile.picture_input = None,
        KeyCode::Enter => spawn_picture_update(app, event_tx),
        KeyCode::Backspace => {
            if let Some(input) = app.profile.picture_input.as_mut() {
                input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(input) = app.profile.picture_input.as_mut() {
                input.push(c);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, Post, SessionUser, UserProfile};
    use crate::config::Config;
    use crate::feed::CategoryKey;
    use crate::profile::ProfileField;
    use crate::session::{auth, Session, SessionStore};
    use crate::storage::Database;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    async fn test_app(signed_in: bool) -> App {
        let db = Database::open(":memory:").await.unwrap();
        let sessions = SessionStore::new(db);
        let mut session = Session::anonymous();
        if signed_in {
            let user = SessionUser {
                token: Some("tok".to_string()),
                user: UserProfile {
                    user_nicename: Some("asha".to_string()),
                    ..UserProfile::default()
                },
                ..SessionUser::default()
            };
            auth::establish(&sessions, &mut session, user).await.unwrap();
        }
        // Port 9 (discard): requests spawned by the handlers fail fast.
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        App::new(Config::default(), client, sessions, session)
    }

    async fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).await.unwrap()
    }

    fn load(app: &mut App, count: u64) {
        let request = app.feed.begin_fetch();
        let posts = (1..=count)
            .map(|id| Post {
                id,
                title: Some(format!("Post {}", id)),
                date: None,
                categories: Vec::new(),
                featured_image: None,
                content: None,
            })
            .collect();
        app.apply_feed(request.seq, Ok(posts));
    }

    #[tokio::test]
    async fn test_q_types_into_sign_in_form() {
        let mut app = test_app(false).await;
        let (tx, _rx) = mpsc::channel(8);
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx).await, Action::Continue));
        assert_eq!(app.sign_in.username, "q");
        assert!(matches!(press(&mut app, KeyCode::Esc, &tx).await, Action::Quit));
    }

    #[tokio::test]
    async fn test_sign_in_enter_moves_to_password_first() {
        let mut app = test_app(false).await;
        let (tx, _rx) = mpsc::channel(8);
        press(&mut app, KeyCode::Char('a'), &tx).await;
        press(&mut app, KeyCode::Enter, &tx).await;
        assert_eq!(app.sign_in.field, SignInField::Password);
        press(&mut app, KeyCode::Char('x'), &tx).await;
        assert_eq!(app.sign_in.password, "x");
        assert_eq!(app.sign_in.username, "a");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_anywhere() {
        let mut app = test_app(false).await;
        let (tx, _rx) = mpsc::channel(8);
        let action = handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx)
            .await
            .unwrap();
        assert!(matches!(action, Action::Quit));
    }

    #[tokio::test]
    async fn test_search_mode_captures_keys() {
        let mut app = test_app(true).await;
        let (tx, _rx) = mpsc::channel(8);
        load(&mut app, 12);
        press(&mut app, KeyCode::Char('/'), &tx).await;
        for c in "11".chars() {
            press(&mut app, KeyCode::Char(c), &tx).await;
        }
        assert_eq!(app.feed.query(), "11");
        assert_eq!(app.feed.displayed().len(), 1);
        // '1' went to the query, not to the category chips
        assert!(app.feed.selection().is_empty());

        press(&mut app, KeyCode::Esc, &tx).await;
        assert!(!app.search_editing);
        assert_eq!(app.feed.query(), "");
    }

    #[tokio::test]
    async fn test_number_keys_toggle_chips() {
        let mut app = test_app(true).await;
        let (tx, _rx) = mpsc::channel(8);
        press(&mut app, KeyCode::Char('2'), &tx).await;
        assert!(app.feed.selection().contains(CategoryKey::ALL[1]));
        assert!(app.feed.is_loading());
    }

    #[tokio::test]
    async fn test_mouse_wheel_moves_selection_and_hides_search() {
        let mut app = test_app(true).await;
        load(&mut app, 5);
        app.select_post(0);
        handle_mouse(&mut app, MouseEventKind::ScrollDown);
        assert_eq!(app.selected_post, 1);
        assert!(!app.scroll.affordance().is_visible());
        handle_mouse(&mut app, MouseEventKind::ScrollUp);
        assert!(app.scroll.affordance().is_visible());
    }

    #[tokio::test]
    async fn test_tab_to_people_starts_fetch() {
        let mut app = test_app(true).await;
        let (tx, _rx) = mpsc::channel(8);
        press(&mut app, KeyCode::Tab, &tx).await;
        assert_eq!(app.screen, Screen::People);
        assert!(app.people.is_loading());
    }

    #[tokio::test]
    async fn test_profile_only_submitted_fields_edit() {
        let mut app = test_app(true).await;
        let (tx, _rx) = mpsc::channel(8);
        app.select_tab(crate::app::Tab::Profile);
        assert_eq!(app.profile.field, ProfileField::Username);
        press(&mut app, KeyCode::Enter, &tx).await;
        assert!(!app.profile.editing);

        press(&mut app, KeyCode::Char('j'), &tx).await;
        press(&mut app, KeyCode::Enter, &tx).await;
        assert!(app.profile.editing);
        press(&mut app, KeyCode::Char('R'), &tx).await;
        press(&mut app, KeyCode::Enter, &tx).await;
        assert_eq!(app.profile.form.first_name, "R");
        assert!(!app.profile.editing);
    }

    #[tokio::test]
    async fn test_help_overlay_swallows_keys() {
        let mut app = test_app(true).await;
        let (tx, _rx) = mpsc::channel(8);
        press(&mut app, KeyCode::Char('?'), &tx).await;
        assert!(app.show_help);
        assert!(matches!(press(&mut app, KeyCode::Tab, &tx).await, Action::Continue));
        assert_eq!(app.screen, Screen::Home);
        press(&mut app, KeyCode::Esc, &tx).await;
        assert!(!app.show_help);
    }
}
