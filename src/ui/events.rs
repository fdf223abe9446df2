//! Application event handling.
//!
//! Folds background task results back into `App`. Session writes happen
//! here, on the main loop, never inside the tasks.

use crate::app::{App, AppEvent, Screen};
use crate::feed::FetchOutcome;
use tokio::sync::mpsc;

use super::helpers::spawn_feed_fetch;

/// Handle application events from background tasks.
pub(super) async fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::FeedLoaded { seq, result } => match app.apply_feed(seq, result) {
            FetchOutcome::Applied => {}
            FetchOutcome::Failed => {
                if app.screen != Screen::Home {
                    app.set_status("Failed to refresh the feed");
                }
            }
            FetchOutcome::Superseded => {
                tracing::debug!(seq, "Feed response superseded by a newer request");
            }
        },
        AppEvent::PostLoaded { generation, result } => {
            app.apply_post(generation, result);
        }
        AppEvent::SignInFinished(result) => {
            if app.finish_sign_in(result).await && app.feed.all_items().is_empty() {
                let request = app.feed.begin_fetch();
                spawn_feed_fetch(app, request, event_tx);
            }
        }
        AppEvent::MembersLoaded { seq, result } => {
            app.apply_members(seq, result);
        }
        AppEvent::MemberLoaded { generation, result } => {
            app.apply_member(generation, result);
        }
        AppEvent::ProfileUpdated(result) => {
            app.finish_profile_update(result).await;
        }
        AppEvent::PictureUpdated(result) => {
            app.finish_picture_update(result).await;
        }
        AppEvent::TaskPanicked { task, seq, error } => {
            tracing::error!(task, ?seq, error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
            // The task never reports back, so release whatever it was holding.
            let reason = format!("Internal error: {}", error);
            match (task, seq) {
                ("sign_in", _) => app.sign_in.submitting = false,
                ("profile_update" | "picture_update", _) => app.profile.saving = false,
                ("feed_fetch", Some(seq)) => {
                    app.feed.abandon_fetch(seq, &reason);
                }
                ("members_load", Some(seq)) => {
                    app.people.abandon_fetch(seq);
                }
                ("post_load", Some(generation)) => {
                    app.abandon_post_load(generation, reason);
                }
                ("member_load", Some(generation)) => {
                    app.abandon_member_load(generation);
                }
                _ => {}
            }
        }
    }
}
