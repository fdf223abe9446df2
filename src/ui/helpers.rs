//! Helper functions for UI operations.
//!
//! Background task spawning and the other side effects input handlers share.
//! Every task reports back through an `AppEvent`; state is only touched on
//! the main loop.

use crate::app::{App, AppEvent};
use crate::feed::FetchRequest;
use crate::session::auth;
use crate::util::validate_url_for_open;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of a panicking task silently disappearing, the panic message comes
/// back as `Err(String)` so the UI can report it.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Run `work` on the runtime and send the event it produces, or
/// `TaskPanicked` (tagged with `seq`) if it panics.
fn spawn_task<F>(
    task: &'static str,
    seq: Option<u64>,
    tx: mpsc::Sender<AppEvent>,
    work: F,
) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let event = match catch_task_panic(work).await {
            Ok(event) => event,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                AppEvent::TaskPanicked {
                    task,
                    seq,
                    error: panic_msg,
                }
            }
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(task, error = %e, "Channel send failed (receiver dropped)");
        }
    })
}

// ============================================================================
// Feed and posts
// ============================================================================

/// Send a feed request issued by the store.
///
/// The handle is not kept: a response to an older request is recognized by
/// its sequence number and dropped by the store.
pub(super) fn spawn_feed_fetch(app: &App, request: FetchRequest, tx: &mpsc::Sender<AppEvent>) {
    let client = app.client.clone();
    tracing::debug!(seq = request.seq, categories = request.categories.len(), "Spawning feed fetch");
    spawn_task("feed_fetch", Some(request.seq), tx.clone(), async move {
        let result = client
            .fetch_posts(&request.categories, request.per_page)
            .await;
        AppEvent::FeedLoaded {
            seq: request.seq,
            result,
        }
    });
}

/// Open the detail screen for `id` and load the post.
pub(super) fn spawn_post_load(app: &mut App, id: u64, tx: &mpsc::Sender<AppEvent>) {
    let generation = app.open_post(id);
    let client = app.client.clone();
    app.detail_handle = Some(spawn_task("post_load", Some(generation), tx.clone(), async move {
        let result = client.fetch_post(id).await;
        AppEvent::PostLoaded { generation, result }
    }));
}

// ============================================================================
// Session
// ============================================================================

/// Submit the sign-in form. Nothing is sent when a field is empty.
pub(super) fn spawn_sign_in(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let Some((username, password)) = app.begin_sign_in() else {
        return;
    };
    let client = app.client.clone();
    spawn_task("sign_in", None, tx.clone(), async move {
        let result = auth::authenticate(&client, &username, &password).await;
        AppEvent::SignInFinished(result)
    });
}

pub(super) fn spawn_profile_update(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let Some((token, update)) = app.begin_profile_update() else {
        return;
    };
    app.set_status("Updating profile...");
    let client = app.client.clone();
    spawn_task("profile_update", None, tx.clone(), async move {
        AppEvent::ProfileUpdated(client.update_profile(&token, &update).await)
    });
}

pub(super) fn spawn_picture_update(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let Some((token, uri)) = app.begin_picture_update() else {
        return;
    };
    app.set_status("Uploading picture...");
    let client = app.client.clone();
    spawn_task("picture_update", None, tx.clone(), async move {
        AppEvent::PictureUpdated(client.update_profile_picture(&token, &uri).await)
    });
}

// ============================================================================
// People
// ============================================================================

pub(super) fn spawn_members_load(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let Some((seq, token)) = app.begin_people_fetch() else {
        app.set_status("Sign in to see the directory");
        return;
    };
    let client = app.client.clone();
    spawn_task("members_load", Some(seq), tx.clone(), async move {
        let result = client.fetch_members(&token).await;
        AppEvent::MembersLoaded { seq, result }
    });
}

/// Open a member's page and load the record.
pub(super) fn spawn_member_load(app: &mut App, id: u64, tx: &mpsc::Sender<AppEvent>) {
    let Some((generation, token)) = app.open_member(id) else {
        app.set_status("Sign in to see member details");
        return;
    };
    let client = app.client.clone();
    app.member_handle = Some(spawn_task("member_load", Some(generation), tx.clone(), async move {
        let result = client.fetch_member(&token, id).await;
        AppEvent::MemberLoaded { generation, result }
    }));
}

// ============================================================================
// Browser
// ============================================================================

/// Hand a link to the system browser after checking its scheme.
pub(super) fn open_url(app: &mut App, url: &str) {
    // Validate before open::that() so nothing but http(s) reaches the shell
    match validate_url_for_open(url) {
        Err(e) => app.set_status(e.to_string()),
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                app.set_status(format!("Failed to open browser: {}", e));
            } else {
                app.set_status("Opening in browser...");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        let result = catch_task_panic(async { 7 }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_str_message() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_catch_task_panic_formatted_message() {
        let id = 3;
        let result: Result<(), String> =
            catch_task_panic(async move { panic!("post {} failed", id) }).await;
        assert_eq!(result, Err("post 3 failed".to_string()));
    }

    #[tokio::test]
    async fn test_spawn_task_reports_panic_as_event() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = spawn_task("demo", Some(4), tx, async { panic!("bad payload") });
        handle.await.unwrap();
        match rx.recv().await {
            Some(AppEvent::TaskPanicked { task, seq, error }) => {
                assert_eq!(task, "demo");
                assert_eq!(seq, Some(4));
                assert_eq!(error, "bad payload");
            }
            _ => panic!("expected TaskPanicked"),
        }
    }
}
