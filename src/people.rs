//! Member directory: fetched list plus search, same shape as the feed store.

use crate::api::{ApiClient, ApiError, Member};
use crate::feed::{filter_items, FetchOutcome};
use secrecy::SecretString;
use std::sync::Arc;

/// Message shown in place of the list when the directory cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data. Please try again later.";

#[derive(Debug, Clone, Default)]
pub struct PeopleStore {
    all: Arc<Vec<Arc<Member>>>,
    displayed: Vec<Arc<Member>>,
    query: String,
    loading: bool,
    error: Option<String>,
    latest_seq: u64,
    loaded: bool,
}

impl PeopleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Arc<Member>] {
        &self.all
    }

    pub fn displayed(&self) -> &[Arc<Member>] {
        &self.displayed
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True once any fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Start a fetch; returns the sequence number to complete it with.
    pub fn begin_fetch(&mut self) -> u64 {
        self.latest_seq = self.latest_seq.wrapping_add(1);
        self.loading = true;
        self.latest_seq
    }

    /// Apply a directory response if it belongs to the latest request.
    pub fn complete_fetch(
        &mut self,
        seq: u64,
        result: Result<Vec<Member>, ApiError>,
    ) -> FetchOutcome {
        if seq != self.latest_seq {
            return FetchOutcome::Superseded;
        }
        self.loading = false;
        match result {
            Ok(members) => {
                tracing::info!(count = members.len(), "Directory updated");
                self.all = Arc::new(members.into_iter().map(Arc::new).collect());
                self.error = None;
                self.loaded = true;
                self.refilter();
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(error = %e, "Directory fetch failed");
                self.error = Some(LOAD_FAILED_MESSAGE.to_string());
                FetchOutcome::Failed
            }
        }
    }

    /// Drop the request numbered `seq` without a response. Clears the
    /// loading flag if it is the latest.
    pub fn abandon_fetch(&mut self, seq: u64) -> FetchOutcome {
        if seq != self.latest_seq {
            return FetchOutcome::Superseded;
        }
        self.loading = false;
        self.error = Some(LOAD_FAILED_MESSAGE.to_string());
        FetchOutcome::Failed
    }

    pub async fn fetch(&mut self, client: &ApiClient, token: &SecretString) -> FetchOutcome {
        let seq = self.begin_fetch();
        let result = client.fetch_members(token).await;
        self.complete_fetch(seq, result)
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.displayed = filter_items(&self.all, &self.query);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn member(id: u64, nicename: &str) -> Member {
        Member {
            id,
            user_nicename: Some(nicename.to_string()),
            user_display_name: None,
            user_email: None,
            ds_profession: None,
            ds_batch: None,
            ds_profile_pic: None,
        }
    }

    #[test]
    fn test_search_on_nicename() {
        let mut store = PeopleStore::new();
        let seq = store.begin_fetch();
        store.complete_fetch(seq, Ok(vec![member(1, "asha"), member(2, "ravi-kumar")]));
        store.set_query("KUMAR");
        let ids: Vec<u64> = store.displayed().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2]);
        store.set_query(" ");
        assert_eq!(store.displayed().len(), 2);
    }

    #[test]
    fn test_failure_sets_fixed_message() {
        let mut store = PeopleStore::new();
        let seq = store.begin_fetch();
        let outcome = store.complete_fetch(seq, Err(ApiError::HttpStatus(401)));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(store.error(), Some(LOAD_FAILED_MESSAGE));
        assert!(!store.is_loading());
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut store = PeopleStore::new();
        let old = store.begin_fetch();
        let new = store.begin_fetch();
        store.complete_fetch(new, Ok(vec![member(2, "new")]));
        assert_eq!(
            store.complete_fetch(old, Ok(vec![member(1, "old")])),
            FetchOutcome::Superseded
        );
        assert_eq!(store.all()[0].id, 2);
    }

    #[tokio::test]
    async fn test_fetch_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(header("Api-Token", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 5, "user_nicename": "asha", "user_display_name": "Asha"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        let client = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();

        let mut store = PeopleStore::new();
        let outcome = store
            .fetch(&client, &SecretString::from("tok".to_string()))
            .await;
        assert_eq!(outcome, FetchOutcome::Applied);
        assert_eq!(store.displayed()[0].user_display_name.as_deref(), Some("Asha"));
    }

    #[test]
    fn test_abandoned_fetch_clears_loading() {
        let mut store = PeopleStore::new();
        let old = store.begin_fetch();
        let new = store.begin_fetch();
        assert_eq!(store.abandon_fetch(old), FetchOutcome::Superseded);
        assert!(store.is_loading());

        assert_eq!(store.abandon_fetch(new), FetchOutcome::Failed);
        assert!(!store.is_loading());
        assert_eq!(store.error(), Some(LOAD_FAILED_MESSAGE));
    }
}
