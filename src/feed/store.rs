use super::catalog::{CategoryKey, CategorySelection};
use super::filter::filter_items;
use crate::api::{ApiClient, ApiError, Post};
use std::sync::Arc;

/// Items shown in the promotional carousel: positions 1..4 of the feed.
const CAROUSEL_RANGE: std::ops::Range<usize> = 1..4;

/// A feed fetch issued by the store.
///
/// Carries a sequence number so that a response arriving after a newer
/// request was issued can be recognized and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub categories: Vec<CategoryKey>,
    pub per_page: u32,
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Items replaced with the response.
    Applied,
    /// Request failed; previous items kept and the error recorded.
    Failed,
    /// A newer request was issued before this one resolved; result discarded.
    Superseded,
}

/// In-memory state behind the news feed.
///
/// `all_items` is only ever replaced wholesale by a successful fetch and
/// `displayed` is always `filter_items(all_items, query)`.
#[derive(Debug, Clone)]
pub struct FeedStore {
    all_items: Arc<Vec<Arc<Post>>>,
    displayed: Vec<Arc<Post>>,
    carousel: Vec<Arc<Post>>,
    query: String,
    selection: CategorySelection,
    per_page: u32,
    loading: bool,
    error: Option<String>,
    /// Sequence number of the most recently issued request.
    latest_seq: u64,
}

impl FeedStore {
    pub fn new(per_page: u32) -> Self {
        Self::with_selection(per_page, CategorySelection::new())
    }

    /// A store whose chips start out selected, without issuing any request.
    pub fn with_selection(per_page: u32, selection: CategorySelection) -> Self {
        Self {
            all_items: Arc::new(Vec::new()),
            displayed: Vec::new(),
            carousel: Vec::new(),
            query: String::new(),
            selection,
            per_page,
            loading: false,
            error: None,
            latest_seq: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn all_items(&self) -> &[Arc<Post>] {
        &self.all_items
    }

    pub fn displayed(&self) -> &[Arc<Post>] {
        &self.displayed
    }

    pub fn carousel(&self) -> &[Arc<Post>] {
        &self.carousel
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selection(&self) -> &CategorySelection {
        &self.selection
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Toggle a category chip. Every change issues exactly one fetch.
    pub fn toggle_category(&mut self, key: CategoryKey) -> FetchRequest {
        let selected = self.selection.toggle(key);
        tracing::debug!(category = %key, selected, "Category toggled");
        self.begin_fetch()
    }

    /// Mark a fetch as in flight for the current selection.
    ///
    /// Existing items stay visible until the response arrives.
    pub fn begin_fetch(&mut self) -> FetchRequest {
        self.latest_seq = self.latest_seq.wrapping_add(1);
        self.loading = true;
        FetchRequest {
            seq: self.latest_seq,
            categories: self.selection.keys().to_vec(),
            per_page: self.per_page,
        }
    }

    /// Apply the result of the request numbered `seq`.
    ///
    /// Only the latest issued request touches the store; older ones are
    /// reported as superseded. The loading flag is cleared whenever the latest
    /// request resolves, whatever the outcome.
    pub fn complete_fetch(&mut self, seq: u64, result: Result<Vec<Post>, ApiError>) -> FetchOutcome {
        if seq != self.latest_seq {
            tracing::debug!(seq, latest = self.latest_seq, "Discarding superseded feed response");
            return FetchOutcome::Superseded;
        }
        self.loading = false;

        match result {
            Ok(posts) => {
                tracing::info!(count = posts.len(), seq, "Feed updated");
                self.all_items = Arc::new(posts.into_iter().map(Arc::new).collect());
                self.carousel = carousel_slice(&self.all_items);
                self.error = None;
                self.refilter();
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(error = %e, seq, "Feed fetch failed");
                self.error = Some(e.to_string());
                FetchOutcome::Failed
            }
        }
    }

    /// Give up on the request numbered `seq` without a response, e.g. when the
    /// task running it died. Clears the loading flag if it is the latest.
    pub fn abandon_fetch(&mut self, seq: u64, reason: &str) -> FetchOutcome {
        if seq != self.latest_seq {
            return FetchOutcome::Superseded;
        }
        self.loading = false;
        tracing::warn!(seq, reason, "Feed fetch abandoned");
        self.error = Some(reason.to_string());
        FetchOutcome::Failed
    }

    /// Issue a fetch and wait for it.
    pub async fn fetch_feed(&mut self, client: &ApiClient) -> FetchOutcome {
        let request = self.begin_fetch();
        let result = client
            .fetch_posts(&request.categories, request.per_page)
            .await;
        self.complete_fetch(request.seq, result)
    }

    /// Replace the search query and recompute the displayed list.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.displayed = filter_items(&self.all_items, &self.query);
    }
}

fn carousel_slice(items: &[Arc<Post>]) -> Vec<Arc<Post>> {
    let start = CAROUSEL_RANGE.start.min(items.len());
    let end = CAROUSEL_RANGE.end.min(items.len());
    items[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn post(id: u64, title: &str) -> Post {
        Post {
            id,
            title: Some(title.to_string()),
            date: None,
            categories: Vec::new(),
            featured_image: None,
            content: None,
        }
    }

    fn posts(n: u64) -> Vec<Post> {
        (0..n).map(|i| post(i, &format!("Post {}", i))).collect()
    }

    fn ids(items: &[Arc<Post>]) -> Vec<u64> {
        items.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = FeedStore::new(10);
        assert!(store.all_items().is_empty());
        assert!(store.displayed().is_empty());
        assert!(store.carousel().is_empty());
        assert!(!store.is_loading());
        assert!(store.error().is_none());
    }

    #[test]
    fn test_carousel_slice_sizes() {
        for (n, expected) in [
            (0u64, vec![]),
            (1, vec![]),
            (2, vec![1]),
            (3, vec![1, 2]),
            (4, vec![1, 2, 3]),
            (10, vec![1, 2, 3]),
        ] {
            let mut store = FeedStore::new(10);
            let req = store.begin_fetch();
            store.complete_fetch(req.seq, Ok(posts(n)));
            assert_eq!(ids(store.carousel()), expected, "n = {}", n);
        }
    }

    #[test]
    fn test_begin_fetch_keeps_items_and_sets_loading() {
        let mut store = FeedStore::new(10);
        let req = store.begin_fetch();
        store.complete_fetch(req.seq, Ok(posts(3)));

        store.begin_fetch();
        assert!(store.is_loading());
        assert_eq!(store.all_items().len(), 3);
        assert_eq!(store.displayed().len(), 3);
    }

    #[test]
    fn test_failed_fetch_keeps_previous_items() {
        let mut store = FeedStore::new(10);
        let req = store.begin_fetch();
        store.complete_fetch(req.seq, Ok(posts(2)));

        let req = store.begin_fetch();
        let outcome = store.complete_fetch(req.seq, Err(ApiError::HttpStatus(500)));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(ids(store.all_items()), vec![0, 1]);
        assert!(store.error().is_some());
        assert!(!store.is_loading());
    }

    #[test]
    fn test_success_clears_previous_error() {
        let mut store = FeedStore::new(10);
        let req = store.begin_fetch();
        store.complete_fetch(req.seq, Err(ApiError::HttpStatus(502)));
        assert!(store.error().is_some());

        let req = store.begin_fetch();
        store.complete_fetch(req.seq, Ok(posts(1)));
        assert!(store.error().is_none());
    }

    #[test]
    fn test_fetch_keeps_current_query() {
        let mut store = FeedStore::new(10);
        store.set_query("meet");
        let req = store.begin_fetch();
        store.complete_fetch(
            req.seq,
            Ok(vec![post(1, "Alumni Meet 2024"), post(2, "School Trip")]),
        );
        assert_eq!(store.query(), "meet");
        assert_eq!(ids(store.displayed()), vec![1]);
        // Carousel is taken from the unfiltered feed.
        assert_eq!(ids(store.carousel()), vec![2]);
    }

    #[test]
    fn test_set_query_refilters() {
        let mut store = FeedStore::new(10);
        let req = store.begin_fetch();
        store.complete_fetch(req.seq, Ok(vec![post(1, "Reunion 1998"), post(2, "Events")]));
        store.set_query("REUNION");
        assert_eq!(ids(store.displayed()), vec![1]);
        store.set_query("");
        assert_eq!(ids(store.displayed()), vec![1, 2]);
    }

    #[test]
    fn test_replacement_is_wholesale() {
        let mut store = FeedStore::new(10);
        let req = store.begin_fetch();
        store.complete_fetch(req.seq, Ok(posts(5)));
        let req = store.begin_fetch();
        store.complete_fetch(req.seq, Ok(vec![post(99, "Only")]));
        assert_eq!(ids(store.all_items()), vec![99]);
    }

    // Newest request wins regardless of resolution order.
    #[test]
    fn test_superseded_response_is_discarded() {
        let mut store = FeedStore::new(10);
        let first = store.begin_fetch();
        let second = store.begin_fetch();

        assert_eq!(
            store.complete_fetch(second.seq, Ok(vec![post(2, "new")])),
            FetchOutcome::Applied
        );
        assert_eq!(
            store.complete_fetch(first.seq, Ok(vec![post(1, "old")])),
            FetchOutcome::Superseded
        );
        assert_eq!(ids(store.all_items()), vec![2]);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_superseded_response_does_not_clear_loading() {
        let mut store = FeedStore::new(10);
        let first = store.begin_fetch();
        let _second = store.begin_fetch();
        store.complete_fetch(first.seq, Err(ApiError::HttpStatus(500)));
        assert!(store.is_loading());
        assert!(store.error().is_none());
    }

    #[test]
    fn test_toggle_category_issues_one_request_each() {
        let mut store = FeedStore::new(10);
        let a = store.toggle_category(CategoryKey::Events);
        let b = store.toggle_category(CategoryKey::Reunions);
        let c = store.toggle_category(CategoryKey::Events);
        assert_eq!(a.categories, vec![CategoryKey::Events]);
        assert_eq!(b.categories, vec![CategoryKey::Events, CategoryKey::Reunions]);
        assert_eq!(c.categories, vec![CategoryKey::Reunions]);
        assert_eq!((a.seq, b.seq, c.seq), (1, 2, 3));
        assert_eq!(c.per_page, 10);
    }

    #[test]
    fn test_abandoned_latest_fetch_clears_loading() {
        let mut store = FeedStore::new(10);
        let first = store.begin_fetch();
        store.complete_fetch(first.seq, Ok(posts(2)));
        let second = store.begin_fetch();

        assert_eq!(store.abandon_fetch(second.seq, "task died"), FetchOutcome::Failed);
        assert!(!store.is_loading());
        assert_eq!(store.error(), Some("task died"));
        assert_eq!(store.all_items().len(), 2);
    }

    #[test]
    fn test_abandoning_older_fetch_keeps_loading() {
        let mut store = FeedStore::new(10);
        let first = store.begin_fetch();
        let _second = store.begin_fetch();
        assert_eq!(store.abandon_fetch(first.seq, "task died"), FetchOutcome::Superseded);
        assert!(store.is_loading());
        assert!(store.error().is_none());
    }

    #[test]
    fn test_with_selection_issues_nothing_until_fetch() {
        let selection: CategorySelection = [CategoryKey::Events, CategoryKey::Reunions, CategoryKey::Events]
            .into_iter()
            .collect();
        let mut store = FeedStore::with_selection(10, selection);
        assert!(!store.is_loading());

        let request = store.begin_fetch();
        assert_eq!(request.seq, 1);
        assert_eq!(request.categories, vec![CategoryKey::Events, CategoryKey::Reunions]);
    }
}
