//! Case-insensitive title filtering shared by the feed and the member directory.
use crate::api::{Member, Post};
use std::sync::Arc;

/// Something that can be matched against a search query.
pub trait Searchable {
    /// Text the query is matched against; `None` never matches a non-empty query.
    fn search_text(&self) -> Option<&str>;
}

impl Searchable for Post {
    fn search_text(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Members are searched by their login slug, like the web directory.
impl Searchable for Member {
    fn search_text(&self) -> Option<&str> {
        self.user_nicename.as_deref()
    }
}

impl<T: Searchable + ?Sized> Searchable for Arc<T> {
    fn search_text(&self) -> Option<&str> {
        (**self).search_text()
    }
}

/// Return the items whose search text contains `query`, ignoring case.
///
/// A query that is empty after trimming returns every item. Matching is plain
/// substring containment and the input order is kept. Every call rescans the
/// full list.
pub fn filter_items<T: Searchable + Clone>(items: &[T], query: &str) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| {
            item.search_text()
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}
