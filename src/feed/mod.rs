//! News feed state: category catalog, search filter, scroll tracking and store.
//!
//! - [`catalog`] - the fixed set of category chips and the current selection
//! - [`filter`] - case-insensitive substring filter, also used by the directory
//! - [`scroll`] - scroll-direction reducer that drives search bar visibility
//! - [`store`] - fetched items, displayed subset and carousel slice
//!
//! Data flows one way: a selection change issues a [`FetchRequest`], its
//! response lands in the [`FeedStore`], and the displayed list is recomputed
//! from the stored items and the current query.

mod catalog;
mod filter;
mod scroll;
mod store;

pub use catalog::{CategoryKey, CategorySelection};
pub use filter::{filter_items, Searchable};
pub use scroll::{reduce, Affordance, ScrollState, ScrollTracker};
pub use store::{FeedStore, FetchOutcome, FetchRequest};
