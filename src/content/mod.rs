//! Post body rendering.
//!
//! WordPress sends `post_content` as HTML; [`render_html`] turns it into
//! styled ratatui lines once per post so the detail view only scrolls.

mod html;

pub use html::{render_html, RenderedBody};
