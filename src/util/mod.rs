//! Small helpers shared across layers.
//!
//! - **URL validation** for the API base URL and links opened in the browser
//! - **Text processing**: display width, truncation, terminal sanitizing

mod text;
mod url_validator;

pub use text::{
    collapse_whitespace, display_width, initial_of, strip_control_chars, truncate_to_width,
};
pub use url_validator::{validate_base_url, validate_url_for_open, UrlValidationError};

/// Maximum length of a search query typed into the feed or directory.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
