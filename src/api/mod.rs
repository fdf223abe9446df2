//! Sarvail REST API: HTTP client and wire types.
//!
//! Wire types are deliberately forgiving. WordPress returns `false` for
//! missing images, wraps user meta in single-element arrays and sends ids as
//! strings; all of that is absorbed in [`de`] so the rest of the crate sees
//! plain `Option`s.

mod client;
mod de;
mod types;

pub use client::{ApiClient, ApiError, DEFAULT_BASE_URL};
pub use types::{
    FeaturedImage, Member, MemberDetail, MemberMeta, MemberUser, Post, PostCategory,
    ProfileUpdate, SessionUser, UserMeta, UserProfile,
};
