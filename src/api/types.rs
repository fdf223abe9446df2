use super::de;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Posts
// ============================================================================

/// A news post as returned by `GET /posts` and `GET /posts/<id>`.
///
/// Only `id` is mandatory; every other field may be absent and rendering
/// code has to handle that explicitly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    #[serde(rename = "ID", deserialize_with = "de::id")]
    pub id: u64,
    #[serde(rename = "post_title", default, deserialize_with = "de::lenient_string")]
    pub title: Option<String>,
    #[serde(rename = "post_date", default, deserialize_with = "de::lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_vec")]
    pub categories: Vec<PostCategory>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub featured_image: Option<FeaturedImage>,
    #[serde(rename = "post_content", default, deserialize_with = "de::lenient_string")]
    pub content: Option<String>,
}

impl Post {
    /// Title for display, empty when the server sent none.
    pub fn title_or_blank(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Publication time parsed from WordPress' `YYYY-MM-DD HH:MM:SS` format.
    pub fn published(&self) -> Option<NaiveDateTime> {
        let raw = self.date.as_deref()?.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }

    /// Publication date as "Month D, YYYY" (e.g. "May 4, 2024").
    pub fn formatted_date(&self) -> Option<String> {
        self.published()
            .map(|dt| dt.format("%B %-d, %Y").to_string())
    }

    /// Name of the first category, shown as the detail badge.
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().and_then(|c| c.name.as_deref())
    }

    /// Featured image URL at the given size.
    pub fn image(&self, size: &str) -> Option<&str> {
        self.featured_image.as_ref().and_then(|img| img.size(size))
    }
}

/// Category attached to a post.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostCategory {
    #[serde(default, deserialize_with = "de::optional_id")]
    pub term_id: Option<u64>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub slug: Option<String>,
}

/// Featured image renditions keyed by WordPress size name
/// (`thumbnail`, `medium`, `medium_large`, `large`, `full`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct FeaturedImage {
    sizes: BTreeMap<String, serde_json::Value>,
}

impl FeaturedImage {
    /// URL for a size, if present and a non-empty string.
    pub fn size(&self, name: &str) -> Option<&str> {
        self.sizes
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

// ============================================================================
// Members
// ============================================================================

/// Row of the member directory (`GET /users`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Member {
    #[serde(alias = "ID", deserialize_with = "de::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub user_nicename: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub user_display_name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_profession: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_batch: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_profile_pic: Option<String>,
}

impl Member {
    /// Display name, falling back to the nicename.
    pub fn name(&self) -> &str {
        self.user_display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.user_nicename.as_deref())
            .unwrap_or("")
    }
}

/// Full member record (`GET /users?id=<id>`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MemberDetail {
    #[serde(default, deserialize_with = "de::lenient")]
    pub user: Option<MemberUser>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub user_meta: Option<MemberMeta>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MemberUser {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub user_nicename: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub user_display_name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_batch: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_profession: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_profile_pic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MemberMeta {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_res_mobile: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_off_mobile: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_res_address: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_res_city: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_res_state: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub ds_res_pin: Option<String>,
}

impl MemberDetail {
    /// Display name, then "First Last", then the nicename.
    pub fn name(&self) -> String {
        let user = self.user.as_ref();
        if let Some(name) = user
            .and_then(|u| u.user_display_name.as_deref())
            .filter(|s| !s.trim().is_empty())
        {
            return name.to_string();
        }
        let full = self
            .user_meta
            .as_ref()
            .map(|m| {
                format!(
                    "{} {}",
                    m.first_name.as_deref().unwrap_or(""),
                    m.last_name.as_deref().unwrap_or("")
                )
                .trim()
                .to_string()
            })
            .unwrap_or_default();
        if !full.is_empty() {
            return full;
        }
        user.and_then(|u| u.user_nicename.clone()).unwrap_or_default()
    }
}

impl MemberMeta {
    /// Residential address parts joined with commas, skipping absent parts.
    pub fn address(&self) -> Option<String> {
        let parts: Vec<&str> = [
            &self.ds_res_address,
            &self.ds_res_city,
            &self.ds_res_state,
            &self.ds_res_pin,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

// ============================================================================
// Session payloads
// ============================================================================

/// Login response, persisted verbatim as the `user` session key.
///
/// Unknown fields are kept in `extra` so a save after a profile update
/// writes back everything the server originally sent.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub user: UserProfile,
    #[serde(default)]
    pub user_meta: UserMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ds_res_mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The token is a credential and never shows up in debug output.
impl std::fmt::Debug for SessionUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionUser")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .field("user_meta", &self.user_meta)
            .field("ds_res_mobile", &self.ds_res_mobile)
            .field("country_code", &self.country_code)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_nicename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ds_batch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ds_profession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ds_profile_pic: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Overlay the string fields of a `POST /me` response onto this profile.
    ///
    /// Keys that map to known fields update them; the rest land in `extra`.
    pub fn merge(&mut self, update: &serde_json::Map<String, serde_json::Value>) {
        for (key, value) in update {
            let text = value.as_str().map(str::to_string);
            match key.as_str() {
                "user_nicename" => self.user_nicename = text,
                "user_display_name" => self.user_display_name = text,
                "user_email" => self.user_email = text,
                "ds_batch" => self.ds_batch = text,
                "ds_profession" => self.ds_profession = text,
                "ds_profile_pic" => self.ds_profile_pic = text,
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `POST /me`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub ds_batch: String,
    pub ds_res_mobile: String,
    pub user_email: String,
}
