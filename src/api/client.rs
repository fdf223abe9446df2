use super::types::{Member, MemberDetail, Post, ProfileUpdate, SessionUser};
use crate::feed::CategoryKey;
use crate::util::{validate_base_url, UrlValidationError};
use futures::StreamExt;
use reqwest::redirect::Policy;
use reqwest::{header, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Production endpoint of the Sarvail custom WordPress routes.
pub const DEFAULT_BASE_URL: &str = "https://sarvail.net/wp-json/ds-custom_endpoints/v1";

/// Header carrying the bearer token on authenticated routes.
const TOKEN_HEADER: &str = "Api-Token";

const MAX_RESPONSE_SIZE: usize = 8 * 1024 * 1024; // 8MB

/// Errors from talking to the Sarvail API.
///
/// `Network`, `Timeout` and `HttpStatus` are the transport/status failures the
/// screens collapse into a single "unavailable" message; `Decode` is only
/// raised when the top-level shape is wrong (field-level oddities are
/// tolerated by the lenient deserializers).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidUrl(#[from] UrlValidationError),
}

impl ApiError {
    /// True for authentication/authorization rejections (401, 403).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::HttpStatus(401) | ApiError::HttpStatus(403))
    }
}

/// Redirect policy: at most 3 hops, no loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }
        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }
        tracing::debug!(to = %url, hop = attempt.previous().len() + 1, "Following redirect");
        attempt.follow()
    })
}

/// Client for the Sarvail REST endpoints.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted, so
/// background tasks take their own copy.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client with pooled connections against `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(timeout)
            .build()?;
        Self::with_client(http, base_url, timeout)
    }

    /// Use an existing `reqwest::Client` (tests share one across mock servers).
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base = validate_base_url(base_url)?;
        Ok(Self {
            http,
            base: base.as_str().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    // ------------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------------

    /// `GET /posts?per_page=N[&category=a,b]`.
    ///
    /// An empty category list means "all categories" and omits the parameter.
    pub async fn fetch_posts(
        &self,
        categories: &[CategoryKey],
        per_page: u32,
    ) -> Result<Vec<Post>, ApiError> {
        let url = posts_url(&self.base, categories, per_page);
        tracing::debug!(url = %url, "Fetching feed");
        let posts: Vec<Post> = self.get_json(self.http.get(&url)).await?;
        tracing::info!(count = posts.len(), categories = categories.len(), "Feed fetched");
        Ok(posts)
    }

    /// `GET /posts/<id>`.
    pub async fn fetch_post(&self, id: u64) -> Result<Post, ApiError> {
        let url = format!("{}/posts/{}", self.base, id);
        self.get_json(self.http.get(&url)).await
    }

    // ------------------------------------------------------------------------
    // Authentication and profile
    // ------------------------------------------------------------------------

    /// `POST /login` with `{username, password}`.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<SessionUser, ApiError> {
        #[derive(Serialize)]
        struct LoginBody<'a> {
            username: &'a str,
            password: &'a str,
        }

        let url = format!("{}/login", self.base);
        let body = LoginBody {
            username,
            password: password.expose_secret(),
        };
        let request = self.json_body(self.http.post(&url), &body)?;
        self.get_json(request).await
    }

    /// `GET /users` (member directory).
    pub async fn fetch_members(&self, token: &SecretString) -> Result<Vec<Member>, ApiError> {
        let url = format!("{}/users", self.base);
        let members: Vec<Member> = self
            .get_json(authorize(self.http.get(&url), token))
            .await?;
        tracing::info!(count = members.len(), "Member directory fetched");
        Ok(members)
    }

    /// `GET /users?id=<id>`.
    pub async fn fetch_member(
        &self,
        token: &SecretString,
        id: u64,
    ) -> Result<MemberDetail, ApiError> {
        let url = format!("{}/users?id={}", self.base, id);
        self.get_json(authorize(self.http.get(&url), token)).await
    }

    /// `POST /me`; returns the updated fields as a raw object for merging.
    pub async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ApiError> {
        let url = format!("{}/me", self.base);
        let request = self.json_body(authorize(self.http.post(&url), token), update)?;
        self.get_json(request).await
    }

    /// `PUT /me` with `{ds_profile_pic}`; returns the stored picture URL.
    pub async fn update_profile_picture(
        &self,
        token: &SecretString,
        picture: &str,
    ) -> Result<Option<String>, ApiError> {
        #[derive(serde::Deserialize)]
        struct PictureResponse {
            #[serde(default, deserialize_with = "super::de::lenient_string")]
            ds_profile_pic: Option<String>,
        }

        let url = format!("{}/me", self.base);
        let body = serde_json::json!({ "ds_profile_pic": picture });
        let request = self.json_body(
            authorize(self.http.request(Method::PUT, &url), token),
            &body,
        )?;
        let response: PictureResponse = self.get_json(request).await?;
        Ok(response.ds_profile_pic)
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    fn json_body<T: Serialize + ?Sized>(
        &self,
        request: RequestBuilder,
        body: &T,
    ) -> Result<RequestBuilder, ApiError> {
        let bytes = serde_json::to_vec(body)?;
        Ok(request
            .header(header::CONTENT_TYPE, "application/json")
            .body(bytes))
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let bytes = self.send(request).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))?
            .map_err(ApiError::Network)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, url = %response.url(), "Request rejected");
            return Err(ApiError::HttpStatus(status.as_u16()));
        }

        read_limited_bytes(response, MAX_RESPONSE_SIZE).await
    }
}

fn authorize(request: RequestBuilder, token: &SecretString) -> RequestBuilder {
    request.header(TOKEN_HEADER, format!("Bearer {}", token.expose_secret()))
}

/// Build the feed URL. Category slugs are plain ASCII, so the comma-joined
/// list is written as-is rather than percent-encoded.
pub(crate) fn posts_url(base: &str, categories: &[CategoryKey], per_page: u32) -> String {
    let mut url = format!("{}/posts?per_page={}", base, per_page);
    if !categories.is_empty() {
        let joined: Vec<&str> = categories.iter().map(|c| c.slug()).collect();
        url.push_str("&category=");
        url.push_str(&joined.join(","));
    }
    url
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
