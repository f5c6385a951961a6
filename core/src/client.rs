//! Domain client facade for the bookmarking API.
//!
//! # Design
//! `PinboardClient` holds only immutable state: configuration, credentials,
//! a shared `Transport` and an optional cancellation token. It is cheap to
//! clone and safe to share between threads; every call builds its own
//! parameter set and performs one independent GET.
//!
//! A call is split the same way throughout: `build_request` turns an
//! operation and its `Params` into a plain `HttpRequest`, the transport runs
//! it, `check_status` applies the status-code policy, and the `parse` module
//! turns the decoded tree into the typed result.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::ops::{AddPost, GetAllPosts, GetPosts, GetRecentPosts};
use crate::params::Params;
use crate::parse;
use crate::transport::{CancelToken, Transport, UreqTransport};
use crate::types::{DateCount, Post, SuggestedTags, TagCount};
use crate::validate::validate_tag;

const ENV_TOKEN: &str = "PINBOARD_TOKEN";
const ENV_USERNAME: &str = "PINBOARD_USERNAME";
const ENV_PASSWORD: &str = "PINBOARD_PASSWORD";

#[derive(Clone)]
pub struct PinboardClient {
    config: ClientConfig,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    cancel: Option<CancelToken>,
}

impl fmt::Debug for PinboardClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinboardClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl PinboardClient {
    /// Client authenticating with a `username:secret` API token.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::default(), Credentials::token(token))
    }

    /// Client authenticating with basic auth.
    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::default(), Credentials::password(username, password))
    }

    /// Client using the default blocking transport with `config.timeout()`.
    pub fn with_config(config: ClientConfig, credentials: Credentials) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self {
            config,
            credentials,
            transport: Arc::new(transport),
            cancel: None,
        }
    }

    /// Configuration and credentials from `PINBOARD_*` environment variables.
    ///
    /// `PINBOARD_TOKEN` wins over `PINBOARD_USERNAME` + `PINBOARD_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        let credentials = match std::env::var(ENV_TOKEN) {
            Ok(token) => Credentials::token(token),
            Err(_) => match (std::env::var(ENV_USERNAME), std::env::var(ENV_PASSWORD)) {
                (Ok(username), Ok(password)) => Credentials::password(username, password),
                _ => {
                    return Err(ApiError::Config(format!(
                        "set {ENV_TOKEN}, or {ENV_USERNAME} and {ENV_PASSWORD}"
                    )))
                }
            },
        };
        Ok(Self::with_config(config, credentials))
    }

    /// Replace the transport, e.g. with a stub in tests.
    #[must_use]
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Abort calls once `token` is cancelled.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    // -----------------------------------------------------------------------
    // Transport adapter
    // -----------------------------------------------------------------------

    /// Build the GET for `operation` with `params` plus the fixed parameters.
    pub fn build_request(&self, operation: &str, params: &Params) -> Result<HttpRequest> {
        build_request_with(&self.config, &self.credentials, operation, params)
    }

    /// Dispatch `operation` and return the decoded JSON tree.
    pub(crate) fn call(&self, operation: &str, params: &Params) -> Result<Value> {
        self.call_as(&self.credentials, operation, params)
    }

    fn call_as(
        &self,
        credentials: &Credentials,
        operation: &str,
        params: &Params,
    ) -> Result<Value> {
        if let Some(token) = &self.cancel {
            token.check()?;
        }
        let request = build_request_with(&self.config, credentials, operation, params)?;
        debug!(operation, params = ?params.keys().collect::<Vec<_>>(), "dispatching");

        let response = self.transport.execute(&request)?;
        debug!(operation, status = response.status, "response received");

        if let Some(token) = &self.cancel {
            token.check()?;
        }
        check_status(&response)?;
        parse::decode(&response.body)
    }

    fn call_done(&self, operation: &str, params: &Params) -> Result<()> {
        let value = self.call(operation, params)?;
        parse::result_code(&value, self.config.result_done())
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    /// Save `url` with `title` using default options.
    pub fn add_post(&self, url: &str, title: &str) -> Result<()> {
        self.add_post_with(url, title).send()
    }

    /// Fluent builder for saving a post.
    pub fn add_post_with(&self, url: &str, title: &str) -> AddPost<'_> {
        AddPost::new(self).url(url).title(title)
    }

    pub fn delete_post(&self, url: &str) -> Result<()> {
        self.config.validator().validate_url(url)?;
        let mut params = Params::new();
        params.set("url", url);
        self.call_done("posts/delete", &params)
    }

    /// The saved post for `url`, if any.
    pub fn get_post(&self, url: &str) -> Result<Option<Post>> {
        let posts = self.get_posts_with().url(url).send()?;
        Ok(posts.into_iter().next())
    }

    pub fn get_posts(&self) -> Result<Vec<Post>> {
        self.get_posts_with().send()
    }

    pub fn get_posts_with(&self) -> GetPosts<'_> {
        GetPosts::new(self)
    }

    pub fn get_recent_posts(&self) -> Result<Vec<Post>> {
        self.get_recent_posts_with().send()
    }

    pub fn get_recent_posts_with(&self) -> GetRecentPosts<'_> {
        GetRecentPosts::new(self)
    }

    pub fn get_all_posts(&self) -> Result<Vec<Post>> {
        self.get_all_posts_with().send()
    }

    pub fn get_all_posts_with(&self) -> GetAllPosts<'_> {
        GetAllPosts::new(self)
    }

    /// Posts per day, busiest day first.
    pub fn get_posts_at_dates(&self) -> Result<Vec<DateCount>> {
        let value = self.call("posts/dates", &Params::new())?;
        parse::date_counts(&value, self.config.parse_mode())
    }

    pub fn get_suggested_tags(&self, url: &str) -> Result<SuggestedTags> {
        self.config.validator().validate_url(url)?;
        let mut params = Params::new();
        params.set("url", url);
        let value = self.call("posts/suggest", &params)?;
        parse::suggested_tags(&value, self.config.parse_mode())
    }

    /// When any post was last added, changed or deleted.
    pub fn get_updated_time(&self) -> Result<DateTime<Utc>> {
        let value = self.call("posts/update", &Params::new())?;
        parse::timestamp_field(&value, "update_time")
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    /// Every tag in the account, most used first.
    pub fn get_all_tags(&self) -> Result<Vec<TagCount>> {
        let value = self.call("tags/get", &Params::new())?;
        parse::tag_counts(&value, self.config.parse_mode())
    }

    pub fn delete_tag(&self, tag: &str) -> Result<()> {
        validate_tag(tag)?;
        let mut params = Params::new();
        params.set("tag", tag);
        self.call_done("tags/delete", &params)
    }

    pub fn rename_tag(&self, old: &str, new: &str) -> Result<()> {
        validate_tag(old)?;
        validate_tag(new)?;
        let mut params = Params::new();
        params.set("old", old).set("new", new);
        self.call_done("tags/rename", &params)
    }

    // -----------------------------------------------------------------------
    // User
    // -----------------------------------------------------------------------

    /// Secret used to build private RSS feed URLs.
    pub fn get_user_secret(&self) -> Result<String> {
        let value = self.call("user/secret", &Params::new())?;
        parse::string_field(&value, "result")
    }

    /// Exchange a username and password for a `username:secret` API token.
    ///
    /// Uses basic auth for this call only, whatever credentials the client
    /// was built with.
    pub fn get_auth_token(&self, username: &str, password: &str) -> Result<String> {
        let credentials = Credentials::password(username, password);
        let value = self.call_as(&credentials, "user/api_token", &Params::new())?;
        let secret = parse::string_field(&value, "result")?;
        Ok(format!("{username}:{secret}"))
    }
}

fn build_request_with(
    config: &ClientConfig,
    credentials: &Credentials,
    operation: &str,
    params: &Params,
) -> Result<HttpRequest> {
    let mut merged = params.clone();
    merged.set("format", "json");
    if let Some(token) = credentials.auth_token() {
        merged.set("auth_token", token);
    }

    let mut url = config.operation_url(operation)?;
    url.set_query(Some(&merged.encode()));

    let headers = credentials
        .basic_auth()
        .map(|value| vec![("Authorization".to_string(), value)])
        .unwrap_or_default();

    Ok(HttpRequest {
        url: url.into(),
        headers,
    })
}

/// Map non-200 status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<()> {
    match response.status {
        200 => Ok(()),
        429 => {
            warn!("rate limited");
            Err(ApiError::RateLimited)
        }
        403 => {
            warn!("forbidden");
            Err(ApiError::Forbidden)
        }
        status => Err(ApiError::UnexpectedStatus {
            status,
            reason: response.reason().to_string(),
        }),
    }
}
