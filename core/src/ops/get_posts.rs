use chrono::{DateTime, Utc};

use crate::client::PinboardClient;
use crate::error::{Result, ValidationError};
use crate::params::Params;
use crate::parse;
use crate::types::Post;
use crate::validate::{parse_tags_limited, ValidationLog};

/// Builder for `posts/get`: one day's posts, or the post for a URL.
///
/// With no filters the service returns the posts from the most recent day
/// that has any.
#[derive(Debug, Clone)]
#[must_use = "call .send() to fetch the posts"]
pub struct GetPosts<'a> {
    client: &'a PinboardClient,
    url: Option<String>,
    tags: Option<Vec<String>>,
    meta: Option<bool>,
    time: Option<DateTime<Utc>>,
    errors: ValidationLog,
}

impl<'a> GetPosts<'a> {
    pub(crate) fn new(client: &'a PinboardClient) -> Self {
        Self {
            client,
            url: None,
            tags: None,
            meta: None,
            time: None,
            errors: ValidationLog::default(),
        }
    }

    pub fn url(mut self, url: &str) -> Self {
        let checked = self.client.config().validator().validate_url(url);
        if self.errors.record(checked).is_some() {
            self.url = Some(url.to_string());
        }
        self
    }

    /// Up to `Limits::read_tags` space-delimited tags to filter by.
    pub fn tags(mut self, tags: &str) -> Self {
        let limit = self.client.config().limits().read_tags;
        if let Some(tags) = self.errors.record(parse_tags_limited(tags, limit)) {
            self.tags = Some(tags);
        }
        self
    }

    /// Include the change-detection `meta` hash.
    pub fn meta(mut self, meta: bool) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Return the posts saved on this date.
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// The parameter set, or the first validation error recorded.
    pub fn params(&self) -> std::result::Result<Params, ValidationError> {
        let mut params = Params::new();
        params
            .set_opt("url", self.url.clone())
            .set_opt("tag", self.tags.as_ref().filter(|t| !t.is_empty()).map(|t| t.join(" ")))
            .set_opt("meta", self.meta)
            .set_opt("dt", self.time);
        self.errors.finish(params)
    }

    pub fn send(self) -> Result<Vec<Post>> {
        let params = self.params()?;
        let value = self.client.call("posts/get", &params)?;
        parse::posts(&value, Some("posts"), self.client.config().parse_mode())
    }
}
