use chrono::{DateTime, Utc};

use crate::client::PinboardClient;
use crate::error::{Result, ValidationError};
use crate::params::Params;
use crate::parse;
use crate::types::Post;
use crate::validate::{parse_tags_limited, ValidationLog};

/// Builder for `posts/all`.
///
/// Without `results` the service returns every post in the account.
#[derive(Debug, Clone)]
#[must_use = "call .send() to fetch the posts"]
pub struct GetAllPosts<'a> {
    client: &'a PinboardClient,
    tags: Option<Vec<String>>,
    start: Option<u32>,
    results: Option<u32>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    meta: Option<bool>,
    errors: ValidationLog,
}

impl<'a> GetAllPosts<'a> {
    pub(crate) fn new(client: &'a PinboardClient) -> Self {
        Self {
            client,
            tags: None,
            start: None,
            results: None,
            from: None,
            to: None,
            meta: None,
            errors: ValidationLog::default(),
        }
    }

    /// Up to `Limits::read_tags` space-delimited tags to filter by.
    pub fn tags(mut self, tags: &str) -> Self {
        let limit = self.client.config().limits().read_tags;
        if let Some(tags) = self.errors.record(parse_tags_limited(tags, limit)) {
            self.tags = Some(tags);
        }
        self
    }

    /// Offset of the first post returned.
    pub fn start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    /// Maximum number of posts returned. Zero leaves the count to the
    /// service, which returns everything.
    pub fn results(mut self, results: u32) -> Self {
        self.results = Some(results).filter(|r| *r > 0);
        self
    }

    /// Only posts created at or after `from`.
    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Only posts created at or before `to`.
    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Include the change-detection `meta` hash (sent as `1` / `0`).
    pub fn meta(mut self, meta: bool) -> Self {
        self.meta = Some(meta);
        self
    }

    /// The parameter set, or the first validation error recorded.
    pub fn params(&self) -> std::result::Result<Params, ValidationError> {
        let mut params = Params::new();
        params
            .set_opt("tag", self.tags.as_ref().filter(|t| !t.is_empty()).map(|t| t.join(" ")))
            .set_opt("start", self.start)
            .set_opt("results", self.results)
            .set_opt("fromdt", self.from)
            .set_opt("todt", self.to)
            .set_opt("meta", self.meta.map(i64::from));
        self.errors.finish(params)
    }

    pub fn send(self) -> Result<Vec<Post>> {
        let params = self.params()?;
        let value = self.client.call("posts/all", &params)?;
        parse::posts(&value, None, self.client.config().parse_mode())
    }
}
