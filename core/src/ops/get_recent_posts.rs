use crate::client::PinboardClient;
use crate::error::{Result, ValidationError};
use crate::params::Params;
use crate::parse;
use crate::types::Post;
use crate::validate::{parse_tags_limited, ValidationLog};

/// Builder for `posts/recent`.
#[derive(Debug, Clone)]
#[must_use = "call .send() to fetch the posts"]
pub struct GetRecentPosts<'a> {
    client: &'a PinboardClient,
    tags: Option<Vec<String>>,
    count: Option<u32>,
    errors: ValidationLog,
}

impl<'a> GetRecentPosts<'a> {
    pub(crate) fn new(client: &'a PinboardClient) -> Self {
        Self {
            client,
            tags: None,
            count: None,
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

    /// Number of posts to return. Zero means the default; the cap is
    /// `Limits::recent_max`.
    pub fn count(mut self, count: u32) -> Self {
        let max = self.client.config().limits().recent_max;
        if count > max {
            self.errors.record::<()>(Err(ValidationError::TooManyResults { limit: max }));
        } else if count > 0 {
            self.count = Some(count);
        }
        self
    }

    /// The parameter set, or the first validation error recorded.
    pub fn params(&self) -> std::result::Result<Params, ValidationError> {
        let count = self
            .count
            .unwrap_or(self.client.config().limits().recent_default);
        let mut params = Params::new();
        params
            .set_opt("tag", self.tags.as_ref().filter(|t| !t.is_empty()).map(|t| t.join(" ")))
            .set("count", count);
        self.errors.finish(params)
    }

    pub fn send(self) -> Result<Vec<Post>> {
        let params = self.params()?;
        let value = self.client.call("posts/recent", &params)?;
        parse::posts(&value, Some("posts"), self.client.config().parse_mode())
    }
}
