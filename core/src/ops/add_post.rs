use chrono::{DateTime, Utc};

use crate::client::PinboardClient;
use crate::error::{Result, ValidationError};
use crate::params::Params;
use crate::parse;
use crate::validate::{parse_tags_limited, ValidationLog};

/// Builder for `posts/add`.
#[derive(Debug, Clone)]
#[must_use = "call .send() to save the post"]
pub struct AddPost<'a> {
    client: &'a PinboardClient,
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    replace: Option<bool>,
    shared: Option<bool>,
    to_read: Option<bool>,
    time: Option<DateTime<Utc>>,
    errors: ValidationLog,
}

impl<'a> AddPost<'a> {
    pub(crate) fn new(client: &'a PinboardClient) -> Self {
        Self {
            client,
            url: None,
            title: None,
            description: None,
            tags: None,
            replace: None,
            shared: None,
            to_read: None,
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

    /// Title of the bookmark; must not be empty.
    pub fn title(mut self, title: &str) -> Self {
        if title.is_empty() {
            self.errors.record::<()>(Err(ValidationError::InvalidTitle(title.to_string())));
        } else {
            self.title = Some(title.to_string());
        }
        self
    }

    /// Extended notes.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Space-delimited tags, at most `Limits::add_tags` of them.
    pub fn tags(mut self, tags: &str) -> Self {
        let limit = self.client.config().limits().add_tags;
        if let Some(tags) = self.errors.record(parse_tags_limited(tags, limit)) {
            self.tags = Some(tags);
        }
        self
    }

    /// Overwrite an existing bookmark for the same URL.
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = Some(replace);
        self
    }

    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn to_read(mut self, to_read: bool) -> Self {
        self.to_read = Some(to_read);
        self
    }

    /// Creation time to record instead of "now".
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// The parameter set, or the first validation error recorded.
    pub fn params(&self) -> std::result::Result<Params, ValidationError> {
        let mut params = Params::new();
        params
            .set("url", self.url.clone().unwrap_or_default())
            .set("description", self.title.clone().unwrap_or_default())
            .set_opt("extended", self.description.clone().filter(|d| !d.is_empty()))
            .set_opt("tags", self.tags.as_ref().filter(|t| !t.is_empty()).map(|t| t.join(" ")))
            .set_opt("replace", self.replace)
            .set_opt("shared", self.shared)
            .set_opt("toread", self.to_read)
            .set_opt("dt", self.time);
        self.errors.finish(params)
    }

    pub fn send(self) -> Result<()> {
        let params = self.params()?;
        let value = self.client.call("posts/add", &params)?;
        parse::result_code(&value, self.client.config().result_done())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use crate::error::ApiError;
    use crate::testing::{query, query_value, stub_client};

    use super::*;

    const DONE: &str = r#"{"result_code":"done"}"#;

    #[test]
    fn add_with_tags_succeeds() {
        let (client, seen) = stub_client(200, DONE);
        client
            .add_post_with("https://example.com", "Title")
            .tags("a b c")
            .send()
            .unwrap();

        assert!(seen.lock().unwrap()[0].url.contains("/v1/posts/add?"));
        assert_eq!(
            query(&seen, 0),
            vec![
                ("auth_token".to_string(), "alice:SECRET".to_string()),
                ("description".to_string(), "Title".to_string()),
                ("format".to_string(), "json".to_string()),
                ("tags".to_string(), "a b c".to_string()),
                ("url".to_string(), "https://example.com".to_string()),
            ]
        );
    }

    #[test]
    fn rate_limited_is_surfaced() {
        let (client, _) = stub_client(429, "");
        let err = client
            .add_post_with("https://example.com", "Title")
            .tags("a b c")
            .send()
            .unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
    }

    #[test]
    fn first_error_wins_and_no_request_is_made() {
        let (client, seen) = stub_client(200, DONE);
        let err = client
            .add_post_with("bad", "Title")
            .tags("a\tb")
            .send()
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::InvalidUrl(ref u)) if u == "bad"
        ));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_title_is_rejected() {
        let (client, _) = stub_client(200, DONE);
        let err = client.add_post_with("https://example.com", "").params().unwrap_err();
        assert_eq!(err, ValidationError::InvalidTitle(String::new()));
    }

    #[test]
    fn tag_cap_is_one_hundred() {
        let (client, _) = stub_client(200, DONE);
        let hundred = vec!["t"; 100].join(" ");
        assert!(client.add_post_with("https://example.com", "T").tags(&hundred).params().is_ok());

        let too_many = vec!["t"; 101].join(" ");
        let err = client
            .add_post_with("https://example.com", "T")
            .tags(&too_many)
            .params()
            .unwrap_err();
        assert_eq!(err, ValidationError::TooManyTags { limit: 100 });
    }

    #[test]
    fn optional_fields_only_when_set() {
        let (client, _) = stub_client(200, DONE);
        let params = client.add_post_with("https://example.com", "T").params().unwrap();
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["description", "url"]);

        let when = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let params = client
            .add_post_with("https://example.com", "T")
            .description("notes")
            .replace(false)
            .shared(true)
            .to_read(false)
            .time(when)
            .params()
            .unwrap();
        assert_eq!(params.get("replace").unwrap().encode(), "no");
        assert_eq!(params.get("shared").unwrap().encode(), "yes");
        assert_eq!(params.get("toread").unwrap().encode(), "no");
        assert_eq!(params.get("dt").unwrap().encode(), "2024-03-01T12:00:00Z");
        assert_eq!(params.get("extended").unwrap().encode(), "notes");
    }

    #[test]
    fn service_error_code_is_returned() {
        let (client, seen) = stub_client(200, r#"{"result_code":"missing url"}"#);
        let err = client.add_post("https://example.com", "T").unwrap_err();
        assert!(matches!(err, ApiError::OperationFailed(ref c) if c == "missing url"));
        assert_eq!(query_value(&seen, 0, "url").as_deref(), Some("https://example.com"));
    }
}
