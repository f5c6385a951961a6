//! Domain records returned by the bookmarking API.
//!
//! # Design
//! `Post` has two JSON shapes. Its serde derive is the library's own shape
//! (`href`, `title`, `tags` as an array, real booleans), which is what
//! `Post::parse` accepts. The service's wire shape (`description` holds the
//! title, `extended` the notes, booleans as `"yes"`/`"no"`, tags space
//! delimited) is handled by `parse::post_from_record` and its inverse
//! `Post::to_api_record`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{ApiError, Result};
use crate::params::{yes_no, TIMESTAMP_FORMAT};
use crate::validate::validate_tag;

/// A saved bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "href", default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "hash", default)]
    pub content_hash: String,
    #[serde(rename = "meta", default)]
    pub meta_hash: String,
    #[serde(default)]
    pub shared: bool,
    /// Never contains whitespace inside an entry.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "user", default)]
    pub owner: String,
    /// The Unix epoch when the source had no timestamp.
    #[serde(rename = "time", default)]
    pub saved_at: DateTime<Utc>,
    #[serde(rename = "toread", default)]
    pub to_read: bool,
    #[serde(rename = "others", default)]
    pub others_count: u32,
}

/// Input accepted by `Post::parse`.
#[derive(Debug, Clone)]
pub enum PostSource {
    /// A JSON document in the library's `Post` shape.
    Json(String),
    /// Already-decoded fields in the library's `Post` shape.
    Fields(Map<String, Value>),
}

impl PostSource {
    pub fn json(raw: impl Into<String>) -> Self {
        PostSource::Json(raw.into())
    }

    pub fn fields(map: Map<String, Value>) -> Self {
        PostSource::Fields(map)
    }

    fn kind(&self) -> &'static str {
        match self {
            PostSource::Json(_) => "JSON string",
            PostSource::Fields(_) => "field map",
        }
    }
}

impl Post {
    /// Convert a standalone representation into a `Post`.
    ///
    /// Missing fields take their zero values. Input that is not JSON, has a
    /// wrongly-typed field or carries a tag containing whitespace is a
    /// `Conversion` error.
    pub fn parse(source: PostSource) -> Result<Post> {
        let kind = source.kind();
        let parsed: Post = match source {
            PostSource::Json(raw) => serde_json::from_str(&raw),
            PostSource::Fields(map) => serde_json::from_value(Value::Object(map)),
        }
        .map_err(|e| ApiError::Conversion(format!("{kind} ({e})")))?;

        for tag in &parsed.tags {
            validate_tag(tag).map_err(|e| ApiError::Conversion(format!("{kind} ({e})")))?;
        }
        Ok(parsed)
    }

    /// The record as the service itself would return it.
    pub fn to_api_record(&self) -> Value {
        json!({
            "href": self.url,
            "description": self.title,
            "extended": self.description,
            "hash": self.content_hash,
            "meta": self.meta_hash,
            "shared": yes_no(self.shared),
            "toread": yes_no(self.to_read),
            "tags": self.tags.join(" "),
            "time": self.saved_at.format(TIMESTAMP_FORMAT).to_string(),
        })
    }
}

/// Number of posts carrying a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Number of posts saved on a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Tag suggestions for a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedTags {
    /// Tags other users commonly apply to the URL.
    pub popular: Vec<String>,
    /// Tags drawn from the account's own vocabulary.
    pub recommended: Vec<String>,
}

/// Sort by descending count; equal counts keep their relative order.
pub fn sort_tag_counts(counts: &mut [TagCount]) {
    counts.sort_by(|a, b| b.count.cmp(&a.count));
}

/// Sort by descending count; equal counts keep their relative order.
pub fn sort_date_counts(counts: &mut [DateCount]) {
    counts.sort_by(|a, b| b.count.cmp(&a.count));
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> Post {
        Post {
            url: "https://example.com/".into(),
            title: "Example".into(),
            description: "notes".into(),
            content_hash: "abc".into(),
            meta_hash: "def".into(),
            shared: true,
            tags: vec!["go".into(), "rust".into()],
            owner: "alice".into(),
            saved_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            to_read: false,
            others_count: 4,
        }
    }

    #[test]
    fn parse_from_json_string() {
        let raw = serde_json::to_string(&sample()).unwrap();
        assert_eq!(Post::parse(PostSource::json(raw)).unwrap(), sample());
    }

    #[test]
    fn parse_from_field_map() {
        let Value::Object(map) = serde_json::to_value(sample()).unwrap() else {
            panic!("post serializes to an object");
        };
        assert_eq!(Post::parse(PostSource::fields(map)).unwrap(), sample());
    }

    #[test]
    fn parse_uses_defaults_for_missing_optional_fields() {
        let post = Post::parse(PostSource::json(
            r#"{"href":"https://example.com/","time":"2024-03-01T12:00:00Z"}"#,
        ))
        .unwrap();
        assert_eq!(post.url, "https://example.com/");
        assert!(post.tags.is_empty());
        assert!(!post.shared);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = Post::parse(PostSource::json("not json")).unwrap_err();
        assert!(matches!(err, ApiError::Conversion(_)));
        assert!(err.to_string().starts_with("cannot convert JSON string"));

        let raw = r#"{"href":"https://x.example/","shared":"yes"}"#;
        let err = Post::parse(PostSource::json(raw)).unwrap_err();
        assert!(matches!(err, ApiError::Conversion(_)));
    }

    #[test]
    fn parse_rejects_tags_containing_whitespace() {
        let raw = r#"{"href":"https://x.example/","time":"2024-03-01T12:00:00Z","tags":["a b","c\td"]}"#;
        let err = Post::parse(PostSource::json(raw)).unwrap_err();
        assert!(matches!(err, ApiError::Conversion(_)));

        let mut map = Map::new();
        map.insert("tags".into(), json!(["ok", "not\nok"]));
        assert!(matches!(Post::parse(PostSource::fields(map)), Err(ApiError::Conversion(_))));
    }

    #[test]
    fn parse_fills_zero_values_for_missing_fields() {
        let post = Post::parse(PostSource::fields(Map::new())).unwrap();
        assert_eq!(post.url, "");
        assert_eq!(post.saved_at, DateTime::<Utc>::default());

        let raw = r#"{"href":"https://x.example/","title":"T"}"#;
        let post = Post::parse(PostSource::json(raw)).unwrap();
        assert_eq!(post.title, "T");
        assert_eq!(post.saved_at.timestamp(), 0);
    }

    #[test]
    fn api_record_uses_wire_conventions() {
        let record = sample().to_api_record();
        assert_eq!(record["description"], "Example");
        assert_eq!(record["extended"], "notes");
        assert_eq!(record["shared"], "yes");
        assert_eq!(record["toread"], "no");
        assert_eq!(record["tags"], "go rust");
        assert_eq!(record["time"], "2024-03-01T12:00:00Z");
    }

    #[test]
    fn sorting_sorted_counts_is_a_no_op() {
        let sorted = vec![
            TagCount { tag: "go".into(), count: 12 },
            TagCount { tag: "c".into(), count: 7 },
            TagCount { tag: "rust".into(), count: 7 },
            TagCount { tag: "zig".into(), count: 1 },
        ];
        let mut again = sorted.clone();
        sort_tag_counts(&mut again);
        assert_eq!(again, sorted);
    }

    #[test]
    fn date_counts_sort_descending() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let mut counts = vec![
            DateCount { date: day(1), count: 2 },
            DateCount { date: day(2), count: 9 },
            DateCount { date: day(3), count: 5 },
        ];
        sort_date_counts(&mut counts);
        let order: Vec<u64> = counts.iter().map(|c| c.count).collect();
        assert_eq!(order, vec![9, 5, 2]);
    }
}
