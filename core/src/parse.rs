//! Response parser: generic JSON trees into typed results.
//!
//! # Design
//! Single-value replies (`result_code`, `result`, `update_time`) fail the
//! call when the field is missing or malformed. Bulk replies (post lists and
//! count maps) go through `collect`, which either fails on the first bad
//! entry (`ParseMode::Strict`) or skips it with a warning
//! (`ParseMode::Lenient`). Nothing is ever zero-filled.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::ParseMode;
use crate::error::{ApiError, Result};
use crate::types::{sort_date_counts, sort_tag_counts, DateCount, Post, SuggestedTags, TagCount};

type EntryResult<T> = std::result::Result<T, String>;

/// Decode a 200 body into a generic tree.
pub fn decode(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Succeed only if `result_code` equals the `done` sentinel.
pub fn result_code(value: &Value, done: &str) -> Result<()> {
    match value.get("result_code").and_then(Value::as_str) {
        Some(code) if code == done => Ok(()),
        Some(code) => Err(ApiError::OperationFailed(code.to_string())),
        None => Err(ApiError::MalformedResponse("missing result_code".into())),
    }
}

/// A required top-level string field.
pub fn string_field(value: &Value, field: &str) -> Result<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::MalformedResponse(format!("missing string field {field:?}")))
}

/// A required top-level RFC 3339 timestamp field.
pub fn timestamp_field(value: &Value, field: &str) -> Result<DateTime<Utc>> {
    let raw = string_field(value, field)?;
    parse_time(&raw).map_err(ApiError::MalformedResponse)
}

/// Posts from either a top-level array (`field = None`) or a nested array.
///
/// A `user` field next to the nested array fills in `owner` for records that
/// lack their own.
pub fn posts(value: &Value, field: Option<&str>, mode: ParseMode) -> Result<Vec<Post>> {
    let list = match field {
        Some(name) => value.get(name),
        None => Some(value),
    }
    .and_then(Value::as_array)
    .ok_or_else(|| {
        ApiError::MalformedResponse(format!(
            "expected an array of posts at {}",
            field.unwrap_or("top level")
        ))
    })?;

    let owner = field.and_then(|_| value.get("user")).and_then(Value::as_str);
    collect(list.iter().map(|record| post_from_record(record, owner)), mode, "post")
}

/// Map one wire record into a `Post`.
pub fn post_from_record(record: &Value, owner: Option<&str>) -> EntryResult<Post> {
    let obj = record.as_object().ok_or("post record is not an object")?;
    let text = |key: &str| obj.get(key).and_then(Value::as_str).unwrap_or("").to_string();

    let url = obj
        .get("href")
        .and_then(Value::as_str)
        .ok_or("post record has no href")?
        .to_string();
    let saved_at = obj
        .get("time")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("post {url} has no time"))
        .and_then(parse_time)?;

    Ok(Post {
        title: text("description"),
        description: text("extended"),
        content_hash: text("hash"),
        meta_hash: text("meta"),
        shared: flag(obj, "shared")?,
        to_read: flag(obj, "toread")?,
        tags: obj
            .get("tags")
            .and_then(Value::as_str)
            .map(split_tags)
            .unwrap_or_default(),
        owner: obj
            .get("user")
            .and_then(Value::as_str)
            .or(owner)
            .unwrap_or("")
            .to_string(),
        others_count: obj
            .get("others")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        saved_at,
        url,
    })
}

/// Tag-name to count map, sorted by descending count.
pub fn tag_counts(value: &Value, mode: ParseMode) -> Result<Vec<TagCount>> {
    let map = value
        .as_object()
        .ok_or_else(|| ApiError::MalformedResponse("expected a tag map".into()))?;
    let mut counts = collect(
        map.iter().map(|(tag, count)| {
            Ok(TagCount {
                tag: tag.clone(),
                count: parse_count(count).map_err(|e| format!("tag {tag:?}: {e}"))?,
            })
        }),
        mode,
        "tag count",
    )?;
    sort_tag_counts(&mut counts);
    Ok(counts)
}

/// Date to count map, sorted by descending count.
///
/// The service nests the map under `dates`; a bare map is accepted too.
pub fn date_counts(value: &Value, mode: ParseMode) -> Result<Vec<DateCount>> {
    let map = value
        .get("dates")
        .and_then(Value::as_object)
        .or_else(|| value.as_object())
        .ok_or_else(|| ApiError::MalformedResponse("expected a date map".into()))?;
    let mut counts = collect(
        map.iter().map(|(date, count)| {
            Ok(DateCount {
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|e| format!("date {date:?}: {e}"))?,
                count: parse_count(count).map_err(|e| format!("date {date:?}: {e}"))?,
            })
        }),
        mode,
        "date count",
    )?;
    sort_date_counts(&mut counts);
    Ok(counts)
}

/// `[{"popular": [...]}, {"recommended": [...]}]`
pub fn suggested_tags(value: &Value, mode: ParseMode) -> Result<SuggestedTags> {
    Ok(SuggestedTags {
        popular: suggestion_list(value, 0, "popular", mode)?,
        recommended: suggestion_list(value, 1, "recommended", mode)?,
    })
}

fn suggestion_list(value: &Value, index: usize, key: &str, mode: ParseMode) -> Result<Vec<String>> {
    let Some(list) = value.get(index).and_then(|v| v.get(key)).and_then(Value::as_array) else {
        return match mode {
            ParseMode::Strict => Err(ApiError::MalformedResponse(format!(
                "missing {key} suggestions"
            ))),
            ParseMode::Lenient => {
                warn!(key, "suggestion list missing, using empty list");
                Ok(Vec::new())
            }
        };
    };
    collect(
        list.iter().map(|tag| {
            tag.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("{key} entry is not a string: {tag}"))
        }),
        mode,
        "suggested tag",
    )
}

/// Gather per-entry results according to `mode`.
fn collect<T>(
    entries: impl Iterator<Item = EntryResult<T>>,
    mode: ParseMode,
    what: &str,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for entry in entries {
        match entry {
            Ok(item) => out.push(item),
            Err(reason) => match mode {
                ParseMode::Strict => {
                    return Err(ApiError::MalformedResponse(format!("{what}: {reason}")))
                }
                ParseMode::Lenient => warn!(what, %reason, "skipping malformed entry"),
            },
        }
    }
    Ok(out)
}

fn parse_time(raw: &str) -> EntryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {raw:?}: {e}"))
}

fn parse_count(value: &Value) -> EntryResult<u64> {
    match value {
        Value::String(s) => s.trim().parse().map_err(|_| format!("count {s:?} is not a number")),
        Value::Number(n) => n.as_u64().ok_or_else(|| format!("count {n} is not a whole number")),
        other => Err(format!("count has unexpected type: {other}")),
    }
}

fn flag(obj: &Map<String, Value>, key: &str) -> EntryResult<bool> {
    match obj.get(key).and_then(Value::as_str) {
        Some("yes") => Ok(true),
        Some("no") | None => Ok(false),
        Some(other) => Err(format!("{key} must be yes or no, got {other:?}")),
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn record(href: &str) -> Value {
        json!({
            "href": href,
            "description": "Title",
            "extended": "Notes",
            "meta": "m1",
            "hash": "h1",
            "time": "2024-03-01T12:00:00Z",
            "shared": "yes",
            "toread": "no",
            "tags": "go  rust"
        })
    }

    #[test]
    fn result_code_done_is_success() {
        assert!(result_code(&json!({"result_code": "done"}), "done").is_ok());
    }

    #[test]
    fn result_code_other_is_operation_failed() {
        let err = result_code(&json!({"result_code": "item already exists"}), "done").unwrap_err();
        assert!(matches!(err, ApiError::OperationFailed(ref c) if c == "item already exists"));
    }

    #[test]
    fn result_code_missing_is_malformed() {
        let err = result_code(&json!({}), "done").unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn record_maps_wire_fields() {
        let post = post_from_record(&record("https://a.example/"), Some("alice")).unwrap();
        assert_eq!(post.url, "https://a.example/");
        assert_eq!(post.title, "Title");
        assert_eq!(post.description, "Notes");
        assert_eq!(post.content_hash, "h1");
        assert_eq!(post.meta_hash, "m1");
        assert!(post.shared);
        assert!(!post.to_read);
        assert_eq!(post.tags, vec!["go", "rust"]);
        assert_eq!(post.owner, "alice");
        assert_eq!(post.saved_at, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn api_record_round_trips_flags() {
        let mut post = post_from_record(&record("https://a.example/"), None).unwrap();
        post.shared = true;
        post.to_read = false;
        let back = post_from_record(&post.to_api_record(), None).unwrap();
        assert_eq!((back.shared, back.to_read), (true, false));
        assert_eq!(back, post);
    }

    #[test]
    fn record_without_href_is_rejected() {
        assert!(post_from_record(&json!({"time": "2024-03-01T12:00:00Z"}), None).is_err());
    }

    #[test]
    fn nested_posts_take_owner_from_envelope() {
        let value = json!({"user": "bob", "posts": [record("https://a.example/")]});
        let posts = posts(&value, Some("posts"), ParseMode::Strict).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].owner, "bob");
    }

    #[test]
    fn top_level_posts() {
        let value = json!([record("https://a.example/"), record("https://b.example/")]);
        let posts = posts(&value, None, ParseMode::Strict).unwrap();
        let urls: Vec<&str> = posts.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example/", "https://b.example/"]);
    }

    #[test]
    fn malformed_post_strict_fails_lenient_skips() {
        let mut bad = record("https://bad.example/");
        bad["time"] = json!("yesterday");
        let value = json!([record("https://a.example/"), bad]);

        let err = posts(&value, None, ParseMode::Strict).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));

        let posts = posts(&value, None, ParseMode::Lenient).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, "https://a.example/");
    }

    #[test]
    fn tag_counts_sorted_descending() {
        let counts = tag_counts(&json!({"go": "12", "rust": "7"}), ParseMode::Strict).unwrap();
        assert_eq!(
            counts,
            vec![
                TagCount { tag: "go".into(), count: 12 },
                TagCount { tag: "rust".into(), count: 7 },
            ]
        );

        let counts = tag_counts(&json!({"a": "1", "b": 30, "c": "5"}), ParseMode::Strict).unwrap();
        let order: Vec<&str> = counts.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn non_numeric_count_strict_fails_lenient_skips() {
        let value = json!({"go": "12", "rust": "lots"});
        assert!(tag_counts(&value, ParseMode::Strict).is_err());
        let counts = tag_counts(&value, ParseMode::Lenient).unwrap();
        assert_eq!(counts, vec![TagCount { tag: "go".into(), count: 12 }]);
    }

    #[test]
    fn date_counts_read_nested_map() {
        let value = json!({
            "user": "alice",
            "tag": "",
            "dates": {"2024-01-01": "2", "2024-01-02": "9"}
        });
        let counts = date_counts(&value, ParseMode::Strict).unwrap();
        assert_eq!(counts[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(counts[0].count, 9);
        assert_eq!(counts[1].count, 2);
    }

    #[test]
    fn date_counts_bad_date() {
        let value = json!({"2024-13-01": "2", "2024-01-01": "1"});
        assert!(date_counts(&value, ParseMode::Strict).is_err());
        assert_eq!(date_counts(&value, ParseMode::Lenient).unwrap().len(), 1);
    }

    #[test]
    fn suggested_tags_by_position() {
        let value = json!([{"popular": ["rust", "lang"]}, {"recommended": ["programming"]}]);
        let tags = suggested_tags(&value, ParseMode::Strict).unwrap();
        assert_eq!(tags.popular, vec!["rust", "lang"]);
        assert_eq!(tags.recommended, vec!["programming"]);
    }

    #[test]
    fn suggested_tags_missing_half() {
        let value = json!([{"popular": ["rust"]}]);
        assert!(suggested_tags(&value, ParseMode::Strict).is_err());
        let tags = suggested_tags(&value, ParseMode::Lenient).unwrap();
        assert_eq!(tags.popular, vec!["rust"]);
        assert!(tags.recommended.is_empty());
    }

    #[test]
    fn timestamp_field_parses_rfc3339() {
        let value = json!({"update_time": "2024-03-01T12:00:00Z"});
        let t = timestamp_field(&value, "update_time").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert!(timestamp_field(&json!({"update_time": "soon"}), "update_time").is_err());
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(matches!(decode("<html>"), Err(ApiError::Deserialization(_))));
    }
}
