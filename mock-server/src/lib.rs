use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

const RECENT_DEFAULT: usize = 15;
const RECENT_MAX: usize = 100;

/// The single account the server knows about.
#[derive(Clone, Debug)]
pub struct Account {
    pub username: String,
    pub password: String,
    /// Second half of the `username:secret` API token.
    pub api_secret: String,
    /// Returned by `user/secret`.
    pub feed_secret: String,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            username: "alice".to_string(),
            password: "wonderland".to_string(),
            api_secret: "0123456789ABCDEF".to_string(),
            feed_secret: "feedsecret".to_string(),
        }
    }
}

impl Account {
    pub fn token(&self) -> String {
        format!("{}:{}", self.username, self.api_secret)
    }
}

/// A stored bookmark.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bookmark {
    pub href: String,
    pub title: String,
    pub extended: String,
    pub meta: String,
    pub hash: String,
    pub time: DateTime<Utc>,
    pub shared: bool,
    pub toread: bool,
    pub tags: Vec<String>,
}

impl Bookmark {
    /// The record in the service's wire shape.
    pub fn to_wire(&self) -> Value {
        json!({
            "href": self.href,
            "description": self.title,
            "extended": self.extended,
            "meta": self.meta,
            "hash": self.hash,
            "time": rfc3339(self.time),
            "shared": yes_no(self.shared),
            "toread": yes_no(self.toread),
            "tags": self.tags.join(" "),
        })
    }

    fn has_tags(&self, wanted: &[String]) -> bool {
        wanted.iter().all(|t| self.tags.contains(t))
    }
}

#[derive(Debug)]
pub struct Store {
    posts: BTreeMap<String, Bookmark>,
    updated: DateTime<Utc>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            posts: BTreeMap::new(),
            updated: Utc::now(),
        }
    }
}

impl Store {
    /// Newest first.
    fn by_time(&self) -> Vec<&Bookmark> {
        let mut posts: Vec<&Bookmark> = self.posts.values().collect();
        posts.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.href.cmp(&b.href)));
        posts
    }

    fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for post in self.posts.values() {
            for tag in &post.tags {
                *counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    fn touch(&mut self) {
        self.updated = Utc::now();
    }
}

#[derive(Clone)]
pub struct AppState {
    account: Arc<Account>,
    store: Arc<RwLock<Store>>,
    /// Requests left before every call answers 429.
    budget: Option<Arc<AtomicUsize>>,
}

type Params = HashMap<String, String>;

pub fn app() -> Router {
    app_with(Account::default(), None)
}

/// Router for `account`. With `budget = Some(n)` the first `n` requests are
/// served normally and every later one gets 429.
pub fn app_with(account: Account, budget: Option<usize>) -> Router {
    let state = AppState {
        account: Arc::new(account),
        store: Arc::new(RwLock::new(Store::default())),
        budget: budget.map(|n| Arc::new(AtomicUsize::new(n))),
    };
    Router::new()
        .route("/v1/posts/add", get(posts_add))
        .route("/v1/posts/delete", get(posts_delete))
        .route("/v1/posts/get", get(posts_get))
        .route("/v1/posts/recent", get(posts_recent))
        .route("/v1/posts/all", get(posts_all))
        .route("/v1/posts/dates", get(posts_dates))
        .route("/v1/posts/suggest", get(posts_suggest))
        .route("/v1/posts/update", get(posts_update))
        .route("/v1/tags/get", get(tags_get))
        .route("/v1/tags/delete", get(tags_delete))
        .route("/v1/tags/rename", get(tags_rename))
        .route("/v1/user/secret", get(user_secret))
        .route("/v1/user/api_token", get(user_api_token))
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Rate limiting and authentication for every route.
async fn guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(budget) = &state.budget {
        let allowed = budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !allowed {
            return StatusCode::TOO_MANY_REQUESTS.into_response();
        }
    }
    let token = Query::<Params>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.get("auth_token").cloned());
    if !authorized(&state.account, token.as_deref(), req.headers()) {
        debug!(path = %req.uri().path(), "rejecting unauthenticated request");
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(req).await
}

fn authorized(account: &Account, token: Option<&str>, headers: &HeaderMap) -> bool {
    if let Some(token) = token {
        return token == account.token();
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|raw| String::from_utf8(raw).ok())
        .is_some_and(|pair| pair == format!("{}:{}", account.username, account.password))
}

fn done() -> Json<Value> {
    result_code("done")
}

fn result_code(code: &str) -> Json<Value> {
    Json(json!({ "result_code": code }))
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, StatusCode> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StatusCode::BAD_REQUEST)
}

fn tag_filter(q: &Params) -> Vec<String> {
    q.get("tag")
        .map(|t| t.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn flag(q: &Params, key: &str, default: bool) -> bool {
    match q.get(key).map(String::as_str) {
        Some("yes") => true,
        Some("no") => false,
        _ => default,
    }
}

fn number(q: &Params, key: &str) -> Result<Option<usize>, StatusCode> {
    q.get(key)
        .map(|v| v.parse().map_err(|_| StatusCode::BAD_REQUEST))
        .transpose()
}

async fn posts_add(
    State(state): State<AppState>,
    Query(q): Query<Params>,
) -> Result<Json<Value>, StatusCode> {
    let Some(href) = q.get("url").filter(|u| !u.is_empty()) else {
        return Ok(result_code("missing url"));
    };
    let Some(title) = q.get("description").filter(|d| !d.is_empty()) else {
        return Ok(result_code("missing description"));
    };
    let time = q.get("dt").map(|dt| parse_time(dt)).transpose()?.unwrap_or_else(Utc::now);

    let mut store = state.store.write().await;
    if store.posts.contains_key(href) && !flag(&q, "replace", true) {
        return Ok(result_code("item already exists"));
    }
    let bookmark = Bookmark {
        href: href.clone(),
        title: title.clone(),
        extended: q.get("extended").cloned().unwrap_or_default(),
        meta: Uuid::new_v4().simple().to_string(),
        hash: Uuid::new_v4().simple().to_string(),
        time,
        shared: flag(&q, "shared", true),
        toread: flag(&q, "toread", false),
        tags: q
            .get("tags")
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
    };
    info!(href = %bookmark.href, "post saved");
    store.posts.insert(href.clone(), bookmark);
    store.touch();
    Ok(done())
}

async fn posts_delete(State(state): State<AppState>, Query(q): Query<Params>) -> Json<Value> {
    let mut store = state.store.write().await;
    match q.get("url").and_then(|u| store.posts.remove(u)) {
        Some(_) => {
            store.touch();
            done()
        }
        None => result_code("item not found"),
    }
}

async fn posts_get(
    State(state): State<AppState>,
    Query(q): Query<Params>,
) -> Result<Json<Value>, StatusCode> {
    let store = state.store.read().await;
    let tags = tag_filter(&q);
    let day = match q.get("dt") {
        Some(dt) => Some(parse_time(dt)?.date_naive()),
        None => None,
    };

    let posts: Vec<&Bookmark> = if let Some(url) = q.get("url") {
        store.posts.get(url).into_iter().collect()
    } else {
        let newest = store.by_time();
        let day = day.or_else(|| newest.first().map(|p| p.time.date_naive()));
        newest
            .into_iter()
            .filter(|p| Some(p.time.date_naive()) == day)
            .collect()
    };
    let posts: Vec<Value> = posts
        .into_iter()
        .filter(|p| p.has_tags(&tags))
        .map(Bookmark::to_wire)
        .collect();

    Ok(Json(json!({
        "date": rfc3339(store.updated),
        "user": state.account.username,
        "posts": posts,
    })))
}

async fn posts_recent(
    State(state): State<AppState>,
    Query(q): Query<Params>,
) -> Result<Json<Value>, StatusCode> {
    let count = number(&q, "count")?.unwrap_or(RECENT_DEFAULT).min(RECENT_MAX);
    let tags = tag_filter(&q);
    let store = state.store.read().await;
    let posts: Vec<Value> = store
        .by_time()
        .into_iter()
        .filter(|p| p.has_tags(&tags))
        .take(count)
        .map(Bookmark::to_wire)
        .collect();
    Ok(Json(json!({
        "date": rfc3339(store.updated),
        "user": state.account.username,
        "posts": posts,
    })))
}

async fn posts_all(
    State(state): State<AppState>,
    Query(q): Query<Params>,
) -> Result<Json<Value>, StatusCode> {
    let tags = tag_filter(&q);
    let start = number(&q, "start")?.unwrap_or(0);
    let results = number(&q, "results")?.unwrap_or(usize::MAX);
    let from = q.get("fromdt").map(|t| parse_time(t)).transpose()?;
    let to = q.get("todt").map(|t| parse_time(t)).transpose()?;

    let store = state.store.read().await;
    let posts: Vec<Value> = store
        .by_time()
        .into_iter()
        .filter(|p| p.has_tags(&tags))
        .filter(|p| from.is_none_or(|f| p.time >= f))
        .filter(|p| to.is_none_or(|t| p.time <= t))
        .skip(start)
        .take(results)
        .map(Bookmark::to_wire)
        .collect();
    Ok(Json(Value::Array(posts)))
}

async fn posts_dates(State(state): State<AppState>, Query(q): Query<Params>) -> Json<Value> {
    let tags = tag_filter(&q);
    let store = state.store.read().await;
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for post in store.posts.values().filter(|p| p.has_tags(&tags)) {
        *per_day.entry(post.time.date_naive()).or_insert(0) += 1;
    }
    let dates: Map<String, Value> = per_day
        .into_iter()
        .map(|(day, n)| (day.format("%Y-%m-%d").to_string(), Value::String(n.to_string())))
        .collect();
    Json(json!({
        "user": state.account.username,
        "tag": tags.join(" "),
        "dates": dates,
    }))
}

/// Popular: the URL's own tags. Recommended: the account's most used tags.
async fn posts_suggest(State(state): State<AppState>, Query(q): Query<Params>) -> Json<Value> {
    let store = state.store.read().await;
    let popular = q
        .get("url")
        .and_then(|u| store.posts.get(u))
        .map(|p| p.tags.clone())
        .unwrap_or_default();
    let mut counts: Vec<(String, usize)> = store.tag_counts().into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let recommended: Vec<String> = counts.into_iter().take(5).map(|(t, _)| t).collect();
    Json(json!([{ "popular": popular }, { "recommended": recommended }]))
}

async fn posts_update(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    Json(json!({ "update_time": rfc3339(store.updated) }))
}

async fn tags_get(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    let tags: Map<String, Value> = store
        .tag_counts()
        .into_iter()
        .map(|(tag, n)| (tag, Value::String(n.to_string())))
        .collect();
    Json(Value::Object(tags))
}

async fn tags_delete(State(state): State<AppState>, Query(q): Query<Params>) -> Json<Value> {
    let Some(tag) = q.get("tag") else {
        return result_code("missing tag");
    };
    let mut store = state.store.write().await;
    let mut found = false;
    for post in store.posts.values_mut() {
        let before = post.tags.len();
        post.tags.retain(|t| t != tag);
        found |= post.tags.len() != before;
    }
    if !found {
        return result_code("tag not found");
    }
    store.touch();
    done()
}

async fn tags_rename(State(state): State<AppState>, Query(q): Query<Params>) -> Json<Value> {
    let (Some(old), Some(new)) = (q.get("old"), q.get("new")) else {
        return result_code("missing tag");
    };
    let mut store = state.store.write().await;
    let mut found = false;
    for post in store.posts.values_mut() {
        if let Some(pos) = post.tags.iter().position(|t| t == old) {
            post.tags.remove(pos);
            if !post.tags.contains(new) {
                post.tags.insert(pos, new.clone());
            }
            found = true;
        }
    }
    if !found {
        return result_code("tag not found");
    }
    store.touch();
    done()
}

async fn user_secret(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "result": state.account.feed_secret }))
}

async fn user_api_token(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "result": state.account.api_secret }))
}
