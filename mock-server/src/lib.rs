use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

const POST_TIME: &str = "%Y-%m-%dT%H:%M:%SZ";
const NOTE_TIME: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug)]
pub struct Post {
    pub href: String,
    pub description: String,
    pub extended: String,
    pub tags: Vec<String>,
    pub time: DateTime<Utc>,
    pub shared: bool,
    pub toread: bool,
    pub hash: String,
    pub meta: String,
}

#[derive(Clone, Debug)]
pub struct StoredNote {
    pub id: String,
    pub title: String,
    pub text: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub hash: String,
}

/// In-memory account: one user, their bookmarks and notes.
#[derive(Debug)]
pub struct Store {
    token: String,
    posts: BTreeMap<String, Post>,
    notes: Vec<StoredNote>,
    updated: DateTime<Utc>,
}

impl Store {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            posts: BTreeMap::new(),
            notes: Vec::new(),
            updated: Utc::now(),
        }
    }

    /// Notes cannot be created through the API, so tests seed them here.
    pub fn with_note(mut self, title: &str, text: &str) -> Self {
        let now = Utc::now();
        self.notes.push(StoredNote {
            id: Uuid::new_v4().simple().to_string()[..20].to_string(),
            title: title.to_string(),
            text: text.to_string(),
            created: now,
            updated: now,
            hash: Uuid::new_v4().simple().to_string(),
        });
        self
    }

    fn user(&self) -> &str {
        self.token.split(':').next().unwrap_or_default()
    }

    fn touch(&mut self) {
        self.updated = Utc::now();
    }
}

pub type Db = Arc<RwLock<Store>>;

type Params = HashMap<String, String>;
type Reply = Result<Json<Value>, (StatusCode, String)>;

pub fn app(token: &str) -> Router {
    app_with_store(Store::new(token))
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    let api = Router::new()
        .route("/posts/add", get(posts_add))
        .route("/posts/delete", get(posts_delete))
        .route("/posts/get", get(posts_get))
        .route("/posts/recent", get(posts_recent))
        .route("/posts/all", get(posts_all))
        .route("/posts/dates", get(posts_dates))
        .route("/posts/update", get(posts_update))
        .route("/posts/suggest", get(posts_suggest))
        .route("/tags/get", get(tags_get))
        .route("/tags/delete", get(tags_delete))
        .route("/tags/rename", get(tags_rename))
        .route("/user/secret", get(user_secret))
        .route("/user/api_token/", get(user_api_token))
        .route("/notes/list", get(notes_list))
        .route("/notes/{id}", get(notes_get))
        .with_state(db);
    Router::new().nest("/v1", api)
}

pub async fn run(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(store)).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn authorize(store: &Store, params: &Params) -> Result<(), (StatusCode, String)> {
    match params.get("auth_token") {
        Some(token) if *token == store.token => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, "401 Forbidden".to_string())),
    }
}

fn result_code(code: &str) -> Json<Value> {
    Json(json!({ "result_code": code }))
}

fn flag(params: &Params, name: &str, default: bool) -> bool {
    params.get(name).map_or(default, |v| v == "yes")
}

fn split_tags(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| v.split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

fn parse_time(value: Option<&String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| NaiveDateTime::parse_from_str(v, POST_TIME).ok())
        .map(|naive| naive.and_utc())
}

fn matches_tags(post: &Post, tags: &[String]) -> bool {
    tags.iter().all(|t| post.tags.contains(t))
}

fn post_json(post: &Post, with_meta: bool) -> Value {
    let mut value = json!({
        "href": post.href,
        "description": post.description,
        "extended": post.extended,
        "hash": post.hash,
        "time": post.time.format(POST_TIME).to_string(),
        "shared": if post.shared { "yes" } else { "no" },
        "toread": if post.toread { "yes" } else { "no" },
        "tags": post.tags.join(" "),
    });
    if with_meta {
        value["meta"] = json!(post.meta);
    }
    value
}

fn note_json(note: &StoredNote, with_text: bool) -> Value {
    let mut value = json!({
        "id": note.id,
        "title": note.title,
        "hash": note.hash,
        "length": note.text.chars().count().to_string(),
        "created_at": note.created.format(NOTE_TIME).to_string(),
        "updated_at": note.updated.format(NOTE_TIME).to_string(),
    });
    if with_text {
        value["text"] = json!(note.text);
    }
    value
}

fn newest_first<'a>(posts: impl Iterator<Item = &'a Post>) -> Vec<&'a Post> {
    let mut posts: Vec<_> = posts.collect();
    posts.sort_by(|a, b| b.time.cmp(&a.time));
    posts
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

async fn posts_add(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let mut store = db.write().await;
    authorize(&store, &params)?;
    debug!(endpoint = "posts/add", "handling request");

    let (Some(url), Some(description)) = (params.get("url"), params.get("description")) else {
        return Ok(result_code("missing url"));
    };
    if store.posts.contains_key(url) && !flag(&params, "replace", false) {
        return Ok(result_code("item already exists"));
    }
    let post = Post {
        href: url.clone(),
        description: description.clone(),
        extended: params.get("extended").cloned().unwrap_or_default(),
        tags: split_tags(params.get("tags")),
        time: parse_time(params.get("dt")).unwrap_or_else(Utc::now),
        shared: flag(&params, "shared", true),
        toread: flag(&params, "toread", false),
        hash: Uuid::new_v4().simple().to_string(),
        meta: Uuid::new_v4().simple().to_string(),
    };
    store.posts.insert(url.clone(), post);
    store.touch();
    Ok(result_code("done"))
}

async fn posts_delete(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let mut store = db.write().await;
    authorize(&store, &params)?;
    debug!(endpoint = "posts/delete", "handling request");

    let removed = params
        .get("url")
        .and_then(|url| store.posts.remove(url))
        .is_some();
    if !removed {
        return Ok(result_code("item not found"));
    }
    store.touch();
    Ok(result_code("done"))
}

async fn posts_get(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    debug!(endpoint = "posts/get", "handling request");

    let tags = split_tags(params.get("tag"));
    let url = params.get("url");
    let day = parse_time(params.get("dt")).map(|t| t.date_naive());
    let with_meta = params.get("meta").is_some_and(|m| m == "1" || m == "yes");
    let posts: Vec<Value> = newest_first(store.posts.values())
        .into_iter()
        .filter(|p| url.is_none_or(|u| p.href == *u))
        .filter(|p| day.is_none_or(|d| p.time.date_naive() == d))
        .filter(|p| matches_tags(p, &tags))
        .map(|p| post_json(p, with_meta))
        .collect();
    Ok(Json(json!({
        "date": Utc::now().format(POST_TIME).to_string(),
        "user": store.user(),
        "posts": posts,
    })))
}

async fn posts_recent(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    debug!(endpoint = "posts/recent", "handling request");

    let tags = split_tags(params.get("tag"));
    let count = params
        .get("count")
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(15);
    let posts: Vec<Value> = newest_first(store.posts.values())
        .into_iter()
        .filter(|p| matches_tags(p, &tags))
        .take(count)
        .map(|p| post_json(p, false))
        .collect();
    Ok(Json(json!({
        "date": store.updated.format(POST_TIME).to_string(),
        "user": store.user(),
        "posts": posts,
    })))
}

async fn posts_all(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    debug!(endpoint = "posts/all", "handling request");

    let tags = split_tags(params.get("tag"));
    let start = params
        .get("start")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0);
    let results = params
        .get("results")
        .and_then(|r| r.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    let from = parse_time(params.get("fromdt"));
    let to = parse_time(params.get("todt"));
    let with_meta = params.get("meta").is_some_and(|m| m == "1");
    let posts: Vec<Value> = newest_first(store.posts.values())
        .into_iter()
        .filter(|p| matches_tags(p, &tags))
        .filter(|p| from.is_none_or(|f| p.time >= f))
        .filter(|p| to.is_none_or(|t| p.time <= t))
        .skip(start)
        .take(results)
        .map(|p| post_json(p, with_meta))
        .collect();
    Ok(Json(Value::Array(posts)))
}

async fn posts_dates(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    debug!(endpoint = "posts/dates", "handling request");

    let tags = split_tags(params.get("tag"));
    let mut dates: BTreeMap<String, usize> = BTreeMap::new();
    for post in store.posts.values().filter(|p| matches_tags(p, &tags)) {
        *dates.entry(post.time.format("%Y-%m-%d").to_string()).or_default() += 1;
    }
    let dates: serde_json::Map<String, Value> = dates
        .into_iter()
        .map(|(day, count)| (day, json!(count.to_string())))
        .collect();
    Ok(Json(json!({
        "user": store.user(),
        "tag": tags.join(" "),
        "dates": dates,
    })))
}

async fn posts_update(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    debug!(endpoint = "posts/update", "handling request");
    Ok(Json(json!({ "update_time": store.updated.format(POST_TIME).to_string() })))
}

async fn posts_suggest(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    debug!(endpoint = "posts/suggest", "handling request");

    let popular = params
        .get("url")
        .and_then(|url| store.posts.get(url))
        .map(|p| p.tags.clone())
        .unwrap_or_default();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in store.posts.values().flat_map(|p| p.tags.iter()) {
        *counts.entry(tag).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    let recommended: Vec<&str> = ranked.into_iter().take(3).map(|(tag, _)| tag).collect();
    Ok(Json(json!([
        { "popular": popular },
        { "recommended": recommended },
    ])))
}

// ---------------------------------------------------------------------------
// Tags, user, notes
// ---------------------------------------------------------------------------

async fn tags_get(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    debug!(endpoint = "tags/get", "handling request");

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for tag in store.posts.values().flat_map(|p| p.tags.iter()) {
        *counts.entry(tag.clone()).or_default() += 1;
    }
    if counts.is_empty() {
        return Ok(Json(json!([])));
    }
    let counts: serde_json::Map<String, Value> = counts
        .into_iter()
        .map(|(tag, count)| (tag, json!(count.to_string())))
        .collect();
    Ok(Json(Value::Object(counts)))
}

async fn tags_delete(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let mut store = db.write().await;
    authorize(&store, &params)?;
    debug!(endpoint = "tags/delete", "handling request");

    let Some(tag) = params.get("tag") else {
        return Ok(Json(json!({ "result": "missing tag" })));
    };
    for post in store.posts.values_mut() {
        post.tags.retain(|t| t != tag);
    }
    store.touch();
    Ok(Json(json!({ "result": "done" })))
}

async fn tags_rename(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let mut store = db.write().await;
    authorize(&store, &params)?;
    debug!(endpoint = "tags/rename", "handling request");

    let (Some(old), Some(new)) = (params.get("old"), params.get("new")) else {
        return Ok(Json(json!({ "result": "rename failed" })));
    };
    for post in store.posts.values_mut() {
        for tag in post.tags.iter_mut().filter(|t| t.as_str() == old.as_str()) {
            *tag = new.clone();
        }
    }
    store.touch();
    Ok(Json(json!({ "result": "done" })))
}

async fn user_secret(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    Ok(Json(json!({ "result": format!("secret-{}", store.user()) })))
}

async fn user_api_token(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    let token = store.token.split_once(':').map_or("", |(_, t)| t);
    Ok(Json(json!({ "result": token })))
}

async fn notes_list(State(db): State<Db>, Query(params): Query<Params>) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    debug!(endpoint = "notes/list", "handling request");

    let notes: Vec<Value> = store.notes.iter().map(|n| note_json(n, false)).collect();
    Ok(Json(json!({ "count": notes.len(), "notes": notes })))
}

async fn notes_get(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Reply {
    let store = db.read().await;
    authorize(&store, &params)?;
    debug!(endpoint = "notes/{id}", %id, "handling request");

    store
        .notes
        .iter()
        .find(|n| n.id == id)
        .map(|n| Json(note_json(n, true)))
        .ok_or((StatusCode::NOT_FOUND, "note not found".to_string()))
}
