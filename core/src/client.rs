//! The Pinboard v1 operation set.
//!
//! # Design
//! `PinboardClient` holds the endpoint and token and nothing else. Each
//! operation checks its preconditions, builds the query through
//! [`params::build`], and returns a [`Call`] that knows how to decode the
//! answer. Preconditions fail before any request exists, so a rejected call
//! never reaches the network.
//!
//! Mutations report success the way the service does, with the word `done`
//! in a 2xx body. Anything else is `Ok(false)`, never an error.

use std::collections::BTreeMap;

use percent_encoding::utf8_percent_encode;
use tracing::debug;

use crate::call::Call;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{
    self, Bookmark, Bookmarks, Note, Notes, PostsByDate, SuggestedTags, WireBookmark,
    WireBookmarks, WireNote, WireNotes, WirePostsByDate, WireResult, WireUpdate,
};
use crate::params::{self, check_tags, require, ParamValue, ESCAPED};
use crate::query::{AllPostsQuery, NewPost, PostsQuery, RecentQuery, MAX_FILTER_TAGS};
use crate::temporal::Instant;

/// Longest stretch of an error body quoted in a `TransportFailure`.
const ERROR_BODY_LIMIT: usize = 200;

/// Stateless request builder for the Pinboard API.
#[derive(Clone)]
pub struct PinboardClient {
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for PinboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinboardClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PinboardClient {
    pub fn new(endpoint: &str, token: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self::new(&config.endpoint, &config.token))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    pub fn add_post(&self, post: &NewPost) -> Result<Call<bool>, ApiError> {
        let request = self.request("/posts/add", &post.params()?)?;
        Ok(Call::new(request, parse_done))
    }

    /// Replace an existing bookmark. The API has no update endpoint; this is
    /// `posts/add` with `replace=yes`.
    pub fn update_post(&self, post: &NewPost) -> Result<Call<bool>, ApiError> {
        let post = NewPost {
            replace: Some(true),
            ..post.clone()
        };
        self.add_post(&post)
    }

    pub fn update_bookmark(&self, bookmark: &Bookmark) -> Result<Call<bool>, ApiError> {
        self.update_post(&NewPost::from(bookmark))
    }

    pub fn delete_post(&self, url: &str) -> Result<Call<bool>, ApiError> {
        require(url, &["url"])?;
        let request = self.request("/posts/delete", &[("url", Some(ParamValue::from(url)))])?;
        Ok(Call::new(request, parse_done))
    }

    /// Bookmarks for one URL or one day.
    pub fn get_posts(&self, query: &PostsQuery) -> Result<Call<Bookmarks>, ApiError> {
        let request = self.request("/posts/get", &query.params()?)?;
        Ok(Call::new(request, parse_bookmarks))
    }

    pub fn recent_posts(&self, query: &RecentQuery) -> Result<Call<Bookmarks>, ApiError> {
        let request = self.request("/posts/recent", &query.params()?)?;
        Ok(Call::new(request, parse_bookmarks))
    }

    pub fn all_posts(&self, query: &AllPostsQuery) -> Result<Call<Vec<Bookmark>>, ApiError> {
        let request = self.request("/posts/all", &query.params()?)?;
        Ok(Call::new(request, parse_bookmark_list))
    }

    /// Number of bookmarks per day, optionally filtered by up to three tags.
    pub fn posts_by_date<S: AsRef<str>>(&self, tags: &[S]) -> Result<Call<PostsByDate>, ApiError> {
        check_tags("tag", tags, 0, MAX_FILTER_TAGS)?;
        let request = self.request("/posts/dates", &[("tag", Some(tag_list(tags)))])?;
        Ok(Call::new(request, |response| {
            model::decode::<WirePostsByDate, PostsByDate>(&read_body(response)?)
        }))
    }

    /// Time of the most recent change to any bookmark.
    pub fn last_update(&self) -> Result<Call<Instant>, ApiError> {
        let request = self.request("/posts/update", &[])?;
        Ok(Call::new(request, |response| {
            model::from_json::<WireUpdate>(&read_body(response)?)?.decode()
        }))
    }

    pub fn suggest_tags(&self, url: &str) -> Result<Call<SuggestedTags>, ApiError> {
        require(url, &["url"])?;
        let request = self.request("/posts/suggest", &[("url", Some(ParamValue::from(url)))])?;
        Ok(Call::new(request, |response| {
            model::decode_suggested_tags(&read_body(response)?)
        }))
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    /// Every tag in the account with its use count.
    pub fn user_tags(&self) -> Result<Call<BTreeMap<String, u32>>, ApiError> {
        let request = self.request("/tags/get", &[])?;
        Ok(Call::new(request, |response| {
            model::decode_tag_counts(&read_body(response)?)
        }))
    }

    pub fn delete_tag(&self, tag: &str) -> Result<Call<bool>, ApiError> {
        require(tag, &["tag"])?;
        check_tags("tag", &[tag], 1, 1)?;
        let request = self.request("/tags/delete", &[("tag", Some(tag_list(&[tag])))])?;
        Ok(Call::new(request, parse_done_ignore_case))
    }

    pub fn rename_tag(&self, old: &str, new: &str) -> Result<Call<bool>, ApiError> {
        require(old, &["old"])?;
        require(new, &["new"])?;
        check_tags("old", &[old], 1, 1)?;
        check_tags("new", &[new], 1, 1)?;
        let request = self.request(
            "/tags/rename",
            &[
                ("old", Some(ParamValue::from(old))),
                ("new", Some(ParamValue::from(new))),
            ],
        )?;
        Ok(Call::new(request, parse_done_ignore_case))
    }

    // -----------------------------------------------------------------------
    // User
    // -----------------------------------------------------------------------

    /// Secret used to read the user's private RSS feeds.
    pub fn user_secret(&self) -> Result<Call<String>, ApiError> {
        let request = self.request("/user/secret", &[])?;
        Ok(Call::new(request, parse_result))
    }

    pub fn api_token(&self) -> Result<Call<String>, ApiError> {
        let request = self.request("/user/api_token/", &[])?;
        Ok(Call::new(request, parse_result))
    }

    // -----------------------------------------------------------------------
    // Notes
    // -----------------------------------------------------------------------

    pub fn notes(&self) -> Result<Call<Notes>, ApiError> {
        let request = self.request("/notes/list", &[])?;
        Ok(Call::new(request, |response| {
            model::decode::<WireNotes, Notes>(&read_body(response)?)
        }))
    }

    pub fn note(&self, id: &str) -> Result<Call<Note>, ApiError> {
        require(id, &["id"])?;
        let path = format!("/notes/{}", utf8_percent_encode(id, ESCAPED));
        let request = self.request(&path, &[])?;
        Ok(Call::new(request, |response| {
            model::decode::<WireNote, Note>(&read_body(response)?)
        }))
    }

    fn request(
        &self,
        path: &str,
        inputs: &[(&str, Option<ParamValue>)],
    ) -> Result<HttpRequest, ApiError> {
        let params = params::build(&self.token, inputs)?;
        debug!(path, query = %params, "built request");
        Ok(HttpRequest {
            url: format!("{}{path}?{}", self.endpoint, params.to_query_string()),
        })
    }
}

fn tag_list<S: AsRef<str>>(tags: &[S]) -> ParamValue {
    ParamValue::Tags(tags.iter().map(|t| t.as_ref().to_string()).collect())
}

// ---------------------------------------------------------------------------
// Response parsers
// ---------------------------------------------------------------------------

/// `done` somewhere in a 2xx body.
///
/// Any 2xx status counts, not only 200.
fn parse_done(response: HttpResponse) -> Result<bool, ApiError> {
    let done = response.is_success() && response.body.contains("done");
    debug!(status = response.status, done, "mutation outcome");
    Ok(done)
}

/// As [`parse_done`], with the marker matched case-insensitively.
fn parse_done_ignore_case(response: HttpResponse) -> Result<bool, ApiError> {
    let done = response.is_success() && response.body.to_lowercase().contains("done");
    debug!(status = response.status, done, "mutation outcome");
    Ok(done)
}

fn parse_bookmarks(response: HttpResponse) -> Result<Bookmarks, ApiError> {
    model::decode::<WireBookmarks, Bookmarks>(&read_body(response)?)
}

fn parse_bookmark_list(response: HttpResponse) -> Result<Vec<Bookmark>, ApiError> {
    let wire: Vec<WireBookmark> = model::from_json(&read_body(response)?)?;
    model::decode_all(wire)
}

fn parse_result(response: HttpResponse) -> Result<String, ApiError> {
    Ok(model::from_json::<WireResult>(&read_body(response)?)?.result)
}

/// Body of a read operation, or a `TransportFailure` for non-2xx statuses.
fn read_body(response: HttpResponse) -> Result<String, ApiError> {
    if response.is_success() {
        return Ok(response.body);
    }
    let mut message: String = response.body.chars().take(ERROR_BODY_LIMIT).collect();
    if message.is_empty() {
        message = "empty response body".to_string();
    }
    Err(ApiError::TransportFailure {
        status: Some(response.status),
        message,
    })
}
