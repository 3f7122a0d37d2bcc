//! Request inputs for the post operations.
//!
//! Optional fields left as `None` (or empty tag lists) never reach the wire;
//! the service then applies its own defaults.

use crate::error::ApiError;
use crate::model::Bookmark;
use crate::params::{check_tags, require, ParamValue};
use crate::temporal::Instant;

/// Largest tag filter the service accepts.
pub const MAX_FILTER_TAGS: usize = 3;

/// Largest `count` accepted by `posts/recent`.
pub const MAX_RECENT_COUNT: u32 = 100;

pub(crate) type ParamList = Vec<(&'static str, Option<ParamValue>)>;

/// A bookmark to add, or to replace via `update_post`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPost {
    pub url: String,
    pub description: String,
    pub extended: Option<String>,
    pub tags: Vec<String>,
    /// Creation time; the service uses "now" when absent.
    pub dt: Option<Instant>,
    pub replace: Option<bool>,
    pub shared: Option<bool>,
    pub toread: Option<bool>,
}

impl NewPost {
    pub fn new(url: &str, description: &str) -> Self {
        Self {
            url: url.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn params(&self) -> Result<ParamList, ApiError> {
        require(&self.url, &["url"])?;
        check_tags("tags", &self.tags, 0, usize::MAX)?;
        Ok(vec![
            ("url", Some(ParamValue::from(self.url.as_str()))),
            ("description", Some(ParamValue::from(self.description.as_str()))),
            ("extended", self.extended.as_deref().map(ParamValue::from)),
            ("tags", Some(ParamValue::from(self.tags.as_slice()))),
            ("dt", self.dt.map(ParamValue::from)),
            ("replace", self.replace.map(ParamValue::from)),
            ("shared", self.shared.map(ParamValue::from)),
            ("toread", self.toread.map(ParamValue::from)),
        ])
    }
}

impl From<&Bookmark> for NewPost {
    fn from(bookmark: &Bookmark) -> Self {
        Self {
            url: bookmark.href.clone(),
            description: bookmark.description.clone(),
            extended: Some(bookmark.extended.clone()),
            tags: bookmark.tags.clone(),
            dt: Some(bookmark.time),
            replace: None,
            shared: Some(bookmark.shared),
            toread: Some(bookmark.toread),
        }
    }
}

/// Selector for `posts/get`. At least one of `url` or `dt` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostsQuery {
    pub url: Option<String>,
    /// Day to list; only the date part is significant to the service.
    pub dt: Option<Instant>,
    pub tag: Vec<String>,
    /// Include the `meta` change marker in each bookmark.
    pub meta: Option<bool>,
}

impl PostsQuery {
    pub fn by_url(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::default()
        }
    }

    pub fn by_date(dt: Instant) -> Self {
        Self {
            dt: Some(dt),
            ..Self::default()
        }
    }

    pub(crate) fn params(&self) -> Result<ParamList, ApiError> {
        let url = self.url.as_deref().filter(|u| !u.is_empty());
        if url.is_none() && self.dt.is_none() {
            return Err(ApiError::MissingRequiredSelector(&["url", "dt"]));
        }
        check_tags("tag", &self.tag, 0, MAX_FILTER_TAGS)?;
        Ok(vec![
            ("tag", Some(ParamValue::from(self.tag.as_slice()))),
            ("url", url.map(ParamValue::from)),
            ("meta", self.meta.map(meta_flag)),
            ("dt", self.dt.map(ParamValue::from)),
        ])
    }
}

/// Filter for `posts/recent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentQuery {
    pub tag: Vec<String>,
    /// Number of posts; the service defaults to 15.
    pub count: Option<u32>,
}

impl RecentQuery {
    pub(crate) fn params(&self) -> Result<ParamList, ApiError> {
        check_tags("tag", &self.tag, 0, MAX_FILTER_TAGS)?;
        if let Some(count) = self.count {
            if count > MAX_RECENT_COUNT {
                return Err(ApiError::ParameterCountViolation {
                    parameter: "count",
                    min: 0,
                    max: MAX_RECENT_COUNT as usize,
                    actual: count as usize,
                });
            }
        }
        Ok(vec![
            ("tag", Some(ParamValue::from(self.tag.as_slice()))),
            ("count", self.count.map(ParamValue::from)),
        ])
    }
}

/// Filter for `posts/all`. Between one and three tags are required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllPostsQuery {
    pub tag: Vec<String>,
    /// Offset into the result set.
    pub start: Option<u32>,
    /// Maximum number of results; all when absent.
    pub results: Option<u32>,
    pub fromdt: Option<Instant>,
    pub todt: Option<Instant>,
    pub meta: Option<bool>,
}

impl AllPostsQuery {
    pub fn tagged<S: AsRef<str>>(tags: &[S]) -> Self {
        Self {
            tag: tags.iter().map(|t| t.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn params(&self) -> Result<ParamList, ApiError> {
        check_tags("tag", &self.tag, 1, MAX_FILTER_TAGS)?;
        Ok(vec![
            ("tag", Some(ParamValue::from(self.tag.as_slice()))),
            ("start", self.start.map(ParamValue::from)),
            ("results", self.results.map(ParamValue::from)),
            ("fromdt", self.fromdt.map(ParamValue::from)),
            ("todt", self.todt.map(ParamValue::from)),
            ("meta", self.meta.map(meta_flag)),
        ])
    }
}

/// `meta` travels as an integer flag.
fn meta_flag(meta: bool) -> ParamValue {
    ParamValue::Int(i64::from(meta))
}
