//! Domain entities and their JSON decoding.
//!
//! # Design
//! Each entity has a private `Wire*` twin that serde fills with raw strings,
//! and a `TryFrom` conversion that runs every field through its codec. Codec
//! failures surface as typed `ApiError`s, and a single bad field fails the
//! whole entity. Timestamps on bookmarks and collections use
//! `BOOKMARK_TIME`; note timestamps use `NOTE_TIME`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::scalar::{decode_bool, decode_tags, WireInt};
use crate::temporal::{decode_day, Instant, BOOKMARK_TIME, NOTE_TIME};

/// A single saved link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub href: String,
    pub description: String,
    pub extended: String,
    /// Content fingerprint computed by the service.
    pub hash: Option<String>,
    /// Opaque change marker; only sent when metadata was requested.
    pub meta: Option<String>,
    pub time: Instant,
    pub shared: bool,
    pub toread: bool,
    pub tags: Vec<String>,
}

/// Bookmarks returned by `posts/get` and `posts/recent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmarks {
    /// When the service generated the response.
    pub date: Instant,
    pub user: String,
    pub posts: Vec<Bookmark>,
}

/// Per-day bookmark counts from `posts/dates`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsByDate {
    pub user: String,
    /// The tag filter as echoed back by the service.
    pub tag: Vec<String>,
    pub dates: BTreeMap<Instant, u32>,
}

/// A note stored by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub title: String,
    /// Length of the note body in characters.
    pub length: u32,
    pub created: Instant,
    pub updated: Instant,
    pub hash: String,
    /// Body text. Only `notes/{id}` returns it; `notes/list` does not.
    pub text: Option<String>,
}

/// The user's notes as returned by `notes/list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notes {
    /// Count reported by the service.
    pub count: u32,
    pub notes: Vec<Note>,
}

impl Notes {
    /// Whether the reported count matches the number of notes received.
    pub fn is_consistent(&self) -> bool {
        usize::try_from(self.count).is_ok_and(|count| count == self.notes.len())
    }
}

/// Tag suggestions for a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestedTags {
    pub popular: Vec<String>,
    pub recommended: Vec<String>,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct WireBookmark {
    href: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    extended: String,
    hash: Option<String>,
    meta: Option<String>,
    time: String,
    shared: String,
    toread: String,
    #[serde(default)]
    tags: String,
}

impl TryFrom<WireBookmark> for Bookmark {
    type Error = ApiError;

    fn try_from(wire: WireBookmark) -> Result<Self, Self::Error> {
        Ok(Bookmark {
            time: BOOKMARK_TIME.decode(&wire.time)?,
            shared: decode_bool(&wire.shared)?,
            toread: decode_bool(&wire.toread)?,
            tags: decode_tags(&wire.tags),
            href: wire.href,
            description: wire.description,
            extended: wire.extended,
            hash: wire.hash,
            meta: wire.meta,
        })
    }
}

#[derive(Deserialize)]
pub(crate) struct WireBookmarks {
    date: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    posts: Vec<WireBookmark>,
}

impl TryFrom<WireBookmarks> for Bookmarks {
    type Error = ApiError;

    fn try_from(wire: WireBookmarks) -> Result<Self, Self::Error> {
        Ok(Bookmarks {
            date: BOOKMARK_TIME.decode(&wire.date)?,
            user: wire.user,
            posts: decode_all(wire.posts)?,
        })
    }
}

#[derive(Deserialize)]
pub(crate) struct WirePostsByDate {
    #[serde(default)]
    user: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    dates: BTreeMap<String, WireInt>,
}

impl TryFrom<WirePostsByDate> for PostsByDate {
    type Error = ApiError;

    fn try_from(wire: WirePostsByDate) -> Result<Self, Self::Error> {
        let dates = wire
            .dates
            .iter()
            .map(|(day, count)| Ok((decode_day(day)?, count.decode_count()?)))
            .collect::<Result<_, ApiError>>()?;
        Ok(PostsByDate {
            user: wire.user,
            tag: decode_tags(&wire.tag),
            dates,
        })
    }
}

#[derive(Deserialize)]
pub(crate) struct WireNote {
    id: String,
    #[serde(default)]
    title: String,
    length: WireInt,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    hash: String,
    text: Option<String>,
}

impl TryFrom<WireNote> for Note {
    type Error = ApiError;

    fn try_from(wire: WireNote) -> Result<Self, Self::Error> {
        Ok(Note {
            length: wire.length.decode_count()?,
            created: NOTE_TIME.decode(&wire.created_at)?,
            updated: NOTE_TIME.decode(&wire.updated_at)?,
            id: wire.id,
            title: wire.title,
            hash: wire.hash,
            text: wire.text,
        })
    }
}

#[derive(Deserialize)]
pub(crate) struct WireNotes {
    count: WireInt,
    notes: Vec<WireNote>,
}

impl TryFrom<WireNotes> for Notes {
    type Error = ApiError;

    fn try_from(wire: WireNotes) -> Result<Self, Self::Error> {
        let notes = Notes {
            count: wire.count.decode_count()?,
            notes: decode_all(wire.notes)?,
        };
        if !notes.is_consistent() {
            tracing::warn!(
                count = notes.count,
                received = notes.notes.len(),
                "note count does not match the notes received"
            );
        }
        Ok(notes)
    }
}

#[derive(Deserialize)]
pub(crate) struct WireUpdate {
    update_time: String,
}

impl WireUpdate {
    pub(crate) fn decode(&self) -> Result<Instant, ApiError> {
        BOOKMARK_TIME.decode(&self.update_time)
    }
}

#[derive(Deserialize)]
pub(crate) struct WireResult {
    pub(crate) result: String,
}

// ---------------------------------------------------------------------------
// Decoding helpers
// ---------------------------------------------------------------------------

/// Deserialize a body into its wire shape, reporting shape errors as
/// `IrregularPayloadShape`.
pub(crate) fn from_json<W: DeserializeOwned>(body: &str) -> Result<W, ApiError> {
    serde_json::from_str(body).map_err(ApiError::payload)
}

/// Deserialize into the wire shape `W`, then run the field codecs.
pub(crate) fn decode<W, T>(body: &str) -> Result<T, ApiError>
where
    W: DeserializeOwned,
    T: TryFrom<W, Error = ApiError>,
{
    T::try_from(from_json::<W>(body)?)
}

pub(crate) fn decode_all<W, T>(items: Vec<W>) -> Result<Vec<T>, ApiError>
where
    T: TryFrom<W, Error = ApiError>,
{
    items.into_iter().map(T::try_from).collect()
}

/// Decode the `posts/suggest` payload.
///
/// The service answers with an array of single-key objects, one keyed
/// `popular` and one keyed `recommended`, in no fixed order and sometimes
/// with one of them missing. The first element holding each key wins; a
/// missing key yields an empty list. Neither key present is an error.
pub(crate) fn decode_suggested_tags(body: &str) -> Result<SuggestedTags, ApiError> {
    let Value::Array(entries) = from_json::<Value>(body)? else {
        return Err(ApiError::IrregularPayloadShape(
            "suggested tags: expected a JSON array".to_string(),
        ));
    };

    let popular = find_tag_list(&entries, "popular")?;
    let recommended = find_tag_list(&entries, "recommended")?;
    if popular.is_none() && recommended.is_none() {
        return Err(ApiError::IrregularPayloadShape(
            "suggested tags: neither \"popular\" nor \"recommended\" present".to_string(),
        ));
    }
    Ok(SuggestedTags {
        popular: popular.unwrap_or_default(),
        recommended: recommended.unwrap_or_default(),
    })
}

fn find_tag_list(entries: &[Value], key: &str) -> Result<Option<Vec<String>>, ApiError> {
    let Some(value) = entries.iter().find_map(|entry| entry.get(key)) else {
        return Ok(None);
    };
    let Value::Array(items) = value else {
        return Err(ApiError::IrregularPayloadShape(format!(
            "suggested tags: \"{key}\" is not an array"
        )));
    };
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ApiError::IrregularPayloadShape(format!(
                    "suggested tags: \"{key}\" holds a non-string entry"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Decode the `tags/get` tag cloud. An account without tags comes back as an
/// empty array rather than an empty object.
pub(crate) fn decode_tag_counts(body: &str) -> Result<BTreeMap<String, u32>, ApiError> {
    match from_json::<Value>(body)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(tag, count)| {
                let count: WireInt = serde_json::from_value(count).map_err(ApiError::payload)?;
                Ok((tag, count.decode_count()?))
            })
            .collect(),
        Value::Array(items) if items.is_empty() => Ok(BTreeMap::new()),
        _ => Err(ApiError::IrregularPayloadShape(
            "tag counts: expected a JSON object".to_string(),
        )),
    }
}
