//! Typed client core for the Pinboard bookmarking API.
//!
//! # Overview
//! Turns typed method calls into the API's exact query strings (sorted
//! parameters, `yes`/`no` booleans, space-joined tags, two timestamp
//! dialects) and decodes its JSON back into domain types. The core never
//! touches the network itself (host-does-IO pattern): every operation
//! returns a [`Call`] that the caller runs on a blocking [`Executor`], an
//! [`AsyncExecutor`], or its own transport.
//!
//! # Design
//! - `PinboardClient` is stateless; it holds only the endpoint and token.
//! - Parameter names are bound to codecs in one table (`params`), and
//!   response fields are bound to codecs in the `TryFrom` conversions of
//!   `model`.
//! - No retries, no caching. A mutation the service did not confirm is
//!   `Ok(false)`; errors are reserved for failed preconditions, transport
//!   failures and undecodable payloads.

pub mod call;
pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "ureq")]
pub mod executor;
pub mod http;
pub mod model;
pub mod params;
pub mod query;
pub mod scalar;
pub mod temporal;

pub use call::{AsyncExecutor, Call, Executor};
pub use client::PinboardClient;
pub use config::{ClientConfig, ExecutorConfig, DEFAULT_ENDPOINT};
pub use error::ApiError;
#[cfg(feature = "ureq")]
pub use executor::UreqExecutor;
pub use http::{HttpRequest, HttpResponse};
pub use model::{Bookmark, Bookmarks, Note, Notes, PostsByDate, SuggestedTags};
pub use query::{AllPostsQuery, NewPost, PostsQuery, RecentQuery};
pub use temporal::{Instant, BOOKMARK_TIME, NOTE_TIME};
