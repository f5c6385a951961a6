//! Synchronous client for the Pinboard-style bookmarking API.
//!
//! # Overview
//! Translates method calls into authenticated, URL-encoded GET requests and
//! decodes the JSON replies into typed posts, tag counts and date counts.
//!
//! ```no_run
//! use pinboard_core::PinboardClient;
//!
//! # fn example() -> pinboard_core::Result<()> {
//! let client = PinboardClient::new("alice:0123456789ABCDEF");
//! client
//!     .add_post_with("https://www.rust-lang.org/", "Rust")
//!     .tags("rust programming")
//!     .shared(false)
//!     .send()?;
//!
//! for tag in client.get_all_tags()? {
//!     println!("{} {}", tag.count, tag.tag);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `PinboardClient` is immutable and cheap to clone; each call builds its
//!   own parameter set and performs one GET with no retries.
//! - Configurable operations return a fluent builder (`ops`). Setters never
//!   fail; the first validation error is reported by `send()` before any
//!   I/O happens.
//! - Request building (`build_request`) and response interpretation
//!   (`parse`) are pure, so the pipeline is testable with a stub
//!   `Transport`. `UreqTransport` is the blocking default.
//! - Malformed entries in bulk replies either fail the call or are skipped,
//!   depending on `ParseMode`.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod ops;
pub mod params;
pub mod parse;
pub mod transport;
pub mod types;
pub mod validate;

#[cfg(test)]
mod testing;

pub use client::PinboardClient;
pub use config::{ClientConfig, ParseMode};
pub use credentials::Credentials;
pub use error::{ApiError, Result, ValidationError};
pub use http::{HttpRequest, HttpResponse};
pub use ops::{AddPost, GetAllPosts, GetPosts, GetRecentPosts};
pub use params::{ParamValue, Params};
pub use transport::{CancelToken, Transport, UreqTransport};
pub use types::{DateCount, Post, PostSource, SuggestedTags, TagCount};
pub use validate::{parse_tags, Limits, Validator};
