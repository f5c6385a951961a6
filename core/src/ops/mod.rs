//! Fluent request builders, one per configurable operation.
//!
//! # Design
//! Every setter validates its argument and either stores it or records the
//! error in a `ValidationLog`, then hands the builder back. Nothing fails
//! mid-chain. `params()` is the "build or first error" step; `send()` runs
//! it and only touches the network when no error was recorded. Only fields
//! that were explicitly set end up in the parameter set, apart from the
//! fields an operation requires.

mod add_post;
mod get_all_posts;
mod get_posts;
mod get_recent_posts;

pub use add_post::AddPost;
pub use get_all_posts::GetAllPosts;
pub use get_posts::GetPosts;
pub use get_recent_posts::GetRecentPosts;
