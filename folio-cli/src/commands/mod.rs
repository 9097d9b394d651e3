//! CLI command implementations.

pub mod inspect;
pub mod resolve;

pub use inspect::{classify_file, normalize_labels};
pub use resolve::{show_languages, show_posts, show_tabs, PostsOptions};
