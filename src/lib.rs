//! Blog and discussion board: posts, categories, comments, likes and
//! favorites over pluggable document, object and identity backends.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
