//! Application services layer: list pipeline, services, views.

pub mod categories;
pub mod comments;
pub mod error;
pub mod identity;
pub mod listing;
pub mod media;
pub mod metrics;
pub mod pagination;
pub mod posts;
pub mod reactions;
pub mod repos;
pub mod services;
pub mod users;
pub mod views;
