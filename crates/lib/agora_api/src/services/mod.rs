//! Business logic between handlers and the core.

pub mod auth;
pub mod comments;
pub mod cookies;
pub mod likes;
pub mod posts;
