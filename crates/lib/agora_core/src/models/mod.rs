//! Domain models shared by the stores, the session issuer and the API layer.

pub mod auth;
pub mod board;
