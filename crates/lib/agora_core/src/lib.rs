//! # agora_core
//!
//! Core domain logic for Agora: signed session tokens, the session issuer,
//! the ownership guard, and the storage collaborators behind them.

pub mod access;
pub mod auth;
pub mod migrate;
pub mod models;
pub mod store;
