// Public API for integration tests and the client library

pub mod abuse;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod game;
pub mod janitor;
pub mod protocol;
pub mod state;
pub mod store;
pub mod types;
pub mod validation;
