//! Core business logic for riviu.
//!
//! Services wrap the repositories of `riviu-db` and hold the rules the HTTP layer
//! relies on: authorization, validation, aggregation of ratings and likes, the
//! review feed with its search and mood classification, and the session context.

pub mod services;

pub use services::*;
