//! Core types and trait definitions for Questline.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the progression rules (XP, levels, tiers, streaks), the activity state
//! machines and the store traits that backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod catalog;
pub mod clan;
pub mod clock;
pub mod error;
pub mod leaderboard;
pub mod message;
pub mod profile;
pub mod progression;
pub mod showcase;
pub mod store;
pub mod user;

pub use error::{DomainError, Error, ErrorKind, Result};
