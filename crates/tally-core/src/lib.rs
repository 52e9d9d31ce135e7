//! Core types and components of the Tally engagement ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage is reached through [`store::EngagementStore`], credential checks
//! through [`resolve::IdentityProvider`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod cache;
pub mod comment;
pub mod engagement;
pub mod engine;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod resolve;
pub mod store;
pub mod subject;
pub mod views;

pub use engine::Engagement;
pub use error::{Error, Result};
