//! # Repository Pattern Implementation
//!
//! - [`LinkRepository`] is the lookup contract the enrichment providers
//!   depend on (artist/album reference URLs, artist image fields)
//! - [`SqliteLinkRepository`] implements it on the pool from [`crate::db`]

pub mod links;

pub use links::{LinkRepository, SqliteLinkRepository};
