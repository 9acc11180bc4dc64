//! # Local Link Store
//!
//! SQLite-backed store of per-artist and per-album reference URLs plus the
//! artist image fields, consulted first by the link and artist-image
//! provider chains.
//!
//! ## Overview
//!
//! - [`db`]: connection pool, pragmas, embedded migrations
//! - [`models`]: [`ArtistRecord`] / [`AlbumRecord`] rows and their typed URL fields
//! - [`repositories`]: the [`LinkRepository`] lookup contract and its SQLite implementation
//! - [`normalize`]: the search-key normalization shared with the resolver cache
//!
//! Lookups match names exactly (after normalization) first and fall back to
//! a partial match, mirroring how hand-maintained library databases tend to
//! spell artists slightly differently from tag data.

pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{AlbumRecord, ArtistRecord, ServiceUrls};
pub use repositories::{LinkRepository, SqliteLinkRepository};
