//! Stockwatch domain logic.
//!
//! Everything in this crate is pure (no database or network access) so it
//! can be tested in isolation and shared by the `db`, `events`, and `api`
//! crates.

pub mod channels;
pub mod dedup;
pub mod error;
pub mod recipients;
pub mod stock;
pub mod types;
