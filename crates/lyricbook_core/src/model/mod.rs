//! Domain model for persisted song records.
//!
//! # Responsibility
//! - Define the single record shape shared by every storage backend.
//!
//! # Invariants
//! - A record is identified by its `title`; no other identity exists.
//! - The serialized JSON shape is identical on every backend.

pub mod record;
