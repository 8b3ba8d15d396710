//! Use-case layer over the record repositories.
//!
//! # Responsibility
//! - Offer the single caller-facing store surface (`RecordStore`).
//! - Keep UI/FFI layers decoupled from which backend is active.

pub mod record_store;
