//! Flutter bridge crate for LyricBook.

pub mod api;
