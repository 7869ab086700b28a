//! Utilities module - text truncation, filename sanitizing and escaping

pub mod text_utils;

pub use text_utils::TextUtils;
