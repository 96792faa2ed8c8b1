//! Mnemo - Local-First Personal Context Store
//!
//! Normalizes heterogeneous text (chat messages, issues, emails, calendar
//! events, AI conversation exports) into a uniform document shape, embeds it,
//! and makes it searchable by meaning or keyword. Retrieval is hybrid: vector
//! similarity first, with a deterministic fallback to keyword matching when
//! the closest vector match is weak.

pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod retrieval;
pub mod storage;

pub use error::{MnemoError, Result};
