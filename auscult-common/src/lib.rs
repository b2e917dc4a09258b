//! # Auscult Common Library
//!
//! Shared code for the Auscult services:
//! - Error type
//! - Bootstrap configuration loading (TOML, compiled defaults, override merging)

pub mod config;
pub mod error;

pub use error::{Error, Result};
