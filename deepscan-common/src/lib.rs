//! # DeepScan Common Library
//!
//! Shared code for the DeepScan services:
//! - Error type used by every service layer
//! - Bootstrap configuration (TOML schema) and root folder resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
