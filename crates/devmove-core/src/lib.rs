//! Core types, configuration, and error handling for devmove.
//!
//! This crate provides the shared foundation used by the other devmove crates:
//! - [`DevmoveError`]: unified error type using `thiserror`
//! - [`DevmoveConfig`]: configuration loaded from `.devmove.toml`
//! - Shared types: [`ContributionEvent`], [`Side`], [`PartitionLayout`],
//!   [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{DevmoveConfig, GroupsConfig, MovementConfig, OutputConfig, WindowConfig};
pub use error::DevmoveError;
pub use types::{ContributionEvent, OutputFormat, PartitionLayout, Side};

/// A convenience `Result` type for devmove operations.
pub type Result<T> = std::result::Result<T, DevmoveError>;
