//! Configuration module for Shelf-Watch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use shelf_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shelf-watch.toml")).unwrap();
//! println!("Watching catalog at: {}", config.source.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, OutputConfig, SourceConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
