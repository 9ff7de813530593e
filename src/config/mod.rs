//! Configuration Management
//!
//! This module handles loading the feed configuration from the environment.

pub mod feed;

// Re-export
pub use feed::FeedConfig;
