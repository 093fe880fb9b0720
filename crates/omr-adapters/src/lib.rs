//! OMR Adapters - External adapters for omr.
//!
//! This crate provides adapters for:
//! - Filesystem storage of diagnostic images with age-based retention
//! - Layered TOML configuration producing an engine configuration

pub mod config;
pub mod fs;

pub use config::AppConfig;
pub use fs::FsDebugStorage;
