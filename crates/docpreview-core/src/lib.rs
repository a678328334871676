//! Docpreview Core Library
//!
//! This crate provides the configuration and error types shared by the preview
//! pipeline and the binaries that drive it.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::PreviewConfig;
pub use error::PreviewError;
