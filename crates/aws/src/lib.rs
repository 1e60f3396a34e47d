//! AWS integration for fncache
//!
//! This crate provides the Amazon S3 transport used by the fncache remote
//! store. Any S3-compatible service works when an endpoint override is set.

pub mod s3;

// Re-export main types for convenience
pub use s3::{S3Transport, remote_store};
