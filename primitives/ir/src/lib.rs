#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! rpcgen service description
//!
//! This crate defines the structured representation of a protocol-definition
//! source file. The parser produces one [`ServiceDescription`] per run and every
//! generation stage reads it by reference afterwards.

pub mod service_description;

// Re-export the main description types for convenience
pub use service_description::*;
