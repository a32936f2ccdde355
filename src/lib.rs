//! iacforge: infrastructure-as-code generation from source archives
//! (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod analysis;
pub mod archive;
pub mod budget;
pub mod config;
pub mod constants;
pub mod detect;
pub mod env;
pub mod handlers;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod sanitize;
pub mod storage;
