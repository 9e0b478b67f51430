//! Text renderers for remapped segment codes.
//!
//! Turns a `RemappedMapping` into binary / hexadecimal listings or source
//! arrays (C, Rust, JSON) and writes them to disk or stdout.

pub mod error;
pub mod format;
pub mod writer;

pub use error::ExportError;
pub use format::{OutputFormat, render};
pub use writer::{save_mapping, suffixed_path, write_mapping};
