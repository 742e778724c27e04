//! # vkbind-gen
//!
//! Turns extension descriptors into a typed binding layer.
//!
//! For every extension the generated module contains:
//!
//! - typed constants, enums, bitmasks, handles, callbacks and structs;
//! - a wrapper struct (`VulkanLoader`, `KhrSurfaceLoader`, ...) with one
//!   `unsafe` method per function, named exactly as in the descriptor;
//! - its `FunctionLoader` impl, resolving global and context functions;
//! - `const` assertions that each typed declaration has the native layout.
//!
//! The library is used from build scripts through [`generate_dir`] and
//! [`write_bindings`], and from the `vkbind-gen` command line tool.

pub mod config;
mod emit;
mod output;
mod writer;

pub use config::GenConfig;
pub use emit::generate;
pub use output::{generate_dir, is_up_to_date, write_bindings, WriteOutcome};
