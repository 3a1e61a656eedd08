//! Project scaffolds and the renderer that turns a blueprint into a project
//!
//! A scaffold is loaded once, either from the bundle embedded in the binary
//! or from a directory, and is read-only afterwards.

pub mod context;
pub mod embedded;
pub mod errors;
pub mod filesystem_loader;
pub mod manifest;
pub mod output;
pub mod renderer;
pub mod sanitizers;
pub mod types;

pub use context::*;
pub use embedded::*;
pub use errors::*;
pub use filesystem_loader::*;
pub use manifest::*;
pub use output::*;
pub use renderer::*;
pub use sanitizers::*;
pub use types::*;
