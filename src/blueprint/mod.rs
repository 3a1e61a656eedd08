//! Blueprint domain - the structured integration plan shared by the planners
//! and the scaffold renderer

pub mod errors;
pub mod types;
pub mod validator;

pub use errors::*;
pub use types::*;
pub use validator::*;
