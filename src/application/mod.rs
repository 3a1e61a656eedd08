//! Application layer - orchestrates the crawl, plan and render pipeline

pub mod errors;
pub mod generate_project;
pub mod plan_blueprint;
pub mod types;

pub use errors::*;
pub use generate_project::*;
pub use plan_blueprint::*;
pub use types::*;
