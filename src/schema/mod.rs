//! Schema module - Heritable data model and configuration types.

mod atom;
mod chromosome;
mod config;
mod gene;
mod restriction;
mod seed;

pub use atom::*;
pub use chromosome::*;
pub use config::*;
pub use gene::*;
pub use restriction::*;
pub use seed::*;
