//! Compute module - Developmental decoding and genetic operators.

mod cell;
mod cumulative;
mod division;
mod ribosome;
mod wiring;

pub mod evolution;

pub use cell::*;
pub use cumulative::*;
pub use division::*;
pub use ribosome::*;
pub use wiring::*;
