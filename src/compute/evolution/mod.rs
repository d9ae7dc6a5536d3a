//! Genetic operators and the breeding loop.
//!
//! # Overview
//!
//! - **Randomness** (`genome`): the seedable [`GenomeRng`] handle threaded
//!   through every operator, plus random gene and chromosome generation
//! - **Mutation** (`mutation`): the length-normalized per-chromosome pass
//! - **Meiosis** (`meiosis`): crossover of a diploid genome into one gamete
//! - **Alignment** (`alignment`): restores positional correspondence between
//!   sister chromosomes from their insertion histories
//! - **Breeding** (`breeding`): compatibility, reproduction and the
//!   [`Nursery`] population loop
//!
//! # Example
//!
//! ```rust,no_run
//! use morphogen::schema::GeneticsConfig;
//! use morphogen::compute::evolution::Nursery;
//!
//! let mut nursery = Nursery::new(GeneticsConfig::default()).unwrap();
//! nursery.seed().unwrap();
//! nursery.run(10, |stats| {
//!     println!("Generation {}: {} viable of {}",
//!         stats.generation, stats.viable, stats.conceived);
//! });
//! ```

mod alignment;
mod breeding;
mod genome;
mod meiosis;
mod mutation;

pub use alignment::{align, align_pair};
pub use breeding::{
    GenerationStats, Nursery, NurseryError, Organism, is_compatible, reproduce,
};
pub use genome::GenomeRng;
pub use meiosis::{meiosis, recombine};
pub use mutation::{MutationReport, Placement, mutate};
