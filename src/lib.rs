//! Morphogen - Developmental genome decoding for evolving virtual creatures.
//!
//! A diploid genome of mutation-parameterized genes is read by a
//! developmental decoder (the ribosome) that grows a tree of body cells by
//! repeated division and wires a neural controller between them by
//! nearest-coordinate matching. Genetic operators (meiosis, mutation and
//! alignment) produce offspring genomes that stay comparable position by
//! position across generations.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Heritable data (genes, chromosomes, genomes), branch
//!   restrictions, seed genomes and configuration
//! - `compute`: Development (ribosome, division, relaxation, neural wiring)
//!   and the genetic operators in `compute::evolution`
//!
//! # Example
//!
//! ```rust,no_run
//! use morphogen::{
//!     schema::{DevelopmentConfig, Organ, SeedGenome},
//!     compute::{BodyCell, Development, decode},
//! };
//!
//! let config = DevelopmentConfig::default();
//! let genome = SeedGenome::Symmetric.to_genome();
//!
//! match decode(&genome, BodyCell::root(config.root_size), &config) {
//!     Development::Viable(embryo) => {
//!         println!("{} cells, {} mouths", embryo.cell_count(), embryo.organ_count(Organ::Mouth));
//!     }
//!     Development::Discarded(discard) => println!("Discarded: {:?}", discard.reason),
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{GenomeRng, Nursery, align, meiosis, mutate};
pub use compute::{Development, Embryo, Ribosome, decode};
pub use schema::{Chromosome, Gene, GeneKind, GeneticsConfig, Genome};
