//! Sexual reproduction and the population loop.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::compute::{BodyCell, Development, DiscardReason, Embryo, decode};
use crate::schema::{BreedingConfig, ConfigError, GeneticsConfig, Genome};

use super::alignment::align;
use super::genome::GenomeRng;
use super::meiosis::meiosis;

/// Whether two genomes may breed: their expressed lengths must stay within
/// `BreedingConfig::compatibility_bound` of each other.
pub fn is_compatible(a: &Genome, b: &Genome, config: &BreedingConfig) -> bool {
    a.expressed_len().abs_diff(b.expressed_len()) <= config.compatibility_bound
}

/// Conceive one offspring genome: a gamete from each parent, paired and
/// aligned. `None` when the parents are incompatible.
pub fn reproduce(
    a: &Genome,
    b: &Genome,
    config: &GeneticsConfig,
    rng: &mut GenomeRng,
) -> Option<Genome> {
    if !is_compatible(a, b, &config.breeding) {
        return None;
    }
    let first = meiosis(a, &config.mutation, rng);
    let second = meiosis(b, &config.mutation, rng);
    Some(align(
        Genome::new(first, second),
        config.mutation.max_insertion_history,
    ))
}

/// A live member of the population.
#[derive(Debug, Clone)]
pub struct Organism {
    /// Unique identifier.
    pub id: u64,
    pub genome: Genome,
    pub embryo: Embryo,
    /// Generation born.
    pub generation: usize,
    /// Parent IDs; `None` for seeded organisms.
    pub parents: Option<[u64; 2]>,
}

/// Summary of one generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    /// Population size after the generation.
    pub population: usize,
    /// Offspring genomes conceived.
    pub conceived: usize,
    /// Pairings refused as incompatible.
    pub incompatible: usize,
    /// Conceived offspring that developed into viable embryos.
    pub viable: usize,
    pub discarded: usize,
    /// Mean body cell count over the population.
    pub mean_cells: f32,
    /// Mean chromosome length over the population.
    pub mean_genome_len: f32,
}

/// Errors from setting up a population.
#[derive(Debug, thiserror::Error)]
pub enum NurseryError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Seed genome is not viable: {0:?}")]
    SeedNotViable(DiscardReason),
}

/// Breeds a population of organisms generation by generation.
///
/// Each generation draws random parent pairs, then conceives and decodes
/// every offspring in parallel and admits the viable ones. The oldest organisms
/// make room once the population exceeds its configured size.
pub struct Nursery {
    config: GeneticsConfig,
    rng: GenomeRng,
    population: Vec<Organism>,
    generation: usize,
    next_id: u64,
}

impl Nursery {
    /// Create an empty nursery.
    pub fn new(config: GeneticsConfig) -> Result<Self, NurseryError> {
        config.validate()?;
        let rng = match config.random_seed {
            Some(seed) => GenomeRng::new(seed),
            None => GenomeRng::random(),
        };
        Ok(Self {
            config,
            rng,
            population: Vec::new(),
            generation: 0,
            next_id: 0,
        })
    }

    pub fn config(&self) -> &GeneticsConfig {
        &self.config
    }

    pub fn population(&self) -> &[Organism] {
        &self.population
    }

    /// Generations bred so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    fn root(&self) -> BodyCell {
        BodyCell::root(self.config.development.root_size)
    }

    /// Fill the population with clones of the configured seed genome.
    pub fn seed(&mut self) -> Result<(), NurseryError> {
        let genome = self.config.seed.to_genome();
        let embryo = match decode(&genome, self.root(), &self.config.development) {
            Development::Viable(embryo) => embryo,
            Development::Discarded(discard) => {
                return Err(NurseryError::SeedNotViable(discard.reason));
            }
        };
        log::info!(
            "Seeding {} organisms of {} cells from {:?}",
            self.config.population.size,
            embryo.cell_count(),
            self.config.seed
        );

        self.population.clear();
        self.generation = 0;
        for _ in 0..self.config.population.size {
            let id = self.next_id;
            self.next_id += 1;
            self.population.push(Organism {
                id,
                genome: genome.clone(),
                embryo: embryo.clone(),
                generation: 0,
                parents: None,
            });
        }
        Ok(())
    }

    /// Pick two distinct population indices.
    fn select_pair(&mut self) -> (usize, usize) {
        let n = self.population.len();
        let i = self.rng.gen_range(0..n);
        let mut j = self.rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        (i, j)
    }

    /// Breed one generation.
    pub fn step(&mut self) -> GenerationStats {
        self.generation += 1;
        let mut stats = GenerationStats {
            generation: self.generation,
            ..Default::default()
        };

        // Pairings and their generators are drawn in order; breeding and
        // development then run in parallel, each task owning its generator.
        let pairings: Vec<_> = if self.population.len() >= 2 {
            (0..self.config.population.offspring_per_generation)
                .map(|_| {
                    let (i, j) = self.select_pair();
                    (i, j, self.rng.fork())
                })
                .collect()
        } else {
            Vec::new()
        };

        let population = &self.population;
        let config = &self.config;
        let outcomes: Vec<_> = pairings
            .into_par_iter()
            .map(|(i, j, mut rng)| {
                let (a, b) = (&population[i], &population[j]);
                let genome = reproduce(&a.genome, &b.genome, config, &mut rng)?;
                let development = &config.development;
                let outcome = decode(&genome, BodyCell::root(development.root_size), development);
                Some((genome, [a.id, b.id], outcome))
            })
            .collect();

        stats.incompatible = outcomes.iter().filter(|o| o.is_none()).count();
        stats.conceived = outcomes.len() - stats.incompatible;

        for (genome, parents, outcome) in outcomes.into_iter().flatten() {
            match outcome {
                Development::Viable(embryo) => {
                    stats.viable += 1;
                    let id = self.next_id;
                    self.next_id += 1;
                    self.population.push(Organism {
                        id,
                        genome,
                        embryo,
                        generation: self.generation,
                        parents: Some(parents),
                    });
                }
                Development::Discarded(discard) => {
                    stats.discarded += 1;
                    log::trace!(
                        "Offspring of {:?} discarded after {} steps: {:?}",
                        parents,
                        discard.steps,
                        discard.reason
                    );
                }
            }
        }

        let excess = self
            .population
            .len()
            .saturating_sub(self.config.population.size);
        self.population.drain(..excess);

        stats.population = self.population.len();
        if !self.population.is_empty() {
            let n = self.population.len() as f32;
            stats.mean_cells = self
                .population
                .iter()
                .map(|o| o.embryo.cell_count() as f32)
                .sum::<f32>()
                / n;
            stats.mean_genome_len = self
                .population
                .iter()
                .map(|o| o.genome.len() as f32)
                .sum::<f32>()
                / n;
        }

        log::debug!(
            "Generation {}: {} conceived, {} viable, {} discarded, {} incompatible",
            stats.generation,
            stats.conceived,
            stats.viable,
            stats.discarded,
            stats.incompatible
        );
        stats
    }

    /// Breed `generations` generations, reporting each through `callback`.
    pub fn run<F>(&mut self, generations: usize, mut callback: F) -> Vec<GenerationStats>
    where
        F: FnMut(&GenerationStats),
    {
        (0..generations)
            .map(|_| {
                let stats = self.step();
                callback(&stats);
                stats
            })
            .collect()
    }
}
