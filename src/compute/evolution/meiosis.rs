//! Meiosis: one gamete chromosome from a diploid genome.

use rand::Rng;

use crate::schema::{Chromosome, Genome, MutationConfig};

use super::genome::GenomeRng;
use super::mutation::mutate;

/// Crossover of the two chromosomes of `genome`, without mutation.
///
/// Each position takes the gene of whichever chromosome has one, picking
/// uniformly where both do. The insertion history comes from the longer
/// chromosome (the first on a tie), so every recorded position stays valid.
pub fn recombine(genome: &Genome, rng: &mut GenomeRng) -> Chromosome {
    let (first, second) = (genome.first(), genome.second());
    let genes = (0..genome.len())
        .filter_map(|i| match (first.get(i), second.get(i)) {
            (Some(a), Some(b)) => Some(if rng.gen_bool(0.5) { a } else { b }),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        })
        .cloned()
        .collect();

    let history = if first.len() >= second.len() {
        first.insertions()
    } else {
        second.insertions()
    };
    let mut child = Chromosome::from_genes(genes);
    child.set_insertions(history.to_vec());
    child
}

/// Produce one mutated gamete chromosome.
///
/// Recombination, one meiosis of history ageing, a mutation pass, and a
/// final trim of the insertion history.
pub fn meiosis(genome: &Genome, config: &MutationConfig, rng: &mut GenomeRng) -> Chromosome {
    let mut child = recombine(genome, rng);
    child.age_history();
    let report = mutate(&mut child, config, rng);
    child.trim_history(config.max_insertion_history);
    log::trace!(
        "Meiosis: {} genes from ({}, {}), {} changes",
        child.len(),
        genome.first().len(),
        genome.second().len(),
        report.total()
    );
    child
}
