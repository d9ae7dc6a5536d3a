//! Per-chromosome mutation pass.
//!
//! The per-gene probabilities are scaled so that the expected number of
//! gene-level changes in a pass stays near `MutationConfig::expected_mutations`
//! whatever the chromosome length.

use rand::Rng;

use crate::schema::{Chromosome, Gene, MutationConfig, drift_meta};

use super::genome::GenomeRng;

/// Where the pass placed its new gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Replaced a NoOp in place; the length is unchanged.
    Overwrite(usize),
    /// True insertion, recorded in the insertion history.
    Insert(usize),
}

/// Summary of one mutation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub deletions: usize,
    pub swaps: usize,
    /// Genes with at least one field that actually changed.
    pub mutated_genes: usize,
    pub field_changes: usize,
    pub insertion: Option<Placement>,
}

impl MutationReport {
    /// Number of gene-level changes, insertion included.
    pub fn total(&self) -> usize {
        self.deletions + self.swaps + self.field_changes + usize::from(self.insertion.is_some())
    }
}

/// Total mutation propensity of one gene.
fn propensity(gene: &mut Gene, floor: f32) -> f32 {
    let fields: f32 = gene
        .kind
        .atoms_mut()
        .iter()
        .map(|atom| atom.chance().max(floor))
        .sum();
    gene.chance_to_delete + gene.chance_to_swap + fields
}

/// Probability multiplier that keeps the expected change count bounded.
fn scale_factor(chromosome: &mut Chromosome, config: &MutationConfig) -> f32 {
    let total: f32 = chromosome
        .genes_mut()
        .iter_mut()
        .map(|gene| propensity(gene, config.field_chance_floor))
        .sum();
    if total > 0.0 {
        (config.expected_mutations / total).min(1.0)
    } else {
        1.0
    }
}

/// Perturb the fields of one gene; returns the number that changed. A gene
/// with any changed field gets a fresh dominance identifier.
fn mutate_fields(gene: &mut Gene, floor: f32, scale: f32, rng: &mut GenomeRng) -> usize {
    let mut changed = 0;
    for atom in gene.kind.atoms_mut() {
        let chance = atom.chance().max(floor) * scale;
        if rng.chance(chance) && atom.perturb(rng) {
            changed += 1;
        }
    }
    if changed > 0 {
        gene.dominance = rng.dominance();
    }
    changed
}

fn drift_gene(gene: &mut Gene, step: f32, rng: &mut GenomeRng) {
    for atom in gene.kind.atoms_mut() {
        atom.drift(step, rng);
    }
    gene.chance_to_delete = drift_meta(gene.chance_to_delete, step, rng);
    gene.chance_to_swap = drift_meta(gene.chance_to_swap, step, rng);
}

/// Run one mutation pass over `chromosome` in place.
///
/// Per gene, in order: deletion (replacement by NoOp), swap with the next
/// gene, field perturbation of whatever gene now occupies the slot, and
/// meta-parameter drift. A swapped-in gene is mutated in its new slot and
/// the swapped-out gene is visited on the next iteration, so no physical gene
/// is field-mutated twice. Afterwards at most one new random gene is placed,
/// with probability proportional to the length.
pub fn mutate(
    chromosome: &mut Chromosome,
    config: &MutationConfig,
    rng: &mut GenomeRng,
) -> MutationReport {
    let mut report = MutationReport::default();
    let scale = scale_factor(chromosome, config);
    let len = chromosome.len();

    for i in 0..len {
        let Some(gene) = chromosome.get(i) else {
            break;
        };
        let (delete, swap) = (gene.chance_to_delete * scale, gene.chance_to_swap * scale);

        if rng.chance(delete) {
            if let Some(slot) = chromosome.get_mut(i).filter(|g| !g.is_no_op()) {
                *slot = Gene::no_op(rng.dominance());
                report.deletions += 1;
            }
            continue;
        }

        if i + 1 < len && rng.chance(swap) {
            chromosome.swap(i, i + 1);
            report.swaps += 1;
        }

        if let Some(gene) = chromosome.get_mut(i) {
            let changed = mutate_fields(gene, config.field_chance_floor, scale, rng);
            if changed > 0 {
                report.mutated_genes += 1;
                report.field_changes += changed;
            }
            drift_gene(gene, config.meta_drift, rng);
        }
    }

    let insertion_chance = (config.insertion_rate * len as f32).min(1.0);
    if rng.chance(insertion_chance) {
        let gene = rng.random_gene();
        let position = rng.gen_range(0..=len);
        let overwrite = chromosome.get(position).is_some_and(Gene::is_no_op);
        let placement = if overwrite {
            if let Some(slot) = chromosome.get_mut(position) {
                *slot = gene;
            }
            Placement::Overwrite(position)
        } else {
            Placement::Insert(chromosome.insert_recorded(
                position,
                gene,
                config.max_insertion_history,
            ))
        };
        report.insertion = Some(placement);
    }

    chromosome.trim_history(config.max_insertion_history);
    log::trace!(
        "Mutation pass over {} genes (scale {:.4}): {:?}",
        len,
        scale,
        report
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Atom, AttributePayload, BranchRestriction, GeneKind, PartProperty};

    fn frozen_config() -> MutationConfig {
        MutationConfig {
            expected_mutations: 1e6,
            field_chance_floor: 0.0,
            meta_drift: 0.0,
            insertion_rate: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_op_chromosome_keeps_its_layout() {
        let mut chromosome = Chromosome::from_genes(
            (0..100)
                .map(|i| {
                    let mut gene = Gene::no_op(i);
                    gene.chance_to_delete = 0.0;
                    gene.chance_to_swap = 0.0;
                    gene
                })
                .collect(),
        );
        let config = MutationConfig {
            insertion_rate: 0.0,
            ..Default::default()
        };
        let mut rng = GenomeRng::new(11);
        let report = mutate(&mut chromosome, &config, &mut rng);

        assert_eq!(report, MutationReport::default());
        assert_eq!(chromosome.len(), 100);
        for (i, gene) in chromosome.genes().iter().enumerate() {
            assert!(gene.is_no_op());
            assert_eq!(gene.dominance, i as u64);
        }
    }

    #[test]
    fn test_meta_parameters_stay_non_negative() {
        let mut rng = GenomeRng::new(3);
        let mut chromosome = rng.random_chromosome(40);
        let config = MutationConfig {
            meta_drift: 0.5,
            ..Default::default()
        };
        for _ in 0..200 {
            mutate(&mut chromosome, &config, &mut rng);
        }
        for gene in chromosome.genes_mut() {
            assert!(gene.chance_to_delete >= 0.0);
            assert!(gene.chance_to_swap >= 0.0);
            for atom in gene.kind.atoms_mut() {
                assert!(atom.chance() >= 0.0);
            }
        }
    }

    #[test]
    fn test_history_never_exceeds_limit() {
        let mut rng = GenomeRng::new(8);
        let mut chromosome = rng.random_chromosome(30);
        let config = MutationConfig {
            insertion_rate: 1.0,
            max_insertion_history: 4,
            ..Default::default()
        };
        for _ in 0..50 {
            let report = mutate(&mut chromosome, &config, &mut rng);
            assert!(report.insertion.is_some());
            assert!(chromosome.insertions().len() <= 4);
            assert!(chromosome.history_is_sorted());
        }
    }

    #[test]
    fn test_swapped_gene_is_mutated_once() {
        // Every gene carries a flag that flips whenever its fields are
        // mutated, and a value that never changes and identifies it.
        let genes = (0..6)
            .map(|i| {
                let payload = AttributePayload {
                    attribute: Atom::with_meta(PartProperty::Hue as u8, 0.0, 0.0),
                    value: Atom::with_meta(i as f32, 0.0, 0.0),
                    multiplicative: Atom::with_meta(false, 1.0, 0.0),
                };
                let mut gene = Gene::new(
                    GeneKind::PartAttribute {
                        restriction: BranchRestriction::unrestricted(),
                        payload,
                    },
                    i,
                );
                gene.chance_to_delete = 0.0;
                gene.chance_to_swap = 1.0;
                gene
            })
            .collect();
        let mut chromosome = Chromosome::from_genes(genes);
        let mut rng = GenomeRng::new(4);
        let report = mutate(&mut chromosome, &frozen_config(), &mut rng);

        assert_eq!(report.swaps, 5);
        let order: Vec<f32> = chromosome
            .genes()
            .iter()
            .map(|gene| match &gene.kind {
                GeneKind::PartAttribute { payload, .. } => {
                    assert!(payload.multiplicative.get(), "gene mutated an even number of times");
                    payload.value.get()
                }
                other => panic!("unexpected kind {other:?}"),
            })
            .collect();
        // The first gene is carried to the end by the chain of swaps.
        assert_eq!(order, vec![1.0, 2.0, 3.0, 4.0, 5.0, 0.0]);
    }

    #[test]
    fn test_deletion_leaves_no_op() {
        let mut rng = GenomeRng::new(21);
        let mut chromosome = rng.random_chromosome(10);
        for gene in chromosome.genes_mut() {
            gene.chance_to_delete = 1.0;
        }
        let report = mutate(&mut chromosome, &frozen_config(), &mut rng);
        assert_eq!(report.deletions, 10);
        assert_eq!(chromosome.len(), 10);
        assert_eq!(chromosome.expressed_len(), 0);
    }

    #[test]
    fn test_insertion_overwrites_no_op() {
        let mut chromosome = Chromosome::from_genes(vec![Gene::no_op(0)]);
        chromosome.genes_mut()[0].chance_to_delete = 0.0;
        chromosome.genes_mut()[0].chance_to_swap = 0.0;
        let config = MutationConfig {
            insertion_rate: 1.0,
            ..frozen_config()
        };
        // Position 0 overwrites the NoOp; position 1 appends as a true insertion.
        for seed in 0..20 {
            let mut c = chromosome.clone();
            let report = mutate(&mut c, &config, &mut GenomeRng::new(seed));
            match report.insertion {
                Some(Placement::Overwrite(0)) => {
                    assert_eq!(c.len(), 1);
                    assert!(c.insertions().is_empty());
                }
                Some(Placement::Insert(1)) => {
                    assert_eq!(c.len(), 2);
                    assert_eq!(c.insertions()[0].position, 1);
                }
                other => panic!("unexpected placement {other:?}"),
            }
            assert!(!c.genes().iter().all(Gene::is_no_op));
        }
    }

    #[test]
    fn test_expected_change_count_is_length_independent() {
        let mut rng = GenomeRng::new(99);
        let config = MutationConfig {
            insertion_rate: 0.0,
            ..Default::default()
        };
        for len in [50, 500] {
            let original = rng.random_chromosome(len);
            let passes = 200;
            let total: usize = (0..passes)
                .map(|_| mutate(&mut original.clone(), &config, &mut rng).total())
                .sum();
            let mean = total as f32 / passes as f32;
            assert!(mean < 2.0 * config.expected_mutations, "mean {mean} at length {len}");
        }
    }
}
