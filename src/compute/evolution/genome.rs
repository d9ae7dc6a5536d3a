//! Random generation utilities for genetic operators.
//!
//! Every operator that needs randomness takes a [`GenomeRng`], so runs are
//! reproducible from a single seed.

use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::schema::{
    Atom, AttributePayload, BodyProperty, BranchRestriction, Chromosome, DivisionProperty, Gene,
    GeneKind, JointProperty, MuscleProperty, NeuronProperty, PartProperty, Selector, Side,
    Transfer,
};

/// Number of non-placeholder gene kinds [`GenomeRng::random_gene`] draws from.
const GENE_KINDS: u32 = 14;

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from OS entropy, for unseeded runs.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seed for a derived generator.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Independent generator seeded from this one; used to hand each
    /// parallel breeding task its own stream.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_seed())
    }

    /// Fresh dominance identifier.
    pub fn dominance(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Bernoulli trial; probabilities outside `(0, 1)` saturate.
    pub fn chance(&mut self, probability: f32) -> bool {
        if !(probability > 0.0) {
            return false;
        }
        probability >= 1.0 || self.rng.r#gen::<f32>() < probability
    }

    /// Standard normal sample.
    pub fn normal(&mut self) -> f32 {
        self.rng.sample(StandardNormal)
    }

    /// Random restriction with up to three active levels.
    pub fn random_restriction(&mut self) -> BranchRestriction {
        let mut restriction = BranchRestriction::unrestricted();
        let levels = self.rng.gen_range(0..=3usize);
        for depth in 0..levels {
            restriction.randomize_level(depth, &mut self.rng);
        }
        restriction.set_active_levels(levels);
        restriction
    }

    fn payload<S: Selector>(&mut self) -> AttributePayload {
        let attribute = S::ALL[self.rng.gen_range(0..S::ALL.len())];
        let payload = AttributePayload::new(attribute, self.normal());
        if self.rng.gen_bool(0.2) {
            payload.scaling()
        } else {
            payload
        }
    }

    fn selector<S: Selector>(&mut self) -> Atom<u8> {
        Atom::new(self.rng.gen_range(0..S::ALL.len()) as u8)
    }

    /// Random gene of any kind except NoOp, with a fresh dominance identifier.
    pub fn random_gene(&mut self) -> Gene {
        let kind = match self.rng.gen_range(0..GENE_KINDS) {
            0 => GeneKind::Stop,
            1 => GeneKind::Skip {
                restriction: self.random_restriction(),
                distance: Atom::new(self.rng.gen_range(1..=3)),
            },
            2 => GeneKind::DivisionParam {
                restriction: self.random_restriction(),
                param: self.selector::<DivisionProperty>(),
                value: Atom::new(self.normal()),
            },
            3 => GeneKind::ChildOffset {
                restriction: self.random_restriction(),
                child: self.selector::<Side>(),
                offset: Atom::new(self.rng.gen_range(-2..=2)),
            },
            4 => GeneKind::PartAttribute {
                restriction: self.random_restriction(),
                payload: self.payload::<PartProperty>(),
            },
            5 => GeneKind::JointAttribute {
                restriction: self.random_restriction(),
                payload: self.payload::<JointProperty>(),
            },
            6 => GeneKind::MuscleAttribute {
                restriction: self.random_restriction(),
                payload: self.payload::<MuscleProperty>(),
            },
            7 => GeneKind::BodyAttribute {
                restriction: self.random_restriction(),
                payload: self.payload::<BodyProperty>(),
            },
            8 => GeneKind::VmsOffset {
                restriction: self.random_restriction(),
                offset: Atom::new(self.normal()),
            },
            9 => GeneKind::NeuronDeclaration {
                restriction: self.random_restriction(),
                output: Atom::new(self.normal()),
            },
            10 => GeneKind::TransferFunction {
                restriction: self.random_restriction(),
                function: self.selector::<Transfer>(),
            },
            11 => GeneKind::NeuralBias {
                restriction: self.random_restriction(),
                bias: Atom::new(self.normal()),
            },
            12 => GeneKind::NeuralParam {
                restriction: self.random_restriction(),
                param: self.selector::<NeuronProperty>(),
                value: Atom::new(self.normal()),
            },
            _ => GeneKind::Synapse {
                restriction: self.random_restriction(),
                input: Atom::new(self.normal()),
                weight: Atom::new(self.normal()),
            },
        };
        Gene::new(kind, self.dominance())
    }

    /// Random chromosome of `len` genes with an empty insertion history.
    pub fn random_chromosome(&mut self, len: usize) -> Chromosome {
        Chromosome::from_genes((0..len).map(|_| self.random_gene()).collect())
    }
}

impl RngCore for GenomeRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = GenomeRng::new(42);
        let mut b = GenomeRng::new(42);
        assert_eq!(a.random_chromosome(20), b.random_chromosome(20));
        assert_eq!(a.next_seed(), b.next_seed());
    }

    #[test]
    fn test_random_genes_are_never_no_op() {
        let mut rng = GenomeRng::new(1);
        for _ in 0..500 {
            let gene = rng.random_gene();
            assert!(!gene.is_no_op());
            if let Some(restriction) = gene.kind.restriction() {
                assert!(restriction.active_levels() <= 3);
            }
        }
    }

    #[test]
    fn test_chance_saturates() {
        let mut rng = GenomeRng::new(5);
        assert!(!rng.chance(0.0));
        assert!(!rng.chance(-1.0));
        assert!(!rng.chance(f32::NAN));
        assert!(rng.chance(1.0));
        assert!(rng.chance(3.0));
    }

    #[test]
    fn test_fork_diverges_from_parent() {
        let mut parent = GenomeRng::new(9);
        let mut child = parent.fork();
        assert_ne!(parent.next_seed(), child.next_seed());
    }
}
