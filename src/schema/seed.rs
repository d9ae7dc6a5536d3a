//! Hand-authored seed genomes for starting a lineage.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::atom::{Atom, Selector};
use super::chromosome::{Chromosome, Genome};
use super::gene::{
    AttributePayload, BodyProperty, DivisionProperty, Gene, GeneKind, MuscleProperty, Organ,
    PartProperty, Transfer,
};
use super::restriction::{BranchRestriction, RestrictionCodeError, Side};

/// Predefined seed genomes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SeedGenome {
    /// A single Stop on both chromosomes: never viable.
    StopOnly,
    /// Root divides once into a mouth cell and a gonad cell, with one
    /// neuron listening to the mouth.
    #[default]
    Minimal,
    /// Two mirrored divisions: four cells with mouths, a gonad and an eye.
    Symmetric,
}

impl SeedGenome {
    /// Build the genome. Both chromosomes carry the same genes.
    pub fn to_genome(&self) -> Genome {
        let genes = match self {
            SeedGenome::StopOnly => SeedWriter::new().stop().finish(),
            SeedGenome::Minimal => minimal_genes(),
            SeedGenome::Symmetric => symmetric_genes(),
        };
        Genome::homozygous(Chromosome::from_genes(genes))
    }
}

fn minimal_genes() -> Vec<Gene> {
    SeedWriter::new()
        .child_offset(Side::Left, 0)
        .child_offset(Side::Right, 0)
        .stop()
        // Both children start reading here.
        .restricted("Lv")
        .part(PartProperty::Organ, Organ::Mouth.value())
        .vms_offset(1.0)
        .neuron(0.5)
        .synapse(0.0, 1.0)
        .restricted("Rv")
        .part(PartProperty::Organ, Organ::Gonad.value())
        .muscle(MuscleProperty::Strength, 1.0)
        .stop()
        .finish()
}

fn symmetric_genes() -> Vec<Gene> {
    SeedWriter::new()
        .child_offset(Side::Left, 0)
        .child_offset(Side::Right, 0)
        .division(DivisionProperty::Angle, FRAC_PI_2)
        .division(DivisionProperty::Mirror, 1.0)
        .stop()
        // Both children of the root.
        .child_offset(Side::Left, 0)
        .child_offset(Side::Right, 0)
        .division(DivisionProperty::Ratio, 0.6)
        .stop()
        // All four grandchildren.
        .restricted("Lv")
        .part(PartProperty::Organ, Organ::Mouth.value())
        .muscle(MuscleProperty::Strength, 1.0)
        .restricted("Rv")
        .part(PartProperty::Organ, Organ::Gonad.value())
        .vms_offset(0.5)
        .restricted("RvRv")
        .part(PartProperty::Organ, 1.0)
        .neuron(0.2)
        .transfer(Transfer::Tanh)
        .synapse(0.0, 2.0)
        .unrestricted()
        .body(BodyProperty::MetabolicRate, 1.0)
        .stop()
        .finish()
}

/// Sequential gene writer used to author seeds and test genomes.
///
/// Genes receive distinct, well-spread dominance identifiers in write order.
#[derive(Debug, Clone, Default)]
pub struct SeedWriter {
    genes: Vec<Gene>,
    restriction: BranchRestriction,
}

impl SeedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the following genes with a textual restriction code.
    pub fn try_restricted(mut self, code: &str) -> Result<Self, RestrictionCodeError> {
        self.restriction = code.parse()?;
        Ok(self)
    }

    /// Like [`SeedWriter::try_restricted`], for codes written in source.
    ///
    /// # Panics
    ///
    /// Panics on an invalid code.
    pub fn restricted(self, code: &str) -> Self {
        self.try_restricted(code)
            .unwrap_or_else(|e| panic!("invalid seed restriction {code:?}: {e}"))
    }

    /// Clear the restriction for the following genes.
    pub fn unrestricted(mut self) -> Self {
        self.restriction = BranchRestriction::unrestricted();
        self
    }

    /// Append a gene of any kind.
    pub fn push(mut self, kind: GeneKind) -> Self {
        let dominance = (self.genes.len() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        self.genes.push(Gene::new(kind, dominance));
        self
    }

    pub fn stop(self) -> Self {
        self.push(GeneKind::Stop)
    }

    pub fn no_op(self) -> Self {
        self.push(GeneKind::NoOp)
    }

    pub fn skip(self, distance: i32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::Skip {
            restriction,
            distance: Atom::new(distance),
        })
    }

    pub fn child_offset(self, child: Side, offset: i32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::ChildOffset {
            restriction,
            child: Atom::new(child.raw()),
            offset: Atom::new(offset),
        })
    }

    pub fn division(self, param: DivisionProperty, value: f32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::DivisionParam {
            restriction,
            param: Atom::new(param.raw()),
            value: Atom::new(value),
        })
    }

    pub fn part(self, attribute: PartProperty, value: f32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::PartAttribute {
            restriction,
            payload: AttributePayload::new(attribute, value),
        })
    }

    pub fn muscle(self, attribute: MuscleProperty, value: f32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::MuscleAttribute {
            restriction,
            payload: AttributePayload::new(attribute, value),
        })
    }

    pub fn body(self, attribute: BodyProperty, value: f32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::BodyAttribute {
            restriction,
            payload: AttributePayload::new(attribute, value),
        })
    }

    pub fn vms_offset(self, offset: f32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::VmsOffset {
            restriction,
            offset: Atom::new(offset),
        })
    }

    pub fn neuron(self, output: f32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::NeuronDeclaration {
            restriction,
            output: Atom::new(output),
        })
    }

    pub fn transfer(self, function: Transfer) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::TransferFunction {
            restriction,
            function: Atom::new(function.raw()),
        })
    }

    pub fn bias(self, bias: f32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::NeuralBias {
            restriction,
            bias: Atom::new(bias),
        })
    }

    pub fn synapse(self, input: f32, weight: f32) -> Self {
        let restriction = self.restriction;
        self.push(GeneKind::Synapse {
            restriction,
            input: Atom::new(input),
            weight: Atom::new(weight),
        })
    }

    pub fn finish(self) -> Vec<Gene> {
        self.genes
    }

    /// Finish as a homozygous genome.
    pub fn into_genome(self) -> Genome {
        Genome::homozygous(Chromosome::from_genes(self.genes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seeds_are_homozygous() {
        for seed in [
            SeedGenome::StopOnly,
            SeedGenome::Minimal,
            SeedGenome::Symmetric,
        ] {
            let genome = seed.to_genome();
            assert_eq!(genome.first(), genome.second());
            assert!(!genome.is_empty());
        }
    }

    #[test]
    fn test_writer_dominance_ids_distinct() {
        let genes = symmetric_genes();
        let ids: HashSet<u64> = genes.iter().map(|g| g.dominance).collect();
        assert_eq!(ids.len(), genes.len());
    }

    #[test]
    fn test_writer_applies_restriction() {
        let genes = SeedWriter::new()
            .restricted("Rv")
            .vms_offset(1.0)
            .unrestricted()
            .vms_offset(2.0)
            .finish();
        assert_eq!(genes[0].kind.restriction().unwrap().code(), "Rv");
        assert_eq!(genes[1].kind.restriction().unwrap().active_levels(), 0);
    }

    #[test]
    fn test_seed_serialization() {
        let json = serde_json::to_string(&SeedGenome::Symmetric).unwrap();
        let parsed: SeedGenome = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, SeedGenome::Symmetric));
    }

    #[test]
    fn test_try_restricted_reports_bad_codes() {
        assert!(matches!(
            SeedWriter::new().try_restricted("Lx"),
            Err(RestrictionCodeError::InvalidStop('x'))
        ));
        assert!(matches!(
            SeedWriter::new().try_restricted("L"),
            Err(RestrictionCodeError::OddLength(1))
        ));

        let genes = SeedWriter::new()
            .try_restricted("Lv")
            .unwrap()
            .vms_offset(1.0)
            .finish();
        assert_eq!(genes[0].kind.restriction().unwrap().code(), "Lv");
    }
}
