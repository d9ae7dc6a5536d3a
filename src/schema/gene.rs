//! Gene records: one tagged, mutation-parameterized instruction each.

use serde::{Deserialize, Serialize};

use super::atom::{Atom, Mutable, Selector};
use super::restriction::BranchRestriction;

/// Default per-gene chance to be deleted in one mutation pass.
pub const DEFAULT_CHANCE_TO_DELETE: f32 = 0.01;
/// Default per-gene chance to swap with its neighbour in one mutation pass.
pub const DEFAULT_CHANCE_TO_SWAP: f32 = 0.01;

/// Circular dominance order on identifiers.
///
/// `x1` dominates `x2` iff `x1 - x2 < x2 - x1` in wrapping `u64` arithmetic.
/// Every identifier dominates half of the identifier space and is dominated
/// by the other half. Equal identifiers and identifiers exactly half the
/// space apart dominate neither way.
#[inline]
pub fn dominates(x1: u64, x2: u64) -> bool {
    x1.wrapping_sub(x2) < x2.wrapping_sub(x1)
}

/// Parameters that shape a cell division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DivisionProperty {
    /// Cut-line angle relative to the cell orientation (radians).
    Angle,
    /// Area fraction given to the left child.
    Ratio,
    /// Orient children along the division normal when positive.
    Reorient,
    /// Mirror the right child when positive.
    Mirror,
}

impl Selector for DivisionProperty {
    const ALL: &'static [Self] = &[Self::Angle, Self::Ratio, Self::Reorient, Self::Mirror];
}

/// Per-cell body part attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartProperty {
    /// Selects the organ kind (see `Organ::from_value`).
    Organ,
    Density,
    Friction,
    Hue,
}

impl Selector for PartProperty {
    const ALL: &'static [Self] = &[Self::Organ, Self::Density, Self::Friction, Self::Hue];
}

/// Organ kinds a cell can specialize into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Organ {
    #[default]
    Structure,
    /// Feeding organ.
    Mouth,
    /// Reproductive organ.
    Gonad,
    Eye,
}

impl Selector for Organ {
    const ALL: &'static [Self] = &[Self::Structure, Self::Mouth, Self::Gonad, Self::Eye];
}

impl Organ {
    /// Resolve an accumulated `PartProperty::Organ` value: rounded, then
    /// clamped into the organ range.
    pub fn from_value(value: f32) -> Self {
        if !value.is_finite() {
            return Organ::Structure;
        }
        let index = value.round().clamp(0.0, (Self::ALL.len() - 1) as f32) as usize;
        Self::ALL[index]
    }

    /// The accumulated value that selects this organ.
    pub fn value(self) -> f32 {
        self.raw() as f32
    }

    /// Whether the organ exposes a sensor output to the neural network.
    pub fn is_sensor(self) -> bool {
        matches!(self, Organ::Mouth | Organ::Eye)
    }
}

/// Attributes of the joint connecting a cell to its sister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointProperty {
    Stiffness,
    Damping,
    MinAngle,
    MaxAngle,
}

impl Selector for JointProperty {
    const ALL: &'static [Self] = &[Self::Stiffness, Self::Damping, Self::MinAngle, Self::MaxAngle];
}

/// Attributes of a cell's muscle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MuscleProperty {
    /// A cell with positive strength exposes a motor input.
    Strength,
    Speed,
}

impl Selector for MuscleProperty {
    const ALL: &'static [Self] = &[Self::Strength, Self::Speed];
}

/// Organism-level attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyProperty {
    MetabolicRate,
    ReproductiveEnergy,
    Lifespan,
}

impl Selector for BodyProperty {
    const ALL: &'static [Self] = &[Self::MetabolicRate, Self::ReproductiveEnergy, Self::Lifespan];
}

/// Tunable neuron parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronProperty {
    /// Multiplies the summed input before the transfer function.
    Gain,
    /// Fraction of the previous activation retained each tick.
    Decay,
}

impl Selector for NeuronProperty {
    const ALL: &'static [Self] = &[Self::Gain, Self::Decay];
}

/// Neuron transfer functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Transfer {
    #[default]
    Linear,
    Sigmoid,
    Tanh,
    Sine,
    Step,
    Abs,
}

impl Selector for Transfer {
    const ALL: &'static [Self] = &[
        Self::Linear,
        Self::Sigmoid,
        Self::Tanh,
        Self::Sine,
        Self::Step,
        Self::Abs,
    ];
}

impl Transfer {
    /// Apply the transfer function.
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Transfer::Linear => x,
            Transfer::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Transfer::Tanh => x.tanh(),
            Transfer::Sine => x.sin(),
            Transfer::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Transfer::Abs => x.abs(),
        }
    }
}

/// Payload shared by the attribute gene kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributePayload {
    /// Raw attribute selector, resolved by the gene kind's enum.
    pub attribute: Atom<u8>,
    pub value: Atom<f32>,
    /// Multiply the accumulated value instead of adding to it.
    pub multiplicative: Atom<bool>,
}

impl AttributePayload {
    pub fn new<S: Selector>(attribute: S, value: f32) -> Self {
        Self {
            attribute: Atom::new(attribute.raw()),
            value: Atom::new(value),
            multiplicative: Atom::new(false),
        }
    }

    /// Same payload, contributing multiplicatively.
    pub fn scaling(mut self) -> Self {
        self.multiplicative.set(true);
        self
    }

    /// Resolve the selector against an attribute enum.
    pub fn attribute<S: Selector>(&self) -> S {
        S::from_raw(self.attribute.get())
    }

    fn atoms_mut(&mut self) -> [&mut dyn Mutable; 3] {
        [&mut self.attribute, &mut self.value, &mut self.multiplicative]
    }
}

/// The closed set of gene kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GeneKind {
    /// Ends the reading frame of the cell that reads it.
    Stop,
    /// Placeholder left by deletion or alignment.
    NoOp,
    /// Advance the cursor by `distance` extra offsets.
    Skip {
        restriction: BranchRestriction,
        distance: Atom<i32>,
    },
    /// Accumulate one division parameter.
    DivisionParam {
        restriction: BranchRestriction,
        param: Atom<u8>,
        value: Atom<f32>,
    },
    /// Accumulate the read offset of one prospective child.
    ChildOffset {
        restriction: BranchRestriction,
        child: Atom<u8>,
        offset: Atom<i32>,
    },
    PartAttribute {
        restriction: BranchRestriction,
        payload: AttributePayload,
    },
    JointAttribute {
        restriction: BranchRestriction,
        payload: AttributePayload,
    },
    MuscleAttribute {
        restriction: BranchRestriction,
        payload: AttributePayload,
    },
    /// Shift the VMS coordinate inherited by this cell and its descendants.
    VmsOffset {
        restriction: BranchRestriction,
        offset: Atom<f32>,
    },
    /// Declare a neuron whose output sits at `output` relative to the cell.
    NeuronDeclaration {
        restriction: BranchRestriction,
        output: Atom<f32>,
    },
    TransferFunction {
        restriction: BranchRestriction,
        function: Atom<u8>,
    },
    NeuralBias {
        restriction: BranchRestriction,
        bias: Atom<f32>,
    },
    NeuralParam {
        restriction: BranchRestriction,
        param: Atom<u8>,
        value: Atom<f32>,
    },
    /// Add an input to the current neuron at `input` relative to the cell.
    Synapse {
        restriction: BranchRestriction,
        input: Atom<f32>,
        weight: Atom<f32>,
    },
    BodyAttribute {
        restriction: BranchRestriction,
        payload: AttributePayload,
    },
}

impl GeneKind {
    /// The branch restriction, for every kind except Stop and NoOp.
    pub fn restriction(&self) -> Option<&BranchRestriction> {
        match self {
            GeneKind::Stop | GeneKind::NoOp => None,
            GeneKind::Skip { restriction, .. }
            | GeneKind::DivisionParam { restriction, .. }
            | GeneKind::ChildOffset { restriction, .. }
            | GeneKind::PartAttribute { restriction, .. }
            | GeneKind::JointAttribute { restriction, .. }
            | GeneKind::MuscleAttribute { restriction, .. }
            | GeneKind::VmsOffset { restriction, .. }
            | GeneKind::NeuronDeclaration { restriction, .. }
            | GeneKind::TransferFunction { restriction, .. }
            | GeneKind::NeuralBias { restriction, .. }
            | GeneKind::NeuralParam { restriction, .. }
            | GeneKind::Synapse { restriction, .. }
            | GeneKind::BodyAttribute { restriction, .. } => Some(restriction),
        }
    }

    /// Neural-configuration genes are deferred until all cells are read.
    pub fn is_neural(&self) -> bool {
        matches!(
            self,
            GeneKind::NeuronDeclaration { .. }
                | GeneKind::TransferFunction { .. }
                | GeneKind::NeuralBias { .. }
                | GeneKind::NeuralParam { .. }
                | GeneKind::Synapse { .. }
        )
    }

    /// Every mutable field: restriction flags first, then the payload.
    pub fn atoms_mut(&mut self) -> Vec<&mut dyn Mutable> {
        match self {
            GeneKind::Stop | GeneKind::NoOp => Vec::new(),
            GeneKind::Skip {
                restriction,
                distance,
            } => with_restriction(restriction, [distance as &mut dyn Mutable]),
            GeneKind::DivisionParam {
                restriction,
                param,
                value,
            }
            | GeneKind::NeuralParam {
                restriction,
                param,
                value,
            } => with_restriction(
                restriction,
                [param as &mut dyn Mutable, value as &mut dyn Mutable],
            ),
            GeneKind::ChildOffset {
                restriction,
                child,
                offset,
            } => with_restriction(
                restriction,
                [child as &mut dyn Mutable, offset as &mut dyn Mutable],
            ),
            GeneKind::PartAttribute {
                restriction,
                payload,
            }
            | GeneKind::JointAttribute {
                restriction,
                payload,
            }
            | GeneKind::MuscleAttribute {
                restriction,
                payload,
            }
            | GeneKind::BodyAttribute {
                restriction,
                payload,
            } => with_restriction(restriction, payload.atoms_mut()),
            GeneKind::VmsOffset {
                restriction,
                offset,
            } => with_restriction(restriction, [offset as &mut dyn Mutable]),
            GeneKind::NeuronDeclaration {
                restriction,
                output,
            } => with_restriction(restriction, [output as &mut dyn Mutable]),
            GeneKind::TransferFunction {
                restriction,
                function,
            } => with_restriction(restriction, [function as &mut dyn Mutable]),
            GeneKind::NeuralBias { restriction, bias } => {
                with_restriction(restriction, [bias as &mut dyn Mutable])
            }
            GeneKind::Synapse {
                restriction,
                input,
                weight,
            } => with_restriction(
                restriction,
                [input as &mut dyn Mutable, weight as &mut dyn Mutable],
            ),
        }
    }
}

fn with_restriction<'a, const N: usize>(
    restriction: &'a mut BranchRestriction,
    payload: [&'a mut dyn Mutable; N],
) -> Vec<&'a mut dyn Mutable> {
    let mut atoms = restriction.atoms_mut();
    atoms.extend(payload);
    atoms
}

/// One unit of heritable instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    /// Identifier compared with [`dominates`] against the sister gene.
    pub dominance: u64,
    pub chance_to_delete: f32,
    pub chance_to_swap: f32,
    pub kind: GeneKind,
}

impl Gene {
    /// Create a gene with default structural mutation propensities.
    pub fn new(kind: GeneKind, dominance: u64) -> Self {
        Self {
            dominance,
            chance_to_delete: DEFAULT_CHANCE_TO_DELETE,
            chance_to_swap: DEFAULT_CHANCE_TO_SWAP,
            kind,
        }
    }

    pub fn stop(dominance: u64) -> Self {
        Self::new(GeneKind::Stop, dominance)
    }

    pub fn no_op(dominance: u64) -> Self {
        Self::new(GeneKind::NoOp, dominance)
    }

    #[inline]
    pub fn is_stop(&self) -> bool {
        matches!(self.kind, GeneKind::Stop)
    }

    #[inline]
    pub fn is_no_op(&self) -> bool {
        matches!(self.kind, GeneKind::NoOp)
    }

    /// Whether this gene wins against `other` at the same position.
    #[inline]
    pub fn dominates(&self, other: &Gene) -> bool {
        dominates(self.dominance, other.dominance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dominance_antipodal_is_deterministic() {
        let a = 5u64;
        let b = 5u64.wrapping_add(1 << 63);
        // Exactly half the space apart: neither side dominates, so selection
        // falls through to the same side every time.
        assert!(!dominates(a, b));
        assert!(!dominates(b, a));
        for _ in 0..10 {
            assert_eq!(dominates(a, b), dominates(a, b));
        }
    }

    #[test]
    fn test_dominance_wraps() {
        // Numeric magnitude does not matter, only circular distance.
        assert!(dominates(1, 0));
        assert!(dominates(0, u64::MAX));
        assert!(!dominates(u64::MAX, 0));
        assert!(!dominates(7, 7));
    }

    #[test]
    fn test_stop_has_no_restriction() {
        assert!(GeneKind::Stop.restriction().is_none());
        assert!(GeneKind::NoOp.restriction().is_none());
        let vms = GeneKind::VmsOffset {
            restriction: BranchRestriction::unrestricted(),
            offset: Atom::new(1.0),
        };
        assert!(vms.restriction().is_some());
    }

    #[test]
    fn test_atoms_cover_payload() {
        let mut kind = GeneKind::PartAttribute {
            restriction: "Lv".parse().unwrap(),
            payload: AttributePayload::new(PartProperty::Organ, 1.0),
        };
        // Level count, four flags of the single active level, three payload atoms.
        assert_eq!(kind.atoms_mut().len(), 1 + 4 + 3);
        assert!(GeneKind::Stop.atoms_mut().is_empty());
    }

    #[test]
    fn test_organ_from_value() {
        assert_eq!(Organ::from_value(0.0), Organ::Structure);
        assert_eq!(Organ::from_value(1.2), Organ::Mouth);
        assert_eq!(Organ::from_value(1.6), Organ::Gonad);
        assert_eq!(Organ::from_value(40.0), Organ::Eye);
        assert_eq!(Organ::from_value(-3.0), Organ::Structure);
        assert_eq!(Organ::from_value(f32::NAN), Organ::Structure);
        assert_eq!(Organ::from_value(Organ::Gonad.value()), Organ::Gonad);
    }

    #[test]
    fn test_selector_wraps() {
        assert_eq!(PartProperty::from_raw(0), PartProperty::Organ);
        assert_eq!(PartProperty::from_raw(5), PartProperty::Density);
        assert_eq!(Transfer::Tanh.raw(), 2);
    }

    #[test]
    fn test_gene_serialization() {
        let gene = Gene::new(
            GeneKind::Synapse {
                restriction: "R<".parse().unwrap(),
                input: Atom::new(0.25),
                weight: Atom::new(-1.5),
            },
            42,
        );
        let json = serde_json::to_string(&gene).unwrap();
        let parsed: Gene = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, gene);
    }

    proptest! {
        #[test]
        fn prop_dominance_is_antisymmetric(x1 in any::<u64>(), x2 in any::<u64>()) {
            prop_assume!(x1 != x2);
            prop_assume!(x1.wrapping_sub(x2) != 1 << 63);
            prop_assert!(dominates(x1, x2) ^ dominates(x2, x1));
        }
    }
}
