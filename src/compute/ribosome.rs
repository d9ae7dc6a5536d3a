//! Developmental decoder.
//!
//! A [`Ribosome`] reads a diploid genome cell by cell and grows a division
//! tree. Every active cell owns a [`DecodeContext`] with its own read cursor.
//! One call to [`Ribosome::step`] advances every active cursor by exactly one
//! offset, so a host can spread the development of many organisms over many
//! ticks.
//!
//! At each offset the dominant gene of the two chromosomes is expressed if
//! its branch restriction admits the cell. Growth, attribute and VMS genes
//! act immediately; neural genes are deferred until every cell has retired,
//! because neurons can only be matched once all coordinates are known.

use std::collections::HashMap;

use crate::schema::{
    BodyProperty, DevelopmentConfig, DivisionProperty, Gene, GeneKind, GeneRef, Genome,
    JointProperty, MuscleProperty, NeuronProperty, Organ, PartProperty, Selector, Side, Strand,
    Transfer,
};

use super::cell::{BodyCell, CellId, CellTree};
use super::cumulative::CumulativeValue;
use super::division::{DivisionParams, divide, relax};
use super::wiring::{NeuralNetwork, NeuralWiring, NeuronBlueprint, Port};

/// A neural gene waiting for the tree to finish, with the coordinate
/// context it was read in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredGene {
    pub gene: GeneRef,
    pub cell: CellId,
    pub vms: f32,
}

/// Read state of one active cell.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    pub cell: CellId,
    /// Next genome offset to read.
    pub offset: usize,
    /// Read offsets of the prospective children, indexed by [`Side::index`].
    pub child_offsets: [CumulativeValue; 2],
    pub division: HashMap<DivisionProperty, CumulativeValue>,
    /// Inherited VMS coordinate.
    pub vms: f32,
    pub neural: Vec<DeferredGene>,
}

impl DecodeContext {
    pub fn new(cell: CellId, offset: usize, vms: f32) -> Self {
        Self {
            cell,
            offset,
            child_offsets: [CumulativeValue::new(); 2],
            division: HashMap::new(),
            vms,
            neural: Vec::new(),
        }
    }
}

/// Lifecycle of a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevelopmentState {
    /// At least one cell is still reading.
    Active,
    /// Every cell retired; deferred neural genes are pending.
    Draining,
    /// Viable: the network can be materialized.
    Finished,
    /// Non-viable.
    Discarded,
}

/// Why an embryo was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    MissingOrgan(Organ),
}

/// A non-viable embryo.
#[derive(Debug, Clone)]
pub struct Discard {
    pub reason: DiscardReason,
    /// Number of body cells that were grown.
    pub cells: usize,
    pub steps: usize,
}

/// Terminal outcome of development.
#[derive(Debug, Clone)]
pub enum Development {
    Viable(Embryo),
    Discarded(Discard),
}

impl Development {
    pub fn is_viable(&self) -> bool {
        matches!(self, Development::Viable(_))
    }

    pub fn embryo(self) -> Option<Embryo> {
        match self {
            Development::Viable(embryo) => Some(embryo),
            Development::Discarded(_) => None,
        }
    }
}

/// A viable decoded organism: body tree plus wired controller.
#[derive(Debug, Clone)]
pub struct Embryo {
    pub tree: CellTree,
    pub network: NeuralNetwork,
    pub wiring: NeuralWiring,
    pub body: HashMap<BodyProperty, CumulativeValue>,
    pub steps: usize,
}

/// Builds a concrete body part from a finished cell.
pub trait PartFactory {
    type Part;

    fn build(&mut self, id: CellId, cell: &BodyCell) -> Self::Part;
}

/// Specialized organism handed to the outside world.
#[derive(Debug, Clone)]
pub struct Phenotype<P> {
    pub parts: Vec<P>,
    pub network: NeuralNetwork,
    pub body: HashMap<BodyProperty, CumulativeValue>,
}

impl Embryo {
    /// Number of body cells.
    pub fn cell_count(&self) -> usize {
        self.tree.leaf_count()
    }

    pub fn organ_count(&self, organ: Organ) -> usize {
        self.tree
            .leaves()
            .filter(|(_, c)| c.organ() == organ)
            .count()
    }

    /// Organism-level attribute.
    pub fn body_attribute(&self, property: BodyProperty) -> CumulativeValue {
        self.body.get(&property).copied().unwrap_or_default()
    }

    /// Hand every body cell to `factory`, in creation order.
    pub fn specialize<F: PartFactory>(self, factory: &mut F) -> Phenotype<F::Part> {
        let parts = self
            .tree
            .leaves()
            .map(|(id, cell)| factory.build(id, cell))
            .collect();
        Phenotype {
            parts,
            network: self.network,
            body: self.body,
        }
    }
}

enum Read {
    Continue,
    Retire,
}

/// Resumable decoder for one embryo.
pub struct Ribosome<'g> {
    genome: &'g Genome,
    config: &'g DevelopmentConfig,
    tree: CellTree,
    active: Vec<DecodeContext>,
    deferred: Vec<Vec<DeferredGene>>,
    body: HashMap<BodyProperty, CumulativeValue>,
    state: DevelopmentState,
    steps: usize,
}

impl<'g> Ribosome<'g> {
    /// Start decoding with `root` reading from offset 0.
    pub fn new(genome: &'g Genome, root: BodyCell, config: &'g DevelopmentConfig) -> Self {
        let tree = CellTree::new(root);
        let root_vms = tree[tree.root()].vms;
        let active = vec![DecodeContext::new(tree.root(), 0, root_vms)];
        Self {
            genome,
            config,
            tree,
            active,
            deferred: Vec::new(),
            body: HashMap::new(),
            state: DevelopmentState::Active,
            steps: 0,
        }
    }

    pub fn state(&self) -> DevelopmentState {
        self.state
    }

    pub fn tree(&self) -> &CellTree {
        &self.tree
    }

    /// Contexts still reading.
    pub fn active(&self) -> &[DecodeContext] {
        &self.active
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Process one genome offset for every active cell. Returns whether any
    /// cell is still reading.
    ///
    /// When the last cell retires the decoder moves to `Draining`, or
    /// straight to its verdict when there are no neural genes to resolve.
    pub fn step(&mut self) -> bool {
        if self.state != DevelopmentState::Active {
            return false;
        }
        self.steps += 1;

        for mut context in std::mem::take(&mut self.active) {
            match self.read(&mut context) {
                Read::Continue => self.active.push(context),
                Read::Retire => self.retire(context),
            }
        }

        if self.active.is_empty() {
            self.state = if self.deferred.is_empty() {
                self.verdict()
            } else {
                DevelopmentState::Draining
            };
            log::debug!(
                "development: all cells retired after {} steps ({} cells) -> {:?}",
                self.steps,
                self.tree.leaf_count(),
                self.state
            );
        }
        !self.active.is_empty()
    }

    /// Run to completion and report the outcome.
    pub fn finish(mut self) -> Development {
        while self.step() {}

        if self.state == DevelopmentState::Draining {
            self.state = self.verdict();
            log::debug!("development: drained -> {:?}", self.state);
        }

        if let Some(organ) = self.missing_organ() {
            return Development::Discarded(Discard {
                reason: DiscardReason::MissingOrgan(organ),
                cells: self.tree.leaf_count(),
                steps: self.steps,
            });
        }

        let (network, wiring) = self.build_network();
        Development::Viable(Embryo {
            tree: self.tree,
            network,
            wiring,
            body: self.body,
            steps: self.steps,
        })
    }

    fn verdict(&self) -> DevelopmentState {
        match self.missing_organ() {
            Some(organ) => {
                log::debug!("development: discarded, no {organ:?}");
                DevelopmentState::Discarded
            }
            None => DevelopmentState::Finished,
        }
    }

    /// First mandatory organ absent from the body.
    fn missing_organ(&self) -> Option<Organ> {
        self.config
            .mandatory_organs
            .iter()
            .copied()
            .find(|&organ| !self.tree.leaves().any(|(_, c)| c.organ() == organ))
    }

    /// The gene expressed at `offset`, if either chromosome reaches it.
    ///
    /// The First strand wins only when its gene strictly dominates. Equal or
    /// antipodal dominance ids dominate neither way, and the Second strand is
    /// expressed. Which chromosome sits on which strand is fixed by the genome,
    /// so the choice is deterministic even though neither id ranks higher.
    fn select(&self, offset: usize) -> Option<(GeneRef, &'g Gene)> {
        let genome = self.genome;
        let first = genome.first().get(offset);
        let second = genome.second().get(offset);
        let (strand, gene) = match (first, second) {
            (None, None) => return None,
            (Some(a), None) => (Strand::First, a),
            (None, Some(b)) => (Strand::Second, b),
            (Some(a), Some(b)) => {
                if a.dominates(b) {
                    (Strand::First, a)
                } else {
                    (Strand::Second, b)
                }
            }
        };
        Some((
            GeneRef {
                strand,
                index: offset,
            },
            gene,
        ))
    }

    fn read(&mut self, context: &mut DecodeContext) -> Read {
        let Some((at, gene)) = self.select(context.offset) else {
            return Read::Retire;
        };
        if gene.is_stop() {
            return Read::Retire;
        }
        context.offset += 1;

        if let Some(restriction) = gene.kind.restriction() {
            if !restriction.qualifies(&self.tree[context.cell].path) {
                return Read::Continue;
            }
        }
        self.express(at, gene, context);
        Read::Continue
    }

    fn express(&mut self, at: GeneRef, gene: &Gene, context: &mut DecodeContext) {
        let cell = context.cell;
        match &gene.kind {
            GeneKind::Stop | GeneKind::NoOp => {}
            GeneKind::Skip { distance, .. } => {
                context.offset = context
                    .offset
                    .saturating_add(distance.get().max(0) as usize);
            }
            GeneKind::DivisionParam { param, value, .. } => {
                context
                    .division
                    .entry(DivisionProperty::from_raw(param.get()))
                    .or_default()
                    .add(value.get());
            }
            GeneKind::ChildOffset { child, offset, .. } => {
                let side = Side::from_raw(child.get());
                context.child_offsets[side.index()].add(offset.get() as f32);
            }
            GeneKind::PartAttribute { payload, .. } => {
                self.tree[cell]
                    .part
                    .entry(payload.attribute::<PartProperty>())
                    .or_default()
                    .apply(payload.value.get(), payload.multiplicative.get());
            }
            GeneKind::JointAttribute { payload, .. } => {
                self.tree[cell]
                    .joint
                    .entry(payload.attribute::<JointProperty>())
                    .or_default()
                    .apply(payload.value.get(), payload.multiplicative.get());
            }
            GeneKind::MuscleAttribute { payload, .. } => {
                self.tree[cell]
                    .muscle
                    .entry(payload.attribute::<MuscleProperty>())
                    .or_default()
                    .apply(payload.value.get(), payload.multiplicative.get());
            }
            GeneKind::BodyAttribute { payload, .. } => {
                self.body
                    .entry(payload.attribute::<BodyProperty>())
                    .or_default()
                    .apply(payload.value.get(), payload.multiplicative.get());
            }
            GeneKind::VmsOffset { offset, .. } => {
                context.vms += offset.get();
                self.tree[cell].vms = context.vms;
            }
            GeneKind::NeuronDeclaration { .. }
            | GeneKind::TransferFunction { .. }
            | GeneKind::NeuralBias { .. }
            | GeneKind::NeuralParam { .. }
            | GeneKind::Synapse { .. } => context.neural.push(DeferredGene {
                gene: at,
                cell,
                vms: context.vms,
            }),
        }
    }

    fn retire(&mut self, context: DecodeContext) {
        let DecodeContext {
            cell,
            offset,
            child_offsets,
            division,
            vms,
            neural,
        } = context;
        if !neural.is_empty() {
            self.deferred.push(neural);
        }

        let wants_division = child_offsets.iter().any(CumulativeValue::has_value);
        if !wants_division {
            return;
        }
        if self.tree.leaf_count() >= self.config.max_cells {
            log::trace!("division of {cell:?} suppressed at {} cells", self.config.max_cells);
            return;
        }

        let params = DivisionParams::from_accumulated(&division, self.config);
        let children = divide(&mut self.tree, cell, &params, self.config);
        let mut seeds = children.to_vec();
        for &child in &children {
            seeds.extend(self.tree[child].bonds.iter().map(|b| b.neighbor));
        }
        let relaxation = relax(
            &mut self.tree,
            &seeds,
            self.config.relaxation_tolerance,
            self.config.relaxation_max_visits,
        );
        if !relaxation.converged {
            log::debug!(
                "relaxation after dividing {cell:?} hit {} visits; released {} strained bonds",
                relaxation.visits,
                relaxation.released
            );
        }
        log::trace!(
            "{cell:?} divided at offset {offset} into {children:?} ({params:?})"
        );

        for (side, child) in [Side::Left, Side::Right].into_iter().zip(children) {
            let start = child_start(offset, child_offsets[side.index()].get());
            self.tree[child].vms = vms;
            self.active.push(DecodeContext::new(child, start, vms));
        }
    }

    fn build_network(&self) -> (NeuralNetwork, NeuralWiring) {
        let sensors: Vec<Port> = self
            .tree
            .leaves()
            .filter(|(_, c)| c.organ().is_sensor())
            .map(|(id, c)| Port {
                cell: id,
                coordinate: c.vms,
            })
            .collect();
        let motors: Vec<Port> = self
            .tree
            .leaves()
            .filter(|(_, c)| c.has_muscle())
            .map(|(id, c)| Port {
                cell: id,
                coordinate: c.vms,
            })
            .collect();

        let mut blueprints = Vec::new();
        for group in &self.deferred {
            let mut current: Option<usize> = None;
            for deferred in group {
                let Some(gene) = self.genome.gene(deferred.gene) else {
                    continue;
                };
                if let GeneKind::NeuronDeclaration { output, .. } = &gene.kind {
                    blueprints.push(NeuronBlueprint {
                        cell: deferred.cell,
                        output: deferred.vms + output.get(),
                        ..Default::default()
                    });
                    current = Some(blueprints.len() - 1);
                    continue;
                }
                if let Some(index) = current {
                    configure_neuron(&mut blueprints[index], &gene.kind, deferred.vms);
                }
            }
        }

        log::debug!(
            "wiring {} sensors, {} neurons, {} motors",
            sensors.len(),
            blueprints.len(),
            motors.len()
        );
        NeuralNetwork::assemble(sensors, blueprints, motors)
    }
}

fn configure_neuron(neuron: &mut NeuronBlueprint, kind: &GeneKind, vms: f32) {
    match kind {
        GeneKind::TransferFunction { function, .. } => {
            neuron.transfer = Transfer::from_raw(function.get());
        }
        GeneKind::NeuralBias { bias, .. } => neuron.bias.add(bias.get()),
        GeneKind::NeuralParam { param, value, .. } => {
            match NeuronProperty::from_raw(param.get()) {
                NeuronProperty::Gain => neuron.gain.add(value.get()),
                NeuronProperty::Decay => neuron.decay.add(value.get()),
            }
        }
        GeneKind::Synapse { input, weight, .. } => {
            neuron.synapses.push((vms + input.get(), weight.get()));
        }
        _ => {}
    }
}

/// Read offset of a child: just past the retiring gene plus the accumulated
/// child offset, never before the start of the genome.
fn child_start(retire_offset: usize, accumulated: f32) -> usize {
    let shift = accumulated.round() as i64;
    (retire_offset as i64)
        .saturating_add(1)
        .saturating_add(shift)
        .max(0) as usize
}

/// Decode a genome to completion.
pub fn decode(genome: &Genome, root: BodyCell, config: &DevelopmentConfig) -> Development {
    Ribosome::new(genome, root, config).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Chromosome, SeedGenome, SeedWriter};

    fn config() -> DevelopmentConfig {
        DevelopmentConfig::default()
    }

    fn root() -> BodyCell {
        BodyCell::root(1.0)
    }

    #[test]
    fn test_stop_only_is_discarded_without_draining() {
        let genome = SeedGenome::StopOnly.to_genome();
        let config = config();
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        assert_eq!(ribosome.state(), DevelopmentState::Active);

        assert!(!ribosome.step());
        assert_eq!(ribosome.state(), DevelopmentState::Discarded);
        assert_eq!(ribosome.tree().len(), 1);

        match ribosome.finish() {
            Development::Discarded(discard) => {
                assert_eq!(discard.reason, DiscardReason::MissingOrgan(Organ::Mouth));
                assert_eq!(discard.cells, 1);
            }
            Development::Viable(_) => panic!("stop-only genome must not be viable"),
        }
    }

    #[test]
    fn test_empty_genome_retires_immediately() {
        let genome = Genome::default();
        let config = config();
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        assert!(!ribosome.step());
        assert!(!decode(&genome, root(), &config).is_viable());
    }

    #[test]
    fn test_minimal_seed_is_viable() {
        let genome = SeedGenome::Minimal.to_genome();
        let config = config();
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        while ribosome.step() {}
        assert_eq!(ribosome.state(), DevelopmentState::Draining);

        let embryo = ribosome.finish().embryo().unwrap();
        assert_eq!(embryo.cell_count(), 2);
        assert_eq!(embryo.organ_count(Organ::Mouth), 1);
        assert_eq!(embryo.organ_count(Organ::Gonad), 1);

        let network = &embryo.network;
        assert_eq!(network.sensors().len(), 1);
        assert_eq!(network.neurons().len(), 1);
        assert_eq!(network.motors().len(), 1);
        assert_eq!(network.sensors()[0].coordinate, 1.0);
    }

    #[test]
    fn test_symmetric_seed_is_viable() {
        let genome = SeedGenome::Symmetric.to_genome();
        let embryo = decode(&genome, root(), &config()).embryo().unwrap();

        assert_eq!(embryo.cell_count(), 4);
        assert_eq!(embryo.organ_count(Organ::Mouth), 2);
        assert_eq!(embryo.organ_count(Organ::Gonad), 1);
        assert_eq!(embryo.organ_count(Organ::Eye), 1);
        assert_eq!(embryo.body_attribute(BodyProperty::MetabolicRate).get(), 4.0);

        let eye = embryo
            .tree
            .leaves()
            .find(|(_, c)| c.organ() == Organ::Eye)
            .map(|(_, c)| c)
            .unwrap();
        assert_eq!(eye.path_string(), "RR");
        assert!(eye.mirrored);

        let neuron = &embryo.network.neurons()[0];
        assert_eq!(neuron.transfer, Transfer::Tanh);
        assert_eq!(neuron.inputs.len(), 1);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let genome = SeedGenome::Symmetric.to_genome();
        let a = decode(&genome, root(), &config()).embryo().unwrap();
        let b = decode(&genome, root(), &config()).embryo().unwrap();
        let positions = |e: &Embryo| e.tree.iter().map(|(_, c)| c.position).collect::<Vec<_>>();
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn test_restriction_rejects_cell_but_advances() {
        // "0v" rejects every cell, so the organ gene is never applied.
        let genome = SeedWriter::new()
            .restricted("0v")
            .part(PartProperty::Organ, Organ::Mouth.value())
            .unrestricted()
            .vms_offset(2.0)
            .stop()
            .into_genome();
        let config = config();
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        ribosome.step();
        ribosome.step();
        let cell = &ribosome.tree()[CellId(0)];
        assert_eq!(cell.organ(), Organ::Structure);
        assert_eq!(cell.vms, 2.0);
        assert!(!ribosome.step());
    }

    #[test]
    fn test_step_is_bounded() {
        let genome = SeedGenome::Minimal.to_genome();
        let config = config();
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        assert!(ribosome.step());
        assert_eq!(ribosome.active()[0].offset, 1);
        assert_eq!(ribosome.steps(), 1);
    }

    #[test]
    fn test_out_of_range_child_offset_exhausts() {
        let genome = SeedWriter::new()
            .child_offset(Side::Left, 1000)
            .child_offset(Side::Right, -1000)
            .stop()
            .into_genome();
        let config = config();
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        for _ in 0..3 {
            ribosome.step();
        }
        assert_eq!(ribosome.tree().leaf_count(), 2);
        // The left child starts past the end, the right child is clamped to 0.
        let offsets: Vec<_> = ribosome.active().iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![1003, 0]);
        let development = ribosome.finish();
        assert!(!development.is_viable());
    }

    #[test]
    fn test_skip_advances_cursor() {
        let genome = SeedWriter::new()
            .skip(2)
            .vms_offset(5.0)
            .vms_offset(5.0)
            .vms_offset(1.0)
            .stop()
            .into_genome();
        let config = config();
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        while ribosome.step() {}
        assert_eq!(ribosome.tree()[CellId(0)].vms, 1.0);
    }

    #[test]
    fn test_max_cells_caps_division() {
        // Every cell re-reads the genome from the start and divides again.
        let genome = SeedWriter::new()
            .child_offset(Side::Left, -100)
            .child_offset(Side::Right, -100)
            .stop()
            .into_genome();
        let config = DevelopmentConfig {
            max_cells: 8,
            ..Default::default()
        };
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        let mut steps = 0;
        while ribosome.step() {
            steps += 1;
            assert!(steps < 1000);
        }
        assert_eq!(ribosome.tree().leaf_count(), 8);
    }

    #[test]
    fn test_dominant_gene_is_expressed() {
        let weak = Gene::new(
            GeneKind::VmsOffset {
                restriction: Default::default(),
                offset: crate::schema::Atom::new(1.0),
            },
            0,
        );
        let strong = Gene::new(
            GeneKind::VmsOffset {
                restriction: Default::default(),
                offset: crate::schema::Atom::new(7.0),
            },
            1,
        );
        assert!(strong.dominates(&weak));
        let genome = Genome::new(
            Chromosome::from_genes(vec![weak, Gene::stop(0)]),
            Chromosome::from_genes(vec![strong]),
        );
        let config = config();
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        while ribosome.step() {}
        assert_eq!(ribosome.tree()[CellId(0)].vms, 7.0);
    }

    #[test]
    fn test_neural_genes_without_neuron_are_ignored() {
        let genome = SeedWriter::new()
            .restricted("Lv")
            .synapse(0.0, 1.0)
            .bias(1.0)
            .into_genome();
        let config = config();
        let mut ribosome = Ribosome::new(&genome, root(), &config);
        while ribosome.step() {}
        assert_eq!(ribosome.state(), DevelopmentState::Draining);
        let (network, _) = ribosome.build_network();
        assert!(network.neurons().is_empty());
    }

    struct Recorder(Vec<String>);

    impl PartFactory for Recorder {
        type Part = (String, Organ);

        fn build(&mut self, _id: CellId, cell: &BodyCell) -> Self::Part {
            self.0.push(cell.path_string());
            (cell.path_string(), cell.organ())
        }
    }

    #[test]
    fn test_specialize_hands_over_leaves() {
        let genome = SeedGenome::Minimal.to_genome();
        let embryo = decode(&genome, root(), &config()).embryo().unwrap();
        let mut factory = Recorder(Vec::new());
        let phenotype = embryo.specialize(&mut factory);
        assert_eq!(factory.0, vec!["L".to_string(), "R".to_string()]);
        assert_eq!(phenotype.parts[0].1, Organ::Mouth);
        assert_eq!(phenotype.parts[1].1, Organ::Gonad);
    }

    fn division_gene(dominance: u64, value: f32) -> Gene {
        Gene::new(
            GeneKind::DivisionParam {
                restriction: Default::default(),
                param: crate::schema::Atom::new(DivisionProperty::Angle.raw()),
                value: crate::schema::Atom::new(value),
            },
            dominance,
        )
    }

    fn vms_gene(dominance: u64, offset: f32) -> Gene {
        Gene::new(
            GeneKind::VmsOffset {
                restriction: Default::default(),
                offset: crate::schema::Atom::new(offset),
            },
            dominance,
        )
    }

    #[test]
    fn test_antipodal_tie_expresses_second_strand() {
        let low = 5u64;
        let high = low.wrapping_add(1 << 63);
        let config = config();

        for (first, second) in [(low, high), (high, low)] {
            let genome = Genome::new(
                Chromosome::from_genes(vec![division_gene(first, 1.0)]),
                Chromosome::from_genes(vec![division_gene(second, 2.0)]),
            );
            let ribosome = Ribosome::new(&genome, root(), &config);
            for _ in 0..5 {
                let (at, gene) = ribosome.select(0).unwrap();
                assert_eq!(at.strand, Strand::Second);
                assert_eq!(gene.dominance, second);
            }
        }
    }

    #[test]
    fn test_antipodal_tie_follows_strand_not_id() {
        let low = 5u64;
        let high = low.wrapping_add(1 << 63);
        let config = config();

        let expressed = |first: Gene, second: Gene| {
            let genome = Genome::new(
                Chromosome::from_genes(vec![first]),
                Chromosome::from_genes(vec![second]),
            );
            let mut ribosome = Ribosome::new(&genome, root(), &config);
            while ribosome.step() {}
            ribosome.tree()[CellId(0)].vms
        };
        assert_eq!(expressed(vms_gene(low, 1.0), vms_gene(high, 2.0)), 2.0);
        assert_eq!(expressed(vms_gene(high, 1.0), vms_gene(low, 2.0)), 2.0);
    }

    #[test]
    fn test_decoded_bodies_are_relaxed() {
        use crate::compute::evolution::GenomeRng;

        let config = config();
        let mut multi_cell = 0;
        for seed in 0..120 {
            let mut rng = GenomeRng::new(seed);
            let genome = Genome::new(rng.random_chromosome(60), rng.random_chromosome(60));
            let mut ribosome = Ribosome::new(&genome, root(), &config);
            while ribosome.step() {}

            let mut tree = ribosome.tree().clone();
            if tree.leaf_count() < 2 {
                continue;
            }
            multi_cell += 1;
            let leaves: Vec<CellId> = tree.leaves().map(|(id, _)| id).collect();
            let stats = relax(
                &mut tree,
                &leaves,
                config.relaxation_tolerance,
                config.relaxation_max_visits,
            );
            assert_eq!(stats.corrections, 0, "seed {seed}: body was not at rest");
            assert!(stats.converged);
            assert_eq!(stats.released, 0);
        }
        assert!(multi_cell > 0);
    }
}
