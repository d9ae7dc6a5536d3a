//! Coordinate-based neural wiring and the resulting network.
//!
//! Outputs (sensors and neurons) and inputs (synapses and motors) carry a
//! scalar VMS coordinate. Each input connects to the output whose coordinate
//! is nearest; no identifiers are shared between the two sides.

use crate::schema::Transfer;

use super::cell::CellId;
use super::cumulative::CumulativeValue;

/// Something that produces a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputSource {
    Sensor(usize),
    Neuron(usize),
}

/// Something that consumes a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputTarget {
    Synapse { neuron: usize, synapse: usize },
    Motor(usize),
}

/// A wiring endpoint at a VMS coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terminal<K> {
    pub coordinate: f32,
    pub kind: K,
}

/// Resolved input-to-output matching.
#[derive(Debug, Clone, Default)]
pub struct NeuralWiring {
    outputs: Vec<Terminal<OutputSource>>,
    inputs: Vec<Terminal<InputTarget>>,
    links: Vec<Option<OutputSource>>,
}

impl NeuralWiring {
    /// Sort both sides by coordinate and match every input to its nearest
    /// output. Ties resolve to the lower coordinate.
    pub fn resolve(
        mut outputs: Vec<Terminal<OutputSource>>,
        mut inputs: Vec<Terminal<InputTarget>>,
    ) -> Self {
        outputs.sort_by(|a, b| a.coordinate.total_cmp(&b.coordinate));
        inputs.sort_by(|a, b| a.coordinate.total_cmp(&b.coordinate));

        let mut wiring = Self {
            outputs,
            inputs,
            links: Vec::new(),
        };
        wiring.links = wiring
            .inputs
            .iter()
            .map(|input| wiring.nearest_output(input.coordinate))
            .collect();
        wiring
    }

    /// Output nearest to `coordinate`, if any output exists.
    pub fn nearest_output(&self, coordinate: f32) -> Option<OutputSource> {
        let upper = self.outputs.partition_point(|o| o.coordinate < coordinate);
        let above = self.outputs.get(upper);
        let below = upper.checked_sub(1).and_then(|i| self.outputs.get(i));
        match (below, above) {
            (Some(lo), Some(hi)) => {
                if coordinate - lo.coordinate <= hi.coordinate - coordinate {
                    Some(lo.kind)
                } else {
                    Some(hi.kind)
                }
            }
            (Some(only), None) | (None, Some(only)) => Some(only.kind),
            (None, None) => None,
        }
    }

    /// Outputs sorted by coordinate.
    pub fn outputs(&self) -> &[Terminal<OutputSource>] {
        &self.outputs
    }

    /// Inputs sorted by coordinate.
    pub fn inputs(&self) -> &[Terminal<InputTarget>] {
        &self.inputs
    }

    /// Every input with the output it listens to.
    pub fn links(&self) -> impl Iterator<Item = (&Terminal<InputTarget>, Option<OutputSource>)> {
        self.inputs.iter().zip(self.links.iter().copied())
    }

    /// Output feeding `target`.
    pub fn source_of(&self, target: InputTarget) -> Option<OutputSource> {
        self.links()
            .find(|(input, _)| input.kind == target)
            .and_then(|(_, source)| source)
    }
}

/// A neuron as declared by the genome, before wiring.
#[derive(Debug, Clone, Default)]
pub struct NeuronBlueprint {
    pub cell: CellId,
    /// Output coordinate.
    pub output: f32,
    pub transfer: Transfer,
    pub bias: CumulativeValue,
    pub gain: CumulativeValue,
    pub decay: CumulativeValue,
    /// `(input coordinate, weight)` per synapse.
    pub synapses: Vec<(f32, f32)>,
}

/// A sensor or motor attached to a body cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    pub cell: CellId,
    pub coordinate: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Synapse {
    pub source: Option<OutputSource>,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    pub cell: CellId,
    pub transfer: Transfer,
    pub bias: f32,
    pub gain: f32,
    /// Fraction of the previous activation kept each tick, in `[0, 1]`.
    pub decay: f32,
    pub inputs: Vec<Synapse>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Motor {
    pub cell: CellId,
    pub source: Option<OutputSource>,
}

/// Materialized controller of one organism.
#[derive(Debug, Clone, Default)]
pub struct NeuralNetwork {
    sensors: Vec<Port>,
    neurons: Vec<Neuron>,
    motors: Vec<Motor>,
    activations: Vec<f32>,
}

impl NeuralNetwork {
    /// Wire sensors, declared neurons and motors by coordinate.
    pub fn assemble(
        sensors: Vec<Port>,
        blueprints: Vec<NeuronBlueprint>,
        motors: Vec<Port>,
    ) -> (Self, NeuralWiring) {
        let outputs = sensors
            .iter()
            .enumerate()
            .map(|(i, s)| Terminal {
                coordinate: s.coordinate,
                kind: OutputSource::Sensor(i),
            })
            .chain(blueprints.iter().enumerate().map(|(i, n)| Terminal {
                coordinate: n.output,
                kind: OutputSource::Neuron(i),
            }))
            .collect();

        let mut inputs = Vec::new();
        for (neuron, blueprint) in blueprints.iter().enumerate() {
            for (synapse, &(coordinate, _)) in blueprint.synapses.iter().enumerate() {
                inputs.push(Terminal {
                    coordinate,
                    kind: InputTarget::Synapse { neuron, synapse },
                });
            }
        }
        for (i, motor) in motors.iter().enumerate() {
            inputs.push(Terminal {
                coordinate: motor.coordinate,
                kind: InputTarget::Motor(i),
            });
        }

        let wiring = NeuralWiring::resolve(outputs, inputs);

        let neurons: Vec<Neuron> = blueprints
            .into_iter()
            .enumerate()
            .map(|(n, bp)| Neuron {
                cell: bp.cell,
                transfer: bp.transfer,
                bias: bp.bias.get(),
                gain: bp.gain.get_or(1.0),
                decay: bp.decay.clamp(0.0, 1.0),
                inputs: bp
                    .synapses
                    .iter()
                    .enumerate()
                    .map(|(s, &(_, weight))| Synapse {
                        source: wiring.source_of(InputTarget::Synapse {
                            neuron: n,
                            synapse: s,
                        }),
                        weight,
                    })
                    .collect(),
            })
            .collect();
        let motors = motors
            .iter()
            .enumerate()
            .map(|(i, m)| Motor {
                cell: m.cell,
                source: wiring.source_of(InputTarget::Motor(i)),
            })
            .collect();

        let network = Self {
            activations: vec![0.0; neurons.len()],
            sensors,
            neurons,
            motors,
        };
        (network, wiring)
    }

    pub fn sensors(&self) -> &[Port] {
        &self.sensors
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn motors(&self) -> &[Motor] {
        &self.motors
    }

    /// Current neuron activations.
    pub fn activations(&self) -> &[f32] {
        &self.activations
    }

    /// Advance the network by one synchronous update.
    ///
    /// Neurons read sensor values and the previous activations; motors read
    /// the updated activations. Missing sensor values read as zero.
    pub fn tick(&mut self, sensor_values: &[f32]) -> Vec<f32> {
        let previous = self.activations.clone();
        let read = |source: Option<OutputSource>, neurons: &[f32]| match source {
            Some(OutputSource::Sensor(i)) => sensor_values.get(i).copied().unwrap_or(0.0),
            Some(OutputSource::Neuron(i)) => neurons.get(i).copied().unwrap_or(0.0),
            None => 0.0,
        };

        for (i, neuron) in self.neurons.iter().enumerate() {
            let sum: f32 = neuron
                .inputs
                .iter()
                .map(|s| s.weight * read(s.source, &previous))
                .sum();
            let fresh = neuron.transfer.apply(neuron.gain * sum + neuron.bias);
            self.activations[i] = neuron.decay * previous[i] + (1.0 - neuron.decay) * fresh;
        }

        self.motors
            .iter()
            .map(|m| read(m.source, &self.activations))
            .collect()
    }

    /// Zero every activation.
    pub fn reset(&mut self) {
        self.activations.iter_mut().for_each(|a| *a = 0.0);
    }
}
