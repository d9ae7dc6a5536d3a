//! Cell division, bond redistribution and geometric relaxation.

use std::collections::{HashMap, VecDeque};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::schema::{DevelopmentConfig, DivisionProperty, Side};

use super::cell::{Bond, BodyCell, CellId, CellTree, wrap_angle};
use super::cumulative::{CumulativeValue, clamp_between};

/// Resolved parameters of one division.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivisionParams {
    /// Cut-line angle relative to the parent's orientation (radians).
    pub angle: f32,
    /// Area fraction given to the left child.
    pub ratio: f32,
    pub reorient: bool,
    pub mirror: bool,
}

impl Default for DivisionParams {
    fn default() -> Self {
        Self {
            angle: 0.0,
            ratio: 0.5,
            reorient: false,
            mirror: false,
        }
    }
}

impl DivisionParams {
    /// Resolve accumulated division genes against the configured bounds.
    pub fn from_accumulated(
        values: &HashMap<DivisionProperty, CumulativeValue>,
        config: &DevelopmentConfig,
    ) -> Self {
        let read = |p: DivisionProperty| values.get(&p).copied().unwrap_or_default();

        let angle = read(DivisionProperty::Angle).get();
        let ratio = read(DivisionProperty::Ratio).get_or(0.5);
        Self {
            angle: if angle.is_finite() { angle } else { 0.0 },
            ratio: if ratio.is_finite() {
                clamp_between(ratio, config.min_ratio, config.max_ratio)
            } else {
                0.5
            },
            reorient: read(DivisionProperty::Reorient).get() > 0.0,
            mirror: read(DivisionProperty::Mirror).get() > 0.0,
        }
    }
}

/// Split a leaf cell in two and hand its bonds to the children.
///
/// The children touch along the parent's cut line, conserve the parent's
/// area and keep its area-weighted centre. They inherit the parent's
/// accumulated attributes and are bonded to each other. Returns
/// `[left, right]`.
pub fn divide(
    tree: &mut CellTree,
    parent: CellId,
    params: &DivisionParams,
    config: &DevelopmentConfig,
) -> [CellId; 2] {
    let cell = tree[parent].clone();

    let cut = if cell.mirrored {
        -params.angle
    } else {
        params.angle
    };
    let cut_world = cell.angle + cut;
    let normal = (
        (cut_world + FRAC_PI_2).cos(),
        (cut_world + FRAC_PI_2).sin(),
    );

    let t = params.ratio;
    let left_size = cell.size * t.sqrt();
    let right_size = cell.size * (1.0 - t).sqrt();
    let spacing = left_size + right_size;

    let child = |side: Side, size: f32, offset: f32, angle: f32, mirrored: bool| {
        let mut path = cell.path.clone();
        path.push(side);
        BodyCell {
            position: (
                cell.position.0 + normal.0 * offset,
                cell.position.1 + normal.1 * offset,
            ),
            angle,
            size,
            mirrored,
            path,
            bonds: Vec::new(),
            parent: Some(parent),
            children: None,
            ..cell.clone()
        }
    };

    let (left_angle, right_angle) = if params.reorient {
        (cut_world + FRAC_PI_2, cut_world - FRAC_PI_2)
    } else {
        (cell.angle, cell.angle)
    };
    let left = tree.push(child(
        Side::Left,
        left_size,
        (1.0 - t) * spacing,
        wrap_angle(left_angle),
        cell.mirrored,
    ));
    let right = tree.push(child(
        Side::Right,
        right_size,
        -t * spacing,
        wrap_angle(right_angle),
        cell.mirrored ^ params.mirror,
    ));
    tree.set_children(parent, [left, right]);

    // Snapshot: neighbour bond lists are rewritten while walking these.
    let inherited: Vec<Bond> = std::mem::take(&mut tree[parent].bonds);
    for bond in inherited {
        tree[bond.neighbor].bonds.retain(|b| b.neighbor != parent);
        let diff = wrap_angle(bond.angle - cut);
        let along_cut =
            diff.abs() <= config.division_tolerance || PI - diff.abs() <= config.division_tolerance;
        let targets = if along_cut {
            vec![left, right]
        } else if diff > 0.0 {
            vec![left]
        } else {
            vec![right]
        };
        for &target in &targets {
            tree.bond(target, bond.neighbor);
        }
        log::trace!(
            "bond to {:?} at {:.3} rad -> {:?}",
            bond.neighbor,
            bond.angle,
            targets
        );
    }
    tree.bond(left, right);

    [left, right]
}

/// Outcome of one relaxation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelaxStats {
    /// Bond corrections applied.
    pub corrections: usize,
    /// Cell visits made.
    pub visits: usize,
    /// Whether the corrections alone reached a fixed point before the visit
    /// cap.
    pub converged: bool,
    /// Bonds released because they were still strained at the visit cap.
    pub released: usize,
}

/// Correct bond lengths until every bond matches the sum of its radii.
///
/// Starting from `seeds`, each marked cell compares its distance to every
/// bonded neighbour against the sum of their radii. A mismatch beyond
/// `tolerance * (r_a + r_b)` moves both cells along the line between them,
/// the smaller cell moving further, and marks both cells and their
/// neighbours again. Bond angles are refreshed from the final geometry.
///
/// Bond duplication can produce bond graphs no placement satisfies. When the
/// visit cap is reached first, every bond still out of tolerance is released,
/// so the result is always a fixed point: relaxing again corrects nothing.
pub fn relax(
    tree: &mut CellTree,
    seeds: &[CellId],
    tolerance: f32,
    max_visits: usize,
) -> RelaxStats {
    let mut stats = RelaxStats::default();
    let mut marked = vec![false; tree.len()];
    let mut queue = VecDeque::new();

    for &seed in seeds {
        mark(seed, &mut marked, &mut queue);
    }

    stats.converged = true;
    while let Some(a) = queue.pop_front() {
        if stats.visits >= max_visits {
            stats.converged = false;
            break;
        }
        stats.visits += 1;
        marked[a.0] = false;

        let bonds: Vec<Bond> = tree[a].bonds.clone();
        for bond in bonds {
            let b = bond.neighbor;
            if !correct_bond(tree, a, b, bond.angle, tolerance) {
                continue;
            }
            stats.corrections += 1;
            let neighbours: Vec<CellId> = tree[a]
                .bonds
                .iter()
                .chain(tree[b].bonds.iter())
                .map(|n| n.neighbor)
                .collect();
            mark(a, &mut marked, &mut queue);
            mark(b, &mut marked, &mut queue);
            for n in neighbours {
                mark(n, &mut marked, &mut queue);
            }
        }
    }

    if !stats.converged {
        stats.released = release_strained_bonds(tree, tolerance);
    }

    tree.refresh_bond_angles();
    log::trace!(
        "relaxation: {} corrections over {} visits (converged: {}, released: {})",
        stats.corrections,
        stats.visits,
        stats.converged,
        stats.released
    );
    stats
}

/// Whether the bond between `a` and `b` is off its rest length by more than
/// `tolerance * (r_a + r_b)`.
fn is_strained(tree: &CellTree, a: CellId, b: CellId, tolerance: f32) -> bool {
    let rest = tree[a].size + tree[b].size;
    (tree.distance(a, b) - rest).abs() > tolerance * rest
}

/// Drop every strained bond in the tree. Returns the number dropped.
fn release_strained_bonds(tree: &mut CellTree, tolerance: f32) -> usize {
    let strained: Vec<(CellId, CellId)> = tree
        .iter()
        .flat_map(|(a, cell)| cell.bonds.iter().map(move |bond| (a, bond.neighbor)))
        .filter(|&(a, b)| a.0 < b.0 && is_strained(tree, a, b, tolerance))
        .collect();
    for &(a, b) in &strained {
        tree.unbond(a, b);
    }
    strained.len()
}

fn mark(id: CellId, marked: &mut [bool], queue: &mut VecDeque<CellId>) {
    if !marked[id.0] {
        marked[id.0] = true;
        queue.push_back(id);
    }
}

/// Move `a` and `b` so their distance equals the sum of their radii.
/// Returns false when the bond was already within tolerance.
fn correct_bond(tree: &mut CellTree, a: CellId, b: CellId, angle: f32, tolerance: f32) -> bool {
    if !is_strained(tree, a, b, tolerance) {
        return false;
    }
    let (ra, rb) = (tree[a].size, tree[b].size);
    let rest = ra + rb;
    let distance = tree.distance(a, b);
    let error = distance - rest;

    let (pa, pb) = (tree[a].position, tree[b].position);
    let direction = if distance > f32::EPSILON {
        ((pb.0 - pa.0) / distance, (pb.1 - pa.1) / distance)
    } else {
        // Coincident cells: separate along the recorded bond direction.
        let world = tree[a].angle + angle;
        (world.cos(), world.sin())
    };

    let share_a = rb / rest;
    let share_b = ra / rest;
    tree[a].position.0 += direction.0 * error * share_a;
    tree[a].position.1 += direction.1 * error * share_a;
    tree[b].position.0 -= direction.0 * error * share_b;
    tree[b].position.1 -= direction.1 * error * share_b;
    true
}
