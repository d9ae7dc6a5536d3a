//! Body cells and the division-tree arena.

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};
use std::ops::{Index, IndexMut};

use crate::schema::{JointProperty, MuscleProperty, Organ, PartProperty, Side};

use super::cumulative::CumulativeValue;

/// Stable index of a cell in a [`CellTree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub usize);

/// Adjacency to a neighbouring cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub neighbor: CellId,
    /// Direction of the neighbour relative to this cell's orientation.
    pub angle: f32,
}

/// A node of the division tree.
///
/// Only leaves are part of the finished body. Interior cells keep their
/// geometry at the moment they divided but lose all bonds.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyCell {
    pub position: (f32, f32),
    pub angle: f32,
    /// Radius.
    pub size: f32,
    pub mirrored: bool,
    /// Branch choices from the root, the cell's own side last.
    pub path: Vec<Side>,
    pub bonds: Vec<Bond>,
    /// Virtual matching space coordinate for neural wiring.
    pub vms: f32,
    pub part: HashMap<PartProperty, CumulativeValue>,
    pub joint: HashMap<JointProperty, CumulativeValue>,
    pub muscle: HashMap<MuscleProperty, CumulativeValue>,
    pub parent: Option<CellId>,
    pub children: Option<[CellId; 2]>,
}

impl BodyCell {
    /// An unbonded root cell at the origin.
    pub fn root(size: f32) -> Self {
        Self {
            position: (0.0, 0.0),
            angle: 0.0,
            size,
            mirrored: false,
            path: Vec::new(),
            bonds: Vec::new(),
            vms: 0.0,
            part: HashMap::new(),
            joint: HashMap::new(),
            muscle: HashMap::new(),
            parent: None,
            children: None,
        }
    }

    /// Handedness relative to the sister cell; `None` for the root.
    pub fn side(&self) -> Option<Side> {
        self.path.last().copied()
    }

    /// Branch path as `L`/`R` characters, root first.
    pub fn path_string(&self) -> String {
        self.path.iter().map(|s| s.symbol()).collect()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Accumulated part attribute (unset when no gene wrote it).
    pub fn part(&self, property: PartProperty) -> CumulativeValue {
        self.part.get(&property).copied().unwrap_or_default()
    }

    pub fn joint(&self, property: JointProperty) -> CumulativeValue {
        self.joint.get(&property).copied().unwrap_or_default()
    }

    pub fn muscle(&self, property: MuscleProperty) -> CumulativeValue {
        self.muscle.get(&property).copied().unwrap_or_default()
    }

    /// Organ selected by the accumulated organ attribute.
    pub fn organ(&self) -> Organ {
        Organ::from_value(self.part(PartProperty::Organ).get())
    }

    /// Whether the cell exposes a motor input.
    pub fn has_muscle(&self) -> bool {
        self.muscle(MuscleProperty::Strength).get() > 0.0
    }

    pub fn bond_to(&self, neighbor: CellId) -> Option<&Bond> {
        self.bonds.iter().find(|b| b.neighbor == neighbor)
    }
}

/// Wrap an angle into `(-pi, pi]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

/// Arena of cells addressed by [`CellId`].
#[derive(Debug, Clone, Default)]
pub struct CellTree {
    cells: Vec<BodyCell>,
    leaf_count: usize,
}

impl CellTree {
    /// A tree holding only `root`.
    pub fn new(root: BodyCell) -> Self {
        let mut tree = Self::default();
        tree.push(root);
        tree
    }

    pub fn root(&self) -> CellId {
        CellId(0)
    }

    /// Add a cell to the arena.
    pub fn push(&mut self, cell: BodyCell) -> CellId {
        if cell.is_leaf() {
            self.leaf_count += 1;
        }
        self.cells.push(cell);
        CellId(self.cells.len() - 1)
    }

    /// Total number of cells ever created, interior cells included.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, id: CellId) -> Option<&BodyCell> {
        self.cells.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellId, &BodyCell)> {
        self.cells.iter().enumerate().map(|(i, c)| (CellId(i), c))
    }

    /// Cells of the finished body, in creation order.
    pub fn leaves(&self) -> impl Iterator<Item = (CellId, &BodyCell)> {
        self.iter().filter(|(_, c)| c.is_leaf())
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Mark `parent` as divided into `children`.
    pub(crate) fn set_children(&mut self, parent: CellId, children: [CellId; 2]) {
        let cell = &mut self[parent];
        if cell.children.replace(children).is_none() {
            self.leaf_count -= 1;
        }
    }

    /// Bond two cells, replacing any existing bond between them.
    pub fn bond(&mut self, a: CellId, b: CellId) {
        self.unbond(a, b);
        let angle_ab = self.direction(a, b).unwrap_or(0.0);
        let angle_ba = self.direction(b, a).unwrap_or(PI);
        self[a].bonds.push(Bond {
            neighbor: b,
            angle: angle_ab,
        });
        self[b].bonds.push(Bond {
            neighbor: a,
            angle: angle_ba,
        });
    }

    pub fn unbond(&mut self, a: CellId, b: CellId) {
        self[a].bonds.retain(|bond| bond.neighbor != b);
        self[b].bonds.retain(|bond| bond.neighbor != a);
    }

    /// Direction from `from` to `to` relative to the orientation of `from`,
    /// or `None` when the two cells coincide.
    pub fn direction(&self, from: CellId, to: CellId) -> Option<f32> {
        let a = &self[from];
        let b = &self[to];
        let dx = b.position.0 - a.position.0;
        let dy = b.position.1 - a.position.1;
        if dx * dx + dy * dy <= f32::EPSILON {
            return None;
        }
        Some(wrap_angle(dy.atan2(dx) - a.angle))
    }

    /// Recompute every bond angle from the current geometry. Bonds between
    /// coincident cells keep their previous angle.
    pub fn refresh_bond_angles(&mut self) {
        for i in 0..self.cells.len() {
            let from = CellId(i);
            for j in 0..self.cells[i].bonds.len() {
                let to = self.cells[i].bonds[j].neighbor;
                if let Some(angle) = self.direction(from, to) {
                    self.cells[i].bonds[j].angle = angle;
                }
            }
        }
    }

    /// Distance between two cell centres.
    pub fn distance(&self, a: CellId, b: CellId) -> f32 {
        let (pa, pb) = (self[a].position, self[b].position);
        ((pb.0 - pa.0).powi(2) + (pb.1 - pa.1).powi(2)).sqrt()
    }
}

impl Index<CellId> for CellTree {
    type Output = BodyCell;

    fn index(&self, id: CellId) -> &BodyCell {
        &self.cells[id.0]
    }
}

impl IndexMut<CellId> for CellTree {
    fn index_mut(&mut self, id: CellId) -> &mut BodyCell {
        &mut self.cells[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-5);
        assert_eq!(wrap_angle(0.5), 0.5);
    }

    #[test]
    fn test_bond_angles_follow_geometry() {
        let mut tree = CellTree::new(BodyCell::root(1.0));
        let mut other = BodyCell::root(1.0);
        other.position = (0.0, 2.0);
        let b = tree.push(other);
        tree.bond(tree.root(), b);

        let bond = tree[tree.root()].bond_to(b).unwrap();
        assert!((bond.angle - PI / 2.0).abs() < 1e-5);
        let back = tree[b].bond_to(tree.root()).unwrap();
        assert!((back.angle + PI / 2.0).abs() < 1e-5);

        tree[b].angle = PI / 2.0;
        tree.refresh_bond_angles();
        let back = tree[b].bond_to(tree.root()).unwrap();
        assert!((back.angle - PI).abs() < 1e-5);
    }

    #[test]
    fn test_leaf_count_tracks_division() {
        let mut tree = CellTree::new(BodyCell::root(1.0));
        assert_eq!(tree.leaf_count(), 1);
        let l = tree.push(BodyCell::root(0.5));
        let r = tree.push(BodyCell::root(0.5));
        tree.set_children(tree.root(), [l, r]);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.leaves().count(), 2);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_cell_path_and_organ() {
        let mut cell = BodyCell::root(1.0);
        assert_eq!(cell.side(), None);
        cell.path = vec![Side::Left, Side::Right];
        assert_eq!(cell.path_string(), "LR");
        assert_eq!(cell.side(), Some(Side::Right));
        assert_eq!(cell.organ(), Organ::Structure);
        cell.part
            .entry(PartProperty::Organ)
            .or_default()
            .add(Organ::Gonad.value());
        assert_eq!(cell.organ(), Organ::Gonad);
    }
}
