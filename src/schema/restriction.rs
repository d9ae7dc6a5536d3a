//! Branch restrictions: which cells of the division tree a gene affects.
//!
//! A restriction looks rootward from the cell being decoded. Level 0 is the
//! cell itself, level 1 its parent, and so on. Each level may veto cells of
//! one or both handedness (skip) and may end the walk early for one or both
//! handedness (stop). A gene either applies to a cell or it does not.
//!
//! # Textual code
//!
//! Restrictions can be authored as a sequence of `<skip><stop>` character
//! pairs, most-local level first:
//!
//! ```text
//! skip:  0 = skip both    L = skip right (applies to left)
//!        R = skip left    * = skip none
//! stop:  v = propagate    < = stop right
//!        > = stop left    - = stop both
//! ```

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::atom::{Atom, Mutable};

/// Maximum number of depth levels a restriction can express.
pub const MAX_RESTRICTION_LEVELS: usize = 8;

/// Handedness of a cell relative to its sister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Character used in branch-path strings.
    pub fn symbol(self) -> char {
        match self {
            Side::Left => 'L',
            Side::Right => 'R',
        }
    }

    /// Index into per-child arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

impl super::atom::Selector for Side {
    const ALL: &'static [Self] = &[Side::Left, Side::Right];
}

/// One depth level of a restriction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RestrictionLevel {
    pub skip_left: Atom<bool>,
    pub skip_right: Atom<bool>,
    pub stop_left: Atom<bool>,
    pub stop_right: Atom<bool>,
}

impl RestrictionLevel {
    fn skips(&self, side: Side) -> bool {
        match side {
            Side::Left => self.skip_left.get(),
            Side::Right => self.skip_right.get(),
        }
    }

    fn stops(&self, side: Side) -> bool {
        match side {
            Side::Left => self.stop_left.get(),
            Side::Right => self.stop_right.get(),
        }
    }

    fn skip_symbol(&self) -> char {
        match (self.skip_left.get(), self.skip_right.get()) {
            (true, true) => '0',
            (false, true) => 'L',
            (true, false) => 'R',
            (false, false) => '*',
        }
    }

    fn stop_symbol(&self) -> char {
        match (self.stop_left.get(), self.stop_right.get()) {
            (false, false) => 'v',
            (false, true) => '<',
            (true, false) => '>',
            (true, true) => '-',
        }
    }

    fn from_symbols(skip: char, stop: char) -> Result<Self, RestrictionCodeError> {
        let (skip_left, skip_right) = match skip {
            '0' => (true, true),
            'L' => (false, true),
            'R' => (true, false),
            '*' => (false, false),
            other => return Err(RestrictionCodeError::InvalidSkip(other)),
        };
        let (stop_left, stop_right) = match stop {
            'v' => (false, false),
            '<' => (false, true),
            '>' => (true, false),
            '-' => (true, true),
            other => return Err(RestrictionCodeError::InvalidStop(other)),
        };
        Ok(Self {
            skip_left: Atom::new(skip_left),
            skip_right: Atom::new(skip_right),
            stop_left: Atom::new(stop_left),
            stop_right: Atom::new(stop_right),
        })
    }
}

/// Per-gene predicate over cells of the growing division tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchRestriction {
    active_levels: Atom<u8>,
    levels: [RestrictionLevel; MAX_RESTRICTION_LEVELS],
}

impl Default for BranchRestriction {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl BranchRestriction {
    /// A restriction with no active levels: qualifies every cell.
    pub fn unrestricted() -> Self {
        Self {
            active_levels: Atom::new(0),
            levels: [RestrictionLevel::default(); MAX_RESTRICTION_LEVELS],
        }
    }

    /// Build from explicit levels, most-local first.
    pub fn from_levels(levels: &[RestrictionLevel]) -> Result<Self, RestrictionCodeError> {
        if levels.len() > MAX_RESTRICTION_LEVELS {
            return Err(RestrictionCodeError::TooManyLevels(levels.len()));
        }
        let mut restriction = Self::unrestricted();
        restriction.levels[..levels.len()].copy_from_slice(levels);
        restriction.active_levels.set(levels.len() as u8);
        Ok(restriction)
    }

    /// Number of levels currently evaluated.
    #[inline]
    pub fn active_levels(&self) -> usize {
        (self.active_levels.get() as usize).min(MAX_RESTRICTION_LEVELS)
    }

    /// The active levels, most-local first.
    pub fn levels(&self) -> &[RestrictionLevel] {
        &self.levels[..self.active_levels()]
    }

    /// Whether a gene carrying this restriction applies to the cell with the
    /// given branch path (root first, the cell's own side last).
    pub fn qualifies(&self, path: &[Side]) -> bool {
        for (depth, level) in self.levels().iter().enumerate() {
            let side = path.len().checked_sub(depth + 1).map(|i| path[i]);
            match side {
                Some(side) => {
                    if level.skips(side) {
                        return false;
                    }
                    if level.stops(side) {
                        return true;
                    }
                }
                // Past the root there is no handedness left to test.
                None => return !(level.skip_left.get() && level.skip_right.get()),
            }
        }
        true
    }

    /// Textual authoring code for the active levels.
    pub fn code(&self) -> String {
        self.levels()
            .iter()
            .flat_map(|l| [l.skip_symbol(), l.stop_symbol()])
            .collect()
    }

    /// Mutable atoms of this restriction: the level count and the flags of
    /// the active levels. Inactive levels are neither evaluated nor mutated.
    pub fn atoms_mut(&mut self) -> Vec<&mut dyn Mutable> {
        let active = self.active_levels();
        let mut atoms: Vec<&mut dyn Mutable> = vec![&mut self.active_levels];
        for level in self.levels.iter_mut().take(active) {
            atoms.push(&mut level.skip_left);
            atoms.push(&mut level.skip_right);
            atoms.push(&mut level.stop_left);
            atoms.push(&mut level.stop_right);
        }
        atoms
    }

    /// Randomize the flags of one level in place (used by gene generation).
    pub(crate) fn randomize_level(&mut self, depth: usize, rng: &mut dyn RngCore) {
        use rand::Rng;
        if let Some(level) = self.levels.get_mut(depth) {
            level.skip_left.set(rng.gen_bool(0.25));
            level.skip_right.set(rng.gen_bool(0.25));
            level.stop_left.set(rng.gen_bool(0.25));
            level.stop_right.set(rng.gen_bool(0.25));
        }
    }

    pub(crate) fn set_active_levels(&mut self, count: usize) {
        self.active_levels.set(count.min(MAX_RESTRICTION_LEVELS) as u8);
    }
}

impl fmt::Display for BranchRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for BranchRestriction {
    type Err = RestrictionCodeError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = code.chars().collect();
        if chars.len() % 2 != 0 {
            return Err(RestrictionCodeError::OddLength(chars.len()));
        }
        let levels = chars
            .chunks(2)
            .map(|pair| RestrictionLevel::from_symbols(pair[0], pair[1]))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_levels(&levels)
    }
}

/// Errors from parsing a textual restriction code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RestrictionCodeError {
    #[error("Restriction code must have an even number of characters, got {0}")]
    OddLength(usize),
    #[error("Invalid skip symbol '{0}' (expected one of 0, L, R, *)")]
    InvalidSkip(char),
    #[error("Invalid stop symbol '{0}' (expected one of v, <, >, -)")]
    InvalidStop(char),
    #[error("Restriction has {0} levels, maximum is {max}", max = MAX_RESTRICTION_LEVELS)]
    TooManyLevels(usize),
}
