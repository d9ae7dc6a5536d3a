//! Mutable gene fields.
//!
//! Every heritable value carries its own mutation volatility: a chance to be
//! perturbed during a mutation pass and the size of that perturbation. Both
//! meta-parameters drift over generations alongside the value itself.

use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Baseline chance-to-mutate assigned by [`Atom::set`].
pub const BASE_CHANCE_TO_MUTATE: f32 = 0.05;
/// Baseline change-amount assigned by [`Atom::set`].
pub const BASE_CHANGE_AMOUNT: f32 = 0.1;

/// Value types that can live inside an [`Atom`].
pub trait AtomValue: Copy + PartialEq + std::fmt::Debug {
    /// Apply one random perturbation of the given magnitude.
    fn perturb(&mut self, amount: f32, rng: &mut dyn RngCore);
}

impl AtomValue for f32 {
    fn perturb(&mut self, amount: f32, rng: &mut dyn RngCore) {
        let noise: f32 = rng.sample(StandardNormal);
        *self += noise * amount;
    }
}

impl AtomValue for i32 {
    fn perturb(&mut self, _amount: f32, rng: &mut dyn RngCore) {
        *self = if rng.gen_bool(0.5) {
            self.saturating_add(1)
        } else {
            self.saturating_sub(1)
        };
    }
}

impl AtomValue for u8 {
    fn perturb(&mut self, _amount: f32, rng: &mut dyn RngCore) {
        // At the bounds the only available step is inward.
        *self = match *self {
            0 => 1,
            u8::MAX => u8::MAX - 1,
            v if rng.gen_bool(0.5) => v + 1,
            v => v - 1,
        };
    }
}

impl AtomValue for bool {
    fn perturb(&mut self, _amount: f32, _rng: &mut dyn RngCore) {
        *self = !*self;
    }
}

/// A heritable value with two independently drifting meta-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atom<T> {
    value: T,
    chance_to_mutate: f32,
    change_amount: f32,
}

impl<T: AtomValue> Atom<T> {
    /// Create an atom with baseline mutation volatility.
    pub fn new(value: T) -> Self {
        Self {
            value,
            chance_to_mutate: BASE_CHANCE_TO_MUTATE,
            change_amount: BASE_CHANGE_AMOUNT,
        }
    }

    /// Create an atom with explicit meta-parameters.
    pub fn with_meta(value: T, chance_to_mutate: f32, change_amount: f32) -> Self {
        Self {
            value,
            chance_to_mutate: chance_to_mutate.max(0.0),
            change_amount: change_amount.max(0.0),
        }
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> T {
        self.value
    }

    /// Replace the value and reseed both meta-parameters from the baseline.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.chance_to_mutate = BASE_CHANCE_TO_MUTATE;
        self.change_amount = BASE_CHANGE_AMOUNT;
    }

    #[inline]
    pub fn chance_to_mutate(&self) -> f32 {
        self.chance_to_mutate
    }

    #[inline]
    pub fn change_amount(&self) -> f32 {
        self.change_amount
    }
}

impl<T: AtomValue + Default> Default for Atom<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Object-safe view of an atom used by the mutation pass.
pub trait Mutable {
    /// Own chance to be perturbed in one pass.
    fn chance(&self) -> f32;
    /// Perturb the value; returns whether it actually changed.
    fn perturb(&mut self, rng: &mut dyn RngCore) -> bool;
    /// Random-walk both meta-parameters, clamped to be non-negative.
    fn drift(&mut self, step: f32, rng: &mut dyn RngCore);
}

impl<T: AtomValue> Mutable for Atom<T> {
    fn chance(&self) -> f32 {
        self.chance_to_mutate
    }

    fn perturb(&mut self, rng: &mut dyn RngCore) -> bool {
        let before = self.value;
        self.value.perturb(self.change_amount, rng);
        self.value != before
    }

    fn drift(&mut self, step: f32, rng: &mut dyn RngCore) {
        self.chance_to_mutate = drift_meta(self.chance_to_mutate, step, rng);
        self.change_amount = drift_meta(self.change_amount, step, rng);
    }
}

/// One step of the meta-parameter random walk.
pub fn drift_meta(value: f32, step: f32, rng: &mut dyn RngCore) -> f32 {
    let noise: f32 = rng.sample(StandardNormal);
    let drifted = value + noise * step;
    if drifted.is_finite() { drifted.max(0.0) } else { 0.0 }
}

/// Closed enums addressed by a mutable `u8` selector.
///
/// Any raw value maps onto a variant (modulo the variant count), so a
/// selector mutated by ±1 always names a legal variant.
pub trait Selector: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn from_raw(raw: u8) -> Self {
        Self::ALL[raw as usize % Self::ALL.len()]
    }

    fn raw(self) -> u8 {
        Self::ALL.iter().position(|v| *v == self).unwrap_or(0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_set_resets_meta() {
        let mut atom = Atom::with_meta(1.0f32, 0.9, 3.0);
        atom.set(2.0);
        assert_eq!(atom.get(), 2.0);
        assert_eq!(atom.chance_to_mutate(), BASE_CHANCE_TO_MUTATE);
        assert_eq!(atom.change_amount(), BASE_CHANGE_AMOUNT);
    }

    #[test]
    fn test_perturb_does_not_reset_meta() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut atom = Atom::with_meta(0.5f32, 0.7, 0.2);
        Mutable::perturb(&mut atom, &mut rng);
        assert_eq!(atom.chance_to_mutate(), 0.7);
        assert_eq!(atom.change_amount(), 0.2);
    }

    #[test]
    fn test_integer_steps_by_one() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut atom = Atom::new(10i32);
            assert!(Mutable::perturb(&mut atom, &mut rng));
            assert_eq!((atom.get() - 10).abs(), 1);
        }
    }

    #[test]
    fn test_u8_bounds_step_inward() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut low = Atom::new(0u8);
        Mutable::perturb(&mut low, &mut rng);
        assert_eq!(low.get(), 1);

        let mut high = Atom::new(u8::MAX);
        Mutable::perturb(&mut high, &mut rng);
        assert_eq!(high.get(), u8::MAX - 1);
    }

    #[test]
    fn test_bool_flips() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut atom = Atom::new(false);
        assert!(Mutable::perturb(&mut atom, &mut rng));
        assert!(atom.get());
    }

    #[test]
    fn test_drift_never_negative() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut atom = Atom::with_meta(0.0f32, 0.0, 0.0);
        for _ in 0..1000 {
            atom.drift(0.5, &mut rng);
            assert!(atom.chance_to_mutate() >= 0.0);
            assert!(atom.change_amount() >= 0.0);
        }
    }
}
