use serde::{Deserialize, Serialize};

use crate::Float;

/// Ink left on a field cell after a chord crosses it.
///
/// Implementations must keep the result in `[0, weight]`.
pub trait Darkness<S>: Send + Sync {
    fn compute(&self, weight: S) -> S;
}

#[derive(Clone, Copy, Debug)]
pub struct FlatDarkness<S>(pub S);

impl<T: Float> Darkness<T> for FlatDarkness<T> {
    fn compute(&self, weight: T) -> T {
        (weight - self.0).max(T::ZERO)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PercentageDarkness<S>(pub S);

impl<S: Float> Darkness<S> for PercentageDarkness<S> {
    fn compute(&self, weight: S) -> S {
        (self.0 * weight).max(S::ZERO).min(weight)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DarknessMode {
    /// Subtracts the ink weight from every crossed cell.
    #[default]
    Flat,
    /// Removes the ink weight as a fraction of what every crossed cell holds.
    Percentage,
}

impl std::fmt::Display for DarknessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DarknessMode::Flat => write!(f, "Flat"),
            DarknessMode::Percentage => write!(f, "Percentage"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_subtracts_and_stops_at_zero() {
        let flat = FlatDarkness(0.25f32);
        assert_eq!(flat.compute(1.0), 0.75);
        assert_eq!(flat.compute(0.1), 0.0);
        assert_eq!(flat.compute(0.0), 0.0);
    }

    #[test]
    fn percentage_scales() {
        let percentage = PercentageDarkness(0.5f64);
        assert_eq!(percentage.compute(0.8), 0.4);
        assert_eq!(percentage.compute(0.0), 0.0);
    }
}
