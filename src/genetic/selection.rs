//! Survivor selection strategies.
//!
//! A strategy receives the fitness of the current generation and returns the
//! indices of the individuals that survive into the next one. The solver adds
//! the elite back if a strategy leaves it out.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};

/// Survivor selection policy.
///
/// `fitness` holds at least `gen_size` values, higher is better. `cut_frac` and
/// `percentile` are strategy parameters passed through from the configuration.
/// Implementations must return a non-empty set of indices in `0..gen_size`.
pub trait SelectionStrategy {
    fn select(&self, fitness: &[f64], gen_size: usize, cut_frac: f64, percentile: f64) -> Vec<usize>;
}

impl<F> SelectionStrategy for F
where
    F: Fn(&[f64], usize, f64, f64) -> Vec<usize>,
{
    fn select(&self, fitness: &[f64], gen_size: usize, cut_frac: f64, percentile: f64) -> Vec<usize> {
        self(fitness, gen_size, cut_frac, percentile)
    }
}

/// Quantile of `values` at `percentile` (0..=100)
fn quantile(values: &[f64], percentile: f64) -> f64 {
    let mut data = Data::new(values.to_vec());
    data.quantile((percentile / 100.0).clamp(0.0, 1.0))
}

/// Min-max scaled threshold selection.
///
/// Fitness is rescaled to `[0, 1]`; an individual survives when its scaled
/// fitness reaches `cut_frac` times the `percentile`-th percentile of the
/// scaled values. The best individual always survives. A flat generation
/// survives whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMax;

impl SelectionStrategy for MinMax {
    fn select(&self, fitness: &[f64], gen_size: usize, cut_frac: f64, percentile: f64) -> Vec<usize> {
        let fitness = &fitness[..gen_size];
        let min = fitness.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = fitness.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        if !(range.is_finite() && range > 0.0) {
            return (0..gen_size).collect();
        }

        let scaled: Vec<f64> = fitness.iter().map(|&f| (f - min) / range).collect();
        let threshold = cut_frac * quantile(&scaled, percentile);

        scaled
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s >= threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Percentile truncation.
///
/// Keeps the individuals at or above the `percentile`-th percentile of fitness,
/// then only the best `cut_frac` share of those (at least one). Survivors keep
/// their relative order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Percentile;

impl SelectionStrategy for Percentile {
    fn select(&self, fitness: &[f64], gen_size: usize, cut_frac: f64, percentile: f64) -> Vec<usize> {
        let fitness = &fitness[..gen_size];
        if fitness.is_empty() {
            return Vec::new();
        }

        let threshold = quantile(fitness, percentile);
        let mut candidates: Vec<usize> = (0..gen_size).filter(|&i| fitness[i] >= threshold).collect();
        candidates.sort_by_key(|&i| OrderedFloat(-fitness[i]));

        let keep = ((cut_frac * candidates.len() as f64).ceil() as usize).clamp(1, candidates.len().max(1));
        candidates.truncate(keep);
        candidates.sort_unstable();
        candidates
    }
}

/// Serializable choice of built-in selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    #[default]
    MinMax,
    Percentile,
}

impl SelectionType {
    pub fn build(self) -> Box<dyn SelectionStrategy> {
        match self {
            SelectionType::MinMax => Box::new(MinMax),
            SelectionType::Percentile => Box::new(Percentile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax_keeps_upper_half() {
        let fitness = [0.1, 0.9, 0.5, 0.3, 1.0, 0.0];
        let selected = MinMax.select(&fitness, fitness.len(), 1.0, 50.0);

        assert!(selected.contains(&4));
        assert!(selected.contains(&1));
        assert!(!selected.contains(&5));
        assert!(!selected.contains(&0));
        assert!(selected.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_minmax_zero_cut_keeps_everyone() {
        let fitness = [0.1, 0.9, 0.5];
        assert_eq!(MinMax.select(&fitness, 3, 0.0, 50.0), vec![0, 1, 2]);
    }

    #[test]
    fn test_minmax_flat_generation() {
        let fitness = [0.4; 4];
        assert_eq!(MinMax.select(&fitness, 4, 1.0, 90.0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_minmax_always_keeps_best() {
        let fitness = [0.0, 0.0, 0.0, 1.0];
        let selected = MinMax.select(&fitness, 4, 1.0, 100.0);
        assert_eq!(selected, vec![3]);
    }

    #[test]
    fn test_minmax_respects_gen_size() {
        let fitness = [0.2, 0.8, 5.0];
        let selected = MinMax.select(&fitness, 2, 1.0, 50.0);
        assert!(selected.iter().all(|&i| i < 2));
        assert!(selected.contains(&1));
    }

    #[test]
    fn test_percentile_truncation() {
        let fitness = [0.1, 0.9, 0.5, 0.3, 1.0, 0.0, 0.7, 0.2];
        let selected = Percentile.select(&fitness, fitness.len(), 1.0, 50.0);
        assert!(selected.contains(&4));
        assert!(selected.contains(&1));
        assert!(!selected.contains(&5));

        let best_only = Percentile.select(&fitness, fitness.len(), 0.01, 50.0);
        assert_eq!(best_only, vec![4]);
    }

    #[test]
    fn test_closure_strategy() {
        let keep_first = |_: &[f64], _: usize, _: f64, _: f64| vec![0usize];
        assert_eq!(keep_first.select(&[1.0, 2.0], 2, 1.0, 50.0), vec![0]);
        assert_eq!(SelectionType::default(), SelectionType::MinMax);
    }
}
