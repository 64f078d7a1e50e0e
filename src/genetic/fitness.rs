//! Cost-to-fitness transforms.
//!
//! Fitness is only used to rank individuals: it must decrease monotonically
//! with cost, higher is better.

use serde::{Deserialize, Serialize};

/// Maps a cost vector to a fitness vector of the same length.
pub trait FitnessFunction {
    /// `n` is the number of vertices in a tour.
    fn evaluate(&self, costs: &[f64], n: usize) -> Vec<f64>;
}

impl<F> FitnessFunction for F
where
    F: Fn(&[f64], usize) -> Vec<f64>,
{
    fn evaluate(&self, costs: &[f64], n: usize) -> Vec<f64> {
        self(costs, n)
    }
}

/// `exp(scale * n / cost)`, evaluated relative to the best individual.
///
/// The raw exponential overflows for small costs, so every exponent is shifted by
/// the largest one: the best individual gets fitness 1 and the ranking is kept.
/// Zero-cost individuals get 1 and everything else 0 when one is present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialFitness {
    pub scale: f64,
}

impl Default for ExponentialFitness {
    fn default() -> Self {
        ExponentialFitness { scale: 2.0 }
    }
}

impl FitnessFunction for ExponentialFitness {
    fn evaluate(&self, costs: &[f64], n: usize) -> Vec<f64> {
        let exponents: Vec<f64> = costs
            .iter()
            .map(|&c| self.scale * n as f64 / c)
            .collect();

        let max = exponents.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max.is_infinite() {
            return exponents
                .iter()
                .map(|&e| if e == f64::INFINITY { 1.0 } else { 0.0 })
                .collect();
        }

        exponents.iter().map(|&e| (e - max).exp()).collect()
    }
}

/// `1 / (1 + cost)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InverseFitness;

impl FitnessFunction for InverseFitness {
    fn evaluate(&self, costs: &[f64], _n: usize) -> Vec<f64> {
        costs.iter().map(|&c| 1.0 / (1.0 + c)).collect()
    }
}

/// Serializable choice of built-in fitness transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessType {
    Exponential { scale: f64 },
    Inverse,
}

impl Default for FitnessType {
    fn default() -> Self {
        FitnessType::Exponential { scale: 2.0 }
    }
}

impl FitnessType {
    pub fn build(self) -> Box<dyn FitnessFunction> {
        match self {
            FitnessType::Exponential { scale } => Box::new(ExponentialFitness { scale }),
            FitnessType::Inverse => Box::new(InverseFitness),
        }
    }
}
