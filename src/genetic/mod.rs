//! Genetic algorithm for the TSP.
//!
//! This module exports the population, the genetic operators, and the
//! pluggable fitness and selection policies driven by [`Solver`].

pub mod operators;
pub mod fitness;
pub mod selection;
pub mod population;
pub mod solver;

pub use fitness::{ExponentialFitness, FitnessFunction, FitnessType, InverseFitness};
pub use population::{tour_cost, Population};
pub use selection::{MinMax, Percentile, SelectionStrategy, SelectionType};
pub use solver::{GenerationReport, Solver};
