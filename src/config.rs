//! Solver configuration.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};
use crate::genetic::fitness::FitnessType;
use crate::genetic::selection::SelectionType;

/// Ceiling on the population size during offspring generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationCap {
    /// Capped at the initial population size
    #[default]
    Initial,
    /// Capped at a fixed size
    Fixed(usize),
    /// No cap: every crossover offspring is appended
    Unbounded,
}

/// Genetic algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Random seed, `None` draws one from the OS
    pub seed: Option<u64>,
    /// Vertex subset to tour, `None` means every vertex of the graph
    pub vertices: Option<Vec<usize>>,
    /// Initial population size
    pub population_size: usize,
    /// Per-position swap probability
    pub mutation_rate: f64,
    /// Per-position probability of becoming a crossover swap point
    pub crossover_point_rate: f64,
    /// Probability that an individual spawns one offspring per generation
    pub crossover_rate: f64,
    /// Survivor selection strategy
    pub selection: SelectionType,
    /// Cost to fitness transform
    pub fitness: FitnessType,
    /// Selection parameter, passed to the strategy
    pub cut_frac: f64,
    /// Selection parameter, passed to the strategy
    pub percentile: f64,
    /// Population size ceiling
    pub max_population: PopulationCap,
    /// Add the edge from the last vertex back to the first to every tour cost
    pub closed_tour: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            seed: None,
            vertices: None,
            population_size: 500,
            mutation_rate: 0.02,
            crossover_point_rate: 0.5,
            crossover_rate: 0.1,
            selection: SelectionType::MinMax,
            fitness: FitnessType::default(),
            cut_frac: 1.0,
            percentile: 50.0,
            max_population: PopulationCap::Initial,
            closed_tour: false,
        }
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SolverError::invalid(format!("{} must be in [0, 1], got {}", name, value)));
    }
    Ok(())
}

impl SolverConfig {
    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The vertex set this configuration tours on a graph with `graph_n` vertices
    pub fn vertex_set(&self, graph_n: usize) -> Vec<usize> {
        match &self.vertices {
            Some(v) => v.clone(),
            None => (0..graph_n).collect(),
        }
    }

    /// The population ceiling for the configured initial size
    pub fn max_pop(&self) -> Option<usize> {
        match self.max_population {
            PopulationCap::Initial => Some(self.population_size),
            PopulationCap::Fixed(cap) => Some(cap),
            PopulationCap::Unbounded => None,
        }
    }

    /// Check the configuration against a graph with `graph_n` vertices
    pub fn validate(&self, graph_n: usize) -> Result<()> {
        if self.population_size == 0 {
            return Err(SolverError::invalid("population size must be positive"));
        }

        let vertices = self.vertex_set(graph_n);
        if vertices.len() < 2 {
            return Err(SolverError::invalid(format!(
                "at least 2 vertices are required, got {}",
                vertices.len()
            )));
        }
        if let Some(&v) = vertices.iter().find(|&&v| v >= graph_n) {
            return Err(SolverError::invalid(format!(
                "vertex {} is out of range for a graph of {} vertices",
                v, graph_n
            )));
        }
        let mut seen = HashSet::with_capacity(vertices.len());
        if let Some(&v) = vertices.iter().find(|&&v| !seen.insert(v)) {
            return Err(SolverError::invalid(format!("vertex {} is listed twice", v)));
        }

        check_unit("mutation_rate", self.mutation_rate)?;
        check_unit("crossover_point_rate", self.crossover_point_rate)?;
        check_unit("crossover_rate", self.crossover_rate)?;
        check_unit("cut_frac", self.cut_frac)?;

        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(SolverError::invalid(format!(
                "percentile must be in [0, 100], got {}",
                self.percentile
            )));
        }

        if let FitnessType::Exponential { scale } = self.fitness {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(SolverError::invalid(format!("fitness scale must be positive, got {}", scale)));
            }
        }

        if let PopulationCap::Fixed(cap) = self.max_population {
            if cap < self.population_size {
                return Err(SolverError::invalid(format!(
                    "population cap {} is below the population size {}",
                    cap, self.population_size
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.population_size, 500);
        assert_eq!(config.mutation_rate, 0.02);
        assert_eq!(config.crossover_point_rate, 0.5);
        assert_eq!(config.crossover_rate, 0.1);
        assert_eq!(config.cut_frac, 1.0);
        assert_eq!(config.percentile, 50.0);
        assert_eq!(config.max_pop(), Some(500));
        assert!(!config.closed_tour);
        assert!(config.validate(10).is_ok());
    }

    #[test]
    fn test_invalid_configurations() {
        let cases = vec![
            SolverConfig { population_size: 0, ..Default::default() },
            SolverConfig { vertices: Some(vec![3]), ..Default::default() },
            SolverConfig { vertices: Some(vec![1, 1, 2]), ..Default::default() },
            SolverConfig { vertices: Some(vec![0, 12]), ..Default::default() },
            SolverConfig { mutation_rate: 1.5, ..Default::default() },
            SolverConfig { crossover_point_rate: -0.1, ..Default::default() },
            SolverConfig { crossover_rate: 2.0, ..Default::default() },
            SolverConfig { cut_frac: 1.1, ..Default::default() },
            SolverConfig { percentile: 101.0, ..Default::default() },
            SolverConfig { max_population: PopulationCap::Fixed(10), ..Default::default() },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(10), Err(SolverError::InvalidConfiguration(_))),
                "{:?} should be rejected",
                config
            );
        }

        assert!(SolverConfig::default().validate(1).is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: SolverConfig =
            serde_json::from_str(r#"{"seed": 3, "population_size": 20, "selection": "percentile"}"#).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.population_size, 20);
        assert_eq!(config.selection, SelectionType::Percentile);
        assert_eq!(config.mutation_rate, 0.02);

        let capped: SolverConfig = serde_json::from_str(r#"{"max_population": {"fixed": 800}}"#).unwrap();
        assert_eq!(capped.max_pop(), Some(800));
        let unbounded: SolverConfig = serde_json::from_str(r#"{"max_population": "unbounded"}"#).unwrap();
        assert_eq!(unbounded.max_pop(), None);
    }
}
