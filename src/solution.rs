//! Solution representation for the TSP solver.
//!
//! A [`Solution`] is the report of a training run: the best tour found, its
//! cost, and the best-cost history of every generation.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::genetic::operators;

/// Best tour of a run together with its training history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as a sequence of vertex indices
    pub tour: Vec<usize>,
    /// Tour cost
    pub cost: f64,
    /// Number of generations evolved
    pub generations: usize,
    /// Population size after the last generation
    pub population_size: usize,
    /// Best cost after each generation
    pub history: Vec<f64>,
    /// Seed of the run, if one was given
    pub seed: Option<u64>,
    /// Training time in seconds
    pub computation_time: f64,
}

#[derive(Serialize)]
struct HistoryRow {
    generation: usize,
    best_cost: f64,
}

impl Solution {
    /// Check that the tour visits every vertex of `vertices` exactly once
    pub fn is_permutation_of(&self, vertices: &[usize]) -> bool {
        operators::is_permutation_of(&self.tour, vertices)
    }

    /// Relative improvement of the final best cost over the first recorded generation
    pub fn improvement(&self) -> Option<f64> {
        let first = *self.history.first()?;
        let last = *self.history.last()?;
        if first > 0.0 {
            Some((first - last) / first)
        } else {
            None
        }
    }

    /// Save the solution as pretty-printed JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Export the best-cost history as `generation,best_cost` rows
    pub fn export_history_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for (i, &best_cost) in self.history.iter().enumerate() {
            writer.serialize(HistoryRow { generation: i + 1, best_cost })?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution")?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Generations: {}", self.generations)?;
        writeln!(f, "  Population: {}", self.population_size)?;
        if let Some(seed) = self.seed {
            writeln!(f, "  Seed: {}", seed)?;
        }
        if let Some(improvement) = self.improvement() {
            writeln!(f, "  Improvement: {:.2}%", improvement * 100.0)?;
        }
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}
