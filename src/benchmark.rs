//! Benchmarking and experimentation module.
//!
//! Runs the solver over several seeds, collects per-run results and
//! best-cost histories, and summarizes them per instance.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::config::SolverConfig;
use crate::error::Result;
use crate::genetic::Solver;
use crate::instance::{Graph, TspInstance};

/// Result of a single seeded run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Instance name
    pub instance: String,
    /// Number of vertices toured
    pub dimension: usize,
    /// Seed of the run
    pub seed: u64,
    /// Best cost of the initial random population
    pub initial_best_cost: f64,
    /// Best cost after training
    pub best_cost: f64,
    /// Generations evolved
    pub generations: usize,
    /// Population size after the last generation
    pub final_population: usize,
    /// Wall time in seconds
    pub time: f64,
}

/// Aggregated statistics for an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    pub instance: String,
    pub num_runs: usize,
    pub mean_cost: f64,
    pub std_cost: f64,
    pub best_cost: f64,
    pub worst_cost: f64,
    pub mean_improvement: f64,
    pub mean_time: f64,
    pub total_time: f64,
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    instance: &'a str,
    seed: u64,
    generation: usize,
    best_cost: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded runs per instance
    pub num_runs: usize,
    /// Generations per run
    pub generations: usize,
    /// Seed of the first run; run `k` uses `first_seed + k`
    pub first_seed: u64,
    /// Run the seeds in parallel
    pub parallel: bool,
    /// Solver settings shared by every run (its seed is overridden)
    pub solver: SolverConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            generations: 500,
            first_seed: 0,
            parallel: true,
            solver: SolverConfig::default(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
    histories: Vec<(String, u64, Vec<f64>)>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            histories: Vec::new(),
        }
    }

    /// Run one seeded solver on `graph`
    fn run_single<G: Graph>(
        name: &str,
        graph: &G,
        solver_config: &SolverConfig,
        seed: u64,
        generations: usize,
    ) -> Result<(RunResult, Vec<f64>)> {
        let config = SolverConfig {
            seed: Some(seed),
            ..solver_config.clone()
        };

        let start = Instant::now();
        let mut solver = Solver::new(graph, &config)?;
        let (initial_best_cost, _) = solver.best_tour();
        solver.train(generations)?;
        let solution = solver.solution();

        let result = RunResult {
            instance: name.to_string(),
            dimension: solver.population().n(),
            seed,
            initial_best_cost,
            best_cost: solution.cost,
            generations: solution.generations,
            final_population: solution.population_size,
            time: start.elapsed().as_secs_f64(),
        };

        Ok((result, solution.history))
    }

    /// Run every configured seed on an instance
    pub fn run_instance<G: Graph>(&mut self, name: &str, graph: &G) -> Result<()> {
        log::info!("Running benchmark on instance: {}", name);

        let seeds: Vec<u64> = (0..self.config.num_runs as u64)
            .map(|k| self.config.first_seed + k)
            .collect();
        let solver_config = &self.config.solver;
        let generations = self.config.generations;

        let runs: Vec<(RunResult, Vec<f64>)> = if self.config.parallel {
            seeds
                .par_iter()
                .map(|&seed| Self::run_single(name, graph, solver_config, seed, generations))
                .collect::<Result<_>>()?
        } else {
            seeds
                .iter()
                .map(|&seed| Self::run_single(name, graph, solver_config, seed, generations))
                .collect::<Result<_>>()?
        };

        for (result, history) in runs {
            log::debug!(
                "{} seed {}: {:.3} -> {:.3} in {:.3}s",
                result.instance,
                result.seed,
                result.initial_best_cost,
                result.best_cost,
                result.time
            );
            self.histories.push((result.instance.clone(), result.seed, history));
            self.results.push(result);
        }

        Ok(())
    }

    /// Run every configured seed on each instance
    pub fn run_on_instances(&mut self, instances: &[TspInstance]) -> Result<()> {
        for instance in instances {
            self.run_instance(&instance.name, instance)?;
        }
        Ok(())
    }

    /// Compute statistics for each instance
    pub fn compute_statistics(&self) -> Vec<RunStatistics> {
        let mut by_instance: BTreeMap<&str, Vec<&RunResult>> = BTreeMap::new();
        for result in &self.results {
            by_instance.entry(result.instance.as_str()).or_default().push(result);
        }

        by_instance
            .into_iter()
            .map(|(instance, runs)| {
                let costs: Vec<f64> = runs.iter().map(|r| r.best_cost).collect();
                let times: Vec<f64> = runs.iter().map(|r| r.time).collect();
                let improvements: Vec<f64> = runs
                    .iter()
                    .filter(|r| r.initial_best_cost > 0.0)
                    .map(|r| (r.initial_best_cost - r.best_cost) / r.initial_best_cost)
                    .collect();

                let std_cost = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };
                let mean_improvement = if improvements.is_empty() {
                    0.0
                } else {
                    improvements.iter().mean()
                };

                RunStatistics {
                    instance: instance.to_string(),
                    num_runs: runs.len(),
                    mean_cost: costs.iter().mean(),
                    std_cost,
                    best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                    worst_cost: costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                    mean_improvement,
                    mean_time: times.iter().mean(),
                    total_time: times.iter().sum(),
                }
            })
            .collect()
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export every run's best-cost history, one row per generation
    pub fn export_history_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for (instance, seed, history) in &self.histories {
            for (i, &best_cost) in history.iter().enumerate() {
                writer.serialize(HistoryRow {
                    instance,
                    seed: *seed,
                    generation: i + 1,
                    best_cost,
                })?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("        GA-TSP Benchmark Report\n");
        report.push_str("========================================\n\n");
        report.push_str(&format!(
            "Generated: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        report.push_str(&format!(
            "Runs per instance: {}  Generations: {}  Population: {}\n\n",
            self.config.num_runs, self.config.generations, self.config.solver.population_size
        ));

        report.push_str(&format!(
            "{:<20} {:>6} {:>12} {:>10} {:>12} {:>12} {:>10} {:>10}\n",
            "Instance", "Runs", "Mean Cost", "Std", "Best Cost", "Worst Cost", "Improv%", "Avg Time"
        ));
        report.push_str("-".repeat(98).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<20} {:>6} {:>12.2} {:>10.2} {:>12.2} {:>12.2} {:>9.2}% {:>10.4}\n",
                stat.instance,
                stat.num_runs,
                stat.mean_cost,
                stat.std_cost,
                stat.best_cost,
                stat.worst_cost,
                stat.mean_improvement * 100.0,
                stat.mean_time
            ));
        }

        report.push_str("-".repeat(98).as_str());
        report.push('\n');

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    /// Best-cost histories as `(instance, seed, history)`
    pub fn histories(&self) -> &[(String, u64, Vec<f64>)] {
        &self.histories
    }
}

/// Load every `.tsp` instance of a directory, smallest first
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<TspInstance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "tsp").unwrap_or(false) {
            match TspInstance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => log::warn!("Skipping {:?}: {}", path, e),
            }
        }
    }

    instances.sort_by_key(|i| i.dimension);

    Ok(instances)
}
