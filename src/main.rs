//! GA-TSP Solver - Command Line Interface
//!
//! Evolves tours for a Traveling Salesman instance with a genetic algorithm.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ga_tsp_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use ga_tsp_solver::config::{PopulationCap, SolverConfig};
use ga_tsp_solver::error::SolverError;
use ga_tsp_solver::genetic::{SelectionType, Solver};
use ga_tsp_solver::instance::TspInstance;
use indicatif::{ProgressBar, ProgressStyle};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ga-tsp-solver")]
#[command(version = "1.0")]
#[command(about = "A genetic algorithm solver for the Traveling Salesman Problem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a tour for one instance
    Solve {
        #[command(flatten)]
        graph: GraphArgs,

        #[command(flatten)]
        ga: GaArgs,

        /// Number of generations
        #[arg(short, long, default_value = "500")]
        generations: usize,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output solution to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export the best-cost history to a CSV file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Print every generation's best cost instead of a progress bar
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run several seeds per instance and summarize
    Benchmark {
        /// Directory of `.tsp` instances (instead of a single graph)
        #[arg(short, long, conflicts_with_all = ["instance", "random", "line"])]
        dir: Option<PathBuf>,

        #[command(flatten)]
        graph: GraphArgs,

        #[command(flatten)]
        ga: GaArgs,

        /// Number of seeded runs
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Generations per run
        #[arg(short, long, default_value = "500")]
        generations: usize,

        /// Seed of the first run
        #[arg(long, default_value = "0")]
        first_seed: u64,

        /// Run seeds one after another
        #[arg(long)]
        sequential: bool,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Print statistics about an instance
    Analyze {
        #[command(flatten)]
        graph: GraphArgs,
    },
}

/// Where the graph comes from
#[derive(Args)]
struct GraphArgs {
    /// Path to a TSP-LIB instance file
    #[arg(short, long, conflicts_with_all = ["random", "line"])]
    instance: Option<PathBuf>,

    /// Generate this many random Euclidean points
    #[arg(long, conflicts_with = "line")]
    random: Option<usize>,

    /// Generate this many points on a line (dist = |i - j|)
    #[arg(long)]
    line: Option<usize>,

    /// Seed for the random instance generator
    #[arg(long, default_value = "0")]
    graph_seed: u64,
}

/// Genetic algorithm parameters; unset values come from `--config` or the defaults
#[derive(Args)]
struct GaArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial population size
    #[arg(short, long)]
    population: Option<usize>,

    /// Per-position swap probability
    #[arg(long)]
    mutation_rate: Option<f64>,

    /// Probability that an individual spawns a crossover offspring
    #[arg(long)]
    crossover_rate: Option<f64>,

    /// Per-position crossover swap point probability
    #[arg(long)]
    crossover_point_rate: Option<f64>,

    /// Survivor selection strategy
    #[arg(long, value_enum)]
    selection: Option<Selection>,

    /// Selection cut fraction
    #[arg(long)]
    cut_frac: Option<f64>,

    /// Selection percentile (0-100)
    #[arg(long)]
    percentile: Option<f64>,

    /// Let the population grow without a cap
    #[arg(long)]
    unbounded: bool,

    /// Count the edge back to the first vertex
    #[arg(long)]
    closed: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Selection {
    /// Min-max scaled threshold
    Minmax,
    /// Percentile truncation
    Percentile,
}

impl GraphArgs {
    fn load(&self) -> Result<TspInstance, SolverError> {
        let graph = match (&self.instance, self.random, self.line) {
            (Some(path), _, _) => {
                println!("Loading instance from {:?}...", path);
                TspInstance::from_file(path)?
            }
            (None, Some(n), _) => TspInstance::random_euclidean(n, self.graph_seed, 1000.0)?,
            (None, None, Some(n)) => TspInstance::line(n)?,
            (None, None, None) => {
                return Err(SolverError::InvalidConfiguration(
                    "one of --instance, --random or --line is required".to_string(),
                ))
            }
        };
        Ok(graph)
    }
}

impl GaArgs {
    fn to_config(&self, seed: Option<u64>) -> Result<SolverConfig, SolverError> {
        let mut config = match &self.config {
            Some(path) => SolverConfig::from_json_file(path)?,
            None => SolverConfig::default(),
        };

        if seed.is_some() {
            config.seed = seed;
        }
        if let Some(population) = self.population {
            config.population_size = population;
        }
        if let Some(rate) = self.mutation_rate {
            config.mutation_rate = rate;
        }
        if let Some(rate) = self.crossover_rate {
            config.crossover_rate = rate;
        }
        if let Some(rate) = self.crossover_point_rate {
            config.crossover_point_rate = rate;
        }
        if let Some(selection) = self.selection {
            config.selection = match selection {
                Selection::Minmax => SelectionType::MinMax,
                Selection::Percentile => SelectionType::Percentile,
            };
        }
        if let Some(cut_frac) = self.cut_frac {
            config.cut_frac = cut_frac;
        }
        if let Some(percentile) = self.percentile {
            config.percentile = percentile;
        }
        if self.unbounded {
            config.max_population = PopulationCap::Unbounded;
        }
        if self.closed {
            config.closed_tour = true;
        }

        Ok(config)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve { graph, ga, generations, seed, output, history, verbose } => {
            solve_instance(&graph, &ga, generations, seed, output, history, verbose)
        }

        Commands::Benchmark { dir, graph, ga, runs, generations, first_seed, sequential, output } => {
            run_benchmark(dir, &graph, &ga, runs, generations, first_seed, sequential, &output)
        }

        Commands::Analyze { graph } => {
            analyze_instance(&graph)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn solve_instance(
    graph: &GraphArgs,
    ga: &GaArgs,
    generations: usize,
    seed: Option<u64>,
    output: Option<PathBuf>,
    history: Option<PathBuf>,
    verbose: bool,
) -> Result<(), SolverError> {
    let instance = graph.load()?;
    let config = ga.to_config(seed)?;

    println!(
        "Solving {} ({} vertices) with population {} for {} generations...",
        instance.name, instance.dimension, config.population_size, generations
    );

    let mut solver = Solver::new(&instance, &config)?;
    let (initial_cost, _) = solver.best_tour();

    let progress = if verbose {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(generations as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    solver.train_with(generations, |report| {
        if verbose {
            println!("Gen: {}  Best Cost: {:.3}", report.generation, report.best_cost);
        } else {
            progress.set_message(format!("best {:.3}  pop {}", report.best_cost, report.population_size));
            progress.inc(1);
        }
    })?;
    progress.finish_and_clear();

    let solution = solver.solution();

    println!("\n========== Results ==========");
    println!("Initial best cost: {:.2}", initial_cost);
    print!("{}", solution);

    if let Some(out_path) = output {
        solution.save_json(&out_path)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    if let Some(history_path) = history {
        solution.export_history_csv(&history_path)?;
        println!("History saved to {:?}", history_path);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_benchmark(
    dir: Option<PathBuf>,
    graph: &GraphArgs,
    ga: &GaArgs,
    runs: usize,
    generations: usize,
    first_seed: u64,
    sequential: bool,
    output: &PathBuf,
) -> Result<(), SolverError> {
    let instances = match dir {
        Some(dir) => {
            println!("Loading instances from {:?}...", dir);
            load_instances_from_dir(&dir)?
        }
        None => vec![graph.load()?],
    };

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return Ok(());
    }

    std::fs::create_dir_all(output)?;

    let config = BenchmarkConfig {
        num_runs: runs,
        generations,
        first_seed,
        parallel: !sequential,
        solver: ga.to_config(None)?,
    };

    let mut benchmark = Benchmark::new(config);

    for (i, instance) in instances.iter().enumerate() {
        println!("\n[{}/{}] Processing {} (n={})...",
            i + 1, instances.len(), instance.name, instance.dimension);

        benchmark.run_instance(&instance.name, instance)?;
    }

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let history_path = output.join("history.csv");
    benchmark.export_history_csv(&history_path)?;
    println!("Histories exported to {:?}", history_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}

fn analyze_instance(graph: &GraphArgs) -> Result<(), SolverError> {
    let instance = graph.load()?;
    println!("{}", instance.statistics());
    Ok(())
}
