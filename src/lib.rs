//! GA-TSP Solver Library
//!
//! A genetic algorithm solver for the Traveling Salesman Problem.
//!
//! # Features
//!
//! - Seeded, reproducible evolution driven by a single random stream
//! - Ordered crossover and swap mutation that always keep tours valid permutations
//! - Pluggable fitness transforms and survivor selection strategies
//! - Elitism: the best tour of a generation is never lost
//! - TSP-LIB instance parsing, benchmarking over seeds, CSV/JSON export
//!
//! # Example
//!
//! ```no_run
//! use ga_tsp_solver::config::SolverConfig;
//! use ga_tsp_solver::genetic::Solver;
//! use ga_tsp_solver::instance::TspInstance;
//!
//! let instance = TspInstance::from_file("instance.tsp").unwrap();
//! let config = SolverConfig { seed: Some(42), ..Default::default() };
//!
//! let mut solver = Solver::new(&instance, &config).unwrap();
//! solver.train(500).unwrap();
//!
//! let (cost, tour) = solver.best_tour();
//! println!("Best cost: {:.2} via {:?}", cost, tour);
//! ```

pub mod error;
pub mod instance;
pub mod config;
pub mod solution;
pub mod genetic;
pub mod benchmark;

pub use config::{PopulationCap, SolverConfig};
pub use error::{InstanceError, SolverError};
pub use genetic::Solver;
pub use instance::{Graph, TspInstance};
pub use solution::Solution;
