//! Population of candidate tours.
//!
//! Holds one generation of permutations over the configured vertex set, their
//! costs, and the seeded random stream every genetic operator draws from.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::SolverConfig;
use crate::error::Result;
use crate::genetic::operators;
use crate::instance::Graph;

/// Cost of visiting `tour` in order.
///
/// The return edge from the last vertex to the first is only counted when
/// `closed` is set.
pub fn tour_cost<G: Graph + ?Sized>(graph: &G, tour: &[usize], closed: bool) -> f64 {
    let path: f64 = tour.windows(2).map(|w| graph.get_dist(w[0], w[1])).sum();
    match (closed, tour.first(), tour.last()) {
        (true, Some(&first), Some(&last)) if tour.len() > 1 => path + graph.get_dist(last, first),
        _ => path,
    }
}

/// One generation of tours
pub struct Population<G: Graph> {
    pub(crate) graph: G,
    pub(crate) vertices: Vec<usize>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) pop_size: usize,
    pub(crate) mutation_rate: f64,
    pub(crate) crossover_point_rate: f64,
    pub(crate) closed_tour: bool,
    pub(crate) individuals: Vec<Vec<usize>>,
    pub(crate) costs: Vec<f64>,
}

impl<G: Graph> Population<G> {
    /// Validate `config` against `graph` and draw the initial population
    pub fn new(graph: G, config: &SolverConfig) -> Result<Self> {
        config.validate(graph.n())?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut population = Population {
            vertices: config.vertex_set(graph.n()),
            graph,
            rng,
            pop_size: config.population_size,
            mutation_rate: config.mutation_rate,
            crossover_point_rate: config.crossover_point_rate,
            closed_tour: config.closed_tour,
            individuals: Vec::new(),
            costs: Vec::new(),
        };
        population.reset();

        Ok(population)
    }

    /// Replace the population with `pop_size` fresh random permutations
    pub fn reset(&mut self) {
        let vertices = &self.vertices;
        let rng = &mut self.rng;
        self.individuals = (0..self.pop_size)
            .map(|_| operators::random_permutation(rng, vertices))
            .collect();
        self.evalpop();

        log::debug!(
            "Initialized population: {} tours over {} vertices",
            self.individuals.len(),
            self.vertices.len()
        );
    }

    /// Recompute the cost of every individual
    pub fn evalpop(&mut self) {
        let graph = &self.graph;
        let closed = self.closed_tour;
        self.costs = self
            .individuals
            .par_iter()
            .map(|tour| tour_cost(graph, tour, closed))
            .collect();
    }

    /// Cost of a single tour on this population's graph
    pub fn cost_of(&self, tour: &[usize]) -> f64 {
        tour_cost(&self.graph, tour, self.closed_tour)
    }

    /// Mutate `tour` in place; `rate` defaults to the configured mutation rate
    pub fn mutate(&mut self, tour: &mut [usize], rate: Option<f64>) {
        let rate = rate.unwrap_or(self.mutation_rate);
        operators::mutate(&mut self.rng, tour, rate);
    }

    /// Mutate a copy of `tour`, leaving the original untouched
    pub fn mutated_copy(&mut self, tour: &[usize], rate: Option<f64>) -> Vec<usize> {
        let mut copy = tour.to_vec();
        self.mutate(&mut copy, rate);
        copy
    }

    /// Mutate the individual stored at `index` and refresh its cost
    pub fn mutate_member(&mut self, index: usize, rate: Option<f64>) {
        let rate = rate.unwrap_or(self.mutation_rate);
        operators::mutate(&mut self.rng, &mut self.individuals[index], rate);
        self.costs[index] = tour_cost(&self.graph, &self.individuals[index], self.closed_tour);
    }

    /// Ordered crossover of two tours; `point_rate` defaults to the configured rate
    pub fn crossover(&mut self, parent1: &[usize], parent2: &[usize], point_rate: Option<f64>) -> Vec<usize> {
        let point_rate = point_rate.unwrap_or(self.crossover_point_rate);
        operators::crossover(&mut self.rng, parent1, parent2, point_rate)
    }

    /// Current number of individuals
    pub fn gen_size(&self) -> usize {
        self.individuals.len()
    }

    /// Number of vertices per tour
    pub fn n(&self) -> usize {
        self.vertices.len()
    }

    pub fn individuals(&self) -> &[Vec<usize>] {
        &self.individuals
    }

    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn pop_size(&self) -> usize {
        self.pop_size
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    pub fn crossover_point_rate(&self) -> f64 {
        self.crossover_point_rate
    }
}
