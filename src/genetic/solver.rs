//! The evolutionary loop.
//!
//! Each generation ranks the population by fitness, keeps the survivors chosen
//! by the selection strategy (always including the elite), breeds crossover
//! offspring and mutates every survivor except the elite.

use std::cmp::Reverse;
use std::time::Instant;

use ordered_float::OrderedFloat;
use rand::prelude::*;

use crate::config::{PopulationCap, SolverConfig};
use crate::error::{Result, SolverError};
use crate::genetic::fitness::FitnessFunction;
use crate::genetic::operators;
use crate::genetic::population::Population;
use crate::genetic::selection::SelectionStrategy;
use crate::instance::Graph;
use crate::solution::Solution;

/// Progress snapshot handed to training hooks after every generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    /// 1-based generation number
    pub generation: usize,
    /// Lowest cost in the population after the generation
    pub best_cost: f64,
    /// Number of individuals after the generation
    pub population_size: usize,
}

/// Genetic algorithm TSP solver
pub struct Solver<G: Graph> {
    population: Population<G>,
    crossover_rate: f64,
    fitness: Box<dyn FitnessFunction>,
    selection: Box<dyn SelectionStrategy>,
    cut_frac: f64,
    percentile: f64,
    max_pop: Option<usize>,
    collect_history: bool,
    best_history: Vec<f64>,
    generation: usize,
    seed: Option<u64>,
    training_time: f64,
}

/// Index of the highest fitness; ties go to the lower cost, then the lower index
fn elite_index(fitness: &[f64], costs: &[f64]) -> usize {
    (0..fitness.len())
        .min_by_key(|&i| (Reverse(OrderedFloat(fitness[i])), OrderedFloat(costs[i])))
        .unwrap_or(0)
}

impl<G: Graph> Solver<G> {
    /// Build a solver and its initial population
    pub fn new(graph: G, config: &SolverConfig) -> Result<Self> {
        let population = Population::new(graph, config)?;

        Ok(Solver {
            population,
            crossover_rate: config.crossover_rate,
            fitness: config.fitness.build(),
            selection: config.selection.build(),
            cut_frac: config.cut_frac,
            percentile: config.percentile,
            max_pop: config.max_pop(),
            collect_history: true,
            best_history: Vec::new(),
            generation: 0,
            seed: config.seed,
            training_time: 0.0,
        })
    }

    /// Replace the fitness transform
    pub fn with_fitness<F: FitnessFunction + 'static>(mut self, fitness: F) -> Self {
        self.fitness = Box::new(fitness);
        self
    }

    /// Replace the selection strategy
    pub fn with_selection<S: SelectionStrategy + 'static>(mut self, selection: S) -> Self {
        self.selection = Box::new(selection);
        self
    }

    /// Whether `train` records the best cost of every generation
    pub fn with_history(mut self, collect_history: bool) -> Self {
        self.collect_history = collect_history;
        self
    }

    /// Change the population ceiling; `Initial` refers to the configured population size.
    ///
    /// A cap below the current generation size is rejected.
    pub fn set_max_pop(&mut self, cap: PopulationCap) -> Result<()> {
        let max_pop = match cap {
            PopulationCap::Initial => Some(self.population.pop_size()),
            PopulationCap::Fixed(cap) => Some(cap),
            PopulationCap::Unbounded => None,
        };
        if let Some(limit) = max_pop {
            if limit < self.population.gen_size() {
                return Err(SolverError::invalid(format!(
                    "population cap {} is below the current generation size {}",
                    limit,
                    self.population.gen_size()
                )));
            }
        }
        self.max_pop = max_pop;
        Ok(())
    }

    /// Redraw the population and forget the training history
    pub fn reset(&mut self) {
        self.population.reset();
        self.best_history.clear();
        self.generation = 0;
        self.training_time = 0.0;
    }

    /// Keep the survivors picked by the selection strategy and return the
    /// elite's slot among them
    fn select_survivors(&mut self) -> Result<usize> {
        let gen_size = self.population.gen_size();
        let fitness = self.fitness.evaluate(&self.population.costs, self.population.n());
        if fitness.len() != gen_size {
            return Err(SolverError::FitnessContractViolation {
                expected: gen_size,
                got: fitness.len(),
            });
        }
        let elite = elite_index(&fitness, &self.population.costs);

        let selected = self
            .selection
            .select(&fitness, gen_size, self.cut_frac, self.percentile);

        if selected.is_empty() {
            return Err(SolverError::selection("selection returned no individuals"));
        }
        if let Some(&i) = selected.iter().find(|&&i| i >= gen_size) {
            return Err(SolverError::selection(format!(
                "selection returned index {} for a generation of {}",
                i, gen_size
            )));
        }

        let mut keep = vec![false; gen_size];
        let mut survivors: Vec<usize> = selected
            .into_iter()
            .filter(|&i| !std::mem::replace(&mut keep[i], true))
            .collect();
        if !keep[elite] {
            log::warn!("Selection dropped the elite (index {}), keeping it anyway", elite);
            survivors.push(elite);
        }
        let elite_slot = survivors.iter().position(|&i| i == elite).unwrap_or(0);

        let mut old_individuals = std::mem::take(&mut self.population.individuals);
        self.population.individuals = survivors
            .iter()
            .map(|&i| std::mem::take(&mut old_individuals[i]))
            .collect();
        self.population.costs = survivors.iter().map(|&i| self.population.costs[i]).collect();

        Ok(elite_slot)
    }

    /// Run one generation
    pub fn evolve(&mut self) -> Result<()> {
        let elite = self.select_survivors()?;

        // Survivors keep their slots and offspring go to the tail, so `elite`
        // stays the elite's slot for the whole pass.
        let parents = self.population.individuals.clone();
        let retained = parents.len();
        let point_rate = self.population.crossover_point_rate;
        let mutation_rate = self.population.mutation_rate;
        let Population { rng, individuals, .. } = &mut self.population;

        for i in 0..retained {
            let partner = rng.gen_range(0..retained);

            if rng.gen::<f64>() < self.crossover_rate {
                let child = operators::crossover(rng, &parents[i], &parents[partner], point_rate);
                let has_room = self.max_pop.map_or(true, |cap| individuals.len() < cap);
                if has_room {
                    individuals.push(child);
                } else if i != elite {
                    individuals[i] = child;
                }
            }

            if i != elite {
                operators::mutate(rng, &mut individuals[i], mutation_rate);
            }
        }

        self.population.evalpop();
        self.generation += 1;

        Ok(())
    }

    /// Run `iters` generations
    pub fn train(&mut self, iters: usize) -> Result<()> {
        self.train_with(iters, |_| {})
    }

    /// Run `iters` generations, calling `on_generation` after each one
    pub fn train_with<F>(&mut self, iters: usize, mut on_generation: F) -> Result<()>
    where
        F: FnMut(&GenerationReport),
    {
        let start = Instant::now();
        log::info!(
            "Training for {} generations (population {}, {} vertices)",
            iters,
            self.population.gen_size(),
            self.population.n()
        );

        for _ in 0..iters {
            self.evolve()?;

            let (best_cost, _) = self.best_tour();
            if self.collect_history {
                self.best_history.push(best_cost);
            }

            let report = GenerationReport {
                generation: self.generation,
                best_cost,
                population_size: self.population.gen_size(),
            };
            log::debug!(
                "Gen: {}  Best cost: {:.3}  Population: {}",
                report.generation,
                report.best_cost,
                report.population_size
            );
            on_generation(&report);
        }

        self.training_time += start.elapsed().as_secs_f64();
        log::info!(
            "Finished after {} generations, best cost {:.3}",
            self.generation,
            self.best_tour().0
        );

        Ok(())
    }

    /// Lowest cost in the current population and its tour
    pub fn best_tour(&self) -> (f64, &[usize]) {
        let costs = &self.population.costs;
        let best = (0..costs.len())
            .min_by_key(|&i| OrderedFloat(costs[i]))
            .unwrap_or(0);
        (costs[best], &self.population.individuals[best])
    }

    /// Report of the current best tour and the training history
    pub fn solution(&self) -> Solution {
        let (cost, tour) = self.best_tour();
        Solution {
            tour: tour.to_vec(),
            cost,
            generations: self.generation,
            population_size: self.population.gen_size(),
            history: self.best_history.clone(),
            seed: self.seed,
            computation_time: self.training_time,
        }
    }

    /// Best cost after each trained generation
    pub fn history(&self) -> &[f64] {
        &self.best_history
    }

    /// Number of generations evolved so far
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &Population<G> {
        &self.population
    }

    pub fn max_pop(&self) -> Option<usize> {
        self.max_pop
    }

    pub fn gen_size(&self) -> usize {
        self.population.gen_size()
    }

    pub fn crossover_rate(&self) -> f64 {
        self.crossover_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetic::operators::is_permutation_of;
    use crate::instance::TspInstance;

    fn config(seed: u64, population_size: usize) -> SolverConfig {
        SolverConfig {
            seed: Some(seed),
            population_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_line_scenario() {
        let instance = TspInstance::line(5).unwrap();
        let mut solver = Solver::new(&instance, &config(7, 20)).unwrap();
        let (initial_best, _) = solver.best_tour();

        solver.train(50).unwrap();

        let (final_best, tour) = solver.best_tour();
        assert!(final_best <= initial_best);
        assert!(is_permutation_of(tour, &[0, 1, 2, 3, 4]));
        assert_eq!(solver.history().len(), 50);
        assert_eq!(solver.generation(), 50);
    }

    #[test]
    fn test_history_is_monotone() {
        let instance = TspInstance::random_euclidean(15, 3, 100.0).unwrap();
        let config = SolverConfig {
            crossover_rate: 0.5,
            mutation_rate: 0.1,
            ..config(11, 40)
        };
        let mut solver = Solver::new(&instance, &config).unwrap();
        solver.train(60).unwrap();

        let history = solver.history();
        assert!(history.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_elite_survives_unchanged() {
        let instance = TspInstance::random_euclidean(12, 5, 50.0).unwrap();
        let config = SolverConfig {
            crossover_rate: 1.0,
            mutation_rate: 1.0,
            max_population: PopulationCap::Fixed(30),
            ..config(3, 30)
        };
        let mut solver = Solver::new(&instance, &config).unwrap();

        for _ in 0..10 {
            let (cost, tour) = solver.best_tour();
            let elite = tour.to_vec();
            solver.evolve().unwrap();
            assert!(solver.population().individuals().contains(&elite));
            assert!(solver.best_tour().0 <= cost);
        }
    }

    #[test]
    fn test_elite_forced_back_by_solver() {
        let instance = TspInstance::random_euclidean(8, 1, 10.0).unwrap();
        // A strategy that always drops index 0 and keeps only the last individual.
        let last_only = |_: &[f64], gen_size: usize, _: f64, _: f64| vec![gen_size - 1];
        let mut solver = Solver::new(&instance, &config(2, 10))
            .unwrap()
            .with_selection(last_only);

        let (best_cost, _) = solver.best_tour();
        solver.evolve().unwrap();

        assert!(solver.best_tour().0 <= best_cost);
        assert!(solver.gen_size() <= 4);
    }

    #[test]
    fn test_selection_contract_violations() {
        let instance = TspInstance::line(5).unwrap();

        let empty = |_: &[f64], _: usize, _: f64, _: f64| Vec::<usize>::new();
        let mut solver = Solver::new(&instance, &config(1, 10)).unwrap().with_selection(empty);
        assert!(matches!(
            solver.evolve(),
            Err(SolverError::SelectionContractViolation { .. })
        ));

        let out_of_range = |_: &[f64], gen_size: usize, _: f64, _: f64| vec![0, gen_size];
        let mut solver = Solver::new(&instance, &config(1, 10))
            .unwrap()
            .with_selection(out_of_range);
        assert!(matches!(
            solver.train(3),
            Err(SolverError::SelectionContractViolation { .. })
        ));
    }

    #[test]
    fn test_fitness_length_mismatch() {
        let instance = TspInstance::line(5).unwrap();
        let truncated = |costs: &[f64], _: usize| costs[..1].to_vec();
        let mut solver = Solver::new(&instance, &config(1, 10)).unwrap().with_fitness(truncated);
        assert!(matches!(
            solver.evolve(),
            Err(SolverError::FitnessContractViolation { expected: 10, got: 1 })
        ));
        assert_eq!(solver.gen_size(), 10);
    }

    #[test]
    fn test_set_max_pop() {
        let instance = TspInstance::line(6).unwrap();
        let config = SolverConfig {
            crossover_rate: 1.0,
            cut_frac: 0.0,
            ..config(4, 20)
        };
        let mut solver = Solver::new(&instance, &config).unwrap();

        assert!(matches!(
            solver.set_max_pop(PopulationCap::Fixed(5)),
            Err(SolverError::InvalidConfiguration(_))
        ));
        assert_eq!(solver.max_pop(), Some(20));
        solver.evolve().unwrap();
        assert!(solver.gen_size() <= 20);

        solver.set_max_pop(PopulationCap::Unbounded).unwrap();
        assert_eq!(solver.max_pop(), None);
        solver.evolve().unwrap();
        assert_eq!(solver.gen_size(), 40);

        assert!(solver.set_max_pop(PopulationCap::Initial).is_err());
        assert_eq!(solver.max_pop(), None);

        solver.set_max_pop(PopulationCap::Fixed(50)).unwrap();
        for _ in 0..5 {
            solver.evolve().unwrap();
            assert!(solver.gen_size() <= 50);
        }
    }

    #[test]
    fn test_population_growth_bound() {
        let instance = TspInstance::random_euclidean(10, 9, 10.0).unwrap();
        let config = SolverConfig {
            crossover_rate: 1.0,
            cut_frac: 0.0,
            ..config(4, 25)
        };
        let mut solver = Solver::new(&instance, &config).unwrap();

        for _ in 0..20 {
            solver.evolve().unwrap();
            assert!(solver.gen_size() <= 25);
        }
    }

    #[test]
    fn test_unbounded_growth() {
        let instance = TspInstance::line(6).unwrap();
        let config = SolverConfig {
            crossover_rate: 1.0,
            cut_frac: 0.0,
            max_population: PopulationCap::Unbounded,
            ..config(4, 10)
        };
        let mut solver = Solver::new(&instance, &config).unwrap();
        assert_eq!(solver.max_pop(), None);

        solver.evolve().unwrap();
        assert_eq!(solver.gen_size(), 20);
        for tour in solver.population().individuals() {
            assert!(is_permutation_of(tour, &[0, 1, 2, 3, 4, 5]));
        }
    }

    #[test]
    fn test_reproducible_training() {
        let instance = TspInstance::random_euclidean(10, 2, 10.0).unwrap();
        let mut a = Solver::new(&instance, &config(21, 30)).unwrap();
        let mut b = Solver::new(&instance, &config(21, 30)).unwrap();
        a.train(15).unwrap();
        b.train(15).unwrap();

        assert_eq!(a.history(), b.history());
        assert_eq!(a.best_tour().1, b.best_tour().1);
    }

    #[test]
    fn test_training_hook_and_solution() {
        let instance = TspInstance::line(6).unwrap();
        let mut solver = Solver::new(&instance, &config(8, 12)).unwrap();
        let mut seen = Vec::new();
        solver.train_with(5, |report| seen.push(report.generation)).unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);

        let solution = solver.solution();
        assert_eq!(solution.generations, 5);
        assert_eq!(solution.history.len(), 5);
        assert_eq!(solution.seed, Some(8));
        assert!(solution.is_permutation_of(&[0, 1, 2, 3, 4, 5]));

        solver.reset();
        assert_eq!(solver.generation(), 0);
        assert!(solver.history().is_empty());
        assert_eq!(solver.gen_size(), 12);
    }

    #[test]
    fn test_history_can_be_disabled() {
        let instance = TspInstance::line(5).unwrap();
        let mut solver = Solver::new(&instance, &config(8, 10)).unwrap().with_history(false);
        solver.train(4).unwrap();
        assert!(solver.history().is_empty());
        assert_eq!(solver.generation(), 4);
    }

    #[test]
    fn test_zero_generations() {
        let instance = TspInstance::line(5).unwrap();
        let mut solver = Solver::new(&instance, &config(8, 10)).unwrap();
        let before = solver.best_tour().0;
        solver.train(0).unwrap();
        assert_eq!(solver.best_tour().0, before);
        assert!(solver.history().is_empty());
    }
}
