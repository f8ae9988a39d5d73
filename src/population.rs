use crate::random::RandomSource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    Minimize,
    Maximize,
}

impl Objective {
    // strictly better
    pub fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Objective::Minimize => candidate < incumbent,
            Objective::Maximize => candidate > incumbent,
        }
    }

    pub fn rank(&self, a: f64, b: f64) -> Ordering {
        match self {
            Objective::Minimize => a.total_cmp(&b),
            Objective::Maximize => b.total_cmp(&a),
        }
    }
}

/// A fixed-size, ordered set of individuals with one fitness value each.
/// `fitness[i]` always belongs to `individuals[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Population<T> {
    individuals: Vec<T>,
    fitness: Vec<f64>,
}

impl<T> Population<T> {
    pub fn new(individuals: Vec<T>) -> Self {
        let fitness = vec![0.0; individuals.len()];
        Self {
            individuals,
            fitness,
        }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[T] {
        &self.individuals
    }

    pub fn individuals_mut(&mut self) -> &mut [T] {
        &mut self.individuals
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Swaps in the next generation. Fitness keeps its previous values until
    /// the next evaluation.
    ///
    /// # Panics
    /// Panics if `next` does not have exactly `len()` individuals.
    pub fn replace(&mut self, next: Vec<T>) {
        assert_eq!(
            next.len(),
            self.individuals.len(),
            "population size is fixed"
        );
        self.individuals = next;
    }

    pub fn evaluate<F>(&mut self, fitness: F)
    where
        F: Fn(&T) -> f64,
    {
        for (individual, value) in self.individuals.iter().zip(self.fitness.iter_mut()) {
            *value = fitness(individual);
        }
    }

    pub fn evaluate_parallel<F>(&mut self, fitness: F)
    where
        T: Sync,
        F: Fn(&T) -> f64 + Sync,
    {
        self.individuals
            .par_iter()
            .zip(self.fitness.par_iter_mut())
            .for_each(|(individual, value)| *value = fitness(individual));
    }

    // stable, best first
    pub fn sort(&mut self, objective: Objective) {
        let mut pairs: Vec<(T, f64)> = self
            .individuals
            .drain(..)
            .zip(self.fitness.drain(..))
            .collect();

        pairs.sort_by(|a, b| objective.rank(a.1, b.1));

        let (individuals, fitness) = pairs.into_iter().unzip();
        self.individuals = individuals;
        self.fitness = fitness;
    }

    pub fn best_index(&self, objective: Objective) -> Option<usize> {
        self.tournament_pick(0..self.len(), objective)
    }

    // ties go to the earliest sample
    pub fn tournament_pick<I>(&self, samples: I, objective: Objective) -> Option<usize>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut winner: Option<usize> = None;

        for index in samples {
            match winner {
                Some(best) if !objective.improves(self.fitness[index], self.fitness[best]) => {}
                _ => winner = Some(index),
            }
        }

        winner
    }

    /// Samples `size` indices uniformly with replacement and returns the best one.
    /// A zero-sized tournament falls back to index 0.
    ///
    /// # Panics
    /// Panics if the population is empty.
    pub fn tournament(&self, rng: &mut RandomSource, size: usize, objective: Objective) -> usize {
        let samples: Vec<usize> = (0..size).map(|_| rng.index(self.len())).collect();

        self.tournament_pick(samples, objective).unwrap_or(0)
    }
}
