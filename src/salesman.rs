use crate::canvas::{Point, HEIGHT, WIDTH};
use crate::config::SalesmanConfig;
use crate::error::ConfigError;
use crate::genetic_algorithm::Engine;
use crate::population::{Objective, Population};
use crate::random::RandomSource;
use crate::snapshot::{GenerationStats, Snapshot};
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

// A visiting order over all cities, always a permutation of 0..n
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tour {
    path: Vec<usize>,
}

impl Tour {
    pub fn random(num_cities: usize, rng: &mut RandomSource) -> Self {
        let mut path: Vec<usize> = (0..num_cities).collect();
        path.shuffle(rng);
        Self { path }
    }

    pub fn from_path(path: Vec<usize>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn is_permutation(&self) -> bool {
        is_permutation(&self.path)
    }

    // open path, the walk does not return to its start
    pub fn length(&self, cities: &[Point]) -> f64 {
        self.path
            .windows(2)
            .map(|pair| cities[pair[1]].distance(&cities[pair[0]]))
            .sum()
    }
}

pub fn is_permutation(path: &[usize]) -> bool {
    let mut seen = vec![false; path.len()];

    for &city in path {
        if city >= path.len() || seen[city] {
            return false;
        }
        seen[city] = true;
    }

    true
}

/// Order crossover (OX1).
///
/// The child keeps `parent1[start..end]` in place. The remaining positions,
/// walked cyclically from `end`, take the cities of `parent2` that are not yet
/// present, read cyclically from `end` as well.
///
/// # Panics
/// Panics if the parents differ in length or `start > end`.
pub fn order_crossover(
    parent1: &[usize],
    parent2: &[usize],
    start: usize,
    end: usize,
) -> Vec<usize> {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    assert!(start <= end && end <= n, "segment out of range");

    if n == 0 {
        return Vec::new();
    }

    let mut child: Vec<Option<usize>> = vec![None; n];
    let mut present = vec![false; n];

    for i in start..end {
        child[i] = Some(parent1[i]);
        present[parent1[i]] = true;
    }

    // k walks the free positions of the child
    let mut k = end % n;
    for offset in 0..n {
        let city = parent2[(end + offset) % n];
        if present[city] {
            continue;
        }

        child[k] = Some(city);
        present[city] = true;
        k = (k + 1) % n;
    }

    child.into_iter().flatten().collect()
}

// Performs `swaps` random pairwise exchanges on `path`. Exchanges touch two
// distinct positions, never repeat the one right before, and the last one is
// redrawn if it would restore the input. A path of two or more cities always
// changes; a two-city path is simply reversed.
pub fn swap_mutation(path: &mut [usize], swaps: usize, rng: &mut RandomSource) {
    let n = path.len();
    if n < 2 || swaps == 0 {
        return;
    }

    if n == 2 {
        path.swap(0, 1);
        return;
    }

    let original = path.to_vec();
    let mut last: Option<(usize, usize)> = None;

    for step in 0..swaps {
        let final_swap = step + 1 == swaps;

        loop {
            let a = rng.index(n);
            let mut b = rng.index(n - 1);
            if b >= a {
                b += 1;
            }

            let pair = (a.min(b), a.max(b));
            if last == Some(pair) {
                continue;
            }

            path.swap(pair.0, pair.1);
            // at most one pair undoes the earlier swaps, n >= 3 leaves another
            if final_swap && path[..] == original[..] {
                path.swap(pair.0, pair.1);
                continue;
            }

            last = Some(pair);
            break;
        }
    }
}

#[derive(Debug)]
pub struct SalesmanOptimizer {
    config: SalesmanConfig,
    cities: Vec<Point>,
    population: Population<Tour>,
    selected: Vec<Tour>,
    generation: u64,
    rng: RandomSource,
}

impl SalesmanOptimizer {
    pub fn new(config: SalesmanConfig, rng: RandomSource) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut optimizer = Self {
            config,
            cities: Vec::new(),
            population: Population::new(Vec::new()),
            selected: Vec::new(),
            generation: 0,
            rng,
        };
        optimizer.init_population();

        Ok(optimizer)
    }

    // A later `init_population` replaces the given cities with random ones
    pub fn with_cities(
        config: SalesmanConfig,
        cities: Vec<Point>,
        rng: RandomSource,
    ) -> Result<Self, ConfigError> {
        let config = SalesmanConfig {
            num_cities: cities.len(),
            ..config
        };
        config.validate()?;

        let mut optimizer = Self {
            config,
            cities,
            population: Population::new(Vec::new()),
            selected: Vec::new(),
            generation: 0,
            rng,
        };
        optimizer.seed_population();

        Ok(optimizer)
    }

    pub fn cities(&self) -> &[Point] {
        &self.cities
    }

    pub fn population(&self) -> &Population<Tour> {
        &self.population
    }

    pub fn selected_pool(&self) -> &[Tour] {
        &self.selected
    }

    pub fn best(&self) -> Option<(&Tour, f64)> {
        self.population
            .best_index(Objective::Minimize)
            .map(|i| (&self.population.individuals()[i], self.population.fitness()[i]))
    }

    fn generate_cities(&mut self) {
        self.cities = (0..self.config.num_cities)
            .map(|_| {
                let x = self.rng.index(WIDTH as usize) as f64;
                let y = self.rng.index(HEIGHT as usize) as f64;
                Point::new(x, y)
            })
            .collect();
    }

    fn seed_population(&mut self) {
        let tours = (0..self.config.num_solutions)
            .map(|_| Tour::random(self.config.num_cities, &mut self.rng))
            .collect();

        self.population = Population::new(tours);
        self.selected.clear();
        self.generation = 0;
        self.evaluate_fitness_parallel();
    }

    fn breed(&mut self, index: usize) -> Tour {
        let n = self.config.num_cities;
        let parent1 = self.selected[index].path();
        let parent2 = self.selected[index - 1].path();

        let mut start = self.rng.index(n);
        let mut end = self.rng.index(n);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }

        Tour::from_path(order_crossover(parent1, parent2, start, end))
    }
}

impl Engine for SalesmanOptimizer {
    fn init_population(&mut self) {
        self.generate_cities();
        self.seed_population();

        info!(
            cities = self.cities.len(),
            solutions = self.population.len(),
            elites = self.config.num_elites,
            "salesman population initialized"
        );
    }

    fn evaluate_fitness(&mut self) {
        let cities = &self.cities;
        self.population.evaluate(|tour| tour.length(cities));
    }

    fn evaluate_fitness_parallel(&mut self) {
        let cities = &self.cities;
        self.population.evaluate_parallel(|tour| tour.length(cities));
    }

    fn select(&mut self) {
        self.population.sort(Objective::Minimize);

        let elites = self.config.num_elites;
        let size = self.config.tournament_size;

        let mut selected: Vec<Tour> = self.population.individuals()[..elites].to_vec();
        for _ in elites..self.population.len() {
            let winner = self
                .population
                .tournament(&mut self.rng, size, Objective::Minimize);
            selected.push(self.population.individuals()[winner].clone());
        }

        self.selected = selected;
    }

    #[instrument(level = "debug", skip_all, fields(generation = self.generation))]
    fn cross(&mut self) {
        let size = self.population.len();
        if self.selected.len() != size {
            debug!(
                pool = self.selected.len(),
                "selection pool is stale, selecting before crossover"
            );
            self.select();
        }

        let mut next = Vec::with_capacity(size);
        let mut bred = 0usize;

        for i in 0..size {
            // index 0 always survives untouched; other elites breed only sometimes
            let breed = i != 0
                && (i >= self.config.num_elites
                    || self.rng.chance(self.config.elite_cross_probability));

            if breed {
                next.push(self.breed(i));
                bred += 1;
            } else {
                next.push(self.selected[i].clone());
            }
        }

        self.population.replace(next);
        debug!(bred, "order crossover done");
    }

    fn mutate(&mut self) {
        let probability = self.config.mutation_probability;
        let max_swaps = self.config.max_swaps;

        for tour in self.population.individuals_mut() {
            if self.rng.chance(probability) {
                let swaps = 1 + self.rng.index(max_swaps);
                swap_mutation(&mut tour.path, swaps, &mut self.rng);
            }
        }

        self.generation += 1;
    }

    // fitness last so the displayed generation and the next sort see current tours
    fn run_generation(&mut self) {
        self.select();
        self.cross();
        self.mutate();
        self.evaluate_fitness_parallel();
    }

    fn render_snapshot(&self) -> Snapshot {
        let tours = self
            .population
            .individuals()
            .iter()
            .map(|tour| tour.path().iter().map(|&city| self.cities[city]).collect())
            .collect();

        Snapshot {
            generation: self.generation,
            heatmap: None,
            lines: Vec::new(),
            markers: self.cities.clone(),
            points: Vec::new(),
            tours,
            best_fitness: self.best().map(|(_, fitness)| format!("{:.2}", fitness)),
            stats: self.stats(),
        }
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn population_size(&self) -> usize {
        self.population.len()
    }

    fn stats(&self) -> GenerationStats {
        GenerationStats::from_fitness(
            self.generation,
            self.population.fitness(),
            Objective::Minimize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimizer(config: SalesmanConfig, seed: u64) -> SalesmanOptimizer {
        SalesmanOptimizer::new(config, RandomSource::seeded(seed)).unwrap()
    }

    fn all_permutations(optimizer: &SalesmanOptimizer) -> bool {
        optimizer
            .population()
            .individuals()
            .iter()
            .all(Tour::is_permutation)
    }

    #[test]
    fn ox1_worked_example() {
        let p1 = [0, 1, 2, 3, 4, 5, 6, 7];
        let p2 = [7, 6, 5, 4, 3, 2, 1, 0];

        assert_eq!(
            order_crossover(&p1, &p2, 2, 5),
            vec![6, 5, 2, 3, 4, 1, 0, 7]
        );
    }

    #[test]
    fn ox1_empty_segment_copies_second_parent() {
        let p1 = [3, 1, 0, 2, 4];
        let p2 = [4, 0, 2, 1, 3];

        assert_eq!(order_crossover(&p1, &p2, 3, 3), p2.to_vec());
        assert_eq!(order_crossover(&p1, &p2, 0, 0), p2.to_vec());
    }

    #[test]
    fn ox1_full_segment_copies_first_parent() {
        let p1 = [3, 1, 0, 2, 4];
        let p2 = [4, 0, 2, 1, 3];

        assert_eq!(order_crossover(&p1, &p2, 0, 5), p1.to_vec());
    }

    #[test]
    fn ox1_single_city() {
        assert_eq!(order_crossover(&[0], &[0], 0, 0), vec![0]);
    }

    #[test]
    fn open_path_length() {
        let cities = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(3.0, 0.0),
        ];

        assert_eq!(Tour::from_path(vec![0, 1, 2]).length(&cities), 9.0);
        assert_eq!(Tour::from_path(vec![1]).length(&cities[..1]), 0.0);
    }

    #[test]
    fn permutation_check() {
        assert!(is_permutation(&[2, 0, 1]));
        assert!(!is_permutation(&[2, 0, 0]));
        assert!(!is_permutation(&[3, 0, 1]));
        assert!(is_permutation(&[]));
    }

    #[test]
    fn swap_mutation_always_changes_the_path() {
        let mut rng = RandomSource::seeded(12);

        for n in 2..8 {
            for swaps in 1..=3 {
                let original: Vec<usize> = (0..n).collect();
                let mut path = original.clone();
                swap_mutation(&mut path, swaps, &mut rng);

                assert_ne!(path, original, "n = {n}, swaps = {swaps}");
                assert!(is_permutation(&path));
            }
        }
    }

    #[test]
    fn crossover_right_after_reset_selects_first() {
        let mut optimizer = optimizer(SalesmanConfig::new(8, 12, 2, 0.0, 0.0), 17);
        let (best, _) = optimizer.best().unwrap();
        let best = best.clone();

        optimizer.cross();

        assert_eq!(optimizer.selected_pool().len(), 12);
        assert_eq!(optimizer.population().individuals()[0], best);
        assert!(all_permutations(&optimizer));
    }

    #[test]
    fn long_swap_chains_never_restore_the_path() {
        for seed in 0..300 {
            let mut rng = RandomSource::seeded(seed);

            for swaps in [4, 6, 8] {
                let mut path = vec![0, 1, 2];
                swap_mutation(&mut path, swaps, &mut rng);

                assert_ne!(path, vec![0, 1, 2], "seed = {seed}, swaps = {swaps}");
                assert!(is_permutation(&path));
            }
        }
    }

    #[test]
    fn every_small_tour_changes_under_full_mutation() {
        let mut optimizer = optimizer(SalesmanConfig::new(3, 200, 0, 0.0, 1.0), 9);
        let before = optimizer.population().individuals().to_vec();

        optimizer.mutate();

        let unchanged = before
            .iter()
            .zip(optimizer.population().individuals())
            .filter(|(old, new)| old == new)
            .count();
        assert_eq!(unchanged, 0);
    }

    #[test]
    fn construction_validates() {
        let no_cities = SalesmanConfig::new(0, 4, 1, 0.0, 0.0);
        assert_eq!(
            SalesmanOptimizer::new(no_cities, RandomSource::seeded(1)).unwrap_err(),
            ConfigError::NoCities
        );

        let too_many_elites = SalesmanConfig::new(5, 4, 6, 0.0, 0.0);
        assert_eq!(
            SalesmanOptimizer::new(too_many_elites, RandomSource::seeded(1)).unwrap_err(),
            ConfigError::TooManyElites {
                elites: 6,
                solutions: 4
            }
        );
    }

    #[test]
    fn top_solution_survives_unbred() {
        let mut optimizer = optimizer(SalesmanConfig::new(5, 4, 1, 0.0, 0.0), 31);

        let best_before = optimizer.best().map(|(tour, _)| tour.clone()).unwrap();
        optimizer.select();
        assert_eq!(optimizer.selected_pool()[0], best_before);

        let anchor = optimizer.selected_pool()[0].clone();
        optimizer.cross();
        optimizer.mutate();
        optimizer.evaluate_fitness();

        assert_eq!(optimizer.population_size(), 4);
        assert_eq!(optimizer.population().individuals()[0], anchor);
        assert!(all_permutations(&optimizer));
        assert!(optimizer
            .population()
            .individuals()
            .iter()
            .all(|tour| tour.len() == 5));
    }

    #[test]
    fn elites_enter_pool_unchanged() {
        let mut optimizer = optimizer(SalesmanConfig::new(12, 30, 6, 0.5, 0.3), 2);

        for _ in 0..5 {
            let mut ranked = optimizer.population().clone();
            ranked.sort(Objective::Minimize);
            let elites = ranked.individuals()[..6].to_vec();

            optimizer.select();
            assert_eq!(optimizer.selected_pool().len(), 30);
            assert_eq!(&optimizer.selected_pool()[..6], elites.as_slice());

            optimizer.cross();
            optimizer.mutate();
            optimizer.evaluate_fitness();
        }
    }

    #[test]
    fn full_mutation_changes_every_tour() {
        let mut optimizer = optimizer(SalesmanConfig::new(10, 20, 2, 0.0, 1.0), 44);
        let before = optimizer.population().individuals().to_vec();

        optimizer.mutate();

        for (old, new) in before.iter().zip(optimizer.population().individuals()) {
            assert_ne!(old, new);
            assert!(new.is_permutation());
        }
    }

    #[test]
    fn permutations_hold_across_generations() {
        let mut optimizer = optimizer(SalesmanConfig::new(20, 40, 4, 0.5, 0.5), 8);

        for _ in 0..50 {
            optimizer.run_generation();
            assert!(all_permutations(&optimizer));
            assert_eq!(optimizer.population_size(), 40);
            assert_eq!(optimizer.population().fitness().len(), 40);
        }
    }

    #[test]
    fn fitness_is_fresh_after_generation() {
        let mut optimizer = optimizer(SalesmanConfig::new(15, 20, 2, 0.5, 0.5), 19);
        optimizer.run_generation();

        let cities = optimizer.cities().to_vec();
        for (tour, &fitness) in optimizer
            .population()
            .individuals()
            .iter()
            .zip(optimizer.population().fitness())
        {
            assert_eq!(tour.length(&cities), fitness);
        }
    }

    #[test]
    fn degenerate_sizes_run() {
        let mut single_city = optimizer(SalesmanConfig::new(1, 3, 1, 1.0, 1.0), 5);
        let mut single_solution = optimizer(SalesmanConfig::new(6, 1, 0, 0.0, 0.5), 5);

        for _ in 0..10 {
            single_city.run_generation();
            single_solution.run_generation();
        }

        assert_eq!(single_city.population().individuals()[0].path(), &[0]);
        assert_eq!(single_solution.population_size(), 1);
        assert!(all_permutations(&single_solution));
    }

    #[test]
    fn evolution_shortens_tours() {
        let mut optimizer = optimizer(SalesmanConfig::new(25, 60, 5, 0.5, 0.2), 77);
        let start = optimizer.stats().mean;

        for _ in 0..300 {
            optimizer.run_generation();
        }

        assert!(optimizer.stats().best < start);
    }

    #[test]
    fn reset_regenerates_cities() {
        let mut optimizer = optimizer(SalesmanConfig::new(30, 10, 1, 0.5, 0.2), 3);
        let cities = optimizer.cities().to_vec();

        optimizer.run_generation();
        optimizer.init_population();

        assert_eq!(optimizer.generation(), 0);
        assert_ne!(optimizer.cities(), cities.as_slice());
        assert!(optimizer
            .cities()
            .iter()
            .all(|c| c.in_bounds(499.0, 499.0)));
    }

    #[test]
    fn snapshot_reports_best_length() {
        let cities = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 20.0),
        ];
        let optimizer = SalesmanOptimizer::with_cities(
            SalesmanConfig::new(0, 6, 1, 0.0, 0.0),
            cities,
            RandomSource::seeded(1),
        )
        .unwrap();

        let snapshot = optimizer.render_snapshot();
        let best = optimizer.best().unwrap().1;

        assert_eq!(snapshot.best_fitness, Some(format!("{:.2}", best)));
        assert_eq!(snapshot.markers.len(), 3);
        assert_eq!(snapshot.tours.len(), 6);
        assert!(snapshot.heatmap.is_none());
        assert!(best == 20.0 || best == 30.0);
    }
}
