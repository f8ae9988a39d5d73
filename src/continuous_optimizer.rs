use crate::canvas::{FitnessField, Point, HEIGHT, WIDTH};
use crate::config::{ContinuousConfig, LandscapeConfig, SelectionStrategy};
use crate::error::ConfigError;
use crate::genetic_algorithm::Engine;
use crate::landscape::{DividingLines, Landscape, Targets};
use crate::population::{Objective, Population};
use crate::random::RandomSource;
use crate::snapshot::{GenerationStats, Heatmap, Snapshot};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Evolves points on the canvas toward the best region of a [`Landscape`].
#[derive(Debug)]
pub struct ContinuousOptimizer {
    config: ContinuousConfig,
    landscape: Landscape,
    population: Population<Point>,
    selected: Vec<Point>,
    field: FitnessField,
    heatmap: Arc<Heatmap>,
    generation: u64,
    rng: RandomSource,
}

impl ContinuousOptimizer {
    pub fn new(config: ContinuousConfig, rng: RandomSource) -> Result<Self, ConfigError> {
        config.validate()?;

        let landscape = match &config.landscape {
            LandscapeConfig::Lines { lower_x, upper_x } => {
                Landscape::Lines(DividingLines::new(lower_x, upper_x, HEIGHT as f64)?)
            }
            LandscapeConfig::Targets {
                target_x,
                target_y,
                max_fitness,
                scale,
            } => Landscape::Targets(Targets::new(target_x, target_y, *max_fitness, *scale)?),
        };

        if let Landscape::Targets(targets) = &landscape {
            debug!(
                targets = targets.targets().len(),
                plateau_radius = targets.plateau_radius(),
                "attraction landscape built"
            );
        }

        let (field, heatmap) = sample_field(&landscape);
        let population = Population::new(vec![Point::default(); config.population_size]);

        let mut optimizer = Self {
            config,
            landscape,
            population,
            selected: Vec::new(),
            field,
            heatmap,
            generation: 0,
            rng,
        };
        optimizer.seed_population();

        Ok(optimizer)
    }

    pub fn population(&self) -> &Population<Point> {
        &self.population
    }

    /// The pool built by the last tournament selection. Empty for local-greedy runs.
    pub fn selected_pool(&self) -> &[Point] {
        &self.selected
    }

    pub fn objective(&self) -> Objective {
        self.landscape.objective()
    }

    /// Standard deviation the next `mutate` call will use.
    pub fn mutation_sigma(&self) -> f64 {
        match self.config.diminishing_factor {
            Some(factor) => {
                self.config.mutation_std_dev / (self.generation as f64 / factor).max(1.0)
            }
            None => self.config.mutation_std_dev,
        }
    }

    fn seed_population(&mut self) {
        let points: Vec<Point> = (0..self.config.population_size)
            .map(|_| self.random_point())
            .collect();

        self.population = Population::new(points);
        self.selected.clear();
        self.generation = 0;
        self.evaluate_fitness_parallel();

        info!(
            population = self.population.len(),
            min_fitness = self.field.min(),
            max_fitness = self.field.max(),
            "continuous population initialized"
        );
    }

    fn random_point(&mut self) -> Point {
        let x = self.rng.uniform() * WIDTH as f64;
        let y = self.rng.uniform() * HEIGHT as f64;
        Point::new(x, y)
    }

    fn uniform_crossover(&mut self) {
        let size = self.population.len();
        if self.selected.len() * 2 != size {
            debug!(
                pool = self.selected.len(),
                "selection pool is stale, selecting before crossover"
            );
            self.select();
        }

        let mut next = vec![Point::default(); size];

        for i in (0..self.selected.len()).step_by(2) {
            let (a, b) = (self.selected[i], self.selected[i + 1]);

            for j in 0..2 {
                let (first, second) =
                    cross_pair(a, b, self.config.cross_probability, &mut self.rng);
                next[2 * (i + j)] = first;
                next[2 * (i + j) + 1] = second;
            }
        }

        self.population.replace(next);
    }

    fn local_greedy_crossover(&mut self) {
        let current = self.population.individuals().to_vec();
        let fitness = self.population.fitness().to_vec();
        let objective = self.objective();
        let size = current.len();

        let mut next = Vec::with_capacity(size);

        for (i, individual) in current.iter().enumerate() {
            let mut best: Option<usize> = None;

            for _ in 0..self.config.neighbor_slots {
                let Some(candidate) = self.find_neighbor(&current, individual) else {
                    continue;
                };

                match best {
                    Some(b) if !objective.improves(fitness[candidate], fitness[b]) => {}
                    _ => best = Some(candidate),
                }
            }

            let Some(mate) = best.map(|b| current[b]) else {
                next.push(current[i]);
                continue;
            };

            let keep = self.config.keep_probability;
            let x = if self.rng.chance(keep) {
                individual.x
            } else {
                mate.x * 0.75 + mate.x * 0.25
            };
            let y = if self.rng.chance(keep) {
                individual.y
            } else {
                mate.y * 0.75 + mate.y * 0.25
            };

            next.push(Point::new(x, y));
        }

        self.population.replace(next);
    }

    // First random draw within the selection distance, or the last draw once retries run out
    fn find_neighbor(&mut self, current: &[Point], individual: &Point) -> Option<usize> {
        let retries = self.config.neighbor_retries;

        for attempt in 0..retries {
            let index = self.rng.index(current.len());
            let close =
                current[index].distance_squared(individual) < self.config.selection_distance;

            if close || attempt + 1 == retries {
                return Some(index);
            }
        }

        None
    }
}

/// One uniform crossover of two parents into two complementary children.
/// Each gene stays in parent order unless a `cross_probability` draw swaps it.
pub fn cross_pair(
    a: Point,
    b: Point,
    cross_probability: f64,
    rng: &mut RandomSource,
) -> (Point, Point) {
    let (x1, x2) = if rng.chance(cross_probability) {
        (b.x, a.x)
    } else {
        (a.x, b.x)
    };
    let (y1, y2) = if rng.chance(cross_probability) {
        (b.y, a.y)
    } else {
        (a.y, b.y)
    };

    (Point::new(x1, y1), Point::new(x2, y2))
}

fn sample_field(landscape: &Landscape) -> (FitnessField, Arc<Heatmap>) {
    let field = FitnessField::sample(WIDTH, HEIGHT, |p| landscape.fitness(p));
    let heatmap = Heatmap {
        width: field.width(),
        height: field.height(),
        intensities: field.intensities(|v| landscape.shade(v)),
    };

    (field, Arc::new(heatmap))
}

impl Engine for ContinuousOptimizer {
    fn init_population(&mut self) {
        let (field, heatmap) = sample_field(&self.landscape);
        self.field = field;
        self.heatmap = heatmap;

        self.seed_population();
    }

    fn evaluate_fitness(&mut self) {
        let landscape = &self.landscape;
        self.population.evaluate(|p| landscape.fitness(*p));
    }

    fn evaluate_fitness_parallel(&mut self) {
        let landscape = &self.landscape;
        self.population.evaluate_parallel(|p| landscape.fitness(*p));
    }

    fn select(&mut self) {
        match self.config.strategy {
            SelectionStrategy::Tournament => {
                let objective = self.objective();
                let size = self.config.tournament_size;

                self.selected = (0..self.population.len() / 2)
                    .map(|_| {
                        let winner = self.population.tournament(&mut self.rng, size, objective);
                        self.population.individuals()[winner]
                    })
                    .collect();
            }
            SelectionStrategy::LocalGreedy => self.selected.clear(),
        }
    }

    #[instrument(level = "debug", skip_all, fields(generation = self.generation, strategy = ?self.config.strategy))]
    fn cross(&mut self) {
        match self.config.strategy {
            SelectionStrategy::Tournament => self.uniform_crossover(),
            SelectionStrategy::LocalGreedy => self.local_greedy_crossover(),
        }
    }

    fn mutate(&mut self) {
        let sigma = self.mutation_sigma();
        let rate = self.config.mutation_rate;
        let (width, height) = (WIDTH as f64, HEIGHT as f64);

        for point in self.population.individuals_mut() {
            if self.rng.chance(rate) {
                point.x += self.rng.gaussian() * sigma;
                point.y += self.rng.gaussian() * sigma;
            }
        }

        for point in self.population.individuals_mut() {
            *point = point.clamped(width, height);
        }

        self.generation += 1;
        debug!(generation = self.generation, sigma, "population mutated");
    }

    fn render_snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            heatmap: Some(Arc::clone(&self.heatmap)),
            lines: self.landscape.lines(),
            markers: self.landscape.markers(),
            points: self.population.individuals().to_vec(),
            tours: Vec::new(),
            best_fitness: None,
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
        let fitness: Vec<f64> = self
            .population
            .individuals()
            .iter()
            .map(|p| self.landscape.fitness(*p))
            .collect();

        GenerationStats::from_fitness(self.generation, &fitness, self.objective())
    }
}
