use crate::error::{check_magnitude, check_probability, ConfigError};
use serde::{Deserialize, Serialize};

/// How the continuous optimizer picks and combines parents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// 8-way tournament into a half-size pool, then uniform crossover into 4 children per pair.
    Tournament,
    /// No explicit pool; every individual moves toward a fit neighbor during crossover.
    LocalGreedy,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LandscapeConfig {
    Lines {
        lower_x: Vec<i32>,
        upper_x: Vec<i32>,
    },
    Targets {
        target_x: Vec<i32>,
        target_y: Vec<i32>,
        // per-target saturation ceiling
        max_fitness: f64,
        scale: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinuousConfig {
    pub population_size: usize,
    pub landscape: LandscapeConfig,
    pub strategy: SelectionStrategy,
    pub tournament_size: usize,
    /// Probability that a gene is taken from the other parent in uniform crossover.
    pub cross_probability: f64,
    /// Squared distance within which a neighbor counts as close in local-greedy crossover.
    pub selection_distance: f64,
    pub neighbor_slots: usize,
    pub neighbor_retries: usize,
    /// Probability that a gene keeps its own value in local-greedy crossover.
    pub keep_probability: f64,
    pub mutation_rate: f64,
    pub mutation_std_dev: f64,
    /// When set, sigma becomes `mutation_std_dev / max(1, generation / factor)`.
    pub diminishing_factor: Option<f64>,
}

impl ContinuousConfig {
    /// Line-distance defaults: tournament selection, fixed sigma of 5.
    pub fn lines(population_size: usize, lower_x: Vec<i32>, upper_x: Vec<i32>) -> Self {
        Self {
            population_size,
            landscape: LandscapeConfig::Lines { lower_x, upper_x },
            strategy: SelectionStrategy::Tournament,
            tournament_size: 8,
            cross_probability: 0.1,
            selection_distance: 100.0,
            neighbor_slots: 8,
            neighbor_retries: 32,
            keep_probability: 0.7,
            mutation_rate: 0.1,
            mutation_std_dev: 5.0,
            diminishing_factor: None,
        }
    }

    /// Point-attraction defaults: local-greedy crossover, sigma 3 diminishing by a factor of 12.
    pub fn targets(population_size: usize, target_x: Vec<i32>, target_y: Vec<i32>) -> Self {
        Self {
            population_size,
            landscape: LandscapeConfig::Targets {
                target_x,
                target_y,
                max_fitness: 1000.0,
                scale: 1000.0,
            },
            strategy: SelectionStrategy::LocalGreedy,
            tournament_size: 8,
            cross_probability: 0.1,
            selection_distance: 100.0,
            neighbor_slots: 8,
            neighbor_retries: 32,
            keep_probability: 0.7,
            mutation_rate: 0.1,
            mutation_std_dev: 3.0,
            diminishing_factor: Some(12.0),
        }
    }

    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }

        // half-size pool consumed two at a time, four children per pair
        if self.strategy == SelectionStrategy::Tournament && self.population_size % 4 != 0 {
            return Err(ConfigError::PopulationNotDivisible {
                size: self.population_size,
                divisor: 4,
            });
        }

        if self.tournament_size == 0 {
            return Err(ConfigError::ZeroTournament);
        }

        check_probability("cross_probability", self.cross_probability)?;
        check_probability("keep_probability", self.keep_probability)?;
        check_probability("mutation_rate", self.mutation_rate)?;
        check_magnitude("mutation_std_dev", self.mutation_std_dev)?;
        check_magnitude("selection_distance", self.selection_distance)?;

        if let Some(factor) = self.diminishing_factor {
            check_magnitude("diminishing_factor", factor)?;
            if factor == 0.0 {
                return Err(ConfigError::InvalidMagnitude {
                    name: "diminishing_factor",
                    value: factor,
                });
            }
        }

        if let LandscapeConfig::Targets {
            max_fitness, scale, ..
        } = &self.landscape
        {
            check_magnitude("max_fitness", *max_fitness)?;
            check_magnitude("scale", *scale)?;
        }

        Ok(())
    }
}

// Upper bound of swaps applied to one mutated tour
pub const MAX_SWAPS: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesmanConfig {
    pub num_cities: usize,
    pub num_solutions: usize,
    pub num_elites: usize,
    /// Probability that an elite (other than the very best) is bred instead of copied.
    pub elite_cross_probability: f64,
    pub mutation_probability: f64,
    pub tournament_size: usize,
    pub max_swaps: usize,
}

impl SalesmanConfig {
    pub fn new(
        num_cities: usize,
        num_solutions: usize,
        num_elites: usize,
        elite_cross_probability: f64,
        mutation_probability: f64,
    ) -> Self {
        Self {
            num_cities,
            num_solutions,
            num_elites,
            elite_cross_probability,
            mutation_probability,
            tournament_size: 8,
            max_swaps: MAX_SWAPS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_cities == 0 {
            return Err(ConfigError::NoCities);
        }

        if self.num_solutions == 0 {
            return Err(ConfigError::EmptyPopulation);
        }

        if self.num_elites > self.num_solutions {
            return Err(ConfigError::TooManyElites {
                elites: self.num_elites,
                solutions: self.num_solutions,
            });
        }

        if self.tournament_size == 0 {
            return Err(ConfigError::ZeroTournament);
        }

        if !(1..=MAX_SWAPS).contains(&self.max_swaps) {
            return Err(ConfigError::SwapsOutOfRange {
                value: self.max_swaps,
                max: MAX_SWAPS,
            });
        }

        check_probability("elite_cross_probability", self.elite_cross_probability)?;
        check_probability("mutation_probability", self.mutation_probability)?;

        Ok(())
    }
}

/// The demo setups the optimizers are usually shown with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Lines,
    Points,
    Salesman,
}

impl Preset {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "lines" | "linear" => Some(Preset::Lines),
            "points" | "point" => Some(Preset::Points),
            "salesman" | "tsp" => Some(Preset::Salesman),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Lines => "lines",
            Preset::Points => "points",
            Preset::Salesman => "salesman",
        }
    }

    pub fn lines() -> ContinuousConfig {
        ContinuousConfig::lines(400, vec![0, 100, 400, 500], vec![100, 0, 500, 400])
    }

    pub fn points() -> ContinuousConfig {
        ContinuousConfig::targets(1000, vec![150, 350, 250], vec![300, 300, 200])
    }

    pub fn salesman() -> SalesmanConfig {
        SalesmanConfig::new(35, 60, 5, 0.5, 0.2)
    }
}

/// Pacing of the background driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Generations run between two published frames when not in real-time mode.
    pub generations_per_frame: usize,
    pub frame_rate: u32,
    /// One generation per frame instead of a fast-forward batch.
    pub real_time: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            generations_per_frame: 1000,
            frame_rate: 15,
            real_time: false,
        }
    }
}

impl DriverConfig {
    pub fn batch_size(&self) -> usize {
        if self.real_time {
            1
        } else {
            self.generations_per_frame.max(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(Preset::lines().validate().is_ok());
        assert!(Preset::points().validate().is_ok());
        assert!(Preset::salesman().validate().is_ok());
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in [Preset::Lines, Preset::Points, Preset::Salesman] {
            assert_eq!(Preset::parse(preset.name()), Some(preset));
        }
        assert_eq!(Preset::parse("tsp"), Some(Preset::Salesman));
        assert_eq!(Preset::parse("gui"), None);
    }

    #[test]
    fn tournament_path_needs_multiple_of_four() {
        let config = ContinuousConfig::lines(10, vec![0], vec![0]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::PopulationNotDivisible {
                size: 10,
                divisor: 4
            })
        );

        let greedy = ContinuousConfig::targets(10, vec![1], vec![1]);
        assert!(greedy.validate().is_ok());
        assert!(greedy
            .with_strategy(SelectionStrategy::Tournament)
            .validate()
            .is_err());
    }

    #[test]
    fn empty_population_is_rejected() {
        let config = ContinuousConfig::targets(0, vec![1], vec![1]);
        assert_eq!(config.validate(), Err(ConfigError::EmptyPopulation));

        let salesman = SalesmanConfig::new(5, 0, 0, 0.5, 0.1);
        assert_eq!(salesman.validate(), Err(ConfigError::EmptyPopulation));
    }

    #[test]
    fn salesman_rules() {
        assert_eq!(
            SalesmanConfig::new(0, 4, 1, 0.0, 0.0).validate(),
            Err(ConfigError::NoCities)
        );
        assert_eq!(
            SalesmanConfig::new(5, 4, 5, 0.0, 0.0).validate(),
            Err(ConfigError::TooManyElites {
                elites: 5,
                solutions: 4
            })
        );
        assert!(SalesmanConfig::new(5, 4, 4, 0.0, 0.0).validate().is_ok());
        assert!(SalesmanConfig::new(5, 4, 1, 1.2, 0.0).validate().is_err());
    }

    #[test]
    fn swap_count_is_bounded() {
        let mut config = Preset::salesman();
        config.max_swaps = 4;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SwapsOutOfRange { value: 4, max: 3 })
        );

        config.max_swaps = 0;
        assert!(config.validate().is_err());

        config.max_swaps = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_diminishing_factor_is_rejected() {
        let mut config = Preset::points();
        config.diminishing_factor = Some(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn real_time_runs_single_generations() {
        let mut driver = DriverConfig::default();
        assert_eq!(driver.batch_size(), 1000);
        driver.real_time = true;
        assert_eq!(driver.batch_size(), 1);
    }
}
