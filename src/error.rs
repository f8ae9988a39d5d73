/// Rejections raised while validating an optimizer configuration.
///
/// Every engine validates its configuration before it allocates a population,
/// so a successfully built engine never has to signal failures at runtime.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("population must contain at least one individual")]
    EmptyPopulation,

    #[error("population size {size} must be a multiple of {divisor} for uniform crossover")]
    PopulationNotDivisible { size: usize, divisor: usize },

    #[error("{what} coordinate lists differ in length ({left} vs {right})")]
    MismatchedCoordinates {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("line segment {index} has coinciding endpoints")]
    DegenerateSegment { index: usize },

    #[error("at least one city is required")]
    NoCities,

    #[error("{elites} elites exceed the {solutions} available solutions")]
    TooManyElites { elites: usize, solutions: usize },

    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidMagnitude { name: &'static str, value: f64 },

    #[error("tournament size must be at least 1")]
    ZeroTournament,

    #[error("swaps per mutation must be between 1 and {max}, got {value}")]
    SwapsOutOfRange { value: usize, max: usize },
}

/// Failures of the background driver loop.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("driver worker has stopped")]
    WorkerStopped,

    #[error("driver worker panicked")]
    WorkerPanicked,
}

pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ProbabilityOutOfRange { name, value });
    }

    Ok(())
}

pub(crate) fn check_magnitude(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidMagnitude { name, value });
    }

    Ok(())
}
