//! Genetic optimizers over a fixed 500x500 plane.
//!
//! Three variants share one generational cycle ([`Engine`]): points pulled
//! toward dividing lines, points attracted to targets (both
//! [`ContinuousOptimizer`]) and tours over random cities
//! ([`SalesmanOptimizer`]). [`Driver`] runs any of them on a worker thread.

pub mod canvas;
pub mod config;
pub mod continuous_optimizer;
pub mod driver;
pub mod error;
pub mod genetic_algorithm;
pub mod landscape;
pub mod population;
pub mod random;
pub mod salesman;
pub mod snapshot;
pub mod visualization;

pub use config::{ContinuousConfig, DriverConfig, Preset, SalesmanConfig, SelectionStrategy};
pub use continuous_optimizer::ContinuousOptimizer;
pub use driver::{Command, Driver};
pub use error::{ConfigError, DriverError};
pub use genetic_algorithm::{Engine, Evaluator};
pub use random::RandomSource;
pub use salesman::SalesmanOptimizer;
pub use snapshot::{GenerationStats, Snapshot};
