use crate::snapshot::{GenerationStats, Snapshot};
use std::fmt::Debug;

// This trait is the generational cycle every optimizer implements.
// An engine starts out Ready after construction; `init_population` resets it
// and `run_generation` loops on Ready for as long as the driver wants.
pub trait Engine: Send + Debug {
    // Regenerates the population (and the landscape where it is random)
    fn init_population(&mut self);

    fn evaluate_fitness(&mut self);

    // Partitioned variant of `evaluate_fitness`; must produce the same values
    fn evaluate_fitness_parallel(&mut self) {
        self.evaluate_fitness();
    }

    fn select(&mut self);
    fn cross(&mut self);
    fn mutate(&mut self);

    // Advances exactly one generation
    fn run_generation(&mut self) {
        self.evaluate_fitness_parallel();
        self.select();
        self.cross();
        self.mutate();
    }

    fn render_snapshot(&self) -> Snapshot;

    fn generation(&self) -> u64;
    fn population_size(&self) -> usize;
    fn stats(&self) -> GenerationStats;
}

// This trait represents the stopping condition consulted by drivers
pub trait Evaluator: Send + Debug {
    fn can_terminate(&mut self, stats: &GenerationStats) -> bool;
}
