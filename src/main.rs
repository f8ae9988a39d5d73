use chrono::Local;
use colored::Colorize;
use csv::Writer;
use genetic_plane::population::Objective;
use genetic_plane::visualization::render_png;
use genetic_plane::{
    Command, ConfigError, ContinuousOptimizer, Driver, DriverConfig, Engine, Evaluator,
    GenerationStats, Preset, RandomSource, SalesmanOptimizer,
};
use std::error::Error;
use tracing::{info, Level};

const MAX_GENERATIONS: u64 = 50_000;
const PATIENCE: u32 = 20;

// Stops after a generation budget or once the best fitness stalls for PATIENCE frames
#[derive(Debug)]
pub struct ProgressEvaluator {
    objective: Objective,
    max_generations: u64,
    best_fitness: Option<f64>,
    best_fitness_count: u32,
}

impl ProgressEvaluator {
    fn new(objective: Objective, max_generations: u64) -> Self {
        Self {
            objective,
            max_generations,
            best_fitness: None,
            best_fitness_count: 0,
        }
    }
}

impl Evaluator for ProgressEvaluator {
    fn can_terminate(&mut self, stats: &GenerationStats) -> bool {
        println!(
            "{} - Best fitness: {:.4}, mean fitness: {:.4}, worst fitness: {:.4}",
            format!("Generation {:6}", stats.generation).bold().red(),
            stats.best,
            stats.mean,
            stats.worst,
        );

        match self.best_fitness {
            Some(best) if !self.objective.improves(stats.best, best) => {
                self.best_fitness_count += 1
            }
            _ => {
                self.best_fitness = Some(stats.best);
                self.best_fitness_count = 0;
            }
        }

        stats.generation >= self.max_generations || self.best_fitness_count >= PATIENCE
    }
}

fn build_engine(
    preset: Preset,
    rng: RandomSource,
) -> Result<(Box<dyn Engine>, Objective), ConfigError> {
    Ok(match preset {
        Preset::Lines => (
            Box::new(ContinuousOptimizer::new(Preset::lines(), rng)?),
            Objective::Minimize,
        ),
        Preset::Points => (
            Box::new(ContinuousOptimizer::new(Preset::points(), rng)?),
            Objective::Maximize,
        ),
        Preset::Salesman => (
            Box::new(SalesmanOptimizer::new(Preset::salesman(), rng)?),
            Objective::Minimize,
        ),
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    // usage: genetic_plane [lines|points|salesman] [max generations] [seed]
    let args: Vec<String> = std::env::args().collect();
    let preset = match args.get(1) {
        Some(name) => Preset::parse(name).ok_or_else(|| format!("unknown preset '{name}'"))?,
        None => Preset::Salesman,
    };
    let max_generations = match args.get(2) {
        Some(value) => value.parse::<u64>()?,
        None => MAX_GENERATIONS,
    };
    let rng = match args.get(3) {
        Some(seed) => RandomSource::seeded(seed.parse::<u64>()?),
        None => RandomSource::from_entropy(),
    };

    let (engine, objective) = build_engine(preset, rng)?;
    let config = DriverConfig::default();
    info!(
        preset = preset.name(),
        max_generations,
        generations_per_frame = config.generations_per_frame,
        "starting run"
    );

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut writer = Writer::from_path(format!("{}_{}.csv", preset.name(), timestamp))?;
    let mut evaluator = ProgressEvaluator::new(objective, max_generations);

    let driver = Driver::spawn(engine, config);
    driver.send(Command::Start)?;

    for frame in driver.frames().iter() {
        writer.serialize(frame.stats)?;

        if evaluator.can_terminate(&frame.stats) {
            break;
        }
    }

    driver.send(Command::Stop)?;
    let engine = driver.shutdown()?;
    writer.flush()?;

    let snapshot = engine.render_snapshot();
    if let Some(best) = &snapshot.best_fitness {
        println!("{} {}", "Best tour length:".bold().green(), best);
    }
    render_png(&snapshot, format!("{}_{}.png", preset.name(), timestamp))?;

    Ok(())
}
