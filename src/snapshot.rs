use crate::canvas::Point;
use crate::population::Objective;
use serde::Serialize;
use std::sync::Arc;

/// Summary of one generation's fitness, in the variant's own direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct GenerationStats {
    pub generation: u64,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
}

impl GenerationStats {
    pub fn from_fitness(generation: u64, fitness: &[f64], objective: Objective) -> Self {
        if fitness.is_empty() {
            return Self {
                generation,
                ..Default::default()
            };
        }

        let mut best = fitness[0];
        let mut worst = fitness[0];
        for &value in &fitness[1..] {
            if objective.improves(value, best) {
                best = value;
            }
            if objective.improves(worst, value) {
                worst = value;
            }
        }

        Self {
            generation,
            best,
            mean: fitness.iter().sum::<f64>() / fitness.len() as f64,
            worst,
        }
    }
}

/// Row-major intensity channel of the fitness landscape.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap {
    pub width: u32,
    pub height: u32,
    pub intensities: Vec<u8>,
}

impl Heatmap {
    pub fn intensity(&self, x: u32, y: u32) -> u8 {
        self.intensities[(y * self.width + x) as usize]
    }
}

/// Everything a renderer needs to draw one generation. Produced without
/// touching engine state, so it can be handed to another thread.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub generation: u64,
    pub heatmap: Option<Arc<Heatmap>>,
    pub lines: Vec<(Point, Point)>,
    pub markers: Vec<Point>,
    pub points: Vec<Point>,
    pub tours: Vec<Vec<Point>>,
    pub best_fitness: Option<String>,
    pub stats: GenerationStats,
}
