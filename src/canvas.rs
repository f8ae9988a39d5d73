use itertools::{Itertools, MinMaxResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub const WIDTH: u32 = 500;
pub const HEIGHT: u32 = 500;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn clamped(self, width: f64, height: f64) -> Self {
        Self {
            x: self.x.clamp(0.0, width),
            y: self.y.clamp(0.0, height),
        }
    }

    pub fn in_bounds(&self, width: f64, height: f64) -> bool {
        (0.0..=width).contains(&self.x) && (0.0..=height).contains(&self.y)
    }
}

// Fitness sampled at every integer pixel, rebuilt on reset
#[derive(Clone, Debug)]
pub struct FitnessField {
    width: u32,
    height: u32,
    values: Vec<f64>,
    min: f64,
    max: f64,
}

impl FitnessField {
    pub fn sample<F>(width: u32, height: u32, fitness: F) -> Self
    where
        F: Fn(Point) -> f64 + Sync,
    {
        let values: Vec<f64> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                let fitness = &fitness;
                (0..width).map(move |x| fitness(Point::new(x as f64, y as f64)))
            })
            .collect();

        let (min, max) = match values.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => (0.0, 0.0),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(min, max) => (min, max),
        };

        Self {
            width,
            height,
            values,
            min,
            max,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    // A flat field maps to 0
    pub fn normalize(&self, fitness: f64) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            (fitness - self.min) / span
        } else {
            0.0
        }
    }

    pub fn intensities<S>(&self, shade: S) -> Vec<u8>
    where
        S: Fn(f64) -> u8 + Sync,
    {
        self.values
            .par_iter()
            .map(|&v| shade(self.normalize(v)))
            .collect()
    }
}

pub fn to_channel(shade: f64) -> u8 {
    shade.clamp(0.0, 255.0) as u8
}
