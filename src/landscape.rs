use crate::canvas::{to_channel, Point};
use crate::error::ConfigError;
use crate::population::Objective;
use serde::{Deserialize, Serialize};

/// A dividing line through two distinct points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub lower: Point,
    pub upper: Point,
}

impl LineSegment {
    pub fn new(lower: Point, upper: Point, index: usize) -> Result<Self, ConfigError> {
        if lower == upper {
            return Err(ConfigError::DegenerateSegment { index });
        }

        Ok(Self { lower, upper })
    }

    /// Perpendicular distance from `p` to the infinite line through both endpoints.
    pub fn distance(&self, p: Point) -> f64 {
        let (ax, ay) = (self.lower.x, self.lower.y);
        let (bx, by) = (self.upper.x, self.upper.y);

        let numerator = (bx - ax) * (ay - p.y) - (ax - p.x) * (by - ay);
        let length = ((bx - ax) * (bx - ax) + (by - ay) * (by - ay)).sqrt();

        (numerator / length).abs()
    }
}

/// Line-distance landscape: lower fitness means closer to every line.
#[derive(Clone, Debug, PartialEq)]
pub struct DividingLines {
    segments: Vec<LineSegment>,
}

impl DividingLines {
    /// Segment `i` runs from `(lower_x[i], height)` up to `(upper_x[i], 0)`.
    pub fn new(lower_x: &[i32], upper_x: &[i32], height: f64) -> Result<Self, ConfigError> {
        if lower_x.len() != upper_x.len() {
            return Err(ConfigError::MismatchedCoordinates {
                what: "line",
                left: lower_x.len(),
                right: upper_x.len(),
            });
        }

        let segments = lower_x
            .iter()
            .zip(upper_x)
            .enumerate()
            .map(|(index, (&low, &high))| {
                LineSegment::new(
                    Point::new(low as f64, height),
                    Point::new(high as f64, 0.0),
                    index,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    pub fn fitness(&self, p: Point) -> f64 {
        self.segments
            .iter()
            .map(|segment| segment.distance(p).max(0.0))
            .sum()
    }

    // cubic falloff so only the area right next to the lines stays pale
    pub fn shade(normalized: f64) -> u8 {
        let v = 1.0 - normalized;
        to_channel(255.0 * (1.0 - v * v * v))
    }
}

/// Point-attraction landscape: each target contributes `min(cap, scale / sqrt(d))`.
#[derive(Clone, Debug, PartialEq)]
pub struct Targets {
    targets: Vec<Point>,
    cap: f64,
    scale: f64,
}

impl Targets {
    pub fn new(xs: &[i32], ys: &[i32], cap: f64, scale: f64) -> Result<Self, ConfigError> {
        if xs.len() != ys.len() {
            return Err(ConfigError::MismatchedCoordinates {
                what: "target",
                left: xs.len(),
                right: ys.len(),
            });
        }

        Ok(Self {
            targets: xs
                .iter()
                .zip(ys)
                .map(|(&x, &y)| Point::new(x as f64, y as f64))
                .collect(),
            cap,
            scale,
        })
    }

    pub fn targets(&self) -> &[Point] {
        &self.targets
    }

    pub fn fitness(&self, p: Point) -> f64 {
        self.targets
            .iter()
            .map(|target| {
                // distance 0 yields +inf, which the cap absorbs
                let d = target.distance(&p);
                self.cap.min(self.scale / d.sqrt())
            })
            .sum()
    }

    /// Distance from a target inside which its contribution saturates at the cap.
    pub fn plateau_radius(&self) -> f64 {
        let ratio = self.scale / self.cap;
        ratio * ratio
    }

    pub fn shade(normalized: f64) -> u8 {
        to_channel(255.0 * (1.0 - normalized * 1.5))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Landscape {
    Lines(DividingLines),
    Targets(Targets),
}

impl Landscape {
    pub fn fitness(&self, p: Point) -> f64 {
        match self {
            Landscape::Lines(lines) => lines.fitness(p),
            Landscape::Targets(targets) => targets.fitness(p),
        }
    }

    pub fn objective(&self) -> Objective {
        match self {
            Landscape::Lines(_) => Objective::Minimize,
            Landscape::Targets(_) => Objective::Maximize,
        }
    }

    pub fn shade(&self, normalized: f64) -> u8 {
        match self {
            Landscape::Lines(_) => DividingLines::shade(normalized),
            Landscape::Targets(_) => Targets::shade(normalized),
        }
    }

    pub fn lines(&self) -> Vec<(Point, Point)> {
        match self {
            Landscape::Lines(lines) => lines
                .segments()
                .iter()
                .map(|segment| (segment.lower, segment.upper))
                .collect(),
            Landscape::Targets(_) => Vec::new(),
        }
    }

    pub fn markers(&self) -> Vec<Point> {
        match self {
            Landscape::Lines(_) => Vec::new(),
            Landscape::Targets(targets) => targets.targets().to_vec(),
        }
    }
}
