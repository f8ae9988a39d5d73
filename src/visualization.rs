use crate::canvas::{Point, HEIGHT, WIDTH};
use crate::snapshot::Snapshot;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

// Alpha of each tour line when the whole population is overlaid
const POPULATION_OPACITY: f64 = 10.0 / 255.0;

fn pixel(p: &Point) -> (i32, i32) {
    (p.x as i32, p.y as i32)
}

/// Draws a snapshot onto any plotters drawing area sized like the canvas.
pub fn draw_snapshot<DB>(
    root: &DrawingArea<DB, Shift>,
    snapshot: &Snapshot,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    if let Some(heatmap) = &snapshot.heatmap {
        for y in 0..heatmap.height {
            for x in 0..heatmap.width {
                let c = heatmap.intensity(x, y);
                root.draw_pixel((x as i32, y as i32), &RGBColor(255, c, c))?;
            }
        }
    }

    for tour in &snapshot.tours {
        root.draw(&PathElement::new(
            tour.iter().map(pixel).collect::<Vec<_>>(),
            BLUE.mix(POPULATION_OPACITY).stroke_width(2),
        ))?;
    }

    for (from, to) in &snapshot.lines {
        root.draw(&PathElement::new(
            vec![pixel(from), pixel(to)],
            BLACK.stroke_width(2),
        ))?;
    }

    for marker in &snapshot.markers {
        let (x, y) = pixel(marker);
        root.draw(&Rectangle::new(
            [(x - 4, y - 4), (x + 4, y + 4)],
            BLUE.filled(),
        ))?;
    }

    for point in &snapshot.points {
        let (x, y) = pixel(point);
        root.draw(&Rectangle::new(
            [(x - 2, y - 2), (x + 2, y + 2)],
            BLACK.filled(),
        ))?;
    }

    if let Some(best) = &snapshot.best_fitness {
        root.draw(&Text::new(
            best.clone(),
            (2, HEIGHT as i32 - 18),
            ("sans-serif", 16).into_font().color(&BLUE),
        ))?;
    }

    Ok(())
}

/// Renders a snapshot into a packed RGB buffer, `WIDTH * HEIGHT * 3` bytes.
pub fn render_rgb(snapshot: &Snapshot) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        draw_snapshot(&root, snapshot)?;
        root.present()?;
    }

    Ok(buffer)
}

pub fn render_png<P: AsRef<Path>>(
    snapshot: &Snapshot,
    output_path: P,
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(output_path.as_ref(), (WIDTH, HEIGHT)).into_drawing_area();
    draw_snapshot(&root, snapshot)?;
    root.present()?;

    println!("Frame saved to {}", output_path.as_ref().display());
    Ok(())
}
