//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - residual scatter: `o` points over a `-` zero line
//! - histograms: `#` bars, one column per bin

use crate::report::PredictionPoint;

/// Residual-vs-predicted scatter for the held-out evaluation.
pub fn render_residual_scatter(points: &[PredictionPoint], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    if points.is_empty() {
        return "Residual plot: (no points)\n".to_string();
    }

    let (x_min, x_max) = pad_range(min_max(points.iter().map(|p| p.predicted)), 0.05);
    let (y_min, y_max) = pad_range(min_max(points.iter().map(|p| p.residual)), 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Zero-residual line first (so points can overlay).
    if y_min < 0.0 && y_max > 0.0 {
        let zero_row = map_y(0.0, y_min, y_max, height);
        for cell in &mut grid[zero_row] {
            *cell = '-';
        }
    }

    for p in points {
        let x = map_x(p.predicted, x_min, x_max, width);
        let y = map_y(p.residual, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Residuals vs predicted: x=[{x_min:.1}, {x_max:.1}] | residual=[{y_min:.1}, {y_max:.1}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Fixed-bin histogram, one column per bin.
pub fn render_histogram(values: &[f64], width: usize, height: usize, title: &str) -> String {
    let width = width.max(10);
    let height = height.max(5);

    if values.is_empty() {
        return format!("{title}: (no values)\n");
    }

    let (v_min, v_max) = pad_range(min_max(values.iter().copied()), 0.0);
    let mut counts = vec![0usize; width];
    for &v in values {
        counts[map_x(v, v_min, v_max, width)] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(1).max(1);

    let mut out = String::new();
    out.push_str(&format!(
        "{title}: range=[{v_min:.1}, {v_max:.1}] | n={} | peak bin={max_count}\n",
        values.len()
    ));

    for row in 0..height {
        // Top row is the tallest; a bin paints '#' once its share of the
        // peak reaches this row.
        let threshold = (height - row) as f64 / height as f64;
        let line: String = counts
            .iter()
            .map(|&c| {
                if c > 0 && c as f64 / max_count as f64 >= threshold {
                    '#'
                } else {
                    ' '
                }
            })
            .collect();
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

fn pad_range((min, max): (f64, f64), pct: f64) -> (f64, f64) {
    if !(min.is_finite() && max.is_finite()) {
        return (0.0, 1.0);
    }
    if max > min {
        let pad = (max - min) * pct;
        (min - pad, max + pad)
    } else {
        (min - 0.5, max + 0.5)
    }
}

fn map_x(v: f64, min: f64, max: f64, width: usize) -> usize {
    let t = ((v - min) / (max - min)).clamp(0.0, 1.0);
    ((t * (width - 1) as f64).round() as usize).min(width - 1)
}

fn map_y(v: f64, min: f64, max: f64, height: usize) -> usize {
    let t = ((v - min) / (max - min)).clamp(0.0, 1.0);
    // Row 0 is the top of the grid.
    let row = ((1.0 - t) * (height - 1) as f64).round() as usize;
    row.min(height - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<PredictionPoint> {
        vec![
            PredictionPoint {
                predicted: 10.0,
                actual: 12.0,
                residual: 2.0,
            },
            PredictionPoint {
                predicted: 20.0,
                actual: 18.0,
                residual: -2.0,
            },
            PredictionPoint {
                predicted: 30.0,
                actual: 30.5,
                residual: 0.5,
            },
        ]
    }

    #[test]
    fn scatter_has_requested_dimensions() {
        let plot = render_residual_scatter(&points(), 40, 10);
        let lines: Vec<&str> = plot.lines().collect();
        assert_eq!(lines.len(), 11); // header + grid
        assert!(lines[1..].iter().all(|l| l.chars().count() == 40));
        assert_eq!(plot.matches('o').count(), 3);
    }

    #[test]
    fn scatter_draws_zero_line() {
        let plot = render_residual_scatter(&points(), 40, 10);
        assert!(plot.contains('-'));
    }

    #[test]
    fn scatter_output_is_deterministic() {
        assert_eq!(
            render_residual_scatter(&points(), 40, 10),
            render_residual_scatter(&points(), 40, 10)
        );
    }

    #[test]
    fn histogram_counts_every_value() {
        let values = [1.0, 1.1, 5.0, 9.9, 10.0];
        let plot = render_histogram(&values, 20, 8, "Test");
        assert!(plot.starts_with("Test:"));
        assert!(plot.contains("n=5"));
        assert!(plot.contains('#'));
    }

    #[test]
    fn empty_inputs_do_not_panic() {
        assert!(render_residual_scatter(&[], 40, 10).contains("no points"));
        assert!(render_histogram(&[], 40, 10, "T").contains("no values"));
    }
}
