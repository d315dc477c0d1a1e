use crate::math::stats::StatsHelper;
use crate::model::{GeoBounds, GeoPoint};
use ndarray::Array2;

/// Heat intensities in `0..=1`, one per screen cell, row-major from the
/// north-west corner of the viewport.
#[derive(Debug, Clone)]
pub struct DensityGrid {
    cells: Array2<f32>,
    cell_px: f32,
}

/// Screen-space rasterisation parameters.
#[derive(Debug, Clone, Copy)]
pub struct Raster {
    pub cols: usize,
    pub rows: usize,
    pub cell_px: f32,
    pub radius_px: f32,
    pub blur_px: f32,
}

impl DensityGrid {
    /// Spreads each point's normalised weight over a radius/blur falloff and
    /// clamps the accumulated sum to 1.
    pub fn rasterize(
        points: &[GeoPoint],
        bounds: &GeoBounds,
        raster: Raster,
        max_intensity: Option<f64>,
    ) -> Self {
        let mut cells = Array2::<f32>::zeros((raster.rows, raster.cols));
        let cell_px = raster.cell_px.max(1.0);
        let width_px = raster.cols as f32 * cell_px;
        let height_px = raster.rows as f32 * cell_px;

        let max = max_intensity
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or_else(|| StatsHelper::max_finite(points.iter().map(|p| p.abundance)));
        if max <= 0.0 || raster.cols == 0 || raster.rows == 0 {
            return Self { cells, cell_px };
        }

        let core = (raster.radius_px - raster.blur_px).max(0.0);
        let outer = (raster.radius_px + raster.blur_px).max(core + f32::EPSILON);
        let reach = (outer / cell_px).ceil() as isize;

        for point in points.iter().filter(|p| p.is_plottable()) {
            let weight = (point.abundance / max).min(1.0) as f32;
            if weight <= 0.0 {
                continue;
            }
            let (nx, ny) = bounds.normalize(point.lat, point.lng);
            let px = nx as f32 * width_px;
            let py = ny as f32 * height_px;
            // Beyond the kernel's reach of the raster.
            if !(-outer..=width_px + outer).contains(&px)
                || !(-outer..=height_px + outer).contains(&py)
            {
                continue;
            }
            let center_col = (px / cell_px).floor() as isize;
            let center_row = (py / cell_px).floor() as isize;

            for row in (center_row - reach)..=(center_row + reach) {
                if row < 0 || row >= raster.rows as isize {
                    continue;
                }
                for col in (center_col - reach)..=(center_col + reach) {
                    if col < 0 || col >= raster.cols as isize {
                        continue;
                    }
                    let cx = (col as f32 + 0.5) * cell_px;
                    let cy = (row as f32 + 0.5) * cell_px;
                    let distance = ((cx - px).powi(2) + (cy - py).powi(2)).sqrt();
                    let falloff = if distance <= core {
                        1.0
                    } else if distance >= outer {
                        0.0
                    } else {
                        1.0 - (distance - core) / (outer - core)
                    };
                    cells[[row as usize, col as usize]] += weight * falloff;
                }
            }
        }

        cells.mapv_inplace(|value| value.min(1.0));
        Self { cells, cell_px }
    }

    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    pub fn cell_px(&self) -> f32 {
        self.cell_px
    }

    pub fn intensity(&self, row: usize, col: usize) -> f32 {
        self.cells.get([row, col]).copied().unwrap_or(0.0)
    }

    pub fn peak(&self) -> f32 {
        self.cells.iter().copied().fold(0.0, f32::max)
    }

    /// Non-zero cells as `(row, col, intensity)`.
    pub fn hot_cells(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.cells
            .indexed_iter()
            .filter(|(_, value)| **value > 0.0)
            .map(|((row, col), value)| (row, col, *value))
    }
}
