//! Fixed-footprint grid packing of panels inside a rectangular roof.
//!
//! Coordinates are scene-plane coordinates centered on the roof: `x` grows to
//! the right and `z` grows towards the top edge, so row 0 is the top row.

use crate::geometry::{PanelSpec, RoofArea};
use serde::Serialize;
use tracing::debug;

/// One emitted panel slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelPlacement {
    pub row: u32,
    pub column: u32,
    pub center_x: f64,
    pub center_z: f64,
}

/// Surplus roof space around the packed block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Maximal grid of identical panels that fits a roof.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub roof: RoofArea,
    pub panel: PanelSpec,
    pub columns: u32,
    pub rows: u32,
}

impl GridLayout {
    /// Largest `n` per axis with `n * panel + (n - 1) * gap <= available`.
    pub fn compute(roof: RoofArea, panel: PanelSpec) -> Self {
        let columns = fit_count(roof.width(), panel.width(), panel.gap());
        let rows = fit_count(roof.height(), panel.height(), panel.gap());
        debug!(columns, rows, "computed panel grid");
        Self {
            roof,
            panel,
            columns,
            rows,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }

    pub fn total_width(&self) -> f64 {
        span(self.columns, self.panel.width(), self.panel.gap())
    }

    pub fn total_height(&self) -> f64 {
        span(self.rows, self.panel.height(), self.panel.gap())
    }

    pub fn start_x(&self) -> f64 {
        -self.total_width() / 2.0 + self.panel.width() / 2.0
    }

    pub fn start_z(&self) -> f64 {
        self.total_height() / 2.0 - self.panel.height() / 2.0
    }

    pub fn margins(&self) -> Margins {
        let horizontal = (self.roof.width() - self.total_width()) / 2.0;
        let vertical = (self.roof.height() - self.total_height()) / 2.0;
        Margins {
            left: horizontal,
            right: horizontal,
            top: vertical,
            bottom: vertical,
        }
    }

    /// Row-major placements, truncated to `cap` when one is given.
    ///
    /// A cap larger than [`GridLayout::capacity`] never adds panels.
    pub fn placements(&self, cap: Option<u32>) -> Vec<PanelPlacement> {
        let limit = cap.map_or(self.capacity(), |c| c.min(self.capacity()));
        let pitch_x = self.panel.width() + self.panel.gap();
        let pitch_z = self.panel.height() + self.panel.gap();
        let (start_x, start_z) = (self.start_x(), self.start_z());

        (0..self.rows)
            .flat_map(|row| (0..self.columns).map(move |column| (row, column)))
            .take(limit as usize)
            .map(|(row, column)| PanelPlacement {
                row,
                column,
                center_x: start_x + f64::from(column) * pitch_x,
                center_z: start_z - f64::from(row) * pitch_z,
            })
            .collect()
    }
}

fn fit_count(available: f64, size: f64, gap: f64) -> u32 {
    let count = ((available + gap) / (size + gap)).floor();
    if count.is_finite() && count > 0.0 {
        count.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

fn span(count: u32, size: f64, gap: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    f64::from(count) * size + f64::from(count - 1) * gap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: f64, height: f64, panel: f64, gap: f64) -> GridLayout {
        GridLayout::compute(
            RoofArea::new(width, height).unwrap(),
            PanelSpec::new(panel, panel, gap).unwrap(),
        )
    }

    #[test]
    fn test_full_grid_without_cap() {
        let grid = layout(2000.0, 1000.0, 500.0, 0.0);

        assert_eq!(grid.columns, 4);
        assert_eq!(grid.rows, 2);
        assert_eq!(grid.placements(None).len(), 8);
    }

    #[test]
    fn test_cap_truncates_in_row_major_order() {
        let grid = layout(2000.0, 1000.0, 500.0, 0.0);
        let placements = grid.placements(Some(3));

        assert_eq!(placements.len(), 3);
        let cells: Vec<(u32, u32)> = placements.iter().map(|p| (p.row, p.column)).collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(placements[0].center_x, -750.0);
        assert_eq!(placements[0].center_z, 250.0);
    }

    #[test]
    fn test_cap_never_extends_capacity() {
        let grid = layout(2000.0, 1000.0, 500.0, 0.0);

        assert_eq!(grid.placements(Some(500)).len(), 8);
        assert_eq!(grid.placements(Some(0)).len(), 0);
    }

    #[test]
    fn test_roof_smaller_than_panel_has_no_capacity() {
        let grid = layout(400.0, 400.0, 500.0, 0.0);

        assert_eq!(grid.columns, 0);
        assert_eq!(grid.rows, 0);
        assert_eq!(grid.capacity(), 0);
        assert!(grid.placements(None).is_empty());
        assert_eq!(grid.total_width(), 0.0);
    }

    #[test]
    fn test_last_column_needs_no_trailing_gap() {
        // 3 * 100 + 2 * 10 = 320 fits exactly.
        let grid = layout(320.0, 100.0, 100.0, 10.0);
        assert_eq!(grid.columns, 3);

        let tighter = layout(319.0, 100.0, 100.0, 10.0);
        assert_eq!(tighter.columns, 2);
    }

    #[test]
    fn test_columns_and_rows_are_maximal() {
        let cases = [
            (2000.0, 1000.0, 500.0, 0.0),
            (1234.5, 987.0, 150.0, 10.0),
            (5000.0, 3000.0, 160.0, 7.5),
            (151.0, 149.0, 150.0, 10.0),
            (10_000.0, 42.0, 41.0, 0.5),
        ];

        for (width, height, size, gap) in cases {
            let grid = layout(width, height, size, gap);
            let pitch = size + gap;
            let cols = f64::from(grid.columns);
            let rows = f64::from(grid.rows);

            assert!(cols * pitch - gap <= width + 1e-9);
            assert!((cols + 1.0) * pitch - gap > width);
            assert!(rows * pitch - gap <= height + 1e-9);
            assert!((rows + 1.0) * pitch - gap > height);
        }
    }

    #[test]
    fn test_grid_is_centered() {
        let grid = layout(1234.5, 987.0, 150.0, 10.0);
        let margins = grid.margins();

        assert!((margins.left + margins.right - (1234.5 - grid.total_width())).abs() < 1e-9);
        assert!((margins.left - margins.right).abs() < 1e-9);

        let placements = grid.placements(None);
        let leftmost = placements.iter().map(|p| p.center_x).fold(f64::INFINITY, f64::min);
        let rightmost = placements.iter().map(|p| p.center_x).fold(f64::NEG_INFINITY, f64::max);
        let left_edge = -1234.5 / 2.0;
        let right_edge = 1234.5 / 2.0;
        let left_margin = (leftmost - 75.0) - left_edge;
        let right_margin = right_edge - (rightmost + 75.0);
        assert!((left_margin - right_margin).abs() < 1e-9);
        assert!((left_margin - margins.left).abs() < 1e-9);
    }

    #[test]
    fn test_placements_do_not_overlap() {
        let grid = layout(1000.0, 800.0, 150.0, 10.0);
        let placements = grid.placements(Some(17));

        assert!(placements.len() <= 17.min(grid.capacity() as usize));
        for (i, a) in placements.iter().enumerate() {
            for b in &placements[i + 1..] {
                let dx = (a.center_x - b.center_x).abs();
                let dz = (a.center_z - b.center_z).abs();
                assert!(
                    dx >= 150.0 - 1e-9 || dz >= 150.0 - 1e-9,
                    "panels ({}, {}) and ({}, {}) overlap",
                    a.row,
                    a.column,
                    b.row,
                    b.column
                );
            }
        }
    }

    #[test]
    fn test_placements_stay_inside_roof() {
        let grid = layout(1000.0, 800.0, 150.0, 10.0);

        for p in grid.placements(None) {
            assert!(p.center_x - 75.0 >= -500.0 - 1e-9);
            assert!(p.center_x + 75.0 <= 500.0 + 1e-9);
            assert!(p.center_z - 75.0 >= -400.0 - 1e-9);
            assert!(p.center_z + 75.0 <= 400.0 + 1e-9);
        }
    }
}
