//! Zone-detection grids and obstacle-aware cell filtering.
//!
//! Cells are identified by their top-left origin in roof pixel space, the
//! same space the obstacle boxes are reported in. Grids expressed as
//! column/row indices go through [`GridDescriptor::from_indices`], which
//! is the only place indices are turned into pixels.

use crate::error::{ensure_positive, LayoutError, Result};
use crate::geometry::{ObstacleBox, PixelPoint, RoofArea};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Upper bound on cells accepted in one descriptor.
pub const MAX_GRID_CELLS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDescriptor {
    pub cell_width: f64,
    pub cell_height: f64,
    pub cells: Vec<PixelPoint>,
}

impl GridDescriptor {
    pub fn new(cell_width: f64, cell_height: f64, cells: Vec<PixelPoint>) -> Result<Self> {
        let descriptor = Self {
            cell_width,
            cell_height,
            cells,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Row-major grid of whole cells laid over the roof from its top-left corner.
    pub fn covering(roof: RoofArea, cell_width: f64, cell_height: f64) -> Result<Self> {
        ensure_positive("cell width", cell_width)?;
        ensure_positive("cell height", cell_height)?;
        let columns = whole_cells(roof.width(), cell_width)?;
        let rows = whole_cells(roof.height(), cell_height)?;
        match columns.checked_mul(rows) {
            Some(total) if total as usize <= MAX_GRID_CELLS => {}
            _ => {
                return Err(LayoutError::InvalidGrid(format!(
                    "{}x{} cells exceeds the limit of {}",
                    columns, rows, MAX_GRID_CELLS
                )))
            }
        }

        let indices: Vec<(u32, u32)> = (0..rows)
            .flat_map(|row| (0..columns).map(move |column| (column, row)))
            .collect();
        Self::from_indices(cell_width, cell_height, &indices)
    }

    /// Convert `(column, row)` indices to pixel origins: `origin = index * cell size`.
    pub fn from_indices(cell_width: f64, cell_height: f64, indices: &[(u32, u32)]) -> Result<Self> {
        let cells = indices
            .iter()
            .map(|&(column, row)| {
                PixelPoint::new(f64::from(column) * cell_width, f64::from(row) * cell_height)
            })
            .collect();
        Self::new(cell_width, cell_height, cells)
    }

    /// Parse and validate a JSON-encoded descriptor (the `gridData` form field).
    pub fn from_json(raw: &str) -> Result<Self> {
        let descriptor: GridDescriptor = serde_json::from_str(raw)
            .map_err(|e| LayoutError::InvalidGrid(e.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("cell width", self.cell_width)?;
        ensure_positive("cell height", self.cell_height)?;
        if self.cells.len() > MAX_GRID_CELLS {
            return Err(LayoutError::InvalidGrid(format!(
                "too many cells: {} > {}",
                self.cells.len(),
                MAX_GRID_CELLS
            )));
        }
        if let Some(idx) = self.cells.iter().position(|c| !c.is_finite()) {
            return Err(LayoutError::InvalidGrid(format!(
                "cell {} has a non-finite origin",
                idx
            )));
        }
        Ok(())
    }

    pub fn cell_center(&self, origin: PixelPoint) -> PixelPoint {
        PixelPoint::new(
            origin.x + self.cell_width / 2.0,
            origin.y + self.cell_height / 2.0,
        )
    }

    /// Textual size in the form the estimator reports it, e.g. `"200x200 pixels"`.
    pub fn size_label(&self) -> String {
        format!("{}x{} pixels", self.cell_width, self.cell_height)
    }
}

/// Whole cells of `cell` that fit along `extent`, rejecting counts beyond `u32`.
fn whole_cells(extent: f64, cell: f64) -> Result<u32> {
    let count = (extent / cell).floor();
    if !count.is_finite() || count < 0.0 || count > f64::from(u32::MAX) {
        return Err(LayoutError::InvalidGrid(format!(
            "cannot fit {} px cells along {} px",
            cell, extent
        )));
    }
    Ok(count as u32)
}

/// Parse a cell size such as `"200x200 pixels"` or `"150 X 100"`.
pub fn parse_grid_size(raw: &str) -> Result<(f64, f64)> {
    let invalid = || LayoutError::InvalidGridSize(raw.to_string());
    let lowered = raw.trim().to_ascii_lowercase();
    let dims = lowered
        .strip_suffix("pixels")
        .or_else(|| lowered.strip_suffix("px"))
        .unwrap_or(&lowered)
        .trim();

    let (w, h) = dims.split_once('x').ok_or_else(invalid)?;
    let width: f64 = w.trim().parse().map_err(|_| invalid())?;
    let height: f64 = h.trim().parse().map_err(|_| invalid())?;
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok((width, height))
    } else {
        Err(invalid())
    }
}

/// Placement decision for one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellVerdict {
    pub origin: PixelPoint,
    pub center: PixelPoint,
    /// Index of the first obstacle whose box contains the cell center.
    pub blocked_by: Option<usize>,
}

impl CellVerdict {
    pub fn is_placeable(&self) -> bool {
        self.blocked_by.is_none()
    }
}

/// Decide per cell whether a panel may be placed.
///
/// A cell is blocked when its center lies inside (edges included) any
/// well-formed obstacle. Malformed obstacles are skipped.
pub fn classify_cells(grid: &GridDescriptor, obstacles: &[ObstacleBox]) -> Vec<CellVerdict> {
    for (idx, obstacle) in obstacles.iter().enumerate() {
        if !obstacle.is_well_formed() {
            warn!(index = idx, ?obstacle, "ignoring malformed obstacle box");
        }
    }

    grid.cells
        .iter()
        .map(|&origin| {
            let center = grid.cell_center(origin);
            let blocked_by = obstacles
                .iter()
                .position(|o| o.is_well_formed() && o.contains(center));
            CellVerdict {
                origin,
                center,
                blocked_by,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_cell(center_x: f64, center_y: f64) -> GridDescriptor {
        GridDescriptor::new(
            100.0,
            100.0,
            vec![PixelPoint::new(center_x - 50.0, center_y - 50.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_cell_inside_obstacle_is_blocked() {
        let obstacles = [ObstacleBox::new(0.0, 0.0, 100.0, 100.0)];

        let inside = classify_cells(&single_cell(50.0, 50.0), &obstacles);
        assert_eq!(inside[0].blocked_by, Some(0));
        assert!(!inside[0].is_placeable());

        let outside = classify_cells(&single_cell(150.0, 150.0), &obstacles);
        assert!(outside[0].is_placeable());
    }

    #[test]
    fn test_obstacle_boundary_is_inclusive() {
        let obstacles = [ObstacleBox::new(0.0, 0.0, 100.0, 100.0)];

        let on_edge = classify_cells(&single_cell(100.0, 50.0), &obstacles);
        assert!(!on_edge[0].is_placeable(), "center on x2 must be blocked");

        let past_edge = classify_cells(&single_cell(100.5, 50.0), &obstacles);
        assert!(past_edge[0].is_placeable(), "center just past x2 is free");
    }

    #[test]
    fn test_first_blocking_obstacle_is_reported() {
        let obstacles = [
            ObstacleBox::new(500.0, 500.0, 600.0, 600.0),
            ObstacleBox::new(0.0, 0.0, 200.0, 200.0),
            ObstacleBox::new(40.0, 40.0, 60.0, 60.0),
        ];
        let verdicts = classify_cells(&single_cell(50.0, 50.0), &obstacles);

        assert_eq!(verdicts[0].blocked_by, Some(1));
    }

    #[test]
    fn test_malformed_obstacle_never_blocks() {
        let obstacles = [ObstacleBox::new(100.0, 100.0, 0.0, 0.0)];
        let verdicts = classify_cells(&single_cell(50.0, 50.0), &obstacles);

        assert!(verdicts[0].is_placeable());
    }

    #[test]
    fn test_from_indices_scales_to_pixels() {
        let grid = GridDescriptor::from_indices(200.0, 150.0, &[(0, 0), (2, 1)]).unwrap();

        assert_eq!(grid.cells[1], PixelPoint::new(400.0, 150.0));
        assert_eq!(grid.cell_center(grid.cells[1]), PixelPoint::new(500.0, 225.0));
    }

    #[test]
    fn test_covering_uses_whole_cells_row_major() {
        let roof = RoofArea::new(650.0, 420.0).unwrap();
        let grid = GridDescriptor::covering(roof, 200.0, 200.0).unwrap();

        assert_eq!(grid.cells.len(), 6);
        assert_eq!(grid.cells[0], PixelPoint::new(0.0, 0.0));
        assert_eq!(grid.cells[2], PixelPoint::new(400.0, 0.0));
        assert_eq!(grid.cells[3], PixelPoint::new(0.0, 200.0));
    }

    #[test]
    fn test_covering_small_roof_is_empty() {
        let roof = RoofArea::new(150.0, 150.0).unwrap();
        let grid = GridDescriptor::covering(roof, 200.0, 200.0).unwrap();

        assert!(grid.cells.is_empty());
        assert!(classify_cells(&grid, &[]).is_empty());
    }

    #[test]
    fn test_covering_rejects_oversized_grid_up_front() {
        let roof = RoofArea::new(20_000.0, 20_000.0).unwrap();

        assert!(matches!(
            GridDescriptor::covering(roof, 1.0, 1.0),
            Err(LayoutError::InvalidGrid(_))
        ));
        assert!(GridDescriptor::covering(roof, 1e-300, 1e-300).is_err());

        // 100 x 100 = MAX_GRID_CELLS exactly
        let grid = GridDescriptor::covering(RoofArea::new(100.0, 100.0).unwrap(), 1.0, 1.0).unwrap();
        assert_eq!(grid.cells.len(), MAX_GRID_CELLS);
    }

    #[test]
    fn test_from_json_validates() {
        let grid = GridDescriptor::from_json(
            r#"{"cell_width": 200, "cell_height": 200, "cells": [{"x": 0, "y": 0}, {"x": 200, "y": 0}]}"#,
        )
        .unwrap();
        assert_eq!(grid.cells.len(), 2);
        assert_eq!(grid.size_label(), "200x200 pixels");

        assert!(matches!(
            GridDescriptor::from_json("not json"),
            Err(LayoutError::InvalidGrid(_))
        ));
        assert!(GridDescriptor::from_json(r#"{"cell_width": 0, "cell_height": 200, "cells": []}"#).is_err());
    }

    #[test]
    fn test_parse_grid_size() {
        assert_eq!(parse_grid_size("200x200 pixels"), Ok((200.0, 200.0)));
        assert_eq!(parse_grid_size(" 150 X 100 "), Ok((150.0, 100.0)));
        assert_eq!(parse_grid_size("64x32px"), Ok((64.0, 32.0)));
        assert!(parse_grid_size("200 pixels").is_err());
        assert!(parse_grid_size("0x200").is_err());
        assert!(parse_grid_size("axb").is_err());
    }
}
