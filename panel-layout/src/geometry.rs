use crate::error::{ensure_positive, LayoutError, Result};
use serde::{Deserialize, Serialize};

/// Usable roof rectangle in roof pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoofArea {
    width: f64,
    height: f64,
}

impl RoofArea {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        Ok(Self {
            width: ensure_positive("roof width", width)?,
            height: ensure_positive("roof height", height)?,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Footprint of one installable panel plus the gap kept between neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelSpec {
    width: f64,
    height: f64,
    gap: f64,
}

impl PanelSpec {
    /// 1.5 m square panels with a 0.1 m gap at [`crate::DEFAULT_PIXELS_PER_METER`].
    pub const CANONICAL: PanelSpec = PanelSpec {
        width: 150.0,
        height: 150.0,
        gap: 10.0,
    };

    pub fn new(width: f64, height: f64, gap: f64) -> Result<Self> {
        if !gap.is_finite() || gap < 0.0 {
            return Err(LayoutError::NegativeGap(gap));
        }
        Ok(Self {
            width: ensure_positive("panel width", width)?,
            height: ensure_positive("panel height", height)?,
            gap,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn gap(&self) -> f64 {
        self.gap
    }
}

impl Default for PanelSpec {
    fn default() -> Self {
        Self::CANONICAL
    }
}

/// Point in roof pixel space (x to the right, y downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned box in roof pixel space, as reported by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl ObstacleBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Finite corners with `x1 < x2` and `y1 < y2`.
    pub fn is_well_formed(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 < self.x2
            && self.y1 < self.y2
    }

    /// Inclusive on every edge: a point on the boundary is inside.
    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roof_area_rejects_non_positive() {
        assert!(RoofArea::new(0.0, 10.0).is_err());
        assert!(RoofArea::new(10.0, -1.0).is_err());
        assert!(RoofArea::new(f64::NAN, 10.0).is_err());
        assert!(RoofArea::new(f64::INFINITY, 10.0).is_err());
        assert!(RoofArea::new(12.5, 0.25).is_ok());
    }

    #[test]
    fn test_panel_spec_validation() {
        assert!(PanelSpec::new(150.0, 150.0, 0.0).is_ok());
        assert_eq!(
            PanelSpec::new(150.0, 150.0, -1.0),
            Err(LayoutError::NegativeGap(-1.0))
        );
        assert!(matches!(
            PanelSpec::new(0.0, 150.0, 10.0),
            Err(LayoutError::NonPositive { field: "panel width", .. })
        ));
    }

    #[test]
    fn test_obstacle_contains_is_inclusive() {
        let obstacle = ObstacleBox::new(0.0, 0.0, 100.0, 100.0);

        assert!(obstacle.contains(PixelPoint::new(50.0, 50.0)));
        assert!(obstacle.contains(PixelPoint::new(100.0, 50.0)));
        assert!(obstacle.contains(PixelPoint::new(0.0, 0.0)));
        assert!(!obstacle.contains(PixelPoint::new(100.000_001, 50.0)));
        assert!(!obstacle.contains(PixelPoint::new(150.0, 150.0)));
    }

    #[test]
    fn test_malformed_obstacle() {
        assert!(ObstacleBox::new(0.0, 0.0, 10.0, 10.0).is_well_formed());
        assert!(!ObstacleBox::new(10.0, 0.0, 0.0, 10.0).is_well_formed());
        assert!(!ObstacleBox::new(0.0, 0.0, 0.0, 10.0).is_well_formed());
        assert!(!ObstacleBox::new(0.0, f64::NAN, 10.0, 10.0).is_well_formed());
    }
}
