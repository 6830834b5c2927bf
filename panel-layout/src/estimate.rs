//! Wire contract of the remote roof estimation.
//!
//! The estimator answers in one of two shapes depending on the requested
//! [`AnalysisMode`]. Its panel count is authoritative; the local grid only
//! decides where the counted panels are drawn.

use crate::error::Result;
use crate::geometry::{ObstacleBox, PixelPoint};
use crate::zones::{parse_grid_size, GridDescriptor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Aggregate maximum panel count for the whole roof.
    PanelCount,
    /// Per-cell usable area plus obstacle and zone bounding boxes.
    ZoneDetection,
}

/// Whether the estimator recognised a rooftop, reported as `"Yes"` / `"No"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RooftopDetection {
    Yes,
    No,
}

impl Serialize for RooftopDetection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Self::Yes => "Yes",
            Self::No => "No",
        })
    }
}

impl<'de> Deserialize<'de> for RooftopDetection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Ok(Self::Yes),
            Raw::Flag(false) => Ok(Self::No),
            Raw::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" => Ok(Self::Yes),
                "no" | "false" => Ok(Self::No),
                other => Err(serde::de::Error::custom(format!(
                    "unknown rooftop_detection value {:?}",
                    other
                ))),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelCountEstimate {
    pub rooftop_detection: RooftopDetection,
    #[serde(default, deserialize_with = "count_from_number")]
    pub max_solar_panels: u32,
    #[serde(default)]
    pub note: String,
}

/// Box corners as the estimator reports them; any of them may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: Option<f64>,
    pub y1: Option<f64>,
    pub x2: Option<f64>,
    pub y2: Option<f64>,
}

impl BoundingBox {
    /// `None` when a corner is missing; the box then has nothing to render.
    pub fn to_obstacle_box(&self) -> Option<ObstacleBox> {
        Some(ObstacleBox::new(self.x1?, self.y1?, self.x2?, self.y2?))
    }
}

impl From<ObstacleBox> for BoundingBox {
    fn from(b: ObstacleBox) -> Self {
        Self {
            x1: Some(b.x1),
            y1: Some(b.y1),
            x2: Some(b.x2),
            y2: Some(b.y2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneGridData {
    pub grid_size: String,
    #[serde(default)]
    pub grid_cells: Vec<PixelPoint>,
}

/// Usable area of one cell; the estimator sometimes phrases it as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UsableArea {
    Value(f64),
    Text(String),
}

impl UsableArea {
    /// Numeric value, reading the leading number out of text like `"40000 sq px"`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Value(v) => v.is_finite().then_some(*v),
            Self::Text(text) => {
                let numeric: String = text
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                numeric.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellArea {
    pub cell_coordinates: PixelPoint,
    pub estimated_usable_area: UsableArea,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceAreas {
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub grid_cell_areas: Vec<CellArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelZone {
    #[serde(default)]
    pub area_description: String,
    #[serde(default)]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleReport {
    #[serde(default)]
    pub obstacle_type: String,
    #[serde(default)]
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEstimate {
    pub rooftop_detection: RooftopDetection,
    pub grid_data: ZoneGridData,
    #[serde(default)]
    pub surface_areas: SurfaceAreas,
    #[serde(default)]
    pub potential_solar_panel_areas: Vec<PanelZone>,
    #[serde(default)]
    pub obstacle_coordinates: Vec<ObstacleReport>,
}

impl ZoneEstimate {
    /// Rebuild the cell grid the estimator answered for.
    pub fn grid_descriptor(&self) -> Result<GridDescriptor> {
        let (width, height) = parse_grid_size(&self.grid_data.grid_size)?;
        GridDescriptor::new(width, height, self.grid_data.grid_cells.clone())
    }

    /// Obstacles with all four corners present.
    pub fn obstacle_boxes(&self) -> Vec<ObstacleBox> {
        self.obstacle_coordinates
            .iter()
            .filter_map(|o| o.bounding_box.to_obstacle_box())
            .collect()
    }

    pub fn usable_area_at(&self, origin: PixelPoint) -> Option<f64> {
        const EPSILON: f64 = 1e-6;
        self.surface_areas
            .grid_cell_areas
            .iter()
            .find(|a| {
                (a.cell_coordinates.x - origin.x).abs() < EPSILON
                    && (a.cell_coordinates.y - origin.y).abs() < EPSILON
            })
            .and_then(|a| a.estimated_usable_area.as_f64())
    }

    /// Sum of the reported usable area over the grid cells, with how many cells had a value.
    pub fn total_usable_area(&self) -> (f64, usize) {
        self.grid_data
            .grid_cells
            .iter()
            .filter_map(|&cell| self.usable_area_at(cell))
            .fold((0.0, 0), |(sum, count), area| (sum + area, count + 1))
    }
}

/// Structured result of one estimation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Estimation {
    ZoneDetection(ZoneEstimate),
    PanelCount(PanelCountEstimate),
}

impl Estimation {
    /// Decode a reply for a known mode, so a missing field surfaces as an error
    /// instead of silently matching the other shape.
    pub fn from_value(
        mode: AnalysisMode,
        value: serde_json::Value,
    ) -> std::result::Result<Self, serde_json::Error> {
        match mode {
            AnalysisMode::PanelCount => serde_json::from_value(value).map(Self::PanelCount),
            AnalysisMode::ZoneDetection => serde_json::from_value(value).map(Self::ZoneDetection),
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        match self {
            Self::PanelCount(_) => AnalysisMode::PanelCount,
            Self::ZoneDetection(_) => AnalysisMode::ZoneDetection,
        }
    }

    pub fn is_rooftop(&self) -> bool {
        let detection = match self {
            Self::PanelCount(e) => e.rooftop_detection,
            Self::ZoneDetection(e) => e.rooftop_detection,
        };
        detection == RooftopDetection::Yes
    }

    /// Service-reported panel count used to cap the local grid.
    pub fn panel_cap(&self) -> Option<u32> {
        match self {
            Self::PanelCount(e) => Some(e.max_solar_panels),
            Self::ZoneDetection(_) => None,
        }
    }
}

fn count_from_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value.floor().min(f64::from(u32::MAX)) as u32)
    } else {
        Err(serde::de::Error::custom(format!(
            "panel count must be a non-negative number, got {}",
            value
        )))
    }
}
