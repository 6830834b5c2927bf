//! Roof panel layout: dimension normalization, grid packing, obstacle-aware
//! cell filtering and the scene handed to renderers.

pub mod error;
pub mod estimate;
pub mod geometry;
pub mod packing;
pub mod scene;
pub mod session;
pub mod units;
pub mod zones;

pub use error::LayoutError;
pub use estimate::{AnalysisMode, Estimation, PanelCountEstimate, RooftopDetection, ZoneEstimate};
pub use geometry::{ObstacleBox, PanelSpec, PixelPoint, RoofArea};
pub use packing::{GridLayout, PanelPlacement};
pub use scene::{Scene, SceneRenderer, SceneStyle};
pub use session::{AnalysisPhase, Session};
pub use units::{PixelScale, DEFAULT_PIXELS_PER_METER};
pub use zones::{classify_cells, CellVerdict, GridDescriptor};

/// Cell size used when the planner asks for zone detection.
pub const DEFAULT_ZONE_CELL_SIZE: f64 = 200.0;
