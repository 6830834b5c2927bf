//! Renderer-independent 3-D scene built from a layout.
//!
//! A [`Scene`] is rebuilt from scratch for every analysis or style change and
//! handed to a [`SceneRenderer`] by reference; nothing mutates it afterwards.
//! The roof lies in the `y = 0` plane, centered on the origin, with `x` to the
//! right and `z` towards the top edge of the image.

use crate::error::Result;
use crate::estimate::{Estimation, ZoneEstimate};
use crate::geometry::{ObstacleBox, PanelSpec, PixelPoint, RoofArea};
use crate::packing::GridLayout;
use crate::zones::classify_cells;
use nalgebra::{Point3, Vector2};
use tracing::{debug, warn};

/// Height of panel meshes above the roof plane.
pub const PANEL_ELEVATION: f64 = 1.0;
/// Height of overlay rectangles above the roof plane.
pub const OVERLAY_ELEVATION: f64 = 0.5;

/// 24-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub fn to_css(&self) -> String {
        format!("#{:06x}", self.0 & 0x00ff_ffff)
    }

    /// Parse `#rrggbb` (as produced by an `<input type="color">`).
    pub fn from_css(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Color)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneStyle {
    pub background: Color,
    pub roof: Color,
    pub panel: Color,
    pub obstacle: Color,
    pub zone: Color,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            background: Color(0xffffff),
            roof: Color(0xcccccc),
            panel: Color(0x1e90ff),
            obstacle: Color(0xe74c3c),
            zone: Color(0x2ecc71),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelMesh {
    pub center: Point3<f64>,
    /// Width along `x`, depth along `z`.
    pub footprint: Vector2<f64>,
}

impl PanelMesh {
    fn is_renderable(&self) -> bool {
        self.center.iter().all(|v| v.is_finite())
            && self.footprint.iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Obstacle,
    PanelZone,
}

/// Flat rectangle drawn over the roof to mark an obstacle or a suggested zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub label: String,
    pub center: Point3<f64>,
    pub extents: Vector2<f64>,
}

impl Overlay {
    fn is_renderable(&self) -> bool {
        self.center.iter().all(|v| v.is_finite())
            && self.extents.iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Orthographic camera looking straight down on the roof.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub near: f64,
    pub far: f64,
    pub position: Point3<f64>,
    pub target: Point3<f64>,
}

impl Camera {
    pub fn top_down(roof: RoofArea) -> Self {
        let height = roof.width().max(roof.height());
        Self {
            left: -roof.width() / 2.0,
            right: roof.width() / 2.0,
            top: roof.height() / 2.0,
            bottom: -roof.height() / 2.0,
            near: 1.0,
            far: height * 2.0,
            position: Point3::new(0.0, height, 0.0),
            target: Point3::origin(),
        }
    }

    pub fn frustum_width(&self) -> f64 {
        self.right - self.left
    }

    pub fn frustum_height(&self) -> f64 {
        self.top - self.bottom
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    roof: RoofArea,
    panels: Vec<PanelMesh>,
    overlays: Vec<Overlay>,
    camera: Camera,
    style: SceneStyle,
}

impl Scene {
    pub fn from_parts(
        roof: RoofArea,
        panels: Vec<PanelMesh>,
        overlays: Vec<Overlay>,
        style: SceneStyle,
    ) -> Self {
        Self {
            roof,
            panels,
            overlays,
            camera: Camera::top_down(roof),
            style,
        }
    }

    /// Bare roof with nothing placed on it.
    pub fn empty(roof: RoofArea, style: SceneStyle) -> Self {
        Self::from_parts(roof, Vec::new(), Vec::new(), style)
    }

    /// Fixed-footprint packing, truncated to the service-reported `cap`.
    pub fn from_grid(roof: RoofArea, panel: PanelSpec, cap: Option<u32>, style: SceneStyle) -> Self {
        let layout = GridLayout::compute(roof, panel);
        let footprint = Vector2::new(panel.width(), panel.height());
        let panels: Vec<PanelMesh> = layout
            .placements(cap)
            .into_iter()
            .map(|p| PanelMesh {
                center: Point3::new(p.center_x, PANEL_ELEVATION, p.center_z),
                footprint,
            })
            .collect();

        debug!(
            capacity = layout.capacity(),
            cap = ?cap,
            placed = panels.len(),
            "built grid scene"
        );
        Self::from_parts(roof, panels, Vec::new(), style)
    }

    /// One panel per unobstructed cell, plus obstacle and zone overlays.
    pub fn from_zones(roof: RoofArea, estimate: &ZoneEstimate, style: SceneStyle) -> Result<Self> {
        let grid = estimate.grid_descriptor()?;
        let obstacles = estimate.obstacle_boxes();
        let footprint = Vector2::new(grid.cell_width, grid.cell_height);

        let panels: Vec<PanelMesh> = classify_cells(&grid, &obstacles)
            .into_iter()
            .filter(|verdict| verdict.is_placeable())
            .map(|verdict| {
                let (x, z) = pixel_to_scene(roof, verdict.center);
                PanelMesh {
                    center: Point3::new(x, PANEL_ELEVATION, z),
                    footprint,
                }
            })
            .collect();

        let obstacle_overlays = estimate.obstacle_coordinates.iter().filter_map(|report| {
            let Some(b) = report.bounding_box.to_obstacle_box() else {
                debug!(obstacle_type = %report.obstacle_type, "obstacle without complete box");
                return None;
            };
            Some(overlay(roof, OverlayKind::Obstacle, &report.obstacle_type, &b))
        });
        let zone_overlays = estimate.potential_solar_panel_areas.iter().filter_map(|zone| {
            let b = zone.bounding_box.to_obstacle_box()?;
            Some(overlay(roof, OverlayKind::PanelZone, &zone.area_description, &b))
        });
        let overlays = obstacle_overlays.chain(zone_overlays).collect();

        Ok(Self::from_parts(roof, panels, overlays, style))
    }

    /// Build whichever scene the estimation calls for; a non-rooftop yields a bare roof.
    pub fn from_estimation(
        roof: RoofArea,
        panel: PanelSpec,
        estimation: &Estimation,
        style: SceneStyle,
    ) -> Result<Self> {
        if !estimation.is_rooftop() {
            return Ok(Self::empty(roof, style));
        }
        match estimation {
            Estimation::PanelCount(e) => Ok(Self::from_grid(roof, panel, Some(e.max_solar_panels), style)),
            Estimation::ZoneDetection(e) => Self::from_zones(roof, e, style),
        }
    }

    /// Same geometry under a different style.
    pub fn with_style(&self, style: SceneStyle) -> Self {
        Self {
            style,
            ..self.clone()
        }
    }

    pub fn roof(&self) -> RoofArea {
        self.roof
    }

    pub fn panels(&self) -> &[PanelMesh] {
        &self.panels
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn style(&self) -> &SceneStyle {
        &self.style
    }

    /// Panels with finite geometry; every skipped panel is logged.
    pub fn renderable_panels(&self) -> impl Iterator<Item = &PanelMesh> + '_ {
        self.panels.iter().enumerate().filter_map(|(idx, panel)| {
            if panel.is_renderable() {
                Some(panel)
            } else {
                warn!(index = idx, ?panel, "skipping malformed panel");
                None
            }
        })
    }

    /// Overlays with finite geometry and positive extents; skipped ones are logged.
    pub fn renderable_overlays(&self) -> impl Iterator<Item = &Overlay> + '_ {
        self.overlays.iter().enumerate().filter_map(|(idx, overlay)| {
            if overlay.is_renderable() {
                Some(overlay)
            } else {
                warn!(index = idx, label = %overlay.label, "skipping malformed overlay");
                None
            }
        })
    }
}

/// Consumer of finished scenes.
pub trait SceneRenderer {
    fn draw(&mut self, scene: &Scene);
}

/// Map a roof pixel (origin top-left, y down) onto the scene plane.
pub fn pixel_to_scene(roof: RoofArea, point: PixelPoint) -> (f64, f64) {
    (point.x - roof.width() / 2.0, roof.height() / 2.0 - point.y)
}

fn overlay(roof: RoofArea, kind: OverlayKind, label: &str, b: &ObstacleBox) -> Overlay {
    let (x, z) = pixel_to_scene(roof, b.center());
    Overlay {
        kind,
        label: label.to_string(),
        center: Point3::new(x, OVERLAY_ELEVATION, z),
        extents: Vector2::new(b.width(), b.height()),
    }
}
