use panel_layout::scene::{Camera, OverlayKind};
use panel_layout::{Scene, SceneRenderer};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

const PADDING: f64 = 20.0;
const ZOOM_STEP: f64 = 1.1;

/// User zoom and pan applied on top of the fitted view, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewControls {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewControls {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl ViewControls {
    pub const MIN_ZOOM: f64 = 0.25;
    pub const MAX_ZOOM: f64 = 20.0;

    /// One wheel notch around `cursor`; negative `delta_y` zooms in.
    ///
    /// The canvas point under the cursor stays put.
    pub fn zoomed_at(self, delta_y: f64, cursor: (f64, f64), canvas: (f64, f64)) -> Self {
        let factor = if delta_y < 0.0 {
            ZOOM_STEP
        } else if delta_y > 0.0 {
            1.0 / ZOOM_STEP
        } else {
            return self;
        };
        let zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        let ratio = zoom / self.zoom;
        let (cx, cy) = (canvas.0 / 2.0, canvas.1 / 2.0);

        Self {
            zoom,
            pan_x: cursor.0 - cx - ratio * (cursor.0 - cx - self.pan_x),
            pan_y: cursor.1 - cy - ratio * (cursor.1 - cy - self.pan_y),
        }
    }

    pub fn panned(self, dx: f64, dy: f64) -> Self {
        Self {
            pan_x: self.pan_x + dx,
            pan_y: self.pan_y + dy,
            ..self
        }
    }
}

/// Maps the camera frustum onto canvas pixels, preserving aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    left: f64,
    top: f64,
}

impl Viewport {
    /// Fit the frustum inside the padded canvas, then zoom about the canvas
    /// center and pan by `controls`.
    pub fn fit(
        camera: &Camera,
        canvas_width: f64,
        canvas_height: f64,
        controls: ViewControls,
    ) -> Self {
        let scale_x = (canvas_width - 2.0 * PADDING) / camera.frustum_width();
        let scale_y = (canvas_height - 2.0 * PADDING) / camera.frustum_height();
        let fitted = scale_x.min(scale_y).max(0.0);
        let fitted_x = (canvas_width - camera.frustum_width() * fitted) / 2.0;
        let fitted_y = (canvas_height - camera.frustum_height() * fitted) / 2.0;
        let (cx, cy) = (canvas_width / 2.0, canvas_height / 2.0);

        Self {
            scale: fitted * controls.zoom,
            offset_x: cx + controls.zoom * (fitted_x - cx) + controls.pan_x,
            offset_y: cy + controls.zoom * (fitted_y - cy) + controls.pan_y,
            left: camera.left,
            top: camera.top,
        }
    }

    /// Scene plane `(x, z)` to canvas `(x, y)`; `z` grows up, canvas `y` grows down.
    pub fn project(&self, x: f64, z: f64) -> (f64, f64) {
        (
            self.offset_x + (x - self.left) * self.scale,
            self.offset_y + (self.top - z) * self.scale,
        )
    }

    pub fn length(&self, value: f64) -> f64 {
        value * self.scale
    }
}

/// Top-down 2-D rendering of a scene onto an HTML canvas.
pub struct CanvasRenderer {
    context: CanvasRenderingContext2d,
    width: f64,
    height: f64,
    controls: ViewControls,
    drawn_panels: usize,
}

impl CanvasRenderer {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self {
            context,
            width: f64::from(canvas.width()),
            height: f64::from(canvas.height()),
            controls: ViewControls::default(),
            drawn_panels: 0,
        })
    }

    pub fn with_controls(mut self, controls: ViewControls) -> Self {
        self.controls = controls;
        self
    }

    /// Panels drawn by the last call to `draw`.
    pub fn drawn_panels(&self) -> usize {
        self.drawn_panels
    }

    fn fill_centered(&self, view: &Viewport, x: f64, z: f64, w: f64, d: f64) {
        let (cx, cy) = view.project(x, z);
        let (pw, ph) = (view.length(w), view.length(d));
        self.context.fill_rect(cx - pw / 2.0, cy - ph / 2.0, pw, ph);
    }
}

impl SceneRenderer for CanvasRenderer {
    fn draw(&mut self, scene: &Scene) {
        let ctx = &self.context;
        let style = scene.style();
        let view = Viewport::fit(scene.camera(), self.width, self.height, self.controls);

        ctx.set_global_alpha(1.0);
        ctx.set_fill_style(&style.background.to_css().into());
        ctx.fill_rect(0.0, 0.0, self.width, self.height);

        let roof = scene.roof();
        ctx.set_fill_style(&style.roof.to_css().into());
        self.fill_centered(&view, 0.0, 0.0, roof.width(), roof.height());

        for overlay in scene.renderable_overlays() {
            let (color, alpha) = match overlay.kind {
                OverlayKind::Obstacle => (style.obstacle, 0.5),
                OverlayKind::PanelZone => (style.zone, 0.3),
            };
            ctx.set_global_alpha(alpha);
            ctx.set_fill_style(&color.to_css().into());
            self.fill_centered(
                &view,
                overlay.center.x,
                overlay.center.z,
                overlay.extents.x,
                overlay.extents.y,
            );
        }
        ctx.set_global_alpha(1.0);

        ctx.set_fill_style(&style.panel.to_css().into());
        ctx.set_stroke_style(&"#333".into());
        ctx.set_line_width(1.0);
        let mut drawn = 0;
        for panel in scene.renderable_panels() {
            self.fill_centered(
                &view,
                panel.center.x,
                panel.center.z,
                panel.footprint.x,
                panel.footprint.y,
            );
            let (cx, cy) = view.project(panel.center.x, panel.center.z);
            let (pw, ph) = (view.length(panel.footprint.x), view.length(panel.footprint.y));
            ctx.stroke_rect(cx - pw / 2.0, cy - ph / 2.0, pw, ph);
            drawn += 1;
        }

        ctx.set_fill_style(&"#000".into());
        ctx.set_font("12px sans-serif");
        for overlay in scene.renderable_overlays() {
            if overlay.label.is_empty() {
                continue;
            }
            let (x, y) = view.project(overlay.center.x, overlay.center.z);
            let _ = ctx.fill_text(&overlay.label, x - view.length(overlay.extents.x) / 2.0 + 2.0, y);
        }

        self.drawn_panels = drawn;
    }
}
