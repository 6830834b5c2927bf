use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use panel_layout::scene::Color;
use panel_layout::{
    AnalysisPhase, Estimation, GridDescriptor, PanelSpec, PixelScale, RoofArea, Scene,
    SceneRenderer, SceneStyle, Session, ZoneEstimate, DEFAULT_ZONE_CELL_SIZE,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

mod api;
mod canvas;
use api::{send_analyze_request, AnalyzeTarget};
use canvas::{CanvasRenderer, ViewControls};

const CANVAS_WIDTH: u32 = 800;
const CANVAS_HEIGHT: u32 = 600;

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/roof-frontend.css"/>
        <Title text="Rooftop Solar Planner"/>
        <RoofPlanner/>
    }
}

/// Build the analysis target from the current form state.
fn analyze_target(
    zone_mode: bool,
    image_size: Option<(u32, u32)>,
    width: &str,
    height: &str,
) -> Result<(RoofArea, AnalyzeTarget), String> {
    if zone_mode {
        let (w, h) = image_size.ok_or_else(|| "Image is still loading".to_string())?;
        let roof = RoofArea::new(f64::from(w), f64::from(h)).map_err(|e| e.to_string())?;
        let grid = GridDescriptor::covering(roof, DEFAULT_ZONE_CELL_SIZE, DEFAULT_ZONE_CELL_SIZE)
            .map_err(|e| e.to_string())?;
        Ok((roof, AnalyzeTarget::Zones { grid }))
    } else {
        let roof = PixelScale::default()
            .roof_area_from_fields(width, height)
            .map_err(|e| e.to_string())?;
        Ok((roof, AnalyzeTarget::PanelCount { roof }))
    }
}

#[component]
fn RoofPlanner() -> impl IntoView {
    let session = RwSignal::new(Session::new());
    let image_bytes = RwSignal::new(Option::<Vec<u8>>::None);
    let preview_url = RwSignal::new(Option::<String>::None);
    let image_size = RwSignal::new(Option::<(u32, u32)>::None);
    let roof_width = RwSignal::new(String::from("20"));
    let roof_height = RwSignal::new(String::from("10"));
    let zone_mode = RwSignal::new(false);
    let style = RwSignal::new(SceneStyle::default());
    let estimation = RwSignal::new(Option::<Estimation>::None);
    let scene = RwSignal::new(Option::<Scene>::None);
    let drawn_panels = RwSignal::new(0usize);
    let view_controls = RwSignal::new(ViewControls::default());
    let drag_from = RwSignal::new(Option::<(f64, f64)>::None);

    let file_input_ref = NodeRef::<leptos::html::Input>::new();
    let preview_ref = NodeRef::<leptos::html::Img>::new();
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    let on_file_change = move |_| {
        let Some(file) = file_input_ref
            .get()
            .and_then(|input| input.files())
            .and_then(|files| files.get(0))
        else {
            return;
        };

        if !file.type_().starts_with("image/") {
            session.update(|s| s.reject_input("Please choose an image file"));
            return;
        }

        if let Some(old) = preview_url.get_untracked() {
            let _ = web_sys::Url::revoke_object_url(&old);
        }
        image_size.set(None);
        preview_url.set(web_sys::Url::create_object_url_with_blob(&file).ok());

        let reader = match web_sys::FileReader::new() {
            Ok(reader) => reader,
            Err(e) => {
                warn!("FileReader unavailable: {:?}", e);
                return;
            }
        };
        let reader_clone = reader.clone();
        let onload = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            if let Ok(result) = reader_clone.result() {
                let bytes = js_sys::Uint8Array::new(&result).to_vec();
                image_bytes.set(Some(bytes));
                session.update(|s| s.select_image());
            }
        }) as Box<dyn FnMut(_)>);

        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        onload.forget();
        if let Err(e) = reader.read_as_array_buffer(&file) {
            warn!("Failed to read image: {:?}", e);
        }
    };

    let on_preview_load = move |_| {
        if let Some(img) = preview_ref.get() {
            image_size.set(Some((img.natural_width(), img.natural_height())));
        }
    };

    let on_analyze = move |_| {
        let Some(bytes) = image_bytes.get_untracked() else {
            return;
        };
        let target = analyze_target(
            zone_mode.get_untracked(),
            image_size.get_untracked(),
            &roof_width.get_untracked(),
            &roof_height.get_untracked(),
        );
        let (roof, target) = match target {
            Ok(parts) => parts,
            Err(message) => {
                session.update(|s| s.reject_input(message));
                return;
            }
        };

        let mut ticket = None;
        session.update(|s| ticket = s.begin_analysis());
        let Some(ticket) = ticket else {
            return;
        };

        spawn_local(async move {
            let outcome = send_analyze_request(bytes, &target).await.and_then(|result| {
                Scene::from_estimation(roof, PanelSpec::CANONICAL, &result, style.get_untracked())
                    .map(|built| (result, built))
                    .map_err(|e| e.to_string())
            });

            let mut accepted = false;
            match outcome {
                Ok((result, built)) => {
                    session.update(|s| accepted = s.finish(ticket, Ok(())));
                    if accepted {
                        estimation.set(Some(result));
                        view_controls.set(ViewControls::default());
                        scene.set(Some(built));
                    }
                }
                Err(message) => {
                    session.update(|s| accepted = s.finish(ticket, Err(message)));
                }
            }
            if !accepted {
                warn!("Dropping response for a superseded request");
            }
        });
    };

    let on_color_change = move |ev| {
        let Some(color) = Color::from_css(&event_target_value(&ev)) else {
            return;
        };
        style.update(|s| s.panel = color);
        let current = style.get_untracked();
        scene.update(|s| {
            if let Some(existing) = s {
                *existing = existing.with_style(current);
            }
        });
    };

    let canvas_size = (f64::from(CANVAS_WIDTH), f64::from(CANVAS_HEIGHT));
    let on_wheel = move |ev: web_sys::WheelEvent| {
        ev.prevent_default();
        let cursor = (f64::from(ev.offset_x()), f64::from(ev.offset_y()));
        view_controls.update(|c| *c = c.zoomed_at(ev.delta_y(), cursor, canvas_size));
    };
    let on_drag_move = move |ev: web_sys::MouseEvent| {
        let Some((last_x, last_y)) = drag_from.get_untracked() else {
            return;
        };
        let (x, y) = (f64::from(ev.offset_x()), f64::from(ev.offset_y()));
        view_controls.update(|c| *c = c.panned(x - last_x, y - last_y));
        drag_from.set(Some((x, y)));
    };

    // Redraw whenever a new scene is published or the view is moved
    Effect::new(move |_| {
        let controls = view_controls.get();
        let Some(current) = scene.get() else {
            return;
        };
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        match CanvasRenderer::new(&canvas) {
            Ok(renderer) => {
                let mut renderer = renderer.with_controls(controls);
                renderer.draw(&current);
                drawn_panels.set(renderer.drawn_panels());
            }
            Err(e) => warn!("Canvas unavailable: {:?}", e),
        }
    });

    let status_text = move || match session.with(|s| s.phase().clone()) {
        AnalysisPhase::Idle => "Choose a roof image to begin".to_string(),
        AnalysisPhase::ImageSelected => "Ready to analyze".to_string(),
        AnalysisPhase::Analyzing => "Analyzing...".to_string(),
        AnalysisPhase::Rendered => "Analysis complete".to_string(),
        AnalysisPhase::Failed(message) => message,
    };

    view! {
        <div class="container">
            <header>
                <h1>"Rooftop Solar Planner"</h1>
                <p>"Upload an overhead roof image to estimate how many panels fit"</p>
            </header>

            <div class="controls">
                <div class="file-upload">
                    <label for="file-input">"Roof Image:"</label>
                    <input
                        type="file"
                        id="file-input"
                        accept="image/*"
                        node_ref=file_input_ref
                        on:change=on_file_change
                    />
                </div>

                <div class="dimension-control">
                    <label for="roof-width">"Roof Width (m):"</label>
                    <input
                        type="text"
                        id="roof-width"
                        prop:value=move || roof_width.get()
                        prop:disabled=move || zone_mode.get()
                        on:input=move |ev| roof_width.set(event_target_value(&ev))
                    />
                </div>

                <div class="dimension-control">
                    <label for="roof-height">"Roof Height (m):"</label>
                    <input
                        type="text"
                        id="roof-height"
                        prop:value=move || roof_height.get()
                        prop:disabled=move || zone_mode.get()
                        on:input=move |ev| roof_height.set(event_target_value(&ev))
                    />
                </div>

                <div class="mode-control">
                    <label>
                        <input
                            type="checkbox"
                            prop:checked=move || zone_mode.get()
                            on:change=move |ev| zone_mode.set(event_target_checked(&ev))
                        />
                        "Zone detection"
                    </label>
                </div>

                <div class="color-control">
                    <label for="panel-color">"Panel Colour:"</label>
                    <input
                        type="color"
                        id="panel-color"
                        prop:value=move || style.get().panel.to_css()
                        on:input=on_color_change
                    />
                </div>

                <button
                    class="analyze-button"
                    on:click=on_analyze
                    disabled=move || !session.with(|s| s.can_analyze())
                >
                    {move || {
                        if session.with(|s| *s.phase() == AnalysisPhase::Analyzing) {
                            "Analyzing..."
                        } else {
                            "Analyze Roof"
                        }
                    }}
                </button>
            </div>

            <p
                class="status"
                class:error=move || session.with(|s| matches!(s.phase(), AnalysisPhase::Failed(_)))
            >
                {status_text}
            </p>

            <div class="stats">
                {move || estimation.get().map(|result| {
                    let rooftop = if result.is_rooftop() { "Yes" } else { "No" };
                    let details = match result {
                        Estimation::PanelCount(e) => format!(
                            "Maximum panels: {}. {}",
                            e.max_solar_panels, e.note
                        ),
                        Estimation::ZoneDetection(e) => zone_summary(&e),
                    };
                    view! {
                        <p>"Rooftop detected: " {rooftop}</p>
                        <p>{details}</p>
                        <p>"Panels drawn: " {move || drawn_panels.get()}</p>
                    }
                })}
            </div>

            <div class="preview">
                {move || preview_url.get().map(|url| view! {
                    <img
                        node_ref=preview_ref
                        src=url
                        alt="Roof preview"
                        style="max-width: 400px;"
                        on:load=on_preview_load
                    />
                })}
            </div>

            <div class="canvas-container">
                <canvas
                    node_ref=canvas_ref
                    width=CANVAS_WIDTH.to_string()
                    height=CANVAS_HEIGHT.to_string()
                    style="border: 1px solid #ccc; cursor: grab;"
                    on:wheel=on_wheel
                    on:mousedown=move |ev: web_sys::MouseEvent| {
                        drag_from.set(Some((f64::from(ev.offset_x()), f64::from(ev.offset_y()))));
                    }
                    on:mousemove=on_drag_move
                    on:mouseup=move |_| drag_from.set(None)
                    on:mouseleave=move |_| drag_from.set(None)
                />
                <button
                    class="reset-view-button"
                    on:click=move |_| view_controls.set(ViewControls::default())
                >
                    "Reset View"
                </button>
            </div>
        </div>
    }
}

/// Zone-mode headline: suggested zones, obstacles and the reported usable area.
fn zone_summary(estimate: &ZoneEstimate) -> String {
    let (area, cells) = estimate.total_usable_area();
    format!(
        "Suggested zones: {}, obstacles: {}, usable area: {:.0} sq px across {} of {} cells",
        estimate.potential_solar_panel_areas.len(),
        estimate.obstacle_coordinates.len(),
        area,
        cells,
        estimate.grid_data.grid_cells.len()
    )
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    leptos::mount::mount_to_body(App);
}
