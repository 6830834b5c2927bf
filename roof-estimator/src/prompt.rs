use panel_layout::{GridDescriptor, PanelSpec, RoofArea};

/// Prompt asking for the aggregate panel count of the whole roof.
pub fn panel_count_prompt(roof: RoofArea, panel: PanelSpec) -> String {
    format!(
        "Analyze the provided rooftop image to estimate how many solar panels can be installed.\n\n\
         The usable roof area is {:.1} x {:.1} pixels. Each panel occupies {:.1} x {:.1} pixels \
         and adjacent panels must be separated by a gap of {:.1} pixels.\n\n\
         1. Determine whether the image depicts a rooftop.\n\
         2. Identify obstacles (vents, skylights, railings, structures) that reduce usable space.\n\
         3. Estimate the maximum number of whole panels that fit without overlapping obstacles.\n\n\
         Return ONLY valid JSON with this exact structure:\n\
         {{\n  \
           \"rooftop_detection\": \"Yes\",\n  \
           \"max_solar_panels\": 12,\n  \
           \"note\": \"Short explanation of the estimate and its limitations\"\n\
         }}\n\n\
         If no panels can be placed, return \"No\" for rooftop_detection and 0 for max_solar_panels.",
        roof.width(),
        roof.height(),
        panel.width(),
        panel.height(),
        panel.gap(),
    )
}

/// Prompt asking for per-cell usable area and obstacle boxes over `grid`.
///
/// Cells are given and returned as top-left pixel origins; every box is in
/// the same pixel space.
pub fn zone_prompt(grid: &GridDescriptor) -> String {
    let cells = grid
        .cells
        .iter()
        .map(|c| format!("{{\"x\": {}, \"y\": {}}}", c.x, c.y))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Analyze the provided rooftop image to find where solar panels can be installed, maximizing coverage.

The rooftop is divided into grid cells of {size}. Each cell is identified by the pixel coordinates of its top-left corner:
[{cells}]

1. Determine whether the image depicts a rooftop.
2. Locate every obstacle (railings, building structures, skylights, vents) as a bounding box.
3. Estimate the usable surface area, in square pixels, of each grid cell.
4. Describe potential solar panel zones as bounding boxes.

All coordinates and bounding boxes are image pixel coordinates with (0, 0) at the top-left corner.
Copy the grid cells exactly as given.

Return ONLY valid JSON with this exact structure:
{{
  "rooftop_detection": "Yes",
  "grid_data": {{
    "grid_size": "{size}",
    "grid_cells": [{{"x": 0, "y": 0}}]
  }},
  "surface_areas": {{
    "note": "Limitations of the estimate",
    "grid_cell_areas": [{{"cell_coordinates": {{"x": 0, "y": 0}}, "estimated_usable_area": 40000}}]
  }},
  "potential_solar_panel_areas": [
    {{"area_description": "Open area", "bounding_box": {{"x1": 0, "y1": 0, "x2": 400, "y2": 200}}, "note": ""}}
  ],
  "obstacle_coordinates": [
    {{"obstacle_type": "vent", "bounding_box": {{"x1": 220, "y1": 40, "x2": 260, "y2": 80}}}}
  ]
}}

If the image is not a rooftop suitable for panels, return "No" for rooftop_detection."#,
        size = grid.size_label(),
        cells = cells,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_count_prompt_carries_dimensions() {
        let roof = RoofArea::new(2000.0, 1050.5).unwrap();
        let prompt = panel_count_prompt(roof, PanelSpec::CANONICAL);

        assert!(prompt.contains("2000.0 x 1050.5 pixels"));
        assert!(prompt.contains("150.0 x 150.0 pixels"));
        assert!(prompt.contains("gap of 10.0 pixels"));
        assert!(prompt.contains("\"max_solar_panels\": 12"));
    }

    #[test]
    fn test_zone_prompt_lists_cells() {
        let grid = GridDescriptor::from_indices(200.0, 200.0, &[(0, 0), (1, 0)]).unwrap();
        let prompt = zone_prompt(&grid);

        assert!(prompt.contains("grid cells of 200x200 pixels"));
        assert!(prompt.contains("[{\"x\": 0, \"y\": 0}, {\"x\": 200, \"y\": 0}]"));
        assert!(prompt.contains("\"grid_size\": \"200x200 pixels\""));
    }
}
