use panel_layout::{AnalysisMode, Estimation, GridDescriptor, RoofArea};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

const ANALYZE_URL: &str = "http://localhost:3000/analyze";

/// What the planner asks the backend to estimate.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzeTarget {
    /// Roof size in pixels, already converted from meters.
    PanelCount { roof: RoofArea },
    Zones { grid: GridDescriptor },
}

impl AnalyzeTarget {
    pub fn mode(&self) -> AnalysisMode {
        match self {
            Self::PanelCount { .. } => AnalysisMode::PanelCount,
            Self::Zones { .. } => AnalysisMode::ZoneDetection,
        }
    }

    /// Text fields sent next to the image.
    fn form_fields(&self) -> Result<Vec<(&'static str, String)>, String> {
        match self {
            Self::PanelCount { roof } => Ok(vec![
                ("roofWidth", roof.width().to_string()),
                ("roofHeight", roof.height().to_string()),
            ]),
            Self::Zones { grid } => {
                let encoded = serde_json::to_string(grid)
                    .map_err(|e| format!("Failed to encode grid: {}", e))?;
                Ok(vec![("gridData", encoded)])
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeEnvelope {
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    result: String,
}

pub async fn send_analyze_request(image: Vec<u8>, target: &AnalyzeTarget) -> Result<Estimation, String> {
    let mut form = Form::new().part("roofImage", Part::bytes(image).file_name("roof-image"));
    for (name, value) in target.form_fields()? {
        form = form.text(name, value);
    }

    let client = reqwest::Client::new();
    let response = client
        .post(ANALYZE_URL)
        .multipart(form)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {}", e))?;

    if !status.is_success() {
        return Err(server_error_message(status.as_u16(), &body));
    }
    parse_analyze_response(target.mode(), &body)
}

fn parse_analyze_response(mode: AnalysisMode, body: &str) -> Result<Estimation, String> {
    let envelope: AnalyzeEnvelope =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse response: {}", e))?;
    Estimation::from_value(mode, envelope.result)
        .map_err(|e| format!("Unexpected estimation format: {}", e))
}

fn server_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("Server error ({}): {}", status, envelope.result),
        Err(_) => format!("Server error ({})", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_layout::PixelPoint;

    #[test]
    fn test_panel_count_fields() {
        let target = AnalyzeTarget::PanelCount {
            roof: RoofArea::new(2000.0, 1050.5).unwrap(),
        };

        assert_eq!(target.mode(), AnalysisMode::PanelCount);
        assert_eq!(
            target.form_fields().unwrap(),
            vec![
                ("roofWidth", "2000".to_string()),
                ("roofHeight", "1050.5".to_string())
            ]
        );
    }

    #[test]
    fn test_zone_fields_carry_grid_json() {
        let grid = GridDescriptor::new(200.0, 200.0, vec![PixelPoint::new(0.0, 200.0)]).unwrap();
        let target = AnalyzeTarget::Zones { grid: grid.clone() };

        let fields = target.form_fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "gridData");
        assert_eq!(GridDescriptor::from_json(&fields[0].1).unwrap(), grid);
    }

    #[test]
    fn test_parse_panel_count_envelope() {
        let body = r#"{"result": {"rooftop_detection": "Yes", "max_solar_panels": 12.9, "note": "south facing"}}"#;
        let estimation = parse_analyze_response(AnalysisMode::PanelCount, body).unwrap();

        assert_eq!(estimation.panel_cap(), Some(12));
        assert!(estimation.is_rooftop());
    }

    #[test]
    fn test_envelope_for_wrong_mode_is_rejected() {
        let body = r#"{"result": {"rooftop_detection": "Yes", "max_solar_panels": 3, "note": ""}}"#;

        assert!(parse_analyze_response(AnalysisMode::ZoneDetection, body).is_err());
        assert!(parse_analyze_response(AnalysisMode::PanelCount, "not json").is_err());
    }

    #[test]
    fn test_server_error_message() {
        assert_eq!(
            server_error_message(400, r#"{"result": "No file received", "error": "MISSING_IMAGE"}"#),
            "Server error (400): No file received"
        );
        assert_eq!(server_error_message(502, "<html>"), "Server error (502)");
    }
}
