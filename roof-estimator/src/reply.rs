use crate::EstimateError;
use panel_layout::{AnalysisMode, Estimation};

/// Extract the JSON document from a model reply.
///
/// Handles markdown code fences (```` ```json ````) and stray prose around
/// the object.
pub fn extract_json_from_response(content: &str) -> String {
    let trimmed = content.trim();

    let unfenced = if trimmed.starts_with("```") {
        trimmed
            .lines()
            .skip(1) // opening ```json line
            .take_while(|line| !line.trim_start().starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        trimmed.to_string()
    };

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => unfenced[start..=end].to_string(),
        _ => unfenced.trim().to_string(),
    }
}

/// Decode a model reply into the estimation shape expected for `mode`.
pub fn parse_reply(mode: AnalysisMode, content: &str) -> Result<Estimation, EstimateError> {
    let json_str = extract_json_from_response(content);
    if json_str.is_empty() {
        return Err(EstimateError::EmptyResponse);
    }

    let value: serde_json::Value =
        serde_json::from_str(&json_str).map_err(|e| EstimateError::MalformedResponse {
            reason: e.to_string(),
            body: content.to_string(),
        })?;

    Estimation::from_value(mode, value).map_err(|e| EstimateError::MalformedResponse {
        reason: e.to_string(),
        body: content.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_markdown() {
        let response = "```json\n{\"rooftop_detection\": \"Yes\"}\n```";

        assert_eq!(
            extract_json_from_response(response),
            "{\"rooftop_detection\": \"Yes\"}"
        );
    }

    #[test]
    fn test_extract_json_plain() {
        let response = r#"  {"rooftop_detection": "No"}  "#;

        assert_eq!(extract_json_from_response(response), r#"{"rooftop_detection": "No"}"#);
    }

    #[test]
    fn test_extract_json_with_surrounding_prose() {
        let response = "Here is the analysis:\n{\"max_solar_panels\": 3}\nLet me know.";

        assert_eq!(extract_json_from_response(response), "{\"max_solar_panels\": 3}");
    }

    #[test]
    fn test_parse_panel_count_reply() {
        let reply = "```json\n{\"rooftop_detection\": \"Yes\", \"max_solar_panels\": 9, \"note\": \"ok\"}\n```";
        let estimation = parse_reply(AnalysisMode::PanelCount, reply).unwrap();

        assert_eq!(estimation.panel_cap(), Some(9));
    }

    #[test]
    fn test_parse_reply_errors() {
        assert!(matches!(
            parse_reply(AnalysisMode::PanelCount, "   "),
            Err(EstimateError::EmptyResponse)
        ));
        assert!(matches!(
            parse_reply(AnalysisMode::PanelCount, "{not json}"),
            Err(EstimateError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_reply(AnalysisMode::ZoneDetection, r#"{"rooftop_detection": "Yes"}"#),
            Err(EstimateError::MalformedResponse { .. })
        ));
    }
}
