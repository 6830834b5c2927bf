//! Conversion of user-entered physical roof dimensions into roof pixel space.

use crate::error::{ensure_positive, LayoutError, Result};
use crate::geometry::RoofArea;

/// Pixels per meter used for every meters-to-pixels conversion.
pub const DEFAULT_PIXELS_PER_METER: f64 = 100.0;

/// Linear meters-to-pixels scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale {
    pixels_per_meter: f64,
}

impl PixelScale {
    pub fn new(pixels_per_meter: f64) -> Result<Self> {
        Ok(Self {
            pixels_per_meter: ensure_positive("pixels per meter", pixels_per_meter)?,
        })
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    pub fn to_pixels(&self, meters: f64) -> f64 {
        meters * self.pixels_per_meter
    }

    pub fn to_meters(&self, pixels: f64) -> f64 {
        pixels / self.pixels_per_meter
    }

    /// Parse the width/height form fields (meters) and scale them into a roof area.
    ///
    /// Fractional pixels are kept as-is; no rounding or clamping is applied.
    pub fn roof_area_from_fields(&self, width: &str, height: &str) -> Result<RoofArea> {
        let width_m = parse_field("roof width", width)?;
        let height_m = parse_field("roof height", height)?;
        RoofArea::new(self.to_pixels(width_m), self.to_pixels(height_m))
    }
}

impl Default for PixelScale {
    fn default() -> Self {
        Self {
            pixels_per_meter: DEFAULT_PIXELS_PER_METER,
        }
    }
}

/// Parse a decimal meters value from a form field.
pub fn parse_meters(field: &str) -> Result<f64> {
    parse_field("dimension", field)
}

fn parse_field(name: &'static str, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LayoutError::MissingDimension(name));
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(LayoutError::InvalidDimension {
            field: name,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_scale_to_pixels() {
        let scale = PixelScale::default();
        let roof = scale.roof_area_from_fields("20", "10.5").unwrap();

        assert_eq!(roof.width(), 2000.0);
        assert_eq!(roof.height(), 1050.0);
    }

    #[test]
    fn test_fractional_pixels_pass_through() {
        let scale = PixelScale::new(3779.0).unwrap();
        let roof = scale.roof_area_from_fields("0.5", " 1.25 ").unwrap();

        assert!((roof.width() - 1889.5).abs() < 1e-9);
        assert!((roof.height() - 4723.75).abs() < 1e-9);
    }

    #[test]
    fn test_empty_and_unparsable_fields() {
        let scale = PixelScale::default();

        assert_eq!(
            scale.roof_area_from_fields("", "10"),
            Err(LayoutError::MissingDimension("roof width"))
        );
        assert_eq!(
            scale.roof_area_from_fields("10", "   "),
            Err(LayoutError::MissingDimension("roof height"))
        );
        assert!(matches!(
            scale.roof_area_from_fields("ten", "10"),
            Err(LayoutError::InvalidDimension { field: "roof width", .. })
        ));
        assert!(matches!(
            scale.roof_area_from_fields("10", "inf"),
            Err(LayoutError::InvalidDimension { field: "roof height", .. })
        ));
    }

    #[test]
    fn test_non_positive_meters_rejected() {
        let scale = PixelScale::default();

        assert!(matches!(
            scale.roof_area_from_fields("-3", "10"),
            Err(LayoutError::NonPositive { .. })
        ));
        assert!(scale.roof_area_from_fields("0", "10").is_err());
    }

    #[test]
    fn test_scale_validation() {
        assert!(PixelScale::new(0.0).is_err());
        assert!(PixelScale::new(f64::NAN).is_err());
        assert_eq!(PixelScale::default().pixels_per_meter(), DEFAULT_PIXELS_PER_METER);
        assert_eq!(PixelScale::default().to_meters(150.0), 1.5);
    }

    #[test]
    fn test_parse_meters() {
        assert_eq!(parse_meters("2.75"), Ok(2.75));
        assert!(parse_meters("").is_err());
        assert!(parse_meters("NaN").is_err());
    }
}
