use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::Multipart;
use panel_layout::{GridDescriptor, RoofArea};
use std::io::Cursor;
use tracing::debug;

const IMAGE_FIELD: &str = "roofImage";
const WIDTH_FIELDS: [&str; 2] = ["roofWidth", "imageWidth"];
const HEIGHT_FIELDS: [&str; 2] = ["roofHeight", "imageHeight"];
const GRID_FIELD: &str = "gridData";

/// Raw fields of an analyze form, before validation.
#[derive(Debug, Default)]
pub struct AnalyzeForm {
    pub image: Option<Bytes>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub grid_data: Option<String>,
}

/// What to ask the estimator for.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisTarget {
    PanelCount { roof: RoofArea },
    Zones { grid: GridDescriptor },
}

/// Validated analyze request.
#[derive(Debug)]
pub struct AnalysisInput {
    pub image: Bytes,
    pub image_width: u32,
    pub image_height: u32,
    pub target: AnalysisTarget,
}

impl AnalyzeForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = AnalyzeForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                IMAGE_FIELD => {
                    form.image = Some(field.bytes().await?);
                }
                n if WIDTH_FIELDS.contains(&n) => form.width = number_field(&name, field).await?,
                n if HEIGHT_FIELDS.contains(&n) => form.height = number_field(&name, field).await?,
                GRID_FIELD => {
                    let text = field.text().await?;
                    form.grid_data = Some(text).filter(|t| !t.trim().is_empty());
                }
                other => debug!("Ignoring unknown form field {:?}", other),
            }
        }

        Ok(form)
    }

    /// Check everything that can be checked before the estimator is called.
    ///
    /// Without explicit dimensions the roof is the image's own pixel size.
    pub fn validate(self) -> Result<AnalysisInput, ApiError> {
        let image = self
            .image
            .filter(|bytes| !bytes.is_empty())
            .ok_or(ApiError::MissingImage)?;
        let (image_width, image_height) = image_dimensions(&image)?;

        let target = match self.grid_data {
            Some(raw) => AnalysisTarget::Zones {
                grid: GridDescriptor::from_json(&raw)?,
            },
            None => {
                let roof = match (self.width, self.height) {
                    (Some(width), Some(height)) => RoofArea::new(width, height)?,
                    (None, None) => {
                        RoofArea::new(f64::from(image_width), f64::from(image_height))?
                    }
                    (Some(_), None) | (None, Some(_)) => {
                        return Err(ApiError::InvalidField {
                            field: "roof dimensions".to_string(),
                            message: "both width and height are required".to_string(),
                        })
                    }
                };
                AnalysisTarget::PanelCount { roof }
            }
        };

        Ok(AnalysisInput {
            image,
            image_width,
            image_height,
            target,
        })
    }
}

async fn number_field(
    name: &str,
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<f64>, ApiError> {
    let text = field.text().await?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ApiError::InvalidField {
            field: name.to_string(),
            message: format!("expected a number, got {:?}", trimmed),
        })
}

/// Pixel size of an encoded image, reading only its header.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), ApiError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ApiError::UnreadableImage(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ApiError::UnreadableImage(e.to_string()))
}
