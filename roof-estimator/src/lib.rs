use panel_layout::{Estimation, GridDescriptor, PanelSpec, RoofArea};
use std::future::Future;

mod client;
mod prompt;
mod reply;

pub use client::VisionEstimator;
pub use prompt::{panel_count_prompt, zone_prompt};
pub use reply::{extract_json_from_response, parse_reply};

/// What the estimator is asked to produce for one image.
#[derive(Debug, Clone, Copy)]
pub enum EstimateTarget<'a> {
    /// Maximum number of `panel` footprints that fit on `roof`.
    PanelCount { roof: RoofArea, panel: PanelSpec },
    /// Per-cell usable area and obstacles for `grid`.
    Zones { grid: &'a GridDescriptor },
}

#[derive(Debug, Clone, Copy)]
pub struct EstimateRequest<'a> {
    /// PNG/JPEG image bytes
    pub image: &'a [u8],
    pub target: EstimateTarget<'a>,
}

#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("{0} environment variable not set")]
    MissingCredential(&'static str),

    #[error("estimation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("estimation service error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("no content in estimation response")]
    EmptyResponse,

    #[error("estimation response was not valid JSON: {reason}")]
    MalformedResponse { reason: String, body: String },
}

impl EstimateError {
    /// The service answered, but not with something we could read.
    pub fn is_malformed_reply(&self) -> bool {
        matches!(self, Self::EmptyResponse | Self::MalformedResponse { .. })
    }
}

/// Remote service that estimates panel capacity from a rooftop photo.
pub trait RoofEstimator: Send + Sync {
    fn estimate(
        &self,
        request: EstimateRequest<'_>,
    ) -> impl Future<Output = Result<Estimation, EstimateError>> + Send;
}

/// MIME type of an encoded image, falling back to PNG when unrecognised.
pub fn sniff_mime_type(image: &[u8]) -> &'static str {
    image::guess_format(image)
        .map(|format| format.to_mime_type())
        .unwrap_or("image/png")
}
