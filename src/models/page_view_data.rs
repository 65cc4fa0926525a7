use crate::models::{Measurements, Properties, Sanitize};
use serde::Serialize;

/// An instance of PageView represents a generic action on a page, or a screen/view in a client
/// application.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageViewData {
    /// Event name.
    pub(crate) name: String,

    /// Collection of custom properties.
    pub(crate) properties: Properties,

    /// Collection of custom measurements.
    pub(crate) measurements: Measurements,

    /// Identifier of a page view instance. Used for correlation between page view and other
    /// telemetry items.
    pub(crate) id: Option<String>,

    /// Request URL with all query string parameters.
    pub(crate) url: Option<String>,

    /// Request duration in format: DD.HH:MM:SS.MMMMMM.
    pub(crate) duration: String,
}

impl Sanitize for PageViewData {
    fn sanitize(&mut self) {
        self.properties.sanitize();
        self.measurements.sanitize();
    }
}
