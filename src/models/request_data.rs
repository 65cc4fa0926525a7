use crate::models::{Measurements, Properties, Sanitize};
use serde::Serialize;

/// An instance of Request represents completion of an external request to the application to do work and contains a summary of that request execution and the results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestData {
    pub(crate) name: String,
    pub(crate) properties: Properties,
    pub(crate) measurements: Measurements,
    pub(crate) id: String,
    pub(crate) url: Option<String>,
    pub(crate) duration: String,
    pub(crate) response_code: String,
    pub(crate) success: bool,
}

impl Sanitize for RequestData {
    fn sanitize(&mut self) {
        self.properties.sanitize();
        self.measurements.sanitize();
    }
}
