use crate::models::{Measurements, Properties, Sanitize};
use serde::Serialize;

/// Instances of Message represent printf-like trace statements that are text-searched.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessageData {
    pub(crate) name: String,

    /// Collection of custom properties.
    pub(crate) properties: Properties,

    /// Collection of custom measurements.
    pub(crate) measurements: Measurements,

    /// Trace message
    pub(crate) message: String,
}

impl Sanitize for MessageData {
    fn sanitize(&mut self) {
        self.properties.sanitize();
        self.measurements.sanitize();
    }
}
