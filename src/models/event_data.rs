use crate::models::{Measurements, Properties, Sanitize};
use serde::Serialize;

/// Instances of Event represent structured event records that can be grouped and searched by their
/// properties. Event data item also creates a metric of event count by name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventData {
    /// Event name. Keep it low cardinality to allow proper grouping and useful metrics.
    pub(crate) name: String,

    /// Collection of custom properties.
    pub(crate) properties: Properties,

    /// Collection of custom measurements.
    pub(crate) measurements: Measurements,
}

impl Sanitize for EventData {
    fn sanitize(&mut self) {
        self.properties.sanitize();
        self.measurements.sanitize();
    }
}
