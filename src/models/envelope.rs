use crate::models::{Data, Tags};
use serde::Serialize;

/// System variables for a telemetry item.
#[derive(Debug, Serialize)]
pub(crate) struct Envelope {
    /// The application's instrumentation key.
    #[serde(rename = "iKey")]
    pub(crate) i_key: String,

    /// Event date time when the telemetry item was created.
    pub(crate) time: String,

    /// Type name of the telemetry data item. Same as `data.baseType`.
    pub(crate) name: &'static str,

    /// Key/value collection of context properties.
    pub(crate) tags: Tags,

    pub(crate) data: Data,
}
