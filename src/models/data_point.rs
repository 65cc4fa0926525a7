use serde::Serialize;
use serde_repr::Serialize_repr;

/// Metric data single measurement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DataPoint {
    /// Name of the metric.
    pub(crate) name: String,

    /// Single value for measurement. Sum of individual measurements for the aggregation.
    pub(crate) value: f64,

    /// Metric type. Single measurement or the aggregated value.
    pub(crate) kind: DataPointType,

    /// Metric weight of the aggregated metric. Zero for a measurement.
    pub(crate) count: i32,

    /// Minimum value of the aggregated metric. Zero for a measurement.
    pub(crate) min: f64,

    /// Maximum value of the aggregated metric. Zero for a measurement.
    pub(crate) max: f64,

    /// Standard deviation of the aggregated metric. Zero for a measurement.
    pub(crate) std_dev: f64,
}

/// Type of the metric data measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr)]
#[repr(u8)]
pub(crate) enum DataPointType {
    Measurement = 0,
    Aggregation = 1,
}
