//! Turns telemetry records into wire envelopes.

use crate::{
    convert::{duration_to_string, time_to_string},
    models::{
        Data, DataPoint, DataPointType, Envelope, EventData, ExceptionData, ExceptionDetails,
        MessageData, MetricData, PageViewData, RequestData, Sanitize, Tags,
    },
    telemetry::{
        EventTelemetry, ExceptionTelemetry, MetricTelemetry, PageViewTelemetry,
        RequestTelemetry, Telemetry, TraceTelemetry,
    },
    Error,
};
use bytes::Bytes;
use std::time::SystemTime;

/// Serialize `record` into a v2/track envelope stamped with the current time.
///
/// Fails if `instrumentation_key` is empty. Property names and values longer than the backend
/// accepts are truncated.
pub fn encode(record: &Telemetry, instrumentation_key: &str, tags: &Tags) -> Result<Bytes, Error> {
    encode_at(record, instrumentation_key, tags, SystemTime::now())
}

pub(crate) fn encode_at(
    record: &Telemetry,
    instrumentation_key: &str,
    tags: &Tags,
    time: SystemTime,
) -> Result<Bytes, Error> {
    if instrumentation_key.is_empty() {
        return Err(Error::EncodeMissingInstrumentationKey);
    }
    let data = Data::from(record);
    let mut envelope = Envelope {
        i_key: instrumentation_key.to_string(),
        time: time_to_string(time),
        name: data.type_name(),
        tags: tags.clone(),
        data,
    };
    envelope.sanitize();
    serde_json::to_vec(&envelope)
        .map(Bytes::from)
        .map_err(Error::EncodeSerialize)
}

impl From<&Telemetry> for Data {
    fn from(record: &Telemetry) -> Self {
        match record {
            Telemetry::Event(t) => Data::Event(t.into()),
            Telemetry::Metric(t) => Data::Metric(t.into()),
            Telemetry::PageView(t) => Data::PageView(t.into()),
            Telemetry::Request(t) => Data::Request(t.into()),
            Telemetry::Trace(t) => Data::Message(t.into()),
            Telemetry::Exception(t) => Data::Exception(t.into()),
        }
    }
}

impl From<&EventTelemetry> for EventData {
    fn from(t: &EventTelemetry) -> Self {
        EventData {
            name: t.name.clone(),
            properties: t.properties.clone(),
            measurements: t.metrics.clone(),
        }
    }
}

impl From<&MetricTelemetry> for MetricData {
    fn from(t: &MetricTelemetry) -> Self {
        let point = if t.is_aggregation() {
            DataPoint {
                name: t.name.clone(),
                value: t.value,
                kind: DataPointType::Aggregation,
                count: t.count,
                min: t.min,
                max: t.max,
                std_dev: t.std_dev,
            }
        } else {
            DataPoint {
                name: t.name.clone(),
                value: t.value,
                kind: DataPointType::Measurement,
                count: 0,
                min: 0.0,
                max: 0.0,
                std_dev: 0.0,
            }
        };
        MetricData {
            metrics: vec![point],
            properties: t.properties.clone(),
        }
    }
}

impl From<&PageViewTelemetry> for PageViewData {
    fn from(t: &PageViewTelemetry) -> Self {
        PageViewData {
            name: t.name.clone(),
            properties: t.properties.clone(),
            measurements: t.measurements.clone(),
            id: t.id.clone(),
            url: t.url.clone(),
            duration: duration_to_string(t.duration),
        }
    }
}

impl From<&RequestTelemetry> for RequestData {
    fn from(t: &RequestTelemetry) -> Self {
        RequestData {
            name: t.name.clone(),
            properties: t.properties.clone(),
            measurements: t.measurements.clone(),
            id: t.id.clone(),
            url: t.url.clone(),
            duration: duration_to_string(t.duration),
            response_code: t.response_code.clone(),
            success: t.success,
        }
    }
}

impl From<&TraceTelemetry> for MessageData {
    fn from(t: &TraceTelemetry) -> Self {
        MessageData {
            name: t.name.clone(),
            properties: t.properties.clone(),
            measurements: t.measurements.clone(),
            message: t.message.clone(),
        }
    }
}

impl From<&ExceptionTelemetry> for ExceptionData {
    fn from(t: &ExceptionTelemetry) -> Self {
        ExceptionData {
            exceptions: vec![ExceptionDetails {
                message: t.message.clone(),
                type_name: t.type_name.clone(),
            }],
            properties: t.properties.clone(),
            problem_id: t.problem_id.clone(),
        }
    }
}
