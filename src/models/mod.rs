pub(crate) mod context_tag_keys;
mod data;
mod data_point;
mod envelope;
mod event_data;
mod exception_data;
mod exception_details;
mod message_data;
mod metric_data;
mod page_view_data;
mod query_result;
mod request_data;
mod sanitize;

pub(crate) use data::*;
pub(crate) use data_point::*;
pub(crate) use envelope::*;
pub(crate) use event_data::*;
pub(crate) use exception_data::*;
pub(crate) use exception_details::*;
pub(crate) use message_data::*;
pub(crate) use metric_data::*;
pub(crate) use page_view_data::*;
pub use query_result::*;
pub(crate) use request_data::*;
pub(crate) use sanitize::*;

pub use context_tag_keys::Tags;

/// Collection of custom properties.
pub type Properties = std::collections::BTreeMap<String, String>;

/// Collection of custom measurements.
pub type Measurements = std::collections::BTreeMap<String, f64>;

impl Sanitize for Data {
    fn sanitize(&mut self) {
        match self {
            Data::Event(data) => data.sanitize(),
            Data::Exception(data) => data.sanitize(),
            Data::Message(data) => data.sanitize(),
            Data::Metric(data) => data.sanitize(),
            Data::PageView(data) => data.sanitize(),
            Data::Request(data) => data.sanitize(),
        }
    }
}

impl Sanitize for Envelope {
    fn sanitize(&mut self) {
        context_tag_keys::sanitize_tags(&mut self.tags);
        self.data.sanitize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_tag_keys::OPERATION_ID;

    #[test]
    fn serialization_format() {
        let envelope = Envelope {
            i_key: "key".into(),
            time: "2020-06-21T10:40:00.000Z".into(),
            name: "MessageData",
            tags: Tags::new(),
            data: Data::Message(MessageData {
                name: "hello world".into(),
                properties: Properties::new(),
                measurements: Measurements::new(),
                message: "hello world".into(),
            }),
        };
        let serialized = serde_json::to_string(&envelope).unwrap();
        let expected = "{\"iKey\":\"key\",\"time\":\"2020-06-21T10:40:00.000Z\",\"name\":\"MessageData\",\"tags\":{},\"data\":{\"baseType\":\"MessageData\",\"baseData\":{\"name\":\"hello world\",\"properties\":{},\"measurements\":{},\"message\":\"hello world\"}}}";
        assert_eq!(expected, serialized);
    }

    #[test]
    fn metric_kind_serializes_as_number() {
        let data = MetricData {
            metrics: vec![DataPoint {
                name: "fps".into(),
                value: 60.0,
                kind: DataPointType::Aggregation,
                count: 2,
                min: 58.0,
                max: 62.0,
                std_dev: 2.0,
            }],
            properties: Properties::new(),
        };
        let serialized = serde_json::to_string(&data).unwrap();
        let expected = "{\"metrics\":[{\"name\":\"fps\",\"value\":60.0,\"kind\":1,\"count\":2,\"min\":58.0,\"max\":62.0,\"stdDev\":2.0}],\"properties\":{}}";
        assert_eq!(expected, serialized);
    }

    #[test]
    fn sanitization() {
        let mut tags = Tags::new();
        tags.insert(OPERATION_ID.as_str().into(), "1".repeat(200));
        let mut envelope = Envelope {
            i_key: "key".into(),
            time: "2020-06-21T10:40:00.000Z".into(),
            name: "MessageData",
            tags,
            data: Data::Message(MessageData {
                name: "m".into(),
                properties: Properties::from([("p".repeat(200), "v".repeat(9000))]),
                measurements: Measurements::new(),
                message: "m".into(),
            }),
        };
        envelope.sanitize();
        assert_eq!(128, envelope.tags[OPERATION_ID.as_str()].len());
        match envelope.data {
            Data::Message(data) => {
                assert_eq!(8192, data.properties[&"p".repeat(150)].len());
            }
            _ => panic!("we should not get here"),
        }
    }
}
