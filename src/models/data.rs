use crate::models::{
    EventData, ExceptionData, MessageData, MetricData, PageViewData, RequestData,
};
use serde::Serialize;

/// Data struct to contain both B and C sections.
#[derive(Debug, Serialize)]
#[serde(tag = "baseType", content = "baseData")]
pub(crate) enum Data {
    #[serde(rename = "EventData")]
    Event(EventData),
    #[serde(rename = "ExceptionData")]
    Exception(ExceptionData),
    #[serde(rename = "MessageData")]
    Message(MessageData),
    #[serde(rename = "MetricData")]
    Metric(MetricData),
    #[serde(rename = "PageViewData")]
    PageView(PageViewData),
    #[serde(rename = "RequestData")]
    Request(RequestData),
}

impl Data {
    /// Name of the data type. Used as the envelope name and serialized as `baseType`.
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Data::Event(_) => "EventData",
            Data::Exception(_) => "ExceptionData",
            Data::Message(_) => "MessageData",
            Data::Metric(_) => "MetricData",
            Data::PageView(_) => "PageViewData",
            Data::Request(_) => "RequestData",
        }
    }
}
