//! Telemetry records captured by the application.
//!
//! Each record is built by the caller at the moment of capture, handed to
//! [`TelemetryClient::track`](crate::TelemetryClient::track) and consumed there.

use crate::models::{Measurements, Properties};
use std::{error::Error as StdError, time::Duration};
use uuid::Uuid;

/// A telemetry record of one of the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    /// A named user action or application event.
    Event(EventTelemetry),
    /// A metric measurement or pre-aggregated metric.
    Metric(MetricTelemetry),
    /// A page, screen or view being shown.
    PageView(PageViewTelemetry),
    /// A completed request.
    Request(RequestTelemetry),
    /// A diagnostic log message.
    Trace(TraceTelemetry),
    /// A handled or unhandled error.
    Exception(ExceptionTelemetry),
}

impl Telemetry {
    /// Name of the record.
    pub fn name(&self) -> &str {
        match self {
            Telemetry::Event(t) => &t.name,
            Telemetry::Metric(t) => &t.name,
            Telemetry::PageView(t) => &t.name,
            Telemetry::Request(t) => &t.name,
            Telemetry::Trace(t) => &t.name,
            Telemetry::Exception(t) => &t.type_name,
        }
    }
}

macro_rules! impl_from_telemetry {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Telemetry {
                fn from(telemetry: $ty) -> Self {
                    Telemetry::$variant(telemetry)
                }
            }
        )*
    };
}

impl_from_telemetry! {
    Event => EventTelemetry,
    Metric => MetricTelemetry,
    PageView => PageViewTelemetry,
    Request => RequestTelemetry,
    Trace => TraceTelemetry,
    Exception => ExceptionTelemetry,
}

/// User actions and other events. Used to track user behavior or to monitor performance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventTelemetry {
    /// Event name.
    pub name: String,
    /// Custom properties.
    pub properties: Properties,
    /// Numeric measurements attached to the event.
    pub metrics: Measurements,
}

impl EventTelemetry {
    /// Create an event.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a custom property. A later value for the same key wins.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Add a numeric measurement.
    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// Performance measurements such as queue lengths not related to specific events.
///
/// A metric with `count == 0` is sent as a single measurement; otherwise it is sent as an
/// aggregation and `min`, `max` and `std_dev` are meaningful.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricTelemetry {
    /// Metric name.
    pub name: String,
    /// Custom properties.
    pub properties: Properties,
    /// Single value, or the sum of the aggregated values.
    pub value: f64,
    /// Number of aggregated values.
    pub count: i32,
    /// Maximum of the aggregated values.
    pub max: f64,
    /// Minimum of the aggregated values.
    pub min: f64,
    /// Standard deviation of the aggregated values.
    pub std_dev: f64,
}

impl MetricTelemetry {
    /// Create a single measurement.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            ..Default::default()
        }
    }

    /// Turn this metric into an aggregation.
    pub fn with_aggregation(mut self, count: i32, min: f64, max: f64, std_dev: f64) -> Self {
        self.count = count;
        self.min = min;
        self.max = max;
        self.std_dev = std_dev;
        self
    }

    /// Add a custom property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub(crate) fn is_aggregation(&self) -> bool {
        self.count > 0
    }
}

/// A page, screen or view shown to the user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageViewTelemetry {
    /// View name.
    pub name: String,
    /// Custom properties.
    pub properties: Properties,
    /// Custom measurements.
    pub measurements: Measurements,
    /// Identifier of the page view instance. Used for correlation with other telemetry.
    pub id: Option<String>,
    /// Url of the view, if any.
    pub url: Option<String>,
    /// Time it took to show the view.
    pub duration: Duration,
}

impl PageViewTelemetry {
    /// Create a page view.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the page view id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the url.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add a custom property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Add a custom measurement.
    pub fn with_measurement(mut self, key: impl Into<String>, value: f64) -> Self {
        self.measurements.insert(key.into(), value);
        self
    }
}

/// A completed request, e.g. a web request made by the application.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTelemetry {
    /// Request name. Defaults to the url.
    pub name: String,
    /// Custom properties.
    pub properties: Properties,
    /// Custom measurements.
    pub measurements: Measurements,
    /// Identifier of the request call instance.
    pub id: String,
    /// Request url with all query string parameters.
    pub url: Option<String>,
    /// Request duration.
    pub duration: Duration,
    /// Result of the request, e.g. the HTTP status code.
    pub response_code: String,
    /// Whether the request succeeded.
    pub success: bool,
}

impl RequestTelemetry {
    /// Create a request record named after its url, with a fresh id.
    pub fn new(
        url: impl Into<String>,
        duration: Duration,
        response_code: impl Into<String>,
        success: bool,
    ) -> Self {
        let url = url.into();
        Self {
            name: url.clone(),
            properties: Properties::new(),
            measurements: Measurements::new(),
            id: Uuid::new_v4().to_string(),
            url: Some(url),
            duration,
            response_code: response_code.into(),
            success,
        }
    }

    /// Override the request name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a custom property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Add a custom measurement.
    pub fn with_measurement(mut self, key: impl Into<String>, value: f64) -> Self {
        self.measurements.insert(key.into(), value);
        self
    }
}

/// Diagnostic log message, a "breadcrumb trail" for diagnosing problems.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceTelemetry {
    /// Record name. Same as the message.
    pub name: String,
    /// Custom properties.
    pub properties: Properties,
    /// Custom measurements.
    pub measurements: Measurements,
    /// Trace message.
    pub message: String,
}

impl TraceTelemetry {
    /// Create a trace.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            name: message.clone(),
            message,
            ..Default::default()
        }
    }

    /// Add a custom property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Add a custom measurement.
    pub fn with_measurement(mut self, key: impl Into<String>, value: f64) -> Self {
        self.measurements.insert(key.into(), value);
        self
    }
}

/// An error that occurred in the application.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExceptionTelemetry {
    /// Custom properties.
    pub properties: Properties,
    /// Error message.
    pub message: String,
    /// Error type name.
    pub type_name: String,
    /// Identifier of where the error happened. Used for grouping.
    pub problem_id: Option<String>,
}

impl ExceptionTelemetry {
    /// Create an exception record.
    pub fn new(message: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// Create an exception record from an error value, using its Rust type name.
    ///
    /// ```
    /// use application_insights_client::ExceptionTelemetry;
    ///
    /// let err = "abc".parse::<u32>().unwrap_err();
    /// let telemetry = ExceptionTelemetry::from_error(&err);
    /// assert!(telemetry.type_name.ends_with("ParseIntError"));
    /// ```
    pub fn from_error<E: StdError + 'static>(err: &E) -> Self {
        Self::new(err.to_string(), std::any::type_name::<E>())
    }

    /// Set the grouping key.
    pub fn with_problem_id(mut self, problem_id: impl Into<String>) -> Self {
        self.problem_id = Some(problem_id.into());
        self
    }

    /// Add a custom property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
