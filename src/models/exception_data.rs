use crate::models::{ExceptionDetails, Properties, Sanitize};
use serde::Serialize;

/// An instance of Exception represents a handled or unhandled exception that occurred during
/// execution of the monitored application.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExceptionData {
    /// Exception chain. Only the first exception is used by the backend.
    pub(crate) exceptions: Vec<ExceptionDetails>,

    /// Collection of custom properties.
    pub(crate) properties: Properties,

    /// Identifier of where the exception was thrown in code. Used for exceptions grouping.
    pub(crate) problem_id: Option<String>,
}

impl Sanitize for ExceptionData {
    fn sanitize(&mut self) {
        self.properties.sanitize();
    }
}
