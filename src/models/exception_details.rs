use serde::Serialize;

/// Exception details of the exception in a chain.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExceptionDetails {
    /// Exception message.
    pub(crate) message: String,

    /// Exception type name.
    pub(crate) type_name: String,
}
