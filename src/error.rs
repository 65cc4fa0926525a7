use crate::connection_string::ParseError;
use std::error::Error as StdError;

/// Errors that occurred while configuring the client, encoding telemetry or delivering it.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No instrumentation key was configured. The client is disabled and no telemetry will be
    /// captured.
    #[error("instrumentation key is required; telemetry client disabled")]
    MissingInstrumentationKey,

    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    ConnectionString(ParseError),

    /// The connection string environment variable is not set.
    #[error("reading connection string from environment failed with {0}")]
    ConnectionStringEnv(std::env::VarError),

    /// Delivery needs an async runtime to spawn sends on, but the client was built outside of
    /// one and no runtime handle was given.
    #[error("no async runtime available for telemetry delivery")]
    NoRuntime,

    /// An envelope was encoded without an instrumentation key. The record is dropped.
    #[error("instrumentation key is required to generate a payload")]
    EncodeMissingInstrumentationKey,

    /// Telemetry data failed to serialize to JSON. The record is dropped.
    ///
    /// Note: This is an error in this crate. If you spot this, please open an issue.
    #[error("serializing telemetry envelope failed with {0}")]
    EncodeSerialize(serde_json::Error),

    /// Could not complete the HTTP request. The payload is dropped.
    #[error("sending upload request failed with {0}")]
    UploadConnection(Box<dyn StdError + Send + Sync + 'static>),

    /// The backend answered with an error status. The payload is dropped.
    #[error("upload failed with {status_code}: {message}")]
    Upload {
        /// HTTP status code of the response.
        status_code: u16,
        /// Response body or a description of the rejected items.
        message: String,
    },

    /// The delivery backlog reached its configured bound. The newest payload is dropped.
    #[error("delivery backlog is full ({0} payloads)")]
    BacklogFull(usize),

    /// Reading or writing the identity store file failed.
    #[error("identity store io failed with {0}")]
    IdentityStoreIo(std::io::Error),

    /// The identity store file does not contain a valid JSON object.
    #[error("identity store file is malformed: {0}")]
    IdentityStoreFormat(serde_json::Error),

    /// The analytics query client needs both an application id and an API key.
    #[error("application id and API key are required for analytics queries")]
    QueryMissingCredentials,

    /// The application id contains characters that are not allowed in a URI path segment.
    #[error("invalid application id {0:?}")]
    QueryInvalidApplicationId(String),

    /// An analytics query request could not be serialized.
    #[error("serializing query request failed with {0}")]
    QuerySerializeRequest(serde_json::Error),

    /// Could not complete the HTTP request for an analytics query.
    #[error("sending query request failed with {0}")]
    QueryConnection(Box<dyn StdError + Send + Sync + 'static>),

    /// The query API answered with an error status.
    #[error("query failed with {status_code}: {message}")]
    Query {
        /// HTTP status code of the response.
        status_code: u16,
        /// Response body.
        message: String,
    },

    /// An analytics query response could not be deserialized.
    #[error("deserializing query response failed with {0}")]
    QueryDeserializeResponse(serde_json::Error),
}

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The client could not be set up. Surfaced once, at startup.
    Configuration,
    /// A single record could not be turned into a payload.
    Encoding,
    /// A single payload could not be delivered.
    Delivery,
    /// The identity store could not be read or written.
    Storage,
    /// An analytics query failed.
    Query,
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingInstrumentationKey
            | Error::ConnectionString(_)
            | Error::ConnectionStringEnv(_)
            | Error::NoRuntime
            | Error::QueryMissingCredentials
            | Error::QueryInvalidApplicationId(_) => ErrorKind::Configuration,
            Error::EncodeMissingInstrumentationKey | Error::EncodeSerialize(_) => {
                ErrorKind::Encoding
            }
            Error::UploadConnection(_) | Error::Upload { .. } | Error::BacklogFull(_) => {
                ErrorKind::Delivery
            }
            Error::IdentityStoreIo(_) | Error::IdentityStoreFormat(_) => ErrorKind::Storage,
            Error::QuerySerializeRequest(_)
            | Error::QueryConnection(_)
            | Error::Query { .. }
            | Error::QueryDeserializeResponse(_) => ErrorKind::Query,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::ConnectionString(err)
    }
}
