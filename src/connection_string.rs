use std::{convert::TryInto, str::FromStr};

pub(crate) const DEFAULT_INGESTION_ENDPOINT: &str = "https://dc.services.visualstudio.com";
pub(crate) const CONNECTION_STRING_ENV: &str = "APPLICATIONINSIGHTS_CONNECTION_STRING";
const TRACK_PATH: &str = "v2/track";

/// Instrumentation key and ingestion endpoint taken from a connection string such as
/// `InstrumentationKey=...;IngestionEndpoint=https://westeurope-1.in.applicationinsights.azure.com/`.
#[derive(Debug)]
pub(crate) struct ConnectionString {
    pub(crate) ingestion_endpoint: http::Uri,
    pub(crate) instrumentation_key: String,
}

/// Reasons a connection string is rejected.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// A field is not a single `key=value` pair.
    #[error("invalid format")]
    InvalidFormat,
    /// The `InstrumentationKey` field is missing or blank.
    #[error("missing instrumentation key")]
    MissingInstrumentationKey,
    /// Only instrumentation key authorization is supported.
    #[error("unsupported authorization; only \"ikey\" is supported")]
    UnsupportedAuthorization,
    /// The ingestion endpoint is not a valid URI.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(http::uri::InvalidUri),
}

#[derive(Debug, Default)]
struct Fields<'a> {
    instrumentation_key: Option<&'a str>,
    ingestion_endpoint: Option<&'a str>,
    endpoint_suffix: Option<&'a str>,
    location: Option<&'a str>,
    authorization: Option<&'a str>,
}

impl<'a> Fields<'a> {
    fn parse(s: &'a str) -> Result<Self, ParseError> {
        let mut fields = Fields::default();
        for field in s.split(';').map(str::trim).filter(|f| !f.is_empty()) {
            let (key, value) = field.split_once('=').ok_or(ParseError::InvalidFormat)?;
            if value.contains('=') {
                return Err(ParseError::InvalidFormat);
            }
            let value = Some(value.trim());
            match key.trim().to_ascii_lowercase().as_str() {
                "instrumentationkey" => fields.instrumentation_key = value,
                "ingestionendpoint" => fields.ingestion_endpoint = value,
                "endpointsuffix" => fields.endpoint_suffix = value,
                "location" => fields.location = value,
                "authorization" => fields.authorization = value,
                _ => {}
            }
        }
        Ok(fields)
    }

    fn ingestion_endpoint(&self) -> Result<http::Uri, ParseError> {
        match (self.ingestion_endpoint, self.endpoint_suffix) {
            (Some(endpoint), _) => to_https_uri(endpoint),
            (None, Some(suffix)) => {
                let location = self
                    .location
                    .map(|location| format!("{}.", location))
                    .unwrap_or_default();
                to_https_uri(&format!("https://{}dc.{}", location, suffix))
            }
            (None, None) => Ok(http::Uri::from_static(DEFAULT_INGESTION_ENDPOINT)),
        }
    }
}

impl FromStr for ConnectionString {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = Fields::parse(s)?;
        if let Some(authorization) = fields.authorization {
            if !authorization.eq_ignore_ascii_case("ikey") {
                return Err(ParseError::UnsupportedAuthorization);
            }
        }
        let instrumentation_key = fields
            .instrumentation_key
            .filter(|key| !key.is_empty())
            .ok_or(ParseError::MissingInstrumentationKey)?
            .to_string();
        Ok(ConnectionString {
            ingestion_endpoint: fields.ingestion_endpoint()?,
            instrumentation_key,
        })
    }
}

fn to_https_uri(url: &str) -> Result<http::Uri, ParseError> {
    let url = match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    };
    url.trim_end_matches('/')
        .try_into()
        .map_err(ParseError::InvalidEndpoint)
}

/// Appends the track path to an ingestion endpoint.
pub(crate) fn track_endpoint(ingestion_endpoint: &http::Uri) -> Result<http::Uri, ParseError> {
    append_path(ingestion_endpoint, TRACK_PATH).map_err(ParseError::InvalidEndpoint)
}

pub(crate) fn append_path(
    uri: impl ToString,
    path: impl AsRef<str>,
) -> Result<http::Uri, http::uri::InvalidUri> {
    let mut curr = uri.to_string();
    if !curr.ends_with('/') {
        curr.push('/');
    }
    curr.push_str(path.as_ref());
    curr.try_into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("InstrumentationKey=abc",                                              DEFAULT_INGESTION_ENDPOINT, "abc" ; "key only")]
    #[test_case("InstrumentationKey=abc;",                                             DEFAULT_INGESTION_ENDPOINT, "abc" ; "trailing separator")]
    #[test_case(" InstrumentationKey = abc ; Authorization = iKey ",                   DEFAULT_INGESTION_ENDPOINT, "abc" ; "whitespace and case")]
    #[test_case("InstrumentationKey=abc;IngestionEndpoint=http://in.example.com/",     "https://in.example.com",   "abc" ; "endpoint upgraded to https")]
    #[test_case("instrumentationkey=abc;Unknown=1;IngestionEndpoint=https://in.example.com", "https://in.example.com", "abc" ; "unknown fields ignored")]
    #[test_case("InstrumentationKey=abc;EndpointSuffix=example.com",                   "https://dc.example.com",   "abc" ; "suffix")]
    #[test_case("InstrumentationKey=abc;EndpointSuffix=example.com;Location=westeurope", "https://westeurope.dc.example.com", "abc" ; "suffix and location")]
    #[test_case("InstrumentationKey=abc;EndpointSuffix=example.com;IngestionEndpoint=https://in.example.com", "https://in.example.com", "abc" ; "explicit endpoint wins")]
    fn parse_succeeds(connection_string: &str, expected_endpoint: &'static str, expected_key: &str) {
        let result: ConnectionString = connection_string.parse().unwrap();
        assert_eq!(
            http::Uri::from_static(expected_endpoint),
            result.ingestion_endpoint
        );
        assert_eq!(expected_key, result.instrumentation_key);
    }

    #[test_case("Authorization=aad;InstrumentationKey=abc" ; "aad authorization")]
    #[test_case("InstrumentationKey=abc;Flag" ; "field without value")]
    #[test_case("InstrumentationKey=abc;Foo=bar=baz" ; "two equals signs")]
    #[test_case("IngestionEndpoint=https://in.example.com" ; "no key")]
    #[test_case("InstrumentationKey=  " ; "blank key")]
    #[test_case("InstrumentationKey=abc;IngestionEndpoint=ftp:/foo" ; "invalid endpoint")]
    fn parse_fails(connection_string: &str) {
        assert!(connection_string.parse::<ConnectionString>().is_err());
    }

    #[test]
    fn track_endpoint_appends_path() {
        let endpoint = track_endpoint(&http::Uri::from_static(DEFAULT_INGESTION_ENDPOINT)).unwrap();
        assert_eq!(
            "https://dc.services.visualstudio.com/v2/track",
            endpoint.to_string()
        );
    }
}
