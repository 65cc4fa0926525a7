//! Read-side access to captured telemetry through the Application Insights query API.

use crate::{connection_string::append_path, models::QueryResult, Error, HttpClient};
use bytes::Bytes;
use http::{Request, Uri};
use serde::Serialize;
use tracing::debug;

const DEFAULT_QUERY_ENDPOINT: &str = "https://api.applicationinsights.io";
const DEFAULT_TIMESPAN_HOURS: u32 = 24;
const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Runs Kusto queries against an Application Insights resource.
///
/// ```no_run
/// # use application_insights_client::HttpClient;
/// # async fn run(http: impl HttpClient) -> Result<(), application_insights_client::Error> {
/// use application_insights_client::QueryClient;
///
/// let client = QueryClient::new(http, "app-id", "api-key")?
///     .with_timespan_hours(48);
/// let result = client
///     .query("customEvents | summarize total = count() by name")
///     .await?;
/// println!("{:?}", result.tables);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct QueryClient<C> {
    client: C,
    endpoint: Uri,
    application_id: String,
    api_key: String,
    timespan_hours: u32,
}

impl<C: HttpClient> QueryClient<C> {
    /// Create a client for the application with `application_id`, authenticating with a
    /// read-only `api_key`.
    pub fn new(
        client: C,
        application_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, Error> {
        let application_id = application_id.into().trim().to_string();
        let api_key = api_key.into().trim().to_string();
        if application_id.is_empty() || api_key.is_empty() {
            return Err(Error::QueryMissingCredentials);
        }
        if !application_id.chars().all(is_unreserved) {
            return Err(Error::QueryInvalidApplicationId(application_id));
        }
        Ok(QueryClient {
            client,
            endpoint: Uri::from_static(DEFAULT_QUERY_ENDPOINT),
            application_id,
            api_key,
            timespan_hours: DEFAULT_TIMESPAN_HOURS,
        })
    }

    /// Set the query API endpoint. Defaults to `https://api.applicationinsights.io`.
    pub fn with_endpoint(mut self, endpoint: Uri) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Only query telemetry from the last `hours` hours. Defaults to 24.
    pub fn with_timespan_hours(mut self, hours: u32) -> Self {
        self.timespan_hours = hours;
        self
    }

    /// Run a Kusto query.
    pub async fn query(&self, query: &str) -> Result<QueryResult, Error> {
        let uri = append_path(
            &self.endpoint,
            format!(
                "v1/apps/{}/query?timespan=PT{}H",
                self.application_id, self.timespan_hours
            ),
        )
        .map_err(|err| Error::QueryConnection(err.into()))?;
        let body = serde_json::to_vec(&QueryRequest { query })
            .map_err(Error::QuerySerializeRequest)?;
        debug!(%uri, query, "Sending analytics query");

        let request = Request::post(uri)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(http::header::ACCEPT, "application/json")
            .body(Bytes::from(body))
            .map_err(|err| Error::QueryConnection(err.into()))?;
        let response = self
            .client
            .send(request)
            .await
            .map_err(Error::QueryConnection)?;

        if !response.status().is_success() {
            return Err(Error::Query {
                status_code: response.status().as_u16(),
                message: String::from_utf8_lossy(response.body()).into_owned(),
            });
        }
        serde_json::from_slice(response.body()).map_err(Error::QueryDeserializeResponse)
    }
}

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}
