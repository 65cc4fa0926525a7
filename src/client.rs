use crate::{
    codec,
    connection_string::{
        track_endpoint, ConnectionString, CONNECTION_STRING_ENV, DEFAULT_INGESTION_ENDPOINT,
    },
    context::{Context, ContextManager},
    delivery::DeliveryEngine,
    device::Device,
    identity::{IdentityStore, MemoryIdentityStore},
    models::Tags,
    telemetry::{
        EventTelemetry, ExceptionTelemetry, MetricTelemetry, PageViewTelemetry,
        RequestTelemetry, Telemetry, TraceTelemetry,
    },
    Error, HttpClient,
};
use http::Uri;
use std::{error::Error as StdError, fmt::Debug, sync::Arc, time::Duration};
use tokio::runtime::Handle;
use tracing::{debug, error};

const TARGET_PROPERTY: &str = "target";
const VIEW_TYPE_PROPERTY: &str = "type";

/// Create a client from a connection string.
///
/// Uses the instrumentation key and ingestion endpoint of the connection string and the
/// defaults of [`ClientBuilder`] for everything else.
pub fn new_client_from_connection_string<C: HttpClient + 'static>(
    connection_string: impl AsRef<str>,
    client: C,
) -> Result<TelemetryClient<C>, Error> {
    ClientBuilder::new(client)
        .with_connection_string(connection_string.as_ref())
        .build()
}

/// Create a client from the connection string in the `APPLICATIONINSIGHTS_CONNECTION_STRING`
/// environment variable.
pub fn new_client_from_env<C: HttpClient + 'static>(
    client: C,
) -> Result<TelemetryClient<C>, Error> {
    let connection_string =
        std::env::var(CONNECTION_STRING_ENV).map_err(Error::ConnectionStringEnv)?;
    new_client_from_connection_string(connection_string, client)
}

/// Configuration for a [`TelemetryClient`].
///
/// Values set explicitly take precedence over the ones from a connection string.
pub struct ClientBuilder<C> {
    client: C,
    instrumentation_key: Option<String>,
    connection_string: Option<String>,
    ingestion_endpoint: Option<Uri>,
    identity_store: Option<Arc<dyn IdentityStore>>,
    device: Option<Device>,
    application_version: Option<String>,
    user_id: Option<String>,
    session_id: Option<String>,
    max_backlog: Option<usize>,
    runtime: Option<Handle>,
}

impl<C: Debug> Debug for ClientBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("client", &self.client)
            .field("instrumentation_key", &self.instrumentation_key)
            .field("ingestion_endpoint", &self.ingestion_endpoint)
            .field("identity_store", &self.identity_store)
            .field("device", &self.device)
            .field("application_version", &self.application_version)
            .field("max_backlog", &self.max_backlog)
            .finish()
    }
}

impl<C: HttpClient + 'static> ClientBuilder<C> {
    /// Start configuring a client that sends telemetry with `client`.
    pub fn new(client: C) -> Self {
        ClientBuilder {
            client,
            instrumentation_key: None,
            connection_string: None,
            ingestion_endpoint: None,
            identity_store: None,
            device: None,
            application_version: None,
            user_id: None,
            session_id: None,
            max_backlog: None,
            runtime: None,
        }
    }

    /// Set the instrumentation key.
    pub fn with_instrumentation_key(mut self, instrumentation_key: impl Into<String>) -> Self {
        self.instrumentation_key = Some(instrumentation_key.into());
        self
    }

    /// Take instrumentation key and ingestion endpoint from a connection string.
    ///
    /// The connection string is parsed by [`build`](Self::build).
    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    /// Set the ingestion endpoint, e.g. `https://dc.services.visualstudio.com`. `/v2/track` is
    /// appended.
    pub fn with_ingestion_endpoint(mut self, ingestion_endpoint: Uri) -> Self {
        self.ingestion_endpoint = Some(ingestion_endpoint);
        self
    }

    /// Store used to keep the anonymous user id across restarts.
    ///
    /// Defaults to a [`MemoryIdentityStore`], which forgets the id when the process exits. Use a
    /// [`FileIdentityStore`](crate::FileIdentityStore) or your own store for a stable id.
    pub fn with_identity_store(mut self, identity_store: Arc<dyn IdentityStore>) -> Self {
        self.identity_store = Some(identity_store);
        self
    }

    /// Use this device description instead of querying the host.
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Application version, sent as the `Version` property.
    pub fn with_application_version(mut self, version: impl Into<String>) -> Self {
        self.application_version = Some(version.into());
        self
    }

    /// Use this user id instead of the stored or generated one.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Use this session id instead of a generated one.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Limit the number of payloads waiting for delivery. See
    /// [`DeliveryEngine::with_max_backlog`].
    pub fn with_max_backlog(mut self, max_backlog: usize) -> Self {
        self.max_backlog = Some(max_backlog);
        self
    }

    /// Runtime to spawn sends on. Defaults to the runtime `build` is called from.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Validate the configuration and initialize the telemetry context.
    pub fn build(self) -> Result<TelemetryClient<C>, Error> {
        let mut instrumentation_key = self.instrumentation_key;
        let mut ingestion_endpoint = self.ingestion_endpoint;
        if let Some(connection_string) = self.connection_string {
            let connection_string: ConnectionString = connection_string.parse()?;
            instrumentation_key =
                instrumentation_key.or(Some(connection_string.instrumentation_key));
            ingestion_endpoint =
                ingestion_endpoint.or(Some(connection_string.ingestion_endpoint));
        }
        let instrumentation_key = instrumentation_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(Error::MissingInstrumentationKey)?;
        let endpoint = track_endpoint(
            &ingestion_endpoint.unwrap_or_else(|| Uri::from_static(DEFAULT_INGESTION_ENDPOINT)),
        )?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };

        let identity_store = self
            .identity_store
            .unwrap_or_else(|| Arc::new(MemoryIdentityStore::new()));
        let mut context =
            ContextManager::new(self.device.unwrap_or_else(Device::detect), identity_store);
        if let Some(version) = self.application_version {
            context = context.with_application_version(version);
        }
        if let Some(user_id) = self.user_id.as_deref() {
            context.set_user_id(Some(user_id));
        }
        if let Some(session_id) = self.session_id.as_deref() {
            context.set_session_id(Some(session_id));
        }
        context.initialize(&instrumentation_key)?;

        let mut delivery = DeliveryEngine::new(self.client, endpoint, runtime);
        if let Some(max_backlog) = self.max_backlog {
            delivery = delivery.with_max_backlog(max_backlog);
        }
        debug!(endpoint = %delivery.endpoint(), "Telemetry client ready");

        Ok(TelemetryClient {
            instrumentation_key,
            context,
            delivery,
        })
    }
}

/// Captures telemetry and delivers it to Application Insights.
///
/// Capture methods never fail. Records that cannot be encoded or delivered are logged and
/// dropped.
pub struct TelemetryClient<C> {
    instrumentation_key: String,
    context: ContextManager,
    delivery: DeliveryEngine<C>,
}

impl<C: Debug> Debug for TelemetryClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryClient")
            .field("instrumentation_key", &self.instrumentation_key)
            .field("context", &self.context)
            .field("delivery", &self.delivery)
            .finish()
    }
}

impl<C: HttpClient + 'static> TelemetryClient<C> {
    /// Start configuring a client.
    pub fn builder(client: C) -> ClientBuilder<C> {
        ClientBuilder::new(client)
    }

    /// Instrumentation key telemetry is sent with.
    pub fn instrumentation_key(&self) -> &str {
        &self.instrumentation_key
    }

    /// Current telemetry context.
    pub fn context(&self) -> &Context {
        self.context.context()
    }

    /// Context tags the next record would be sent with.
    pub fn tags(&self) -> Tags {
        self.context.snapshot()
    }

    /// Capture a record.
    pub fn track(&self, record: impl Into<Telemetry>) {
        let record = record.into();
        let tags = self.context.snapshot();
        match codec::encode(&record, &self.instrumentation_key, &tags) {
            Ok(payload) => {
                if let Err(err) = self.delivery.submit(payload) {
                    debug!(error = %err, name = record.name(), "Telemetry not queued");
                }
            }
            Err(err) => error!(error = %err, name = record.name(), "Failed to encode telemetry"),
        }
    }

    /// Capture a custom event.
    pub fn track_event(&self, name: impl Into<String>) {
        self.track(EventTelemetry::new(name));
    }

    /// Capture a custom event about `target`, e.g. the object the user interacted with.
    pub fn track_event_with_target(&self, name: impl Into<String>, target: impl Into<String>) {
        self.track(EventTelemetry::new(name).with_property(TARGET_PROPERTY, target));
    }

    /// Capture a custom event about `target` together with one measurement.
    pub fn track_event_with_target_metric(
        &self,
        name: impl Into<String>,
        target: impl Into<String>,
        metric_key: impl Into<String>,
        metric_value: f64,
    ) {
        self.track(
            EventTelemetry::new(name)
                .with_property(TARGET_PROPERTY, target)
                .with_metric(metric_key, metric_value),
        );
    }

    /// Capture a single metric measurement.
    pub fn track_metric(&self, name: impl Into<String>, value: f64) {
        self.track(MetricTelemetry::new(name, value));
    }

    /// Capture a single metric measurement about `target`.
    pub fn track_metric_with_target(
        &self,
        name: impl Into<String>,
        value: f64,
        target: impl Into<String>,
    ) {
        self.track(MetricTelemetry::new(name, value).with_property(TARGET_PROPERTY, target));
    }

    /// Capture a page or view being shown. The page view id is the current operation id.
    pub fn track_page_view(&self, name: impl Into<String>) {
        let operation_id = self.context.context().operation.id.clone();
        self.track(PageViewTelemetry::new(name).with_id(operation_id));
    }

    /// Capture a completed request.
    pub fn track_request(
        &self,
        url: impl Into<String>,
        duration: Duration,
        response_code: impl Into<String>,
        success: bool,
    ) {
        self.track(RequestTelemetry::new(url, duration, response_code, success));
    }

    /// Capture a diagnostic message.
    pub fn track_trace(&self, message: impl Into<String>) {
        self.track(TraceTelemetry::new(message));
    }

    /// Capture an error.
    pub fn track_exception<E: StdError + 'static>(&self, err: &E) {
        self.track(ExceptionTelemetry::from_error(err));
    }

    /// Capture an error raised while handling `target`.
    pub fn track_exception_with_target<E: StdError + 'static>(
        &self,
        err: &E,
        target: impl Into<String>,
    ) {
        self.track(ExceptionTelemetry::from_error(err).with_property(TARGET_PROPERTY, target));
    }

    /// Start a new operation for a view and capture a page view correlated with it.
    ///
    /// Returns the id of the new operation, which is also the page view id.
    pub fn change_view(&mut self, name: impl Into<String>, view_type: impl Into<String>) -> String {
        let name = name.into();
        let id = self.context.new_operation(name.clone());
        self.track(
            PageViewTelemetry::new(name)
                .with_id(id.clone())
                .with_property(VIEW_TYPE_PROPERTY, view_type),
        );
        id
    }

    /// Start a new operation. Records captured afterwards carry its id and name.
    pub fn new_operation(&mut self, name: impl Into<String>) -> String {
        self.context.new_operation(name)
    }

    /// Override the user id, or go back to the stored one with `None`.
    pub fn set_user_id(&mut self, user_id: Option<&str>) {
        self.context.set_user_id(user_id);
    }

    /// Override the session id, or start a new session with `None`.
    pub fn set_session_id(&mut self, session_id: Option<&str>) {
        self.context.set_session_id(session_id);
    }

    /// Set a property sent with every record.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.context.set_property(key, value);
    }

    /// Stop sending a property.
    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        self.context.remove_property(key)
    }

    /// Wait until all captured telemetry has been sent.
    pub async fn flush(&self) {
        self.delivery.flush().await;
    }
}
