//! An embedded [Azure Application Insights] telemetry client.
//!
//! [Azure Application Insights]: https://docs.microsoft.com/en-us/azure/azure-monitor/app/app-insights-overview
//!
//! **Disclaimer**: This is not an official Microsoft product.
//!
//! The client captures events, metrics, page views, requests, traces and exceptions, attaches
//! device, user, session and operation context to each of them and sends them to the
//! Application Insights `v2/track` endpoint. Records are delivered one request at a time, in the
//! order they were captured.
//!
//! # Usage
//!
//! ```no_run
//! use application_insights_client::{EventTelemetry, FileIdentityStore, TelemetryClient};
//! use std::sync::Arc;
//!
//! # #[cfg(feature = "reqwest-client")]
//! #[tokio::main]
//! async fn main() -> Result<(), application_insights_client::Error> {
//!     let mut client = TelemetryClient::builder(reqwest::Client::new())
//!         .with_connection_string("InstrumentationKey=...")
//!         .with_identity_store(Arc::new(FileIdentityStore::new("telemetry/identity.json")))
//!         .with_application_version(env!("CARGO_PKG_VERSION"))
//!         .build()?;
//!
//!     client.change_view("Menu", "2D");
//!     client.track(
//!         EventTelemetry::new("Tap")
//!             .with_property("target", "Door")
//!             .with_metric("Taps", 1.0),
//!     );
//!     client.track_metric("Fps", 60.0);
//!
//!     client.flush().await;
//!     Ok(())
//! }
//! # #[cfg(not(feature = "reqwest-client"))]
//! # fn main() {}
//! ```
//!
//! # Context
//!
//! Every record carries these tags:
//!
//! | Tag                   | Source                                                  |
//! | --------------------- | ------------------------------------------------------- |
//! | `ai.device.*`         | [`Device::detect`] or [`ClientBuilder::with_device`]    |
//! | `ai.user.id`          | [`IdentityStore`], generated once and then reused       |
//! | `ai.session.id`       | Generated when the client is built                      |
//! | `ai.operation.id`     | [`TelemetryClient::new_operation`]                      |
//! | `ai.operation.name`   | [`TelemetryClient::new_operation`], `Root` initially    |
//!
//! plus the client properties `Language`, `Platform`, `OS`, `OSVersion`, `DeviceVersion`,
//! `Version` and anything set with [`TelemetryClient::set_property`].
//!
//! # Logging
//!
//! Delivery outcomes and dropped records are logged with [`tracing`]. The crate never installs
//! a subscriber.
#![doc(html_root_url = "https://docs.rs/application-insights-client/0.1.0")]
#![deny(missing_docs, unreachable_pub, missing_debug_implementations)]

mod client;
mod codec;
mod connection_string;
mod context;
mod convert;
mod delivery;
mod device;
mod error;
mod http_client;
mod identity;
mod models;
mod query;
mod telemetry;
mod uploader;

pub use client::{
    new_client_from_connection_string, new_client_from_env, ClientBuilder, TelemetryClient,
};
pub use codec::encode;
pub use connection_string::ParseError;
pub use context::{Context, ContextManager, Operation, Session, User};
pub use delivery::DeliveryEngine;
pub use device::Device;
pub use error::{Error, ErrorKind};
pub use http_client::{HttpClient, HttpError};
pub use identity::{FileIdentityStore, IdentityStore, MemoryIdentityStore, USER_ID_KEY};
pub use models::{Column, Measurements, Properties, QueryResult, Table, Tags};
pub use query::QueryClient;
pub use telemetry::{
    EventTelemetry, ExceptionTelemetry, MetricTelemetry, PageViewTelemetry, RequestTelemetry,
    Telemetry, TraceTelemetry,
};
