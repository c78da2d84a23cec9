//! # Delivery
//!
//! Delivery clients and the decorators wrapped around them.
//!
//! Responsibilities:
//! - Buffer entries per endpoint and drain them into a sink
//! - Fan entries out per tenant (`MultiTenantClient`)
//! - Strip tenant routing labels (`RemoveTenantClient`)
//! - Build decorated clients from a `ClientConfig`

pub mod client;
pub mod error;
pub mod factory;
pub mod fake;
pub mod metrics;
pub mod multi_tenant;
pub mod remove_tenant;
pub mod sinks;

pub use client::BufferedClient;
pub use contracts::{DeliveryClient, EntrySink, LogEntry};
pub use error::DeliveryError;
pub use factory::{client_factory, new_client, ClientOptions};
pub use fake::{FakeClient, FakeFactory};
pub use metrics::ClientMetrics;
pub use multi_tenant::MultiTenantClient;
pub use remove_tenant::RemoveTenantClient;
pub use sinks::{FileSink, LogSink, NullSink};
