//! RemoveTenantClient - strips the multi-tenant label

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use contracts::{ContractError, DeliveryClient, LabelSet, MULTI_TENANT_LABEL};

/// Decorator that removes the multi-tenant label and forwards once
///
/// An existing tenant-id label is passed through unchanged.
pub struct RemoveTenantClient {
    inner: Arc<dyn DeliveryClient>,
}

impl RemoveTenantClient {
    /// Wrap `inner`
    pub fn new(inner: Arc<dyn DeliveryClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DeliveryClient for RemoveTenantClient {
    async fn handle(
        &self,
        mut labels: LabelSet,
        timestamp: DateTime<Utc>,
        line: String,
    ) -> Result<(), ContractError> {
        labels.remove(MULTI_TENANT_LABEL);
        self.inner.handle(labels, timestamp, line).await
    }

    fn stop(&self) {
        self.inner.stop();
    }

    async fn stop_wait(&self) {
        self.inner.stop_wait().await;
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
