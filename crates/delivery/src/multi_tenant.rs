//! MultiTenantClient - fans one entry out to every tenant it names

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use contracts::{
    parse_tenants, ContractError, DeliveryClient, LabelSet, MULTI_TENANT_LABEL, TENANT_ID_LABEL,
};

/// Decorator that turns the multi-tenant label into one entry per tenant
///
/// Each copy loses the multi-tenant label and carries its tenant in the
/// tenant-id label. Copies are sent in order and the first failure stops
/// the fan-out; copies already handed over stay delivered. Entries without
/// tenants are forwarded once with the multi-tenant label removed.
pub struct MultiTenantClient {
    inner: Arc<dyn DeliveryClient>,
}

impl MultiTenantClient {
    /// Wrap `inner`
    pub fn new(inner: Arc<dyn DeliveryClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DeliveryClient for MultiTenantClient {
    async fn handle(
        &self,
        mut labels: LabelSet,
        timestamp: DateTime<Utc>,
        line: String,
    ) -> Result<(), ContractError> {
        let Some(value) = labels.remove(MULTI_TENANT_LABEL) else {
            return self.inner.handle(labels, timestamp, line).await;
        };

        let tenants = parse_tenants(&value);
        if tenants.is_empty() {
            return self.inner.handle(labels, timestamp, line).await;
        }

        for tenant in tenants {
            let mut copy = labels.clone();
            copy.insert(TENANT_ID_LABEL.to_string(), tenant.to_string());

            if let Err(e) = self.inner.handle(copy, timestamp, line.clone()).await {
                debug!(tenant, error = %e, "Tenant fan-out aborted");
                return Err(e);
            }
        }
        Ok(())
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
