//! In-memory client and factory for tests
//!
//! `FakeClient` records accepted entries and the lifecycle call that
//! stopped it. `FakeFactory` hands out fake clients and remembers which
//! configs it was asked to build.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use contracts::{ClientConfig, ClientFactory, ContractError, DeliveryClient, LabelSet, LogEntry};

const RUNNING: u8 = 0;
const STOPPED: u8 = 1;
const GRACEFULLY_STOPPED: u8 = 2;

/// Client that keeps every accepted entry in memory
pub struct FakeClient {
    endpoint: String,
    state: AtomicU8,
    entries: Mutex<Vec<LogEntry>>,
    handled: AtomicUsize,
    fail_after: Option<usize>,
}

impl FakeClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: AtomicU8::new(RUNNING),
            entries: Mutex::new(Vec::new()),
            handled: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    /// Client that accepts `accepted` entries and rejects the rest
    pub fn failing_after(endpoint: impl Into<String>, accepted: usize) -> Self {
        Self {
            fail_after: Some(accepted),
            ..Self::new(endpoint)
        }
    }

    /// Entries accepted so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Number of `handle` calls, accepted or not
    pub fn handled(&self) -> usize {
        self.handled.load(Ordering::Acquire)
    }

    /// Stopped through `stop`
    pub fn is_stopped(&self) -> bool {
        self.state.load(Ordering::Acquire) == STOPPED
    }

    /// Stopped through `stop_wait`
    pub fn is_gracefully_stopped(&self) -> bool {
        self.state.load(Ordering::Acquire) == GRACEFULLY_STOPPED
    }

    fn transition(&self, to: u8) {
        let _ = self
            .state
            .compare_exchange(RUNNING, to, Ordering::AcqRel, Ordering::Acquire);
    }
}

#[async_trait]
impl DeliveryClient for FakeClient {
    async fn handle(
        &self,
        labels: LabelSet,
        timestamp: DateTime<Utc>,
        line: String,
    ) -> Result<(), ContractError> {
        let seen = self.handled.fetch_add(1, Ordering::AcqRel);
        if self.state.load(Ordering::Acquire) != RUNNING {
            return Err(ContractError::client_stopped(&self.endpoint));
        }
        if self.fail_after.is_some_and(|limit| seen >= limit) {
            return Err(ContractError::sink_write(&self.endpoint, "rejected by fake client"));
        }
        self.entries.lock().push(LogEntry::new(labels, timestamp, line));
        Ok(())
    }

    fn stop(&self) {
        self.transition(STOPPED);
    }

    async fn stop_wait(&self) {
        self.transition(GRACEFULLY_STOPPED);
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Factory producing `FakeClient`s
#[derive(Default)]
pub struct FakeFactory {
    built: Mutex<Vec<(ClientConfig, Arc<FakeClient>)>>,
    failing_urls: Mutex<HashSet<String>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make construction fail for configs with this url
    pub fn fail_for(&self, url: impl Into<String>) {
        self.failing_urls.lock().insert(url.into());
    }

    pub fn clear_failures(&self) {
        self.failing_urls.lock().clear();
    }

    /// Every client built so far, oldest first
    pub fn built(&self) -> Vec<(ClientConfig, Arc<FakeClient>)> {
        self.built.lock().clone()
    }

    /// Most recent client built for `url`
    pub fn client_for(&self, url: &str) -> Option<Arc<FakeClient>> {
        self.built
            .lock()
            .iter()
            .rev()
            .find(|(config, _)| config.url == url)
            .map(|(_, client)| Arc::clone(client))
    }

    fn build(&self, config: &ClientConfig) -> Result<Arc<FakeClient>, ContractError> {
        if self.failing_urls.lock().contains(&config.url) {
            return Err(ContractError::client_creation(&config.url, "refused by fake factory"));
        }
        let client = Arc::new(FakeClient::new(config.url.clone()));
        self.built.lock().push((config.clone(), Arc::clone(&client)));
        Ok(client)
    }

    /// Factory closure backed by this instance
    pub fn factory(self: &Arc<Self>) -> ClientFactory {
        let this = Arc::clone(self);
        Arc::new(move |config: &ClientConfig| {
            this.build(config)
                .map(|client| client as Arc<dyn DeliveryClient>)
        })
    }
}
