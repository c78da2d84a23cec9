//! ClusterRegistry - cluster name to delivery client map

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{ClientConfig, ClientFactory, ClusterSpec, ControllerConfig, DeliveryClient};
use observability::{error_kind, record_cluster_event, record_error, set_dynamic_clients};

use crate::error::{ControllerError, Result};
use crate::target::derive_client_config;

type ClientMap = HashMap<String, Arc<ClientHandle>>;

/// Registry entry
struct ClientHandle {
    client: Arc<dyn DeliveryClient>,
    /// Config the client was built from, compared on update
    config: ClientConfig,
    /// Set once, before the client is torn down
    stopped: AtomicBool,
}

impl ClientHandle {
    fn new(client: Arc<dyn DeliveryClient>, config: ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            client,
            config,
            stopped: AtomicBool::new(false),
        })
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Returns true only for the call that flipped the flag
    fn mark_stopped(&self) -> bool {
        self.stopped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Registry of per-cluster delivery clients
///
/// Holds at most one live client per cluster name. A handle is marked stopped
/// before its client is torn down, so lookups never hand out a client that is
/// being drained.
pub struct ClusterRegistry {
    base: ClientConfig,
    controller: ControllerConfig,
    factory: ClientFactory,
    clients: Arc<RwLock<ClientMap>>,
}

impl ClusterRegistry {
    /// Create an empty registry
    ///
    /// `base` is the template every cluster client is derived from.
    pub fn new(base: ClientConfig, controller: ControllerConfig, factory: ClientFactory) -> Self {
        Self {
            base,
            controller,
            factory,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Live client for cluster `name`
    ///
    /// `None` when the cluster is unknown or its client is stopped.
    pub fn get_client(&self, name: &str) -> Option<Arc<dyn DeliveryClient>> {
        self.live_handle(name).map(|handle| Arc::clone(&handle.client))
    }

    /// Register a client for a new cluster
    ///
    /// Does nothing when a live client already exists.
    ///
    /// # Errors
    /// Returns an error when the factory fails; the registry is left unchanged
    #[instrument(name = "registry_on_cluster_added", skip(self, spec))]
    pub fn on_cluster_added(&self, name: &str, spec: &ClusterSpec) -> Result<()> {
        if self.live_handle(name).is_some() {
            debug!(cluster = name, "Cluster already registered");
            return Ok(());
        }

        let handle = self.build(name, spec)?;

        let inserted = {
            let mut clients = self.clients.write();
            let occupied = clients.get(name).is_some_and(|current| !current.is_stopped());
            if !occupied {
                clients.insert(name.to_string(), Arc::clone(&handle));
                publish_client_count(&clients);
            }
            !occupied
        };

        if !inserted {
            // Lost a race against a concurrent add
            handle.client.stop();
            return Ok(());
        }

        record_cluster_event("added");
        info!(cluster = name, endpoint = handle.client.endpoint(), "Cluster client added");
        Ok(())
    }

    /// Apply a changed cluster spec
    ///
    /// An unchanged derived config keeps the current client. Otherwise a new
    /// client replaces it and the old one is drained. Unknown or stopped
    /// clusters are added.
    ///
    /// # Errors
    /// Returns an error when the factory fails; the current client stays in place
    #[instrument(name = "registry_on_cluster_updated", skip(self, spec))]
    pub async fn on_cluster_updated(&self, name: &str, spec: &ClusterSpec) -> Result<()> {
        let Some(current) = self.live_handle(name) else {
            debug!(cluster = name, "Update for unknown cluster, adding it");
            return self.on_cluster_added(name, spec);
        };

        let config = derive_client_config(&self.base, &self.controller, name, spec);
        if current.config == config {
            debug!(cluster = name, "Cluster config unchanged");
            return Ok(());
        }

        let handle = self.build_from(name, config)?;

        let swapped = {
            let mut clients = self.clients.write();
            let still_current = clients
                .get(name)
                .is_some_and(|existing| Arc::ptr_eq(existing, &current));
            if still_current && current.mark_stopped() {
                clients.insert(name.to_string(), Arc::clone(&handle));
                true
            } else {
                false
            }
        };

        if !swapped {
            // Someone else changed the entry meanwhile; theirs wins
            warn!(cluster = name, "Cluster changed during update, discarding new client");
            handle.client.stop();
            return Ok(());
        }

        record_cluster_event("updated");
        info!(
            cluster = name,
            endpoint = handle.client.endpoint(),
            previous = current.client.endpoint(),
            "Cluster client replaced"
        );

        current.client.stop_wait().await;
        Ok(())
    }

    /// Remove cluster `name`
    ///
    /// The client is marked stopped before this returns, so later lookups
    /// miss it. Draining and removal run in a background task whose handle
    /// is returned. Without a runtime the client is stopped and removed
    /// immediately.
    #[instrument(name = "registry_on_cluster_deleted", skip(self))]
    pub fn on_cluster_deleted(&self, name: &str) -> Option<JoinHandle<()>> {
        let handle = {
            let clients = self.clients.write();
            let handle = clients.get(name)?;
            if !handle.mark_stopped() {
                debug!(cluster = name, "Cluster already stopping");
                return None;
            }
            publish_client_count(&clients);
            Arc::clone(handle)
        };

        record_cluster_event("deleted");
        info!(cluster = name, "Cluster deleted, draining client");

        let clients = Arc::clone(&self.clients);
        let name = name.to_string();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(async move {
                handle.client.stop_wait().await;
                remove_if_current(&clients, &name, &handle);
                debug!(cluster = %name, "Cluster client drained");
            })),
            Err(_) => {
                warn!(cluster = %name, "No runtime, stopping client without draining");
                handle.client.stop();
                remove_if_current(&clients, &name, &handle);
                None
            }
        }
    }

    /// Stop every client immediately and empty the registry
    #[instrument(name = "registry_stop_all", skip(self))]
    pub fn stop_all(&self) {
        let handles = self.take_all();
        for handle in &handles {
            handle.client.stop();
        }
        info!(count = handles.len(), "All cluster clients stopped");
    }

    /// Drain every client and empty the registry
    #[instrument(name = "registry_stop_all_wait", skip(self))]
    pub async fn stop_all_wait(&self) {
        let handles = self.take_all();
        for handle in &handles {
            handle.client.stop_wait().await;
        }
        info!(count = handles.len(), "All cluster clients drained");
    }

    /// Names of clusters with a live client, sorted
    pub fn cluster_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .clients
            .read()
            .iter()
            .filter(|(_, handle)| !handle.is_stopped())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of live clients
    pub fn len(&self) -> usize {
        live_count(&self.clients.read())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_handle(&self, name: &str) -> Option<Arc<ClientHandle>> {
        self.clients
            .read()
            .get(name)
            .filter(|handle| !handle.is_stopped())
            .cloned()
    }

    fn build(&self, name: &str, spec: &ClusterSpec) -> Result<Arc<ClientHandle>> {
        let config = derive_client_config(&self.base, &self.controller, name, spec);
        self.build_from(name, config)
    }

    fn build_from(&self, name: &str, config: ClientConfig) -> Result<Arc<ClientHandle>> {
        let client = (self.factory)(&config).map_err(|e| {
            record_error(error_kind::CLIENT_CREATION);
            warn!(cluster = name, url = %config.url, error = %e, "Client creation failed");
            ControllerError::client_creation(name, e)
        })?;
        Ok(ClientHandle::new(client, config))
    }

    fn take_all(&self) -> Vec<Arc<ClientHandle>> {
        let handles: Vec<_> = {
            let mut clients = self.clients.write();
            clients.drain().map(|(_, handle)| handle).collect()
        };
        for handle in &handles {
            handle.mark_stopped();
        }
        set_dynamic_clients(0);
        handles
    }
}

fn remove_if_current(clients: &RwLock<ClientMap>, name: &str, handle: &Arc<ClientHandle>) {
    let mut clients = clients.write();
    if clients
        .get(name)
        .is_some_and(|current| Arc::ptr_eq(current, handle))
    {
        clients.remove(name);
    }
}

fn live_count(clients: &ClientMap) -> usize {
    clients.values().filter(|handle| !handle.is_stopped()).count()
}

fn publish_client_count(clients: &ClientMap) {
    set_dynamic_clients(live_count(clients));
}
