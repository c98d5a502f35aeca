//! Weave runtime - shared network state, event broadcast and heartbeat

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use weave_core::{
    Agent, AgentNetwork, AgentProfile, Delivery, FieldState, HeartbeatReport, Message,
    NetworkConfig, NetworkEvent, NetworkStats, Recipient, Registration, Result,
};

/// Configuration for the Weave runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval_ms: u64,
    /// Broadcast channel capacity; slow subscribers lag past this
    pub event_capacity: usize,
    /// Network tunables
    pub network: NetworkConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 30_000,
            event_capacity: 1024,
            network: NetworkConfig::default(),
        }
    }
}

struct HeartbeatTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// The Weave async runtime
pub struct WeaveRuntime {
    /// Registry and topology, one consistency domain
    network: Arc<RwLock<AgentNetwork>>,
    config: RuntimeConfig,
    events: broadcast::Sender<NetworkEvent>,
    heartbeat: Mutex<Option<HeartbeatTask>>,
    heartbeat_count: Arc<AtomicU64>,
}

impl WeaveRuntime {
    /// Create a runtime over an empty network
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let network = AgentNetwork::new(config.network.clone())?;
        Ok(Self::with_network(network, config))
    }

    /// Create a runtime over an existing network
    pub fn with_network(network: AgentNetwork, config: RuntimeConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            network: Arc::new(RwLock::new(network)),
            config,
            events,
            heartbeat: Mutex::new(None),
            heartbeat_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.events.subscribe()
    }

    /// Shared handle to the network
    pub fn network(&self) -> Arc<RwLock<AgentNetwork>> {
        Arc::clone(&self.network)
    }

    /// Run `op` under the write lock and publish what it emitted
    async fn mutate<R>(&self, op: impl FnOnce(&mut AgentNetwork) -> R) -> R {
        let mut network = self.network.write().await;
        let result = op(&mut network);
        publish(&self.events, network.drain_events());
        result
    }

    pub async fn register_agent(&self, profile: AgentProfile) -> Result<Registration> {
        self.mutate(|network| network.register_agent(profile)).await
    }

    pub async fn establish_connection(&self, a: &str, b: &str) -> Result<bool> {
        self.mutate(|network| network.establish_connection(a, b)).await
    }

    pub async fn update_trust(&self, agent_id: &str, delta: f64) -> Result<f64> {
        self.mutate(|network| network.update_trust(agent_id, delta)).await
    }

    pub async fn send_message(
        &self,
        from: &str,
        to: impl Into<Recipient>,
        message: Message,
    ) -> Result<Delivery> {
        let to = to.into();
        self.mutate(|network| network.send_message(from, to, message)).await
    }

    /// Run one heartbeat tick now
    pub async fn heartbeat(&self) -> HeartbeatReport {
        run_heartbeat(&self.network, &self.events, &self.heartbeat_count).await
    }

    pub async fn agent(&self, id: &str) -> Option<Agent> {
        self.network.read().await.agent(id).cloned()
    }

    pub async fn agent_count(&self) -> usize {
        self.network.read().await.agent_count()
    }

    pub async fn field_state(&self) -> FieldState {
        self.network.read().await.field_state().clone()
    }

    pub async fn stats(&self) -> NetworkStats {
        self.network.read().await.stats()
    }

    /// Heartbeat ticks completed so far
    pub fn heartbeat_count(&self) -> u64 {
        self.heartbeat_count.load(Ordering::SeqCst)
    }

    /// Spawn the periodic heartbeat; `false` if it is already running
    pub async fn start(&self) -> bool {
        let mut slot = self.heartbeat.lock().await;
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            return false;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(heartbeat_loop(
            Arc::clone(&self.network),
            self.events.clone(),
            Arc::clone(&self.heartbeat_count),
            self.config.heartbeat_interval_ms,
            shutdown_rx,
        ));

        *slot = Some(HeartbeatTask { shutdown, handle });
        true
    }

    pub async fn is_running(&self) -> bool {
        self.heartbeat
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Stop the heartbeat and wait for it to exit
    pub async fn stop(&self) {
        let task = self.heartbeat.lock().await.take();
        if let Some(task) = task {
            let _ = task.shutdown.send(true);
            match task.handle.await {
                Ok(()) => info!("Weave heartbeat stopped"),
                Err(e) => error!("Weave heartbeat task failed: {}", e),
            }
        }
    }
}

impl Drop for WeaveRuntime {
    fn drop(&mut self) {
        if let Some(task) = self.heartbeat.get_mut().take() {
            task.handle.abort();
        }
    }
}

fn publish(events: &broadcast::Sender<NetworkEvent>, batch: Vec<NetworkEvent>) {
    for event in batch {
        // No subscribers is not an error
        let _ = events.send(event);
    }
}

async fn run_heartbeat(
    network: &RwLock<AgentNetwork>,
    events: &broadcast::Sender<NetworkEvent>,
    count: &AtomicU64,
) -> HeartbeatReport {
    let mut network = network.write().await;
    let report = network.heartbeat();
    publish(events, network.drain_events());

    let tick = count.fetch_add(1, Ordering::SeqCst) + 1;
    debug!(
        "Heartbeat {}: {} active, {} decayed",
        tick, report.active_agents, report.decayed_agents
    );
    report
}

async fn heartbeat_loop(
    network: Arc<RwLock<AgentNetwork>>,
    events: broadcast::Sender<NetworkEvent>,
    count: Arc<AtomicU64>,
    interval_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(Duration::from_millis(interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    info!("Weave heartbeat starting with {}ms interval", interval_ms);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_heartbeat(&network, &events, &count).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
