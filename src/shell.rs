//! Blocking shim between the C ABI and the async node.

use anyhow::{anyhow, Context, Result};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::debug;

use roomsync_p2p::{NodeConfig, NodeEvent, RoomNode, RoomNodeHandle};
use roomsync_protocol::{HistoryEntry, SyncEnvelope};

use crate::callbacks;

/// Per-node state owned across the FFI boundary. Each shell carries its own
/// tokio runtime; hosts typically create one node per process.
pub struct NodeShell {
    runtime: Runtime,
    config: Option<NodeConfig>,
    node: Option<RoomNode>,
    handle: Option<RoomNodeHandle>,
}

impl NodeShell {
    /// Configuration is defaults overlaid with `ROOMSYNC_*` env vars; the
    /// C surface has no config parameters.
    pub fn new() -> Result<Self> {
        let config = NodeConfig::from_env().context("loading node configuration")?;
        let runtime = Runtime::new().context("starting tokio runtime")?;
        Ok(Self {
            runtime,
            config: Some(config),
            node: None,
            handle: None,
        })
    }

    /// Build and start the swarm, and start forwarding its events to the
    /// registered callbacks. One-shot: a second call fails.
    pub fn initialize(&mut self) -> Result<()> {
        let config = self
            .config
            .take()
            .ok_or_else(|| anyhow!("node already initialized"))?;
        let (node, event_rx) = self.runtime.block_on(RoomNode::spawn(config))?;
        self.handle = Some(node.handle());
        self.runtime.spawn(pump_events(event_rx));
        self.node = Some(node);
        Ok(())
    }

    fn handle(&self) -> Result<&RoomNodeHandle> {
        self.handle
            .as_ref()
            .ok_or_else(|| anyhow!("node not initialized"))
    }

    pub fn start_listening(&self, port: u16) -> Result<()> {
        let handle = self.handle()?;
        self.runtime.block_on(handle.listen(port))?;
        Ok(())
    }

    pub fn join_room(&self, room_id: &str) -> Result<()> {
        let handle = self.handle()?;
        self.runtime.block_on(handle.join_room(room_id))?;
        Ok(())
    }

    pub fn send_message(&self, data: &[u8]) -> Result<()> {
        let handle = self.handle()?;
        self.runtime.block_on(handle.publish(data.to_vec()))?;
        Ok(())
    }

    /// Parse host-supplied entries, wrap them in a timestamped envelope, and
    /// publish through the current room.
    pub fn send_history_sync(&self, entries_json: &str, device_id: &str) -> Result<()> {
        let entries: Vec<HistoryEntry> =
            serde_json::from_str(entries_json).context("parsing history entries")?;
        let envelope = SyncEnvelope::history(entries, device_id);
        let payload = serde_json::to_vec(&envelope).context("encoding sync envelope")?;
        let handle = self.handle()?;
        self.runtime.block_on(handle.publish(payload))?;
        Ok(())
    }

    pub fn peer_id(&self) -> Result<String> {
        Ok(self.handle()?.local_peer_id().to_string())
    }

    /// Stop the node, then drop the runtime without blocking on in-flight
    /// I/O. Consumes the shell; there is nothing to use afterwards.
    pub fn shutdown(self) {
        let NodeShell { runtime, node, .. } = self;
        if let Some(node) = node {
            if let Err(e) = runtime.block_on(node.shutdown()) {
                debug!("node shutdown: {}", e);
            }
        }
        runtime.shutdown_background();
    }
}

/// Forward node events to whatever C callbacks are currently registered.
async fn pump_events(mut events: mpsc::Receiver<NodeEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            NodeEvent::Message { from, topic, data } => {
                callbacks::dispatch_message(from.as_str(), &topic, &data);
            }
            NodeEvent::PeerConnected { peer_id } => {
                callbacks::dispatch_peer(peer_id.as_str(), true);
            }
            NodeEvent::PeerDisconnected { peer_id } => {
                callbacks::dispatch_peer(peer_id.as_str(), false);
            }
            NodeEvent::Started { local_peer_id } => {
                debug!(peer = %local_peer_id, "node online");
            }
            NodeEvent::Listening { .. } | NodeEvent::PeerDiscovered { .. } => {}
        }
    }
}
