use std::str::FromStr;
use std::time::Duration;

use libp2p::{identity::Keypair, noise, tcp, yamux, Multiaddr, SwarmBuilder};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::behaviour::RoomBehaviour;
use crate::command::Command;
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::events::{NodeEvent, PeerId};
use crate::runtime::NodeRuntime;

/// Owned room node. The swarm runs on a background task; interaction goes
/// through [`RoomNodeHandle`]s. Call [`RoomNode::shutdown`] to stop it.
pub struct RoomNode {
    handle: RoomNodeHandle,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

/// Cloneable handle for interacting with the node.
#[derive(Clone)]
pub struct RoomNodeHandle {
    command_tx: mpsc::Sender<Command>,
    local_peer_id: PeerId,
}

impl RoomNode {
    /// Build the swarm and spawn its event loop. No transport is bound until
    /// [`RoomNodeHandle::listen`] is called.
    pub async fn spawn(
        config: NodeConfig,
    ) -> Result<(RoomNode, mpsc::Receiver<NodeEvent>), NodeError> {
        let keypair = Keypair::generate_ed25519();
        let local_peer_id = PeerId::from(keypair.public().to_peer_id());
        let behaviour = RoomBehaviour::new(&keypair, &config)?;

        let mut swarm = SwarmBuilder::with_existing_identity(keypair)
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )
            .map_err(|e| NodeError::NetworkError(e.to_string()))?
            .with_quic()
            .with_dns()
            .map_err(|e| NodeError::NetworkError(e.to_string()))?
            .with_behaviour(|_| behaviour)
            .map_err(|e| NodeError::NetworkError(e.to_string()))?
            .with_swarm_config(|c| {
                c.with_idle_connection_timeout(Duration::from_secs(config.idle_timeout_secs))
            })
            .build();

        for addr_str in &config.bootstrap_peers {
            match Multiaddr::from_str(addr_str) {
                Ok(addr) => {
                    if let Some(peer_id) = extract_peer_id(&addr) {
                        swarm
                            .behaviour_mut()
                            .kad
                            .add_address(&peer_id, addr.clone());
                    }
                    if let Err(e) = swarm.dial(addr) {
                        warn!(peer = %addr_str, "dial of bootstrap peer failed: {}", e);
                    }
                }
                Err(e) => warn!(peer = %addr_str, "invalid bootstrap multiaddr: {}", e),
            }
        }

        let (command_tx, command_rx) = mpsc::channel(100);
        let (event_tx, event_rx) = mpsc::channel(100);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let runtime = NodeRuntime::new(swarm, command_rx, event_tx, config.topic_prefix.clone());
        tokio::spawn(async move {
            tokio::select! {
                _ = runtime.run() => {}
                _ = shutdown_rx => {}
            }
        });

        let handle = RoomNodeHandle {
            command_tx,
            local_peer_id,
        };
        let node = RoomNode {
            handle,
            shutdown_tx: Some(shutdown_tx),
        };
        Ok((node, event_rx))
    }

    pub fn handle(&self) -> RoomNodeHandle {
        self.handle.clone()
    }

    pub async fn shutdown(mut self) -> Result<(), NodeError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        Ok(())
    }
}

impl RoomNodeHandle {
    /// The node's own peer id, fixed at spawn.
    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    /// Bind TCP on `port` (0 lets the OS pick) plus QUIC on a random UDP
    /// port, then bootstrap Kademlia.
    pub async fn listen(&self, port: u16) -> Result<(), NodeError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(Command::Listen {
                port,
                respond_to: tx,
            })
            .await
            .map_err(|_| NodeError::ChannelClosed)?;
        rx.await.map_err(|_| NodeError::ChannelClosed)?
    }

    /// Subscribe the room's topic and make it the target of [`publish`].
    ///
    /// [`publish`]: RoomNodeHandle::publish
    pub async fn join_room(&self, room_id: &str) -> Result<(), NodeError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(Command::JoinRoom {
                room_id: room_id.to_string(),
                respond_to: tx,
            })
            .await
            .map_err(|_| NodeError::ChannelClosed)?;
        rx.await.map_err(|_| NodeError::ChannelClosed)?
    }

    /// Publish raw bytes to the current room. Fails with
    /// [`NodeError::NoRoomJoined`] before `join_room`.
    pub async fn publish(&self, data: Vec<u8>) -> Result<(), NodeError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(Command::Publish {
                data,
                respond_to: tx,
            })
            .await
            .map_err(|_| NodeError::ChannelClosed)?;
        rx.await.map_err(|_| NodeError::ChannelClosed)?
    }

    pub async fn connected_peers(&self) -> Result<Vec<PeerId>, NodeError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(Command::ConnectedPeers { respond_to: tx })
            .await
            .map_err(|_| NodeError::ChannelClosed)?;
        rx.await.map_err(|_| NodeError::ChannelClosed)
    }
}

fn extract_peer_id(addr: &Multiaddr) -> Option<libp2p::PeerId> {
    use libp2p::core::multiaddr::Protocol;
    addr.iter().find_map(|p| match p {
        Protocol::P2p(id) => Some(id),
        _ => None,
    })
}
