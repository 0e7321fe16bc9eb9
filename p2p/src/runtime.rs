use std::collections::HashSet;

use futures::StreamExt;
use libp2p::gossipsub::{self, IdentTopic};
use libp2p::swarm::SwarmEvent;
use libp2p::{identify, mdns, Multiaddr, Swarm};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use roomsync_protocol::{room_topic, sync_topic};

use crate::behaviour::{RoomBehaviour, RoomBehaviourEvent};
use crate::command::Command;
use crate::error::NodeError;
use crate::events::{NodeEvent, PeerId};

/// The swarm task: owns the libp2p swarm, serves handle commands, and turns
/// swarm events into [`NodeEvent`]s.
pub struct NodeRuntime {
    swarm: Swarm<RoomBehaviour>,
    command_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::Sender<NodeEvent>,
    topic_prefix: String,
    room_topic: Option<String>,
    connected: HashSet<libp2p::PeerId>,
}

impl NodeRuntime {
    pub fn new(
        swarm: Swarm<RoomBehaviour>,
        command_rx: mpsc::Receiver<Command>,
        event_tx: mpsc::Sender<NodeEvent>,
        topic_prefix: String,
    ) -> Self {
        Self {
            swarm,
            command_rx,
            event_tx,
            topic_prefix,
            room_topic: None,
            connected: HashSet::new(),
        }
    }

    pub async fn run(mut self) {
        // Every node listens for history broadcasts, room or no room.
        let sync = IdentTopic::new(sync_topic(&self.topic_prefix));
        if let Err(e) = self.swarm.behaviour_mut().gossipsub.subscribe(&sync) {
            warn!("subscribe to sync topic failed: {}", e);
        }

        let local_peer_id = PeerId::from(*self.swarm.local_peer_id());
        self.emit(NodeEvent::Started { local_peer_id }).await;

        loop {
            tokio::select! {
                maybe_command = self.command_rx.recv() => match maybe_command {
                    Some(command) => self.handle_command(command),
                    // All handles dropped; stop the swarm.
                    None => break,
                },
                event = self.swarm.select_next_some() => self.handle_swarm_event(event).await,
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Listen { port, respond_to } => {
                let _ = respond_to.send(self.start_listening(port));
            }
            Command::JoinRoom {
                room_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.join_room(&room_id));
            }
            Command::Publish { data, respond_to } => {
                let _ = respond_to.send(self.publish(data));
            }
            Command::ConnectedPeers { respond_to } => {
                let peers = self.connected.iter().copied().map(PeerId::from).collect();
                let _ = respond_to.send(peers);
            }
        }
    }

    fn start_listening(&mut self, port: u16) -> Result<(), NodeError> {
        let tcp: Multiaddr = format!("/ip4/0.0.0.0/tcp/{}", port)
            .parse()
            .map_err(|e: libp2p::multiaddr::Error| NodeError::NetworkError(e.to_string()))?;
        self.swarm
            .listen_on(tcp)
            .map_err(|e| NodeError::NetworkError(e.to_string()))?;

        // QUIC on a random UDP port; better odds through NATs than TCP.
        let quic: Multiaddr = "/ip4/0.0.0.0/udp/0/quic-v1"
            .parse()
            .map_err(|e: libp2p::multiaddr::Error| NodeError::NetworkError(e.to_string()))?;
        self.swarm
            .listen_on(quic)
            .map_err(|e| NodeError::NetworkError(e.to_string()))?;

        if let Err(e) = self.swarm.behaviour_mut().kad.bootstrap() {
            // No known peers yet; discovery fills the table later.
            debug!("kademlia bootstrap deferred: {}", e);
        }
        Ok(())
    }

    fn join_room(&mut self, room_id: &str) -> Result<(), NodeError> {
        let topic_name = room_topic(&self.topic_prefix, room_id);
        let topic = IdentTopic::new(topic_name.clone());
        self.swarm
            .behaviour_mut()
            .gossipsub
            .subscribe(&topic)
            .map_err(|e| NodeError::Subscribe {
                topic: topic_name.clone(),
                reason: e.to_string(),
            })?;
        info!(topic = %topic_name, "joined room");
        self.room_topic = Some(topic_name);
        Ok(())
    }

    fn publish(&mut self, data: Vec<u8>) -> Result<(), NodeError> {
        let topic_name = self.room_topic.as_ref().ok_or(NodeError::NoRoomJoined)?;
        let topic = IdentTopic::new(topic_name.clone());
        self.swarm
            .behaviour_mut()
            .gossipsub
            .publish(topic, data)
            .map(|_| ())
            .map_err(|e| NodeError::Publish {
                topic: topic_name.clone(),
                reason: e.to_string(),
            })
    }

    async fn handle_swarm_event(&mut self, event: SwarmEvent<RoomBehaviourEvent>) {
        match event {
            SwarmEvent::Behaviour(RoomBehaviourEvent::Gossipsub(gossipsub::Event::Message {
                propagation_source,
                message,
                ..
            })) => {
                let from = PeerId::from(message.source.unwrap_or(propagation_source));
                let topic = message.topic.as_str().to_string();
                self.emit(NodeEvent::Message {
                    from,
                    topic,
                    data: message.data,
                })
                .await;
            }
            SwarmEvent::Behaviour(RoomBehaviourEvent::Mdns(mdns::Event::Discovered(peers))) => {
                for (peer_id, addr) in peers {
                    debug!(peer = %peer_id, %addr, "mdns discovered peer");
                    self.swarm
                        .behaviour_mut()
                        .kad
                        .add_address(&peer_id, addr.clone());
                    if !self.connected.contains(&peer_id) {
                        if let Err(e) = self.swarm.dial(addr) {
                            debug!(peer = %peer_id, "dial after discovery failed: {}", e);
                        }
                    }
                    self.emit(NodeEvent::PeerDiscovered {
                        peer_id: PeerId::from(peer_id),
                    })
                    .await;
                }
            }
            SwarmEvent::Behaviour(RoomBehaviourEvent::Mdns(mdns::Event::Expired(peers))) => {
                for (peer_id, addr) in peers {
                    self.swarm
                        .behaviour_mut()
                        .kad
                        .remove_address(&peer_id, &addr);
                }
            }
            SwarmEvent::Behaviour(RoomBehaviourEvent::Identify(identify::Event::Received {
                peer_id,
                info,
                ..
            })) => {
                // Identify tells us where a peer is actually reachable; feed
                // those addresses to the routing table.
                for addr in info.listen_addrs {
                    self.swarm.behaviour_mut().kad.add_address(&peer_id, addr);
                }
            }
            SwarmEvent::Behaviour(_) => {}
            SwarmEvent::NewListenAddr { address, .. } => {
                info!(%address, "listening");
                self.emit(NodeEvent::Listening {
                    address: address.to_string(),
                })
                .await;
            }
            SwarmEvent::ConnectionEstablished {
                peer_id,
                num_established,
                ..
            } => {
                if num_established.get() == 1 {
                    self.connected.insert(peer_id);
                    self.emit(NodeEvent::PeerConnected {
                        peer_id: PeerId::from(peer_id),
                    })
                    .await;
                }
            }
            SwarmEvent::ConnectionClosed {
                peer_id,
                num_established,
                ..
            } => {
                if num_established == 0 {
                    self.connected.remove(&peer_id);
                    self.emit(NodeEvent::PeerDisconnected {
                        peer_id: PeerId::from(peer_id),
                    })
                    .await;
                }
            }
            _ => {}
        }
    }

    async fn emit(&mut self, event: NodeEvent) {
        if self.event_tx.send(event).await.is_err() {
            debug!("event receiver dropped");
        }
    }
}
