use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use libp2p::swarm::behaviour::toggle::Toggle;
use libp2p::swarm::NetworkBehaviour;
use libp2p::{autonat, dcutr, gossipsub, identify, identity::Keypair, kad, mdns, ping};

use roomsync_protocol::PROTOCOL_ID;

use crate::config::NodeConfig;
use crate::error::NodeError;

/// Behaviour stack for a room node: gossipsub carries room traffic, mDNS and
/// Kademlia find peers, identify and ping keep the mesh healthy, autonat and
/// dcutr handle NATed hosts.
#[derive(NetworkBehaviour)]
pub struct RoomBehaviour {
    pub gossipsub: gossipsub::Behaviour,
    pub mdns: Toggle<mdns::tokio::Behaviour>,
    pub identify: identify::Behaviour,
    pub kad: kad::Behaviour<kad::store::MemoryStore>,
    pub ping: ping::Behaviour,
    pub autonat: autonat::Behaviour,
    pub dcutr: dcutr::Behaviour,
}

impl RoomBehaviour {
    pub fn new(keypair: &Keypair, config: &NodeConfig) -> Result<Self, NodeError> {
        let peer_id = keypair.public().to_peer_id();

        let gossipsub_config = gossipsub::ConfigBuilder::default()
            .heartbeat_interval(Duration::from_secs(config.gossip_heartbeat_secs))
            .validation_mode(gossipsub::ValidationMode::Strict)
            .max_transmit_size(1024 * 1024)
            // Content-addressed message ids so rebroadcasts deduplicate.
            .message_id_fn(|message: &gossipsub::Message| {
                let mut hasher = DefaultHasher::new();
                message.data.hash(&mut hasher);
                gossipsub::MessageId::from(hasher.finish().to_string())
            })
            .build()
            .map_err(|e| NodeError::NetworkError(format!("gossipsub config: {}", e)))?;

        let gossipsub = gossipsub::Behaviour::new(
            gossipsub::MessageAuthenticity::Signed(keypair.clone()),
            gossipsub_config,
        )
        .map_err(|e| NodeError::NetworkError(format!("gossipsub behaviour: {}", e)))?;

        let mdns = config
            .enable_mdns
            .then(|| mdns::tokio::Behaviour::new(mdns::Config::default(), peer_id))
            .transpose()
            .map_err(|e| NodeError::NetworkError(format!("mdns: {}", e)))?;

        let identify = identify::Behaviour::new(
            identify::Config::new(PROTOCOL_ID.to_string(), keypair.public())
                .with_agent_version(config.node_name.clone()),
        );

        let store = kad::store::MemoryStore::new(peer_id);
        let mut kad = kad::Behaviour::new(peer_id, store);
        kad.set_mode(Some(kad::Mode::Server));

        Ok(Self {
            gossipsub,
            mdns: Toggle::from(mdns),
            identify,
            kad,
            ping: ping::Behaviour::new(ping::Config::new()),
            autonat: autonat::Behaviour::new(peer_id, autonat::Config::default()),
            dcutr: dcutr::Behaviour::new(peer_id),
        })
    }
}
