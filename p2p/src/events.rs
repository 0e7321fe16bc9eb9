use std::fmt;

/// Peer identifier as a printable string.
///
/// The public API never exposes libp2p types; hosts see peer ids the same
/// way they cross the C ABI, as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<libp2p::PeerId> for PeerId {
    fn from(id: libp2p::PeerId) -> Self {
        Self(id.to_string())
    }
}

/// Events emitted by the node's background task.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// The swarm task is up; emitted once, before any other event.
    Started { local_peer_id: PeerId },
    /// A transport is bound and reachable at `address`.
    Listening { address: String },
    /// mDNS saw a peer on the local network. A `PeerConnected` usually
    /// follows once the auto-dial completes.
    PeerDiscovered { peer_id: PeerId },
    PeerConnected { peer_id: PeerId },
    PeerDisconnected { peer_id: PeerId },
    /// Gossipsub delivery on any subscribed topic.
    Message {
        from: PeerId,
        topic: String,
        data: Vec<u8>,
    },
}
