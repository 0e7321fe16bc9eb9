//! # roomsync
//!
//! Embeddable peer-to-peer room synchronization for native hosts. The crate
//! exposes a C ABI (see [`ffi`]) over the node in `roomsync-p2p`: a host
//! creates a node, joins a room, and exchanges opaque messages and history
//! batches with every other device in that room. Incoming traffic and peer
//! churn are delivered through process-wide callbacks (see [`callbacks`]).

pub mod callbacks;
pub mod ffi;
mod shell;

pub use callbacks::{MessageCallback, P2PMessage, PeerCallback};
pub use ffi::P2PNode;
pub use roomsync_p2p::{NodeConfig, NodeError, NodeEvent, PeerId, RoomNode, RoomNodeHandle};
