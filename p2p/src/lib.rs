//! # roomsync-p2p
//!
//! The libp2p node behind the roomsync C ABI.
//!
//! ## Features
//! - Room messaging over gossipsub
//! - Peer discovery via mDNS and Kademlia
//! - NAT traversal (autonat + dcutr, TCP and QUIC transports)
//! - Zero libp2p type exposure

mod behaviour;
mod command;
pub mod config;
mod error;
pub mod events;
mod node;
mod runtime;

pub use config::NodeConfig;
pub use error::NodeError;
pub use events::{NodeEvent, PeerId};
pub use node::{RoomNode, RoomNodeHandle};
