use tokio::sync::oneshot;

use crate::error::NodeError;
use crate::events::PeerId;

/// Requests from handles to the swarm task. Every variant carries a oneshot
/// sender so callers can await the outcome.
pub enum Command {
    Listen {
        port: u16,
        respond_to: oneshot::Sender<Result<(), NodeError>>,
    },
    JoinRoom {
        room_id: String,
        respond_to: oneshot::Sender<Result<(), NodeError>>,
    },
    /// Publish to the current room topic.
    Publish {
        data: Vec<u8>,
        respond_to: oneshot::Sender<Result<(), NodeError>>,
    },
    ConnectedPeers {
        respond_to: oneshot::Sender<Vec<PeerId>>,
    },
}
