use thiserror::Error;

/// Failures surfaced by the node and its handles.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("network error: {0}")]
    NetworkError(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("subscribe to '{topic}' failed: {reason}")]
    Subscribe { topic: String, reason: String },

    #[error("publish on '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },

    /// Send/publish was attempted before `join_room`.
    #[error("no room joined")]
    NoRoomJoined,

    /// The swarm task is gone; the handle is dead.
    #[error("node task stopped")]
    ChannelClosed,

    #[error("serialization error: {0}")]
    Serialization(String),
}
