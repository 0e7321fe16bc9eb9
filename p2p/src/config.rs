//! Node configuration: defaults overlaid with `ROOMSYNC_*` environment
//! variables, so embedding hosts can tune the node without a config file.

use serde::Deserialize;

use crate::error::NodeError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Human-readable name advertised to peers through identify.
    pub node_name: String,
    /// Multiaddrs dialed when the node starts.
    pub bootstrap_peers: Vec<String>,
    /// Prefix for room and history-sync topic names.
    pub topic_prefix: String,
    /// Local-network peer discovery. Disable on networks that block multicast.
    pub enable_mdns: bool,
    /// Gossipsub mesh maintenance interval.
    pub gossip_heartbeat_secs: u64,
    /// Connections idle longer than this are closed.
    pub idle_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_name: "roomsync-node".to_string(),
            bootstrap_peers: Vec::new(),
            topic_prefix: "roomsync".to_string(),
            enable_mdns: true,
            gossip_heartbeat_secs: 10,
            idle_timeout_secs: 60,
        }
    }
}

impl NodeConfig {
    /// Defaults overridden by `ROOMSYNC_*` environment variables, e.g.
    /// `ROOMSYNC_TOPIC_PREFIX=myapp` or
    /// `ROOMSYNC_BOOTSTRAP_PEERS=/ip4/…/tcp/4001,/ip4/…/tcp/4001`.
    pub fn from_env() -> Result<Self, NodeError> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("ROOMSYNC")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("bootstrap_peers"),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.topic_prefix, "roomsync");
        assert!(config.enable_mdns);
        assert!(config.bootstrap_peers.is_empty());
        assert_eq!(config.gossip_heartbeat_secs, 10);
    }

    #[test]
    fn env_overrides_defaults() {
        std::env::set_var("ROOMSYNC_TOPIC_PREFIX", "sync-test");
        std::env::set_var(
            "ROOMSYNC_BOOTSTRAP_PEERS",
            "/ip4/10.0.0.1/tcp/4001,/ip4/10.0.0.2/tcp/4001",
        );

        let config = NodeConfig::from_env().unwrap();
        assert_eq!(config.topic_prefix, "sync-test");
        assert_eq!(config.bootstrap_peers.len(), 2);
        // Untouched fields keep their defaults.
        assert!(config.enable_mdns);
        assert_eq!(config.idle_timeout_secs, 60);

        std::env::remove_var("ROOMSYNC_TOPIC_PREFIX");
        std::env::remove_var("ROOMSYNC_BOOTSTRAP_PEERS");
    }
}
