//! Two nodes on localhost: bootstrap-dial, join the same room, and deliver a
//! history envelope end to end. mDNS stays off so the test does not depend on
//! multicast being available.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use roomsync_p2p::{NodeConfig, NodeEvent, RoomNode};
use roomsync_protocol::{room_topic, SyncEnvelope};

fn test_config() -> NodeConfig {
    NodeConfig {
        enable_mdns: false,
        // Fast heartbeat so the gossip mesh forms quickly.
        gossip_heartbeat_secs: 1,
        ..NodeConfig::default()
    }
}

async fn loopback_tcp_addr(events: &mut mpsc::Receiver<NodeEvent>) -> String {
    loop {
        match events.recv().await.expect("node stopped") {
            NodeEvent::Listening { address }
                if address.starts_with("/ip4/127.0.0.1/") && address.contains("/tcp/") =>
            {
                return address;
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn two_nodes_exchange_room_messages() {
    let (node_a, mut events_a) = RoomNode::spawn(test_config()).await.unwrap();
    let handle_a = node_a.handle();
    handle_a.listen(0).await.unwrap();
    let addr_a = timeout(Duration::from_secs(10), loopback_tcp_addr(&mut events_a))
        .await
        .expect("node A never reported a loopback listen address");

    let mut config_b = test_config();
    config_b.bootstrap_peers = vec![addr_a];
    let (node_b, mut events_b) = RoomNode::spawn(config_b).await.unwrap();
    let handle_b = node_b.handle();

    handle_a.join_room("kitchen").await.unwrap();
    handle_b.join_room("kitchen").await.unwrap();

    // Publishing fails until the mesh includes node A; retry until it forms.
    let envelope = SyncEnvelope::history(Vec::new(), "device-b");
    let payload = serde_json::to_vec(&envelope).unwrap();
    let publish = async {
        loop {
            match handle_b.publish(payload.clone()).await {
                Ok(()) => break,
                Err(_) => sleep(Duration::from_millis(250)).await,
            }
        }
    };
    timeout(Duration::from_secs(30), publish)
        .await
        .expect("publish never succeeded");

    let expected_topic = room_topic("roomsync", "kitchen");
    let data = timeout(Duration::from_secs(30), async {
        loop {
            if let NodeEvent::Message { topic, data, .. } =
                events_a.recv().await.expect("node stopped")
            {
                if topic == expected_topic {
                    return data;
                }
            }
        }
    })
    .await
    .expect("message never arrived at node A");

    let decoded: SyncEnvelope = serde_json::from_slice(&data).unwrap();
    assert!(decoded.is_history_sync());
    assert_eq!(decoded.device_id, "device-b");

    assert!(!handle_a.connected_peers().await.unwrap().is_empty());

    // Drain B's events so its channel never backs up mid-test.
    while events_b.try_recv().is_ok() {}

    node_b.shutdown().await.unwrap();
    node_a.shutdown().await.unwrap();
}

#[tokio::test]
async fn publish_without_room_is_rejected() {
    let (node, _events) = RoomNode::spawn(test_config()).await.unwrap();
    let handle = node.handle();

    let err = handle.publish(b"hello".to_vec()).await.unwrap_err();
    assert!(matches!(err, roomsync_p2p::NodeError::NoRoomJoined));

    node.shutdown().await.unwrap();
}
