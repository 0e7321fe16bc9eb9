//! ABI-level lifecycle contract: calls before initialize are rejected, one
//! destroy per create, null safety throughout.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use roomsync::ffi::{
    p2p_free_string, p2p_get_peer_id, p2p_node_create, p2p_node_destroy, p2p_node_initialize,
    p2p_node_join_room, p2p_node_send_message, p2p_node_start_listening, p2p_send_history_sync,
};

#[test]
fn null_node_is_rejected_everywhere() {
    assert!(!p2p_node_initialize(ptr::null_mut()));
    assert!(!p2p_node_start_listening(ptr::null_mut(), 0));

    let room = CString::new("kitchen").unwrap();
    assert!(!p2p_node_join_room(ptr::null_mut(), room.as_ptr()));
    assert!(!p2p_node_send_message(ptr::null_mut(), b"x".as_ptr(), 1));

    let entries = CString::new("[]").unwrap();
    let device = CString::new("device-1").unwrap();
    assert!(!p2p_send_history_sync(
        ptr::null_mut(),
        entries.as_ptr(),
        device.as_ptr()
    ));

    assert!(p2p_get_peer_id(ptr::null_mut()).is_null());

    // Both are documented as no-ops on null.
    p2p_free_string(ptr::null_mut());
    p2p_node_destroy(ptr::null_mut());
}

#[test]
fn operations_before_initialize_are_rejected() {
    std::env::set_var("ROOMSYNC_ENABLE_MDNS", "false");

    let node = p2p_node_create();
    assert!(!node.is_null());

    assert!(!p2p_node_start_listening(node, 0));
    let room = CString::new("kitchen").unwrap();
    assert!(!p2p_node_join_room(node, room.as_ptr()));
    assert!(!p2p_node_send_message(node, b"x".as_ptr(), 1));
    assert!(p2p_get_peer_id(node).is_null());

    p2p_node_destroy(node);
}

#[test]
fn full_lifecycle() {
    std::env::set_var("ROOMSYNC_ENABLE_MDNS", "false");

    let node = p2p_node_create();
    assert!(!node.is_null());

    assert!(p2p_node_initialize(node));
    assert!(!p2p_node_initialize(node), "initialize is one-shot");

    assert!(p2p_node_start_listening(node, 0));

    let peer_id = p2p_get_peer_id(node);
    assert!(!peer_id.is_null());
    let printable = unsafe { CStr::from_ptr(peer_id) }.to_str().unwrap();
    assert!(!printable.is_empty());
    p2p_free_string(peer_id as *mut c_char);

    // Sending is rejected until a room is joined.
    assert!(!p2p_node_send_message(node, b"hello".as_ptr(), 5));

    let room = CString::new("kitchen").unwrap();
    assert!(p2p_node_join_room(node, room.as_ptr()));

    // Joined, but alone: gossipsub reports the publish as undeliverable.
    assert!(!p2p_node_send_message(node, b"hello".as_ptr(), 5));

    // Malformed history payloads are rejected before touching the network.
    let bad = CString::new("{not json").unwrap();
    let device = CString::new("device-1").unwrap();
    assert!(!p2p_send_history_sync(node, bad.as_ptr(), device.as_ptr()));

    p2p_node_destroy(node);
}
