//! C ABI for embedding a roomsync node from Swift or other native hosts.
//!
//! Contract: create a node before any other call, destroy it exactly once,
//! and never touch it after destroy. Strings returned by this library are
//! released through [`p2p_free_string`]; everything passed in is borrowed
//! for the duration of the call.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use tracing::{error, info};

use crate::callbacks::{self, MessageCallback, PeerCallback};
use crate::shell::NodeShell;

/// Opaque node handle handed to the host.
#[repr(C)]
pub struct P2PNode {
    inner: *mut NodeShell,
}

unsafe fn shell_mut<'a>(node: *mut P2PNode) -> Option<&'a mut NodeShell> {
    if node.is_null() {
        return None;
    }
    let inner = (*node).inner;
    if inner.is_null() {
        return None;
    }
    Some(&mut *inner)
}

#[no_mangle]
pub extern "C" fn p2p_node_create() -> *mut P2PNode {
    match NodeShell::new() {
        Ok(shell) => {
            let node = P2PNode {
                inner: Box::into_raw(Box::new(shell)),
            };
            Box::into_raw(Box::new(node))
        }
        Err(e) => {
            error!("failed to create node: {:#}", e);
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "C" fn p2p_node_destroy(node: *mut P2PNode) {
    if node.is_null() {
        return;
    }
    let node = unsafe { Box::from_raw(node) };
    if !node.inner.is_null() {
        let shell = unsafe { Box::from_raw(node.inner) };
        shell.shutdown();
    }
}

#[no_mangle]
pub extern "C" fn p2p_node_initialize(node: *mut P2PNode) -> bool {
    let Some(shell) = (unsafe { shell_mut(node) }) else {
        return false;
    };
    match shell.initialize() {
        Ok(()) => true,
        Err(e) => {
            error!("failed to initialize node: {:#}", e);
            false
        }
    }
}

#[no_mangle]
pub extern "C" fn p2p_node_start_listening(node: *mut P2PNode, port: u16) -> bool {
    let Some(shell) = (unsafe { shell_mut(node) }) else {
        return false;
    };
    match shell.start_listening(port) {
        Ok(()) => true,
        Err(e) => {
            error!("failed to start listening: {:#}", e);
            false
        }
    }
}

#[no_mangle]
pub extern "C" fn p2p_node_join_room(node: *mut P2PNode, room_id: *const c_char) -> bool {
    let Some(shell) = (unsafe { shell_mut(node) }) else {
        return false;
    };
    if room_id.is_null() {
        return false;
    }
    let Ok(room_id) = (unsafe { CStr::from_ptr(room_id) }).to_str() else {
        return false;
    };
    match shell.join_room(room_id) {
        Ok(()) => true,
        Err(e) => {
            error!("failed to join room: {:#}", e);
            false
        }
    }
}

#[no_mangle]
pub extern "C" fn p2p_node_send_message(
    node: *mut P2PNode,
    data: *const u8,
    data_len: usize,
) -> bool {
    let Some(shell) = (unsafe { shell_mut(node) }) else {
        return false;
    };
    if data.is_null() {
        return false;
    }
    let data = unsafe { std::slice::from_raw_parts(data, data_len) };
    match shell.send_message(data) {
        Ok(()) => true,
        Err(e) => {
            error!("failed to send message: {:#}", e);
            false
        }
    }
}

#[no_mangle]
pub extern "C" fn p2p_set_message_callback(callback: MessageCallback) {
    callbacks::set_message_callback(callback);
}

#[no_mangle]
pub extern "C" fn p2p_set_peer_callback(callback: PeerCallback) {
    callbacks::set_peer_callback(callback);
}

#[no_mangle]
pub extern "C" fn p2p_send_history_sync(
    node: *mut P2PNode,
    entries_json: *const c_char,
    device_id: *const c_char,
) -> bool {
    let Some(shell) = (unsafe { shell_mut(node) }) else {
        return false;
    };
    if entries_json.is_null() || device_id.is_null() {
        return false;
    }
    let Ok(entries_json) = (unsafe { CStr::from_ptr(entries_json) }).to_str() else {
        return false;
    };
    let Ok(device_id) = (unsafe { CStr::from_ptr(device_id) }).to_str() else {
        return false;
    };
    match shell.send_history_sync(entries_json, device_id) {
        Ok(()) => true,
        Err(e) => {
            error!("failed to send history sync: {:#}", e);
            false
        }
    }
}

/// Returns an owned string; release it with [`p2p_free_string`]. Null before
/// `p2p_node_initialize`.
#[no_mangle]
pub extern "C" fn p2p_get_peer_id(node: *mut P2PNode) -> *const c_char {
    let Some(shell) = (unsafe { shell_mut(node) }) else {
        return std::ptr::null();
    };
    match shell.peer_id() {
        Ok(peer_id) => match CString::new(peer_id) {
            Ok(s) => s.into_raw(),
            Err(_) => std::ptr::null(),
        },
        Err(e) => {
            error!("peer id unavailable: {:#}", e);
            std::ptr::null()
        }
    }
}

#[no_mangle]
pub extern "C" fn p2p_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(s);
    }
}

/// Install the global tracing subscriber. Safe to call more than once; only
/// the first call takes effect.
#[no_mangle]
pub extern "C" fn p2p_init_logging() {
    if tracing_subscriber::fmt().try_init().is_ok() {
        info!("roomsync logging initialized");
    }
}
