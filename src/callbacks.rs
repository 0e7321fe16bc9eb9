//! Process-wide callback registry for the C ABI.
//!
//! One slot per callback kind; registering replaces any previous callback.
//! Invocations happen on the node's runtime threads, asynchronously relative
//! to the host's own calls into the library.

use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::{PoisonError, RwLock};

use tracing::warn;

/// Message view handed to the host. Pointers are valid only for the duration
/// of the callback invocation; the host must copy anything it keeps.
#[repr(C)]
pub struct P2PMessage {
    pub peer_id: *const c_char,
    pub topic: *const c_char,
    pub data: *const c_char,
    pub data_len: usize,
}

pub type MessageCallback = extern "C" fn(*const P2PMessage);
/// Second argument reports joined (true) or left (false).
pub type PeerCallback = extern "C" fn(*const c_char, bool);

static MESSAGE_CALLBACK: RwLock<Option<MessageCallback>> = RwLock::new(None);
static PEER_CALLBACK: RwLock<Option<PeerCallback>> = RwLock::new(None);

pub fn set_message_callback(callback: MessageCallback) {
    *MESSAGE_CALLBACK
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(callback);
}

pub fn set_peer_callback(callback: PeerCallback) {
    *PEER_CALLBACK
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(callback);
}

pub(crate) fn dispatch_message(peer_id: &str, topic: &str, data: &[u8]) {
    let Some(callback) = *MESSAGE_CALLBACK
        .read()
        .unwrap_or_else(PoisonError::into_inner)
    else {
        return;
    };
    let (Ok(peer_id), Ok(topic)) = (CString::new(peer_id), CString::new(topic)) else {
        warn!("dropping message with interior NUL in peer id or topic");
        return;
    };
    let message = P2PMessage {
        peer_id: peer_id.as_ptr(),
        topic: topic.as_ptr(),
        data: data.as_ptr() as *const c_char,
        data_len: data.len(),
    };
    callback(&message);
}

pub(crate) fn dispatch_peer(peer_id: &str, joined: bool) {
    let Some(callback) = *PEER_CALLBACK.read().unwrap_or_else(PoisonError::into_inner) else {
        return;
    };
    let Ok(peer_id) = CString::new(peer_id) else {
        warn!("dropping peer event with interior NUL in peer id");
        return;
    };
    callback(peer_id.as_ptr(), joined);
}
