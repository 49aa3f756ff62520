//! FishTracker WASM bindings
//!
//! Exposes a per-user tracker session to the page. Values cross the
//! boundary as JSON strings; the page renders them.

#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

mod endpoint;
#[cfg(target_arch = "wasm32")]
mod http_client;
#[cfg(target_arch = "wasm32")]
mod session;
#[cfg(target_arch = "wasm32")]
mod storage;

#[cfg(target_arch = "wasm32")]
pub use session::*;
