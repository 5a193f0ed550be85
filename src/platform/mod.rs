//! Platform hosts
//!
//! - `console`: line-driven headless driver (native)
//! - `web`: browser bindings exported through wasm-bindgen

#[cfg(not(target_arch = "wasm32"))]
pub mod console;
#[cfg(target_arch = "wasm32")]
pub mod web;
