//! Output surfaces for the trail glow.

#[cfg(not(target_arch = "wasm32"))]
pub mod frame;
#[cfg(target_arch = "wasm32")]
pub mod web_renderer;
