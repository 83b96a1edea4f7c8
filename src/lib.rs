//! ifc-ngin
//!
//! A bounded, instancing-oriented preview engine for IFC building models.
//! The engine takes a parsed model (element category -> element records),
//! places a budgeted subset of the elements as flat stand-in primitives,
//! and keeps an interactive scene alive: camera, lights, grid and axis aids,
//! a cancellable render loop, and reversible per-element emphasis.
//!
//! High-level modules
//! - `camera`: camera state, projection and uniforms
//! - `config`: viewer configuration
//! - `data_structures`: model input, primitives, instances, the scene registry
//! - `flow`: the [`flow::Viewer`], owning one scene session at a time
//! - `host`: the seam to the embedding environment (surface, frames, timers)
//! - `interaction`: drag rotation, zoom, highlight and wireframe
//! - `overlay`: what a host view renders on top of the scene
//! - `pick`: screen point to element picking
//! - `placer`: maps model elements to placed instances under a render budget
//! - `render` / `renderer`: frame composition and rendering backends
//! - `render_loop`: the per-frame draw schedule
//! - `resources`: the geometry and material caches
//!

pub mod camera;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod host;
pub mod interaction;
pub mod overlay;
pub mod pick;
pub mod pipelines;
pub mod placer;
pub mod render;
pub mod render_loop;
pub mod renderer;
pub mod resources;

#[cfg(feature = "gpu")]
pub mod gpu;
#[cfg(all(feature = "gpu", not(target_arch = "wasm32")))]
pub mod window;

// Re-exports commonly used types for convenience in downstream code.
pub use config::ViewerConfig;
pub use data_structures::model::{ModelData, ModelElement};
pub use error::ViewerError;
pub use flow::{Viewer, ViewerStatus, ViewerUpdate};
pub use host::{FrameToken, Host, HostEvent, ListenerId, TimerToken};
pub use renderer::{HeadlessRenderer, Renderer};
