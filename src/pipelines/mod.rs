//! Lighting and, with the `gpu` feature, the wgpu render pipelines.

#[cfg(feature = "gpu")]
pub mod basic;
pub mod light;
