//! Engine data structures: model input, primitives, instances, and the scene.
//!
//! - `model` holds the parsed building model handed in by the host
//! - `primitive` maps element categories to stand-in shapes and tessellates them
//! - `instance` holds per-instance transformation and emphasis data
//! - `scene` is the flat registry of placed nodes
//! - `aids` builds the ground grid and axis line meshes

pub mod aids;
pub mod instance;
pub mod model;
pub mod primitive;
pub mod scene;
