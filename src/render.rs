//! Render composition and batching.
//!
//! Scene content is described as [`Render`] values, which are then sorted into
//! one [`Frame`]: instanced batches for placed elements and line batches for
//! the orientation aids. The frame is plain data, so any backend can draw it
//! and tests can inspect it.
//!
//! # Key types
//!
//! - [`Render`] describes what one part of the scene wants drawn
//! - [`Instanced`] is one geometry + material pair with all of its instances
//! - [`LineBatch`] is one uploaded line mesh with its transform
//! - [`Frame`] is everything a backend needs for one draw
//!

use std::collections::BTreeMap;

use crate::{
    camera::{Camera, CameraUniform},
    data_structures::{instance::InstanceRaw, scene::Scene},
    pipelines::light::{LightUniform, Lighting},
    renderer::GpuId,
    resources::Colour,
};

/// Every instance of one geometry drawn with one material.
#[derive(Clone, Debug, PartialEq)]
pub struct Instanced {
    pub geometry: GpuId,
    pub material: GpuId,
    pub instances: Vec<InstanceRaw>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineBatch {
    pub lines: GpuId,
    pub instance: InstanceRaw,
}

/// Specifies how a part of the scene should be rendered.
///
/// - `None` renders nothing
/// - `Default(Instanced)` renders a single instanced batch
/// - `Defaults(Vec<Instanced>)` renders several instanced batches
/// - `Lines(LineBatch)` renders an aid as a line list
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
#[derive(Clone, Debug, PartialEq)]
pub enum Render {
    None,
    Default(Instanced),
    Defaults(Vec<Instanced>),
    Lines(LineBatch),
    Composed(Vec<Render>),
}

impl Render {
    fn set_pipelines(self, batches: &mut Vec<Instanced>, lines: &mut Vec<LineBatch>) {
        match self {
            Render::Default(instanced) => batches.push(instanced),
            Render::Defaults(mut vec) => batches.append(&mut vec),
            Render::Lines(batch) => lines.push(batch),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches, lines)),
            Render::None => (),
        }
    }
}

/// One complete draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub camera: CameraUniform,
    pub light: LightUniform,
    pub clear_colour: Colour,
    /// Draw the edge list of every geometry instead of its triangles.
    pub wireframe: bool,
    pub batches: Vec<Instanced>,
    pub lines: Vec<LineBatch>,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            camera: CameraUniform::new(),
            light: LightUniform::default(),
            clear_colour: Colour(0xffffff),
            wireframe: false,
            batches: Vec::new(),
            lines: Vec::new(),
        }
    }
}

impl Frame {
    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(|b| b.instances.len()).sum()
    }
}

/// Group the scene's nodes by shared geometry and material.
///
/// Every node is drawn under the camera's whole-scene rotation. Batches come
/// out in a stable order so identical scenes compose identical frames.
pub fn scene_render(scene: &Scene, camera: &Camera) -> Render {
    let scene_transform = camera.scene_transform();
    let mut batches: BTreeMap<(GpuId, GpuId), Vec<InstanceRaw>> = BTreeMap::new();
    for (_, node) in scene.iter() {
        let world = &scene_transform * &node.transform;
        batches
            .entry((node.geometry.gpu, node.material.gpu))
            .or_default()
            .push(world.to_raw(node.emissive));
    }
    if batches.is_empty() {
        return Render::None;
    }
    Render::Defaults(
        batches
            .into_iter()
            .map(|((geometry, material), instances)| Instanced {
                geometry,
                material,
                instances,
            })
            .collect(),
    )
}

/// Aids rotate with the scene like every other node.
pub fn aids_render(aids: &[GpuId], camera: &Camera) -> Render {
    let instance = camera.scene_transform().to_raw([0.0; 3]);
    Render::Composed(
        aids.iter()
            .map(|&lines| Render::Lines(LineBatch { lines, instance }))
            .collect(),
    )
}

pub fn compose(
    scene: &Scene,
    camera: &Camera,
    lighting: &Lighting,
    aids: &[GpuId],
    wireframe: bool,
    clear_colour: Colour,
) -> Frame {
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(camera);

    let mut batches = Vec::new();
    let mut lines = Vec::new();
    Render::Composed(vec![scene_render(scene, camera), aids_render(aids, camera)])
        .set_pipelines(&mut batches, &mut lines);

    Frame {
        camera: camera_uniform,
        light: lighting.uniform(),
        clear_colour,
        wireframe,
        batches,
        lines,
    }
}
