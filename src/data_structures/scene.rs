//! Flat scene registry.
//!
//! There is no parent/child hierarchy: each node is one placed element with a
//! local transform and an emphasis tint. The only transform applied on top of
//! the nodes is the camera's whole-scene rotation. Nodes are addressed through
//! [`RenderHandle`]s, which stay valid for the lifetime of one scene session.

use cgmath::Matrix4;

use crate::{
    data_structures::instance::Instance,
    resources::{GeometryHandle, MaterialHandle},
};

/// Opaque reference to a node of one scene session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderHandle(usize);

#[derive(Debug)]
pub struct SceneNode {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub transform: Instance,
    pub emissive: [f32; 3],
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        geometry: GeometryHandle,
        material: MaterialHandle,
        transform: Instance,
    ) -> RenderHandle {
        self.nodes.push(SceneNode {
            geometry,
            material,
            transform,
            emissive: [0.0; 3],
        });
        RenderHandle(self.nodes.len() - 1)
    }

    pub fn node(&self, handle: RenderHandle) -> Option<&SceneNode> {
        self.nodes.get(handle.0)
    }

    pub(crate) fn node_mut(&mut self, handle: RenderHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RenderHandle, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (RenderHandle(idx), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove every node; all handles of the session become dangling.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Local-to-world matrix of a node under the given scene transform.
    pub fn world_matrix(
        &self,
        handle: RenderHandle,
        scene_transform: &Instance,
    ) -> Option<Matrix4<f32>> {
        let node = self.node(handle)?;
        Some((scene_transform * &node.transform).to_matrix())
    }
}
