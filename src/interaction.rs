//! Pointer rotation, zoom, highlight and wireframe.
//!
//! All operations are synchronous and only touch engine-owned visual state:
//! the camera, the per-node emphasis of the scene, and the wireframe flag.
//! Shared geometries and materials are never modified. Emphasis is kept on
//! the scene node itself (emissive tint and scale), and the node's previous
//! state is saved so it can be restored exactly.

use cgmath::{Deg, Vector3};

use crate::{
    camera::Camera,
    config::ViewerConfig,
    data_structures::scene::{RenderHandle, Scene},
    placer::PlacedElement,
    resources::Colour,
};

/// How one placed element currently looks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    pub colour: Colour,
    pub emissive: [f32; 3],
    pub scale: Vector3<f32>,
    pub wireframe: bool,
}

#[derive(Clone, Debug, PartialEq)]
struct Highlight {
    id: String,
    handle: RenderHandle,
    saved_emissive: [f32; 3],
    saved_scale: Vector3<f32>,
}

#[derive(Debug)]
pub struct InteractionController {
    rotate_speed: f32,
    zoom_step: f32,
    highlight_emissive: [f32; 3],
    highlight_scale: f32,
    drag: Option<(f32, f32)>,
    highlighted: Option<Highlight>,
    wireframe: bool,
}

impl InteractionController {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            rotate_speed: config.rotate_speed,
            zoom_step: config.zoom_step,
            highlight_emissive: config.highlight_emissive.to_rgb(),
            highlight_scale: config.highlight_scale,
            drag: None,
            highlighted: None,
            wireframe: false,
        }
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag = Some((x, y));
    }

    /// Horizontal movement turns the scene, vertical movement tilts it.
    /// Returns `false` when no drag is active.
    pub fn continue_drag(&mut self, camera: &mut Camera, x: f32, y: f32) -> bool {
        let Some((last_x, last_y)) = self.drag else {
            return false;
        };
        let (dx, dy) = (x - last_x, y - last_y);
        camera.rotate_scene(dy * self.rotate_speed, dx * self.rotate_speed);
        self.drag = Some((x, y));
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// One zoom step per call in the direction of `delta`; positive zooms out.
    pub fn zoom(&mut self, camera: &mut Camera, delta: f32) -> Deg<f32> {
        if delta == 0.0 || delta.is_nan() {
            return camera.fov();
        }
        let step = self.zoom_step * delta.signum();
        camera.set_fov(camera.fov() + Deg(step))
    }

    pub fn zoom_in(&mut self, camera: &mut Camera) -> Deg<f32> {
        self.zoom(camera, -1.0)
    }

    pub fn zoom_out(&mut self, camera: &mut Camera) -> Deg<f32> {
        self.zoom(camera, 1.0)
    }

    pub fn reset_view(&mut self, camera: &mut Camera) {
        self.drag = None;
        camera.reset();
    }

    /// Emphasise one element, restoring the previously emphasised one first.
    ///
    /// Unknown ids leave nothing emphasised and return `false`.
    pub fn highlight(&mut self, scene: &mut Scene, placed: &[PlacedElement], id: &str) -> bool {
        self.clear_highlight(scene);

        let Some(element) = placed.iter().find(|element| element.id == id) else {
            log::warn!("cannot highlight unknown element {:?}", id);
            return false;
        };
        let Some(node) = scene.node_mut(element.render_handle) else {
            log::warn!("element {:?} has no scene node", id);
            return false;
        };
        self.highlighted = Some(Highlight {
            id: element.id.clone(),
            handle: element.render_handle,
            saved_emissive: node.emissive,
            saved_scale: node.transform.scale,
        });
        node.emissive = self.highlight_emissive;
        node.transform = node.transform.scaled(self.highlight_scale);
        true
    }

    /// Restore the emphasised element, if any.
    pub fn clear_highlight(&mut self, scene: &mut Scene) {
        if let Some(previous) = self.highlighted.take() {
            if let Some(node) = scene.node_mut(previous.handle) {
                node.emissive = previous.saved_emissive;
                node.transform.scale = previous.saved_scale;
            }
        }
    }

    /// Forget the selection without touching the scene, for a scene being discarded.
    pub(crate) fn forget(&mut self) {
        self.highlighted = None;
        self.drag = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.highlighted.as_ref().map(|h| h.id.as_str())
    }

    pub fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn appearance(&self, scene: &Scene, element: &PlacedElement) -> Option<Appearance> {
        let node = scene.node(element.render_handle)?;
        Some(Appearance {
            colour: node.material.colour,
            emissive: node.emissive,
            scale: node.transform.scale,
            wireframe: self.wireframe,
        })
    }
}
