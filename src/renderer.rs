//! Rendering backends.
//!
//! The engine core never talks to a graphics API directly. It uploads
//! immutable resources once per session, hands a composed [`Frame`] to
//! [`Renderer::draw`] once per frame, and releases everything with
//! [`Renderer::dispose`]. The wgpu backend lives in `gpu`; the
//! [`HeadlessRenderer`] here records what it was asked to do.

use std::{cell::RefCell, rc::Rc};

use anyhow::bail;

use crate::{
    data_structures::{aids::LineMesh, primitive::MeshData},
    render::Frame,
    resources::MaterialDesc,
};

/// Backend-side handle of an uploaded resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GpuId(pub u32);

pub trait Renderer {
    /// Current drawable size in physical pixels.
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    fn upload_geometry(&mut self, mesh: &MeshData) -> GpuId;
    fn upload_material(&mut self, material: &MaterialDesc) -> GpuId;
    fn upload_lines(&mut self, lines: &LineMesh) -> GpuId;
    fn draw(&mut self, frame: &Frame) -> anyhow::Result<()>;
    /// Release the underlying context. Calling it again does nothing.
    fn dispose(&mut self);
    fn is_disposed(&self) -> bool;
}

/// What the last accepted frame contained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSummary {
    pub batches: usize,
    pub instances: usize,
    pub line_batches: usize,
    pub wireframe: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderStats {
    pub geometries: usize,
    pub materials: usize,
    pub line_meshes: usize,
    pub draw_calls: usize,
    /// Draws attempted after `dispose`.
    pub rejected_draws: usize,
    pub resizes: Vec<(u32, u32)>,
    pub disposed: bool,
    pub dispose_calls: usize,
    pub last_frame: Option<FrameSummary>,
}

/// CPU-only renderer. Statistics are shared so they can still be inspected
/// after the renderer has been handed to a viewer.
#[derive(Debug)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    next_id: u32,
    stats: Rc<RefCell<RenderStats>>,
}

impl HeadlessRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_id: 0,
            stats: Rc::new(RefCell::new(RenderStats::default())),
        }
    }

    pub fn stats(&self) -> Rc<RefCell<RenderStats>> {
        self.stats.clone()
    }

    fn next_id(&mut self) -> GpuId {
        self.next_id += 1;
        GpuId(self.next_id)
    }
}

impl Renderer for HeadlessRenderer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
            self.stats.borrow_mut().resizes.push((width, height));
        }
    }

    fn upload_geometry(&mut self, _mesh: &MeshData) -> GpuId {
        self.stats.borrow_mut().geometries += 1;
        self.next_id()
    }

    fn upload_material(&mut self, _material: &MaterialDesc) -> GpuId {
        self.stats.borrow_mut().materials += 1;
        self.next_id()
    }

    fn upload_lines(&mut self, _lines: &LineMesh) -> GpuId {
        self.stats.borrow_mut().line_meshes += 1;
        self.next_id()
    }

    fn draw(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let mut stats = self.stats.borrow_mut();
        if stats.disposed {
            stats.rejected_draws += 1;
            bail!("draw on a disposed renderer");
        }
        stats.draw_calls += 1;
        stats.last_frame = Some(FrameSummary {
            batches: frame.batches.len(),
            instances: frame.instance_count(),
            line_batches: frame.lines.len(),
            wireframe: frame.wireframe,
        });
        Ok(())
    }

    fn dispose(&mut self) {
        let mut stats = self.stats.borrow_mut();
        stats.dispose_calls += 1;
        stats.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.stats.borrow().disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposed_renderer_rejects_draws() {
        let mut renderer = HeadlessRenderer::new(320, 200);
        let stats = renderer.stats();
        assert!(renderer.draw(&Frame::default()).is_ok());
        renderer.dispose();
        assert!(renderer.draw(&Frame::default()).is_err());
        let stats = stats.borrow();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.rejected_draws, 1);
        assert!(stats.disposed);
    }

    #[test]
    fn resize_ignores_zero_sizes() {
        let mut renderer = HeadlessRenderer::new(320, 200);
        renderer.resize(0, 100);
        renderer.resize(640, 480);
        assert_eq!(renderer.size(), (640, 480));
        assert_eq!(renderer.stats().borrow().resizes, vec![(640, 480)]);
    }
}
