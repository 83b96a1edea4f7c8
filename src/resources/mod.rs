//! Session-scoped GPU resource caches.
//!
//! Geometries are memoized per element category and materials per colour.
//! The first request for a key tessellates/describes the resource and uploads
//! it through the active [`Renderer`]; every later request returns the same
//! shared handle. Entries are never mutated after creation, so any number of
//! placed elements can point at one entry.

use std::{collections::HashMap, rc::Rc};

use crate::{
    data_structures::primitive::{Aabb, ElementKind, MeshData, Shape},
    renderer::{GpuId, Renderer},
};

pub mod palette;

pub use palette::{colour_for, Colour};

/// Shared shape of one element category.
#[derive(Debug)]
pub struct Geometry {
    pub category: String,
    pub kind: ElementKind,
    pub shape: Shape,
    pub mesh: MeshData,
    pub gpu: GpuId,
}

impl Geometry {
    pub fn bounds(&self) -> Aabb {
        self.shape.bounds()
    }
}

/// Description of a material as the backend receives it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialDesc {
    pub colour: Colour,
}

/// Shared shading of every element with one colour.
#[derive(Debug)]
pub struct Material {
    pub colour: Colour,
    pub gpu: GpuId,
}

pub type GeometryHandle = Rc<Geometry>;
pub type MaterialHandle = Rc<Material>;

#[derive(Debug, Default)]
pub struct ResourceCache {
    geometries: HashMap<String, GeometryHandle>,
    materials: HashMap<Colour, MaterialHandle>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown categories resolve to the fallback cube; this never fails.
    pub fn get_geometry(&mut self, category: &str, renderer: &mut dyn Renderer) -> GeometryHandle {
        if let Some(geometry) = self.geometries.get(category) {
            return geometry.clone();
        }
        let kind = ElementKind::from_category(category);
        if kind == ElementKind::Other {
            log::debug!("no primitive for category {:?}, using the fallback cube", category);
        }
        let shape = kind.shape();
        let mesh = shape.tessellate();
        let gpu = renderer.upload_geometry(&mesh);
        let geometry = Rc::new(Geometry {
            category: category.to_string(),
            kind,
            shape,
            mesh,
            gpu,
        });
        self.geometries
            .insert(category.to_string(), geometry.clone());
        geometry
    }

    pub fn get_material(&mut self, colour: Colour, renderer: &mut dyn Renderer) -> MaterialHandle {
        self.materials
            .entry(colour)
            .or_insert_with(|| {
                let gpu = renderer.upload_material(&MaterialDesc { colour });
                Rc::new(Material { colour, gpu })
            })
            .clone()
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Drop every entry; handles still held elsewhere stay valid CPU-side.
    pub fn clear(&mut self) {
        self.geometries.clear();
        self.materials.clear();
    }
}
