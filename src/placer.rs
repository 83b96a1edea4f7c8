//! Maps the model's element collections to placed scene nodes.
//!
//! Placement is bounded by the render budget: once `max_renderable` elements
//! are placed, the remaining elements are only counted. Elements are laid out
//! on a deterministic grid, one band of rows per category, purely for visual
//! separation. No coordinates are taken from the model.

use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use cgmath::Vector3;

use crate::{
    config::ViewerConfig,
    data_structures::{
        instance::Instance,
        model::{ModelData, ModelElement},
        scene::{RenderHandle, Scene},
    },
    renderer::Renderer,
    resources::{colour_for, Colour, ResourceCache},
};

/// Engine-owned record of one rendered element.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedElement {
    /// Unique within the session.
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub source: Rc<ModelElement>,
    pub render_handle: RenderHandle,
    pub base_colour: Colour,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementProgress {
    pub placed: usize,
    pub max_renderable: usize,
    pub percent: u8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlacementResult {
    pub placed: Vec<PlacedElement>,
    pub total_available: usize,
    pub truncated: bool,
    pub max_renderable: usize,
}

impl PlacementResult {
    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.placed.len(), self.max_renderable)
    }
}

/// `round(placed / max * 100)`, capped at 100.
pub fn progress_percent(placed: usize, max_renderable: usize) -> u8 {
    if max_renderable == 0 {
        return 0;
    }
    let percent = (placed as f64 / max_renderable as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

pub struct ElementPlacer {
    max_renderable: usize,
    columns: usize,
    spacing: f32,
}

impl ElementPlacer {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            max_renderable: config.max_renderable.max(1),
            columns: config.columns.max(1),
            spacing: config.spacing,
        }
    }

    /// Place up to `max_renderable` elements into `scene`.
    ///
    /// `on_progress` is called once per placed element. Geometry and material
    /// of a category are resolved on its first placed element, so categories
    /// entirely beyond the budget never allocate resources.
    pub fn place(
        &self,
        model: &ModelData,
        cache: &mut ResourceCache,
        renderer: &mut dyn Renderer,
        scene: &mut Scene,
        on_progress: &mut dyn FnMut(PlacementProgress),
    ) -> PlacementResult {
        let mut placed = Vec::new();
        let mut total_available = 0;
        let mut taken_ids = HashSet::new();
        let mut duplicates: HashMap<String, usize> = HashMap::new();
        let mut band_start = 0usize;

        for collection in &model.collections {
            total_available += collection.elements.len();
            let remaining = self.max_renderable - placed.len();
            let to_place = collection.elements.len().min(remaining);
            if to_place == 0 {
                continue;
            }

            let geometry = cache.get_geometry(&collection.category, renderer);
            let base_colour = colour_for(geometry.kind);
            let material = cache.get_material(base_colour, renderer);
            let columns_used = self.columns.min(to_place);
            let y = geometry.shape.height() * 0.5;

            for (index, element) in collection.elements.iter().take(to_place).enumerate() {
                let row = index / self.columns;
                let col = index % self.columns;
                let x = (col as f32 - (columns_used - 1) as f32 * 0.5) * self.spacing;
                let z = (band_start + row) as f32 * self.spacing;
                let transform = Instance::from(Vector3::new(x, y, z));
                let render_handle = scene.add(geometry.clone(), material.clone(), transform);

                let id = unique_id(&element.identifier, &mut taken_ids, &mut duplicates);
                placed.push(PlacedElement {
                    id,
                    display_name: element.display_name.clone(),
                    category: collection.category.clone(),
                    source: element.clone(),
                    render_handle,
                    base_colour,
                });
                on_progress(PlacementProgress {
                    placed: placed.len(),
                    max_renderable: self.max_renderable,
                    percent: progress_percent(placed.len(), self.max_renderable),
                });
            }
            band_start += to_place.div_ceil(self.columns) + 1;
        }

        let truncated = total_available > self.max_renderable;
        if truncated {
            log::info!(
                "model has {} elements, placing the first {} only",
                total_available,
                placed.len()
            );
        }
        PlacementResult {
            placed,
            total_available,
            truncated,
            max_renderable: self.max_renderable,
        }
    }
}

fn unique_id(
    identifier: &str,
    taken: &mut HashSet<String>,
    duplicates: &mut HashMap<String, usize>,
) -> String {
    if taken.insert(identifier.to_string()) {
        return identifier.to_string();
    }
    let count = duplicates.entry(identifier.to_string()).or_insert(1);
    loop {
        *count += 1;
        let candidate = format!("{}#{}", identifier, count);
        if taken.insert(candidate.clone()) {
            log::warn!("duplicate element id {:?}, using {:?}", identifier, candidate);
            return candidate;
        }
    }
}
