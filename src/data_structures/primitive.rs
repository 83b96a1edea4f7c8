//! Stand-in primitives for building elements.
//!
//! Elements are not drawn with their real IFC geometry. Each category maps to
//! a fixed primitive (a box or a cylinder with a handful of segments) that is
//! tessellated once per scene session and shared by every element of that
//! category.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Vector3};

/// The element kinds with a dedicated primitive. Anything else is `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Wall,
    Slab,
    Window,
    Door,
    Column,
    Beam,
    Stair,
    Ramp,
    Other,
}

impl ElementKind {
    /// `"walls"`, `"Wall"`, `"IfcWall"` and `"IFCWALLSTANDARDCASE"` all name walls.
    pub fn from_category(category: &str) -> Self {
        let lower = category.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("ifc").unwrap_or(&lower);
        let name = name.strip_suffix("standardcase").unwrap_or(name);
        let name = name.strip_suffix("elementedcase").unwrap_or(name);
        let name = name.strip_suffix('s').unwrap_or(name);
        match name {
            "wall" | "curtainwall" => ElementKind::Wall,
            "slab" | "roof" | "floor" => ElementKind::Slab,
            "window" => ElementKind::Window,
            "door" => ElementKind::Door,
            "column" => ElementKind::Column,
            "beam" | "member" => ElementKind::Beam,
            "stair" | "stairflight" => ElementKind::Stair,
            "ramp" | "rampflight" => ElementKind::Ramp,
            _ => ElementKind::Other,
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            ElementKind::Wall => Shape::cuboid(2.0, 1.5, 0.2),
            ElementKind::Slab => Shape::cuboid(2.0, 0.2, 2.0),
            ElementKind::Window => Shape::cuboid(1.0, 1.0, 0.1),
            ElementKind::Beam => Shape::cuboid(2.0, 0.3, 0.3),
            ElementKind::Stair => Shape::cuboid(1.0, 1.0, 2.0),
            ElementKind::Ramp => Shape::cuboid(1.0, 0.2, 2.0),
            ElementKind::Door => Shape::Cylinder {
                radius: 0.5,
                height: 2.0,
                segments: 8,
            },
            ElementKind::Column => Shape::Cylinder {
                radius: 0.2,
                height: 3.0,
                segments: 8,
            },
            ElementKind::Other => Shape::cuboid(1.0, 1.0, 1.0),
        }
    }
}

/// A primitive centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Box { width: f32, height: f32, depth: f32 },
    Cylinder { radius: f32, height: f32, segments: u32 },
}

impl Shape {
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Shape::Box {
            width,
            height,
            depth,
        }
    }

    pub fn height(&self) -> f32 {
        match *self {
            Shape::Box { height, .. } | Shape::Cylinder { height, .. } => height,
        }
    }

    pub fn bounds(&self) -> Aabb {
        let half = match *self {
            Shape::Box {
                width,
                height,
                depth,
            } => Vector3::new(width, height, depth) * 0.5,
            Shape::Cylinder { radius, height, .. } => Vector3::new(radius, height * 0.5, radius),
        };
        Aabb {
            min: -half,
            max: half,
        }
    }

    pub fn tessellate(&self) -> MeshData {
        match *self {
            Shape::Box {
                width,
                height,
                depth,
            } => tessellate_box(width, height, depth),
            Shape::Cylinder {
                radius,
                height,
                segments,
            } => tessellate_cylinder(radius, height, segments.max(3)),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// CPU-side mesh: triangle indices for filled drawing and a line list of
/// feature edges for wireframe drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub edges: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_quad(&mut self, corners: [Vector3<f32>; 4], normal: Vector3<f32>) {
        let base = self.vertices.len() as u32;
        for corner in corners {
            self.vertices.push(ModelVertex {
                position: corner.into(),
                normal: normal.into(),
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

fn tessellate_box(width: f32, height: f32, depth: f32) -> MeshData {
    let (x, y, z) = (width * 0.5, height * 0.5, depth * 0.5);
    let v = |a: f32, b: f32, c: f32| Vector3::new(a, b, c);
    let mut mesh = MeshData::default();
    // counter-clockwise seen from outside
    mesh.push_quad([v(x, -y, z), v(x, -y, -z), v(x, y, -z), v(x, y, z)], Vector3::unit_x());
    mesh.push_quad([v(-x, -y, -z), v(-x, -y, z), v(-x, y, z), v(-x, y, -z)], -Vector3::unit_x());
    mesh.push_quad([v(-x, y, z), v(x, y, z), v(x, y, -z), v(-x, y, -z)], Vector3::unit_y());
    mesh.push_quad([v(-x, -y, -z), v(x, -y, -z), v(x, -y, z), v(-x, -y, z)], -Vector3::unit_y());
    mesh.push_quad([v(-x, -y, z), v(x, -y, z), v(x, y, z), v(-x, y, z)], Vector3::unit_z());
    mesh.push_quad([v(x, -y, -z), v(-x, -y, -z), v(-x, y, -z), v(x, y, -z)], -Vector3::unit_z());
    // the x and y faces together cover all twelve box edges
    for face in 0..4u32 {
        let base = face * 4;
        for i in 0..4 {
            mesh.edges.push(base + i);
            mesh.edges.push(base + (i + 1) % 4);
        }
    }
    mesh
}

fn tessellate_cylinder(radius: f32, height: f32, segments: u32) -> MeshData {
    let half = height * 0.5;
    let ring = |i: u32| {
        let angle = TAU * (i % segments) as f32 / segments as f32;
        (radius * angle.cos(), radius * angle.sin())
    };
    let mut mesh = MeshData::default();

    // side: two vertices per ring position, smooth normals
    for i in 0..=segments {
        let (x, z) = ring(i);
        let normal = Vector3::new(x, 0.0, z).normalize();
        mesh.vertices.push(ModelVertex {
            position: [x, -half, z],
            normal: normal.into(),
        });
        mesh.vertices.push(ModelVertex {
            position: [x, half, z],
            normal: normal.into(),
        });
    }
    for i in 0..segments {
        let bottom = i * 2;
        let top = bottom + 1;
        let next_bottom = bottom + 2;
        let next_top = bottom + 3;
        mesh.indices
            .extend_from_slice(&[bottom, top, next_bottom, next_bottom, top, next_top]);
        mesh.edges.extend_from_slice(&[bottom, top]);
        mesh.edges.extend_from_slice(&[bottom, next_bottom, top, next_top]);
    }

    // caps as triangle fans around a centre vertex
    for (y, normal) in [(half, 1.0f32), (-half, -1.0f32)] {
        let centre = mesh.vertices.len() as u32;
        mesh.vertices.push(ModelVertex {
            position: [0.0, y, 0.0],
            normal: [0.0, normal, 0.0],
        });
        for i in 0..segments {
            let (x, z) = ring(i);
            mesh.vertices.push(ModelVertex {
                position: [x, y, z],
                normal: [0.0, normal, 0.0],
            });
        }
        for i in 0..segments {
            let current = centre + 1 + i;
            let next = centre + 1 + (i + 1) % segments;
            if normal > 0.0 {
                mesh.indices.extend_from_slice(&[centre, next, current]);
            } else {
                mesh.indices.extend_from_slice(&[centre, current, next]);
            }
        }
    }
    mesh
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vector3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(
            Aabb {
                min: first,
                max: first,
            },
            |aabb, p| Aabb {
                min: Vector3::new(aabb.min.x.min(p.x), aabb.min.y.min(p.y), aabb.min.z.min(p.z)),
                max: Vector3::new(aabb.max.x.max(p.x), aabb.max.y.max(p.y), aabb.max.z.max(p.z)),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_spellings_resolve_to_one_kind() {
        for category in ["walls", "Wall", "IfcWall", "IFCWALLSTANDARDCASE", " walls "] {
            assert_eq!(ElementKind::from_category(category), ElementKind::Wall, "{category}");
        }
        assert_eq!(ElementKind::from_category("IfcDoor"), ElementKind::Door);
        assert_eq!(ElementKind::from_category("stairs"), ElementKind::Stair);
        assert_eq!(ElementKind::from_category("spaces"), ElementKind::Other);
        assert_eq!(ElementKind::from_category(""), ElementKind::Other);
    }

    #[test]
    fn doors_and_columns_are_cylinders() {
        assert!(matches!(ElementKind::Door.shape(), Shape::Cylinder { .. }));
        assert!(matches!(ElementKind::Column.shape(), Shape::Cylinder { .. }));
        assert!(matches!(ElementKind::Slab.shape(), Shape::Box { .. }));
        assert_eq!(ElementKind::Other.shape(), Shape::cuboid(1.0, 1.0, 1.0));
    }

    #[test]
    fn box_tessellation_is_closed() {
        let mesh = Shape::cuboid(2.0, 1.0, 0.5).tessellate();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.edges.len(), 32);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        let bounds =
            Aabb::from_points(mesh.vertices.iter().map(|v| Vector3::from(v.position))).unwrap();
        assert_eq!(bounds, Shape::cuboid(2.0, 1.0, 0.5).bounds());
    }

    #[test]
    fn cylinder_tessellation_stays_in_bounds() {
        let shape = Shape::Cylinder {
            radius: 0.5,
            height: 2.0,
            segments: 8,
        };
        let mesh = shape.tessellate();
        assert_eq!(mesh.triangle_count(), 8 * 2 + 8 * 2);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        assert!(mesh.edges.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        let bounds = shape.bounds();
        for v in &mesh.vertices {
            let p = Vector3::from(v.position);
            assert!(p.y >= bounds.min.y - 1e-5 && p.y <= bounds.max.y + 1e-5);
            assert!((p.x * p.x + p.z * p.z).sqrt() <= 0.5 + 1e-5);
        }
    }
}
