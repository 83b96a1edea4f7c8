//! Screen point to element picking.
//!
//! Picking is done on the CPU: the camera turns a surface pixel into a world
//! ray. For every placed element the ray is moved into the element's local
//! frame, where its bounds are axis-aligned, and tested with the slab method.
//! The local frame includes the whole-scene rotation and any emphasis scale,
//! so a rotated element is tested as the oriented box it is on screen.

use cgmath::{InnerSpace, Point3, SquareMatrix, Vector3};

use crate::{
    data_structures::{instance::Instance, primitive::Aabb, scene::Scene},
    placer::PlacedElement,
};

/// A ray in world space with a unit-length direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// `None` for a degenerate (zero or non-finite) direction.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Option<Self> {
        let length = direction.magnitude();
        if !(length > f32::EPSILON) || !length.is_finite() {
            return None;
        }
        Some(Self {
            origin,
            direction: direction / length,
        })
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit in front of the origin.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        let (min, max) = (aabb.min[axis], aabb.max[axis]);
        // parallel to this slab: inside it everywhere or nowhere
        if direction == 0.0 {
            if origin < min || origin > max {
                return None;
            }
            continue;
        }
        let t1 = (min - origin) / direction;
        let t2 = (max - origin) / direction;
        tmin = tmin.max(t1.min(t2));
        tmax = tmax.min(t1.max(t2));
    }

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Id of the placed element the ray hits first.
pub fn pick_nearest(
    ray: &Ray,
    scene: &Scene,
    placed: &[PlacedElement],
    scene_transform: &Instance,
) -> Option<String> {
    let mut best: Option<(&str, f32)> = None;

    for element in placed {
        let Some(dist) = hit_distance(ray, scene, element, scene_transform) else {
            continue;
        };
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((element.id.as_str(), dist));
        }
    }

    best.map(|(id, _)| id.to_string())
}

/// World-space distance from the ray origin to where it enters the element.
fn hit_distance(
    ray: &Ray,
    scene: &Scene,
    element: &PlacedElement,
    scene_transform: &Instance,
) -> Option<f32> {
    let node = scene.node(element.render_handle)?;
    let world = scene.world_matrix(element.render_handle, scene_transform)?;
    let to_local = world.invert()?;

    let local = Ray::new(
        Point3::from_homogeneous(to_local * ray.origin.to_homogeneous()),
        (to_local * ray.direction.extend(0.0)).truncate(),
    )?;
    let t = ray_aabb(&local, &node.geometry.bounds())?;
    let hit = Point3::from_homogeneous(world * local.at(t).to_homogeneous());
    Some((hit - ray.origin).magnitude())
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Quaternion, Rotation3};

    use super::*;
    use crate::{
        config::ViewerConfig, data_structures::model::ModelData, placer::ElementPlacer,
        renderer::HeadlessRenderer, resources::ResourceCache,
    };

    fn unit_box_at(x: f32) -> Aabb {
        Aabb {
            min: Vector3::new(x - 0.5, -0.5, -0.5),
            max: Vector3::new(x + 0.5, 0.5, 0.5),
        }
    }

    #[test]
    fn zero_direction_is_no_ray() {
        assert!(Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0)).is_none());
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, -4.0)).unwrap();
        assert_eq!(ray.direction, Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn slab_test_reports_entry_distance() {
        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::unit_x()).unwrap();
        assert_eq!(ray_aabb(&ray, &unit_box_at(0.0)), Some(4.5));
        assert_eq!(ray_aabb(&ray, &unit_box_at(3.0)), Some(7.5));
        // behind the origin
        assert_eq!(ray_aabb(&ray, &unit_box_at(-10.0)), None);
    }

    #[test]
    fn origin_inside_box_hits_exit_face() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::unit_z()).unwrap();
        assert_eq!(ray_aabb(&ray, &unit_box_at(0.0)), Some(0.5));
    }

    #[test]
    fn ray_along_a_face_plane() {
        // direction has zero y and z components, origin lies on the top face
        let grazing = Ray::new(Point3::new(-5.0, 0.5, 0.0), Vector3::unit_x()).unwrap();
        assert_eq!(ray_aabb(&grazing, &unit_box_at(0.0)), Some(4.5));
        let above = Ray::new(Point3::new(-5.0, 0.6, 0.0), Vector3::unit_x()).unwrap();
        assert_eq!(ray_aabb(&above, &unit_box_at(0.0)), None);
    }

    #[test]
    fn miss_beside_the_box() {
        let ray = Ray::new(Point3::new(-5.0, 2.0, 0.0), Vector3::unit_x()).unwrap();
        assert_eq!(ray_aabb(&ray, &unit_box_at(0.0)), None);
    }

    #[test]
    fn turned_wall_is_tested_as_an_oriented_box() {
        let model = ModelData::empty()
            .with_category("walls", vec![serde_json::json!({ "GlobalId": "w" })]);
        let mut scene = Scene::new();
        let placed = ElementPlacer::new(&ViewerConfig::default())
            .place(
                &model,
                &mut ResourceCache::new(),
                &mut HeadlessRenderer::new(800, 600),
                &mut scene,
                &mut |_| {},
            )
            .placed;
        // the wall's long side now runs along (1, 0, -1)
        let turned = Instance {
            rotation: Quaternion::from_angle_y(Deg(45.0)),
            ..Instance::new()
        };
        let down = |x: f32, z: f32| Ray::new(Point3::new(x, 5.0, z), -Vector3::unit_y()).unwrap();

        // inside the turned wall's axis-aligned bounds, but beside the wall
        assert_eq!(pick_nearest(&down(0.6, 0.6), &scene, &placed, &turned), None);
        assert_eq!(
            pick_nearest(&down(0.6, -0.6), &scene, &placed, &turned).as_deref(),
            Some("w")
        );
        let dist = hit_distance(&down(0.6, -0.6), &scene, &placed[0], &turned).unwrap();
        assert!((dist - 3.5).abs() < 1e-4, "{dist}");
    }
}
