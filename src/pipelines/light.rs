//! Scene lighting: one ambient term and a single directional light.

use cgmath::{InnerSpace, Vector3};

use crate::resources::Colour;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub ambient: Colour,
    pub ambient_intensity: f32,
    /// Position of the directional light; it shines towards the origin.
    pub directional_position: Vector3<f32>,
    pub directional: Colour,
    pub directional_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: Colour(0xffffff),
            ambient_intensity: 0.6,
            directional_position: Vector3::new(10.0, 10.0, 5.0),
            directional: Colour(0xffffff),
            directional_intensity: 0.8,
        }
    }
}

impl Lighting {
    pub fn uniform(&self) -> LightUniform {
        let direction = if self.directional_position.magnitude2() > 0.0 {
            -self.directional_position.normalize()
        } else {
            -Vector3::unit_y()
        };
        LightUniform {
            ambient: self.ambient.to_rgb(),
            ambient_intensity: self.ambient_intensity,
            direction: direction.into(),
            _padding: 0,
            colour: self.directional.to_rgb(),
            intensity: self.directional_intensity,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub ambient: [f32; 3],
    pub ambient_intensity: f32,
    /// Direction the light travels in, normalized.
    pub direction: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    pub _padding: u32,
    pub colour: [f32; 3],
    pub intensity: f32,
}

impl Default for LightUniform {
    fn default() -> Self {
        Lighting::default().uniform()
    }
}

#[cfg(feature = "gpu")]
pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    use wgpu::util::DeviceExt;

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

#[cfg(feature = "gpu")]
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

#[cfg(feature = "gpu")]
pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn uniform_points_from_the_light_to_the_origin() {
        let uniform = Lighting::default().uniform();
        let expected = -Vector3::new(10.0f32, 10.0, 5.0).normalize();
        assert_relative_eq!(uniform.direction[0], expected.x);
        assert_relative_eq!(uniform.direction[1], expected.y);
        assert_relative_eq!(uniform.direction[2], expected.z);
        assert_eq!(uniform.ambient, [1.0, 1.0, 1.0]);
        assert_eq!(uniform.ambient_intensity, 0.6);
        assert_eq!(std::mem::size_of::<LightUniform>() % 16, 0);
    }
}
