//! wgpu rendering backend.
//!
//! [`WgpuRenderer`] owns the device, the surface and every GPU object created
//! for one scene session. Geometries, materials and line meshes are uploaded
//! once; per frame only the camera and light uniforms are written and one
//! instance buffer per batch is built. Disposing drops the whole GPU state, so
//! the context is gone even while the window stays open.

use std::{collections::HashMap, iter, mem};

use anyhow::{anyhow, bail, Context as _};
use wgpu::util::DeviceExt;

use crate::{
    camera::CameraUniform,
    data_structures::{
        aids::{LineMesh, LineVertex},
        instance::InstanceRaw,
        primitive::{MeshData, ModelVertex},
    },
    pipelines::{basic, light},
    render::Frame,
    renderer::{GpuId, Renderer},
    resources::MaterialDesc,
};

/// Vertex buffer layout of a type uploaded to the GPU.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

impl Vertex for LineVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/**
 * Stride layout here: position + rotation + scale as 4x4 matrix (hence the four 4d vectors),
 * followed by the 3x3 normal matrix and the emissive tint.
 */
impl Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x3,
            10 => Float32x3,
            11 => Float32x3,
            12 => Float32x3,
        ];
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // We need to switch from using a step mode of Vertex to Instance
            // This means that our shaders will only change to use the next
            // instance when the shader starts processing a new instance
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    colour: [f32; 4],
}

#[derive(Debug)]
pub struct DepthTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    edges: wgpu::Buffer,
    edge_count: u32,
}

struct GpuLines {
    vertices: wgpu::Buffer,
    vertex_count: u32,
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: DepthTexture,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
    material_bind_group_layout: wgpu::BindGroupLayout,
    fill_pipeline: wgpu::RenderPipeline,
    wire_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    geometries: HashMap<GpuId, GpuMesh>,
    materials: HashMap<GpuId, wgpu::BindGroup>,
    lines: HashMap<GpuId, GpuLines>,
}

pub struct WgpuRenderer {
    state: Option<GpuState>,
    next_id: u32,
    size: (u32, u32),
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
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
        label: Some(label),
    })
}

fn uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some(label),
    })
}

impl WgpuRenderer {
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        // Vulkan, Metal or DX12
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .context("creating the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("requesting a device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shader colours assume an Srgb surface texture.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface supports no texture format"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout = uniform_layout(&device, "camera_bind_group_layout");
        let camera_bind_group = uniform_bind_group(
            &device,
            &camera_bind_group_layout,
            &camera_buffer,
            "camera_bind_group",
        );

        let light_buffer = light::mk_buffer(&device, light::LightUniform::default());
        let light_bind_group_layout = light::mk_bind_group_layout(&device);
        let light_bind_group =
            light::mk_bind_group(&device, &light_bind_group_layout, &light_buffer);

        let material_bind_group_layout = uniform_layout(&device, "material_bind_group_layout");

        let fill_pipeline = basic::mk_basic_pipeline(
            &device,
            config.format,
            &camera_bind_group_layout,
            &light_bind_group_layout,
            &material_bind_group_layout,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let wire_pipeline = basic::mk_basic_pipeline(
            &device,
            config.format,
            &camera_bind_group_layout,
            &light_bind_group_layout,
            &material_bind_group_layout,
            wgpu::PrimitiveTopology::LineList,
        );
        let line_pipeline =
            basic::mk_line_pipeline(&device, config.format, &camera_bind_group_layout);

        let depth_texture =
            DepthTexture::new(&device, [config.width, config.height], "depth_texture");

        log::info!(
            "wgpu renderer ready ({:?}, {}x{})",
            surface_format,
            config.width,
            config.height
        );
        Ok(Self {
            size: (config.width, config.height),
            state: Some(GpuState {
                surface,
                device,
                queue,
                config,
                depth_texture,
                camera_buffer,
                camera_bind_group,
                light_buffer,
                light_bind_group,
                material_bind_group_layout,
                fill_pipeline,
                wire_pipeline,
                line_pipeline,
                geometries: HashMap::new(),
                materials: HashMap::new(),
                lines: HashMap::new(),
            }),
            next_id: 0,
        })
    }

    fn next_id(&mut self) -> GpuId {
        self.next_id += 1;
        GpuId(self.next_id)
    }
}

impl Renderer for WgpuRenderer {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        if let Some(gpu) = &mut self.state {
            gpu.config.width = width;
            gpu.config.height = height;
            gpu.surface.configure(&gpu.device, &gpu.config);
            gpu.depth_texture = DepthTexture::new(&gpu.device, [width, height], "depth_texture");
        }
    }

    fn upload_geometry(&mut self, mesh: &MeshData) -> GpuId {
        let id = self.next_id();
        let Some(gpu) = &mut self.state else {
            log::warn!("geometry upload on a disposed renderer ignored");
            return id;
        };
        let buffer = |contents: &[u8], usage, label| {
            gpu.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage,
                })
        };
        let uploaded = GpuMesh {
            vertices: buffer(
                bytemuck::cast_slice(&mesh.vertices),
                wgpu::BufferUsages::VERTEX,
                "Geometry Vertex Buffer",
            ),
            indices: buffer(
                bytemuck::cast_slice(&mesh.indices),
                wgpu::BufferUsages::INDEX,
                "Geometry Index Buffer",
            ),
            index_count: mesh.indices.len() as u32,
            edges: buffer(
                bytemuck::cast_slice(&mesh.edges),
                wgpu::BufferUsages::INDEX,
                "Geometry Edge Buffer",
            ),
            edge_count: mesh.edges.len() as u32,
        };
        gpu.geometries.insert(id, uploaded);
        id
    }

    fn upload_material(&mut self, material: &MaterialDesc) -> GpuId {
        let id = self.next_id();
        let Some(gpu) = &mut self.state else {
            log::warn!("material upload on a disposed renderer ignored");
            return id;
        };
        let buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Material Buffer"),
                contents: bytemuck::cast_slice(&[MaterialUniform {
                    colour: material.colour.to_rgba(),
                }]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = uniform_bind_group(
            &gpu.device,
            &gpu.material_bind_group_layout,
            &buffer,
            "material_bind_group",
        );
        gpu.materials.insert(id, bind_group);
        id
    }

    fn upload_lines(&mut self, lines: &LineMesh) -> GpuId {
        let id = self.next_id();
        let Some(gpu) = &mut self.state else {
            log::warn!("line upload on a disposed renderer ignored");
            return id;
        };
        let vertices = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(lines.label),
                contents: bytemuck::cast_slice(&lines.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        gpu.lines.insert(
            id,
            GpuLines {
                vertices,
                vertex_count: lines.vertices.len() as u32,
            },
        );
        id
    }

    fn draw(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let Some(gpu) = &mut self.state else {
            bail!("draw on a disposed renderer");
        };
        gpu.queue
            .write_buffer(&gpu.camera_buffer, 0, bytemuck::cast_slice(&[frame.camera]));
        gpu.queue
            .write_buffer(&gpu.light_buffer, 0, bytemuck::cast_slice(&[frame.light]));

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let instance_buffers: Vec<wgpu::Buffer> = frame
            .batches
            .iter()
            .map(|batch| {
                gpu.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Instance Buffer"),
                        contents: bytemuck::cast_slice(&batch.instances),
                        usage: wgpu::BufferUsages::VERTEX,
                    })
            })
            .collect();
        let line_instance_buffers: Vec<wgpu::Buffer> = frame
            .lines
            .iter()
            .map(|batch| {
                gpu.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Line Instance Buffer"),
                        contents: bytemuck::cast_slice(&[batch.instance]),
                        usage: wgpu::BufferUsages::VERTEX,
                    })
            })
            .collect();

        let [r, g, b] = frame.clear_colour.to_rgb();
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(if frame.wireframe {
                &gpu.wire_pipeline
            } else {
                &gpu.fill_pipeline
            });
            render_pass.set_bind_group(0, &gpu.camera_bind_group, &[]);
            render_pass.set_bind_group(1, &gpu.light_bind_group, &[]);
            for (batch, instances) in frame.batches.iter().zip(&instance_buffers) {
                let (Some(mesh), Some(material)) = (
                    gpu.geometries.get(&batch.geometry),
                    gpu.materials.get(&batch.material),
                ) else {
                    log::warn!("skipping batch with unknown resources {:?}", batch.geometry);
                    continue;
                };
                let count = batch.instances.len() as u32;
                render_pass.set_bind_group(2, material, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                render_pass.set_vertex_buffer(1, instances.slice(..));
                if frame.wireframe {
                    render_pass.set_index_buffer(mesh.edges.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.edge_count, 0, 0..count);
                } else {
                    render_pass
                        .set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.index_count, 0, 0..count);
                }
            }

            render_pass.set_pipeline(&gpu.line_pipeline);
            render_pass.set_bind_group(0, &gpu.camera_bind_group, &[]);
            for (batch, instance) in frame.lines.iter().zip(&line_instance_buffers) {
                let Some(lines) = gpu.lines.get(&batch.lines) else {
                    continue;
                };
                render_pass.set_vertex_buffer(0, lines.vertices.slice(..));
                render_pass.set_vertex_buffer(1, instance.slice(..));
                render_pass.draw(0..lines.vertex_count, 0..1);
            }
        }

        gpu.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn dispose(&mut self) {
        if let Some(gpu) = self.state.take() {
            log::debug!(
                "releasing {} geometries, {} materials, {} line meshes",
                gpu.geometries.len(),
                gpu.materials.len(),
                gpu.lines.len()
            );
            gpu.device.destroy();
        }
    }

    fn is_disposed(&self) -> bool {
        self.state.is_none()
    }
}
