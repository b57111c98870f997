//! wgpu renderer for the particle field.
//!
//! Each attribute array of [`AttributeBuffers`] gets its own instance-rate
//! vertex buffer. Every pool slot is drawn as one camera-facing quad (six
//! vertices generated from `vertex_index`), textured with the sprite and
//! alpha-tested in the fragment shader. Hidden slots are collapsed outside
//! the clip volume by the vertex shader.

mod camera;
#[cfg(feature = "egui")]
pub(crate) mod egui_integration;
mod texture;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::buffers::AttributeBuffers;
use crate::config::BlendMode;
use crate::error::RenderError;

pub use camera::Camera;
pub use texture::{SpriteImage, SpriteTexture};

/// WGSL source of the particle pipeline.
pub const PARTICLE_SHADER: &str = include_str!("particle.wgsl");

/// Fragments with alpha below this are discarded unless overridden.
pub const DEFAULT_ALPHA_TEST: f32 = 0.05;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const SIZE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32];
const OPACITY_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32];
const VISIBLE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![4 => Float32];

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct Uniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    camera_right: [f32; 4],
    camera_up: [f32; 4],
    alpha_test: f32,
    _padding: [f32; 3],
}

impl Uniforms {
    pub(crate) fn new(camera: &Camera, aspect: f32, model: Mat4, alpha_test: f32) -> Self {
        let view = camera.view_matrix();
        // Rows of the view rotation are the camera axes in world space.
        let right = view.row(0).truncate();
        let up = view.row(1).truncate();

        Self {
            view_proj: camera.view_proj(aspect).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            camera_right: right.extend(0.0).to_array(),
            camera_up: up.extend(0.0).to_array(),
            alpha_test,
            _padding: [0.0; 3],
        }
    }
}

/// Color blend state for a blend mode.
pub fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Normal => wgpu::BlendState::ALPHA_BLENDING,
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
        BlendMode::Multiply => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Dst,
                dst_factor: wgpu::BlendFactor::Zero,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        },
    }
}

/// Only normal blending writes depth; the other modes are order independent.
pub fn writes_depth(mode: BlendMode) -> bool {
    matches!(mode, BlendMode::Normal)
}

/// Render target handed to overlays drawn after the particles.
pub struct FrameTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    /// Surface size in physical pixels.
    pub size: [u32; 2],
}

struct InstanceBuffers {
    position: wgpu::Buffer,
    color: wgpu::Buffer,
    size: wgpu::Buffer,
    opacity: wgpu::Buffer,
    visible: wgpu::Buffer,
    capacity: usize,
}

impl InstanceBuffers {
    fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let slots = capacity.max(1) as wgpu::BufferAddress;
        let vec3 = std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress;
        let scalar = std::mem::size_of::<f32>() as wgpu::BufferAddress;

        let create = |label: &str, stride: wgpu::BufferAddress| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: slots * stride,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Self {
            position: create("Position Buffer", vec3),
            color: create("Color Buffer", vec3),
            size: create("Size Buffer", scalar),
            opacity: create("Opacity Buffer", scalar),
            visible: create("Visible Buffer", scalar),
            capacity,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, buffers: &AttributeBuffers) {
        if buffers.capacity() == 0 {
            return;
        }
        queue.write_buffer(&self.position, 0, bytemuck::cast_slice(buffers.position()));
        queue.write_buffer(&self.color, 0, bytemuck::cast_slice(buffers.color()));
        queue.write_buffer(&self.size, 0, bytemuck::cast_slice(buffers.size()));
        queue.write_buffer(&self.opacity, 0, bytemuck::cast_slice(buffers.opacity()));
        queue.write_buffer(&self.visible, 0, bytemuck::cast_slice(buffers.visible()));
    }
}

/// GPU state: surface, pipeline, instance buffers and sprite.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipeline: wgpu::RenderPipeline,
    blend: BlendMode,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    instances: InstanceBuffers,
    alpha_test: f32,
}

impl Renderer {
    /// Set up the device and pipeline for `window`.
    pub async fn new(
        window: Arc<Window>,
        capacity: usize,
        blend: BlendMode,
        sprite: &SpriteImage,
        alpha_test: f32,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!(
            "renderer ready: {} ({:?}), surface {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            surface_format
        );

        let depth_texture = create_depth_texture(&device, &config);
        let sprite = SpriteTexture::upload(&device, &queue, sprite);

        let uniforms = Uniforms::new(
            &Camera::new(),
            config.width as f32 / config.height as f32,
            Mat4::IDENTITY,
            alpha_test,
        );
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&sprite.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sprite.sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(PARTICLE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_pipeline(&device, &pipeline_layout, &shader, config.format, blend);
        let instances = InstanceBuffers::new(&device, capacity);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            shader,
            pipeline_layout,
            pipeline,
            blend,
            uniform_buffer,
            bind_group,
            depth_texture,
            instances,
            alpha_test,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Surface texture format.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Surface size in physical pixels.
    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }

    /// Slots the instance buffers currently hold.
    pub fn capacity(&self) -> usize {
        self.instances.capacity
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size, after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Switch blend mode, rebuilding the pipeline if it changed.
    pub fn set_blend(&mut self, blend: BlendMode) {
        if blend == self.blend {
            return;
        }
        log::debug!("blend mode {} -> {}", self.blend.name(), blend.name());
        self.pipeline = create_pipeline(
            &self.device,
            &self.pipeline_layout,
            &self.shader,
            self.config.format,
            blend,
        );
        self.blend = blend;
    }

    /// Copy the attribute arrays to the GPU if they changed.
    ///
    /// Instance buffers are recreated when the slot count changes.
    pub fn sync(&mut self, buffers: &mut AttributeBuffers) {
        let resized = buffers.capacity() != self.instances.capacity;
        if resized {
            log::debug!(
                "instance buffers {} -> {} slots",
                self.instances.capacity,
                buffers.capacity()
            );
            self.instances = InstanceBuffers::new(&self.device, buffers.capacity());
        }
        if buffers.take_dirty() || resized {
            self.instances.upload(&self.queue, buffers);
        }
    }

    /// Draw one frame, then let `overlay` record into the same encoder.
    pub fn render<F>(&mut self, camera: &Camera, model: Mat4, overlay: F) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(FrameTarget<'_>),
    {
        let aspect = self.config.width as f32 / self.config.height as f32;
        let uniforms = Uniforms::new(camera, aspect, model, self.alpha_test);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if self.instances.capacity > 0 {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.instances.position.slice(..));
                render_pass.set_vertex_buffer(1, self.instances.color.slice(..));
                render_pass.set_vertex_buffer(2, self.instances.size.slice(..));
                render_pass.set_vertex_buffer(3, self.instances.opacity.slice(..));
                render_pass.set_vertex_buffer(4, self.instances.visible.slice(..));
                render_pass.draw(0..6, 0..self.instances.capacity as u32);
            }
        }

        overlay(FrameTarget {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut encoder,
            view: &view,
            size: [self.config.width, self.config.height],
        });

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn instance_layout(
    stride: usize,
    attributes: &'static [wgpu::VertexAttribute],
) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: stride as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    let vec3 = std::mem::size_of::<[f32; 3]>();
    let scalar = std::mem::size_of::<f32>();
    let buffers = [
        instance_layout(vec3, &POSITION_ATTRS),
        instance_layout(vec3, &COLOR_ATTRS),
        instance_layout(scalar, &SIZE_ATTRS),
        instance_layout(scalar, &OPACITY_ATTRS),
        instance_layout(scalar, &VISIBLE_ATTRS),
    ];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Particle Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend_state(blend)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: writes_depth(blend),
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
