//! wgpu implementation of [`GpuDevice`] and frame encoding.
//!
//! Bind group layout shared by every program:
//! - group 0: per-draw uniform block, one dynamic-offset slot per draw
//! - group 1: texture + linear clamp sampler (a 1×1 white texture when the
//!   draw is untextured)

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::coords::{FramebufferSize, FramebufferSource};
use crate::device::GpuContext;

use super::ctx::RenderTarget;
use super::device::GpuDevice;
use super::frame::Frame;
use super::program::{
    LinkedShader, ShaderError, MAX_UNIFORM_BLOCK, SAMPLER_BINDING, TEXTURE_BINDING, TEXTURE_GROUP,
    UNIFORM_GROUP,
};
use super::texture::{TextureSize, WHITE_PIXEL};
use super::vertex::Vertex;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Render pipeline of a linked program, straight-alpha blended.
#[derive(Debug)]
pub struct ProgramPipeline {
    pipeline: wgpu::RenderPipeline,
}

#[derive(Debug)]
pub struct GeometryBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
}

#[derive(Debug)]
pub struct TextureBinding {
    // Kept alive for the bind group's view.
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: TextureSize,
}

impl TextureBinding {
    pub fn size(&self) -> TextureSize {
        self.size
    }
}

struct UniformRing {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
}

/// wgpu-backed GPU object factory.
pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    target_format: wgpu::TextureFormat,
    max_texture_dimension: u32,
    framebuffer: Arc<dyn FramebufferSource>,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: Arc<TextureBinding>,

    uniform_stride: u64,
    uniforms: Option<UniformRing>,
}

impl WgpuDevice {
    /// Creates the shared layouts, sampler and white texture.
    ///
    /// Pipelines render into `target_format` (the surface format, or an
    /// offscreen texture's). `framebuffer` is queried on every clip and
    /// projection update, so it must report the live size (a window does).
    pub fn new(
        context: &GpuContext,
        target_format: wgpu::TextureFormat,
        framebuffer: Arc<dyn FramebufferSource>,
    ) -> Self {
        let device = context.device().clone();
        let queue = context.queue().clone();

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kiln uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kiln texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: TEXTURE_BINDING,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: SAMPLER_BINDING,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("kiln linear sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment).max(1);
        let uniform_stride = u64::from(MAX_UNIFORM_BLOCK).div_ceil(alignment) * alignment;

        let white = Arc::new(upload_texture(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            TextureSize::new(1, 1),
            &WHITE_PIXEL,
        ));

        Self {
            device,
            queue,
            target_format,
            max_texture_dimension: context.max_texture_dimension(),
            framebuffer,
            uniform_layout,
            texture_layout,
            sampler,
            white,
            uniform_stride,
            uniforms: None,
        }
    }

    /// Replays `frame` into one render pass over `target`, in recorded order.
    ///
    /// The pass loads the existing contents; clearing is the caller's job.
    pub fn encode(&mut self, frame: &Frame<Self>, target: &mut RenderTarget<'_>) {
        if frame.is_empty() || target.size.is_empty() {
            return;
        }

        self.ensure_uniform_capacity(frame.len());
        let Some(ring) = self.uniforms.as_ref() else { return };

        let stride = self.uniform_stride as usize;
        let slot = MAX_UNIFORM_BLOCK as usize;
        let mut staging = vec![0u8; frame.len() * stride];
        for (i, draw) in frame.draws().iter().enumerate() {
            let len = draw.uniforms.len().min(slot);
            let start = i * stride;
            staging[start..start + len].copy_from_slice(&draw.uniforms[..len]);
        }
        self.queue.write_buffer(&ring.buffer, 0, &staging);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln ui pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let full = (0, 0, target.size.width, target.size.height);
        let mut skipped = 0usize;

        for (i, draw) in frame.draws().iter().enumerate() {
            let (x, y, w, h) = match draw.scissor {
                None => full,
                Some(scissor) => match scissor.to_target(target.size) {
                    Some(rect) => rect,
                    None => {
                        skipped += 1;
                        continue;
                    }
                },
            };
            rpass.set_scissor_rect(x, y, w, h);

            rpass.set_pipeline(&draw.program.pipeline);

            let offset = (i * stride) as u32;
            rpass.set_bind_group(UNIFORM_GROUP, &ring.bind_group, &[offset]);

            let texture = draw.texture.as_ref().unwrap_or(&self.white);
            rpass.set_bind_group(TEXTURE_GROUP, &texture.bind_group, &[]);

            rpass.set_vertex_buffer(0, draw.geometry.vertex.slice(..));
            rpass.set_index_buffer(draw.geometry.index.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..draw.index_count, 0, 0..1);
        }

        if skipped > 0 {
            log::trace!("{skipped} draw(s) fully clipped");
        }
    }

    fn ensure_uniform_capacity(&mut self, required: usize) {
        if self.uniforms.as_ref().is_some_and(|r| r.capacity >= required) {
            return;
        }

        let capacity = required.next_power_of_two().max(64);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kiln uniform ring"),
            size: capacity as u64 * self.uniform_stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kiln uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(u64::from(MAX_UNIFORM_BLOCK)),
                }),
            }],
        });

        log::debug!("uniform ring grown to {capacity} draws");
        self.uniforms = Some(UniformRing { buffer, bind_group, capacity });
    }

    fn create_pipeline(
        &self,
        layout: &wgpu::PipelineLayout,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        shader: &LinkedShader,
    ) -> wgpu::RenderPipeline {
        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("kiln program"),
            layout: Some(layout),

            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some(shader.vertex.entry_point.as_str()),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some(shader.fragment.entry_point.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.target_format,
                    blend: Some(straight_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

impl GpuDevice for WgpuDevice {
    type Program = Arc<ProgramPipeline>;
    type Geometry = Arc<GeometryBuffers>;
    type Texture = Arc<TextureBinding>;

    fn create_program(&mut self, shader: &LinkedShader) -> Result<Self::Program, ShaderError> {
        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kiln vertex shader"),
            source: wgpu::ShaderSource::Wgsl(shader.vertex.source.as_str().into()),
        });
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kiln fragment shader"),
            source: wgpu::ShaderSource::Wgsl(shader.fragment.source.as_str().into()),
        });

        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kiln program layout"),
            bind_group_layouts: &[&self.uniform_layout, &self.texture_layout],
            immediate_size: 0,
        });

        let pipeline = self.create_pipeline(&layout, &vertex, &fragment, shader);
        Ok(Arc::new(ProgramPipeline { pipeline }))
    }

    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> Self::Geometry {
        // A zero-sized vertex buffer cannot be sliced.
        let placeholder = [Vertex::default()];
        let vertices = if vertices.is_empty() { &placeholder[..] } else { vertices };

        let vertex = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("kiln geometry vbo"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("kiln geometry ibo"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Arc::new(GeometryBuffers { vertex, index })
    }

    fn release_geometry(&mut self, geometry: Self::Geometry) {
        // Buffers are freed once the last recorded draw using them is gone.
        drop(geometry);
    }

    fn create_texture(&mut self, size: TextureSize, pixels: &[u8]) -> Self::Texture {
        Arc::new(upload_texture(
            &self.device,
            &self.queue,
            &self.texture_layout,
            &self.sampler,
            size,
            pixels,
        ))
    }

    fn release_texture(&mut self, texture: Self::Texture) {
        drop(texture);
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    fn framebuffer_size(&self) -> FramebufferSize {
        self.framebuffer.framebuffer_size()
    }
}

/// Source-alpha / one-minus-source-alpha for color and alpha (straight alpha).
fn straight_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    size: TextureSize,
    pixels: &[u8],
) -> TextureBinding {
    let extent = wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("kiln texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        extent,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("kiln texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: TEXTURE_BINDING,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    TextureBinding {
        _texture: texture,
        bind_group,
        size,
    }
}
