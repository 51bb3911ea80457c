use std::ops::Range;

use crate::render::{RenderCtx, RenderTarget};

use super::backend::{LineBackend, VertexLayout};
use super::error::LinesError;
use super::shader::{ShaderProgram, UniformSlot};

const MVP_SIZE: u64 = std::mem::size_of::<[f32; 16]>() as u64;

/// Matrix slots per uniform ring.
const MVP_RING_SLOTS: u64 = 256;

/// Uniform buffer holding one MVP per draw, bound with a dynamic offset.
///
/// Slots are handed out once each. A full ring is replaced, never rewound, so a
/// slot is never overwritten before the draw reading it has been submitted.
struct MvpRing {
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    next: u64,
}

impl MvpRing {
    fn is_full(&self) -> bool {
        self.next == MVP_RING_SLOTS
    }

    /// Byte offset of the next free slot.
    fn claim(&mut self) -> u64 {
        let offset = self.next * self.stride;
        self.next += 1;
        offset
    }
}

/// wgpu implementation of [`LineBackend`].
///
/// Draws into the caller's encoder with `LoadOp::Load`, so lines composite over
/// whatever the frame already holds. Every draw writes its MVP into a fresh ring
/// slot, which keeps several renders per frame independent.
pub struct WgpuLineBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    label: &'static str,

    vertex_module: Option<wgpu::ShaderModule>,
    fragment_module: Option<wgpu::ShaderModule>,
    vertex_entry: &'static str,
    fragment_entry: &'static str,
    mvp_slot: UniformSlot,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: Option<wgpu::PipelineLayout>,

    vbo: Option<wgpu::Buffer>,
    mvp_ring: Option<MvpRing>,
    rings_allocated: u32,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl WgpuLineBackend {
    /// Creates a backend whose pipeline renders into `format` targets.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
            format,
            label: "glines",
            vertex_module: None,
            fragment_module: None,
            vertex_entry: "",
            fragment_entry: "",
            mvp_slot: UniformSlot { group: 0, binding: 0 },
            bind_group_layout: None,
            pipeline_layout: None,
            vbo: None,
            mvp_ring: None,
            rings_allocated: 0,
            pipeline: None,
        }
    }

    pub fn from_ctx(ctx: &RenderCtx<'_>) -> Self {
        Self::new(ctx.device, ctx.queue, ctx.surface_format)
    }

    /// Prefix for wgpu debug labels.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn create_mvp_ring(&mut self) -> Option<MvpRing> {
        let bgl = self.bind_group_layout.as_ref()?;
        let align = u64::from(self.device.limits().min_uniform_buffer_offset_alignment);
        let stride = wgpu::util::align_to(MVP_SIZE, align);

        let ubo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(format!("{} lines mvp ring", self.label).as_str()),
            size: stride * MVP_RING_SLOTS,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(format!("{} lines bind group", self.label).as_str()),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: self.mvp_slot.binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: wgpu::BufferSize::new(MVP_SIZE),
                }),
            }],
        });

        self.rings_allocated += 1;
        log::debug!(
            "{}: mvp ring #{} ({} slots of {stride} bytes)",
            self.label,
            self.rings_allocated,
            MVP_RING_SLOTS
        );
        Some(MvpRing {
            ubo,
            bind_group,
            stride,
            next: 0,
        })
    }

    fn create_pipeline(&self, layout: &VertexLayout) -> Option<wgpu::RenderPipeline> {
        let vertex_module = self.vertex_module.as_ref()?;
        let fragment_module = self.fragment_module.as_ref()?;
        let pipeline_layout = self.pipeline_layout.as_ref()?;

        let attributes = [
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: layout.pos.offset,
                shader_location: layout.pos.location,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: layout.col.offset,
                shader_location: layout.col.location,
            },
        ];

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(format!("{} lines pipeline", self.label).as_str()),
            layout: Some(pipeline_layout),

            vertex: wgpu::VertexState {
                module: vertex_module,
                entry_point: Some(self.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: layout.stride,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: fragment_module,
                entry_point: Some(self.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
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
        });

        Some(pipeline)
    }
}

impl LineBackend for WgpuLineBackend {
    type Target<'t> = RenderTarget<'t>;

    fn create_program(&mut self, program: &ShaderProgram) -> Result<(), LinesError> {
        let slot = program.locations.mvp;
        if slot.group != 0 {
            return Err(LinesError::ProgramLink {
                log: format!("uniform `u_mvp` must live in group 0, found group {}", slot.group),
            });
        }

        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(format!("{} lines vs", self.label).as_str()),
            source: wgpu::ShaderSource::Wgsl(program.vertex_src.into()),
        });
        let fragment_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(format!("{} lines fs", self.label).as_str()),
            source: wgpu::ShaderSource::Wgsl(program.fragment_src.into()),
        });

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(format!("{} lines bgl", self.label).as_str()),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: slot.binding,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: wgpu::BufferSize::new(MVP_SIZE),
                        },
                        count: None,
                    }],
                });

        let pipeline_layout =
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(format!("{} lines pipeline layout", self.label).as_str()),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        self.vertex_module = Some(vertex_module);
        self.fragment_module = Some(fragment_module);
        self.vertex_entry = program.vertex_entry;
        self.fragment_entry = program.fragment_entry;
        self.mvp_slot = slot;
        self.bind_group_layout = Some(bind_group_layout);
        self.pipeline_layout = Some(pipeline_layout);
        Ok(())
    }

    fn create_vertex_storage(&mut self, layout: &VertexLayout) -> Result<(), LinesError> {
        let max_bytes = self.device.limits().max_buffer_size;
        if layout.capacity_bytes > max_bytes {
            return Err(LinesError::CapacityExceeded {
                requested: (layout.capacity_bytes / layout.stride) as usize,
                capacity: (max_bytes / layout.stride) as usize,
            });
        }

        if self.bind_group_layout.is_none() {
            return Err(LinesError::ProgramLink {
                log: "vertex storage requested before the program was created".to_string(),
            });
        }

        // wgpu zero-initializes new buffers.
        let vbo = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(format!("{} lines vbo", self.label).as_str()),
            size: layout.capacity_bytes,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.vbo = Some(vbo);
        self.mvp_ring = self.create_mvp_ring();
        self.pipeline = self.create_pipeline(layout);
        Ok(())
    }

    fn write_vertices(&mut self, offset: u64, bytes: &[u8]) {
        let Some(vbo) = self.vbo.as_ref() else { return };
        self.queue.write_buffer(vbo, offset, bytes);
    }

    fn draw_lines(&mut self, target: &mut RenderTarget<'_>, vertices: Range<u32>, mvp: &[f32; 16]) {
        if self.pipeline.is_none() || self.vbo.is_none() {
            return;
        }
        if self.mvp_ring.as_ref().is_none_or(MvpRing::is_full) {
            // The old ring stays alive until the work that reads it is done.
            self.mvp_ring = self.create_mvp_ring();
        }
        let (Some(pipeline), Some(vbo), Some(ring)) =
            (self.pipeline.as_ref(), self.vbo.as_ref(), self.mvp_ring.as_mut())
        else {
            return;
        };

        let offset = ring.claim();
        self.queue
            .write_buffer(&ring.ubo, offset, bytemuck::cast_slice(mvp));

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(format!("{} lines pass", self.label).as_str()),
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

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(self.mvp_slot.group, &ring.bind_group, &[offset as u32]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.draw(vertices, 0..1);
        // Pass ends here; no pipeline or vertex stream stays bound.
    }

    fn release(&mut self) {
        self.pipeline = None;
        if let Some(ring) = self.mvp_ring.take() {
            ring.ubo.destroy();
        }
        if let Some(vbo) = self.vbo.take() {
            vbo.destroy();
        }
        self.pipeline_layout = None;
        self.bind_group_layout = None;
        self.fragment_module = None;
        self.vertex_module = None;
    }
}
