//! [`RenderBackend`] + [`AssetLoader`] on top of wgpu.
//!
//! The renderer's bind/draw calls are recorded into a frame list and
//! replayed inside a single render pass at [`end_frame`]. Each recorded
//! draw captures the binding state current when it was issued, so the
//! immediate-mode call sequence maps onto wgpu's pass model without the
//! renderer knowing about bind groups.
//!
//! [`end_frame`]: RenderBackend::end_frame

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::backend::{
    AssetError, AssetLoader, BufferHandle, BufferKind, BufferUsage,
    DrawUniforms, FrameError, Primitive, ProgramHandle, RenderBackend,
    ShaderSource, ShaderStage, SubsystemKind, TextureHandle,
};
use super::dynamic_buffer::DynamicBuffer;
use super::pipeline_helpers;
use super::render_context::{RenderContext, RenderContextError};
use super::texture::{DepthTarget, SampledTexture};

/// Vertices emitted per sprite instance (two triangles).
const SPRITE_VERTICES: u32 = 6;

struct Program {
    kind: SubsystemKind,
    pipeline: wgpu::RenderPipeline,
}

#[derive(Clone, Copy)]
enum DrawCall {
    Arrays { primitive: Primitive, count: u32 },
    Indexed { count: u32 },
}

/// Binding state accumulated between `bind_program` and `unbind_all`.
#[derive(Default, Clone)]
struct BindState {
    program: Option<ProgramHandle>,
    textures: Vec<(u32, TextureHandle)>,
    vertex: Option<BufferHandle>,
    index: Option<BufferHandle>,
    uniforms: Option<DrawUniforms>,
}

struct RecordedDraw {
    state: BindState,
    call: DrawCall,
}

struct FrameRecording {
    clear: wgpu::Color,
    draws: Vec<RecordedDraw>,
}

/// GPU objects resolved for one recorded draw, ready to encode.
struct PreparedDraw<'a> {
    pipeline: &'a wgpu::RenderPipeline,
    uniforms: wgpu::BindGroup,
    textures: wgpu::BindGroup,
    vertex: wgpu::BufferSlice<'a>,
    index: Option<wgpu::BufferSlice<'a>>,
    call: DrawCall,
}

/// wgpu implementation of the backend seam.
pub struct WgpuBackend {
    context: RenderContext,
    depth: DepthTarget,
    sampler: wgpu::Sampler,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layouts: FxHashMap<SubsystemKind, wgpu::BindGroupLayout>,
    buffers: FxHashMap<BufferHandle, DynamicBuffer>,
    textures: FxHashMap<TextureHandle, SampledTexture>,
    programs: FxHashMap<ProgramHandle, Program>,
    next_id: u32,
    bound: BindState,
    frame: Option<FrameRecording>,
}

impl WgpuBackend {
    /// Create the device, surface, and shared layouts for a window.
    ///
    /// # Errors
    ///
    /// Returns [`RenderContextError`] if no adapter, device, or compatible
    /// surface configuration is available.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<Self, RenderContextError> {
        let context = RenderContext::new(window, size).await?;
        let device = &context.device;

        let depth =
            DepthTarget::new(device, context.config.width, context.config.height);
        let sampler = pipeline_helpers::repeat_sampler(device, "Texture Sampler");
        let uniform_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw Uniforms Layout"),
                entries: &[pipeline_helpers::uniform_buffer(0)],
            });
        let texture_layouts = [
            SubsystemKind::Ground,
            SubsystemKind::Skybox,
            SubsystemKind::Particles,
        ]
        .into_iter()
        .map(|kind| {
            let entries = pipeline_helpers::texture_layout_entries(kind);
            let layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{kind} Texture Layout")),
                    entries: &entries,
                });
            (kind, layout)
        })
        .collect();

        Ok(Self {
            context,
            depth,
            sampler,
            uniform_layout,
            texture_layouts,
            buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            programs: FxHashMap::default(),
            next_id: 1,
            bound: BindState::default(),
            frame: None,
        })
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record(&mut self, call: DrawCall) {
        let Some(frame) = self.frame.as_mut() else {
            log::warn!("draw issued outside begin_frame/end_frame; ignored");
            return;
        };
        frame.draws.push(RecordedDraw {
            state: self.bound.clone(),
            call,
        });
    }

    /// Parse and validate WGSL, then hand the IR to wgpu.
    fn compile_module(
        &self,
        source: &ShaderSource,
    ) -> Result<wgpu::ShaderModule, AssetError> {
        let shader_error = |message: String| AssetError::Shader {
            path: source.path.clone(),
            message,
        };

        let module = naga::front::wgsl::parse_str(&source.code)
            .map_err(|e| shader_error(e.emit_to_string(&source.code)))?;
        let _ = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .map_err(|e| shader_error(e.to_string()))?;

        let (entry, stage) = match source.stage {
            ShaderStage::Vertex => ("vs_main", naga::ShaderStage::Vertex),
            ShaderStage::Fragment => ("fs_main", naga::ShaderStage::Fragment),
        };
        if !module
            .entry_points
            .iter()
            .any(|ep| ep.name == entry && ep.stage == stage)
        {
            return Err(shader_error(format!(
                "no {} entry point named `{entry}`",
                source.stage
            )));
        }

        Ok(self
            .context
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&source.path.display().to_string()),
                source: wgpu::ShaderSource::Naga(Cow::Owned(module)),
            }))
    }

    fn build_pipeline(
        &self,
        kind: SubsystemKind,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
    ) -> Result<wgpu::RenderPipeline, AssetError> {
        let vs = self.compile_module(vertex)?;
        let fs = self.compile_module(fragment)?;
        let layouts: Vec<&wgpu::BindGroupLayout> =
            std::iter::once(&self.uniform_layout)
                .chain(self.texture_layouts.get(&kind))
                .collect();
        Ok(pipeline_helpers::create_subsystem_pipeline(
            &self.context.device,
            kind,
            &vs,
            &fs,
            self.context.format(),
            &layouts,
        ))
    }

    fn decode_rgba(path: &Path) -> Result<image::RgbaImage, AssetError> {
        let decoded = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(source) => AssetError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => AssetError::Decode {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })?;
        Ok(decoded.to_rgba8())
    }

    /// Resolve one recorded draw into GPU objects. Draws referencing
    /// released or never-created resources are dropped with a warning.
    fn prepare(&self, draw: &RecordedDraw) -> Option<PreparedDraw<'_>> {
        let state = &draw.state;
        let program = self.programs.get(&state.program?)?;
        let vertex = self.buffers.get(&state.vertex?)?;
        if vertex.is_empty() {
            return None;
        }
        let index = match (draw.call, state.index) {
            (DrawCall::Indexed { .. }, Some(handle)) => {
                let buffer = self.buffers.get(&handle)?;
                if buffer.is_empty() {
                    return None;
                }
                Some(buffer.buffer().slice(..buffer.len() as u64))
            }
            (DrawCall::Indexed { .. }, None) => {
                log::warn!("{} draw has no index buffer", program.kind);
                return None;
            }
            (DrawCall::Arrays { .. }, _) => None,
        };

        let device = &self.context.device;
        let uniform_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Draw Uniforms"),
                contents: bytemuck::bytes_of(&state.uniforms.unwrap_or_else(
                    <DrawUniforms as bytemuck::Zeroable>::zeroed,
                )),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let uniforms = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Uniforms Bind Group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mut units = state.textures.clone();
        units.sort_by_key(|(unit, _)| *unit);
        if units.len() != program.kind.texture_units() as usize {
            log::warn!(
                "{} draw bound {} of {} textures",
                program.kind,
                units.len(),
                program.kind.texture_units()
            );
            return None;
        }
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        }];
        for (unit, handle) in &units {
            let texture = self.textures.get(handle)?;
            entries.push(wgpu::BindGroupEntry {
                binding: unit + 1,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
        }
        let textures = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Texture Bind Group", program.kind)),
            layout: self.texture_layouts.get(&program.kind)?,
            entries: &entries,
        });

        Some(PreparedDraw {
            pipeline: &program.pipeline,
            uniforms,
            textures,
            vertex: vertex.buffer().slice(..vertex.len() as u64),
            index,
            call: draw.call,
        })
    }
}

impl From<wgpu::SurfaceError> for FrameError {
    fn from(e: wgpu::SurfaceError) -> Self {
        match e {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                Self::Lost
            }
            wgpu::SurfaceError::OutOfMemory => Self::OutOfMemory,
            _ => Self::Timeout,
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn viewport_size(&self) -> (u32, u32) {
        self.context.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.depth = DepthTarget::new(&self.context.device, width, height);
    }

    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
    ) -> Option<BufferHandle> {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        let handle = BufferHandle(self.allocate_id());
        let buffer = DynamicBuffer::new(&self.context.device, label, 0, usage);
        let _ = self.buffers.insert(handle, buffer);
        Some(handle)
    }

    fn upload_buffer(
        &mut self,
        buffer: BufferHandle,
        data: &[u8],
        _usage: BufferUsage,
    ) {
        // wgpu has no usage hints; stream buffers grow in place.
        let Some(target) = self.buffers.get_mut(&buffer) else {
            log::warn!("upload to unknown buffer {buffer:?}");
            return;
        };
        let _ = target.write_bytes(
            &self.context.device,
            &self.context.queue,
            data,
        );
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if let Some(released) = self.buffers.remove(&buffer) {
            released.buffer().destroy();
        }
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if let Some(released) = self.textures.remove(&texture) {
            released.texture.destroy();
        }
    }

    fn release_program(&mut self, program: ProgramHandle) {
        let _ = self.programs.remove(&program);
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) {
        let [r, g, b, a] = clear_color.map(f64::from);
        self.bound = BindState::default();
        self.frame = Some(FrameRecording {
            clear: wgpu::Color { r, g, b, a },
            draws: Vec::new(),
        });
    }

    fn bind_program(&mut self, program: ProgramHandle) {
        self.bound.program = Some(program);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.bound.textures.retain(|(bound_unit, _)| *bound_unit != unit);
        self.bound.textures.push((unit, texture));
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.bound.vertex = Some(buffer);
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) {
        self.bound.index = Some(buffer);
    }

    fn set_uniforms(&mut self, uniforms: &DrawUniforms) {
        self.bound.uniforms = Some(*uniforms);
    }

    fn draw(&mut self, primitive: Primitive, count: u32) {
        self.record(DrawCall::Arrays { primitive, count });
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.record(DrawCall::Indexed { count: index_count });
    }

    fn unbind_all(&mut self) {
        self.bound = BindState::default();
    }

    fn end_frame(&mut self) -> Result<(), FrameError> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        let output = self.context.get_next_frame()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.context.format()),
            ..Default::default()
        });

        let prepared: Vec<PreparedDraw<'_>> = frame
            .draws
            .iter()
            .filter_map(|draw| self.prepare(draw))
            .collect();

        let mut encoder = self.context.create_encoder();
        {
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Scene Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(frame.clear),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: Some(
                        wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth.view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(1.0),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        },
                    ),
                    ..Default::default()
                });

            for draw in &prepared {
                pass.set_pipeline(draw.pipeline);
                pass.set_bind_group(0, &draw.uniforms, &[]);
                pass.set_bind_group(1, &draw.textures, &[]);
                pass.set_vertex_buffer(0, draw.vertex);
                match draw.call {
                    DrawCall::Arrays {
                        primitive: Primitive::Triangles,
                        count,
                    } => pass.draw(0..count, 0..1),
                    DrawCall::Arrays {
                        primitive: Primitive::Sprites,
                        count,
                    } => pass.draw(0..SPRITE_VERTICES, 0..count),
                    DrawCall::Indexed { count } => {
                        if let Some(index) = draw.index {
                            pass.set_index_buffer(
                                index,
                                wgpu::IndexFormat::Uint16,
                            );
                            pass.draw_indexed(0..count, 0, 0..1);
                        }
                    }
                }
            }
        }

        self.context.submit(encoder);
        output.present();
        Ok(())
    }
}

impl AssetLoader for WgpuBackend {
    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        let image = Self::decode_rgba(path)?;
        let texture = SampledTexture::from_rgba(
            &self.context.device,
            &self.context.queue,
            &path.display().to_string(),
            image.dimensions(),
            image.as_raw(),
        );
        let handle = TextureHandle(self.allocate_id());
        let _ = self.textures.insert(handle, texture);
        log::debug!("loaded texture {}", path.display());
        Ok(handle)
    }

    fn load_cube_map(
        &mut self,
        faces: &[PathBuf; 6],
    ) -> Result<TextureHandle, AssetError> {
        let mut edge = None;
        let mut pixels: [Vec<u8>; 6] = Default::default();
        for (slot, path) in pixels.iter_mut().zip(faces) {
            let image = Self::decode_rgba(path)?;
            let (width, height) = image.dimensions();
            if width != height {
                return Err(AssetError::InvalidCubeMap(format!(
                    "{} is {width}x{height}, faces must be square",
                    path.display()
                )));
            }
            match edge {
                Some(expected) if expected != width => {
                    return Err(AssetError::InvalidCubeMap(format!(
                        "{} is {width}px, other faces are {expected}px",
                        path.display()
                    )));
                }
                _ => edge = Some(width),
            }
            *slot = image.into_raw();
        }
        let edge = edge.unwrap_or_default();

        let texture = SampledTexture::cube_from_faces(
            &self.context.device,
            &self.context.queue,
            "Skybox Cube Map",
            edge,
            &pixels,
        );
        let handle = TextureHandle(self.allocate_id());
        let _ = self.textures.insert(handle, texture);
        Ok(handle)
    }

    fn compile_and_link(
        &mut self,
        kind: SubsystemKind,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
    ) -> Result<ProgramHandle, AssetError> {
        self.context
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let built = self.build_pipeline(kind, vertex, fragment);
        // The scope is popped even when compilation failed early.
        let scope_error =
            pollster::block_on(self.context.device.pop_error_scope());
        let pipeline = built?;
        if let Some(error) = scope_error {
            return Err(AssetError::Link {
                kind,
                message: error.to_string(),
            });
        }

        let handle = ProgramHandle(self.allocate_id());
        let _ = self.programs.insert(handle, Program { kind, pipeline });
        log::debug!("linked {kind} program");
        Ok(handle)
    }
}
