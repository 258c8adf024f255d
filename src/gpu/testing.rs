//! In-memory backend that records every call, for renderer and engine
//! tests that run without a GPU.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::backend::{
    AssetError, AssetLoader, BufferHandle, BufferKind, BufferUsage,
    DrawUniforms, FrameError, Primitive, ProgramHandle, RenderBackend,
    ShaderSource, ShaderStage, SubsystemKind, TextureHandle,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateBuffer(BufferHandle, BufferKind),
    Upload {
        buffer: BufferHandle,
        bytes: usize,
        usage: BufferUsage,
    },
    ReleaseBuffer(BufferHandle),
    ReleaseTexture(TextureHandle),
    ReleaseProgram(ProgramHandle),
    LoadTexture(PathBuf),
    LoadCubeMap,
    Link(SubsystemKind),
    BeginFrame,
    BindProgram(ProgramHandle),
    BindTexture(u32, TextureHandle),
    BindVertexBuffer(BufferHandle),
    BindIndexBuffer(BufferHandle),
    SetUniforms(DrawUniforms),
    Draw(Primitive, u32),
    DrawIndexed(u32),
    UnbindAll,
    EndFrame,
    Resize(u32, u32),
}

pub(crate) struct RecordingGpu {
    pub calls: Vec<Call>,
    failing_paths: HashSet<PathBuf>,
    failing_links: HashSet<SubsystemKind>,
    programs: HashMap<ProgramHandle, SubsystemKind>,
    live_buffers: HashSet<BufferHandle>,
    live_textures: HashSet<TextureHandle>,
    live_programs: HashSet<ProgramHandle>,
    next_id: u32,
    viewport: (u32, u32),
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            failing_paths: HashSet::new(),
            failing_links: HashSet::new(),
            programs: HashMap::new(),
            live_buffers: HashSet::new(),
            live_textures: HashSet::new(),
            live_programs: HashSet::new(),
            next_id: 1,
            viewport: (800, 600),
        }
    }

    /// Make any texture, cube face, or shader load from `path` fail.
    pub fn fail_path(mut self, path: impl Into<PathBuf>) -> Self {
        let _ = self.failing_paths.insert(path.into());
        self
    }

    /// Make linking the program for `kind` fail.
    pub fn fail_link(mut self, kind: SubsystemKind) -> Self {
        let _ = self.failing_links.insert(kind);
        self
    }

    pub fn heal(&mut self) {
        self.failing_paths.clear();
        self.failing_links.clear();
    }

    /// Subsystems drawn, in program-bind order, across all frames.
    pub fn drawn_subsystems(&self) -> Vec<SubsystemKind> {
        let mut bound = None;
        let mut drawn = Vec::new();
        for call in &self.calls {
            match call {
                Call::BindProgram(program) => {
                    bound = self.programs.get(program).copied();
                }
                Call::Draw(..) | Call::DrawIndexed(_) => {
                    if let Some(kind) = bound {
                        drawn.push(kind);
                    }
                }
                Call::UnbindAll => bound = None,
                _ => {}
            }
        }
        drawn
    }

    pub fn uploads(&self) -> Vec<(BufferHandle, usize, BufferUsage)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Upload {
                    buffer,
                    bytes,
                    usage,
                } => Some((*buffer, *bytes, *usage)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    /// Handles created and not yet released.
    pub fn live_handles(&self) -> usize {
        self.live_buffers.len()
            + self.live_textures.len()
            + self.live_programs.len()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_path(&self, path: &Path) -> Result<(), AssetError> {
        if self.failing_paths.contains(path) {
            return Err(AssetError::Decode {
                path: path.to_path_buf(),
                message: "configured to fail".to_owned(),
            });
        }
        Ok(())
    }
}

impl RenderBackend for RecordingGpu {
    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.calls.push(Call::Resize(width, height));
    }

    fn create_buffer(
        &mut self,
        _label: &str,
        kind: BufferKind,
    ) -> Option<BufferHandle> {
        let handle = BufferHandle(self.next());
        let _ = self.live_buffers.insert(handle);
        self.calls.push(Call::CreateBuffer(handle, kind));
        Some(handle)
    }

    fn upload_buffer(
        &mut self,
        buffer: BufferHandle,
        data: &[u8],
        usage: BufferUsage,
    ) {
        self.calls.push(Call::Upload {
            buffer,
            bytes: data.len(),
            usage,
        });
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        assert!(self.live_buffers.remove(&buffer), "double release");
        self.calls.push(Call::ReleaseBuffer(buffer));
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        assert!(self.live_textures.remove(&texture), "double release");
        self.calls.push(Call::ReleaseTexture(texture));
    }

    fn release_program(&mut self, program: ProgramHandle) {
        assert!(self.live_programs.remove(&program), "double release");
        self.calls.push(Call::ReleaseProgram(program));
    }

    fn begin_frame(&mut self, _clear_color: [f32; 4]) {
        self.calls.push(Call::BeginFrame);
    }

    fn bind_program(&mut self, program: ProgramHandle) {
        self.calls.push(Call::BindProgram(program));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.calls.push(Call::BindTexture(unit, texture));
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(Call::BindVertexBuffer(buffer));
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(Call::BindIndexBuffer(buffer));
    }

    fn set_uniforms(&mut self, uniforms: &DrawUniforms) {
        self.calls.push(Call::SetUniforms(*uniforms));
    }

    fn draw(&mut self, primitive: Primitive, count: u32) {
        self.calls.push(Call::Draw(primitive, count));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.calls.push(Call::DrawIndexed(index_count));
    }

    fn unbind_all(&mut self) {
        self.calls.push(Call::UnbindAll);
    }

    fn end_frame(&mut self) -> Result<(), FrameError> {
        self.calls.push(Call::EndFrame);
        Ok(())
    }
}

impl AssetLoader for RecordingGpu {
    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        self.calls.push(Call::LoadTexture(path.to_path_buf()));
        self.check_path(path)?;
        let handle = TextureHandle(self.next());
        let _ = self.live_textures.insert(handle);
        Ok(handle)
    }

    fn load_cube_map(
        &mut self,
        faces: &[PathBuf; 6],
    ) -> Result<TextureHandle, AssetError> {
        self.calls.push(Call::LoadCubeMap);
        for face in faces {
            self.check_path(face)?;
        }
        let handle = TextureHandle(self.next());
        let _ = self.live_textures.insert(handle);
        Ok(handle)
    }

    fn load_shader(
        &mut self,
        path: &Path,
        stage: ShaderStage,
    ) -> Result<ShaderSource, AssetError> {
        self.check_path(path)?;
        Ok(ShaderSource {
            stage,
            path: path.to_path_buf(),
            code: String::new(),
        })
    }

    fn compile_and_link(
        &mut self,
        kind: SubsystemKind,
        _vertex: &ShaderSource,
        _fragment: &ShaderSource,
    ) -> Result<ProgramHandle, AssetError> {
        self.calls.push(Call::Link(kind));
        if self.failing_links.contains(&kind) {
            return Err(AssetError::Link {
                kind,
                message: "configured to fail".to_owned(),
            });
        }
        let handle = ProgramHandle(self.next());
        let _ = self.programs.insert(handle, kind);
        let _ = self.live_programs.insert(handle);
        Ok(handle)
    }
}
