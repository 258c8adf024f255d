//! The seam between the renderer and the graphics API.
//!
//! [`RenderBackend`] covers buffer uploads and the per-frame bind/draw
//! sequence, [`AssetLoader`] turns files on disk into GPU textures and
//! linked programs. Every handle crossing this seam is an opaque id owned
//! by the backend; the renderer only ever holds `Option<Handle>` and
//! releases what it created exactly once.

use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque GPU buffer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u32);

/// Opaque GPU texture handle (2D or cube map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u32);

/// Opaque linked shader program handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub(crate) u32);

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Per-vertex (or per-instance) attribute data.
    Vertex,
    /// `u16` triangle indices.
    Index,
}

/// Upload frequency hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once at initialization.
    Static,
    /// Re-uploaded every frame.
    Stream,
}

/// How a draw call's vertex count is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// `count` vertices forming a triangle list.
    Triangles,
    /// `count` camera-facing sprites, one per position in the bound
    /// vertex buffer.
    Sprites,
}

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage, entry point `vs_main`.
    Vertex,
    /// Fragment stage, entry point `fs_main`.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// The three drawable subsystems. Each links against its own pipeline
/// layout (vertex format, texture slots, blending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsystemKind {
    /// Textured, normal-mapped ground plane.
    Ground,
    /// Cube-mapped environment box.
    Skybox,
    /// Textured point sprites.
    Particles,
}

impl SubsystemKind {
    /// Lowercase name used in labels and log lines.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Skybox => "skybox",
            Self::Particles => "particles",
        }
    }

    /// Number of texture units the subsystem's program samples.
    #[must_use]
    pub fn texture_units(self) -> u32 {
        match self {
            Self::Ground => 2,
            Self::Skybox | Self::Particles => 1,
        }
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shader source read from disk, not yet compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    /// Stage this source is compiled for.
    pub stage: ShaderStage,
    /// File the source came from (for diagnostics).
    pub path: PathBuf,
    /// WGSL text.
    pub code: String,
}

impl ShaderSource {
    /// Read a shader file.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Io`] if the file cannot be read.
    pub fn read(path: &Path, stage: ShaderStage) -> Result<Self, AssetError> {
        let code =
            std::fs::read_to_string(path).map_err(|source| AssetError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            stage,
            path: path.to_path_buf(),
            code,
        })
    }
}

/// Per-draw uniform block shared by all three programs.
///
/// Layout matches the WGSL `DrawUniforms` struct: a `vec3` followed by an
/// `f32` packs into one 16-byte row.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct DrawUniforms {
    /// Combined projection * view matrix, column-major.
    pub view_proj: [[f32; 4]; 4],
    /// Eye position in world space.
    pub camera_position: [f32; 3],
    /// Ambient light floor.
    pub ambient: f32,
    /// Point light position in world space.
    pub light_position: [f32; 3],
    /// Particle sprite edge length in world units.
    pub sprite_size: f32,
}

/// Errors loading or linking GPU assets.
#[derive(Debug)]
pub enum AssetError {
    /// A file could not be read.
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// An image could not be decoded.
    Decode {
        /// Offending file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },
    /// WGSL failed to parse or validate.
    Shader {
        /// Offending file.
        path: PathBuf,
        /// Front-end diagnostic.
        message: String,
    },
    /// Vertex and fragment stages failed to link into a pipeline.
    Link {
        /// Subsystem whose program failed.
        kind: SubsystemKind,
        /// Validation message.
        message: String,
    },
    /// Cube-map faces are missing, non-square, or differently sized.
    InvalidCubeMap(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::Decode { path, message } => {
                write!(f, "cannot decode {}: {message}", path.display())
            }
            Self::Shader { path, message } => {
                write!(f, "shader {} rejected: {message}", path.display())
            }
            Self::Link { kind, message } => {
                write!(f, "{kind} program failed to link: {message}")
            }
            Self::InvalidCubeMap(msg) => write!(f, "invalid cube map: {msg}"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors presenting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The surface must be reconfigured (resize and retry next frame).
    Lost,
    /// The GPU ran out of memory; the viewer should exit.
    OutOfMemory,
    /// Acquiring the next image timed out; skip this frame.
    Timeout,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lost => f.write_str("surface lost or outdated"),
            Self::OutOfMemory => f.write_str("out of GPU memory"),
            Self::Timeout => f.write_str("timed out acquiring frame"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Buffer management and the per-frame bind/draw sequence.
///
/// Binding state set between [`bind_program`](Self::bind_program) and
/// [`unbind_all`](Self::unbind_all) applies to every draw issued in that
/// window; `unbind_all` resets it so nothing leaks into the next
/// subsystem.
pub trait RenderBackend {
    /// Drawable size in physical pixels.
    fn viewport_size(&self) -> (u32, u32);

    /// Reconfigure for a new drawable size.
    fn resize(&mut self, width: u32, height: u32);

    /// Allocate an empty buffer. `None` means the backend refused.
    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
    ) -> Option<BufferHandle>;

    /// Replace a buffer's contents.
    fn upload_buffer(
        &mut self,
        buffer: BufferHandle,
        data: &[u8],
        usage: BufferUsage,
    );

    /// Free a buffer.
    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Free a texture.
    fn release_texture(&mut self, texture: TextureHandle);

    /// Free a program.
    fn release_program(&mut self, program: ProgramHandle);

    /// Start a frame, clearing color and depth.
    fn begin_frame(&mut self, clear_color: [f32; 4]);

    /// Make `program` current.
    fn bind_program(&mut self, program: ProgramHandle);

    /// Attach `texture` to sampler slot `unit` of the current program.
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Attach the vertex (or instance) buffer.
    fn bind_vertex_buffer(&mut self, buffer: BufferHandle);

    /// Attach the index buffer.
    fn bind_index_buffer(&mut self, buffer: BufferHandle);

    /// Set the uniform block for subsequent draws.
    fn set_uniforms(&mut self, uniforms: &DrawUniforms);

    /// Non-indexed draw.
    fn draw(&mut self, primitive: Primitive, count: u32);

    /// Indexed triangle draw using the bound index buffer.
    fn draw_indexed(&mut self, index_count: u32);

    /// Reset program, textures, and buffers to unbound.
    fn unbind_all(&mut self);

    /// Submit the frame's draws and present.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] if the next surface image cannot be acquired.
    fn end_frame(&mut self) -> Result<(), FrameError>;
}

/// File-backed asset creation.
pub trait AssetLoader {
    /// Decode an image file into a 2D RGBA texture.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError`] if the file is unreadable or undecodable.
    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError>;

    /// Decode six square, equally sized images into a cube map.
    ///
    /// Faces are ordered +X, -X, +Y, -Y, +Z, -Z.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError`] if any face fails; no partial cube map is
    /// created.
    fn load_cube_map(
        &mut self,
        faces: &[PathBuf; 6],
    ) -> Result<TextureHandle, AssetError>;

    /// Read shader source for one stage.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Io`] if the file cannot be read.
    fn load_shader(
        &mut self,
        path: &Path,
        stage: ShaderStage,
    ) -> Result<ShaderSource, AssetError> {
        ShaderSource::read(path, stage)
    }

    /// Compile both stages and link them into a program for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Shader`] for compile failures and
    /// [`AssetError::Link`] when the stages do not form a valid pipeline.
    fn compile_and_link(
        &mut self,
        kind: SubsystemKind,
        vertex: &ShaderSource,
        fragment: &ShaderSource,
    ) -> Result<ProgramHandle, AssetError>;
}

/// Everything the renderer needs from a graphics backend.
pub trait Gpu: RenderBackend + AssetLoader {}

impl<T: RenderBackend + AssetLoader + ?Sized> Gpu for T {}
