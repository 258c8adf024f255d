//! GPU resource management.
//!
//! The renderer talks to the graphics API only through the traits in
//! [`backend`]; [`wgpu_backend`] implements them with wgpu, and the
//! remaining modules are the wgpu plumbing it is built from.

/// Backend traits, opaque handles, and the shared uniform block.
pub mod backend;
/// Growable GPU buffers with automatic reallocation.
pub mod dynamic_buffer;
/// Shared wgpu boilerplate helpers for the subsystem pipelines.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Depth attachment and sampled 2D/cube textures.
pub mod texture;
/// wgpu implementation of [`backend::RenderBackend`] and
/// [`backend::AssetLoader`].
pub mod wgpu_backend;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    AssetError, AssetLoader, BufferHandle, BufferKind, BufferUsage,
    DrawUniforms, FrameError, Gpu, Primitive, ProgramHandle, RenderBackend,
    ShaderSource, ShaderStage, SubsystemKind, TextureHandle,
};
pub use wgpu_backend::WgpuBackend;
