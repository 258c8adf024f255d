//! GPU resource bundle shared by the ground, skybox, and particle
//! subsystems.
//!
//! Each handle is `None` until created and `None` again after release, so
//! readiness is a plain conjunction over the slots and teardown can never
//! free a handle twice.

use std::path::PathBuf;

use glam::Vec3;

use crate::gpu::{
    BufferHandle, BufferKind, BufferUsage, Gpu, ProgramHandle, RenderBackend,
    ShaderStage, SubsystemKind, TextureHandle,
};

/// Where one texture slot is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// A single 2D image.
    Image(PathBuf),
    /// Six cube faces, +X, -X, +Y, -Y, +Z, -Z.
    CubeMap([PathBuf; 6]),
}

/// Static geometry uploaded once at initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Triangle indices, if drawn indexed.
    pub indices: Option<Vec<u16>>,
}

/// Files a subsystem is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsystemAssets {
    /// Vertex shader source file.
    pub vertex_shader: PathBuf,
    /// Fragment shader source file.
    pub fragment_shader: PathBuf,
    /// One source per texture unit, in unit order.
    pub textures: Vec<TextureSource>,
}

/// Buffers, textures, and program for one subsystem.
#[derive(Debug)]
pub struct SubsystemResources {
    kind: SubsystemKind,
    assets: SubsystemAssets,
    geometry: Option<Geometry>,
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
    textures: Vec<Option<TextureHandle>>,
    program: Option<ProgramHandle>,
}

impl SubsystemResources {
    /// An uninitialized bundle. Without `geometry` the subsystem draws from
    /// a buffer owned elsewhere (the particle stream).
    #[must_use]
    pub fn new(
        kind: SubsystemKind,
        assets: SubsystemAssets,
        geometry: Option<Geometry>,
    ) -> Self {
        let textures = vec![None; assets.textures.len()];
        Self {
            kind,
            assets,
            geometry,
            vertex_buffer: None,
            index_buffer: None,
            textures,
            program: None,
        }
    }

    /// Which subsystem this is.
    #[must_use]
    pub fn kind(&self) -> SubsystemKind {
        self.kind
    }

    /// Create every handle that does not exist yet.
    ///
    /// Handles that already exist are left alone, so calling this again
    /// only retries what failed. A failed load is logged and leaves its slot
    /// empty; the other slots are still attempted.
    pub fn initialize<G: Gpu + ?Sized>(&mut self, gpu: &mut G) {
        let label = self.kind.label();

        if let Some(geometry) = &self.geometry {
            if self.vertex_buffer.is_none() {
                self.vertex_buffer = upload_static(
                    gpu,
                    &format!("{label} vertices"),
                    BufferKind::Vertex,
                    bytemuck::cast_slice(geometry.vertices.as_slice()),
                );
            }
            if let (Some(indices), None) = (&geometry.indices, self.index_buffer)
            {
                self.index_buffer = upload_static(
                    gpu,
                    &format!("{label} indices"),
                    BufferKind::Index,
                    bytemuck::cast_slice(indices.as_slice()),
                );
            }
        }

        for (slot, source) in self.textures.iter_mut().zip(&self.assets.textures) {
            if slot.is_some() {
                continue;
            }
            let loaded = match source {
                TextureSource::Image(path) => gpu.load_texture(path),
                TextureSource::CubeMap(faces) => gpu.load_cube_map(faces),
            };
            match loaded {
                Ok(handle) => *slot = Some(handle),
                Err(e) => log::warn!("{label}: {e}"),
            }
        }

        if self.program.is_none() {
            let linked = gpu
                .load_shader(&self.assets.vertex_shader, ShaderStage::Vertex)
                .and_then(|vs| {
                    let fs = gpu.load_shader(
                        &self.assets.fragment_shader,
                        ShaderStage::Fragment,
                    )?;
                    gpu.compile_and_link(self.kind, &vs, &fs)
                });
            match linked {
                Ok(program) => self.program = Some(program),
                Err(e) => log::warn!("{label}: {e}"),
            }
        }

        if self.is_ready() {
            log::info!("{label} ready");
        } else {
            log::warn!("{label} not ready; it will not be drawn");
        }
    }

    /// Whether every handle this subsystem draws with exists.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let geometry_ready = match &self.geometry {
            Some(geometry) => {
                self.vertex_buffer.is_some()
                    && (geometry.indices.is_none() || self.index_buffer.is_some())
            }
            None => true,
        };
        geometry_ready
            && self.program.is_some()
            && self.textures.iter().all(Option::is_some)
    }

    /// Release every created handle exactly once. Safe to call repeatedly
    /// and on a bundle that was never initialized.
    pub fn teardown<G: RenderBackend + ?Sized>(&mut self, gpu: &mut G) {
        if let Some(buffer) = self.vertex_buffer.take() {
            gpu.release_buffer(buffer);
        }
        if let Some(buffer) = self.index_buffer.take() {
            gpu.release_buffer(buffer);
        }
        for texture in self.textures.iter_mut().filter_map(Option::take) {
            gpu.release_texture(texture);
        }
        if let Some(program) = self.program.take() {
            gpu.release_program(program);
        }
    }

    /// Static vertex buffer, if created.
    #[must_use]
    pub fn vertex_buffer(&self) -> Option<BufferHandle> {
        self.vertex_buffer
    }

    /// Static index buffer, if created.
    #[must_use]
    pub fn index_buffer(&self) -> Option<BufferHandle> {
        self.index_buffer
    }

    /// Linked program, if created.
    #[must_use]
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    /// Texture bound at `unit`, if loaded.
    #[must_use]
    pub fn texture(&self, unit: usize) -> Option<TextureHandle> {
        self.textures.get(unit).copied().flatten()
    }

    /// Loaded textures with their unit numbers.
    pub fn bound_textures(&self) -> impl Iterator<Item = (u32, TextureHandle)> + '_ {
        (0u32..)
            .zip(&self.textures)
            .filter_map(|(unit, slot)| slot.map(|texture| (unit, texture)))
    }

    /// Vertex count of the static geometry.
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.geometry
            .as_ref()
            .map_or(0, |geometry| geometry.vertices.len() as u32)
    }

    /// Index count of the static geometry.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.geometry
            .as_ref()
            .and_then(|geometry| geometry.indices.as_ref())
            .map_or(0, |indices| indices.len() as u32)
    }
}

fn upload_static<G: RenderBackend + ?Sized>(
    gpu: &mut G,
    label: &str,
    kind: BufferKind,
    bytes: &[u8],
) -> Option<BufferHandle> {
    let Some(buffer) = gpu.create_buffer(label, kind) else {
        log::warn!("{label}: buffer creation failed");
        return None;
    };
    gpu.upload_buffer(buffer, bytes, BufferUsage::Static);
    Some(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::testing::{Call, RecordingGpu};

    fn assets() -> SubsystemAssets {
        SubsystemAssets {
            vertex_shader: "t.vert.wgsl".into(),
            fragment_shader: "t.frag.wgsl".into(),
            textures: vec![
                TextureSource::Image("a.png".into()),
                TextureSource::Image("b.png".into()),
            ],
        }
    }

    fn quad() -> Option<Geometry> {
        Some(Geometry {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: None,
        })
    }

    #[test]
    fn initialize_creates_everything() {
        let mut gpu = RecordingGpu::new();
        let mut res = SubsystemResources::new(SubsystemKind::Ground, assets(), quad());
        res.initialize(&mut gpu);
        assert!(res.is_ready());
        assert_eq!(gpu.uploads().len(), 1);
        assert_eq!(gpu.uploads()[0].1, 3 * 12);
        assert_eq!(gpu.uploads()[0].2, BufferUsage::Static);
    }

    #[test]
    fn failed_texture_leaves_slot_empty_and_retry_fills_it() {
        let mut gpu = RecordingGpu::new().fail_path("b.png");
        let mut res = SubsystemResources::new(SubsystemKind::Ground, assets(), quad());
        res.initialize(&mut gpu);
        assert!(!res.is_ready());
        assert!(res.texture(0).is_some());
        assert!(res.texture(1).is_none());
        assert!(res.program().is_some());

        gpu.heal();
        gpu.clear_calls();
        res.initialize(&mut gpu);
        assert!(res.is_ready());
        // Only the missing texture is loaded again.
        assert_eq!(gpu.calls, vec![Call::LoadTexture("b.png".into())]);
    }

    #[test]
    fn initialize_twice_creates_nothing_new() {
        let mut gpu = RecordingGpu::new();
        let mut res = SubsystemResources::new(SubsystemKind::Ground, assets(), quad());
        res.initialize(&mut gpu);
        let live = gpu.live_handles();
        gpu.clear_calls();
        res.initialize(&mut gpu);
        assert!(gpu.calls.is_empty());
        assert_eq!(gpu.live_handles(), live);
    }

    #[test]
    fn link_failure_leaves_program_empty() {
        let mut gpu = RecordingGpu::new().fail_link(SubsystemKind::Ground);
        let mut res = SubsystemResources::new(SubsystemKind::Ground, assets(), quad());
        res.initialize(&mut gpu);
        assert!(res.program().is_none());
        assert!(!res.is_ready());
    }

    #[test]
    fn teardown_releases_once() {
        let mut gpu = RecordingGpu::new();
        let mut res = SubsystemResources::new(SubsystemKind::Ground, assets(), quad());
        res.initialize(&mut gpu);
        assert_eq!(gpu.live_handles(), 4);
        res.teardown(&mut gpu);
        assert_eq!(gpu.live_handles(), 0);
        // A second teardown would trip the double-release assertion.
        res.teardown(&mut gpu);
        assert!(!res.is_ready());
    }

    #[test]
    fn teardown_without_initialize_is_noop() {
        let mut gpu = RecordingGpu::new();
        let mut res = SubsystemResources::new(SubsystemKind::Skybox, assets(), quad());
        res.teardown(&mut gpu);
        assert!(gpu.calls.is_empty());
    }
}
