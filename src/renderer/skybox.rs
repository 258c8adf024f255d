//! Cube-mapped skybox surrounding the scene.

use glam::Vec3;

use super::subsystem::{
    Geometry, SubsystemAssets, SubsystemResources, TextureSource,
};
use super::BoundDraw;
use crate::gpu::{DrawUniforms, RenderBackend, SubsystemKind};
use crate::options::Options;

// Quad faces as corner indices into the cube vertices.
const FACES: [[u16; 4]; 6] = [
    [0, 1, 2, 3],
    [3, 2, 6, 7],
    [7, 6, 5, 4],
    [4, 5, 1, 0],
    [0, 3, 7, 4],
    [1, 2, 6, 5],
];

/// Cube of half-extent `size` as 8 corners and 36 triangle indices.
#[must_use]
pub fn skybox_geometry(size: f32) -> Geometry {
    let s = size;
    let vertices = vec![
        Vec3::new(-s, s, s),
        Vec3::new(-s, -s, s),
        Vec3::new(s, -s, s),
        Vec3::new(s, s, s),
        Vec3::new(-s, s, -s),
        Vec3::new(-s, -s, -s),
        Vec3::new(s, -s, -s),
        Vec3::new(s, s, -s),
    ];
    let indices = FACES
        .iter()
        .flat_map(|&[a, b, c, d]| [a, b, c, a, c, d])
        .collect();
    Geometry {
        vertices,
        indices: Some(indices),
    }
}

/// Skybox resources: the cube and one cube-map texture on unit 0.
#[must_use]
pub fn resources(options: &Options) -> SubsystemResources {
    let assets = &options.assets;
    let shaders = assets.shaders(SubsystemKind::Skybox);
    SubsystemResources::new(
        SubsystemKind::Skybox,
        SubsystemAssets {
            vertex_shader: assets.resolve(&shaders.vertex),
            fragment_shader: assets.resolve(&shaders.fragment),
            textures: vec![TextureSource::CubeMap(assets.skybox_face_paths())],
        },
        Some(skybox_geometry(options.display.skybox_size)),
    )
}

pub(super) fn draw<G: RenderBackend + ?Sized>(
    gpu: &mut G,
    skybox: &SubsystemResources,
    uniforms: &DrawUniforms,
) {
    let (Some(program), Some(vertices), Some(indices)) = (
        skybox.program(),
        skybox.vertex_buffer(),
        skybox.index_buffer(),
    ) else {
        return;
    };
    let mut pass = BoundDraw::new(gpu, program, uniforms);
    pass.textures(skybox);
    pass.vertex_buffer(vertices);
    pass.index_buffer(indices);
    pass.draw_indexed(skybox.index_count());
}
