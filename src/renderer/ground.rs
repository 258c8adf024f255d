//! Textured ground plane at z = 0.

use glam::Vec3;

use super::subsystem::{
    Geometry, SubsystemAssets, SubsystemResources, TextureSource,
};
use super::BoundDraw;
use crate::gpu::{DrawUniforms, Primitive, RenderBackend, SubsystemKind};
use crate::options::Options;

/// Two triangles covering `[-size, size]²` on the z = 0 plane.
#[must_use]
pub fn ground_geometry(size: f32) -> Geometry {
    let corners = [
        Vec3::new(-size, -size, 0.0),
        Vec3::new(size, -size, 0.0),
        Vec3::new(size, size, 0.0),
        Vec3::new(-size, size, 0.0),
    ];
    Geometry {
        vertices: [0, 1, 2, 0, 2, 3].map(|i| corners[i]).to_vec(),
        indices: None,
    }
}

/// Ground resources: the quad, diffuse texture on unit 0 and normal map on
/// unit 1.
#[must_use]
pub fn resources(options: &Options) -> SubsystemResources {
    let assets = &options.assets;
    let shaders = assets.shaders(SubsystemKind::Ground);
    SubsystemResources::new(
        SubsystemKind::Ground,
        SubsystemAssets {
            vertex_shader: assets.resolve(&shaders.vertex),
            fragment_shader: assets.resolve(&shaders.fragment),
            textures: vec![
                TextureSource::Image(assets.resolve(&assets.ground_texture)),
                TextureSource::Image(assets.resolve(&assets.ground_normal_map)),
            ],
        },
        Some(ground_geometry(options.display.skybox_size)),
    )
}

pub(super) fn draw<G: RenderBackend + ?Sized>(
    gpu: &mut G,
    ground: &SubsystemResources,
    uniforms: &DrawUniforms,
) {
    let (Some(program), Some(vertices)) =
        (ground.program(), ground.vertex_buffer())
    else {
        return;
    };
    let mut pass = BoundDraw::new(gpu, program, uniforms);
    pass.textures(ground);
    pass.vertex_buffer(vertices);
    pass.draw(Primitive::Triangles, ground.vertex_count());
}
