//! Camera-facing sprites, one per particle position.

use super::particle_stream::ParticleStream;
use super::subsystem::{SubsystemAssets, SubsystemResources, TextureSource};
use super::BoundDraw;
use crate::gpu::{DrawUniforms, Primitive, RenderBackend, SubsystemKind};
use crate::options::Options;

/// Particle resources: program and sprite texture. Positions come from the
/// [`ParticleStream`] buffer, so there is no static geometry.
#[must_use]
pub fn resources(options: &Options) -> SubsystemResources {
    let assets = &options.assets;
    let shaders = assets.shaders(SubsystemKind::Particles);
    SubsystemResources::new(
        SubsystemKind::Particles,
        SubsystemAssets {
            vertex_shader: assets.resolve(&shaders.vertex),
            fragment_shader: assets.resolve(&shaders.fragment),
            textures: vec![TextureSource::Image(
                assets.resolve(&assets.particle_texture),
            )],
        },
        None,
    )
}

pub(super) fn draw<G: RenderBackend + ?Sized>(
    gpu: &mut G,
    particles: &SubsystemResources,
    stream: &ParticleStream,
    uniforms: &DrawUniforms,
) {
    let (Some(program), Some(positions)) = (particles.program(), stream.buffer())
    else {
        return;
    };
    if stream.count() == 0 {
        return;
    }
    let mut pass = BoundDraw::new(gpu, program, uniforms);
    pass.textures(particles);
    pass.vertex_buffer(positions);
    pass.draw(Primitive::Sprites, stream.count());
}
