use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gpu::SubsystemKind;

/// Vertex and fragment shader files for one subsystem, relative to the
/// asset root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShaderPaths {
    /// Vertex stage source.
    pub vertex: String,
    /// Fragment stage source.
    pub fragment: String,
}

impl ShaderPaths {
    fn named(stem: &str) -> Self {
        Self {
            vertex: format!("shaders/{stem}.vert.wgsl"),
            fragment: format!("shaders/{stem}.frag.wgsl"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
/// Where textures and shaders are loaded from.
///
/// Every path except `root` is relative to `root`.
pub struct AssetOptions {
    /// Asset root directory.
    pub root: PathBuf,
    /// Ground diffuse color texture.
    pub ground_texture: String,
    /// Ground tangent-space normal map.
    pub ground_normal_map: String,
    /// Skybox faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub skybox_faces: [String; 6],
    /// Particle sprite texture.
    pub particle_texture: String,
    /// Ground program sources.
    pub ground_shaders: ShaderPaths,
    /// Skybox program sources.
    pub skybox_shaders: ShaderPaths,
    /// Particle program sources.
    pub particle_shaders: ShaderPaths,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            ground_texture: "textures/dirt.png".into(),
            ground_normal_map: "textures/dirt_n.png".into(),
            skybox_faces: ["xpos", "xneg", "ypos", "yneg", "zpos", "zneg"]
                .map(|face| format!("textures/skybox/{face}.png")),
            particle_texture: "textures/particle.png".into(),
            ground_shaders: ShaderPaths::named("ground"),
            skybox_shaders: ShaderPaths::named("skybox"),
            particle_shaders: ShaderPaths::named("particle"),
        }
    }
}

impl AssetOptions {
    /// Resolve a path relative to the asset root.
    #[must_use]
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Shader sources for a subsystem.
    #[must_use]
    pub fn shaders(&self, kind: SubsystemKind) -> &ShaderPaths {
        match kind {
            SubsystemKind::Ground => &self.ground_shaders,
            SubsystemKind::Skybox => &self.skybox_shaders,
            SubsystemKind::Particles => &self.particle_shaders,
        }
    }

    /// Resolved skybox face paths.
    #[must_use]
    pub fn skybox_face_paths(&self) -> [PathBuf; 6] {
        self.skybox_faces.clone().map(|face| self.resolve(face))
    }
}
