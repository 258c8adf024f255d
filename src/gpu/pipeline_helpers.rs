//! Shared wgpu boilerplate for the three subsystem pipelines.

use super::backend::SubsystemKind;
use super::texture::DEPTH_FORMAT;

/// Fragment-visible, filterable float 2D texture binding.
pub fn texture_2d(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Fragment-visible, filterable cube texture binding.
pub fn texture_cube(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::Cube,
            multisampled: false,
        },
        count: None,
    }
}

/// Fragment-visible filtering sampler binding.
pub fn filtering_sampler(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Uniform buffer binding visible to both stages.
pub fn uniform_buffer(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Group 1 layout for a subsystem: sampler at binding 0, then one texture
/// per unit at binding `unit + 1`.
pub fn texture_layout_entries(
    kind: SubsystemKind,
) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = vec![filtering_sampler(0)];
    match kind {
        SubsystemKind::Ground => {
            entries.push(texture_2d(1));
            entries.push(texture_2d(2));
        }
        SubsystemKind::Skybox => entries.push(texture_cube(1)),
        SubsystemKind::Particles => entries.push(texture_2d(1)),
    }
    entries
}

/// Repeat + Linear sampler shared by every subsystem.
pub fn repeat_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Depth-stencil state; sprites test against depth but do not write it.
pub fn depth_stencil_state(kind: SubsystemKind) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: kind != SubsystemKind::Particles,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![0 => Float32x3];

/// Create the render pipeline for `kind` from separately compiled vertex
/// (`vs_main`) and fragment (`fs_main`) modules.
///
/// Every subsystem reads one tightly packed `vec3<f32>` position stream at
/// location 0; particles consume it per instance.
pub fn create_subsystem_pipeline(
    device: &wgpu::Device,
    kind: SubsystemKind,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::RenderPipeline {
    let label = kind.label();
    let pipeline_layout =
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} Pipeline Layout")),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

    let step_mode = match kind {
        SubsystemKind::Particles => wgpu::VertexStepMode::Instance,
        SubsystemKind::Ground | SubsystemKind::Skybox => {
            wgpu::VertexStepMode::Vertex
        }
    };
    let blend = match kind {
        SubsystemKind::Particles => Some(wgpu::BlendState::ALPHA_BLENDING),
        SubsystemKind::Ground | SubsystemKind::Skybox => {
            Some(wgpu::BlendState::REPLACE)
        }
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} Pipeline")),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: (3 * size_of::<f32>()) as wgpu::BufferAddress,
                step_mode,
                attributes: &POSITION_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil_state(kind)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
