//! GPU copies of a baked probe grid
//!
//! Seven 3D `Rgba16Float` textures, one per packed SH texel, each sized to
//! the grid dimensions. Shaders sample them with a linear clamp sampler and
//! map world positions into texture space with [`ProbeGridUniforms`].

use crate::probe_grid::{GridLayout, ProbeGrid};
use crate::sh::PACKED_TEXEL_COUNT;
use bytemuck::{Pod, Zeroable};
use glam::UVec3;
use half::f16;
use solace_core::{Result, SolaceError};

pub const SH_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Bytes per `Rgba16Float` texel.
pub const SH_TEXEL_BYTES: u32 = 8;

const LAYER_LABELS: [&str; PACKED_TEXEL_COUNT] = [
    "SH Probe Layer 0",
    "SH Probe Layer 1",
    "SH Probe Layer 2",
    "SH Probe Layer 3",
    "SH Probe Layer 4",
    "SH Probe Layer 5",
    "SH Probe Layer 6",
];

/// Shader-side grid lookup data.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ProbeGridUniforms {
    /// World position -> grid coordinate (probe index space).
    pub world_to_grid: [[f32; 4]; 4],
    pub dims: [u32; 4],
}

impl ProbeGridUniforms {
    pub fn from_layout(layout: &GridLayout) -> Self {
        let dims = layout.dims();
        Self {
            world_to_grid: layout.inverse_transform().to_cols_array_2d(),
            dims: [dims.x, dims.y, dims.z, layout.probe_count() as u32],
        }
    }
}

pub struct ProbeGridTextures {
    dims: UVec3,
    textures: Vec<wgpu::Texture>,
    views: Vec<wgpu::TextureView>,
    sampler: wgpu::Sampler,
}

impl ProbeGridTextures {
    pub fn new(device: &wgpu::Device, layout: &GridLayout) -> Self {
        let dims = layout.dims();
        let size = grid_extent(dims);

        let textures: Vec<wgpu::Texture> = LAYER_LABELS
            .iter()
            .map(|label| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(*label),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D3,
                    format: SH_TEXTURE_FORMAT,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                })
            })
            .collect();

        let views = textures
            .iter()
            .map(|texture| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    dimension: Some(wgpu::TextureViewDimension::D3),
                    ..Default::default()
                })
            })
            .collect();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("SH Probe Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        log::debug!("Created SH probe textures {}x{}x{}", dims.x, dims.y, dims.z);

        Self {
            dims,
            textures,
            views,
            sampler,
        }
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Writes the grid's completed coefficients into the textures.
    pub fn upload(&self, queue: &wgpu::Queue, grid: &ProbeGrid) -> Result<()> {
        if grid.dims() != self.dims {
            return Err(SolaceError::GridMismatch(format!(
                "textures are {}, grid is {}",
                self.dims,
                grid.dims()
            )));
        }

        let coefficients = grid.textures();
        for (layer, texture) in self.textures.iter().enumerate() {
            let encoded = encode_layer(coefficients.layer(layer));
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(&encoded),
                texel_copy_layout(self.dims),
                grid_extent(self.dims),
            );
        }
        Ok(())
    }

    pub fn views(&self) -> &[wgpu::TextureView] {
        &self.views
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

/// Converts one layer of packed texels to half floats, four per texel.
pub fn encode_layer(texels: &[[f32; 4]]) -> Vec<f16> {
    texels
        .iter()
        .flat_map(|texel| texel.iter().map(|&v| f16::from_f32(v)))
        .collect()
}

pub fn texel_copy_layout(dims: UVec3) -> wgpu::ImageDataLayout {
    wgpu::ImageDataLayout {
        offset: 0,
        bytes_per_row: Some(dims.x * SH_TEXEL_BYTES),
        rows_per_image: Some(dims.y),
    }
}

fn grid_extent(dims: UVec3) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: dims.x,
        height: dims.y,
        depth_or_array_layers: dims.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn encode_layer_keeps_texel_order() {
        let encoded = encode_layer(&[[1.0, 2.0, 3.0, 4.0], [0.5, -0.25, 0.0, 8.0]]);
        let values: Vec<f32> = encoded.iter().map(|v| v.to_f32()).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 0.5, -0.25, 0.0, 8.0]);
        assert_eq!(bytemuck::cast_slice::<f16, u8>(&encoded).len(), 16);
    }

    #[test]
    fn copy_layout_matches_grid_rows() {
        let layout = texel_copy_layout(UVec3::new(5, 3, 2));
        assert_eq!(layout.bytes_per_row, Some(40));
        assert_eq!(layout.rows_per_image, Some(3));
    }

    #[test]
    fn uniforms_map_world_to_grid() {
        let layout = GridLayout::new(Vec3::ZERO, Vec3::splat(4.0), 1.0).unwrap();
        let uniforms = ProbeGridUniforms::from_layout(&layout);
        assert_eq!(uniforms.dims, [4, 4, 4, 64]);

        let m = glam::Mat4::from_cols_array_2d(&uniforms.world_to_grid);
        let corner = m.transform_point3(Vec3::splat(-1.5));
        assert!(corner.length() < 1e-5);
    }
}
