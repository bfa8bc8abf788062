//! Irradiance probe grid storage
//!
//! Probes sit on a regular lattice centred on the bake volume. Each probe
//! stores its SH coefficients packed into seven RGBA texels, one per layer of
//! an [`ShTextureSet`], laid out in raster order (x fastest, then y, then z)
//! so a layer uploads directly as a 3D texture.

use crate::capture::IndirectLighting;
use crate::sh::{PackedSh, ShCoefficients, PACKED_TEXEL_COUNT};
use glam::{Mat4, Quat, UVec3, Vec3};
use solace_core::{Result, SolaceError};

/// Largest probe count along one axis; the default 3D texture limit.
pub const MAX_GRID_DIMENSION: u32 = 2048;
/// Largest probe count of a whole grid.
pub const MAX_PROBE_COUNT: usize = 1 << 20;

/// Grid dimensions and the index <-> world mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    dims: UVec3,
    probe_count: usize,
    distance: f32,
    center: Vec3,
    grid_transform: Mat4,
    inverse_transform: Mat4,
}

impl GridLayout {
    /// `dims = floor(world_dims / distance)` probes, `distance` apart,
    /// centred on `center`.
    pub fn new(center: Vec3, world_dims: Vec3, distance: f32) -> Result<Self> {
        if !(distance > 0.0) || !distance.is_finite() {
            return Err(SolaceError::config(format!(
                "probe spacing must be a positive finite distance, got {}",
                distance
            )));
        }
        if !center.is_finite() || !world_dims.is_finite() {
            return Err(SolaceError::config("probe volume must be finite"));
        }

        let cells = (world_dims / distance).floor();
        if cells.min_element() < 1.0 {
            return Err(SolaceError::config(format!(
                "probe volume {} holds no probes at spacing {}",
                world_dims, distance
            )));
        }
        if cells.max_element() > MAX_GRID_DIMENSION as f32 {
            return Err(SolaceError::config(format!(
                "probe volume {} at spacing {} needs {} probes along one axis, limit is {}",
                world_dims,
                distance,
                cells.max_element(),
                MAX_GRID_DIMENSION
            )));
        }
        let dims = cells.as_uvec3();

        let probe_count = u64::from(dims.x) * u64::from(dims.y) * u64::from(dims.z);
        if probe_count > MAX_PROBE_COUNT as u64 {
            return Err(SolaceError::config(format!(
                "probe grid {} holds {} probes, limit is {}",
                dims, probe_count, MAX_PROBE_COUNT
            )));
        }
        let probe_count = probe_count as usize;

        let origin = center - (dims.as_vec3() - Vec3::ONE) * distance * 0.5;
        let grid_transform =
            Mat4::from_scale_rotation_translation(Vec3::splat(distance), Quat::IDENTITY, origin);

        Ok(Self {
            dims,
            probe_count,
            distance,
            center,
            grid_transform,
            inverse_transform: grid_transform.inverse(),
        })
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn probe_count(&self) -> usize {
        self.probe_count
    }

    /// Grid index -> world position.
    pub fn grid_transform(&self) -> Mat4 {
        self.grid_transform
    }

    /// World position -> fractional grid coordinate.
    pub fn inverse_transform(&self) -> Mat4 {
        self.inverse_transform
    }

    pub fn world_position(&self, index: UVec3) -> Vec3 {
        self.grid_transform.transform_point3(index.as_vec3())
    }

    pub fn grid_local(&self, world_position: Vec3) -> Vec3 {
        self.inverse_transform.transform_point3(world_position)
    }

    pub fn linear_index(&self, index: UVec3) -> usize {
        let (nx, ny) = (self.dims.x as usize, self.dims.y as usize);
        index.x as usize + nx * (index.y as usize + ny * index.z as usize)
    }

    /// Inverse of [`linear_index`](Self::linear_index).
    pub fn cell_index(&self, linear: usize) -> UVec3 {
        let (nx, ny) = (self.dims.x as usize, self.dims.y as usize);
        let x = linear % nx;
        let y = (linear / nx) % ny;
        let z = linear / (nx * ny);
        UVec3::new(x as u32, y as u32, z as u32)
    }
}

/// Seven RGBA layers holding the packed coefficients of every probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ShTextureSet {
    layers: [Vec<[f32; 4]>; PACKED_TEXEL_COUNT],
}

impl ShTextureSet {
    pub fn new(probe_count: usize) -> Self {
        Self {
            layers: std::array::from_fn(|_| vec![[0.0; 4]; probe_count]),
        }
    }

    pub fn probe_count(&self) -> usize {
        self.layers[0].len()
    }

    pub fn layer(&self, layer: usize) -> &[[f32; 4]] {
        &self.layers[layer]
    }

    pub fn write(&mut self, cell: usize, packed: &PackedSh) {
        for (layer, texel) in self.layers.iter_mut().zip(packed.iter()) {
            layer[cell] = *texel;
        }
    }

    pub fn read_packed(&self, cell: usize) -> PackedSh {
        std::array::from_fn(|layer| self.layers[layer][cell])
    }

    pub fn read(&self, cell: usize) -> ShCoefficients {
        ShCoefficients::unpack(&self.read_packed(cell))
    }
}

/// Front/back pair. The front slot is written during a bounce, the back slot
/// holds the previous bounce and is what readers see.
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    slots: [T; 2],
    front: usize,
}

impl<T> DoubleBuffer<T> {
    pub fn new(front: T, back: T) -> Self {
        Self {
            slots: [front, back],
            front: 0,
        }
    }

    pub fn front(&self) -> &T {
        &self.slots[self.front]
    }

    pub fn front_mut(&mut self) -> &mut T {
        &mut self.slots[self.front]
    }

    pub fn back(&self) -> &T {
        &self.slots[self.front ^ 1]
    }

    /// Makes the slot just written the read side for the next bounce.
    pub fn swap_after_bounce(&mut self) {
        self.front ^= 1;
    }
}

/// A probe lattice plus its double-buffered coefficients.
#[derive(Debug, Clone)]
pub struct ProbeGrid {
    layout: GridLayout,
    buffers: DoubleBuffer<ShTextureSet>,
}

impl ProbeGrid {
    pub fn new(layout: GridLayout) -> Self {
        let count = layout.probe_count();
        Self {
            layout,
            buffers: DoubleBuffer::new(ShTextureSet::new(count), ShTextureSet::new(count)),
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn dims(&self) -> UVec3 {
        self.layout.dims
    }

    pub fn probe_count(&self) -> usize {
        self.layout.probe_count()
    }

    pub fn inverse_transform(&self) -> Mat4 {
        self.layout.inverse_transform
    }

    /// Coefficients of the last completed bounce.
    pub fn textures(&self) -> &ShTextureSet {
        self.buffers.back()
    }

    pub fn coefficients(&self, index: UVec3) -> ShCoefficients {
        self.buffers.back().read(self.layout.linear_index(index))
    }

    pub fn indirect(&self) -> IndirectLighting<'_> {
        IndirectLighting::new(&self.layout, self.buffers.back())
    }

    pub fn sample_coefficients(&self, world_position: Vec3) -> ShCoefficients {
        sample_trilinear(&self.layout, self.buffers.back(), world_position)
    }

    /// Irradiance at `world_position` for a surface facing `normal`.
    pub fn sample_irradiance(&self, world_position: Vec3, normal: Vec3) -> Vec3 {
        self.sample_coefficients(world_position).irradiance(normal)
    }

    pub(crate) fn write_front(&mut self, cell: usize, packed: &PackedSh) {
        self.buffers.front_mut().write(cell, packed);
    }

    pub(crate) fn swap_after_bounce(&mut self) {
        self.buffers.swap_after_bounce();
    }
}

/// Trilinear blend of the packed texels around `world_position`, clamped to
/// the grid, as a 3D texture sampler would do it.
pub(crate) fn sample_trilinear(layout: &GridLayout, textures: &ShTextureSet, world_position: Vec3) -> ShCoefficients {
    let dims = layout.dims;
    let local = layout
        .grid_local(world_position)
        .clamp(Vec3::ZERO, (dims - UVec3::ONE).as_vec3());

    let axis = |t: f32, n: u32| {
        let i0 = (t.floor() as u32).min(n - 1);
        let i1 = (i0 + 1).min(n - 1);
        (i0, i1, t - i0 as f32)
    };
    let (x0, x1, fx) = axis(local.x, dims.x);
    let (y0, y1, fy) = axis(local.y, dims.y);
    let (z0, z1, fz) = axis(local.z, dims.z);

    let mut packed: PackedSh = [[0.0; 4]; PACKED_TEXEL_COUNT];
    for (z, wz) in [(z0, 1.0 - fz), (z1, fz)] {
        for (y, wy) in [(y0, 1.0 - fy), (y1, fy)] {
            for (x, wx) in [(x0, 1.0 - fx), (x1, fx)] {
                let weight = wx * wy * wz;
                if weight == 0.0 {
                    continue;
                }
                let texels = textures.read_packed(layout.linear_index(UVec3::new(x, y, z)));
                for (acc, texel) in packed.iter_mut().zip(texels.iter()) {
                    for (a, t) in acc.iter_mut().zip(texel.iter()) {
                        *a += t * weight;
                    }
                }
            }
        }
    }
    ShCoefficients::unpack(&packed)
}
