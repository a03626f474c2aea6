//! Per-draw constants shared by every curve instance.
//!
//! Every instance is drawn from the same triangle list: `elements_per_instance`
//! triangles whose vertices are consecutive indices `(i, i+1, i+2)`. The
//! shader turns each vertex index into a position along the curve, so the
//! list is built once and never changes.

use bytemuck::{Pod, Zeroable};

use crate::config::{ConfigError, SwarmConfig};

/// Uniform block bound alongside the instance buffer.
///
/// Layout (16 bytes): `elements_per_instance: u32` followed by 12 bytes of
/// padding to a 16-byte uniform boundary.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct GlobalParams {
    /// Triangles tessellated per curve.
    pub elements_per_instance: u32,
    _pad: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<GlobalParams>() == 16);

impl GlobalParams {
    /// Uniforms for the given tessellation level.
    pub const fn new(elements_per_instance: u32) -> Self {
        Self {
            elements_per_instance,
            _pad: [0; 3],
        }
    }
}

/// Shared index list and uniforms for one instanced draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawGeometry {
    globals: GlobalParams,
    indices: Vec<u16>,
}

impl DrawGeometry {
    /// Build the triangle list for `elements_per_instance` triangles.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroElementsPerInstance`] for zero and
    /// [`ConfigError::TooManyElements`] when the largest index would not fit
    /// in a `u16`.
    pub fn new(elements_per_instance: u32) -> Result<Self, ConfigError> {
        if elements_per_instance == 0 {
            return Err(ConfigError::ZeroElementsPerInstance);
        }
        let max = SwarmConfig::MAX_ELEMENTS_PER_INSTANCE;
        let too_many = || ConfigError::TooManyElements {
            configured: elements_per_instance,
            max,
        };
        let triangles = u16::try_from(elements_per_instance)
            .ok()
            .filter(|&n| u32::from(n) <= max)
            .ok_or_else(too_many)?;

        let mut indices = Vec::with_capacity(usize::from(triangles) * 3);
        for i in 0..triangles {
            indices.extend_from_slice(&[i, i + 1, i + 2]);
        }

        Ok(Self {
            globals: GlobalParams::new(elements_per_instance),
            indices,
        })
    }

    /// Uniforms for this draw.
    pub fn globals(&self) -> GlobalParams {
        self.globals
    }

    /// The shared index list, `3 * elements_per_instance` entries.
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Number of indices drawn per instance.
    pub fn index_count(&self) -> u32 {
        self.globals.elements_per_instance * 3
    }

    /// Index list as raw bytes for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tessellation_matches_swarm_default() {
        let geometry = DrawGeometry::new(SwarmConfig::DEFAULT_ELEMENTS_PER_INSTANCE).unwrap();
        assert_eq!(geometry.indices().len(), 600);
        assert_eq!(geometry.index_count(), 600);
        assert_eq!(&geometry.indices()[..6], &[0, 1, 2, 1, 2, 3]);
        assert_eq!(&geometry.indices()[597..], &[199, 200, 201]);
        assert_eq!(geometry.index_bytes().len(), 1200);
    }

    #[test]
    fn every_triangle_is_three_consecutive_indices() {
        let geometry = DrawGeometry::new(17).unwrap();
        for (i, tri) in geometry.indices().chunks_exact(3).enumerate() {
            let i = i as u16;
            assert_eq!(tri, &[i, i + 1, i + 2]);
        }
    }

    #[test]
    fn single_triangle() {
        let geometry = DrawGeometry::new(1).unwrap();
        assert_eq!(geometry.indices(), &[0, 1, 2]);
    }

    #[test]
    fn largest_tessellation_fits_u16() {
        let max = SwarmConfig::MAX_ELEMENTS_PER_INSTANCE;
        let geometry = DrawGeometry::new(max).unwrap();
        assert_eq!(geometry.indices().last(), Some(&u16::MAX));
        assert!(matches!(
            DrawGeometry::new(max + 1),
            Err(ConfigError::TooManyElements { .. })
        ));
        assert!(matches!(
            DrawGeometry::new(1 << 20),
            Err(ConfigError::TooManyElements { .. })
        ));
    }

    #[test]
    fn zero_rejected() {
        assert_eq!(
            DrawGeometry::new(0),
            Err(ConfigError::ZeroElementsPerInstance)
        );
    }

    #[test]
    fn globals_are_sixteen_bytes() {
        let globals = GlobalParams::new(200);
        assert_eq!(bytemuck::bytes_of(&globals).len(), 16);
        assert_eq!(globals.elements_per_instance, 200);
    }
}
