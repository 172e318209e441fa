/// Fast vector math using SIMD-accelerated `glam` types.
///
/// This module re-exports the [`glam`] crate, which the whole engine uses for
/// CPU-side calculations. The 2D geometry code works almost exclusively with
/// [`Vec2`].
///
/// [`glam`]: https://docs.rs/glam
pub mod fast {
    pub use glam::*;
}

/// Packed vector types for GPU buffer uploads.
///
/// These are `#[repr(C)]` [`Pod`] types with a guaranteed memory layout, so a
/// vertex buffer can be cast to bytes with [`bytemuck`] and handed to a
/// graphics API directly. Use the [`fast`] types for arithmetic and convert at
/// the upload boundary.
///
/// [`bytemuck`]: https://docs.rs/bytemuck
/// [`Pod`]: bytemuck::Pod
pub mod packed {
    use bytemuck::{Pod, Zeroable};

    /// A 2D vector with `#[repr(C)]` layout (8 bytes: x, y).
    #[repr(C)]
    #[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
    pub struct Vec2 {
        pub x: f32,
        pub y: f32,
    }

    impl From<glam::Vec2> for Vec2 {
        fn from(v: glam::Vec2) -> Self {
            Vec2 { x: v.x, y: v.y }
        }
    }

    impl From<Vec2> for glam::Vec2 {
        fn from(v: Vec2) -> Self {
            glam::Vec2::new(v.x, v.y)
        }
    }
}

pub use fast::*;
pub use packed::Vec2 as PackedVec2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_vec2_size() {
        assert_eq!(std::mem::size_of::<PackedVec2>(), 8);
    }

    #[test]
    fn test_packed_roundtrip() {
        let v = Vec2::new(3.0, -4.0);
        let p: PackedVec2 = v.into();
        let back: Vec2 = p.into();
        assert_eq!(v, back);
    }

    #[test]
    fn test_packed_cast_slice() {
        let verts = [
            PackedVec2 { x: 0.0, y: 0.0 },
            PackedVec2 { x: 1.0, y: 0.0 },
            PackedVec2 { x: 0.0, y: 1.0 },
        ];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 24);
    }
}
