//! Vertex formats for handing meshes to a GPU.
//!
//! The geometry types themselves stay in `glam` vectors; these `#[repr(C)]`
//! [`Pod`](bytemuck::Pod) formats exist for the upload boundary, where a
//! vertex buffer must be cast to bytes with a guaranteed layout.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::polygon::Polygon;

/// Vertex for filled geometry: a bare 2D position.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FillVertex {
    /// Position in 2D space.
    pub position: [f32; 2],
}

impl FillVertex {
    /// Create a new fill vertex.
    pub fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }
}

/// Vertex for extruded strokes.
///
/// Pairs the position with the extruder's side annotation: `side[0]` is the
/// left/right mark (−1 to +1), `side[1]` the head/tail cap progress. Stroke
/// shaders use these for dashes, gradients and animated cap effects.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct StrokeVertex {
    /// Position in 2D space.
    pub position: [f32; 2],
    /// Side and cap marks from the extrusion.
    pub side: [f32; 2],
}

impl StrokeVertex {
    /// Create a new stroke vertex.
    pub fn new(x: f32, y: f32, side: f32, cap: f32) -> Self {
        Self {
            position: [x, y],
            side: [side, cap],
        }
    }
}

/// Pack a polygon's vertices into fill-vertex form.
///
/// The index buffer is already GPU-ready (`u16`, three per triangle); pair
/// it with this buffer for an indexed draw.
pub fn fill_vertices(poly: &Polygon) -> Vec<FillVertex> {
    poly.vertices
        .iter()
        .map(|v| FillVertex::new(v.x, v.y))
        .collect()
}

/// Pack a stroke polygon and its side annotations into stroke-vertex form.
///
/// The annotation slice comes from
/// [`PathExtruder::sides`](crate::PathExtruder::sides) and is parallel to
/// the polygon's vertex buffer; missing entries pack as zero marks.
pub fn stroke_vertices(poly: &Polygon, sides: &[Vec2]) -> Vec<StrokeVertex> {
    poly.vertices
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let side = sides.get(i).copied().unwrap_or(Vec2::ZERO);
            StrokeVertex::new(v.x, v.y, side.x, side.y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyform_core::geometry::Rect;

    #[test]
    fn test_vertex_sizes() {
        assert_eq!(std::mem::size_of::<FillVertex>(), 8);
        assert_eq!(std::mem::size_of::<StrokeVertex>(), 16);
    }

    #[test]
    fn test_fill_pack() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 2.0, 1.0));
        let verts = fill_vertices(&poly);
        assert_eq!(verts.len(), 4);
        assert_eq!(verts[2].position, [2.0, 1.0]);
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn test_stroke_pack() {
        let poly = Polygon::from_rect(Rect::new(0.0, 0.0, 2.0, 1.0));
        let sides = vec![Vec2::new(-1.0, 0.0); 4];
        let verts = stroke_vertices(&poly, &sides);
        assert!(verts.iter().all(|v| v.side == [-1.0, 0.0]));
        // Short annotation buffers pack as zero.
        let verts = stroke_vertices(&poly, &sides[..2]);
        assert_eq!(verts[3].side, [0.0, 0.0]);
    }
}
