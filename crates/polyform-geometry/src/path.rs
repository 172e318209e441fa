//! A flattened polyline.
//!
//! A path is a continuous, piecewise-linear curve. It may be open or closed,
//! but it has no gaps; a figure with gaps should be several paths. Paths have
//! no interior fill of their own. To draw one with width, extrude it into a
//! [`Polygon`](crate::Polygon) with [`PathExtruder`](crate::PathExtruder).

use glam::Vec2;
use polyform_core::alloc::HashSet;
use polyform_core::geometry::Rect;

use crate::error::{GeometryError, GeometryResult};

/// Epsilon for the colinearity dead zone in orientation tests.
const COLINEAR_EPSILON: f32 = 5.0e-4;

/// An ordered sequence of 2D points, possibly closed.
///
/// When the path is closed, the last vertex implicitly connects back to the
/// first. Vertices flagged as corners get a joint style when the path is
/// extruded; points that are not corners extrude smoothly (typically because
/// they came from a bezier expansion). Corners carry no other meaning.
///
/// The fields are public on purpose: a path is a data bag, and the factories
/// and extruder build them up in place. Copying a path deep-copies both the
/// vertex and corner data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    /// The vertices of this path.
    pub vertices: Vec<Vec2>,
    /// Indices of the vertices that are corner points.
    pub corners: HashSet<usize>,
    /// Whether the last vertex connects back to the first.
    pub closed: bool,
}

impl Path {
    /// Create a new empty, open path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an open path from the given vertices, none marked as corners.
    ///
    /// Fails with [`GeometryError::TooFewVertices`] when fewer than two
    /// vertices are supplied; a shorter path is degenerate.
    pub fn from_vertices(vertices: Vec<Vec2>) -> GeometryResult<Self> {
        if vertices.len() < 2 {
            return Err(GeometryError::TooFewVertices {
                count: vertices.len(),
                required: 2,
            });
        }
        Ok(Path {
            vertices,
            corners: HashSet::new(),
            closed: false,
        })
    }

    /// Create a closed path tracing the given rectangle.
    ///
    /// The path has four vertices in counter-clockwise order starting at the
    /// rectangle origin, all flagged as corners.
    pub fn from_rect(rect: Rect<f32>) -> Self {
        let mut corners = HashSet::new();
        corners.extend([0usize, 1, 2, 3]);
        Path {
            vertices: rect
                .corners()
                .iter()
                .map(|&(x, y)| Vec2::new(x, y))
                .collect(),
            corners,
            closed: true,
        }
    }

    /// The number of vertices in this path.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the path has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Remove all vertices and corner flags; the path becomes open.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.corners.clear();
        self.closed = false;
    }

    /// Reserve space for `additional` future vertices.
    pub fn reserve(&mut self, additional: usize) {
        self.vertices.reserve(additional);
    }

    /// Get the vertex at the given index.
    pub fn get(&self, index: usize) -> Option<Vec2> {
        self.vertices.get(index).copied()
    }

    /// Check if the vertex at the given index is a corner.
    pub fn is_corner(&self, index: usize) -> bool {
        self.corners.contains(&index)
    }

    /// Append a point to the end of the path.
    pub fn push(&mut self, point: Vec2, corner: bool) {
        self.vertices.push(point);
        if corner {
            self.corners.insert(self.vertices.len() - 1);
        }
    }

    /// Remove and return the last point of the path.
    pub fn pop(&mut self) -> Option<Vec2> {
        let point = self.vertices.pop()?;
        self.corners.remove(&self.vertices.len());
        Some(point)
    }

    /// Insert a point at the given index.
    ///
    /// An index past the end appends. Corner flags at or after the index
    /// shift up to stay with their vertices.
    pub fn insert(&mut self, index: usize, point: Vec2, corner: bool) {
        let index = index.min(self.vertices.len());
        self.corners = self
            .corners
            .iter()
            .map(|&c| if c >= index { c + 1 } else { c })
            .collect();
        self.vertices.insert(index, point);
        if corner {
            self.corners.insert(index);
        }
    }

    /// Remove and return the point at the given index.
    ///
    /// Corner flags after the index shift down to stay with their vertices.
    /// Fails with [`GeometryError::IndexOutOfBounds`] for a bad index.
    pub fn remove(&mut self, index: usize) -> GeometryResult<Vec2> {
        if index >= self.vertices.len() {
            return Err(GeometryError::IndexOutOfBounds {
                index,
                len: self.vertices.len(),
            });
        }
        let point = self.vertices.remove(index);
        self.corners.remove(&index);
        self.corners = self
            .corners
            .iter()
            .map(|&c| if c > index { c - 1 } else { c })
            .collect();
        Ok(point)
    }

    /// Return the open sub-path covering indices `start..end`.
    ///
    /// The slice includes the vertices referenced by those indices and only
    /// those vertices, with their corner flags re-based. Fails when
    /// `start > end` or `end` exceeds the vertex count.
    pub fn slice(&self, start: usize, end: usize) -> GeometryResult<Path> {
        if start > end {
            return Err(GeometryError::InvalidRange { start, end });
        }
        if end > self.vertices.len() {
            return Err(GeometryError::IndexOutOfBounds {
                index: end,
                len: self.vertices.len(),
            });
        }
        let mut corners = HashSet::new();
        for i in start..end {
            if self.is_corner(i) {
                corners.insert(i - start);
            }
        }
        Ok(Path {
            vertices: self.vertices[start..end].to_vec(),
            corners,
            closed: false,
        })
    }

    /// The open sub-path from `start` to the end of this path.
    pub fn slice_from(&self, start: usize) -> GeometryResult<Path> {
        self.slice(start, self.vertices.len())
    }

    /// The open sub-path from the beginning up to (not including) `end`.
    pub fn slice_to(&self, end: usize) -> GeometryResult<Path> {
        self.slice(0, end)
    }

    /// Reverse the vertex order of this path in place.
    ///
    /// Corner indices are remapped so the same points remain corners.
    pub fn reverse(&mut self) {
        self.vertices.reverse();
        let len = self.vertices.len();
        self.corners = self.corners.iter().map(|&c| len - c - 1).collect();
    }

    /// Return a copy of this path with the reverse orientation.
    ///
    /// The original is left unmodified.
    pub fn reversed(&self) -> Path {
        let mut copy = self.clone();
        copy.reverse();
        copy
    }

    /// Append another path's vertices to the end of this one.
    ///
    /// The result is open regardless of whether either input was closed.
    /// Corner flags from `other` are carried over at their new indices.
    pub fn append(&mut self, other: &Path) {
        let offset = self.vertices.len();
        self.closed = false;
        self.vertices.extend_from_slice(&other.vertices);
        for &c in &other.corners {
            self.corners.insert(c + offset);
        }
    }

    /// Check if the interior of this path contains the given point.
    ///
    /// Open paths contain nothing. Containment uses the even-odd crossing
    /// rule and is not strict: boundary points are inside.
    pub fn contains(&self, point: Vec2) -> bool {
        if !self.closed || self.vertices.len() < 3 {
            return false;
        }
        let mut crossings = 0;
        let n = self.vertices.len();
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            if ((a.y <= point.y && point.y < b.y) || (b.y <= point.y && point.y < a.y))
                && point.x < (b.x - a.x) / (b.y - a.y) * (point.y - a.y) + a.x
            {
                crossings += 1;
            }
        }
        crossings % 2 == 1
    }

    /// Check if the given point lies on the path, within a distance tolerance.
    pub fn incident(&self, point: Vec2, tolerance: f32) -> bool {
        if self.vertices.len() < 2 {
            return false;
        }
        let segments = if self.closed {
            self.vertices.len()
        } else {
            self.vertices.len() - 1
        };
        let n = self.vertices.len();
        (0..segments).any(|i| {
            on_segment(point, self.vertices[i], self.vertices[(i + 1) % n], tolerance)
        })
    }

    /// The number of left turns in this path.
    ///
    /// Turns are judged at each interior angle assuming the path is meant to
    /// run counter-clockwise. For an open path the two end vertices have no
    /// turn. This generalizes [`is_convex`](Self::is_convex): it measures how
    /// non-convex a path is.
    pub fn left_turns(&self) -> usize {
        let n = self.vertices.len();
        if n <= 2 {
            return 0;
        }
        let mut count = 0;
        if self.closed {
            for i in 0..n {
                let p0 = self.vertices[(i + n - 1) % n];
                let p1 = self.vertices[i];
                let p2 = self.vertices[(i + 1) % n];
                if turn_cross(p0, p1, p2) < 0.0 {
                    count += 1;
                }
            }
        } else {
            for i in 1..n - 1 {
                let p0 = self.vertices[i - 1];
                let p1 = self.vertices[i];
                let p2 = self.vertices[i + 1];
                if turn_cross(p0, p1, p2) < 0.0 {
                    count += 1;
                }
            }
        }
        count
    }

    /// Check if this path describes a convex shape.
    ///
    /// Open paths are never convex. A closed path is convex when every
    /// interior turn shares the same winding.
    pub fn is_convex(&self) -> bool {
        self.closed && self.vertices.len() > 2 && self.left_turns() == self.vertices.len()
    }

    /// The signed area enclosed by this path.
    ///
    /// The area is the sum of oriented triangles in a fan from the first
    /// vertex. Counter-clockwise paths have positive area; a negative area
    /// means the path is effectively a hole (clockwise).
    pub fn area(&self) -> f32 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        let a = self.vertices[0];
        let mut area = 0.0;
        for i in 2..self.vertices.len() {
            let ab = self.vertices[i - 1] - a;
            let ac = self.vertices[i] - a;
            area += ab.perp_dot(ac);
        }
        area * 0.5
    }

    /// The winding of this path: −1 counter-clockwise, 1 clockwise, 0 if
    /// undefined (all points colinear).
    ///
    /// Evaluated at a convex-hull point, so it is stable for non-convex
    /// paths.
    pub fn orientation(&self) -> i32 {
        if self.vertices.is_empty() {
            return 0;
        }
        let n = self.vertices.len();
        let idx = self.hull_point();
        let prev = if idx == 0 { n - 1 } else { idx - 1 };
        let next = if idx == n - 1 { 0 } else { idx + 1 };
        Self::orientation_of(self.vertices[prev], self.vertices[idx], self.vertices[next])
    }

    /// The orientation of the turn `a -> b -> c`: −1 counter-clockwise,
    /// 1 clockwise, 0 colinear (within an epsilon dead zone).
    pub fn orientation_of(a: Vec2, b: Vec2, c: Vec2) -> i32 {
        let val = (b.y - a.y) * (c.x - a.x) - (b.x - a.x) * (c.y - a.y);
        if val.abs() < COLINEAR_EPSILON {
            0
        } else if val > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Scale every vertex from the origin of the coordinate space.
    ///
    /// If the origin is not on the path, this effectively translates the
    /// path as well.
    pub fn scale(&mut self, factor: Vec2) -> &mut Self {
        for v in &mut self.vertices {
            *v *= factor;
        }
        self
    }

    /// Scale every vertex by the inverse of the given factor.
    ///
    /// Fails with [`GeometryError::ZeroScale`] when either component is zero.
    pub fn inv_scale(&mut self, factor: Vec2) -> GeometryResult<&mut Self> {
        if factor.x == 0.0 || factor.y == 0.0 {
            return Err(GeometryError::ZeroScale);
        }
        Ok(self.scale(factor.recip()))
    }

    /// Translate every vertex by the given offset.
    pub fn translate(&mut self, offset: Vec2) -> &mut Self {
        for v in &mut self.vertices {
            *v += offset;
        }
        self
    }

    /// The bounding box of this path as `(min, max)` corners.
    ///
    /// Recomputed on each call; `None` for an empty path.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for &v in &self.vertices[1..] {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    /// Index pairs for rendering this path as a line mesh.
    ///
    /// Each consecutive vertex pair contributes one line segment; a closed
    /// path adds the wrapping segment.
    pub fn wire_indices(&self) -> Vec<u16> {
        let n = self.vertices.len();
        if n < 2 {
            return Vec::new();
        }
        let mut indices = Vec::with_capacity(2 * n);
        for i in 0..n - 1 {
            indices.push(i as u16);
            indices.push((i + 1) as u16);
        }
        if self.closed {
            indices.push((n - 1) as u16);
            indices.push(0);
        }
        indices
    }

    /// An index of a point on the convex hull, typically the one with the
    /// least x (then least y).
    fn hull_point(&self) -> usize {
        let mut pos = 0;
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let best = self.vertices[pos];
            if v.x < best.x || (v.x == best.x && v.y < best.y) {
                pos = i;
            }
        }
        pos
    }
}

/// The turn cross product at `p1`, negative for a left (counter-clockwise)
/// turn.
fn turn_cross(p0: Vec2, p1: Vec2, p2: Vec2) -> f32 {
    (p2.x - p1.x) * (p1.y - p0.y) - (p1.x - p0.x) * (p2.y - p1.y)
}

/// Check if `point` is incident to the segment `a`-`b` within `variance`.
fn on_segment(point: Vec2, a: Vec2, b: Vec2, variance: f32) -> bool {
    let d1 = point.distance(a);
    let d2 = point.distance(b);
    let d3 = a.distance(b);
    (d3 - d2 - d1).abs() <= variance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Path {
        Path::from_rect(Rect::new(0.0, 0.0, 1.0, 1.0))
    }

    #[test]
    fn test_from_vertices_requires_two_points() {
        assert!(Path::from_vertices(vec![Vec2::ZERO]).is_err());
        assert!(Path::from_vertices(vec![Vec2::ZERO, Vec2::ONE]).is_ok());
    }

    #[test]
    fn test_rect_path() {
        let path = unit_square();
        assert!(path.closed);
        assert_eq!(path.len(), 4);
        assert!((0..4).all(|i| path.is_corner(i)));
    }

    #[test]
    fn test_push_pop() {
        let mut path = Path::new();
        path.push(Vec2::new(1.0, 2.0), true);
        path.push(Vec2::new(3.0, 4.0), false);
        assert!(path.is_corner(0));
        assert!(!path.is_corner(1));
        assert_eq!(path.pop(), Some(Vec2::new(3.0, 4.0)));
        assert_eq!(path.pop(), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(path.pop(), None);
        assert!(path.corners.is_empty());
    }

    #[test]
    fn test_insert_remove_shift_corners() {
        let mut path = unit_square();
        path.insert(1, Vec2::new(0.5, -0.5), false);
        assert_eq!(path.len(), 5);
        // The old corners 1, 2, 3 moved to 2, 3, 4.
        assert!(path.is_corner(0));
        assert!(!path.is_corner(1));
        assert!(path.is_corner(2));
        assert!(path.is_corner(4));

        let removed = path.remove(1).unwrap();
        assert_eq!(removed, Vec2::new(0.5, -0.5));
        assert_eq!(path, unit_square());
    }

    #[test]
    fn test_remove_out_of_bounds() {
        let mut path = unit_square();
        assert_eq!(
            path.remove(9),
            Err(GeometryError::IndexOutOfBounds { index: 9, len: 4 })
        );
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_slice() {
        let path = unit_square();
        let sub = path.slice(1, 3).unwrap();
        assert!(!sub.closed);
        assert_eq!(sub.vertices, vec![Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)]);
        assert!(sub.is_corner(0) && sub.is_corner(1));

        assert!(path.slice(3, 1).is_err());
        assert!(path.slice(0, 5).is_err());
    }

    #[test]
    fn test_reverse_twice_is_identity() {
        let path = unit_square();
        let twice = path.reversed().reversed();
        assert_eq!(twice.vertices, path.vertices);
        assert_eq!(twice.corners, path.corners);
    }

    #[test]
    fn test_reversed_does_not_mutate() {
        let path = unit_square();
        let original = path.clone();
        let _ = path.reversed();
        assert_eq!(path, original);
    }

    #[test]
    fn test_append_opens_path() {
        let mut a = unit_square();
        let mut b = Path::new();
        b.push(Vec2::new(5.0, 5.0), true);
        b.push(Vec2::new(6.0, 5.0), false);
        a.append(&b);
        assert!(!a.closed);
        assert_eq!(a.len(), 6);
        assert!(a.is_corner(4));
        assert!(!a.is_corner(5));
    }

    #[test]
    fn test_contains_even_odd() {
        let path = unit_square();
        assert!(path.contains(Vec2::new(0.5, 0.5)));
        assert!(!path.contains(Vec2::new(1.5, 0.5)));

        let mut open = path.clone();
        open.closed = false;
        assert!(!open.contains(Vec2::new(0.5, 0.5)));
    }

    #[test]
    fn test_incident() {
        let path = unit_square();
        assert!(path.incident(Vec2::new(0.5, 0.0), 1e-4));
        // The closing segment from (0,1) back to (0,0).
        assert!(path.incident(Vec2::new(0.0, 0.5), 1e-4));
        assert!(!path.incident(Vec2::new(0.5, 0.5), 1e-4));
    }

    #[test]
    fn test_convexity_and_left_turns() {
        let square = unit_square();
        assert!(square.is_convex());
        assert_eq!(square.left_turns(), 4);

        // A dent at (0.5, 0.5) breaks convexity.
        let dented = Path {
            vertices: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.5, 0.5),
                Vec2::new(0.0, 1.0),
            ],
            corners: HashSet::new(),
            closed: true,
        };
        assert!(!dented.is_convex());
        assert_eq!(dented.left_turns(), 4);
    }

    #[test]
    fn test_area_and_orientation() {
        let square = unit_square();
        assert!((square.area() - 1.0).abs() < 1e-6);
        assert_eq!(square.orientation(), -1);

        let reversed = square.reversed();
        assert!((reversed.area() + 1.0).abs() < 1e-6);
        assert_eq!(reversed.orientation(), 1);
    }

    #[test]
    fn test_orientation_colinear() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 1.0);
        let c = Vec2::new(2.0, 2.0);
        assert_eq!(Path::orientation_of(a, b, c), 0);
    }

    #[test]
    fn test_scale_and_translate() {
        let mut path = unit_square();
        path.scale(Vec2::new(2.0, 3.0)).translate(Vec2::new(1.0, 1.0));
        assert_eq!(path.vertices[2], Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_inv_scale_zero_fails() {
        let mut path = unit_square();
        assert_eq!(
            path.inv_scale(Vec2::new(0.0, 1.0)).unwrap_err(),
            GeometryError::ZeroScale
        );
        // Untouched after the failure.
        assert_eq!(path, unit_square());
        path.inv_scale(Vec2::new(2.0, 2.0)).unwrap();
        assert_eq!(path.vertices[2], Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_bounds() {
        let path = Path::from_vertices(vec![
            Vec2::new(-1.0, 4.0),
            Vec2::new(3.0, -2.0),
            Vec2::new(0.0, 0.0),
        ])
        .unwrap();
        let (min, max) = path.bounds().unwrap();
        assert_eq!(min, Vec2::new(-1.0, -2.0));
        assert_eq!(max, Vec2::new(3.0, 4.0));
        assert!(Path::new().bounds().is_none());
    }

    #[test]
    fn test_wire_indices() {
        let mut path = unit_square();
        assert_eq!(path.wire_indices(), vec![0, 1, 1, 2, 2, 3, 3, 0]);
        path.closed = false;
        assert_eq!(path.wire_indices(), vec![0, 1, 1, 2, 2, 3]);
    }
}
